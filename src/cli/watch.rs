//! Live updates while writing a tutorial.
//!
//! Setup problems (no repository, no directory, address in use) end the
//! command right away. Once the pipeline runs, errors are reported and the
//! pipeline keeps going until Ctrl+C.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use super::WatchArgs;
use super::common::open_repository;
use crate::actor::Coordinator;
use crate::config::DiffbookConfig;
use crate::history::{GitHistory, HistoryProvider, NarrativeSource};
use crate::render::compile_document;

pub fn watch_tutorial(args: &WatchArgs, config: &DiffbookConfig) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current working directory")?;
    let start = if args.dirname.is_dir() {
        args.dirname.as_path()
    } else {
        cwd.as_path()
    };

    let history = open_repository(args.repo.as_deref(), start)?
        .with_tip(args.revision.as_str())
        .with_layout(config.tutorial.clone())
        .with_narrative_source(NarrativeSource::WorkingDirectory);
    let watch_dir = resolve_watch_dir(&args.dirname, &history)?;

    initial_check(&history);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("cannot start the async runtime")?;

    crate::core::register_pipeline();
    runtime.block_on(
        Coordinator::new(watch_dir, Arc::new(history), config.serve.socket_addr())
            .with_layout(config.tutorial.clone())
            .with_shutdown_signal(crate::core::shutdown_signal())
            .run(),
    )?;

    crate::logger::status_detach();
    if crate::core::is_shutdown() {
        crate::log!("serve"; "stopped");
    }
    Ok(())
}

/// `dirname` as given, or relative to the repository's working tree.
fn resolve_watch_dir(dirname: &Path, history: &GitHistory) -> Result<PathBuf> {
    if dirname.is_dir() {
        return Ok(dirname.to_path_buf());
    }
    if dirname.is_relative()
        && let Some(workdir) = history.workdir()
    {
        let candidate = workdir.join(dirname);
        if candidate.is_dir() {
            return Ok(candidate);
        }
    }
    bail!("tutorial directory `{}` does not exist", dirname.display())
}

/// Compile once up front so a broken tutorial shows before the first edit.
///
/// Not fatal: the author is probably about to fix it.
fn initial_check(history: &GitHistory) {
    let result = history
        .load()
        .map_err(anyhow::Error::new)
        .and_then(|h| {
            let document = compile_document(&h)?;
            Ok((h.directory, document.blocks().len()))
        });

    match result {
        Ok((directory, blocks)) => {
            crate::logger::status_success(&format!("`{directory}` compiles ({blocks} blocks)"));
        }
        Err(e) => {
            crate::logger::status_error("tutorial does not compile yet", &format!("{e:#}"));
        }
    }
}
