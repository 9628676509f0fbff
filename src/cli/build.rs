//! Archive building.
//!
//! One tutorial per tip revision, all read from the committed tree (the
//! working directory plays no part), written into a single zip.

use std::path::Path;

use anyhow::{Context, Result};

use super::BuildArgs;
use super::common::{open_repository, plural_count};
use crate::bundle::{TutorialBundle, TutorialCollection};
use crate::config::DiffbookConfig;
use crate::history::{GitHistory, HistoryProvider, NarrativeSource, TutorialHistory};
use crate::log;
use crate::render::narrative::referenced_slugs;

/// Build the archive; returns the number of tutorials written.
pub fn build_archive(args: &BuildArgs, config: &DiffbookConfig) -> Result<usize> {
    let cwd = std::env::current_dir().context("Failed to get current working directory")?;
    let base = open_repository(args.repo.as_deref(), &cwd)?
        .with_layout(config.tutorial.clone())
        .with_narrative_source(NarrativeSource::TipCommit);

    let collection = collect_tutorials(&base, &args.revisions)?;
    write_archive(&collection, &config.build.output)?;
    Ok(collection.len())
}

/// Load and compile the tutorial at every revision, in order.
pub fn collect_tutorials(base: &GitHistory, revisions: &[String]) -> Result<TutorialCollection> {
    let mut collection = TutorialCollection::default();

    for revision in revisions {
        let history = base
            .clone()
            .with_tip(revision.as_str())
            .load()
            .with_context(|| format!("cannot load the tutorial at `{revision}`"))?;
        log!(
            "build";
            "{} ({}): {}, {}",
            history.directory,
            revision,
            plural_count(history.patches.len(), "commit"),
            plural_count(history.assets.len(), "asset")
        );
        warn_unreferenced(&history);

        collection.push(TutorialBundle::from_history(history)?)?;
    }

    Ok(collection)
}

/// Commits carrying a slug the narrative never shows are probably a typo.
fn warn_unreferenced(history: &TutorialHistory) {
    let unused = unreferenced_slugs(history);
    if !unused.is_empty() {
        log!(
            "warning";
            "{}: commits never shown in the narrative: {}",
            history.directory,
            unused.join(", ")
        );
    }
}

fn unreferenced_slugs(history: &TutorialHistory) -> Vec<&str> {
    let shown = referenced_slugs(&history.narrative);
    let mut unused: Vec<&str> = history
        .patches
        .keys()
        .map(String::as_str)
        .filter(|slug| !shown.iter().any(|s| s == slug))
        .collect();
    unused.sort_unstable();
    unused
}

fn write_archive(collection: &TutorialCollection, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create `{}`", parent.display()))?;
    }

    collection.write_zip_file(output)?;
    log!(
        "build";
        "wrote {} to {}",
        plural_count(collection.len(), "tutorial"),
        output.display()
    );
    Ok(())
}
