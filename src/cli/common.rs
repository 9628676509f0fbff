//! Helpers shared by the subcommands.

use std::path::Path;

use anyhow::{Context, Result};

use crate::history::GitHistory;

/// Open `repo` when given, otherwise discover the repository around `start`.
pub fn open_repository(repo: Option<&Path>, start: &Path) -> Result<GitHistory> {
    match repo {
        Some(path) => GitHistory::open(path)
            .with_context(|| format!("cannot open repository `{}`", path.display())),
        None => GitHistory::discover(start).with_context(|| {
            format!("no git repository around `{}`; pass one with --repo", start.display())
        }),
    }
}

/// `1 tutorial`, `2 tutorials`
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}
