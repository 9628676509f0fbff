//! Tutorial history: the narrative, the per-commit patches and the assets that
//! make up one tutorial.
//!
//! The live pipeline and the archive writer only see [`HistoryProvider`];
//! [`git::GitHistory`] is the implementation backed by a real repository.

pub mod git;

use std::path::PathBuf;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::diff::Patch;

pub use git::GitHistory;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Anything that can produce the current state of a tutorial.
///
/// `load` is blocking; async callers go through `spawn_blocking`.
pub trait HistoryProvider: Send + Sync {
    fn load(&self) -> Result<TutorialHistory, HistoryError>;
}

/// A non-special file of the tutorial, stored verbatim in archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectAsset {
    /// Repository-relative path, e.g. `boing/images/ball.png`.
    pub path: String,
    pub data: Vec<u8>,
}

/// Everything needed to render one tutorial.
#[derive(Debug, Clone, Default)]
pub struct TutorialHistory {
    /// Name of the tutorial's top-level directory.
    pub directory: String,
    /// Narrative markdown, including commit shortcodes.
    pub narrative: String,
    pub summary: Option<String>,
    /// Program source at the tip revision.
    pub complete_code: String,
    /// Patch of every tagged commit, by slug.
    pub patches: FxHashMap<String, Patch>,
    pub assets: Vec<ProjectAsset>,
}

impl TutorialHistory {
    pub fn new(directory: impl Into<String>, narrative: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            narrative: narrative.into(),
            ..Self::default()
        }
    }
}

/// Where the narrative (and summary) text is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NarrativeSource {
    /// The checked-out file, so unsaved-to-git edits show up immediately.
    #[default]
    WorkingDirectory,
    /// The file as committed at the tip revision.
    TipCommit,
}

/// File names inside a tutorial directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TutorialLayout {
    pub narrative: String,
    pub code: String,
    pub summary: String,
}

impl Default for TutorialLayout {
    fn default() -> Self {
        Self {
            narrative: "tutorial.md".into(),
            code: "code.py".into(),
            summary: "summary.md".into(),
        }
    }
}

impl TutorialLayout {
    /// Whether `name` is one of the three files with a dedicated role.
    pub fn is_special(&self, name: &str) -> bool {
        name == self.narrative || name == self.code || name == self.summary
    }
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("no git repository found at `{0}`")]
    Repository(PathBuf, #[source] BoxError),

    #[error("git: cannot {0}")]
    Git(&'static str, #[source] BoxError),

    #[error("expected a single top-level directory at revision `{revision}`, found {entries} top-level entries")]
    Layout { revision: String, entries: usize },

    #[error("slug `{slug}` is used by both commit {first} and commit {second}")]
    DuplicateSlug {
        slug: String,
        first: String,
        second: String,
    },

    #[error("`{0}` does not exist")]
    MissingFile(PathBuf),

    #[error("repository has no working directory to read the narrative from")]
    NoWorkdir,

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

impl HistoryError {
    pub(crate) fn git<E>(what: &'static str) -> impl FnOnce(E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        move |e| Self::Git(what, Box::new(e))
    }
}
