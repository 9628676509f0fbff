//! Tutorial history read from a git repository.
//!
//! A tutorial lives in a single top-level directory of the tip tree. Commits
//! whose message contains `{#slug}` contribute the patch of the program
//! source between their first parent and themselves.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use gix::bstr::ByteSlice;
use gix::{ObjectId, ThreadSafeRepository};
use regex::Regex;
use rustc_hash::FxHashMap;

use super::{
    HistoryError, HistoryProvider, NarrativeSource, ProjectAsset, TutorialHistory, TutorialLayout,
};
use crate::diff::{Patch, patch_between};

static SLUG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{#([A-Za-z0-9_.\-]+)\}").unwrap());

/// Git-backed [`HistoryProvider`].
#[derive(Clone)]
pub struct GitHistory {
    repo: ThreadSafeRepository,
    tip: String,
    layout: TutorialLayout,
    source: NarrativeSource,
}

impl GitHistory {
    /// Open the repository at `path` (a work tree or a `.git` directory).
    pub fn open(path: &Path) -> Result<Self, HistoryError> {
        let repo =
            gix::open(path).map_err(|e| HistoryError::Repository(path.to_owned(), Box::new(e)))?;
        Ok(Self::from_repo(repo))
    }

    /// Find the repository containing `dir`.
    pub fn discover(dir: &Path) -> Result<Self, HistoryError> {
        let repo = gix::discover(dir)
            .map_err(|e| HistoryError::Repository(dir.to_owned(), Box::new(e)))?;
        Ok(Self::from_repo(repo))
    }

    fn from_repo(repo: gix::Repository) -> Self {
        Self {
            repo: repo.into_sync(),
            tip: "HEAD".into(),
            layout: TutorialLayout::default(),
            source: NarrativeSource::default(),
        }
    }

    pub fn with_tip(mut self, tip: impl Into<String>) -> Self {
        self.tip = tip.into();
        self
    }

    pub fn with_layout(mut self, layout: TutorialLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_narrative_source(mut self, source: NarrativeSource) -> Self {
        self.source = source;
        self
    }

    pub fn workdir(&self) -> Option<PathBuf> {
        self.repo.to_thread_local().workdir().map(Path::to_path_buf)
    }

    fn resolve_tip<'r>(&self, repo: &'r gix::Repository) -> Result<gix::Commit<'r>, HistoryError> {
        repo.rev_parse_single(self.tip.as_str())
            .map_err(HistoryError::git("resolve the tip revision"))?
            .object()
            .map_err(HistoryError::git("read the tip object"))?
            .peel_to_commit()
            .map_err(HistoryError::git("peel the tip to a commit"))
    }

    fn sole_directory(&self, tip: &gix::Commit<'_>) -> Result<String, HistoryError> {
        let tree = tip.tree().map_err(HistoryError::git("read the tip tree"))?;
        let decoded = tree.decode().map_err(HistoryError::git("decode the tip tree"))?;
        match decoded.entries.as_slice() {
            [entry] if entry.mode.is_tree() => Ok(entry.filename.to_str_lossy().into_owned()),
            entries => Err(HistoryError::Layout {
                revision: self.tip.clone(),
                entries: entries.len(),
            }),
        }
    }

    /// Read a file of the tutorial directory from wherever the narrative
    /// comes from.
    fn read_tutorial_file(
        &self,
        repo: &gix::Repository,
        tip: &gix::Commit<'_>,
        directory: &str,
        name: &str,
    ) -> Result<Option<String>, HistoryError> {
        match self.source {
            NarrativeSource::TipCommit => blob_text(tip, &format!("{directory}/{name}")),
            NarrativeSource::WorkingDirectory => {
                let workdir = repo.workdir().ok_or(HistoryError::NoWorkdir)?;
                let path = workdir.join(directory).join(name);
                match fs::read_to_string(&path) {
                    Ok(text) => Ok(Some(text)),
                    Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(HistoryError::Io(path, e)),
                }
            }
        }
    }

    /// Replay the first-parent chain oldest-first, diffing the program source
    /// of every tagged commit against its parent.
    fn collect_patches(
        &self,
        repo: &gix::Repository,
        tip: &gix::Commit<'_>,
        code_path: &str,
    ) -> Result<FxHashMap<String, Patch>, HistoryError> {
        let mut chain = Vec::new();
        let mut next = Some(tip.id);
        while let Some(id) = next {
            let commit = repo
                .find_commit(id)
                .map_err(HistoryError::git("find a commit of the history"))?;
            next = commit.parent_ids().next().map(|p| p.detach());
            chain.push(commit);
        }

        let mut patches = FxHashMap::default();
        let mut owners: FxHashMap<String, ObjectId> = FxHashMap::default();
        let mut previous = String::new();

        for commit in chain.iter().rev() {
            let code = blob_text(commit, code_path)?.unwrap_or_default();
            let message = commit
                .message_raw()
                .map_err(HistoryError::git("decode a commit message"))?;

            if let Some(slug) = commit_slug(&message.to_str_lossy()) {
                if let Some(first) = owners.insert(slug.clone(), commit.id) {
                    return Err(HistoryError::DuplicateSlug {
                        slug,
                        first: first.to_string(),
                        second: commit.id.to_string(),
                    });
                }
                crate::debug!("load"; "{} tagged `{}`", commit.id.to_hex_with_len(7), slug);
                patches.insert(slug, patch_between(&previous, &code));
            }
            previous = code;
        }

        Ok(patches)
    }

    fn collect_assets(
        &self,
        repo: &gix::Repository,
        tip: &gix::Commit<'_>,
        directory: &str,
    ) -> Result<Vec<ProjectAsset>, HistoryError> {
        let tree = tip.tree().map_err(HistoryError::git("read the tip tree"))?;
        let mut recorder = gix::traverse::tree::Recorder::default();
        tree.traverse()
            .breadthfirst(&mut recorder)
            .map_err(HistoryError::git("walk the tip tree"))?;

        let prefix = format!("{directory}/");
        let mut assets = Vec::new();
        for entry in recorder.records {
            if !entry.mode.is_blob() {
                continue;
            }
            let path = entry.filepath.to_str_lossy().into_owned();
            let Some(name) = path.strip_prefix(&prefix) else {
                continue;
            };
            if self.layout.is_special(name) {
                continue;
            }
            let data = repo
                .find_object(entry.oid)
                .map_err(HistoryError::git("read an asset"))?
                .detach()
                .data;
            assets.push(ProjectAsset { path, data });
        }

        assets.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(assets)
    }
}

impl HistoryProvider for GitHistory {
    fn load(&self) -> Result<TutorialHistory, HistoryError> {
        let repo = self.repo.to_thread_local();
        let tip = self.resolve_tip(&repo)?;
        let directory = self.sole_directory(&tip)?;
        let code_path = format!("{directory}/{}", self.layout.code);

        let narrative = self
            .read_tutorial_file(&repo, &tip, &directory, &self.layout.narrative)?
            .ok_or_else(|| {
                HistoryError::MissingFile(Path::new(&directory).join(&self.layout.narrative))
            })?;

        let mut history = TutorialHistory::new(directory.as_str(), narrative);
        history.summary = self.read_tutorial_file(&repo, &tip, &directory, &self.layout.summary)?;
        history.complete_code = blob_text(&tip, &code_path)?.unwrap_or_default();
        history.patches = self.collect_patches(&repo, &tip, &code_path)?;
        history.assets = self.collect_assets(&repo, &tip, &directory)?;

        crate::debug!(
            "load";
            "`{}` at {}: {} patches, {} assets",
            directory,
            self.tip,
            history.patches.len(),
            history.assets.len()
        );
        Ok(history)
    }
}

/// The slug a commit message is tagged with, if any.
fn commit_slug(message: &str) -> Option<String> {
    SLUG_TAG.captures(message).map(|c| c[1].to_string())
}

/// Text of the blob at `path` in a commit's tree; `None` when absent.
fn blob_text(commit: &gix::Commit<'_>, path: &str) -> Result<Option<String>, HistoryError> {
    let tree = commit
        .tree()
        .map_err(HistoryError::git("read a commit tree"))?;
    let Some(entry) = tree
        .lookup_entry_by_path(path)
        .map_err(HistoryError::git("look up a tree entry"))?
    else {
        return Ok(None);
    };
    if !entry.mode().is_blob() {
        return Ok(None);
    }
    let object = entry.object().map_err(HistoryError::git("read a blob"))?;
    Ok(Some(String::from_utf8_lossy(&object.data).into_owned()))
}

#[cfg(test)]
pub(crate) mod fixture;
#[cfg(test)]
mod tests;
