//! Scratch repositories for tests.

use std::collections::BTreeMap;

use gix::ObjectId;
use gix::objs::Tree;
use gix::objs::tree::{Entry, EntryKind};
use tempfile::TempDir;

use super::{GitHistory, NarrativeSource};

/// Scratch repository with a linear history.
pub(crate) struct Fixture {
    pub(crate) dir: TempDir,
    pub(crate) repo: gix::Repository,
    head: Option<ObjectId>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        gix::init(dir.path()).unwrap();
        let repo = gix::open_opts(
            dir.path(),
            gix::open::Options::isolated().config_overrides([
                "user.name=Diffbook Tests",
                "user.email=tests@diffbook.invalid",
            ]),
        )
        .unwrap();
        Self {
            dir,
            repo,
            head: None,
        }
    }

    pub(crate) fn commit(&mut self, message: &str, files: &[(&str, &str)]) -> ObjectId {
        let tree = write_tree(&self.repo, files);
        let id = self
            .repo
            .commit("HEAD", message, tree, self.head)
            .unwrap()
            .detach();
        self.head = Some(id);
        id
    }

    /// Root commit on a branch of its own, leaving `HEAD` alone.
    pub(crate) fn commit_orphan(&self, branch: &str, message: &str, files: &[(&str, &str)]) -> ObjectId {
        let tree = write_tree(&self.repo, files);
        let reference = format!("refs/heads/{branch}");
        self.repo
            .commit(reference.as_str(), message, tree, None::<ObjectId>)
            .unwrap()
            .detach()
    }

    pub(crate) fn history(&self) -> GitHistory {
        GitHistory::open(self.dir.path())
            .unwrap()
            .with_narrative_source(NarrativeSource::TipCommit)
    }
}

/// Write nested trees for `path -> content` pairs; returns the root tree id.
fn write_tree(repo: &gix::Repository, files: &[(&str, &str)]) -> ObjectId {
    let mut entries = Vec::new();
    let mut subdirs: BTreeMap<&str, Vec<(&str, &str)>> = BTreeMap::new();

    for &(path, content) in files {
        match path.split_once('/') {
            Some((dir, rest)) => subdirs.entry(dir).or_default().push((rest, content)),
            None => entries.push(Entry {
                mode: EntryKind::Blob.into(),
                filename: path.into(),
                oid: repo.write_blob(content).unwrap().detach(),
            }),
        }
    }
    for (dir, files) in subdirs {
        entries.push(Entry {
            mode: EntryKind::Tree.into(),
            filename: dir.into(),
            oid: write_tree(repo, &files),
        });
    }

    // git orders directories as if their name ended with '/'
    let tree_mode: gix::objs::tree::EntryMode = EntryKind::Tree.into();
    entries.sort_by_key(|e| {
        let mut key = e.filename.to_vec();
        if e.mode == tree_mode {
            key.push(b'/');
        }
        key
    });

    repo.write_object(&Tree { entries }).unwrap().detach()
}
