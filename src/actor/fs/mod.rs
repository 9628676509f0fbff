//! FileSystem Actor
//!
//! Watches one tutorial directory and turns file changes into typed messages.
//!
//! ```text
//! notify thread ──PathBuf──> ChangeAggregator ──settled──> ArtifactClassifier ──IdeMessage──>
//!              (unbounded bridge)          (125 ms quiet)            (read file)
//! ```
//!
//! The notify callback runs on the watcher's own thread; the unbounded
//! channel it sends into is the only thing shared with the async side.

mod aggregator;
mod classifier;


use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

pub(crate) use aggregator::ChangeAggregator;
pub(crate) use classifier::ArtifactClassifier;

use super::CHANNEL_BUFFER;
use super::messages::IdeMessage;
use crate::history::TutorialLayout;

/// FileSystem Actor - watches the tutorial directory
pub struct FsActor {
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    /// Async end of the watcher bridge
    raw_rx: mpsc::UnboundedReceiver<PathBuf>,
    classifier: ArtifactClassifier,
    /// Channel to send messages to the CompilerActor
    out: mpsc::Sender<IdeMessage>,
}

impl FsActor {
    /// Start watching `dir` right away.
    ///
    /// Events that arrive before [`run`](Self::run) is polled are buffered in
    /// the bridge, not lost.
    pub fn new(
        dir: &Path,
        layout: &TutorialLayout,
        out: mpsc::Sender<IdeMessage>,
    ) -> notify::Result<Self> {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let classifier = ArtifactClassifier::new(layout);
        let filter = classifier.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    for path in changed_paths(&event) {
                        if filter.kind_of(&path).is_some() {
                            // receiver gone means the actor stopped
                            let _ = raw_tx.send(path);
                        }
                    }
                }
                Err(e) => crate::log!("watch"; "notify error: {}", e),
            }
        })?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        crate::log!("watch"; "watching {}", dir.display());

        Ok(Self {
            watcher,
            raw_rx,
            classifier,
            out,
        })
    }

    /// Run the actor event loop
    pub async fn run(self) {
        let Self {
            watcher,
            raw_rx,
            classifier,
            out,
        } = self;

        forward_settled(raw_rx, classifier, out).await;
        drop(watcher);
        crate::debug!("watch"; "stopped");
    }
}

/// Debounce the bridge, load each settled path and send it downstream.
///
/// Returns once the downstream receiver is gone or the bridge closes.
pub(crate) async fn forward_settled(
    raw_rx: mpsc::UnboundedReceiver<PathBuf>,
    classifier: ArtifactClassifier,
    out: mpsc::Sender<IdeMessage>,
) {
    let (settled_tx, mut settled_rx) = mpsc::channel(CHANNEL_BUFFER);
    let aggregator = tokio::spawn(ChangeAggregator::new(settled_tx).run(raw_rx));

    while let Some(path) = settled_rx.recv().await {
        let msg = match classifier.load(&path) {
            Ok(Some(msg)) => msg,
            Ok(None) => continue,
            Err(e) => {
                crate::log!("load"; "cannot read {}: {}", path.display(), e);
                continue;
            }
        };

        crate::debug!("load"; "{:?} of `{}`: {} bytes", msg.kind, msg.tutorial_name, msg.text.len());
        if out.send(msg).await.is_err() {
            break;
        }
    }

    aggregator.abort();
}

/// Paths whose content may have changed, per the kinds of event that can
/// carry new file content: creation, data modification and the destination
/// of a rename.
fn changed_paths(event: &notify::Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Create(_) => event.paths.clone(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.get(1).cloned().into_iter().collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event.paths.clone(),
        EventKind::Modify(ModifyKind::Name(_)) => Vec::new(),
        // Ignore metadata-only changes (mtime/atime/chmod noise)
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => event.paths.clone(),
        _ => Vec::new(),
    }
}
