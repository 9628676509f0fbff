use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;

/// How long a path must stay quiet before it counts as settled.
pub const QUIET_INTERVAL: Duration = Duration::from_millis(125);

/// Debounces raw change notifications into settled paths.
///
/// Each notification bumps the path's generation and schedules a check after
/// [`QUIET_INTERVAL`]. The check emits the path only if no newer notification
/// arrived meanwhile; stale checks just return.
#[derive(Clone)]
pub(crate) struct ChangeAggregator {
    generations: Arc<Mutex<FxHashMap<PathBuf, u64>>>,
    settled: mpsc::Sender<PathBuf>,
}

impl ChangeAggregator {
    pub(crate) fn new(settled: mpsc::Sender<PathBuf>) -> Self {
        Self {
            generations: Arc::default(),
            settled,
        }
    }

    /// Consume raw notifications until the watcher side hangs up.
    pub(crate) async fn run(self, mut raw: mpsc::UnboundedReceiver<PathBuf>) {
        while let Some(path) = raw.recv().await {
            self.notify(path);
        }
        crate::debug!("watch"; "watcher closed, aggregator stopping");
    }

    /// Record one notification for `path` and schedule its settle check.
    pub(crate) fn notify(&self, path: PathBuf) {
        let generation = self.bump(&path);
        let this = self.clone();

        tokio::spawn(async move {
            tokio::time::sleep(QUIET_INTERVAL).await;
            if !this.is_current(&path, generation) {
                return;
            }
            crate::debug!("watch"; "settled: {} (generation {})", path.display(), generation);
            // receiver gone means the pipeline is shutting down
            let _ = this.settled.send(path).await;
        });
    }

    fn bump(&self, path: &Path) -> u64 {
        let mut generations = self.generations.lock();
        let counter = generations.entry(path.to_path_buf()).or_insert(0);
        *counter += 1;
        *counter
    }

    fn is_current(&self, path: &Path, generation: u64) -> bool {
        self.generations.lock().get(path) == Some(&generation)
    }
}
