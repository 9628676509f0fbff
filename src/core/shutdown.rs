//! Ctrl+C handling.
//!
//! Two phases:
//! - Before `register_pipeline()`: the process exits right away
//! - After: the watch channel flips to `true` and the coordinator winds down

use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// A live-update pipeline is running and will stop on its own
static PIPELINE: AtomicBool = AtomicBool::new(false);

static SHUTDOWN_TX: LazyLock<watch::Sender<bool>> = LazyLock::new(|| watch::channel(false).0);

/// Setup the global Ctrl+C handler. Call once at program start
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if PIPELINE.load(Ordering::SeqCst) {
            crate::log!("serve"; "shutting down...");
            request_shutdown();
        } else {
            // nothing to wind down, e.g. while building an archive
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Route the next Ctrl+C to [`shutdown_signal`] instead of exiting
pub fn register_pipeline() {
    PIPELINE.store(true, Ordering::SeqCst);
}

pub fn request_shutdown() {
    SHUTDOWN_TX.send_replace(true);
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    *SHUTDOWN_TX.borrow()
}

/// Receiver that turns `true` once shutdown is requested
pub fn shutdown_signal() -> watch::Receiver<bool> {
    SHUTDOWN_TX.subscribe()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_reaches_existing_and_late_receivers() {
        let mut early = shutdown_signal();
        register_pipeline();
        request_shutdown();

        assert!(is_shutdown());
        early.wait_for(|&stop| stop).await.unwrap();
        assert!(*shutdown_signal().borrow());
    }
}
