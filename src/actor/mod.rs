//! Actor System for Live Updates
//!
//! Message-passing concurrency for watch mode:
//!
//! ```text
//! FsActor --> CompilerActor --> Broker ==> sessions --> viewers
//! (watch)       (recompile)    (fan-out)     (ws)
//! ```
//!
//! The notify watcher runs on its own thread; everything else is a task on
//! one tokio runtime, connected by bounded channels.
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `compiler` - Narrative recompilation
//! - `broker` - Subscriber registry and fan-out
//! - `ws` - WebSocket server and per-viewer sessions
//! - `coordinator` - Wires up and runs actors

pub mod broker;
pub mod compiler;
pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod ws;

pub use coordinator::Coordinator;

/// Channel buffer size between actors
pub(crate) const CHANNEL_BUFFER: usize = 32;

/// Bound a test wait so a lost message fails the test instead of hanging it.
#[cfg(test)]
pub(crate) async fn within_deadline<F: std::future::Future>(fut: F) -> F::Output {
    tokio::time::timeout(std::time::Duration::from_secs(5), fut)
        .await
        .expect("nothing arrived within 5s")
}
