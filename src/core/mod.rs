//! Process-wide state.

mod shutdown;

pub use shutdown::{is_shutdown, register_pipeline, setup_shutdown_handler, shutdown_signal};
