//! Logging utilities and structured logging support

pub use log::{debug, trace, warn};

/// Initialize the logging system
///
/// Reads the filter from `RUST_LOG`. Calling this more than once is a no-op.
pub fn init() {
    let _ = env_logger::try_init();
}
