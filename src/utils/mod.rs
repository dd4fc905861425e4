//! Utility functions

pub mod progress_log;
mod sanitize;

pub use progress_log::{set_progress_mode, ConditionalStderrLayer};
pub use sanitize::sanitize_filename;
