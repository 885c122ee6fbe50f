//! Removal of temporary capture output.

pub mod errors;
pub mod handler;
mod operations;
pub mod types;

pub use errors::CleanupError;
pub use handler::{prune_temp_dir, remove_capture_dir};
pub use types::{PruneSummary, TEMP_DIR_PREFIX};
