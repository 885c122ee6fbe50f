//! Capture-to-PDF pipeline.

pub mod errors;
pub mod handler;
pub mod types;

pub use errors::WorkflowError;
pub use handler::run_workflow;
pub use types::{DEFAULT_CAPTURE_DIR, WorkflowReport, WorkflowRequest, WorkflowStep};
