//! Availability of the external programs backends and OCR rely on.

pub mod handler;
pub mod types;

pub use handler::{backend_tools, check_dependencies, missing_backend_tools};
pub use types::{DependencyReport, DependencyStatus, Tool};
