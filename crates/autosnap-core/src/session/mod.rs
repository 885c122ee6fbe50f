pub mod errors;
pub mod handler;
pub mod types;

pub use errors::SessionError;
pub use handler::MultiPageCaptureOrchestrator;
pub use types::{
    CapturedPage, DocumentCapture, MAX_PAGE_COUNT, SessionFailure, SessionPhase, SkippedPage,
    page_file_name,
};
