use crate::errors::SnapError;
use crate::pdf::PdfError;
use crate::session::SessionFailure;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Capture step failed: {source}")]
    Capture {
        #[from]
        source: SessionFailure,
    },

    #[error("No pages were captured from window '{window_id}'")]
    NothingCaptured { window_id: String },

    #[error("PDF step failed: {source}")]
    Pdf {
        #[from]
        source: PdfError,
    },
}

impl SnapError for WorkflowError {
    fn error_code(&self) -> &'static str {
        match self {
            WorkflowError::Capture { source } => source.error_code(),
            WorkflowError::NothingCaptured { .. } => "NOTHING_CAPTURED",
            WorkflowError::Pdf { source } => source.error_code(),
        }
    }

    fn is_user_error(&self) -> bool {
        match self {
            WorkflowError::Capture { source } => source.error.is_user_error(),
            WorkflowError::NothingCaptured { .. } => false,
            WorkflowError::Pdf { source } => source.is_user_error(),
        }
    }
}
