use std::path::PathBuf;

use crate::capture::CaptureError;
use crate::errors::SnapError;

/// Failures that stop a multi-page session from making progress.
///
/// Single-page capture failures are not represented here; they are recorded
/// as [`SkippedPage`](super::SkippedPage) entries and the session carries on.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to create output directory '{}': {source}", path.display())]
    OutputDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to prepare window for capture: {source}")]
    Preparation {
        #[source]
        source: CaptureError,
    },

    #[error("Page count {requested} exceeds the maximum of {max}")]
    PageCountTooLarge { requested: i64, max: u32 },
}

impl SnapError for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            SessionError::OutputDirectory { .. } => "OUTPUT_DIRECTORY_FAILED",
            SessionError::Preparation { source } => source.error_code(),
            SessionError::PageCountTooLarge { .. } => "PAGE_COUNT_TOO_LARGE",
        }
    }

    fn is_user_error(&self) -> bool {
        match self {
            SessionError::PageCountTooLarge { .. } => true,
            SessionError::Preparation { source } => source.is_user_error(),
            SessionError::OutputDirectory { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_too_large_is_user_error() {
        let error = SessionError::PageCountTooLarge {
            requested: 1000,
            max: 999,
        };
        assert_eq!(error.to_string(), "Page count 1000 exceeds the maximum of 999");
        assert_eq!(error.error_code(), "PAGE_COUNT_TOO_LARGE");
        assert!(error.is_user_error());
    }

    #[test]
    fn test_preparation_forwards_capture_code() {
        let error = SessionError::Preparation {
            source: CaptureError::WindowNotFound {
                window_id: "42".to_string(),
            },
        };
        assert_eq!(error.error_code(), "WINDOW_NOT_FOUND");
        assert!(error.is_user_error());
    }
}
