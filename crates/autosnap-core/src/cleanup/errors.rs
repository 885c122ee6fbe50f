use std::path::PathBuf;

use crate::errors::SnapError;

#[derive(Debug, thiserror::Error)]
pub enum CleanupError {
    #[error("Refusing to remove '{}': not a temporary capture directory", path.display())]
    NotTemporary { path: PathBuf },

    #[error("Failed to remove '{}': {source}", path.display())]
    RemoveFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error during cleanup: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl SnapError for CleanupError {
    fn error_code(&self) -> &'static str {
        match self {
            CleanupError::NotTemporary { .. } => "CLEANUP_NOT_TEMPORARY",
            CleanupError::RemoveFailed { .. } => "CLEANUP_REMOVE_FAILED",
            CleanupError::IoError { .. } => "CLEANUP_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, CleanupError::NotTemporary { .. })
    }
}
