use std::path::PathBuf;

use crate::command::CommandError;
use crate::errors::SnapError;

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Image not found: '{}'", path.display())]
    ImageNotFound { path: PathBuf },

    #[error("Not a directory: '{}'", path.display())]
    NotADirectory { path: PathBuf },

    #[error("Unknown processing operation '{name}' (expected enhance, ocr, resize or deduplicate)")]
    UnknownOperation { name: String },

    #[error("OCR failed: {source}")]
    OcrFailed {
        #[from]
        source: CommandError,
    },

    #[error("Image error: {source}")]
    ImageError {
        #[from]
        source: image::ImageError,
    },

    #[error("IO error during processing: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl SnapError for ProcessingError {
    fn error_code(&self) -> &'static str {
        match self {
            ProcessingError::ImageNotFound { .. } => "IMAGE_NOT_FOUND",
            ProcessingError::NotADirectory { .. } => "NOT_A_DIRECTORY",
            ProcessingError::UnknownOperation { .. } => "UNKNOWN_OPERATION",
            ProcessingError::OcrFailed { source } if matches!(source, CommandError::NotFound { .. }) => {
                "TESSERACT_UNAVAILABLE"
            }
            ProcessingError::OcrFailed { .. } => "OCR_FAILED",
            ProcessingError::ImageError { .. } => "IMAGE_PROCESSING_ERROR",
            ProcessingError::IoError { .. } => "PROCESSING_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            ProcessingError::ImageNotFound { .. }
                | ProcessingError::NotADirectory { .. }
                | ProcessingError::UnknownOperation { .. }
        )
    }
}
