use std::path::PathBuf;

use crate::errors::SnapError;

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("No valid images to convert")]
    NoValidImages,

    #[error("No image files matching '{pattern}' found in '{}'", dir.display())]
    NoImagesInDirectory { dir: PathBuf, pattern: String },

    #[error("Invalid file pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Failed to write PDF '{}': {message}", path.display())]
    WriteFailed { path: PathBuf, message: String },

    #[error("Failed to read image: {source}")]
    ImageError {
        #[from]
        source: image::ImageError,
    },

    #[error("PDF error: {source}")]
    DocumentError {
        #[from]
        source: lopdf::Error,
    },

    #[error("IO error during PDF conversion: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl SnapError for PdfError {
    fn error_code(&self) -> &'static str {
        match self {
            PdfError::NoValidImages => "NO_VALID_IMAGES",
            PdfError::NoImagesInDirectory { .. } => "NO_IMAGES_IN_DIRECTORY",
            PdfError::InvalidPattern { .. } => "INVALID_PATTERN",
            PdfError::WriteFailed { .. } => "PDF_WRITE_FAILED",
            PdfError::ImageError { .. } => "PDF_IMAGE_ERROR",
            PdfError::DocumentError { .. } => "PDF_DOCUMENT_ERROR",
            PdfError::IoError { .. } => "PDF_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            PdfError::NoValidImages
                | PdfError::NoImagesInDirectory { .. }
                | PdfError::InvalidPattern { .. }
        )
    }
}
