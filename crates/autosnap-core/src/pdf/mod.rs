//! Assemble captured pages into a PDF.

pub mod errors;
pub mod handler;
pub mod types;

pub use errors::PdfError;
pub use handler::{directory_to_pdf, images_to_pdf, pdf_info, validate_images_for_pdf};
pub use types::{ImageValidation, PDF_IMAGE_EXTENSIONS, PdfInfo, PdfOptions, size_mb};
