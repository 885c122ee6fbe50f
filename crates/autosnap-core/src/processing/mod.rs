//! Post-capture image processing: OCR preparation, text extraction,
//! resizing and duplicate detection.

pub mod errors;
pub mod handler;
pub mod types;

pub use errors::ProcessingError;
pub use handler::{
    check_tesseract, enhance_image, extract_text, find_duplicates, find_images, process_batch,
    resize_image,
};
pub use types::{BatchOperation, BatchReport, OcrResult, SUPPORTED_EXTENSIONS};
