use std::path::PathBuf;

use serde::Serialize;

use crate::config::SnapConfig;
use crate::config::defaults::{DEFAULT_PDF_DPI, DEFAULT_PDF_TITLE};

/// Image extensions accepted as PDF pages.
pub const PDF_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfOptions {
    pub title: String,
    pub dpi: u32,
    /// Order pages by path instead of the order given.
    pub sort_files: bool,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_PDF_TITLE.to_string(),
            dpi: DEFAULT_PDF_DPI,
            sort_files: true,
        }
    }
}

impl PdfOptions {
    pub fn from_config(config: &SnapConfig) -> Self {
        Self {
            title: config.pdf.default_title().to_string(),
            dpi: config.pdf.dpi(),
            sort_files: true,
        }
    }

    pub fn with_title(mut self, title: Option<&str>) -> Self {
        if let Some(title) = title {
            self.title = title.to_string();
        }
        self
    }

    pub fn with_sort(mut self, sort_files: bool) -> Self {
        self.sort_files = sort_files;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageValidation {
    pub valid_images: Vec<PathBuf>,
    pub invalid_images: Vec<PathBuf>,
    pub missing_files: Vec<PathBuf>,
    pub unsupported_formats: Vec<PathBuf>,
    pub total_size_mb: f64,
}

impl ImageValidation {
    pub fn has_problems(&self) -> bool {
        !(self.invalid_images.is_empty()
            && self.missing_files.is_empty()
            && self.unsupported_formats.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfInfo {
    pub path: PathBuf,
    pub exists: bool,
    pub size_bytes: u64,
    pub size_mb: f64,
    pub page_count: Option<usize>,
}

/// Bytes to megabytes, rounded to two decimals.
pub fn size_mb(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}
