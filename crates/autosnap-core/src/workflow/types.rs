use std::path::PathBuf;

use serde::Serialize;

use crate::pdf::PdfInfo;
use crate::window::NavigationKey;

/// Default directory pages are captured into before conversion.
pub const DEFAULT_CAPTURE_DIR: &str = "temp_captures";

/// Capture a document, optionally enhance it, and write it out as a PDF.
#[derive(Debug, Clone)]
pub struct WorkflowRequest {
    pub window_id: String,
    pub page_count: i64,
    pub output_pdf: PathBuf,
    pub capture_dir: PathBuf,
    pub title: Option<String>,
    pub key: NavigationKey,
    pub delay_secs: f64,
    pub enhance: bool,
}

impl WorkflowRequest {
    pub fn new(window_id: impl Into<String>, page_count: i64, output_pdf: PathBuf) -> Self {
        Self {
            window_id: window_id.into(),
            page_count,
            output_pdf,
            capture_dir: PathBuf::from(DEFAULT_CAPTURE_DIR),
            title: None,
            key: NavigationKey::PageDown,
            delay_secs: 1.0,
            enhance: true,
        }
    }

    pub fn title_or_default(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| format!("Document captured from window {}", self.window_id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum WorkflowStep {
    Capture {
        files_captured: usize,
        pages_skipped: usize,
        output_directory: PathBuf,
    },
    Processing {
        enhanced_files: usize,
    },
    PdfConversion {
        output_pdf: PathBuf,
        pdf_info: PdfInfo,
    },
    Cleanup {
        cleaned_directory: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowReport {
    pub window_id: String,
    pub pages_captured: usize,
    pub final_pdf: PathBuf,
    pub pdf_info: PdfInfo,
    pub steps: Vec<WorkflowStep>,
}
