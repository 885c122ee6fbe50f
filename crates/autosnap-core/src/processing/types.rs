use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use super::errors::ProcessingError;

/// Extensions picked up by batch processing, matched in either case.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "gif"];

pub const DEFAULT_MAX_WIDTH: u32 = 1920;
pub const DEFAULT_MAX_HEIGHT: u32 = 1080;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchOperation {
    Enhance,
    Ocr,
    Resize,
    Deduplicate,
}

impl BatchOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchOperation::Enhance => "enhance",
            BatchOperation::Ocr => "ocr",
            BatchOperation::Resize => "resize",
            BatchOperation::Deduplicate => "deduplicate",
        }
    }

    /// Parse every name, failing on the first unknown one.
    pub fn parse_all<S: AsRef<str>>(names: &[S]) -> Result<Vec<Self>, ProcessingError> {
        names.iter().map(|n| n.as_ref().parse()).collect()
    }
}

impl FromStr for BatchOperation {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enhance" => Ok(BatchOperation::Enhance),
            "ocr" => Ok(BatchOperation::Ocr),
            "resize" => Ok(BatchOperation::Resize),
            "deduplicate" | "dedup" => Ok(BatchOperation::Deduplicate),
            _ => Err(ProcessingError::UnknownOperation {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for BatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OcrResult {
    pub file: PathBuf,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub processed_files: Vec<PathBuf>,
    pub enhanced_files: Vec<PathBuf>,
    pub ocr_results: Vec<OcrResult>,
    pub resized_files: Vec<PathBuf>,
    /// Content hash to the files sharing it; only groups of two or more.
    pub duplicates: BTreeMap<String, Vec<PathBuf>>,
}
