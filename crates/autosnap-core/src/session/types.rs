use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::errors::SessionError;
use crate::errors::SnapError;

/// Largest page count a session accepts; filenames are padded to 3 digits.
pub const MAX_PAGE_COUNT: u32 = 999;

/// Name of the file page `index` is written to.
pub fn page_file_name(index: u32, extension: &str) -> String {
    format!("page_{:03}.{}", index, extension)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturedPage {
    pub index: u32,
    pub path: PathBuf,
}

/// A page whose capture failed and was left out of the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPage {
    pub index: u32,
    pub error_code: String,
    pub message: String,
}

/// Outcome of a multi-page session that ran to the end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentCapture {
    pub pages: Vec<CapturedPage>,
    pub skipped: Vec<SkippedPage>,
    /// `false` when the window could not be put back the way it was found.
    pub restored: bool,
}

impl DocumentCapture {
    pub fn paths(&self) -> Vec<PathBuf> {
        self.pages.iter().map(|p| p.path.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// A session that stopped early, with whatever it captured before stopping.
///
/// Callers must treat this as distinct from an `Ok` result with zero pages.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct SessionFailure {
    #[source]
    pub error: SessionError,
    pub pages: Vec<CapturedPage>,
    pub skipped: Vec<SkippedPage>,
}

impl SessionFailure {
    pub(crate) fn before_capture(error: SessionError) -> Self {
        Self {
            error,
            pages: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn paths(&self) -> Vec<&Path> {
        self.pages.iter().map(|p| p.path.as_path()).collect()
    }

    pub fn error_code(&self) -> &'static str {
        self.error.error_code()
    }
}

/// Where a session is in its capture-navigate loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Preparing,
    Capturing(u32),
    Navigating(u32),
    Restoring,
    Done,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "idle"),
            SessionPhase::Preparing => write!(f, "preparing"),
            SessionPhase::Capturing(page) => write!(f, "capturing({})", page),
            SessionPhase::Navigating(page) => write!(f, "navigating({})", page),
            SessionPhase::Restoring => write!(f, "restoring"),
            SessionPhase::Done => write!(f, "done"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_file_name_is_zero_padded() {
        assert_eq!(page_file_name(1, "png"), "page_001.png");
        assert_eq!(page_file_name(42, "jpg"), "page_042.jpg");
        assert_eq!(page_file_name(MAX_PAGE_COUNT, "png"), "page_999.png");
    }

    #[test]
    fn test_failure_displays_and_chains_its_error() {
        use std::error::Error;

        let failure = SessionFailure::before_capture(SessionError::PageCountTooLarge {
            requested: 1200,
            max: MAX_PAGE_COUNT,
        });
        assert_eq!(failure.to_string(), failure.error.to_string());
        assert!(failure.source().is_some());
        assert_eq!(failure.error_code(), "PAGE_COUNT_TOO_LARGE");
        assert!(failure.paths().is_empty());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(SessionPhase::Capturing(3).to_string(), "capturing(3)");
        assert_eq!(SessionPhase::Restoring.to_string(), "restoring");
    }
}
