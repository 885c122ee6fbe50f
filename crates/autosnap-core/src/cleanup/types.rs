use std::path::PathBuf;

use serde::Serialize;

/// Prefix that marks a capture directory as disposable.
pub const TEMP_DIR_PREFIX: &str = "temp_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneSummary {
    pub expired: Vec<PathBuf>,
    pub over_limit: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

impl PruneSummary {
    pub fn removed(&self) -> usize {
        self.expired.len() + self.over_limit.len()
    }
}
