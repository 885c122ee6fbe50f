//! Default values for configuration fields.

use std::path::PathBuf;

pub const DEFAULT_FILE_NAME_TEMPLATE: &str = "page_{page:03d}";
pub const DEFAULT_CUSTOM_TIMESTAMP_PATTERN: &str = "%Y%m%d_%H%M%S";
pub const DEFAULT_IMAGE_QUALITY: u8 = 95;

pub const DEFAULT_NAVIGATION_DELAY_MS: u64 = 1000;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;
pub const DEFAULT_FOCUS_DELAY_MS: u64 = 200;

pub const DEFAULT_ENUMERATION_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_WINDOW_CAPTURE_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_FULL_SCREEN_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_KEY_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_STATE_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 10_000;

pub const DEFAULT_TEMP_RETENTION_HOURS: u64 = 24;
pub const DEFAULT_MAX_TEMP_FILES: usize = 1000;

pub const DEFAULT_PDF_DPI: u32 = 150;
pub const DEFAULT_PDF_TITLE: &str = "Auto-Snap Captured Document";

/// Returns `~/auto-snap-captures`, or `./auto-snap-captures` when no home
/// directory can be determined.
pub fn default_output_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("auto-snap-captures")
}

pub fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("auto-snap-temp")
}
