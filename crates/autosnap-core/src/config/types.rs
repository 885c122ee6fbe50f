//! Configuration type definitions for autosnap.
//!
//! These types are deserialized from TOML config files. Every field is
//! optional so that user and project files can be layered; the accessor
//! methods resolve a missing value to its built-in default.
//!
//! # Example Configuration
//!
//! ```toml
//! [output]
//! dir = "~/Documents/captures"
//! use_date_subdirs = true
//!
//! [naming]
//! image_format = "png"
//! include_timestamp = true
//! timestamp_format = "unix"
//!
//! [capture]
//! navigation_delay_ms = 1500
//! window_capture_timeout_ms = 60000
//!
//! [pdf]
//! dpi = 150
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::defaults;

/// Main configuration loaded from TOML config files.
///
/// Loaded from:
/// 1. User config: `~/.autosnap/config.toml`
/// 2. Project config: `./.autosnap/config.toml`
/// 3. `AUTO_SNAP_*` environment variables
///
/// Later sources override earlier ones.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SnapConfig {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub naming: NamingConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub cleanup: CleanupConfig,

    #[serde(default)]
    pub pdf: PdfConfig,
}

/// Where captures and temporary files are written.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OutputConfig {
    /// Base output directory. Default: `~/auto-snap-captures`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Scratch directory. Default: `<system temp>/auto-snap-temp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,

    /// Append a `YYYY-MM-DD` subdirectory to the output directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_date_subdirs: Option<bool>,

    /// Append a per-session subdirectory to the output directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_session_subdirs: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
}

/// How generated files are named and encoded.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NamingConfig {
    /// Filename template. `{page}` and `{page:03d}` are expanded.
    /// Default: `page_{page:03d}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name_template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_timestamp: Option<bool>,

    /// One of `iso`, `unix`, `custom`. Default: `iso`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_format: Option<String>,

    /// chrono strftime pattern used when `timestamp_format = "custom"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_timestamp_pattern: Option<String>,

    /// One of `png`, `jpg`. Default: `png`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_format: Option<String>,

    /// Encoder quality for lossy formats, 1-100. Default: 95.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_quality: Option<u8>,
}

/// Timing for capture sessions and bounds on every external call.
///
/// All values are milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CaptureConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation_delay_ms: Option<u64>,

    /// Pause after restoring a minimized window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_delay_ms: Option<u64>,

    /// Pause after bringing a window to the foreground.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_delay_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enumeration_timeout_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_capture_timeout_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_screen_timeout_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_timeout_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_timeout_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_timeout_ms: Option<u64>,
}

/// Automatic pruning of the temp directory.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CleanupConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_cleanup_temp: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_retention_hours: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_temp_files: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PdfConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_title: Option<String>,
}

/// Encoded format for captured and processed images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpg),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampFormat {
    #[default]
    Iso,
    Unix,
    Custom,
}

impl FromStr for TimestampFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "iso" => Ok(TimestampFormat::Iso),
            "unix" => Ok(TimestampFormat::Unix),
            "custom" => Ok(TimestampFormat::Custom),
            other => Err(other.to_string()),
        }
    }
}

impl OutputConfig {
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(defaults::default_output_dir)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(defaults::default_temp_dir)
    }

    pub fn use_date_subdirs(&self) -> bool {
        self.use_date_subdirs.unwrap_or(false)
    }

    pub fn use_session_subdirs(&self) -> bool {
        self.use_session_subdirs.unwrap_or(false)
    }
}

impl NamingConfig {
    pub fn file_name_template(&self) -> &str {
        self.file_name_template
            .as_deref()
            .unwrap_or(defaults::DEFAULT_FILE_NAME_TEMPLATE)
    }

    pub fn include_timestamp(&self) -> bool {
        self.include_timestamp.unwrap_or(false)
    }

    /// Unknown values resolve to ISO; `validate_config` rejects them first.
    pub fn timestamp_format(&self) -> TimestampFormat {
        self.timestamp_format
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn custom_timestamp_pattern(&self) -> &str {
        self.custom_timestamp_pattern
            .as_deref()
            .unwrap_or(defaults::DEFAULT_CUSTOM_TIMESTAMP_PATTERN)
    }

    pub fn image_format(&self) -> ImageFormat {
        self.image_format
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn image_quality(&self) -> u8 {
        self.image_quality
            .unwrap_or(defaults::DEFAULT_IMAGE_QUALITY)
    }
}

impl CaptureConfig {
    pub fn navigation_delay(&self) -> Duration {
        Duration::from_millis(
            self.navigation_delay_ms
                .unwrap_or(defaults::DEFAULT_NAVIGATION_DELAY_MS),
        )
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(
            self.settle_delay_ms
                .unwrap_or(defaults::DEFAULT_SETTLE_DELAY_MS),
        )
    }

    pub fn focus_delay(&self) -> Duration {
        Duration::from_millis(self.focus_delay_ms.unwrap_or(defaults::DEFAULT_FOCUS_DELAY_MS))
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            enumeration: Duration::from_millis(
                self.enumeration_timeout_ms
                    .unwrap_or(defaults::DEFAULT_ENUMERATION_TIMEOUT_MS),
            ),
            window_capture: Duration::from_millis(
                self.window_capture_timeout_ms
                    .unwrap_or(defaults::DEFAULT_WINDOW_CAPTURE_TIMEOUT_MS),
            ),
            full_screen: Duration::from_millis(
                self.full_screen_timeout_ms
                    .unwrap_or(defaults::DEFAULT_FULL_SCREEN_TIMEOUT_MS),
            ),
            key: Duration::from_millis(
                self.key_timeout_ms
                    .unwrap_or(defaults::DEFAULT_KEY_TIMEOUT_MS),
            ),
            state: Duration::from_millis(
                self.state_timeout_ms
                    .unwrap_or(defaults::DEFAULT_STATE_TIMEOUT_MS),
            ),
            probe: Duration::from_millis(
                self.probe_timeout_ms
                    .unwrap_or(defaults::DEFAULT_PROBE_TIMEOUT_MS),
            ),
        }
    }
}

impl CleanupConfig {
    pub fn auto_cleanup_temp(&self) -> bool {
        self.auto_cleanup_temp.unwrap_or(true)
    }

    pub fn temp_retention_hours(&self) -> u64 {
        self.temp_retention_hours
            .unwrap_or(defaults::DEFAULT_TEMP_RETENTION_HOURS)
    }

    pub fn max_temp_files(&self) -> usize {
        self.max_temp_files
            .unwrap_or(defaults::DEFAULT_MAX_TEMP_FILES)
    }
}

impl PdfConfig {
    pub fn dpi(&self) -> u32 {
        self.dpi.unwrap_or(defaults::DEFAULT_PDF_DPI)
    }

    pub fn default_title(&self) -> &str {
        self.default_title
            .as_deref()
            .unwrap_or(defaults::DEFAULT_PDF_TITLE)
    }
}

/// Resolved bounds for every external call a backend makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub enumeration: Duration,
    /// Single-window capture. Longer than full screen; rendering an
    /// off-screen window is the heavier path.
    pub window_capture: Duration,
    pub full_screen: Duration,
    pub key: Duration,
    pub state: Duration,
    pub probe: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        CaptureConfig::default().timeouts()
    }
}
