//! Configuration validation.

use crate::config::types::{ImageFormat, SnapConfig, TimestampFormat};
use crate::errors::ConfigError;

/// Validate the merged configuration.
///
/// # Errors
///
/// Returns a `ConfigError` naming the first invalid field.
pub fn validate_config(config: &SnapConfig) -> Result<(), ConfigError> {
    if let Some(format) = &config.naming.image_format
        && format.parse::<ImageFormat>().is_err()
    {
        return Err(ConfigError::InvalidImageFormat {
            format: format.clone(),
        });
    }

    if let Some(format) = &config.naming.timestamp_format
        && format.parse::<TimestampFormat>().is_err()
    {
        return Err(ConfigError::InvalidTimestampFormat {
            format: format.clone(),
        });
    }

    let quality = config.naming.image_quality();
    if !(1..=100).contains(&quality) {
        return Err(ConfigError::InvalidConfiguration {
            message: format!("image_quality must be between 1 and 100, got {}", quality),
        });
    }

    if config.pdf.dpi() == 0 {
        return Err(ConfigError::InvalidConfiguration {
            message: "pdf.dpi must be greater than 0".to_string(),
        });
    }

    let capture = &config.capture;
    let timeouts = [
        ("enumeration_timeout_ms", capture.enumeration_timeout_ms),
        ("window_capture_timeout_ms", capture.window_capture_timeout_ms),
        ("full_screen_timeout_ms", capture.full_screen_timeout_ms),
        ("key_timeout_ms", capture.key_timeout_ms),
        ("state_timeout_ms", capture.state_timeout_ms),
        ("probe_timeout_ms", capture.probe_timeout_ms),
    ];
    for (name, value) in timeouts {
        if value == Some(0) {
            return Err(ConfigError::InvalidConfiguration {
                message: format!("capture.{} must be greater than 0", name),
            });
        }
    }

    Ok(())
}
