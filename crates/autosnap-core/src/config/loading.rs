//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.autosnap/config.toml`
//! 3. **Project config** - `./.autosnap/config.toml`
//! 4. **Environment** - `AUTO_SNAP_*` variables
//! 5. **Tool arguments** - Per-call overrides (highest priority)

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::types::{
    CaptureConfig, CleanupConfig, NamingConfig, OutputConfig, PdfConfig, SnapConfig,
};
use crate::config::validation::validate_config;
use crate::errors::ConfigError;

const CONFIG_DIR: &str = ".autosnap";
const CONFIG_FILE: &str = "config.toml";

/// Load configuration from the hierarchy of config files and the process
/// environment.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be parsed, or if the
/// merged configuration fails validation. Missing config files are not errors.
pub fn load_hierarchy() -> Result<SnapConfig, ConfigError> {
    let mut config = SnapConfig::default();

    if let Some(home_dir) = dirs::home_dir() {
        let user_path = home_dir.join(CONFIG_DIR).join(CONFIG_FILE);
        if let Some(user_config) = load_config_file(&user_path)? {
            config = merge_configs(config, user_config);
        }
    }

    let project_path = std::env::current_dir()?.join(CONFIG_DIR).join(CONFIG_FILE);
    if let Some(project_config) = load_config_file(&project_path)? {
        config = merge_configs(config, project_config);
    }

    let config = apply_env_overrides(config, |key| std::env::var(key).ok());

    validate_config(&config)?;

    Ok(config)
}

/// Load a configuration file, returning `None` when it does not exist.
pub fn load_config_file(path: &Path) -> Result<Option<SnapConfig>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(event = "core.config.file_not_found", path = %path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let config: SnapConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ConfigParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    debug!(event = "core.config.file_loaded", path = %path.display());
    Ok(Some(config))
}

/// Merge two configurations, with override_config taking precedence
/// wherever it sets a value.
pub fn merge_configs(base: SnapConfig, override_config: SnapConfig) -> SnapConfig {
    let o = override_config;
    SnapConfig {
        output: OutputConfig {
            dir: o.output.dir.or(base.output.dir),
            temp_dir: o.output.temp_dir.or(base.output.temp_dir),
            use_date_subdirs: o.output.use_date_subdirs.or(base.output.use_date_subdirs),
            use_session_subdirs: o
                .output
                .use_session_subdirs
                .or(base.output.use_session_subdirs),
            session_id: o.output.session_id.or(base.output.session_id),
            project_name: o.output.project_name.or(base.output.project_name),
        },
        naming: NamingConfig {
            file_name_template: o
                .naming
                .file_name_template
                .or(base.naming.file_name_template),
            include_timestamp: o.naming.include_timestamp.or(base.naming.include_timestamp),
            timestamp_format: o.naming.timestamp_format.or(base.naming.timestamp_format),
            custom_timestamp_pattern: o
                .naming
                .custom_timestamp_pattern
                .or(base.naming.custom_timestamp_pattern),
            image_format: o.naming.image_format.or(base.naming.image_format),
            image_quality: o.naming.image_quality.or(base.naming.image_quality),
        },
        capture: CaptureConfig {
            navigation_delay_ms: o
                .capture
                .navigation_delay_ms
                .or(base.capture.navigation_delay_ms),
            settle_delay_ms: o.capture.settle_delay_ms.or(base.capture.settle_delay_ms),
            focus_delay_ms: o.capture.focus_delay_ms.or(base.capture.focus_delay_ms),
            enumeration_timeout_ms: o
                .capture
                .enumeration_timeout_ms
                .or(base.capture.enumeration_timeout_ms),
            window_capture_timeout_ms: o
                .capture
                .window_capture_timeout_ms
                .or(base.capture.window_capture_timeout_ms),
            full_screen_timeout_ms: o
                .capture
                .full_screen_timeout_ms
                .or(base.capture.full_screen_timeout_ms),
            key_timeout_ms: o.capture.key_timeout_ms.or(base.capture.key_timeout_ms),
            state_timeout_ms: o.capture.state_timeout_ms.or(base.capture.state_timeout_ms),
            probe_timeout_ms: o.capture.probe_timeout_ms.or(base.capture.probe_timeout_ms),
        },
        cleanup: CleanupConfig {
            auto_cleanup_temp: o.cleanup.auto_cleanup_temp.or(base.cleanup.auto_cleanup_temp),
            temp_retention_hours: o
                .cleanup
                .temp_retention_hours
                .or(base.cleanup.temp_retention_hours),
            max_temp_files: o.cleanup.max_temp_files.or(base.cleanup.max_temp_files),
        },
        pdf: PdfConfig {
            dpi: o.pdf.dpi.or(base.pdf.dpi),
            default_title: o.pdf.default_title.or(base.pdf.default_title),
        },
    }
}

/// Apply `AUTO_SNAP_*` overrides read through `lookup`.
///
/// Values that fail to parse are logged and ignored.
pub fn apply_env_overrides<F>(mut config: SnapConfig, lookup: F) -> SnapConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("AUTO_SNAP_OUTPUT_DIR") {
        config.output.dir = Some(expand_home(&v));
    }
    if let Some(v) = lookup("AUTO_SNAP_TEMP_DIR") {
        config.output.temp_dir = Some(expand_home(&v));
    }
    if let Some(v) = env_bool(&lookup, "AUTO_SNAP_USE_DATE_SUBDIRS") {
        config.output.use_date_subdirs = Some(v);
    }
    if let Some(v) = env_bool(&lookup, "AUTO_SNAP_USE_SESSION_SUBDIRS") {
        config.output.use_session_subdirs = Some(v);
    }
    if let Some(v) = lookup("AUTO_SNAP_SESSION_ID") {
        config.output.session_id = Some(v);
    }
    if let Some(v) = lookup("AUTO_SNAP_PROJECT_NAME") {
        config.output.project_name = Some(v);
    }
    if let Some(v) = lookup("AUTO_SNAP_FILE_NAME_TEMPLATE") {
        config.naming.file_name_template = Some(v);
    }
    if let Some(v) = env_bool(&lookup, "AUTO_SNAP_INCLUDE_TIMESTAMP") {
        config.naming.include_timestamp = Some(v);
    }
    if let Some(v) = lookup("AUTO_SNAP_TIMESTAMP_FORMAT") {
        config.naming.timestamp_format = Some(v);
    }
    if let Some(v) = lookup("AUTO_SNAP_CUSTOM_TIMESTAMP") {
        config.naming.custom_timestamp_pattern = Some(v);
    }
    if let Some(v) = lookup("AUTO_SNAP_IMAGE_FORMAT") {
        config.naming.image_format = Some(v);
    }
    if let Some(v) = env_parsed::<u8, _>(&lookup, "AUTO_SNAP_IMAGE_QUALITY") {
        config.naming.image_quality = Some(v);
    }
    if let Some(v) = env_bool(&lookup, "AUTO_SNAP_AUTO_CLEANUP_TEMP") {
        config.cleanup.auto_cleanup_temp = Some(v);
    }
    if let Some(v) = env_parsed::<u64, _>(&lookup, "AUTO_SNAP_TEMP_RETENTION_HOURS") {
        config.cleanup.temp_retention_hours = Some(v);
    }
    if let Some(v) = env_parsed::<usize, _>(&lookup, "AUTO_SNAP_MAX_TEMP_FILES") {
        config.cleanup.max_temp_files = Some(v);
    }
    config
}

fn env_bool<F>(lookup: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => {
            warn!(
                event = "core.config.env_override_invalid",
                key = key,
                value = %raw,
                expected = "boolean"
            );
            None
        }
    }
}

fn env_parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(
                event = "core.config.env_override_invalid",
                key = key,
                value = %raw,
                expected = std::any::type_name::<T>()
            );
            None
        }
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    if raw == "~"
        && let Some(home) = dirs::home_dir()
    {
        return home;
    }
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_config_file_missing_returns_none() {
        let temp = tempfile::tempdir().unwrap();
        let result = load_config_file(&temp.path().join("config.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_load_config_file_parses_sections() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[output]
dir = "/tmp/snaps"
use_date_subdirs = true

[naming]
image_format = "jpg"
image_quality = 80

[capture]
navigation_delay_ms = 250

[pdf]
dpi = 300
"#,
        )
        .unwrap();

        let config = load_config_file(&path).unwrap().unwrap();
        assert_eq!(config.output.dir, Some(PathBuf::from("/tmp/snaps")));
        assert!(config.output.use_date_subdirs());
        assert_eq!(config.naming.image_quality(), 80);
        assert_eq!(
            config.capture.navigation_delay(),
            std::time::Duration::from_millis(250)
        );
        assert_eq!(config.pdf.dpi(), 300);
    }

    #[test]
    fn test_load_config_file_invalid_toml_is_parse_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[output\ndir = ").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
    }

    #[test]
    fn test_merge_configs_override_wins_and_base_fills_gaps() {
        let mut user = SnapConfig::default();
        user.output.dir = Some(PathBuf::from("/home/user/snaps"));
        user.naming.image_format = Some("jpg".to_string());

        let mut project = SnapConfig::default();
        project.naming.image_format = Some("png".to_string());
        project.pdf.dpi = Some(200);

        let merged = merge_configs(user, project);
        assert_eq!(merged.output.dir, Some(PathBuf::from("/home/user/snaps")));
        assert_eq!(merged.naming.image_format.as_deref(), Some("png"));
        assert_eq!(merged.pdf.dpi(), 200);
    }

    #[test]
    fn test_env_overrides_apply_and_ignore_garbage() {
        let lookup = lookup_from(&[
            ("AUTO_SNAP_OUTPUT_DIR", "/srv/captures"),
            ("AUTO_SNAP_USE_DATE_SUBDIRS", "TRUE"),
            ("AUTO_SNAP_IMAGE_QUALITY", "not-a-number"),
            ("AUTO_SNAP_MAX_TEMP_FILES", "12"),
        ]);

        let config = apply_env_overrides(SnapConfig::default(), lookup);
        assert_eq!(config.output.dir, Some(PathBuf::from("/srv/captures")));
        assert!(config.output.use_date_subdirs());
        assert_eq!(config.naming.image_quality, None);
        assert_eq!(config.cleanup.max_temp_files(), 12);
    }

    #[test]
    fn test_expand_home_leaves_absolute_paths() {
        assert_eq!(expand_home("/var/tmp"), PathBuf::from("/var/tmp"));
    }
}
