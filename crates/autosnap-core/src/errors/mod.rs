use std::error::Error;

/// Base trait for all application errors
pub trait SnapError: Error + Send + Sync + 'static {
    /// Error code for programmatic handling
    fn error_code(&self) -> &'static str;

    /// Whether this error was caused by the caller rather than the system
    fn is_user_error(&self) -> bool {
        false
    }
}

/// Common result type for the application
pub type SnapResult<T> = Result<T, Box<dyn SnapError>>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config file '{path}': {message}")]
    ConfigParseError { path: String, message: String },

    #[error("Invalid image format '{format}'. Supported formats: png, jpg")]
    InvalidImageFormat { format: String },

    #[error("Invalid timestamp format '{format}'. Supported formats: iso, unix, custom")]
    InvalidTimestampFormat { format: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Could not determine home directory")]
    HomeDirectoryNotFound,

    #[error("IO error reading config: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl SnapError for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::ConfigParseError { .. } => "CONFIG_PARSE_ERROR",
            ConfigError::InvalidImageFormat { .. } => "INVALID_IMAGE_FORMAT",
            ConfigError::InvalidTimestampFormat { .. } => "INVALID_TIMESTAMP_FORMAT",
            ConfigError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            ConfigError::HomeDirectoryNotFound => "HOME_DIRECTORY_NOT_FOUND",
            ConfigError::IoError { .. } => "CONFIG_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            ConfigError::ConfigParseError { .. }
                | ConfigError::InvalidImageFormat { .. }
                | ConfigError::InvalidTimestampFormat { .. }
                | ConfigError::InvalidConfiguration { .. }
        )
    }
}
