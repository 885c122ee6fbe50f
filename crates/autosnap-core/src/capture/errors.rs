use crate::command::CommandError;
use crate::errors::SnapError;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Capture backend unavailable: {reason}")]
    EnvironmentUnavailable { reason: String },

    #[error("Window '{window_id}' has degenerate geometry {width}x{height}")]
    InvalidGeometry {
        window_id: String,
        width: i32,
        height: i32,
    },

    #[error("{operation} timed out after {timeout_ms}ms")]
    CaptureTimeout { operation: String, timeout_ms: u64 },

    #[error("Window not found: '{window_id}'")]
    WindowNotFound { window_id: String },

    #[error("{operation} failed: {message}")]
    OperationFailed { operation: String, message: String },

    #[error("Failed to encode image: {source}")]
    ImageError {
        #[from]
        source: image::ImageError,
    },

    #[error("IO error during capture: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl CaptureError {
    /// Map a bounded external call failure onto the capture taxonomy.
    pub fn from_command(operation: &str, err: CommandError) -> Self {
        match err {
            CommandError::TimedOut { timeout, .. } => CaptureError::CaptureTimeout {
                operation: operation.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            },
            CommandError::NotFound { program } => CaptureError::EnvironmentUnavailable {
                reason: format!("'{}' is not installed", program),
            },
            other => CaptureError::OperationFailed {
                operation: operation.to_string(),
                message: other.to_string(),
            },
        }
    }

    pub fn operation_failed(operation: &str, message: impl Into<String>) -> Self {
        CaptureError::OperationFailed {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

impl SnapError for CaptureError {
    fn error_code(&self) -> &'static str {
        match self {
            CaptureError::EnvironmentUnavailable { .. } => "ENVIRONMENT_UNAVAILABLE",
            CaptureError::InvalidGeometry { .. } => "INVALID_GEOMETRY",
            CaptureError::CaptureTimeout { .. } => "CAPTURE_TIMEOUT",
            CaptureError::WindowNotFound { .. } => "WINDOW_NOT_FOUND",
            CaptureError::OperationFailed { .. } => "CAPTURE_OPERATION_FAILED",
            CaptureError::ImageError { .. } => "CAPTURE_IMAGE_ERROR",
            CaptureError::IoError { .. } => "CAPTURE_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            CaptureError::WindowNotFound { .. } | CaptureError::InvalidGeometry { .. }
        )
    }
}
