use std::time::Duration;

use crate::errors::SnapError;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Tool '{program}' not found on PATH")]
    NotFound { program: String },

    #[error("Failed to spawn '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' timed out after {}ms", .timeout.as_millis())]
    TimedOut { program: String, timeout: Duration },

    #[error("'{program}' exited with code {code:?}: {stderr}")]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Worker for '{operation}' exited without a result")]
    WorkerDisconnected { operation: String },
}

impl CommandError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CommandError::TimedOut { .. })
    }
}

impl SnapError for CommandError {
    fn error_code(&self) -> &'static str {
        match self {
            CommandError::NotFound { .. } => "COMMAND_NOT_FOUND",
            CommandError::SpawnFailed { .. } => "COMMAND_SPAWN_FAILED",
            CommandError::TimedOut { .. } => "COMMAND_TIMED_OUT",
            CommandError::NonZeroExit { .. } => "COMMAND_NON_ZERO_EXIT",
            CommandError::WorkerDisconnected { .. } => "COMMAND_WORKER_DISCONNECTED",
        }
    }
}
