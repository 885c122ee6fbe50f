//! Process lifecycle events shared by every entry point.

use tracing::{error, info, warn};

use crate::environment::Environment;
use crate::errors::SnapError;

pub fn log_app_startup(environment: Environment, backend: &str) {
    info!(
        event = "core.app.startup_completed",
        version = env!("CARGO_PKG_VERSION"),
        environment = %environment,
        backend = backend
    );
}

pub fn log_app_shutdown() {
    info!(event = "core.app.shutdown_started");
}

/// Log a failure with its machine-readable code.
///
/// Caller mistakes are logged at warn level; system faults at error.
pub fn log_app_error(error: &dyn SnapError) {
    if error.is_user_error() {
        warn!(
            event = "core.app.error_occurred",
            error = %error,
            error_code = error.error_code(),
            user_error = true
        );
    } else {
        error!(
            event = "core.app.error_occurred",
            error = %error,
            error_code = error.error_code(),
            user_error = false
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConfigError;

    #[test]
    fn test_app_events_do_not_panic() {
        log_app_startup(Environment::NativeLinux, "x11");
        log_app_shutdown();

        log_app_error(&ConfigError::InvalidImageFormat {
            format: "webp".to_string(),
        });
    }
}
