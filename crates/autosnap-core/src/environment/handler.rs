use std::fs;

use tracing::{debug, info};

use super::types::{Environment, HostOs};

const PROC_VERSION_PATH: &str = "/proc/version";

/// Classify the runtime environment.
///
/// Never fails: an unreadable `/proc/version` degrades to the OS-family
/// default.
pub fn detect() -> Environment {
    let proc_version = match fs::read_to_string(PROC_VERSION_PATH) {
        Ok(content) => Some(content),
        Err(e) => {
            debug!(
                event = "core.environment.proc_version_unreadable",
                error = %e
            );
            None
        }
    };

    let environment = classify(proc_version.as_deref(), HostOs::current());
    info!(
        event = "core.environment.detect_completed",
        environment = %environment
    );
    environment
}

/// Pure classification over the host signals.
pub fn classify(proc_version: Option<&str>, os: HostOs) -> Environment {
    if let Some(version) = proc_version {
        let lower = version.to_ascii_lowercase();
        if lower.contains("microsoft") || lower.contains("wsl") {
            return Environment::HostedWindowsAccess;
        }
    }

    match os {
        HostOs::Windows => Environment::NativeWindows,
        HostOs::Linux | HostOs::Other => Environment::NativeLinux,
    }
}
