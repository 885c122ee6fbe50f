use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime environment the process is hosted in.
///
/// Determined once at startup and held for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    NativeLinux,
    NativeWindows,
    /// Linux with a bridge to a co-located Windows desktop (WSL).
    HostedWindowsAccess,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::NativeLinux => "native_linux",
            Environment::NativeWindows => "native_windows",
            Environment::HostedWindowsAccess => "hosted_windows_access",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host operating system family as seen by the compiled binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Linux,
    Windows,
    Other,
}

impl HostOs {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            HostOs::Windows
        } else if cfg!(target_os = "linux") {
            HostOs::Linux
        } else {
            HostOs::Other
        }
    }
}

/// Snapshot of what the environment can do, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentInfo {
    pub environment: Environment,
    pub backend: &'static str,
    pub bridge_available: bool,
    pub missing_tools: Vec<String>,
}
