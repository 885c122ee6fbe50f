use std::time::Duration;

use tracing::{info, warn};

use super::types::{
    DependencyReport, DependencyStatus, POWERSHELL_BRIDGE, TESSERACT, Tool, WMCTRL, XDOTOOL,
};
use crate::backend::powershell::probe_bridge;
use crate::command;
use crate::environment::Environment;
use crate::processing::check_tesseract;

/// Tools the desktop backend for `environment` needs.
///
/// A hosted environment needs the bridge, and the X11 tools for the
/// fallback path.
pub fn backend_tools(environment: Environment) -> Vec<Tool> {
    match environment {
        Environment::NativeLinux => vec![WMCTRL, XDOTOOL],
        Environment::NativeWindows => vec![POWERSHELL_BRIDGE],
        Environment::HostedWindowsAccess => vec![POWERSHELL_BRIDGE, WMCTRL, XDOTOOL],
    }
}

/// Backend tools that are not on PATH. Does not run anything.
pub fn missing_backend_tools(environment: Environment) -> Vec<String> {
    backend_tools(environment)
        .into_iter()
        .filter(|tool| !command::is_available(tool.program))
        .map(|tool| tool.name.to_string())
        .collect()
}

/// Check every external tool the crate can use.
///
/// Tesseract is run with `--version` and the bridge is probed with a trivial
/// script, so this can take up to `probe_timeout` per check.
pub fn check_dependencies(environment: Environment, probe_timeout: Duration) -> DependencyReport {
    info!(event = "core.dependencies.check_started", environment = %environment);

    let mut dependencies: Vec<DependencyStatus> = backend_tools(environment)
        .into_iter()
        .map(|tool| {
            let available = if tool == POWERSHELL_BRIDGE {
                probe_bridge(probe_timeout)
            } else {
                command::is_available(tool.program)
            };
            status(tool, available)
        })
        .collect();
    dependencies.push(status(TESSERACT, check_tesseract()));

    let report = DependencyReport {
        environment,
        dependencies,
    };

    let missing = report.missing();
    if missing.is_empty() {
        info!(event = "core.dependencies.check_completed", missing = 0);
    } else {
        warn!(
            event = "core.dependencies.check_completed",
            missing = missing.len(),
            tools = ?missing
        );
    }
    report
}

fn status(tool: Tool, available: bool) -> DependencyStatus {
    DependencyStatus {
        name: tool.name,
        available,
        purpose: tool.purpose,
        install_hint: tool.install_hint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_tools_per_environment() {
        let names = |env| {
            backend_tools(env)
                .into_iter()
                .map(|t| t.name)
                .collect::<Vec<_>>()
        };
        assert_eq!(names(Environment::NativeLinux), vec!["wmctrl", "xdotool"]);
        assert_eq!(names(Environment::NativeWindows), vec!["powershell"]);
        assert_eq!(
            names(Environment::HostedWindowsAccess),
            vec!["powershell", "wmctrl", "xdotool"]
        );
    }

    #[test]
    fn test_report_missing_and_all_available() {
        let report = DependencyReport {
            environment: Environment::NativeLinux,
            dependencies: vec![status(WMCTRL, true), status(TESSERACT, false)],
        };
        assert_eq!(report.missing(), vec!["tesseract"]);
        assert!(!report.all_available());
    }

    #[test]
    fn test_missing_backend_tools_subset_of_backend_tools() {
        let all: Vec<String> = backend_tools(Environment::NativeLinux)
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        for missing in missing_backend_tools(Environment::NativeLinux) {
            assert!(all.contains(&missing));
        }
    }
}
