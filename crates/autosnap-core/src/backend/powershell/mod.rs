//! Windows desktop backend driven through `powershell.exe`.
//!
//! Serves both native Windows and a Linux host with access to a Windows
//! desktop (WSL). The only difference between the two is how the bridge's
//! Windows paths are read back: hosted mode converts them with `wslpath`.

pub mod scripts;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::traits::{DesktopBackend, FrameCapturer, KeySender, WindowControl, WindowEnumerator};
use crate::capture::{CaptureError, save_image};
use crate::command::{self, CommandError, CommandOutput};
use crate::config::Timeouts;
use crate::window::{
    NavigationKey, WindowHandle, WindowInfo, WindowRect, WindowVisibility, WindowVisibilityState,
    display_title,
};

const POWERSHELL: &str = "powershell.exe";
const WSLPATH_TIMEOUT: Duration = Duration::from_secs(5);

/// How bridge-side file paths are reached from this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeMode {
    Native,
    Hosted,
}

#[derive(Debug, Clone)]
pub struct PowerShellBackend {
    mode: BridgeMode,
    timeouts: Timeouts,
    image_quality: u8,
    bridge_available: bool,
}

impl PowerShellBackend {
    /// Create a backend, probing the bridge once.
    pub fn connect(mode: BridgeMode, timeouts: Timeouts, image_quality: u8) -> Self {
        let bridge_available = probe_bridge(timeouts.probe);
        Self {
            mode,
            timeouts,
            image_quality,
            bridge_available,
        }
    }

    pub fn mode(&self) -> BridgeMode {
        self.mode
    }

    pub fn bridge_available(&self) -> bool {
        self.bridge_available
    }

    fn ensure_bridge(&self) -> Result<(), CaptureError> {
        if self.bridge_available {
            Ok(())
        } else {
            Err(CaptureError::EnvironmentUnavailable {
                reason: format!("{} bridge did not respond", POWERSHELL),
            })
        }
    }

    fn run(&self, script: &str, timeout: Duration) -> Result<CommandOutput, CommandError> {
        command::run_checked(powershell_command(script), timeout)
    }

    fn run_for(
        &self,
        operation: &str,
        script: &str,
        timeout: Duration,
    ) -> Result<String, CaptureError> {
        self.ensure_bridge()?;
        self.run(script, timeout)
            .map(|o| o.stdout.trim().to_string())
            .map_err(|e| CaptureError::from_command(operation, e))
    }

    fn hwnd(handle: &WindowHandle) -> Result<i64, CaptureError> {
        handle
            .numeric_id()
            .and_then(|id| i64::try_from(id).ok())
            .filter(|id| *id != 0)
            .ok_or_else(|| CaptureError::WindowNotFound {
                window_id: handle.id().to_string(),
            })
    }

    /// Turn a path printed by the bridge into one this process can open.
    fn local_path(&self, bridge_path: &str) -> PathBuf {
        match self.mode {
            BridgeMode::Native => PathBuf::from(bridge_path),
            BridgeMode::Hosted => to_wsl_path(bridge_path),
        }
    }

    /// Read the bridge's PNG, re-encode it at `destination` and remove the
    /// bridge temp file.
    fn collect_capture(
        &self,
        bridge_output: &str,
        destination: &Path,
        window_id: &str,
    ) -> Result<PathBuf, CaptureError> {
        let (bridge_path, method) = parse_path_marker(bridge_output).ok_or_else(|| {
            CaptureError::operation_failed("capture", format!("unexpected bridge output: {}", bridge_output))
        })?;

        let local = self.local_path(bridge_path);
        let loaded = image::open(&local);
        if let Err(e) = fs::remove_file(&local) {
            debug!(
                event = "core.powershell.temp_remove_failed",
                path = %local.display(),
                error = %e
            );
        }
        let image = loaded?.to_rgba8();

        save_image(&image, destination, window_id, self.image_quality)?;
        info!(
            event = "core.powershell.capture_completed",
            window_id = window_id,
            method = method,
            path = %destination.display(),
            width = image.width(),
            height = image.height()
        );
        Ok(destination.to_path_buf())
    }

    fn capture_full_screen(&self, destination: &Path) -> Result<PathBuf, CaptureError> {
        let script = scripts::capture_full_screen(&temp_file_stem());
        let output = self.run_for("full screen capture", &script, self.timeouts.full_screen)?;
        self.collect_capture(&output, destination, "fullscreen")
    }
}

impl WindowEnumerator for PowerShellBackend {
    fn list_windows(&self) -> Vec<WindowInfo> {
        info!(event = "core.powershell.list_started", mode = ?self.mode);

        let output = match self.run_for(
            "window enumeration",
            &scripts::list_windows(),
            self.timeouts.enumeration,
        ) {
            Ok(output) => output,
            Err(e) => {
                warn!(event = "core.powershell.list_failed", error = %e);
                return Vec::new();
            }
        };

        let windows = match parse_window_list(&output) {
            Ok(windows) => windows,
            Err(e) => {
                warn!(event = "core.powershell.list_parse_failed", error = %e);
                return Vec::new();
            }
        };

        info!(event = "core.powershell.list_completed", count = windows.len());
        windows
    }
}

impl WindowControl for PowerShellBackend {
    fn query_state(&self, handle: &WindowHandle) -> Result<WindowVisibilityState, CaptureError> {
        let hwnd = Self::hwnd(handle)?;
        let output = self.run_for(
            "window state query",
            &scripts::query_state(hwnd),
            self.timeouts.state,
        )?;
        if output == scripts::MARKER_NOT_FOUND {
            return Err(CaptureError::WindowNotFound {
                window_id: handle.id().to_string(),
            });
        }

        let raw: RawWindowState = serde_json::from_str(&output)
            .map_err(|e| CaptureError::operation_failed("window state query", e.to_string()))?;
        Ok(raw.into_state())
    }

    fn set_visibility(
        &self,
        handle: &WindowHandle,
        visibility: WindowVisibility,
    ) -> Result<(), CaptureError> {
        let hwnd = Self::hwnd(handle)?;
        let show_command = match visibility {
            WindowVisibility::Normal => scripts::SW_RESTORE,
            WindowVisibility::Maximized => scripts::SW_MAXIMIZE,
            WindowVisibility::Minimized => scripts::SW_MINIMIZE,
            WindowVisibility::Hidden => scripts::SW_HIDE,
        };
        debug!(
            event = "core.powershell.set_visibility_started",
            window_id = handle.id(),
            visibility = %visibility,
            show_command = show_command
        );

        let output = self.run_for(
            "window state change",
            &scripts::show_window(hwnd, show_command),
            self.timeouts.state,
        )?;
        if output == scripts::MARKER_NOT_FOUND {
            return Err(CaptureError::WindowNotFound {
                window_id: handle.id().to_string(),
            });
        }
        Ok(())
    }

    fn bring_to_foreground(&self, handle: &WindowHandle) -> Result<(), CaptureError> {
        let hwnd = Self::hwnd(handle)?;
        let output = self.run_for(
            "window focus",
            &scripts::set_foreground(hwnd),
            self.timeouts.state,
        )?;
        match output.as_str() {
            "OK" => Ok(()),
            m if m == scripts::MARKER_NOT_FOUND => Err(CaptureError::WindowNotFound {
                window_id: handle.id().to_string(),
            }),
            other => Err(CaptureError::operation_failed("window focus", other)),
        }
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        let output = self
            .run_for(
                "foreground query",
                &scripts::foreground_window(),
                self.timeouts.state,
            )
            .ok()?;
        let hwnd: i64 = output.parse().ok()?;
        (hwnd != 0).then(|| WindowHandle::from_id(hwnd.to_string()))
    }
}

impl FrameCapturer for PowerShellBackend {
    fn capture(
        &self,
        handle: Option<&WindowHandle>,
        destination: &Path,
    ) -> Result<PathBuf, CaptureError> {
        let Some(handle) = handle else {
            return self.capture_full_screen(destination);
        };

        let hwnd = Self::hwnd(handle)?;
        let script = scripts::capture_window(hwnd, &temp_file_stem());
        let output = self.run_for("window capture", &script, self.timeouts.window_capture)?;

        if output == scripts::MARKER_NOT_FOUND {
            return Err(CaptureError::WindowNotFound {
                window_id: handle.id().to_string(),
            });
        }
        if output == scripts::MARKER_NO_RECT {
            warn!(
                event = "core.powershell.geometry_unavailable",
                window_id = handle.id(),
                fallback = "full_screen"
            );
            return self.capture_full_screen(destination);
        }
        if let Some((width, height)) = parse_invalid_geometry(&output) {
            return Err(CaptureError::InvalidGeometry {
                window_id: handle.id().to_string(),
                width,
                height,
            });
        }
        if output == scripts::MARKER_CAPTURE_FAILED {
            return Err(CaptureError::operation_failed(
                "window capture",
                "PrintWindow failed for a minimized window",
            ));
        }

        self.collect_capture(&output, destination, handle.id())
    }
}

impl KeySender for PowerShellBackend {
    fn send(&self, handle: &WindowHandle, key: NavigationKey) -> bool {
        let hwnd = match Self::hwnd(handle) {
            Ok(hwnd) => hwnd,
            Err(e) => {
                warn!(event = "core.powershell.key_send_failed", error = %e);
                return false;
            }
        };

        match self.run_for("key delivery", &scripts::send_key(hwnd, key), self.timeouts.key) {
            Ok(output) if output == "OK" => {
                debug!(
                    event = "core.powershell.key_sent",
                    window_id = handle.id(),
                    key = %key
                );
                true
            }
            Ok(output) => {
                warn!(
                    event = "core.powershell.key_send_failed",
                    window_id = handle.id(),
                    key = %key,
                    output = %output
                );
                false
            }
            Err(e) => {
                warn!(
                    event = "core.powershell.key_send_failed",
                    window_id = handle.id(),
                    key = %key,
                    error = %e
                );
                false
            }
        }
    }

    fn resolve_navigation_target(&self, handle: &WindowHandle) -> WindowHandle {
        let Ok(hwnd) = Self::hwnd(handle) else {
            return handle.clone();
        };

        let child = self
            .run_for(
                "child window lookup",
                &scripts::find_content_child(hwnd),
                self.timeouts.state,
            )
            .ok()
            .and_then(|out| out.parse::<i64>().ok())
            .filter(|id| *id != 0);

        match child {
            Some(child) => {
                info!(
                    event = "core.powershell.navigation_target_resolved",
                    window_id = handle.id(),
                    child_id = child
                );
                WindowHandle::new(child.to_string(), handle.title(), handle.process_name())
            }
            None => handle.clone(),
        }
    }
}

impl DesktopBackend for PowerShellBackend {
    fn name(&self) -> &'static str {
        match self.mode {
            BridgeMode::Native => "powershell",
            BridgeMode::Hosted => "powershell_bridge",
        }
    }

    fn is_available(&self) -> bool {
        self.bridge_available
    }
}

fn powershell_command(script: &str) -> Command {
    let mut cmd = Command::new(POWERSHELL);
    cmd.args([
        "-NoProfile",
        "-NonInteractive",
        "-ExecutionPolicy",
        "Bypass",
        "-Command",
        script,
    ]);
    cmd
}

/// Whether `powershell.exe` answers a trivial script within `timeout`.
pub fn probe_bridge(timeout: Duration) -> bool {
    match command::run_checked(powershell_command(&scripts::probe()), timeout) {
        Ok(output) if output.stdout.contains("AUTOSNAP_OK") => {
            debug!(event = "core.powershell.probe_completed");
            true
        }
        Ok(output) => {
            warn!(
                event = "core.powershell.probe_failed",
                stdout = %output.stdout.trim()
            );
            false
        }
        Err(e) => {
            warn!(event = "core.powershell.probe_failed", error = %e);
            false
        }
    }
}

fn temp_file_stem() -> String {
    format!("autosnap_{}", uuid::Uuid::new_v4().simple())
}

/// Convert a Windows path for use from WSL: `wslpath -u` first, then a
/// manual `X:\` to `/mnt/x/` rewrite.
pub fn to_wsl_path(windows_path: &str) -> PathBuf {
    let mut cmd = Command::new("wslpath");
    cmd.args(["-u", windows_path]);
    match command::run_checked(cmd, WSLPATH_TIMEOUT) {
        Ok(output) if !output.stdout.trim().is_empty() => PathBuf::from(output.stdout.trim()),
        Ok(_) => manual_wsl_path(windows_path),
        Err(e) => {
            debug!(event = "core.powershell.wslpath_failed", error = %e);
            manual_wsl_path(windows_path)
        }
    }
}

fn manual_wsl_path(windows_path: &str) -> PathBuf {
    let mut chars = windows_path.chars();
    match (chars.next(), chars.next()) {
        (Some(drive), Some(':')) if drive.is_ascii_alphabetic() => {
            let rest = chars.as_str().trim_start_matches(['\\', '/']).replace('\\', "/");
            PathBuf::from(format!("/mnt/{}/{}", drive.to_ascii_lowercase(), rest))
        }
        _ => PathBuf::from(windows_path.replace('\\', "/")),
    }
}

fn parse_path_marker(output: &str) -> Option<(&str, &str)> {
    let line = output
        .lines()
        .rev()
        .find(|l| l.starts_with(scripts::MARKER_PATH))?;
    let payload = line.strip_prefix(scripts::MARKER_PATH)?.trim();
    Some(payload.split_once('|').unwrap_or((payload, "unknown")))
}

fn parse_invalid_geometry(output: &str) -> Option<(i32, i32)> {
    let dims = output.strip_prefix(scripts::MARKER_INVALID_GEOMETRY)?;
    let (w, h) = dims.trim().split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

#[derive(Debug, Deserialize)]
struct RawWindowState {
    visible: bool,
    minimized: bool,
    maximized: bool,
    foreground: bool,
}

impl RawWindowState {
    fn into_state(self) -> WindowVisibilityState {
        let visibility = visibility_from_flags(self.visible, self.minimized, self.maximized);
        WindowVisibilityState::new(visibility, self.foreground)
    }
}

fn visibility_from_flags(visible: bool, minimized: bool, maximized: bool) -> WindowVisibility {
    if minimized {
        WindowVisibility::Minimized
    } else if !visible {
        WindowVisibility::Hidden
    } else if maximized {
        WindowVisibility::Maximized
    } else {
        WindowVisibility::Normal
    }
}

#[derive(Debug, Deserialize)]
struct RawWindow {
    hwnd: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    process_name: Option<String>,
    #[serde(default)]
    pid: Option<u32>,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    visible: bool,
    minimized: bool,
    maximized: bool,
}

/// `ConvertTo-Json` emits a bare object for one result and an array for
/// several.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<RawWindow>),
    One(RawWindow),
}

fn parse_window_list(output: &str) -> Result<Vec<WindowInfo>, serde_json::Error> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let raw = match serde_json::from_str::<OneOrMany>(trimmed)? {
        OneOrMany::Many(list) => list,
        OneOrMany::One(one) => vec![one],
    };

    Ok(raw
        .into_iter()
        .filter(|w| w.hwnd != 0)
        .map(|w| {
            let id = w.hwnd.to_string();
            let process_name = w.process_name.unwrap_or_default();
            let title = display_title(w.title.as_deref().unwrap_or(""), &process_name, &id);
            let state = visibility_from_flags(w.visible, w.minimized, w.maximized);
            WindowInfo::new(
                WindowHandle::new(id, title, process_name),
                w.pid,
                Some(WindowRect::new(w.x, w.y, w.width, w.height)),
                state,
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_window_list_single_object() {
        let json = r#"{"hwnd":131844,"title":"","process_name":"notepad","pid":4100,"x":10,"y":20,"width":640,"height":480,"visible":true,"minimized":false,"maximized":false}"#;
        let windows = parse_window_list(json).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].id(), "131844");
        assert_eq!(windows[0].title(), "[notepad - 131844]");
        assert_eq!(windows[0].state(), WindowVisibility::Normal);
    }

    #[test]
    fn test_parse_window_list_array_filters_zero_handles() {
        let json = r#"[
            {"hwnd":0,"title":"ghost","process_name":"x","pid":1,"x":0,"y":0,"width":1,"height":1,"visible":true,"minimized":false,"maximized":false},
            {"hwnd":200,"title":"Report.pdf","process_name":"AcroRd32","pid":2,"x":-32000,"y":-32000,"width":160,"height":28,"visible":true,"minimized":true,"maximized":false},
            {"hwnd":300,"title":"Mail","process_name":"outlook","pid":3,"x":0,"y":0,"width":1920,"height":1040,"visible":true,"minimized":false,"maximized":true}
        ]"#;
        let windows = parse_window_list(json).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].state(), WindowVisibility::Minimized);
        assert_eq!(windows[1].state(), WindowVisibility::Maximized);
    }

    #[test]
    fn test_parse_window_list_empty_output() {
        assert!(parse_window_list("").unwrap().is_empty());
        assert!(parse_window_list("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_window_list_garbage_is_error() {
        assert!(parse_window_list("Add-Type : error").is_err());
    }

    #[test]
    fn test_parse_path_marker() {
        let out = "noise\nPATH:C:\\Users\\me\\AppData\\Local\\Temp\\autosnap_1.png|print_window";
        let (path, method) = parse_path_marker(out).unwrap();
        assert_eq!(path, "C:\\Users\\me\\AppData\\Local\\Temp\\autosnap_1.png");
        assert_eq!(method, "print_window");
        assert!(parse_path_marker("NO_RECT").is_none());
    }

    #[test]
    fn test_parse_invalid_geometry() {
        assert_eq!(parse_invalid_geometry("INVALID_GEOMETRY:0x480"), Some((0, 480)));
        assert_eq!(parse_invalid_geometry("INVALID_GEOMETRY:-5x-5"), Some((-5, -5)));
        assert_eq!(parse_invalid_geometry("PATH:c.png"), None);
    }

    #[test]
    fn test_manual_wsl_path() {
        assert_eq!(
            manual_wsl_path("C:\\Users\\me\\Temp\\a.png"),
            PathBuf::from("/mnt/c/Users/me/Temp/a.png")
        );
        assert_eq!(manual_wsl_path("relative\\b.png"), PathBuf::from("relative/b.png"));
    }

    #[test]
    fn test_visibility_from_flags_precedence() {
        assert_eq!(visibility_from_flags(false, true, false), WindowVisibility::Minimized);
        assert_eq!(visibility_from_flags(false, false, false), WindowVisibility::Hidden);
        assert_eq!(visibility_from_flags(true, false, true), WindowVisibility::Maximized);
        assert_eq!(visibility_from_flags(true, false, false), WindowVisibility::Normal);
    }

    #[test]
    fn test_raw_state_parses_bridge_json() {
        let raw: RawWindowState = serde_json::from_str(
            r#"{"visible":true,"minimized":false,"maximized":false,"foreground":true}"#,
        )
        .unwrap();
        let state = raw.into_state();
        assert_eq!(state.visibility, WindowVisibility::Normal);
        assert!(state.is_foreground);
    }

    #[test]
    fn test_unavailable_bridge_lists_nothing_and_refuses_capture() {
        let backend = PowerShellBackend {
            mode: BridgeMode::Hosted,
            timeouts: Timeouts::default(),
            image_quality: 95,
            bridge_available: false,
        };
        assert!(backend.list_windows().is_empty());
        let err = backend
            .capture(Some(&WindowHandle::from_id("42")), Path::new("out.png"))
            .unwrap_err();
        assert!(matches!(err, CaptureError::EnvironmentUnavailable { .. }));
        assert!(!backend.send(&WindowHandle::from_id("42"), NavigationKey::Down));
    }
}
