//! Native Linux backend driving an X server through wmctrl, xdotool,
//! xprop and xwininfo, with pixels read through xcap.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use image::RgbaImage;
use tracing::{debug, info, warn};

use super::traits::{DesktopBackend, FrameCapturer, KeySender, WindowControl, WindowEnumerator};
use crate::capture::{CaptureError, save_image};
use crate::command;
use crate::config::Timeouts;
use crate::window::{
    NavigationKey, WindowHandle, WindowInfo, WindowRect, WindowVisibility, WindowVisibilityState,
    display_title,
};

/// Desktop shell processes that own windows nobody wants to capture.
const SYSTEM_PROCESSES: &[&str] = &[
    "xfdesktop",
    "xfce4-panel",
    "gnome-shell",
    "plasmashell",
    "nautilus-desktop",
    "lxpanel",
    "pcmanfm-desktop",
];

#[derive(Debug, Clone)]
pub struct X11Backend {
    timeouts: Timeouts,
    image_quality: u8,
}

impl X11Backend {
    pub fn new(timeouts: Timeouts, image_quality: u8) -> Self {
        Self {
            timeouts,
            image_quality,
        }
    }

    fn xdotool(&self, args: &[&str], operation: &str) -> Result<String, CaptureError> {
        let mut cmd = Command::new("xdotool");
        cmd.args(args);
        command::run_checked(cmd, self.timeouts.state)
            .map(|o| o.stdout)
            .map_err(|e| CaptureError::from_command(operation, e))
    }

    fn wmctrl(&self, args: &[&str], operation: &str) -> Result<(), CaptureError> {
        let mut cmd = Command::new("wmctrl");
        cmd.args(args);
        command::run_checked(cmd, self.timeouts.state)
            .map(|_| ())
            .map_err(|e| CaptureError::from_command(operation, e))
    }

    fn query_visibility(&self, handle: &WindowHandle) -> Result<WindowVisibility, CaptureError> {
        let atoms = self.net_wm_state(handle)?;
        if atoms.hidden {
            return Ok(WindowVisibility::Minimized);
        }

        let mapped = self.query_map_state(handle).unwrap_or(true);
        if !mapped {
            return Ok(WindowVisibility::Hidden);
        }

        if atoms.maximized_vert && atoms.maximized_horz {
            Ok(WindowVisibility::Maximized)
        } else {
            Ok(WindowVisibility::Normal)
        }
    }

    fn net_wm_state(&self, handle: &WindowHandle) -> Result<NetWmState, CaptureError> {
        let mut cmd = Command::new("xprop");
        cmd.args(["-id", handle.id(), "_NET_WM_STATE"]);
        let output = command::run_with_timeout(cmd, self.timeouts.state)
            .map_err(|e| CaptureError::from_command("window state query", e))?;

        if !output.success {
            if output.stderr.contains("BadWindow") {
                return Err(CaptureError::WindowNotFound {
                    window_id: handle.id().to_string(),
                });
            }
            return Err(CaptureError::operation_failed(
                "window state query",
                output.stderr.trim(),
            ));
        }

        Ok(parse_net_wm_state(&output.stdout))
    }

    /// `Some(true)` when the window is viewable.
    fn query_map_state(&self, handle: &WindowHandle) -> Option<bool> {
        let mut cmd = Command::new("xwininfo");
        cmd.args(["-id", handle.id()]);
        match command::run_checked(cmd, self.timeouts.state) {
            Ok(output) => parse_xwininfo(&output.stdout).map(|info| info.viewable),
            Err(e) => {
                debug!(
                    event = "core.x11.map_state_failed",
                    window_id = handle.id(),
                    error = %e
                );
                None
            }
        }
    }
}

impl WindowEnumerator for X11Backend {
    fn list_windows(&self) -> Vec<WindowInfo> {
        info!(event = "core.x11.list_started");
        let start = Instant::now();

        let mut cmd = Command::new("wmctrl");
        cmd.args(["-l", "-G", "-p"]);
        let output = match command::run_checked(cmd, self.timeouts.enumeration) {
            Ok(output) => output,
            Err(e) => {
                warn!(event = "core.x11.list_failed", error = %e);
                return Vec::new();
            }
        };

        let mut skipped_count = 0;
        let mut windows = Vec::new();

        for line in output.stdout.lines() {
            let Some(entry) = parse_wmctrl_line(line) else {
                if !line.trim().is_empty() {
                    debug!(event = "core.x11.list_line_unparsed", line = line);
                    skipped_count += 1;
                }
                continue;
            };

            if entry.numeric_id == 0 {
                skipped_count += 1;
                continue;
            }

            let process_name = entry.pid.and_then(process_name_for_pid).unwrap_or_default();
            if SYSTEM_PROCESSES.contains(&process_name.as_str()) {
                continue;
            }

            let title = display_title(&entry.title, &process_name, &entry.id);
            let handle = WindowHandle::new(entry.id.clone(), title, process_name);

            // Per-window state costs one xprop call; once the enumeration
            // budget is spent the remaining entries are reported as normal.
            let state = if start.elapsed() < self.timeouts.enumeration {
                self.query_visibility(&handle).unwrap_or(WindowVisibility::Normal)
            } else {
                WindowVisibility::Normal
            };

            windows.push(WindowInfo::new(handle, entry.pid, Some(entry.rect), state));
        }

        if skipped_count > 0 {
            warn!(
                event = "core.x11.list_incomplete",
                skipped_count = skipped_count,
                returned_count = windows.len()
            );
        }

        info!(event = "core.x11.list_completed", count = windows.len());
        windows
    }
}

impl WindowControl for X11Backend {
    fn query_state(&self, handle: &WindowHandle) -> Result<WindowVisibilityState, CaptureError> {
        let visibility = self.query_visibility(handle)?;
        let is_foreground = self
            .foreground_window()
            .is_some_and(|active| same_window(&active, handle));

        Ok(WindowVisibilityState::new(visibility, is_foreground))
    }

    fn set_visibility(
        &self,
        handle: &WindowHandle,
        visibility: WindowVisibility,
    ) -> Result<(), CaptureError> {
        debug!(
            event = "core.x11.set_visibility_started",
            window_id = handle.id(),
            visibility = %visibility
        );

        let id = handle.id();
        match visibility {
            WindowVisibility::Normal => {
                // Unknown prior state is treated as not maximized.
                let prior = self.net_wm_state(handle).unwrap_or_default();
                self.xdotool(&["windowmap", id], "window restore")?;
                if clears_maximize_on_restore(&prior) {
                    self.wmctrl(
                        &["-i", "-r", id, "-b", "remove,maximized_vert,maximized_horz"],
                        "window restore",
                    )?;
                }
            }
            WindowVisibility::Maximized => {
                self.xdotool(&["windowmap", id], "window maximize")?;
                self.wmctrl(
                    &["-i", "-r", id, "-b", "add,maximized_vert,maximized_horz"],
                    "window maximize",
                )?;
            }
            WindowVisibility::Minimized => {
                self.xdotool(&["windowminimize", id], "window minimize")?;
            }
            WindowVisibility::Hidden => {
                self.xdotool(&["windowunmap", id], "window hide")?;
            }
        }
        Ok(())
    }

    fn bring_to_foreground(&self, handle: &WindowHandle) -> Result<(), CaptureError> {
        self.wmctrl(&["-i", "-a", handle.id()], "window focus")
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        let mut cmd = Command::new("xdotool");
        cmd.arg("getactivewindow");
        match command::run_checked(cmd, self.timeouts.state) {
            Ok(output) => {
                let id: u64 = output.stdout.trim().parse().ok()?;
                Some(WindowHandle::from_id(format!("0x{:08x}", id)))
            }
            Err(e) => {
                debug!(event = "core.x11.active_window_failed", error = %e);
                None
            }
        }
    }
}

impl FrameCapturer for X11Backend {
    fn capture(
        &self,
        handle: Option<&WindowHandle>,
        destination: &Path,
    ) -> Result<PathBuf, CaptureError> {
        let (image, window_id) = match handle {
            None => {
                let image = command::run_bounded(
                    "full screen capture",
                    self.timeouts.full_screen,
                    capture_primary_monitor,
                )
                .map_err(|e| CaptureError::from_command("full screen capture", e))??;
                (image, "fullscreen".to_string())
            }
            Some(handle) => {
                let numeric_id = handle.numeric_id().ok_or_else(|| CaptureError::WindowNotFound {
                    window_id: handle.id().to_string(),
                })?;
                let id = handle.id().to_string();
                let state_timeout = self.timeouts.state;
                let image = command::run_bounded(
                    "window capture",
                    self.timeouts.window_capture,
                    move || capture_window_image(&id, numeric_id, state_timeout),
                )
                .map_err(|e| CaptureError::from_command("window capture", e))??;
                (image, handle.id().to_string())
            }
        };

        save_image(&image, destination, &window_id, self.image_quality)?;
        info!(
            event = "core.x11.capture_completed",
            window_id = %window_id,
            path = %destination.display(),
            width = image.width(),
            height = image.height()
        );
        Ok(destination.to_path_buf())
    }
}

impl KeySender for X11Backend {
    fn send(&self, handle: &WindowHandle, key: NavigationKey) -> bool {
        let mut cmd = Command::new("xdotool");
        cmd.args(["key", "--window", handle.id(), key.x11_keysym()]);
        match command::run_checked(cmd, self.timeouts.key) {
            Ok(_) => {
                debug!(
                    event = "core.x11.key_sent",
                    window_id = handle.id(),
                    key = %key
                );
                true
            }
            Err(e) => {
                warn!(
                    event = "core.x11.key_send_failed",
                    window_id = handle.id(),
                    key = %key,
                    error = %e
                );
                false
            }
        }
    }
}

impl DesktopBackend for X11Backend {
    fn name(&self) -> &'static str {
        "x11"
    }

    fn is_available(&self) -> bool {
        command::is_available("wmctrl") && command::is_available("xdotool")
    }
}

/// Direct window capture, then the window's screen region, then the whole
/// primary monitor when the rectangle is unknown.
fn capture_window_image(
    id: &str,
    numeric_id: u64,
    state_timeout: std::time::Duration,
) -> Result<RgbaImage, CaptureError> {
    let window = match xcap::Window::all() {
        Ok(windows) => windows
            .into_iter()
            .find(|w| w.id().ok().map(u64::from) == Some(numeric_id)),
        Err(e) => {
            debug!(event = "core.x11.xcap_enumeration_failed", error = %e);
            None
        }
    };

    let rect = match &window {
        Some(w) => xcap_window_rect(w),
        None => xwininfo_rect(id, state_timeout),
    };

    if let Some(rect) = rect
        && rect.is_degenerate()
    {
        return Err(CaptureError::InvalidGeometry {
            window_id: id.to_string(),
            width: rect.width,
            height: rect.height,
        });
    }

    if let Some(w) = &window {
        match w.capture_image() {
            Ok(image) if image.width() > 0 && image.height() > 0 => return Ok(image),
            Ok(_) => debug!(event = "core.x11.direct_capture_empty", window_id = id),
            Err(e) => debug!(
                event = "core.x11.direct_capture_failed",
                window_id = id,
                error = %e
            ),
        }
    }

    match rect {
        Some(rect) => capture_screen_region(rect),
        None => {
            warn!(
                event = "core.x11.geometry_unavailable",
                window_id = id,
                fallback = "full_screen"
            );
            capture_primary_monitor()
        }
    }
}

fn xcap_window_rect(window: &xcap::Window) -> Option<WindowRect> {
    Some(WindowRect::new(
        window.x().ok()?,
        window.y().ok()?,
        window.width().ok()? as i32,
        window.height().ok()? as i32,
    ))
}

fn xwininfo_rect(id: &str, timeout: std::time::Duration) -> Option<WindowRect> {
    let mut cmd = Command::new("xwininfo");
    cmd.args(["-id", id]);
    let output = command::run_checked(cmd, timeout).ok()?;
    parse_xwininfo(&output.stdout).map(|info| info.rect)
}

fn capture_primary_monitor() -> Result<RgbaImage, CaptureError> {
    let mut monitors = xcap::Monitor::all()
        .map_err(|e| CaptureError::operation_failed("full screen capture", e.to_string()))?;
    if monitors.is_empty() {
        return Err(CaptureError::EnvironmentUnavailable {
            reason: "no monitors reported by the display server".to_string(),
        });
    }
    let primary = monitors
        .iter()
        .position(|m| m.is_primary().unwrap_or(false))
        .unwrap_or(0);
    let monitor = monitors.swap_remove(primary);

    monitor
        .capture_image()
        .map_err(|e| CaptureError::operation_failed("full screen capture", e.to_string()))
}

/// Capture the monitor under the window's centre and crop to the window.
fn capture_screen_region(rect: WindowRect) -> Result<RgbaImage, CaptureError> {
    let centre_x = rect.x + rect.width / 2;
    let centre_y = rect.y + rect.height / 2;
    let monitor = xcap::Monitor::from_point(centre_x, centre_y)
        .map_err(|e| CaptureError::operation_failed("region capture", e.to_string()))?;

    let origin_x = monitor.x().unwrap_or(0);
    let origin_y = monitor.y().unwrap_or(0);
    let screen = monitor
        .capture_image()
        .map_err(|e| CaptureError::operation_failed("region capture", e.to_string()))?;

    let Some((x, y, width, height)) =
        clip_to_screen(rect, origin_x, origin_y, screen.width(), screen.height())
    else {
        return Err(CaptureError::operation_failed(
            "region capture",
            "window lies outside its monitor",
        ));
    };

    Ok(image::imageops::crop_imm(&screen, x, y, width, height).to_image())
}

/// Intersect a screen-space rectangle with a monitor, returning
/// monitor-local coordinates.
fn clip_to_screen(
    rect: WindowRect,
    origin_x: i32,
    origin_y: i32,
    screen_width: u32,
    screen_height: u32,
) -> Option<(u32, u32, u32, u32)> {
    let left = (rect.x - origin_x).max(0);
    let top = (rect.y - origin_y).max(0);
    let right = (rect.x - origin_x + rect.width).min(screen_width as i32);
    let bottom = (rect.y - origin_y + rect.height).min(screen_height as i32);
    if right <= left || bottom <= top {
        return None;
    }
    Some((
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}

/// X11 ids come back as `0x4a00007` from some tools and `0x04a00007` from
/// others; compare numerically when both parse.
fn same_window(a: &WindowHandle, b: &WindowHandle) -> bool {
    match (a.numeric_id(), b.numeric_id()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn process_name_for_pid(pid: u32) -> Option<String> {
    if pid == 0 {
        return None;
    }
    fs::read_to_string(format!("/proc/{}/comm", pid))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq)]
struct WmctrlEntry {
    id: String,
    numeric_id: u64,
    pid: Option<u32>,
    rect: WindowRect,
    title: String,
}

/// Parse one line of `wmctrl -l -G -p`:
/// `<id> <desktop> <pid> <x> <y> <w> <h> <host> <title...>`
fn parse_wmctrl_line(line: &str) -> Option<WmctrlEntry> {
    let mut rest = line.trim_start();
    let mut fields = Vec::with_capacity(8);
    for _ in 0..8 {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    let title = rest.trim_end().to_string();

    let id = fields[0];
    let numeric_id = u64::from_str_radix(id.strip_prefix("0x")?, 16).ok()?;
    let pid = fields[2].parse::<u32>().ok().filter(|p| *p != 0);
    let x = fields[3].parse().ok()?;
    let y = fields[4].parse().ok()?;
    let width = fields[5].parse().ok()?;
    let height = fields[6].parse().ok()?;

    Some(WmctrlEntry {
        id: id.to_string(),
        numeric_id,
        pid,
        rect: WindowRect::new(x, y, width, height),
        title,
    })
}

#[derive(Debug, Default, PartialEq)]
struct NetWmState {
    hidden: bool,
    maximized_vert: bool,
    maximized_horz: bool,
}

/// A minimized window that was maximized underneath comes back maximized.
fn clears_maximize_on_restore(prior: &NetWmState) -> bool {
    !(prior.hidden && prior.maximized_vert && prior.maximized_horz)
}

fn parse_net_wm_state(output: &str) -> NetWmState {
    let mut state = NetWmState::default();
    let Some((_, atoms)) = output.split_once('=') else {
        return state;
    };
    for atom in atoms.split(',').map(str::trim) {
        match atom {
            "_NET_WM_STATE_HIDDEN" => state.hidden = true,
            "_NET_WM_STATE_MAXIMIZED_VERT" => state.maximized_vert = true,
            "_NET_WM_STATE_MAXIMIZED_HORZ" => state.maximized_horz = true,
            _ => {}
        }
    }
    state
}

#[derive(Debug, PartialEq)]
struct XwininfoSummary {
    rect: WindowRect,
    viewable: bool,
}

fn parse_xwininfo(output: &str) -> Option<XwininfoSummary> {
    let mut x = None;
    let mut y = None;
    let mut width = None;
    let mut height = None;
    let mut viewable = false;

    for line in output.lines() {
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Absolute upper-left X" => x = value.parse().ok(),
            "Absolute upper-left Y" => y = value.parse().ok(),
            "Width" => width = value.parse().ok(),
            "Height" => height = value.parse().ok(),
            "Map State" => viewable = value == "IsViewable",
            _ => {}
        }
    }

    Some(XwininfoSummary {
        rect: WindowRect::new(x?, y?, width?, height?),
        viewable,
    })
}
