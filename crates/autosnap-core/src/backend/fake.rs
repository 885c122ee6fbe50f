//! Scriptable in-memory backend recording every platform call.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::{Rgba, RgbaImage};

use super::traits::{DesktopBackend, FrameCapturer, KeySender, WindowControl, WindowEnumerator};
use crate::capture::CaptureError;
use crate::window::{
    NavigationKey, WindowHandle, WindowInfo, WindowVisibility, WindowVisibilityState,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    QueryState(String),
    SetVisibility(String, WindowVisibility),
    BringToForeground(String),
    ForegroundWindow,
    Capture(Option<String>, PathBuf),
    SendKey(String, NavigationKey),
    ResolveTarget(String),
}

impl Call {
    pub fn is_state_call(&self) -> bool {
        matches!(
            self,
            Call::QueryState(_)
                | Call::SetVisibility(..)
                | Call::BringToForeground(_)
                | Call::ForegroundWindow
        )
    }
}

pub struct FakeDesktop {
    pub windows: Vec<WindowInfo>,
    pub state: Mutex<WindowVisibilityState>,
    pub previous_foreground: Option<WindowHandle>,
    /// 1-based capture attempts that fail.
    pub failing_captures: HashSet<usize>,
    pub fail_keys: bool,
    pub fail_query: bool,
    pub fail_restore: bool,
    /// Show transitions take effect and then report a timeout.
    pub fail_show: bool,
    /// Write a small real PNG for each successful capture.
    pub write_files: bool,
    pub navigation_child: Option<String>,
    calls: Mutex<Vec<Call>>,
    capture_attempts: Mutex<usize>,
}

impl FakeDesktop {
    pub fn new(visibility: WindowVisibility, is_foreground: bool) -> Self {
        Self {
            windows: Vec::new(),
            state: Mutex::new(WindowVisibilityState::new(visibility, is_foreground)),
            previous_foreground: Some(WindowHandle::from_id("999")),
            failing_captures: HashSet::new(),
            fail_keys: false,
            fail_query: false,
            fail_restore: false,
            fail_show: false,
            write_files: false,
            navigation_child: None,
            calls: Mutex::new(Vec::new()),
            capture_attempts: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn state_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_state_call).collect()
    }

    pub fn key_sends(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::SendKey(..)))
            .count()
    }

    pub fn visibility_transitions(&self) -> Vec<WindowVisibility> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SetVisibility(_, v) => Some(v),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl WindowEnumerator for FakeDesktop {
    fn list_windows(&self) -> Vec<WindowInfo> {
        self.windows.clone()
    }
}

impl WindowControl for FakeDesktop {
    fn query_state(&self, handle: &WindowHandle) -> Result<WindowVisibilityState, CaptureError> {
        self.record(Call::QueryState(handle.id().to_string()));
        if self.fail_query {
            return Err(CaptureError::WindowNotFound {
                window_id: handle.id().to_string(),
            });
        }
        Ok(*self.state.lock().unwrap())
    }

    fn set_visibility(
        &self,
        handle: &WindowHandle,
        visibility: WindowVisibility,
    ) -> Result<(), CaptureError> {
        self.record(Call::SetVisibility(handle.id().to_string(), visibility));
        let restoring = !matches!(visibility, WindowVisibility::Normal);
        if self.fail_restore && restoring {
            return Err(CaptureError::operation_failed("window state change", "scripted failure"));
        }
        self.state.lock().unwrap().visibility = visibility;
        if self.fail_show && !restoring {
            return Err(CaptureError::CaptureTimeout {
                operation: "window state change".to_string(),
                timeout_ms: 10_000,
            });
        }
        Ok(())
    }

    fn bring_to_foreground(&self, handle: &WindowHandle) -> Result<(), CaptureError> {
        self.record(Call::BringToForeground(handle.id().to_string()));
        self.state.lock().unwrap().is_foreground = true;
        Ok(())
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        self.record(Call::ForegroundWindow);
        self.previous_foreground.clone()
    }
}

impl FrameCapturer for FakeDesktop {
    fn capture(
        &self,
        handle: Option<&WindowHandle>,
        destination: &Path,
    ) -> Result<PathBuf, CaptureError> {
        self.record(Call::Capture(
            handle.map(|h| h.id().to_string()),
            destination.to_path_buf(),
        ));

        let attempt = {
            let mut attempts = self.capture_attempts.lock().unwrap();
            *attempts += 1;
            *attempts
        };
        if self.failing_captures.contains(&attempt) {
            return Err(CaptureError::CaptureTimeout {
                operation: "window capture".to_string(),
                timeout_ms: 60_000,
            });
        }

        if self.write_files {
            RgbaImage::from_pixel(8, 6, Rgba([240, 240, 240, 255])).save(destination)?;
        }
        Ok(destination.to_path_buf())
    }
}

impl KeySender for FakeDesktop {
    fn send(&self, handle: &WindowHandle, key: NavigationKey) -> bool {
        self.record(Call::SendKey(handle.id().to_string(), key));
        !self.fail_keys
    }

    fn resolve_navigation_target(&self, handle: &WindowHandle) -> WindowHandle {
        self.record(Call::ResolveTarget(handle.id().to_string()));
        match &self.navigation_child {
            Some(child) => WindowHandle::new(child.clone(), handle.title(), handle.process_name()),
            None => handle.clone(),
        }
    }
}

impl DesktopBackend for FakeDesktop {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn is_available(&self) -> bool {
        true
    }
}
