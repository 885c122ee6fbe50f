//! Capability traits implemented by every desktop backend.

use std::path::{Path, PathBuf};

use crate::capture::CaptureError;
use crate::window::{NavigationKey, WindowHandle, WindowInfo, WindowVisibility, WindowVisibilityState};

/// Lists capturable on-screen windows.
pub trait WindowEnumerator: Send + Sync {
    /// Enumerate windows.
    ///
    /// Never fails: an unavailable or timed-out enumeration facility yields
    /// an empty list and a logged diagnostic. Every returned entry has a
    /// non-empty title and a non-zero id.
    fn list_windows(&self) -> Vec<WindowInfo>;
}

/// Reads and changes a window's on-screen state.
pub trait WindowControl: Send + Sync {
    /// Query the live visibility and foreground state. Never cached.
    fn query_state(&self, handle: &WindowHandle) -> Result<WindowVisibilityState, CaptureError>;

    /// Transition the window to `visibility`.
    fn set_visibility(
        &self,
        handle: &WindowHandle,
        visibility: WindowVisibility,
    ) -> Result<(), CaptureError>;

    /// Make the window the one receiving keyboard input.
    fn bring_to_foreground(&self, handle: &WindowHandle) -> Result<(), CaptureError>;

    /// The window currently receiving keyboard input, if it can be read.
    fn foreground_window(&self) -> Option<WindowHandle>;
}

/// Produces bitmaps of a window or the primary display.
pub trait FrameCapturer: Send + Sync {
    /// Capture `handle`, or the whole primary display when `None`, and
    /// write the image to `destination`.
    ///
    /// # Returns
    /// * `Ok(path)` - The file that was written
    /// * `Err(CaptureError::InvalidGeometry)` - Window rectangle is degenerate
    /// * `Err(CaptureError::CaptureTimeout)` - The platform call exceeded its bound
    fn capture(
        &self,
        handle: Option<&WindowHandle>,
        destination: &Path,
    ) -> Result<PathBuf, CaptureError>;
}

/// Delivers navigation keystrokes to a window.
pub trait KeySender: Send + Sync {
    /// Send one key. Returns false and logs on failure; never panics.
    fn send(&self, handle: &WindowHandle, key: NavigationKey) -> bool;

    /// Window that should receive navigation keys for `handle`.
    ///
    /// Document viewers often render pages in a child window; backends that
    /// can see the window tree return that child. Read-only and idempotent.
    fn resolve_navigation_target(&self, handle: &WindowHandle) -> WindowHandle {
        handle.clone()
    }
}

/// Everything a capture session needs from one backend.
pub trait DesktopBackend: WindowEnumerator + WindowControl + FrameCapturer + KeySender {
    /// Canonical backend name (e.g., "x11", "powershell").
    fn name(&self) -> &'static str;

    /// Whether the platform facilities this backend drives are reachable.
    fn is_available(&self) -> bool;
}
