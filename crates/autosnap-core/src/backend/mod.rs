//! Environment-specific desktop backends.
//!
//! A closed set of variants, selected once from the detected
//! [`Environment`] and held for the process lifetime.

#[cfg(test)]
pub mod fake;
pub mod powershell;
pub mod traits;
pub mod x11;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::capture::CaptureError;
use crate::config::SnapConfig;
use crate::environment::Environment;
use crate::window::{NavigationKey, WindowHandle, WindowInfo, WindowVisibility, WindowVisibilityState};

pub use powershell::{BridgeMode, PowerShellBackend};
pub use traits::{DesktopBackend, FrameCapturer, KeySender, WindowControl, WindowEnumerator};
pub use x11::X11Backend;

/// The backend for this process.
#[derive(Debug, Clone)]
pub enum Backend {
    NativeLinux(X11Backend),
    NativeWindows(PowerShellBackend),
    HostedWindows(PowerShellBackend),
}

impl Backend {
    /// Select the backend for `environment`.
    ///
    /// A hosted environment whose bridge does not answer falls back to the
    /// local X server. Native Windows keeps the PowerShell backend even when
    /// the probe fails; its operations then report the bridge unavailable.
    pub fn select(environment: Environment, config: &SnapConfig) -> Self {
        let timeouts = config.capture.timeouts();
        let quality = config.naming.image_quality();

        let backend = match environment {
            Environment::NativeLinux => Backend::NativeLinux(X11Backend::new(timeouts, quality)),
            Environment::NativeWindows => Backend::NativeWindows(PowerShellBackend::connect(
                BridgeMode::Native,
                timeouts,
                quality,
            )),
            Environment::HostedWindowsAccess => {
                let bridge = PowerShellBackend::connect(BridgeMode::Hosted, timeouts, quality);
                if bridge.bridge_available() {
                    Backend::HostedWindows(bridge)
                } else {
                    warn!(
                        event = "core.backend.bridge_unavailable",
                        environment = %environment,
                        fallback = "x11"
                    );
                    Backend::NativeLinux(X11Backend::new(timeouts, quality))
                }
            }
        };

        info!(
            event = "core.backend.selected",
            environment = %environment,
            backend = backend.name()
        );
        backend
    }

    fn inner(&self) -> &dyn DesktopBackend {
        match self {
            Backend::NativeLinux(b) => b,
            Backend::NativeWindows(b) | Backend::HostedWindows(b) => b,
        }
    }

    /// Whether the Windows bridge answered; `false` for the X11 backend.
    pub fn bridge_available(&self) -> bool {
        match self {
            Backend::NativeLinux(_) => false,
            Backend::NativeWindows(b) | Backend::HostedWindows(b) => b.bridge_available(),
        }
    }
}

impl WindowEnumerator for Backend {
    fn list_windows(&self) -> Vec<WindowInfo> {
        self.inner().list_windows()
    }
}

impl WindowControl for Backend {
    fn query_state(&self, handle: &WindowHandle) -> Result<WindowVisibilityState, CaptureError> {
        self.inner().query_state(handle)
    }

    fn set_visibility(
        &self,
        handle: &WindowHandle,
        visibility: WindowVisibility,
    ) -> Result<(), CaptureError> {
        self.inner().set_visibility(handle, visibility)
    }

    fn bring_to_foreground(&self, handle: &WindowHandle) -> Result<(), CaptureError> {
        self.inner().bring_to_foreground(handle)
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        self.inner().foreground_window()
    }
}

impl FrameCapturer for Backend {
    fn capture(
        &self,
        handle: Option<&WindowHandle>,
        destination: &Path,
    ) -> Result<PathBuf, CaptureError> {
        self.inner().capture(handle, destination)
    }
}

impl KeySender for Backend {
    fn send(&self, handle: &WindowHandle, key: NavigationKey) -> bool {
        self.inner().send(handle, key)
    }

    fn resolve_navigation_target(&self, handle: &WindowHandle) -> WindowHandle {
        self.inner().resolve_navigation_target(handle)
    }
}

impl DesktopBackend for Backend {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn is_available(&self) -> bool {
        self.inner().is_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_linux_selects_x11() {
        let backend = Backend::select(Environment::NativeLinux, &SnapConfig::default());
        assert_eq!(backend.name(), "x11");
        assert!(!backend.bridge_available());
    }
}
