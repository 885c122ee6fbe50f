use crate::window::{WindowHandle, WindowVisibility, WindowVisibilityState};

/// What a capture session changed about its target window, and how to
/// undo it.
///
/// Created by [`WindowStateController::prepare`](super::WindowStateController::prepare)
/// and consumed by `restore`. Lives for one multi-page capture only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSessionState {
    handle: WindowHandle,
    original: WindowVisibilityState,
    changed_visibility: bool,
    changed_foreground: bool,
    previous_foreground: Option<WindowHandle>,
    restored: bool,
}

impl CaptureSessionState {
    pub(crate) fn new(
        handle: WindowHandle,
        original: WindowVisibilityState,
        changed_visibility: bool,
        changed_foreground: bool,
        previous_foreground: Option<WindowHandle>,
    ) -> Self {
        Self {
            handle,
            original,
            changed_visibility,
            changed_foreground,
            previous_foreground,
            restored: false,
        }
    }

    pub fn handle(&self) -> &WindowHandle {
        &self.handle
    }

    /// State observed before any modification.
    pub fn original(&self) -> WindowVisibilityState {
        self.original
    }

    pub fn original_visibility(&self) -> WindowVisibility {
        self.original.visibility
    }

    /// Whether `prepare` performed any transition.
    pub fn was_prepared(&self) -> bool {
        self.changed_visibility || self.changed_foreground
    }

    pub fn changed_visibility(&self) -> bool {
        self.changed_visibility
    }

    pub fn changed_foreground(&self) -> bool {
        self.changed_foreground
    }

    pub fn previous_foreground(&self) -> Option<&WindowHandle> {
        self.previous_foreground.as_ref()
    }

    pub fn is_restored(&self) -> bool {
        self.restored
    }

    pub(crate) fn mark_restored(&mut self) {
        self.restored = true;
    }
}
