use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::errors::PrepareError;
use super::types::CaptureSessionState;
use crate::backend::WindowControl;
use crate::window::{WindowHandle, WindowVisibility};

/// Moves a window into a capturable state and back.
pub struct WindowStateController<'a, C: WindowControl + ?Sized> {
    control: &'a C,
    settle_delay: Duration,
    focus_delay: Duration,
}

impl<'a, C: WindowControl + ?Sized> WindowStateController<'a, C> {
    pub fn new(control: &'a C, settle_delay: Duration, focus_delay: Duration) -> Self {
        Self {
            control,
            settle_delay,
            focus_delay,
        }
    }

    /// Make `handle` visible and foreground, recording what was changed.
    ///
    /// A window that is already visible and foreground is left untouched
    /// and the returned state reports `was_prepared() == false`.
    ///
    /// # Errors
    ///
    /// Fails when the state cannot be read or the restore-to-normal
    /// transition reports an error. A transition can take effect and still
    /// report failure, so the error then carries a partial state marked as
    /// changed for the caller to restore. A failed foreground switch is
    /// logged and tolerated.
    pub fn prepare(&self, handle: &WindowHandle) -> Result<CaptureSessionState, PrepareError> {
        info!(event = "core.state.prepare_started", window_id = handle.id());

        let original = self
            .control
            .query_state(handle)
            .map_err(|source| PrepareError {
                source,
                partial: None,
            })?;
        let previous_foreground = if original.is_foreground {
            None
        } else {
            self.control.foreground_window()
        };

        let mut changed_visibility = false;
        if matches!(
            original.visibility,
            WindowVisibility::Minimized | WindowVisibility::Hidden
        ) {
            if let Err(source) = self.control.set_visibility(handle, WindowVisibility::Normal) {
                warn!(
                    event = "core.state.prepare_failed",
                    window_id = handle.id(),
                    error = %source
                );
                return Err(PrepareError {
                    source,
                    partial: Some(CaptureSessionState::new(
                        handle.clone(),
                        original,
                        true,
                        false,
                        previous_foreground,
                    )),
                });
            }
            thread::sleep(self.settle_delay);
            changed_visibility = true;
        }

        let mut changed_foreground = false;
        if !original.is_foreground {
            match self.control.bring_to_foreground(handle) {
                Ok(()) => {
                    thread::sleep(self.focus_delay);
                    changed_foreground = true;
                }
                Err(e) => {
                    warn!(
                        event = "core.state.focus_failed",
                        window_id = handle.id(),
                        error = %e
                    );
                }
            }
        }

        let state = CaptureSessionState::new(
            handle.clone(),
            original,
            changed_visibility,
            changed_foreground,
            previous_foreground,
        );

        info!(
            event = "core.state.prepare_completed",
            window_id = handle.id(),
            original_visibility = %original.visibility,
            was_foreground = original.is_foreground,
            was_prepared = state.was_prepared()
        );
        Ok(state)
    }

    /// Undo whatever `prepare` changed.
    ///
    /// A no-op returning `true` when nothing was prepared or the state was
    /// already restored. Each session state is restored at most once;
    /// failures are logged and reported as `false`, never retried.
    pub fn restore(&self, state: &mut CaptureSessionState) -> bool {
        let handle = state.handle().clone();

        if !state.was_prepared() || state.is_restored() {
            debug!(
                event = "core.state.restore_skipped",
                window_id = handle.id(),
                was_prepared = state.was_prepared(),
                already_restored = state.is_restored()
            );
            return true;
        }
        state.mark_restored();

        info!(
            event = "core.state.restore_started",
            window_id = handle.id(),
            target_visibility = %state.original_visibility()
        );

        let mut ok = true;

        if state.changed_visibility()
            && let Err(e) = self
                .control
                .set_visibility(&handle, state.original_visibility())
        {
            error!(
                event = "core.state.restore_failed",
                window_id = handle.id(),
                step = "visibility",
                error = %e
            );
            ok = false;
        }

        let original_was_visible = state.original_visibility().is_capturable();
        if state.changed_foreground()
            && original_was_visible
            && let Some(previous) = state.previous_foreground()
            && previous != &handle
            && let Err(e) = self.control.bring_to_foreground(previous)
        {
            warn!(
                event = "core.state.restore_failed",
                window_id = handle.id(),
                step = "foreground",
                previous_foreground = previous.id(),
                error = %e
            );
            ok = false;
        }

        if ok {
            info!(event = "core.state.restore_completed", window_id = handle.id());
        }
        ok
    }
}
