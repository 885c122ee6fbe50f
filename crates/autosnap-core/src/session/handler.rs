//! Capture-navigate-capture loop over one window.
//!
//! A session is strictly sequential: each capture depends on the page the
//! previous keystroke rendered. Two sessions against the same window are not
//! serialized against each other and will interleave their keystrokes.

use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::errors::SessionError;
use super::types::{
    CapturedPage, DocumentCapture, MAX_PAGE_COUNT, SessionFailure, SessionPhase, SkippedPage,
    page_file_name,
};
use crate::backend::DesktopBackend;
use crate::config::{ImageFormat, SnapConfig};
use crate::errors::SnapError;
use crate::state::{CaptureSessionState, WindowStateController};
use crate::window::{NavigationKey, WindowHandle};

pub struct MultiPageCaptureOrchestrator<'a, B: DesktopBackend + ?Sized> {
    backend: &'a B,
    states: WindowStateController<'a, B>,
    image_format: ImageFormat,
}

impl<'a, B: DesktopBackend + ?Sized> MultiPageCaptureOrchestrator<'a, B> {
    pub fn new(
        backend: &'a B,
        settle_delay: Duration,
        focus_delay: Duration,
        image_format: ImageFormat,
    ) -> Self {
        Self {
            backend,
            states: WindowStateController::new(backend, settle_delay, focus_delay),
            image_format,
        }
    }

    pub fn from_config(backend: &'a B, config: &SnapConfig) -> Self {
        Self::new(
            backend,
            config.capture.settle_delay(),
            config.capture.focus_delay(),
            config.naming.image_format(),
        )
    }

    /// Capture `page_count` pages of the document shown in `handle`.
    ///
    /// Pages are written to `output_dir/page_NNN.<ext>`. A page whose capture
    /// fails is skipped and the loop continues. The window is restored to its
    /// original state exactly once, however the loop ends. `page_count <= 0`
    /// returns an empty result without touching the window; a negative or
    /// non-finite `delay_secs` is treated as zero.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionFailure`] when the page count exceeds 999, the
    /// output directory cannot be created, or the window cannot be prepared.
    pub fn capture_document(
        &self,
        handle: &WindowHandle,
        page_count: i64,
        output_dir: &Path,
        key: NavigationKey,
        delay_secs: f64,
    ) -> Result<DocumentCapture, SessionFailure> {
        if page_count <= 0 {
            debug!(
                event = "core.session.capture_skipped",
                window_id = handle.id(),
                page_count = page_count
            );
            return Ok(DocumentCapture {
                restored: true,
                ..DocumentCapture::default()
            });
        }
        if page_count > i64::from(MAX_PAGE_COUNT) {
            return Err(SessionFailure::before_capture(
                SessionError::PageCountTooLarge {
                    requested: page_count,
                    max: MAX_PAGE_COUNT,
                },
            ));
        }
        let page_count = page_count as u32;
        let delay = Duration::try_from_secs_f64(delay_secs).unwrap_or(Duration::ZERO);

        info!(
            event = "core.session.capture_started",
            window_id = handle.id(),
            page_count = page_count,
            output_dir = %output_dir.display(),
            key = key.name(),
            delay_ms = delay.as_millis() as u64
        );

        self.enter(handle, SessionPhase::Preparing);
        if let Err(source) = fs::create_dir_all(output_dir) {
            error!(
                event = "core.session.capture_failed",
                window_id = handle.id(),
                phase = %SessionPhase::Preparing,
                error = %source
            );
            return Err(SessionFailure::before_capture(
                SessionError::OutputDirectory {
                    path: output_dir.to_path_buf(),
                    source,
                },
            ));
        }

        let state = match self.states.prepare(handle) {
            Ok(state) => state,
            Err(failed) => {
                let (partial, source) = failed.into_parts();
                if let Some(mut partial) = partial {
                    self.enter(handle, SessionPhase::Restoring);
                    self.states.restore(&mut partial);
                }
                error!(
                    event = "core.session.capture_failed",
                    window_id = handle.id(),
                    phase = %SessionPhase::Preparing,
                    error = %source
                );
                return Err(SessionFailure::before_capture(SessionError::Preparation {
                    source,
                }));
            }
        };
        let guard = RestoreGuard::new(&self.states, state);

        let mut result = DocumentCapture::default();
        let mut navigation_target: Option<WindowHandle> = None;

        for index in 1..=page_count {
            self.enter(handle, SessionPhase::Capturing(index));
            let destination = output_dir.join(page_file_name(index, self.image_format.extension()));

            match self.backend.capture(Some(handle), &destination) {
                Ok(path) => {
                    debug!(
                        event = "core.session.page_captured",
                        window_id = handle.id(),
                        page = index,
                        path = %path.display()
                    );
                    result.pages.push(CapturedPage { index, path });
                }
                Err(e) => {
                    warn!(
                        event = "core.session.page_capture_failed",
                        window_id = handle.id(),
                        page = index,
                        error = %e
                    );
                    result.skipped.push(SkippedPage {
                        index,
                        error_code: e.error_code().to_string(),
                        message: e.to_string(),
                    });
                }
            }

            if index < page_count {
                self.enter(handle, SessionPhase::Navigating(index));
                let target = navigation_target
                    .get_or_insert_with(|| self.backend.resolve_navigation_target(handle));
                if !self.backend.send(target, key) {
                    warn!(
                        event = "core.session.navigation_failed",
                        window_id = handle.id(),
                        target_id = target.id(),
                        page = index,
                        key = key.name()
                    );
                }
                thread::sleep(delay);
            }
        }

        self.enter(handle, SessionPhase::Restoring);
        result.restored = guard.finish();
        self.enter(handle, SessionPhase::Done);

        info!(
            event = "core.session.capture_completed",
            window_id = handle.id(),
            pages_captured = result.pages.len(),
            pages_skipped = result.skipped.len(),
            restored = result.restored
        );
        Ok(result)
    }

    fn enter(&self, handle: &WindowHandle, phase: SessionPhase) {
        debug!(
            event = "core.session.phase_entered",
            window_id = handle.id(),
            phase = %phase
        );
    }
}

/// Restores the window when dropped unless `finish` already did.
struct RestoreGuard<'c, 'a, B: DesktopBackend + ?Sized> {
    states: &'c WindowStateController<'a, B>,
    state: CaptureSessionState,
    finished: bool,
}

impl<'c, 'a, B: DesktopBackend + ?Sized> RestoreGuard<'c, 'a, B> {
    fn new(states: &'c WindowStateController<'a, B>, state: CaptureSessionState) -> Self {
        Self {
            states,
            state,
            finished: false,
        }
    }

    fn finish(mut self) -> bool {
        self.finished = true;
        self.states.restore(&mut self.state)
    }
}

impl<B: DesktopBackend + ?Sized> Drop for RestoreGuard<'_, '_, B> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                event = "core.session.unwinding_restore",
                window_id = self.state.handle().id()
            );
            self.states.restore(&mut self.state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::path::PathBuf;

    use super::*;
    use crate::backend::fake::{Call, FakeDesktop};
    use crate::backend::{FrameCapturer, KeySender, WindowControl, WindowEnumerator};
    use crate::capture::CaptureError;
    use crate::window::{WindowInfo, WindowVisibility, WindowVisibilityState};

    fn orchestrator(fake: &FakeDesktop) -> MultiPageCaptureOrchestrator<'_, FakeDesktop> {
        MultiPageCaptureOrchestrator::new(fake, Duration::ZERO, Duration::ZERO, ImageFormat::Png)
    }

    fn expected(dir: &Path, pages: &[u32]) -> Vec<PathBuf> {
        pages
            .iter()
            .map(|i| dir.join(format!("page_{:03}.png", i)))
            .collect()
    }

    #[test]
    fn test_three_pages_navigates_twice() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let fake = FakeDesktop::new(WindowVisibility::Normal, true);

        let result = orchestrator(&fake)
            .capture_document(
                &WindowHandle::from_id("42"),
                3,
                &out,
                NavigationKey::PageDown,
                0.0,
            )
            .unwrap();

        assert_eq!(result.paths(), expected(&out, &[1, 2, 3]));
        assert!(result.skipped.is_empty());
        assert!(result.restored);
        assert_eq!(fake.key_sends(), 2);
        assert!(out.is_dir());

        // Keys go out after pages 1 and 2, never after the last page.
        let calls = fake.calls();
        let last_capture = calls
            .iter()
            .rposition(|c| matches!(c, Call::Capture(..)))
            .unwrap();
        assert!(!calls[last_capture..]
            .iter()
            .any(|c| matches!(c, Call::SendKey(..))));
    }

    #[test]
    fn test_failed_page_is_skipped_and_loop_continues() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let mut fake = FakeDesktop::new(WindowVisibility::Minimized, false);
        fake.failing_captures = HashSet::from([2]);

        let result = orchestrator(&fake)
            .capture_document(
                &WindowHandle::from_id("42"),
                3,
                &out,
                NavigationKey::PageDown,
                0.0,
            )
            .unwrap();

        assert_eq!(result.paths(), expected(&out, &[1, 3]));
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].index, 2);
        assert_eq!(result.skipped[0].error_code, "CAPTURE_TIMEOUT");
        assert_eq!(fake.key_sends(), 2);
        // Restoration ran exactly once.
        assert_eq!(
            fake.visibility_transitions(),
            vec![WindowVisibility::Normal, WindowVisibility::Minimized]
        );
    }

    #[test]
    fn test_minimized_window_is_minimized_again_at_end() {
        let tmp = tempfile::tempdir().unwrap();
        let fake = FakeDesktop::new(WindowVisibility::Minimized, false);

        orchestrator(&fake)
            .capture_document(
                &WindowHandle::from_id("42"),
                2,
                tmp.path(),
                NavigationKey::Down,
                0.0,
            )
            .unwrap();

        let calls = fake.calls();
        let minimizes: Vec<usize> = calls
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                matches!(c, Call::SetVisibility(_, WindowVisibility::Minimized))
            })
            .map(|(i, _)| i)
            .collect();
        assert_eq!(minimizes.len(), 1);
        let last_capture = calls
            .iter()
            .rposition(|c| matches!(c, Call::Capture(..)))
            .unwrap();
        assert!(minimizes[0] > last_capture);
    }

    #[test]
    fn test_non_positive_page_count_touches_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("never-created");
        let fake = FakeDesktop::new(WindowVisibility::Minimized, false);

        for count in [0, -1, i64::MIN] {
            let result = orchestrator(&fake)
                .capture_document(&WindowHandle::from_id("42"), count, &out, NavigationKey::Down, 0.0)
                .unwrap();
            assert!(result.is_empty());
        }
        assert!(fake.calls().is_empty());
        assert!(!out.exists());
    }

    #[test]
    fn test_page_count_above_limit_is_rejected_before_preparing() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("never-created");
        let fake = FakeDesktop::new(WindowVisibility::Minimized, false);

        let failure = orchestrator(&fake)
            .capture_document(&WindowHandle::from_id("42"), 1000, &out, NavigationKey::Down, 0.0)
            .unwrap_err();

        assert!(matches!(
            failure.error,
            SessionError::PageCountTooLarge { requested: 1000, .. }
        ));
        assert!(fake.calls().is_empty());
        assert!(!out.exists());
    }

    #[test]
    fn test_prepare_failure_is_reported_with_no_pages() {
        let tmp = tempfile::tempdir().unwrap();
        let mut fake = FakeDesktop::new(WindowVisibility::Normal, true);
        fake.fail_query = true;

        let failure = orchestrator(&fake)
            .capture_document(&WindowHandle::from_id("42"), 3, tmp.path(), NavigationKey::Down, 0.0)
            .unwrap_err();

        assert_eq!(failure.error_code(), "WINDOW_NOT_FOUND");
        assert!(failure.pages.is_empty());
        assert!(!fake.calls().iter().any(|c| matches!(c, Call::Capture(..))));
    }

    #[test]
    fn test_prepare_failure_after_show_restores_minimized_window() {
        let tmp = tempfile::tempdir().unwrap();
        let mut fake = FakeDesktop::new(WindowVisibility::Minimized, false);
        fake.fail_show = true;

        let failure = orchestrator(&fake)
            .capture_document(&WindowHandle::from_id("42"), 3, tmp.path(), NavigationKey::Down, 0.0)
            .unwrap_err();

        assert_eq!(failure.error_code(), "CAPTURE_TIMEOUT");
        assert!(failure.pages.is_empty());
        assert!(!fake.calls().iter().any(|c| matches!(c, Call::Capture(..))));
        assert_eq!(
            fake.visibility_transitions(),
            vec![WindowVisibility::Normal, WindowVisibility::Minimized]
        );
        assert_eq!(
            fake.state.lock().unwrap().visibility,
            WindowVisibility::Minimized
        );
    }

    #[test]
    fn test_output_dir_failure_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let fake = FakeDesktop::new(WindowVisibility::Normal, true);

        let failure = orchestrator(&fake)
            .capture_document(
                &WindowHandle::from_id("42"),
                2,
                &blocker.join("sub"),
                NavigationKey::Down,
                0.0,
            )
            .unwrap_err();

        assert_eq!(failure.error_code(), "OUTPUT_DIRECTORY_FAILED");
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_key_failure_only_warns() {
        let tmp = tempfile::tempdir().unwrap();
        let mut fake = FakeDesktop::new(WindowVisibility::Normal, true);
        fake.fail_keys = true;

        let result = orchestrator(&fake)
            .capture_document(&WindowHandle::from_id("42"), 3, tmp.path(), NavigationKey::Right, 0.0)
            .unwrap();

        assert_eq!(result.pages.len(), 3);
        assert_eq!(fake.key_sends(), 2);
    }

    #[test]
    fn test_navigation_target_resolved_once_per_session() {
        let tmp = tempfile::tempdir().unwrap();
        let mut fake = FakeDesktop::new(WindowVisibility::Normal, true);
        fake.navigation_child = Some("77".to_string());

        orchestrator(&fake)
            .capture_document(&WindowHandle::from_id("42"), 4, tmp.path(), NavigationKey::Down, -5.0)
            .unwrap();

        let calls = fake.calls();
        let resolves = calls
            .iter()
            .filter(|c| matches!(c, Call::ResolveTarget(_)))
            .count();
        assert_eq!(resolves, 1);
        assert!(calls
            .iter()
            .filter(|c| matches!(c, Call::SendKey(..)))
            .all(|c| *c == Call::SendKey("77".to_string(), NavigationKey::Down)));
        // Captures stay on the top-level window.
        assert!(calls
            .iter()
            .filter_map(|c| match c {
                Call::Capture(id, _) => Some(id.clone()),
                _ => None,
            })
            .all(|id| id.as_deref() == Some("42")));
    }

    #[test]
    fn test_already_visible_window_performs_no_restore_calls() {
        let tmp = tempfile::tempdir().unwrap();
        let fake = FakeDesktop::new(WindowVisibility::Normal, true);

        let result = orchestrator(&fake)
            .capture_document(&WindowHandle::from_id("42"), 1, tmp.path(), NavigationKey::Down, 0.0)
            .unwrap();

        assert!(result.restored);
        assert_eq!(fake.state_calls(), vec![Call::QueryState("42".to_string())]);
    }

    #[test]
    fn test_restore_runs_when_loop_unwinds() {
        struct PanickingCapture(FakeDesktop);
        // Delegate everything to the fake except capture, which panics.
        impl WindowEnumerator for PanickingCapture {
            fn list_windows(&self) -> Vec<WindowInfo> {
                Vec::new()
            }
        }
        impl WindowControl for PanickingCapture {
            fn query_state(
                &self,
                handle: &WindowHandle,
            ) -> Result<WindowVisibilityState, CaptureError> {
                self.0.query_state(handle)
            }
            fn set_visibility(
                &self,
                handle: &WindowHandle,
                visibility: WindowVisibility,
            ) -> Result<(), CaptureError> {
                self.0.set_visibility(handle, visibility)
            }
            fn bring_to_foreground(
                &self,
                handle: &WindowHandle,
            ) -> Result<(), CaptureError> {
                self.0.bring_to_foreground(handle)
            }
            fn foreground_window(&self) -> Option<WindowHandle> {
                self.0.foreground_window()
            }
        }
        impl FrameCapturer for PanickingCapture {
            fn capture(
                &self,
                _handle: Option<&WindowHandle>,
                _destination: &Path,
            ) -> Result<PathBuf, CaptureError> {
                panic!("capture exploded");
            }
        }
        impl KeySender for PanickingCapture {
            fn send(&self, _handle: &WindowHandle, _key: NavigationKey) -> bool {
                true
            }
        }
        impl DesktopBackend for PanickingCapture {
            fn name(&self) -> &'static str {
                "panicking"
            }
            fn is_available(&self) -> bool {
                true
            }
        }

        let tmp = tempfile::tempdir().unwrap();
        let backend = PanickingCapture(FakeDesktop::new(WindowVisibility::Minimized, false));
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            MultiPageCaptureOrchestrator::new(
                &backend,
                Duration::ZERO,
                Duration::ZERO,
                ImageFormat::Png,
            )
            .capture_document(&WindowHandle::from_id("42"), 2, tmp.path(), NavigationKey::Down, 0.0)
        }));

        assert!(outcome.is_err());
        assert_eq!(
            backend.0.visibility_transitions(),
            vec![WindowVisibility::Normal, WindowVisibility::Minimized]
        );
    }
}
