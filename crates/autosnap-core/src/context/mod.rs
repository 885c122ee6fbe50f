//! Process-wide dependencies, built once at startup and passed down.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use crate::backend::{Backend, DesktopBackend, FrameCapturer, WindowEnumerator};
use crate::capture::CaptureError;
use crate::cleanup::{self, CleanupError, PruneSummary};
use crate::config::{CaptureKind, PathResolver, SnapConfig};
use crate::dependencies::{self, DependencyReport};
use crate::environment::{self, Environment, EnvironmentInfo};
use crate::errors::ConfigError;
use crate::session::{DocumentCapture, MultiPageCaptureOrchestrator, SessionFailure};
use crate::window::{NavigationKey, WindowHandle, WindowInfo};
use crate::workflow::{self, WorkflowError, WorkflowReport, WorkflowRequest};

/// Everything an operation needs: the detected environment, the loaded
/// configuration, the path resolver and the selected backend.
#[derive(Debug)]
pub struct SnapContext {
    environment: Environment,
    config: SnapConfig,
    resolver: PathResolver,
    backend: Backend,
}

impl SnapContext {
    /// Load configuration, detect the environment and select a backend.
    pub fn initialize() -> Result<Self, ConfigError> {
        let config = SnapConfig::load_hierarchy()?;
        Ok(Self::new(config, environment::detect()))
    }

    pub fn new(config: SnapConfig, environment: Environment) -> Self {
        let backend = Backend::select(environment, &config);
        let resolver = PathResolver::new(&config);
        Self {
            environment,
            config,
            resolver,
            backend,
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Capturable windows; empty when the backend cannot enumerate.
    pub fn list_windows(&self) -> Vec<WindowInfo> {
        self.backend.list_windows()
    }

    /// Capture one window without changing its state.
    pub fn capture_window(
        &self,
        window_id: &str,
        destination: Option<&Path>,
    ) -> Result<PathBuf, CaptureError> {
        let destination = match destination {
            Some(path) => path.to_path_buf(),
            None => self
                .resolver
                .default_capture_path(CaptureKind::Window(window_id))?,
        };
        info!(
            event = "core.capture.window_started",
            window_id = window_id,
            destination = %destination.display()
        );
        let handle = WindowHandle::from_id(window_id);
        let path = self.backend.capture(Some(&handle), &destination)?;
        info!(event = "core.capture.window_completed", window_id = window_id);
        Ok(path)
    }

    pub fn capture_full_screen(&self, destination: Option<&Path>) -> Result<PathBuf, CaptureError> {
        let destination = match destination {
            Some(path) => path.to_path_buf(),
            None => self.resolver.default_capture_path(CaptureKind::FullScreen)?,
        };
        info!(
            event = "core.capture.full_screen_started",
            destination = %destination.display()
        );
        let path = self.backend.capture(None, &destination)?;
        info!(event = "core.capture.full_screen_completed");
        Ok(path)
    }

    /// Directory a document capture writes to when none is given.
    pub fn document_dir(&self, output_dir: Option<&Path>) -> PathBuf {
        self.resolver.output_dir_path(output_dir)
    }

    /// Multi-page capture. `delay_secs` defaults to the configured
    /// navigation delay.
    pub fn capture_document(
        &self,
        window_id: &str,
        page_count: i64,
        output_dir: Option<&Path>,
        key: NavigationKey,
        delay_secs: Option<f64>,
    ) -> Result<DocumentCapture, SessionFailure> {
        let output_dir = self.document_dir(output_dir);
        let delay = delay_secs.unwrap_or_else(|| self.config.capture.navigation_delay().as_secs_f64());
        MultiPageCaptureOrchestrator::from_config(&self.backend, &self.config).capture_document(
            &WindowHandle::from_id(window_id),
            page_count,
            &output_dir,
            key,
            delay,
        )
    }

    pub fn full_workflow(&self, request: &WorkflowRequest) -> Result<WorkflowReport, WorkflowError> {
        workflow::run_workflow(
            &self.backend,
            &self.config,
            &self.resolver.temp_dir_path(),
            request,
        )
    }

    pub fn check_dependencies(&self) -> DependencyReport {
        dependencies::check_dependencies(self.environment, self.config.capture.timeouts().probe)
    }

    pub fn environment_info(&self) -> EnvironmentInfo {
        EnvironmentInfo {
            environment: self.environment,
            backend: self.backend.name(),
            bridge_available: self.backend.bridge_available(),
            missing_tools: dependencies::missing_backend_tools(self.environment),
        }
    }

    /// Remove a capture directory if it is a temporary one.
    pub fn remove_capture_dir(&self, dir: &Path) -> Result<bool, CleanupError> {
        cleanup::remove_capture_dir(dir, &self.resolver.temp_dir_path())
    }

    /// Apply the configured retention policy to the temp directory.
    ///
    /// Returns `None` when automatic cleanup is disabled.
    pub fn prune_temp(&self) -> Option<PruneSummary> {
        let cleanup_config = &self.config.cleanup;
        if !cleanup_config.auto_cleanup_temp() {
            return None;
        }
        let retention = Duration::from_secs(cleanup_config.temp_retention_hours() * 3600);
        match cleanup::prune_temp_dir(
            &self.resolver.temp_dir_path(),
            retention,
            cleanup_config.max_temp_files(),
        ) {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(event = "core.cleanup.prune_failed", error = %e);
                None
            }
        }
    }
}
