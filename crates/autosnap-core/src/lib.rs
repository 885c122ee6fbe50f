//! autosnap-core: Core library for cross-environment window capture
//!
//! This library detects the desktop environment it runs in, enumerates and
//! captures windows through an environment-specific backend, and drives
//! multi-page document capture against a live window. It also carries the
//! image processing and PDF assembly used on captured pages.
//!
//! # Main Entry Points
//!
//! - [`context`] - Process-wide dependencies built once at startup
//! - [`environment`] - Classify the runtime environment
//! - [`backend`] - Enumerate, capture, control and send keys to windows
//! - [`state`] - Prepare a window for capture and restore it afterwards
//! - [`session`] - Multi-page capture-navigate-capture sessions
//! - [`processing`] - Enhancement, OCR, resizing and duplicate detection
//! - [`pdf`] - Assemble captured pages into a PDF
//! - [`workflow`] - Capture straight to PDF
//! - [`config`] - Configuration and output path resolution

pub mod backend;
pub mod capture;
pub mod cleanup;
pub mod command;
pub mod config;
pub mod context;
pub mod dependencies;
pub mod environment;
pub mod errors;
pub mod events;
pub mod logging;
pub mod pdf;
pub mod processing;
pub mod session;
pub mod state;
pub mod window;
pub mod workflow;

// Re-export commonly used types at crate root for convenience
pub use backend::{
    Backend, DesktopBackend, FrameCapturer, KeySender, WindowControl, WindowEnumerator,
};
pub use capture::CaptureError;
pub use config::{PathResolver, SnapConfig};
pub use context::SnapContext;
pub use environment::{Environment, EnvironmentInfo};
pub use errors::SnapError;
pub use session::{
    CapturedPage, DocumentCapture, MultiPageCaptureOrchestrator, SessionError, SessionFailure,
    SkippedPage,
};
pub use state::{CaptureSessionState, PrepareError, WindowStateController};
pub use window::{
    NavigationKey, WindowHandle, WindowInfo, WindowVisibility, WindowVisibilityState,
};
pub use workflow::{WorkflowReport, WorkflowRequest};

// Re-export handler modules as the primary API
pub use pdf::handler as pdf_ops;
pub use processing::handler as processing_ops;
pub use session::handler as session_ops;

// Re-export logging initialization
pub use logging::init_logging;
