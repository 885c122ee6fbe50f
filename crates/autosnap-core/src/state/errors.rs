use crate::capture::CaptureError;

use super::types::CaptureSessionState;

/// A failed `prepare`, with whatever it may already have changed.
///
/// `partial` is `Some` once the original state was read; the caller must
/// restore it.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct PrepareError {
    pub source: CaptureError,
    pub partial: Option<CaptureSessionState>,
}

impl PrepareError {
    /// Split into the restorable partial state and the underlying error.
    pub fn into_parts(self) -> (Option<CaptureSessionState>, CaptureError) {
        (self.partial, self.source)
    }
}
