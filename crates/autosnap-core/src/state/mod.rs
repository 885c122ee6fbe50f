pub mod errors;
pub mod handler;
pub mod types;

pub use errors::PrepareError;
pub use handler::WindowStateController;
pub use types::CaptureSessionState;
