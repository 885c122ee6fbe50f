pub mod handler;
pub mod types;

pub use handler::{classify, detect};
pub use types::{Environment, EnvironmentInfo, HostOs};
