pub mod keys;
pub mod types;

pub use keys::{NavigationKey, UnknownNavigationKey};
pub use types::{
    WindowHandle, WindowInfo, WindowRect, WindowVisibility, WindowVisibilityState, display_title,
};
