use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Platform window identifier with descriptive metadata.
///
/// Identity is the `id` alone: an X11 window id (`0x04a00007`) or a native
/// window handle value in decimal. Title and process name are descriptive
/// and take no part in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowHandle {
    id: String,
    title: String,
    process_name: String,
}

impl WindowHandle {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        process_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            process_name: process_name.into(),
        }
    }

    /// Handle known only by id, e.g. one supplied by a caller.
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            title: format!("[Window {}]", id),
            id,
            process_name: String::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    /// Numeric value of the id, accepting both `0x` hex and decimal forms.
    pub fn numeric_id(&self) -> Option<u64> {
        let id = self.id.trim();
        match id.strip_prefix("0x").or_else(|| id.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => id.parse().ok(),
        }
    }
}

impl PartialEq for WindowHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for WindowHandle {}

impl Hash for WindowHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.id)
    }
}

/// On-screen visibility of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowVisibility {
    Normal,
    Minimized,
    Maximized,
    Hidden,
}

impl WindowVisibility {
    /// Whether pixels can be captured without a transition first.
    pub fn is_capturable(&self) -> bool {
        matches!(self, WindowVisibility::Normal | WindowVisibility::Maximized)
    }
}

impl fmt::Display for WindowVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WindowVisibility::Normal => "normal",
            WindowVisibility::Minimized => "minimized",
            WindowVisibility::Maximized => "maximized",
            WindowVisibility::Hidden => "hidden",
        };
        f.write_str(s)
    }
}

/// Point-in-time reading of a window's state. Never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowVisibilityState {
    pub visibility: WindowVisibility,
    pub is_foreground: bool,
}

impl WindowVisibilityState {
    pub fn new(visibility: WindowVisibility, is_foreground: bool) -> Self {
        Self {
            visibility,
            is_foreground,
        }
    }
}

/// Window rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl WindowRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// Enumerated window with its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct WindowInfo {
    #[serde(flatten)]
    handle: WindowHandle,
    pid: Option<u32>,
    geometry: Option<WindowRect>,
    state: WindowVisibility,
}

impl WindowInfo {
    pub fn new(
        handle: WindowHandle,
        pid: Option<u32>,
        geometry: Option<WindowRect>,
        state: WindowVisibility,
    ) -> Self {
        Self {
            handle,
            pid,
            geometry,
            state,
        }
    }

    pub fn handle(&self) -> &WindowHandle {
        &self.handle
    }

    pub fn id(&self) -> &str {
        self.handle.id()
    }

    pub fn title(&self) -> &str {
        self.handle.title()
    }

    pub fn process_name(&self) -> &str {
        self.handle.process_name()
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn geometry(&self) -> Option<WindowRect> {
        self.geometry
    }

    pub fn state(&self) -> WindowVisibility {
        self.state
    }
}

/// Title to show for a window, never empty.
///
/// Falls back to `[<process> - <id>]`, or `[Window <id>]` when the process
/// name is unknown too.
pub fn display_title(title: &str, process_name: &str, id: &str) -> String {
    let trimmed = title.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    if process_name.trim().is_empty() {
        format!("[Window {}]", id)
    } else {
        format!("[{} - {}]", process_name.trim(), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_identity_ignores_title() {
        let a = WindowHandle::new("42", "Report.pdf", "AcroRd32");
        let b = WindowHandle::new("42", "Report.pdf - page 2", "AcroRd32");
        assert_eq!(a, b);
        assert_ne!(a, WindowHandle::from_id("43"));
    }

    #[test]
    fn test_numeric_id_hex_and_decimal() {
        assert_eq!(WindowHandle::from_id("0x04a00007").numeric_id(), Some(0x04a00007));
        assert_eq!(WindowHandle::from_id("131844").numeric_id(), Some(131844));
        assert_eq!(WindowHandle::from_id("abc").numeric_id(), None);
    }

    #[test]
    fn test_display_title_fallbacks() {
        assert_eq!(display_title("Editor", "code", "1"), "Editor");
        assert_eq!(display_title("   ", "evince", "0x1"), "[evince - 0x1]");
        assert_eq!(display_title("", "", "77"), "[Window 77]");
    }

    #[test]
    fn test_degenerate_rect() {
        assert!(WindowRect::new(0, 0, 0, 100).is_degenerate());
        assert!(WindowRect::new(0, 0, 100, -1).is_degenerate());
        assert!(!WindowRect::new(-5, -5, 1, 1).is_degenerate());
    }

    #[test]
    fn test_window_info_serializes_flat() {
        let info = WindowInfo::new(
            WindowHandle::new("7", "Doc", "viewer"),
            Some(1234),
            Some(WindowRect::new(0, 0, 800, 600)),
            WindowVisibility::Minimized,
        );
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["id"], "7");
        assert_eq!(json["title"], "Doc");
        assert_eq!(json["state"], "minimized");
        assert_eq!(json["geometry"]["width"], 800);
    }
}
