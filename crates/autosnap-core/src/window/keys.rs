use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical navigation key understood by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationKey {
    Down,
    PageDown,
    Right,
    Up,
    Left,
    Space,
    Enter,
    Tab,
}

impl NavigationKey {
    pub const ALL: [NavigationKey; 8] = [
        NavigationKey::Down,
        NavigationKey::PageDown,
        NavigationKey::Right,
        NavigationKey::Up,
        NavigationKey::Left,
        NavigationKey::Space,
        NavigationKey::Enter,
        NavigationKey::Tab,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NavigationKey::Down => "Down",
            NavigationKey::PageDown => "PageDown",
            NavigationKey::Right => "Right",
            NavigationKey::Up => "Up",
            NavigationKey::Left => "Left",
            NavigationKey::Space => "Space",
            NavigationKey::Enter => "Enter",
            NavigationKey::Tab => "Tab",
        }
    }

    /// X11 keysym name as accepted by `xdotool key`.
    pub fn x11_keysym(&self) -> &'static str {
        match self {
            NavigationKey::Down => "Down",
            NavigationKey::PageDown => "Next",
            NavigationKey::Right => "Right",
            NavigationKey::Up => "Up",
            NavigationKey::Left => "Left",
            NavigationKey::Space => "space",
            NavigationKey::Enter => "Return",
            NavigationKey::Tab => "Tab",
        }
    }

    /// Win32 virtual-key code.
    pub fn virtual_key_code(&self) -> u16 {
        match self {
            NavigationKey::Down => 0x28,
            NavigationKey::PageDown => 0x22,
            NavigationKey::Right => 0x27,
            NavigationKey::Up => 0x26,
            NavigationKey::Left => 0x25,
            NavigationKey::Space => 0x20,
            NavigationKey::Enter => 0x0D,
            NavigationKey::Tab => 0x09,
        }
    }
}

impl fmt::Display for NavigationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown navigation key '{name}'. Supported keys: Down, PageDown, Right, Up, Left, Space, Enter, Tab")]
pub struct UnknownNavigationKey {
    pub name: String,
}

impl crate::errors::SnapError for UnknownNavigationKey {
    fn error_code(&self) -> &'static str {
        "UNKNOWN_NAVIGATION_KEY"
    }

    fn is_user_error(&self) -> bool {
        true
    }
}

impl FromStr for NavigationKey {
    type Err = UnknownNavigationKey;

    /// Accepts the logical names plus the X11-style spellings
    /// (`Page_Down`, `Next`, `Return`) case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-' && *c != ' ')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "down" | "arrowdown" => Ok(NavigationKey::Down),
            "pagedown" | "pgdn" | "next" => Ok(NavigationKey::PageDown),
            "right" | "arrowright" => Ok(NavigationKey::Right),
            "up" | "arrowup" => Ok(NavigationKey::Up),
            "left" | "arrowleft" => Ok(NavigationKey::Left),
            "space" | "spacebar" => Ok(NavigationKey::Space),
            "enter" | "return" => Ok(NavigationKey::Enter),
            "tab" => Ok(NavigationKey::Tab),
            _ => Err(UnknownNavigationKey {
                name: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Page_Down".parse::<NavigationKey>().unwrap(), NavigationKey::PageDown);
        assert_eq!("pagedown".parse::<NavigationKey>().unwrap(), NavigationKey::PageDown);
        assert_eq!("space".parse::<NavigationKey>().unwrap(), NavigationKey::Space);
        assert_eq!("Return".parse::<NavigationKey>().unwrap(), NavigationKey::Enter);
        assert_eq!(" Down ".parse::<NavigationKey>().unwrap(), NavigationKey::Down);
    }

    #[test]
    fn test_parse_unknown_key_fails() {
        let err = "F13".parse::<NavigationKey>().unwrap_err();
        assert_eq!(err.name, "F13");
        assert!(err.to_string().contains("Unknown navigation key"));
    }

    #[test]
    fn test_names_round_trip_through_parser() {
        for key in NavigationKey::ALL {
            assert_eq!(key.name().parse::<NavigationKey>().unwrap(), key);
        }
    }

    #[test]
    fn test_platform_mappings() {
        assert_eq!(NavigationKey::PageDown.x11_keysym(), "Next");
        assert_eq!(NavigationKey::PageDown.virtual_key_code(), 0x22);
        assert_eq!(NavigationKey::Enter.x11_keysym(), "Return");
        assert_eq!(NavigationKey::Down.virtual_key_code(), 0x28);
    }
}
