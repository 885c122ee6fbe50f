use serde::Serialize;

use crate::environment::Environment;

/// An external program some feature shells out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tool {
    pub name: &'static str,
    pub program: &'static str,
    pub purpose: &'static str,
    pub install_hint: &'static str,
}

pub const WMCTRL: Tool = Tool {
    name: "wmctrl",
    program: "wmctrl",
    purpose: "window enumeration and state changes",
    install_hint: "sudo apt-get install wmctrl",
};

pub const XDOTOOL: Tool = Tool {
    name: "xdotool",
    program: "xdotool",
    purpose: "focus, minimize and key delivery",
    install_hint: "sudo apt-get install xdotool",
};

pub const TESSERACT: Tool = Tool {
    name: "tesseract",
    program: "tesseract",
    purpose: "OCR text extraction",
    install_hint: "sudo apt-get install tesseract-ocr",
};

pub const POWERSHELL_BRIDGE: Tool = Tool {
    name: "powershell",
    program: "powershell.exe",
    purpose: "Windows desktop access",
    install_hint: "enable Windows interop (powershell.exe must be on PATH)",
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyStatus {
    pub name: &'static str,
    pub available: bool,
    pub purpose: &'static str,
    pub install_hint: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    pub environment: Environment,
    pub dependencies: Vec<DependencyStatus>,
}

impl DependencyReport {
    pub fn missing(&self) -> Vec<&'static str> {
        self.dependencies
            .iter()
            .filter(|d| !d.available)
            .map(|d| d.name)
            .collect()
    }

    pub fn all_available(&self) -> bool {
        self.dependencies.iter().all(|d| d.available)
    }
}
