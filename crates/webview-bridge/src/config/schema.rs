use std::ffi::c_int;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Sizing constraint passed alongside width/height to the native library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeHint {
    /// Width and height are the default size.
    #[default]
    None,
    /// Width and height are the minimum bounds.
    Min,
    /// Width and height are the maximum bounds.
    Max,
    /// Window size cannot be changed by the user.
    Fixed,
}

impl SizeHint {
    pub fn as_raw(self) -> c_int {
        match self {
            Self::None => 0,
            Self::Min => 1,
            Self::Max => 2,
            Self::Fixed => 3,
        }
    }
}

/// Window geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
    pub hint: SizeHint,
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            hint: SizeHint::None,
        }
    }
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            hint: SizeHint::None,
        }
    }

    pub fn with_hint(mut self, hint: SizeHint) -> Self {
        self.hint = hint;
        self
    }
}

/// Settings applied when a webview is created from config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebviewConfig {
    /// Enable the native developer tools.
    pub debug: bool,
    /// Window title applied right after creation.
    pub title: Option<String>,
    /// Initial window geometry.
    pub size: Size,
    /// Explicit path to the native webview library.
    pub library: Option<PathBuf>,
}

impl Default for WebviewConfig {
    fn default() -> Self {
        Self {
            debug: cfg!(debug_assertions),
            title: None,
            size: Size::default(),
            library: None,
        }
    }
}
