use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("failed to load native library {path}: {reason}")]
    LibraryLoad { path: PathBuf, reason: String },

    #[error("native library is missing symbol {name}: {reason}")]
    MissingSymbol { name: &'static str, reason: String },

    #[error("native webview creation failed")]
    CreateFailed,

    #[error("native handle {0:#x} is already owned by a live webview")]
    HandleInUse(usize),

    #[error("native window is unavailable")]
    WindowUnavailable,

    #[error("webview has been destroyed")]
    Destroyed,

    #[error("{what} contains an interior nul byte")]
    InteriorNul { what: &'static str },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("async runtime error: {0}")]
    Runtime(String),
}
