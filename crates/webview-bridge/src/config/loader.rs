use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::ConfigError;

use super::schema::WebviewConfig;

/// Environment variable consulted when no explicit library path is given.
pub const LIBRARY_ENV_VAR: &str = "WEBVIEW_LIBRARY";

#[cfg(target_os = "windows")]
const DEFAULT_LIBRARY: &str = "webview.dll";
#[cfg(target_os = "macos")]
const DEFAULT_LIBRARY: &str = "libwebview.dylib";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const DEFAULT_LIBRARY: &str = "libwebview.so";

/// Load config from a TOML file, using defaults for missing fields.
pub fn load_from_path(path: &Path) -> Result<WebviewConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::ParseError(format!("failed to read {}: {e}", path.display()))
    })?;

    let config: WebviewConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    validate(&config)?;

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Reject geometry the native library cannot honour.
pub fn validate(config: &WebviewConfig) -> Result<(), ConfigError> {
    if config.size.width <= 0 {
        return Err(ConfigError::ValidationError(format!(
            "size.width must be positive, got {}",
            config.size.width
        )));
    }
    if config.size.height <= 0 {
        return Err(ConfigError::ValidationError(format!(
            "size.height must be positive, got {}",
            config.size.height
        )));
    }
    Ok(())
}

/// Pick the native library path: explicit, then `WEBVIEW_LIBRARY`, then the
/// platform default name (resolved by the system loader's search path).
pub fn resolve_library_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = std::env::var_os(LIBRARY_ENV_VAR).filter(|v| !v.is_empty()) {
        debug!(var = LIBRARY_ENV_VAR, "library path taken from environment");
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_LIBRARY)
}
