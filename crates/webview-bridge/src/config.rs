//! Configuration for webview windows and native library lookup.
//!
//! Loaded from TOML; every field is optional and falls back to defaults.

mod loader;
mod schema;

pub use loader::{load_from_path, resolve_library_path, validate, LIBRARY_ENV_VAR};
pub use schema::{Size, SizeHint, WebviewConfig};
