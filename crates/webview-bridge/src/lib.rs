//! Host-side bridge over the native `webview` C library.
//!
//! Provides:
//! - A typed function table loaded once from the native library
//! - Owned webview instances with idempotent teardown
//! - Bidirectional calls (JavaScript -> Rust handlers -> JavaScript replies)
//! - An explicit registry for bulk teardown at unload
//! - TOML configuration for window defaults and library lookup

pub mod bridge;
pub mod config;
pub mod cstr;
pub mod errors;
pub mod ffi;
pub mod registry;
mod runtime;
pub mod webview;

#[cfg(test)]
mod testing;

pub use bridge::{HandlerError, Outcome, Reply, Status};
pub use config::{Size, SizeHint, WebviewConfig};
pub use errors::{BridgeError, ConfigError};
pub use ffi::{NativeFns, NativeTable};
pub use registry::Registry;
pub use webview::{Webview, WebviewRef};

pub type Result<T> = std::result::Result<T, BridgeError>;
