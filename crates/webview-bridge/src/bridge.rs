//! Call bridge between JavaScript and Rust handlers.
//!
//! Calls flow in both directions:
//! - **JS -> Rust**: a bound function called from JavaScript makes the
//!   native library invoke our trampoline with `(seq, req, arg)`, where
//!   `req` is a JSON array of the call's arguments.
//! - **Rust -> JS**: every invocation is answered exactly once through
//!   `webview_return(seq, status, json)`, either immediately or after an
//!   async handler settles. `status` is 0 on success and 1 on failure.

use std::fmt;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

mod invoke;
mod trampoline;

pub(crate) use invoke::{invoke, settle, spread};
pub(crate) use trampoline::{trampoline, Binding};

/// Outcome status reported back to JavaScript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
}

impl Status {
    pub fn as_raw(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
        }
    }
}

/// Error value a handler reports to its JavaScript caller.
///
/// Serialized into the reply body as `{"name": ..., "message": ...}` so the
/// rejected promise on the JS side carries something Error-shaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{name}: {message}")]
pub struct HandlerError {
    pub name: String,
    pub message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::named("Error", message)
    }

    pub fn named(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    pub(crate) fn type_error(message: impl fmt::Display) -> Self {
        Self::named("TypeError", message.to_string())
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        Self::type_error(e)
    }
}

/// A settled reply: status plus the JSON value sent back.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: Status,
    pub body: Value,
}

impl Reply {
    pub fn success(body: Value) -> Self {
        Self {
            status: Status::Success,
            body,
        }
    }

    pub fn failure(error: HandlerError) -> Self {
        let body = serde_json::to_value(&error).unwrap_or_else(|_| Value::String(error.to_string()));
        Self {
            status: Status::Failure,
            body,
        }
    }

    /// Turn a handler's typed result into a reply.
    pub fn from_result<R: Serialize>(result: Result<R, HandlerError>) -> Self {
        match result {
            Ok(value) => match serde_json::to_value(value) {
                Ok(body) => Self::success(body),
                Err(e) => Self::failure(HandlerError::type_error(format!(
                    "result is not serializable: {e}"
                ))),
            },
            Err(err) => Self::failure(err),
        }
    }

    /// The reply body as a single JSON document.
    pub fn to_json(&self) -> String {
        self.body.to_string()
    }
}

/// What a handler produced for one invocation.
pub enum Outcome {
    /// Reply right away, before the trampoline returns.
    Ready(Reply),
    /// Reply once the future settles; the trampoline returns immediately.
    Pending(BoxFuture<'static, Reply>),
}

impl Outcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(reply) => f.debug_tuple("Ready").field(reply).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

impl From<Reply> for Outcome {
    fn from(reply: Reply) -> Self {
        Self::Ready(reply)
    }
}
