use std::any::Any;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};

use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{HandlerError, Outcome, Reply};

/// Parse a request payload: a JSON array of positional arguments.
pub(crate) fn parse_args(req: &str) -> Result<Vec<Value>, HandlerError> {
    match serde_json::from_str::<Value>(req) {
        Ok(Value::Array(args)) => Ok(args),
        Ok(other) => Err(HandlerError::type_error(format!(
            "expected a JSON array of arguments, got {other}"
        ))),
        Err(e) => Err(HandlerError::type_error(format!("invalid request JSON: {e}"))),
    }
}

/// Longest tuple serde can deserialize; bounds how far arguments are padded.
const MAX_ARITY: usize = 16;

/// Map positional arguments onto a handler's parameter type, usually a tuple.
/// Zero-argument handlers may take `()`.
///
/// Call sites may pass more or fewer arguments than the handler declares.
/// Extra trailing arguments are dropped and missing ones arrive as `null`,
/// so an `Option` slot at the end of the tuple becomes `None`.
pub(crate) fn spread<A: DeserializeOwned>(args: Vec<Value>) -> Result<A, HandlerError> {
    let exact = match spread_exact(args.clone()) {
        Ok(a) => return Ok(a),
        Err(e) => e,
    };

    for len in (0..args.len()).rev() {
        if let Ok(a) = spread_exact(args[..len].to_vec()) {
            return Ok(a);
        }
    }
    for len in args.len() + 1..=MAX_ARITY {
        let mut padded = args.clone();
        padded.resize(len, Value::Null);
        if let Ok(a) = spread_exact(padded) {
            return Ok(a);
        }
    }
    Err(exact)
}

fn spread_exact<A: DeserializeOwned>(args: Vec<Value>) -> Result<A, HandlerError> {
    let empty = args.is_empty();
    match serde_json::from_value(Value::Array(args)) {
        Ok(a) => Ok(a),
        Err(_) if empty => serde_json::from_value(Value::Null).map_err(HandlerError::type_error),
        Err(e) => Err(HandlerError::type_error(e)),
    }
}

/// Run a handler against a raw request. Malformed requests and panics become
/// failure replies; nothing unwinds past this point.
pub(crate) fn invoke<F>(handler: &F, req: &str) -> Outcome
where
    F: Fn(Vec<Value>) -> Outcome + ?Sized,
{
    let args = match parse_args(req) {
        Ok(args) => args,
        Err(e) => return Outcome::Ready(Reply::failure(e)),
    };
    match catch_unwind(AssertUnwindSafe(|| handler(args))) {
        Ok(outcome) => outcome,
        Err(payload) => Outcome::Ready(Reply::failure(panic_error(payload))),
    }
}

/// Drive a pending reply to completion, converting a panic into a failure.
pub(crate) async fn settle<F>(pending: F) -> Reply
where
    F: Future<Output = Reply>,
{
    match AssertUnwindSafe(pending).catch_unwind().await {
        Ok(reply) => reply,
        Err(payload) => Reply::failure(panic_error(payload)),
    }
}

fn panic_error(payload: Box<dyn Any + Send>) -> HandlerError {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    };
    HandlerError::named("Panic", message)
}
