//! Webview instances.
//!
//! A [`Webview`] owns one native handle and the bindings registered on it.
//! The shared state lives in an `Instance` so the registry and deferred
//! replies can reach it without owning the window.

use std::collections::HashMap;
use std::ffi::{c_char, c_void};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, warn};

use crate::bridge::{self, Binding, HandlerError, Outcome, Reply, Status};
use crate::cstr;
use crate::errors::BridgeError;
use crate::ffi::{NativeFns, NativeTable, RawHandle};
use crate::runtime::Executor;

mod bind;
mod content;
mod lifecycle;


/// Owning handle to a native webview window.
///
/// Dropping it destroys the window; [`Webview::destroy`] does the same
/// eagerly and is safe to call more than once.
pub struct Webview {
    inner: Arc<Instance>,
}

/// Non-owning reference to a webview, for use inside bound handlers.
///
/// Every call fails with [`BridgeError::Destroyed`] once the webview is gone.
/// The reference is `Send`, but only [`terminate`](Self::terminate) and
/// [`dispatch_return`](Self::dispatch_return) may be used off the UI thread.
#[derive(Clone)]
pub struct WebviewRef {
    inner: Weak<Instance>,
}

pub(crate) struct Instance {
    id: u64,
    table: Arc<NativeTable>,
    executor: Arc<Executor>,
    state: Mutex<State>,
}

struct State {
    /// `None` once destroyed; no native call is made without a handle.
    handle: Option<RawHandle>,
    bindings: HashMap<String, Arc<Binding>>,
}

impl Instance {
    fn new(id: u64, table: Arc<NativeTable>, executor: Arc<Executor>, handle: RawHandle) -> Self {
        Self {
            id,
            table,
            executor,
            state: Mutex::new(State {
                handle: Some(handle),
                bindings: HashMap::new(),
            }),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self) -> Result<RawHandle, BridgeError> {
        self.lock().handle.ok_or(BridgeError::Destroyed)
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.lock().handle.is_none()
    }

    pub(crate) fn owns(&self, handle: RawHandle) -> bool {
        self.lock().handle == Some(handle)
    }

    /// Run a native call with the live handle. The state lock is held for
    /// the duration so a concurrent destroy cannot free the handle mid-call.
    fn call<T>(&self, f: impl FnOnce(&NativeFns, *mut c_void) -> T) -> Result<T, BridgeError> {
        let state = self.lock();
        let handle = state.handle.ok_or(BridgeError::Destroyed)?;
        Ok(f(self.table.fns(), handle.as_ptr()))
    }

    /// Encode `value` and pass it to a native call taking one string.
    fn call_str(
        &self,
        what: &'static str,
        value: &str,
        f: impl FnOnce(&NativeFns, *mut c_void, *const c_char),
    ) -> Result<(), BridgeError> {
        let value = cstr::encode(value, what)?;
        self.call(|fns, w| f(fns, w, value.as_ptr()))
    }

    fn eval(&self, js: &str) -> Result<(), BridgeError> {
        // SAFETY: handle is live under the lock; js outlives the call.
        self.call_str("script", js, |fns, w, js| unsafe { (fns.eval)(w, js) })
    }

    fn terminate(&self) -> Result<(), BridgeError> {
        // SAFETY: handle is live under the lock.
        self.call(|fns, w| unsafe { (fns.terminate)(w) })
    }

    fn dispatch_return(&self, seq: &str, status: Status, json: &str) -> Result<(), BridgeError> {
        let seq = cstr::encode(seq, "seq")?;
        let json = cstr::encode(json, "result")?;
        // SAFETY: handle is live under the lock; both strings outlive the call.
        self.call(|fns, w| unsafe { (fns.return_)(w, seq.as_ptr(), status.as_raw(), json.as_ptr()) })
    }

    fn send_reply(&self, seq: &str, reply: &Reply) {
        debug!(id = self.id, seq = %seq, status = ?reply.status, "replying to binding call");
        if let Err(e) = self.dispatch_return(seq, reply.status, &reply.to_json()) {
            warn!(id = self.id, seq = %seq, "reply dropped: {e}");
        }
    }

    /// Answer one invocation: now if the outcome is ready, otherwise once
    /// the pending future settles on the executor.
    fn complete(self: &Arc<Self>, seq: String, outcome: Outcome) {
        let pending = match outcome {
            Outcome::Ready(reply) => return self.send_reply(&seq, &reply),
            Outcome::Pending(pending) => pending,
        };

        let runtime = match self.executor.handle() {
            Ok(rt) => rt,
            Err(e) => {
                let err = HandlerError::named("RuntimeError", e.to_string());
                return self.send_reply(&seq, &Reply::failure(err));
            }
        };

        let weak = Arc::downgrade(self);
        let id = self.id;
        runtime.spawn(async move {
            let reply = bridge::settle(pending).await;
            match weak.upgrade() {
                Some(instance) => instance.send_reply(&seq, &reply),
                None => warn!(id, seq = %seq, "reply dropped: webview released before handler settled"),
            }
        });
    }
}

impl Webview {
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The native handle, or `None` once destroyed.
    pub fn raw_handle(&self) -> Option<*mut c_void> {
        self.inner.lock().handle.map(RawHandle::as_ptr)
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.is_destroyed()
    }

    pub fn downgrade(&self) -> WebviewRef {
        WebviewRef {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl Drop for Webview {
    fn drop(&mut self) {
        self.inner.destroy();
    }
}

impl std::fmt::Debug for Webview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Webview")
            .field("id", &self.inner.id)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl WebviewRef {
    fn upgrade(&self) -> Result<Arc<Instance>, BridgeError> {
        self.inner.upgrade().ok_or(BridgeError::Destroyed)
    }

    pub fn is_alive(&self) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inst| !inst.is_destroyed())
    }

    /// Evaluate JavaScript against the current page.
    ///
    /// Call this only on the UI thread, for example from a synchronous
    /// handler. The native `eval` is not thread safe, so an async handler
    /// running on a tokio worker must not use it; return a value instead
    /// and let the reply carry it.
    pub fn eval(&self, js: &str) -> Result<(), BridgeError> {
        self.upgrade()?.eval(js)
    }

    /// Stop the run loop; the owner's `run` then destroys the window.
    /// Safe from any thread.
    pub fn terminate(&self) -> Result<(), BridgeError> {
        self.upgrade()?.terminate()
    }

    /// Answer a pending call by its seq token. Safe from any thread.
    pub fn dispatch_return(&self, seq: &str, status: Status, json: &str) -> Result<(), BridgeError> {
        self.upgrade()?.dispatch_return(seq, status, json)
    }
}
