use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::bridge::{self, trampoline, Binding, HandlerError, Outcome, Reply, Status};
use crate::cstr;
use crate::errors::BridgeError;

use super::{State, Webview};

impl Webview {
    /// Bind `name` to a handler that sees the raw `(seq, req)` strings.
    ///
    /// The handler is responsible for answering through
    /// [`WebviewRef::dispatch_return`](super::WebviewRef::dispatch_return).
    /// Binding a name that is already bound replaces the old handler.
    pub fn bind_raw<F>(&self, name: &str, handler: F) -> Result<(), BridgeError>
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        let cname = cstr::encode(name, "binding name")?;
        let mut state = self.inner.lock();
        let handle = state.handle.ok_or(BridgeError::Destroyed)?;

        if state.bindings.contains_key(name) {
            debug!(id = self.id(), name = %name, "rebinding, releasing previous handler");
            self.unbind_locked(&mut state, name);
        }

        let binding = Binding::new(cname, Box::new(handler));
        // SAFETY: handle is live under the lock. The binding is kept in the
        // map until unbound, so `arg` stays valid for every native call.
        unsafe {
            (self.inner.table.fns().bind)(
                handle.as_ptr(),
                binding.name.as_ptr(),
                trampoline,
                binding.as_arg(),
            )
        };
        state.bindings.insert(name.to_owned(), binding);
        debug!(id = self.id(), name = %name, "bound");
        Ok(())
    }

    /// Bind `name` to a handler over the decoded argument list. Every
    /// invocation is answered exactly once, whatever the handler returns.
    pub fn bind_with<F>(&self, name: &str, handler: F) -> Result<(), BridgeError>
    where
        F: Fn(Vec<Value>) -> Outcome + Send + Sync + 'static,
    {
        let instance = Arc::downgrade(&self.inner);
        self.bind_raw(name, move |seq, req| {
            let outcome = bridge::invoke(&handler, req);
            match instance.upgrade() {
                Some(instance) => instance.complete(seq.to_owned(), outcome),
                None => warn!(seq = %seq, "call dropped: webview already released"),
            }
        })
    }

    /// Bind `name` to a synchronous handler. Arguments are spread into `A`,
    /// normally a tuple: `|(name,): (String,)| ...`.
    pub fn bind<A, R, F>(&self, name: &str, handler: F) -> Result<(), BridgeError>
    where
        A: DeserializeOwned,
        R: Serialize,
        F: Fn(A) -> Result<R, HandlerError> + Send + Sync + 'static,
    {
        self.bind_with(name, move |args| {
            let reply = match bridge::spread::<A>(args) {
                Ok(args) => Reply::from_result(handler(args)),
                Err(e) => Reply::failure(e),
            };
            Outcome::Ready(reply)
        })
    }

    /// Bind `name` to an async handler. The native call returns at once;
    /// the reply is sent when the future settles.
    pub fn bind_async<A, R, F, Fut>(&self, name: &str, handler: F) -> Result<(), BridgeError>
    where
        A: DeserializeOwned,
        R: Serialize + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
    {
        self.bind_with(name, move |args| match bridge::spread::<A>(args) {
            Ok(args) => {
                let pending = handler(args);
                Outcome::Pending(Box::pin(async move { Reply::from_result(pending.await) }))
            }
            Err(e) => Outcome::Ready(Reply::failure(e)),
        })
    }

    /// Remove a binding. Unknown names and destroyed webviews are no-ops.
    pub fn unbind(&self, name: &str) {
        let mut state = self.inner.lock();
        self.unbind_locked(&mut state, name);
    }

    fn unbind_locked(&self, state: &mut State, name: &str) {
        let Some(handle) = state.handle else {
            return;
        };
        let Some(binding) = state.bindings.remove(name) else {
            return;
        };
        // SAFETY: handle is live under the lock; the name was encoded at bind time.
        unsafe { (self.inner.table.fns().unbind)(handle.as_ptr(), binding.name.as_ptr()) };
        debug!(id = self.id(), name = %name, "unbound");
    }

    /// Names currently bound on this webview.
    pub fn bindings(&self) -> Vec<String> {
        self.inner.lock().bindings.keys().cloned().collect()
    }

    /// Answer a pending call by its seq token.
    pub fn dispatch_return(&self, seq: &str, status: Status, json: &str) -> Result<(), BridgeError> {
        self.inner.dispatch_return(seq, status, json)
    }
}
