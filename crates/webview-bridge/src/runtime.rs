use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::runtime::{Builder, Handle, Runtime};
use tracing::debug;

use crate::errors::BridgeError;

/// Where deferred replies are driven.
///
/// Either a runtime the caller already owns, or a small private one built
/// on first use so the native loop never has to poll futures itself.
pub(crate) struct Executor {
    external: Option<Handle>,
    owned: Mutex<Option<Runtime>>,
    closed: AtomicBool,
}

impl Executor {
    pub(crate) fn owned() -> Self {
        Self {
            external: None,
            owned: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn external(handle: Handle) -> Self {
        Self {
            external: Some(handle),
            owned: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn handle(&self) -> Result<Handle, BridgeError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BridgeError::Runtime("registry has been unloaded".into()));
        }
        if let Some(handle) = &self.external {
            return Ok(handle.clone());
        }

        let mut slot = self.owned.lock().unwrap_or_else(PoisonError::into_inner);
        let runtime = match slot.take() {
            Some(rt) => rt,
            None => {
                debug!("starting reply runtime");
                Builder::new_multi_thread()
                    .worker_threads(1)
                    .thread_name("webview-reply")
                    .enable_all()
                    .build()
                    .map_err(|e| BridgeError::Runtime(e.to_string()))?
            }
        };
        let handle = runtime.handle().clone();
        *slot = Some(runtime);
        Ok(handle)
    }

    /// Stop accepting work and let the private runtime wind down without
    /// blocking the caller. Pending replies are abandoned.
    pub(crate) fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        let runtime = self
            .owned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(rt) = runtime {
            debug!("stopping reply runtime");
            rt.shutdown_background();
        }
    }
}
