use std::ffi::{c_int, c_void};
use std::ptr;
use std::sync::Arc;

use tracing::debug;

use crate::config::{Size, WebviewConfig};
use crate::errors::BridgeError;
use crate::ffi::RawHandle;
use crate::registry::Registry;

use super::{Instance, Webview};

impl Webview {
    /// Create a window from config: debug flag, size, and optional title.
    pub fn new(registry: &Registry, config: &WebviewConfig) -> Result<Self, BridgeError> {
        let webview = Self::create(registry, config.debug, Some(config.size))?;
        if let Some(title) = &config.title {
            webview.set_title(title)?;
        }
        Ok(webview)
    }

    /// Create a new top-level window. `size` is applied immediately when given.
    ///
    /// `None` leaves the library's own initial size in place. Pass
    /// `Some(Size::default())` for a 1024x768 window with no hint.
    pub fn create(registry: &Registry, debug: bool, size: Option<Size>) -> Result<Self, BridgeError> {
        // SAFETY: a null parent asks the library for a new top-level window.
        unsafe { Self::create_with_parent(registry, debug, size, ptr::null_mut()) }
    }

    /// Create a webview embedded in an existing native window.
    ///
    /// # Safety
    ///
    /// `parent` must be null or a valid native window pointer of the kind the
    /// library expects on this platform (`GtkWindow`, `NSWindow`, `HWND`).
    pub unsafe fn create_with_parent(
        registry: &Registry,
        debug: bool,
        size: Option<Size>,
        parent: *mut c_void,
    ) -> Result<Self, BridgeError> {
        // SAFETY: forwarded to the caller.
        let ptr = unsafe { (registry.table().fns().create)(c_int::from(debug), parent) };
        let handle = RawHandle::new(ptr).ok_or(BridgeError::CreateFailed)?;
        Self::attach(registry, handle, size)
    }

    /// Take ownership of a handle created elsewhere without calling `create`.
    ///
    /// # Safety
    ///
    /// `handle` must be a live handle from the same native library, and no
    /// owner outside this crate may destroy it. A handle already owned by a
    /// live webview of `registry` is rejected with
    /// [`BridgeError::HandleInUse`].
    pub unsafe fn adopt(
        registry: &Registry,
        handle: *mut c_void,
        size: Option<Size>,
    ) -> Result<Self, BridgeError> {
        let handle = RawHandle::new(handle).ok_or(BridgeError::CreateFailed)?;
        Self::attach(registry, handle, size)
    }

    fn attach(registry: &Registry, handle: RawHandle, size: Option<Size>) -> Result<Self, BridgeError> {
        let inner = Arc::new(Instance::new(
            registry.next_id(),
            registry.shared_table(),
            registry.executor(),
            handle,
        ));
        // Nothing owns `inner` until registration succeeds, so a rejected
        // handle is dropped without any native call.
        registry.register(&inner, handle)?;
        let webview = Self { inner };
        if let Some(size) = size {
            webview.set_size(size)?;
        }
        debug!(id = webview.id(), "webview attached");
        Ok(webview)
    }

    /// Native window pointer (`GtkWindow`, `NSWindow`, `HWND`).
    pub fn window(&self) -> Result<*mut c_void, BridgeError> {
        // SAFETY: handle is live under the lock.
        let window = self.inner.call(|fns, w| unsafe { (fns.get_window)(w) })?;
        if window.is_null() {
            return Err(BridgeError::WindowUnavailable);
        }
        Ok(window)
    }

    /// Block in the native loop until the window closes or `terminate` is
    /// called, then destroy the webview.
    pub fn run(&self) -> Result<(), BridgeError> {
        let handle = self.inner.handle()?;
        debug!(id = self.id(), "entering run loop");
        // The state lock is not held here: handlers re-enter the instance
        // from inside the loop.
        // SAFETY: only `destroy` frees the handle, and it is not called
        // concurrently with the loop by the owning thread.
        unsafe { (self.inner.table.fns().run)(handle.as_ptr()) };
        debug!(id = self.id(), "run loop exited");
        self.inner.destroy();
        Ok(())
    }

    /// Stop the run loop without destroying the handle.
    pub fn terminate(&self) -> Result<(), BridgeError> {
        self.inner.terminate()
    }

    /// Unbind everything, stop the loop, and free the native handle.
    /// Calling it again is a no-op.
    pub fn destroy(&self) {
        self.inner.destroy();
    }
}

impl Instance {
    /// Returns false if the instance was already destroyed.
    pub(crate) fn destroy(&self) -> bool {
        let mut state = self.lock();
        let Some(handle) = state.handle else {
            return false;
        };
        let fns = self.table.fns();

        // Bindings go first: the native side may still fire a trampoline
        // until it has been unbound.
        for (name, binding) in state.bindings.drain() {
            debug!(id = self.id, name = %name, "unbinding on destroy");
            // SAFETY: handle is still live; the name was encoded at bind time.
            unsafe { (fns.unbind)(handle.as_ptr(), binding.name.as_ptr()) };
        }

        // SAFETY: handle is live and is cleared right after.
        unsafe {
            (fns.terminate)(handle.as_ptr());
            (fns.destroy)(handle.as_ptr());
        }
        state.handle = None;
        debug!(id = self.id, "webview destroyed");
        true
    }
}
