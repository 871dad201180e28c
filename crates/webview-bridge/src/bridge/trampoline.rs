use std::ffi::{c_char, c_void, CString};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error};

use crate::cstr;

/// Raw handler: receives the decoded `(seq, req)` pair.
pub(crate) type RawHandler = dyn Fn(&str, &str) + Send + Sync + 'static;

/// One bound name. The address of the `Arc`'s contents is the `arg`
/// registered with the native library, so it must stay put until unbound.
pub(crate) struct Binding {
    pub(crate) name: CString,
    pub(crate) handler: Box<RawHandler>,
}

impl Binding {
    pub(crate) fn new(name: CString, handler: Box<RawHandler>) -> Arc<Self> {
        Arc::new(Self { name, handler })
    }

    pub(crate) fn as_arg(self: &Arc<Self>) -> *mut c_void {
        Arc::as_ptr(self) as *mut c_void
    }
}

/// Single native entry point for every binding.
///
/// # Safety
///
/// `arg` must be null or a pointer produced by [`Binding::as_arg`] whose
/// binding is still held by its instance. `seq` and `req` must be null or
/// valid C strings for the duration of the call.
pub(crate) unsafe extern "C" fn trampoline(
    seq: *const c_char,
    req: *const c_char,
    arg: *mut c_void,
) {
    if arg.is_null() {
        return;
    }
    let ptr = arg as *const Binding;
    // SAFETY: the instance holds a strong reference while bound. Taking our
    // own keeps the binding alive if the handler unbinds itself.
    let binding = unsafe {
        Arc::increment_strong_count(ptr);
        Arc::from_raw(ptr)
    };

    // SAFETY: the native library passes valid or null C strings.
    let (seq, req) = unsafe { (cstr::decode(seq), cstr::decode(req)) };
    debug!(name = ?binding.name, seq = %seq, req_len = req.len(), "binding invoked");

    if catch_unwind(AssertUnwindSafe(|| (binding.handler)(&seq, &req))).is_err() {
        error!(name = ?binding.name, seq = %seq, "raw binding handler panicked");
    }
}
