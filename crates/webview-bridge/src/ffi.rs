//! Native function table.
//!
//! The native library is bound exactly once; every other module reaches the
//! library through [`NativeTable`]. The signatures below are the C ABI of
//! the `webview` library and must not drift.

use std::ffi::{c_char, c_int, c_void, OsStr};
use std::fmt;
use std::path::PathBuf;
use std::ptr::NonNull;

use libloading::Library;
use tracing::info;

use crate::errors::BridgeError;

/// Native-invocable callback registered through `webview_bind`:
/// `(seq, req, arg)`.
pub type BindFn = unsafe extern "C" fn(seq: *const c_char, req: *const c_char, arg: *mut c_void);

/// The full set of native entry points.
#[derive(Clone, Copy)]
pub struct NativeFns {
    pub create: unsafe extern "C" fn(debug: c_int, window: *mut c_void) -> *mut c_void,
    pub destroy: unsafe extern "C" fn(w: *mut c_void),
    pub run: unsafe extern "C" fn(w: *mut c_void),
    pub terminate: unsafe extern "C" fn(w: *mut c_void),
    pub get_window: unsafe extern "C" fn(w: *mut c_void) -> *mut c_void,
    pub set_title: unsafe extern "C" fn(w: *mut c_void, title: *const c_char),
    pub set_size: unsafe extern "C" fn(w: *mut c_void, width: c_int, height: c_int, hint: c_int),
    pub navigate: unsafe extern "C" fn(w: *mut c_void, url: *const c_char),
    pub set_html: unsafe extern "C" fn(w: *mut c_void, html: *const c_char),
    pub init: unsafe extern "C" fn(w: *mut c_void, js: *const c_char),
    pub eval: unsafe extern "C" fn(w: *mut c_void, js: *const c_char),
    pub bind: unsafe extern "C" fn(w: *mut c_void, name: *const c_char, f: BindFn, arg: *mut c_void),
    pub unbind: unsafe extern "C" fn(w: *mut c_void, name: *const c_char),
    pub return_: unsafe extern "C" fn(
        w: *mut c_void,
        seq: *const c_char,
        status: c_int,
        result: *const c_char,
    ),
}

impl fmt::Debug for NativeFns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFns").finish_non_exhaustive()
    }
}

/// Function table plus the library that backs it.
///
/// Dropping the table closes the library, so it is shared behind an `Arc`
/// and outlives every instance created from it.
pub struct NativeTable {
    fns: NativeFns,
    source: Option<PathBuf>,
    _lib: Option<Library>,
}

impl NativeTable {
    /// Open the native library at `path` and resolve every entry point.
    ///
    /// Any failure here is fatal for the process: no instance can be
    /// created without a complete table.
    pub fn load(path: impl AsRef<OsStr>) -> Result<Self, BridgeError> {
        let path = PathBuf::from(path.as_ref());

        // SAFETY: loading runs the library's initializers; the webview
        // library has no load-time requirements beyond being a valid dylib.
        let lib = unsafe { Library::new(&path) }.map_err(|e| BridgeError::LibraryLoad {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        // SAFETY: each symbol is declared with the signature from webview.h.
        let fns = unsafe {
            NativeFns {
                create: symbol(&lib, "webview_create")?,
                destroy: symbol(&lib, "webview_destroy")?,
                run: symbol(&lib, "webview_run")?,
                terminate: symbol(&lib, "webview_terminate")?,
                get_window: symbol(&lib, "webview_get_window")?,
                set_title: symbol(&lib, "webview_set_title")?,
                set_size: symbol(&lib, "webview_set_size")?,
                navigate: symbol(&lib, "webview_navigate")?,
                set_html: symbol(&lib, "webview_set_html")?,
                init: symbol(&lib, "webview_init")?,
                eval: symbol(&lib, "webview_eval")?,
                bind: symbol(&lib, "webview_bind")?,
                unbind: symbol(&lib, "webview_unbind")?,
                return_: symbol(&lib, "webview_return")?,
            }
        };

        info!(path = %path.display(), "native webview library loaded");

        Ok(Self {
            fns,
            source: Some(path),
            _lib: Some(lib),
        })
    }

    /// Build a table from functions that are already linked into the process.
    pub fn from_fns(fns: NativeFns) -> Self {
        Self {
            fns,
            source: None,
            _lib: None,
        }
    }

    pub fn fns(&self) -> &NativeFns {
        &self.fns
    }

    /// Path of the library backing this table, if it was loaded dynamically.
    pub fn source(&self) -> Option<&std::path::Path> {
        self.source.as_deref()
    }
}

impl fmt::Debug for NativeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeTable")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// # Safety
///
/// `T` must be the exact function pointer type of the exported symbol.
unsafe fn symbol<T: Copy>(lib: &Library, name: &'static str) -> Result<T, BridgeError> {
    // SAFETY: forwarded to the caller.
    let sym = unsafe { lib.get::<T>(name.as_bytes()) }.map_err(|e| BridgeError::MissingSymbol {
        name,
        reason: e.to_string(),
    })?;
    Ok(*sym)
}

/// Non-null native webview handle.
///
/// Only ever stored inside an instance's `Option`, which is cleared on
/// destroy, so a dangling handle is never reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawHandle(NonNull<c_void>);

// SAFETY: the handle is an opaque token and moving it between threads does
// not touch native state. Calls through it are serialized by the owning
// instance's lock, except `run`. Serialization is not thread affinity: the
// native library accepts only `return` and `terminate` off the UI thread,
// and the public methods that can reach other threads document that.
unsafe impl Send for RawHandle {}
unsafe impl Sync for RawHandle {}

impl RawHandle {
    pub(crate) fn new(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub(crate) fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}
