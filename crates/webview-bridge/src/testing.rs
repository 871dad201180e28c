//! In-process stand-in for the native library.
//!
//! Every fake handle points at its own leaked `FakeWindow`, so tests never
//! share recorded state and can run in parallel.

use std::collections::HashMap;
use std::ffi::{c_char, c_int, c_void, CString};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::cstr;
use crate::ffi::{BindFn, NativeFns, NativeTable};
use crate::registry::Registry;
use crate::webview::Webview;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Create { debug: i32, parent: usize },
    Destroy,
    Run,
    Terminate,
    GetWindow,
    SetTitle(String),
    SetSize(i32, i32, i32),
    Navigate(String),
    SetHtml(String),
    Init(String),
    Eval(String),
    Bind(String),
    Unbind(String),
    Return { seq: String, status: i32, result: String },
}

#[derive(Default)]
pub(crate) struct FakeWindow {
    calls: Mutex<Vec<Call>>,
    changed: Condvar,
    bindings: Mutex<HashMap<String, (BindFn, usize)>>,
    /// Calls JavaScript "makes" while the loop runs: (name, seq, req).
    scripted: Mutex<Vec<(String, String, String)>>,
    pub(crate) no_window: AtomicBool,
}

impl FakeWindow {
    /// Allocate a fake handle that was not produced by `create`.
    pub(crate) fn leak() -> *mut c_void {
        Box::into_raw(Box::<FakeWindow>::default()) as *mut c_void
    }

    pub(crate) fn from_handle(ptr: *mut c_void) -> &'static FakeWindow {
        // SAFETY: fake handles are leaked boxes and never freed.
        unsafe { &*(ptr as *const FakeWindow) }
    }

    pub(crate) fn of(webview: &Webview) -> &'static FakeWindow {
        Self::from_handle(webview.raw_handle().expect("webview is live"))
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
        self.changed.notify_all();
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub(crate) fn returns(&self) -> Vec<(String, i32, String)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                Call::Return {
                    seq,
                    status,
                    result,
                } => Some((seq.clone(), *status, result.clone())),
                _ => None,
            })
            .collect()
    }

    /// Block until at least `n` replies were recorded or `timeout` passes.
    pub(crate) fn wait_for_returns(&self, n: usize, timeout: Duration) -> Vec<(String, i32, String)> {
        let calls = self.calls.lock().unwrap();
        let (calls, _timed_out) = self
            .changed
            .wait_timeout_while(calls, timeout, |calls| {
                calls
                    .iter()
                    .filter(|c| matches!(c, Call::Return { .. }))
                    .count()
                    < n
            })
            .unwrap();
        drop(calls);
        self.returns()
    }

    pub(crate) fn is_bound(&self, name: &str) -> bool {
        self.bindings.lock().unwrap().contains_key(name)
    }

    /// Simulate JavaScript calling a bound function. Returns false if the
    /// name is not bound on the native side.
    pub(crate) fn invoke(&self, name: &str, seq: &str, req: &str) -> bool {
        let entry = self.bindings.lock().unwrap().get(name).copied();
        let Some((f, arg)) = entry else {
            return false;
        };
        let seq = CString::new(seq).unwrap();
        let req = CString::new(req).unwrap();
        unsafe { f(seq.as_ptr(), req.as_ptr(), arg as *mut c_void) };
        true
    }

    /// Queue a JavaScript call to be delivered from inside `run`.
    pub(crate) fn script(&self, name: &str, seq: &str, req: &str) {
        self.scripted
            .lock()
            .unwrap()
            .push((name.into(), seq.into(), req.into()));
    }
}

fn fake(w: *mut c_void) -> &'static FakeWindow {
    FakeWindow::from_handle(w)
}

fn text(ptr: *const c_char) -> String {
    unsafe { cstr::decode(ptr) }
}

unsafe extern "C" fn fake_create(debug: c_int, window: *mut c_void) -> *mut c_void {
    let ptr = FakeWindow::leak();
    fake(ptr).record(Call::Create {
        debug,
        parent: window as usize,
    });
    ptr
}

pub(crate) unsafe extern "C" fn null_create(_debug: c_int, _window: *mut c_void) -> *mut c_void {
    std::ptr::null_mut()
}

unsafe extern "C" fn fake_destroy(w: *mut c_void) {
    fake(w).record(Call::Destroy);
}

unsafe extern "C" fn fake_run(w: *mut c_void) {
    let window = fake(w);
    window.record(Call::Run);
    let scripted = std::mem::take(&mut *window.scripted.lock().unwrap());
    for (name, seq, req) in scripted {
        window.invoke(&name, &seq, &req);
    }
}

unsafe extern "C" fn fake_terminate(w: *mut c_void) {
    fake(w).record(Call::Terminate);
}

unsafe extern "C" fn fake_get_window(w: *mut c_void) -> *mut c_void {
    let window = fake(w);
    window.record(Call::GetWindow);
    if window.no_window.load(Ordering::SeqCst) {
        std::ptr::null_mut()
    } else {
        w
    }
}

unsafe extern "C" fn fake_set_title(w: *mut c_void, title: *const c_char) {
    fake(w).record(Call::SetTitle(text(title)));
}

unsafe extern "C" fn fake_set_size(w: *mut c_void, width: c_int, height: c_int, hint: c_int) {
    fake(w).record(Call::SetSize(width, height, hint));
}

unsafe extern "C" fn fake_navigate(w: *mut c_void, url: *const c_char) {
    fake(w).record(Call::Navigate(text(url)));
}

unsafe extern "C" fn fake_set_html(w: *mut c_void, html: *const c_char) {
    fake(w).record(Call::SetHtml(text(html)));
}

unsafe extern "C" fn fake_init(w: *mut c_void, js: *const c_char) {
    fake(w).record(Call::Init(text(js)));
}

unsafe extern "C" fn fake_eval(w: *mut c_void, js: *const c_char) {
    fake(w).record(Call::Eval(text(js)));
}

unsafe extern "C" fn fake_bind(w: *mut c_void, name: *const c_char, f: BindFn, arg: *mut c_void) {
    let window = fake(w);
    let name = text(name);
    window
        .bindings
        .lock()
        .unwrap()
        .insert(name.clone(), (f, arg as usize));
    window.record(Call::Bind(name));
}

unsafe extern "C" fn fake_unbind(w: *mut c_void, name: *const c_char) {
    let window = fake(w);
    let name = text(name);
    window.bindings.lock().unwrap().remove(&name);
    window.record(Call::Unbind(name));
}

unsafe extern "C" fn fake_return(
    w: *mut c_void,
    seq: *const c_char,
    status: c_int,
    result: *const c_char,
) {
    fake(w).record(Call::Return {
        seq: text(seq),
        status,
        result: text(result),
    });
}

pub(crate) fn fake_fns() -> NativeFns {
    NativeFns {
        create: fake_create,
        destroy: fake_destroy,
        run: fake_run,
        terminate: fake_terminate,
        get_window: fake_get_window,
        set_title: fake_set_title,
        set_size: fake_set_size,
        navigate: fake_navigate,
        set_html: fake_set_html,
        init: fake_init,
        eval: fake_eval,
        bind: fake_bind,
        unbind: fake_unbind,
        return_: fake_return,
    }
}

pub(crate) fn fake_registry() -> Registry {
    Registry::new(NativeTable::from_fns(fake_fns()))
}

pub(crate) fn fake_registry_on(handle: tokio::runtime::Handle) -> Registry {
    Registry::with_runtime(NativeTable::from_fns(fake_fns()), handle)
}
