use crate::config::Size;
use crate::errors::BridgeError;

use super::Webview;

impl Webview {
    pub fn set_title(&self, title: &str) -> Result<(), BridgeError> {
        // SAFETY: handle is live under the lock; title outlives the call.
        self.inner
            .call_str("title", title, |fns, w, title| unsafe { (fns.set_title)(w, title) })
    }

    pub fn set_size(&self, size: Size) -> Result<(), BridgeError> {
        // SAFETY: handle is live under the lock.
        self.inner.call(|fns, w| unsafe {
            (fns.set_size)(w, size.width, size.height, size.hint.as_raw())
        })
    }

    /// Navigate to a URL. `data:` URIs are accepted by the native library.
    pub fn navigate(&self, url: &str) -> Result<(), BridgeError> {
        // SAFETY: handle is live under the lock; url outlives the call.
        self.inner
            .call_str("url", url, |fns, w, url| unsafe { (fns.navigate)(w, url) })
    }

    /// Replace the page with raw HTML.
    pub fn set_html(&self, html: &str) -> Result<(), BridgeError> {
        // SAFETY: handle is live under the lock; html outlives the call.
        self.inner
            .call_str("html", html, |fns, w, html| unsafe { (fns.set_html)(w, html) })
    }

    /// Inject JavaScript that runs before every page load, ahead of
    /// `window.onload`.
    pub fn init(&self, js: &str) -> Result<(), BridgeError> {
        // SAFETY: handle is live under the lock; js outlives the call.
        self.inner
            .call_str("script", js, |fns, w, js| unsafe { (fns.init)(w, js) })
    }

    /// Evaluate JavaScript against the current page state.
    pub fn eval(&self, js: &str) -> Result<(), BridgeError> {
        self.inner.eval(js)
    }
}
