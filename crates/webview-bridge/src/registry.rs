//! Registry of live webview instances.
//!
//! Explicit state rather than a process global: create one per loaded
//! native library, pass it to every constructor, and unload it once all
//! windows are expected to be closed.

use std::ffi::OsStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::config::{self, WebviewConfig};
use crate::errors::BridgeError;
use crate::ffi::{NativeTable, RawHandle};
use crate::runtime::Executor;
use crate::webview::Instance;

pub struct Registry {
    table: Arc<NativeTable>,
    executor: Arc<Executor>,
    instances: Mutex<Vec<Weak<Instance>>>,
    next_id: AtomicU64,
}

impl Registry {
    /// Registry whose async replies run on a private runtime, started lazily.
    pub fn new(table: NativeTable) -> Self {
        Self::with_executor(table, Executor::owned())
    }

    /// Registry whose async replies run on the caller's tokio runtime.
    pub fn with_runtime(table: NativeTable, handle: Handle) -> Self {
        Self::with_executor(table, Executor::external(handle))
    }

    fn with_executor(table: NativeTable, executor: Executor) -> Self {
        Self {
            table: Arc::new(table),
            executor: Arc::new(executor),
            instances: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Load the native library at `path` and wrap it in a registry.
    pub fn load(path: impl AsRef<OsStr>) -> Result<Self, BridgeError> {
        Ok(Self::new(NativeTable::load(path)?))
    }

    /// Load the library named by `config`, the environment, or the platform default.
    pub fn from_config(config: &WebviewConfig) -> Result<Self, BridgeError> {
        Self::load(config::resolve_library_path(config.library.as_deref()))
    }

    pub fn table(&self) -> &NativeTable {
        &self.table
    }

    /// Number of registered instances that have not been destroyed.
    pub fn len(&self) -> usize {
        self.lock()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|inst| !inst.is_destroyed())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Destroy every live instance and release the native library.
    /// Returns how many instances were still alive and got destroyed.
    pub fn unload(mut self) -> usize {
        let destroyed = self.teardown();
        info!(destroyed, "webview registry unloaded");
        destroyed
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn shared_table(&self) -> Arc<NativeTable> {
        Arc::clone(&self.table)
    }

    pub(crate) fn executor(&self) -> Arc<Executor> {
        Arc::clone(&self.executor)
    }

    /// Record a new instance. A handle may belong to one live instance
    /// only; destroyed instances have released theirs.
    pub(crate) fn register(&self, instance: &Arc<Instance>, handle: RawHandle) -> Result<(), BridgeError> {
        let mut instances = self.lock();
        instances.retain(|w| w.strong_count() > 0);
        if instances
            .iter()
            .filter_map(Weak::upgrade)
            .any(|other| other.owns(handle))
        {
            return Err(BridgeError::HandleInUse(handle.as_ptr() as usize));
        }
        instances.push(Arc::downgrade(instance));
        debug!(id = instance.id(), live = instances.len(), "webview registered");
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Weak<Instance>>> {
        self.instances.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn teardown(&mut self) -> usize {
        let drained = std::mem::take(
            self.instances
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let destroyed = drained
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|inst| inst.destroy())
            .count();
        self.executor.shutdown();
        destroyed
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("table", &self.table)
            .field("live", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fake_registry, Call, FakeWindow};
    use crate::webview::Webview;

    #[test]
    fn instances_register_on_construction() {
        let registry = fake_registry();
        assert!(registry.is_empty());

        let a = Webview::create(&registry, false, None).unwrap();
        let _b = Webview::create(&registry, false, None).unwrap();
        assert_eq!(registry.len(), 2);

        a.destroy();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn ids_are_unique() {
        let registry = fake_registry();
        let a = Webview::create(&registry, false, None).unwrap();
        let b = Webview::create(&registry, false, None).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn unload_destroys_each_instance_exactly_once() {
        let registry = fake_registry();
        let a = Webview::create(&registry, false, None).unwrap();
        let b = Webview::create(&registry, false, None).unwrap();
        let c = Webview::create(&registry, false, None).unwrap();
        let fakes: Vec<&FakeWindow> = [&a, &b, &c].iter().map(|w| FakeWindow::of(w)).collect();

        b.destroy();
        assert_eq!(registry.unload(), 2);

        for fake in fakes {
            assert_eq!(fake.count(|c| *c == Call::Destroy), 1);
            assert_eq!(fake.count(|c| *c == Call::Terminate), 1);
        }
        assert!(a.is_destroyed());
        assert!(c.is_destroyed());

        // Dropping the owners afterwards issues no further native calls.
        drop((a, b, c));
    }

    #[test]
    fn dropped_webviews_are_pruned() {
        let registry = fake_registry();
        for _ in 0..3 {
            let _w = Webview::create(&registry, false, None).unwrap();
        }
        assert!(registry.is_empty());
        let _keep = Webview::create(&registry, false, None).unwrap();
        assert_eq!(registry.lock().len(), 1);
    }

    #[test]
    fn dropping_registry_tears_down() {
        let registry = fake_registry();
        let w = Webview::create(&registry, false, None).unwrap();
        let fake = FakeWindow::of(&w);
        drop(registry);
        assert!(w.is_destroyed());
        assert_eq!(fake.count(|c| *c == Call::Destroy), 1);
    }

    #[test]
    fn handle_is_owned_by_one_live_instance() {
        let registry = fake_registry();
        let handle = FakeWindow::leak();
        let first = unsafe { Webview::adopt(&registry, handle, None) }.unwrap();

        let err = unsafe { Webview::adopt(&registry, handle, None) }.unwrap_err();
        assert!(matches!(err, BridgeError::HandleInUse(h) if h == handle as usize));
        assert_eq!(registry.len(), 1);

        drop(first);
        assert_eq!(FakeWindow::from_handle(handle).count(|c| *c == Call::Destroy), 1);
    }

    #[test]
    fn destroyed_handle_can_be_adopted_again() {
        let registry = fake_registry();
        let handle = FakeWindow::leak();
        let first = unsafe { Webview::adopt(&registry, handle, None) }.unwrap();
        first.destroy();

        let second = unsafe { Webview::adopt(&registry, handle, None) }.unwrap();
        assert_eq!(second.raw_handle(), Some(handle));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn missing_library_is_fatal() {
        let err = Registry::load("/nonexistent/libwebview.so").unwrap_err();
        assert!(matches!(err, BridgeError::LibraryLoad { .. }));
    }
}
