//! Backend registry keyed by backend kind.

use std::collections::BTreeMap;

use crate::backend::{BackendKind, TargetingBackend};

/// Registry holding at most one backend per [`BackendKind`].
///
/// Iteration follows [`BackendKind`] order, so frames run deterministically.
#[derive(Default)]
pub struct BackendRegistry {
    backends: BTreeMap<BackendKind, Box<dyn TargetingBackend>>,
}

impl BackendRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a backend under its kind.
    ///
    /// Returns `false` and drops `backend` if that kind is already registered.
    pub fn register(&mut self, backend: Box<dyn TargetingBackend>) -> bool {
        let kind = backend.kind();
        if self.backends.contains_key(&kind) {
            return false;
        }
        self.backends.insert(kind, backend);
        true
    }

    /// Removes and tears down the backend of `kind`.
    ///
    /// Returns `false` if none was registered.
    pub fn unregister(&mut self, kind: BackendKind) -> bool {
        match self.backends.remove(&kind) {
            Some(mut backend) => {
                backend.teardown();
                true
            }
            None => false,
        }
    }

    /// Checks if a backend of `kind` is registered.
    pub fn contains(&self, kind: BackendKind) -> bool {
        self.backends.contains_key(&kind)
    }

    /// Gets a backend by kind.
    pub fn get(&self, kind: BackendKind) -> Option<&dyn TargetingBackend> {
        self.backends.get(&kind).map(|b| b.as_ref())
    }

    /// Gets a mutable backend by kind.
    pub fn get_mut(&mut self, kind: BackendKind) -> Option<&mut Box<dyn TargetingBackend>> {
        self.backends.get_mut(&kind)
    }

    /// Returns the registered kinds in order.
    pub fn kinds(&self) -> impl Iterator<Item = BackendKind> + '_ {
        self.backends.keys().copied()
    }

    /// Returns a mutable iterator over all backends in kind order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn TargetingBackend>> + '_ {
        self.backends.values_mut()
    }

    /// Tears down and removes every backend.
    pub fn clear(&mut self) {
        for backend in self.backends.values_mut() {
            backend.teardown();
        }
        self.backends.clear();
    }

    /// Returns the number of registered backends.
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Returns true if no backend is registered.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl Drop for BackendRegistry {
    fn drop(&mut self) {
        self.clear();
    }
}
