//! Namespace Store: per-namespace state behind a single reader/writer lock,
//! plus the mutation, retrieval, and persistence operations defined as
//! inherent methods on [`store::NamespaceInner`].

pub mod mutate;
pub mod persistence;
pub mod search;
pub mod store;

pub use mutate::BatchEntry;
pub use search::WeightedHybridOptions;
pub use store::NamespaceInner;

use parking_lot::RwLock;

/// A namespace: its immutable configuration plus the lock-guarded state.
///
/// `parking_lot::RwLock` is writer-preferring and allocation-free, and is
/// the lock primitive used throughout this crate for every hot structure:
/// any number of concurrent readers, exactly one writer at a time, and no
/// cross-namespace lock is ever held while this one is.
pub struct Namespace {
    pub dim: usize,
    pub max_elements: usize,
    inner: RwLock<NamespaceInner>,
}

impl Namespace {
    pub fn new(config: crate::config::NamespaceConfig) -> Self {
        Namespace {
            dim: config.dim,
            max_elements: config.max_elements,
            inner: RwLock::new(NamespaceInner::new(config)),
        }
    }

    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, NamespaceInner> {
        self.inner.read()
    }

    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, NamespaceInner> {
        self.inner.write()
    }
}
