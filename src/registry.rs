//! Registry: process-lifetime mapping of namespace name to [`Namespace`],
//! lazy creation, and the optional background compaction timer.

use crate::config::{Bm25Params, EngineConfig, NamespaceConfig};
use crate::namespace::Namespace;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

pub struct Registry {
    namespaces: DashMap<String, Arc<Namespace>>,
    namespace_config: NamespaceConfig,
    bm25: RwLock<Bm25Params>,
    shutdown: Arc<AtomicBool>,
    compaction_thread: RwLock<Option<thread::JoinHandle<()>>>,
}

impl Registry {
    pub fn new(config: EngineConfig) -> Arc<Self> {
        let registry = Arc::new(Registry {
            namespaces: DashMap::new(),
            namespace_config: config.namespace_config(),
            bm25: RwLock::new(Bm25Params::default()),
            shutdown: Arc::new(AtomicBool::new(false)),
            compaction_thread: RwLock::new(None),
        });

        if config.auto_compaction {
            registry.start_compaction_timer(Duration::from_millis(config.compaction_interval_ms));
        }

        registry
    }

    pub fn bm25_params(&self) -> Bm25Params {
        *self.bm25.read()
    }

    pub fn set_bm25_params(&self, params: Bm25Params) {
        *self.bm25.write() = params;
    }

    /// Returns the namespace named `name`, creating it on first reference
    /// with the engine-wide `dim`/`max_elements` if it doesn't exist yet.
    pub fn namespace(&self, name: &str) -> Arc<Namespace> {
        let namespace_config = self.namespace_config;
        Arc::clone(
            self.namespaces
                .entry(name.to_string())
                .or_insert_with(|| {
                    tracing::info!(
                        namespace = name,
                        dim = namespace_config.dim,
                        max_elements = namespace_config.max_elements,
                        "namespace created"
                    );
                    Arc::new(Namespace::new(namespace_config))
                })
                .value(),
        )
    }

    pub fn namespace_exists(&self, name: &str) -> bool {
        self.namespaces.contains_key(name)
    }

    pub fn list_namespaces(&self) -> Vec<String> {
        self.namespaces.iter().map(|e| e.key().clone()).collect()
    }

    /// Runs compaction across every namespace once. The timer calls this on
    /// an interval; callers may also invoke it directly.
    pub fn compact_all(&self) {
        for entry in self.namespaces.iter() {
            let name = entry.key().clone();
            entry.value().write().compact();
            tracing::info!(namespace = %name, "compaction run");
        }
    }

    /// Spawns a background thread holding only `Weak` references, so it
    /// never keeps the host process alive and exits silently once the
    /// registry is dropped — the same pattern an LSM storage engine uses
    /// for its background compaction/flush threads.
    fn start_compaction_timer(self: &Arc<Self>, interval: Duration) {
        let registry_weak = Arc::downgrade(self);
        let shutdown_weak = Arc::downgrade(&self.shutdown);

        let handle = thread::spawn(move || loop {
            let shutdown = match shutdown_weak.upgrade() {
                Some(s) => s,
                None => break,
            };
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            thread::sleep(interval);
            let registry = match registry_weak.upgrade() {
                Some(r) => r,
                None => break,
            };
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            registry.compact_all();
        });

        *self.compaction_thread.write() = Some(handle);
    }

    /// Cancels the compaction timer. Safe to call even if no timer is
    /// running.
    pub fn destroy(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.compaction_thread.write().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}
