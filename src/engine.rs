//! Public engine surface: the operations exposed by the core.

use crate::config::{Bm25Params, EngineConfig, DEFAULT_K, DEFAULT_RRF_K};
use crate::error::Result;
use crate::namespace::{BatchEntry, WeightedHybridOptions};
use crate::registry::Registry;
use crate::types::{HybridResult, Metadata, MetadataFilter, NamespaceStats, SearchResult};
use std::path::Path;
use std::sync::Arc;

/// Options for [`Engine::hybrid_search`].
pub struct HybridSearchOptions {
    pub vector_weight: f32,
    pub text_weight: f32,
    pub k: usize,
    pub filter: MetadataFilter,
    pub rerank: bool,
}

impl Default for HybridSearchOptions {
    fn default() -> Self {
        HybridSearchOptions {
            vector_weight: 0.5,
            text_weight: 0.5,
            k: DEFAULT_K,
            filter: MetadataFilter::new(),
            rerank: false,
        }
    }
}

/// Options for [`Engine::hybrid_search_rrf`].
pub struct RrfSearchOptions {
    pub k: usize,
    pub rrf_k: u32,
    pub filter: MetadataFilter,
}

impl Default for RrfSearchOptions {
    fn default() -> Self {
        RrfSearchOptions {
            k: DEFAULT_K,
            rrf_k: DEFAULT_RRF_K,
            filter: MetadataFilter::new(),
        }
    }
}

/// Embedded, in-process, multi-namespace hybrid retrieval engine.
///
/// Construction never touches disk; namespaces share the `dim`/`max_elements`
/// fixed at [`Engine::new`] and are created lazily, on first reference by
/// any operation below. Namespaces are persisted individually via
/// [`Engine::save`]/[`Engine::load`].
pub struct Engine {
    registry: Arc<Registry>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            registry: Registry::new(config),
        }
    }

    pub fn namespace_exists(&self, name: &str) -> bool {
        self.registry.namespace_exists(name)
    }

    pub fn list_namespaces(&self) -> Vec<String> {
        self.registry.list_namespaces()
    }

    pub fn namespace_stats(&self, name: &str) -> NamespaceStats {
        let ns = self.registry.namespace(name);
        let guard = ns.read();
        NamespaceStats {
            live_docs: guard.live_count(),
            capacity: guard.max_elements,
            dim: guard.dim,
            unique_terms: guard.inverted.unique_terms(),
            free_slots: guard.free_list.len(),
        }
    }

    pub fn set_bm25_params(&self, params: Bm25Params) {
        self.registry.set_bm25_params(params);
    }

    pub fn set_indexed_fields(&self, namespace: &str, fields: Vec<String>) {
        let ns = self.registry.namespace(namespace);
        ns.write().set_indexed_fields(fields);
    }

    pub fn insert(
        &self,
        namespace: &str,
        id: String,
        vector: Vec<f32>,
        metadata: Option<Metadata>,
    ) -> Result<()> {
        let ns = self.registry.namespace(namespace);
        let result = ns
            .write()
            .insert(id.clone(), vector, metadata.unwrap_or_default());
        tracing::debug!(namespace, id, ok = result.is_ok(), "insert");
        result
    }

    pub fn batch_insert(
        &self,
        namespace: &str,
        entries: Vec<BatchEntry>,
    ) -> Result<()> {
        let ns = self.registry.namespace(namespace);
        let count = entries.len();
        let result = ns.write().batch_insert(entries);
        tracing::debug!(namespace, count, ok = result.is_ok(), "batch_insert");
        result
    }

    pub fn update(
        &self,
        namespace: &str,
        id: &str,
        new_vector: Vec<f32>,
        new_metadata: Option<Metadata>,
    ) -> Result<()> {
        let ns = self.registry.namespace(namespace);
        let result = ns.write().update(id, new_vector, new_metadata);
        tracing::debug!(namespace, id, ok = result.is_ok(), "update");
        result
    }

    pub fn delete(&self, namespace: &str, id: &str) {
        let ns = self.registry.namespace(namespace);
        ns.write().delete(id);
        tracing::debug!(namespace, id, "delete");
    }

    pub fn search(
        &self,
        namespace: &str,
        query: &[f32],
        k: Option<usize>,
        filter: Option<MetadataFilter>,
    ) -> Result<Vec<SearchResult>> {
        let ns = self.registry.namespace(namespace);
        let guard = ns.read();
        guard.search(
            query,
            k.unwrap_or(DEFAULT_K),
            &filter.unwrap_or_default(),
        )
    }

    pub fn full_text_search(
        &self,
        namespace: &str,
        query_text: &str,
        k: Option<usize>,
        filter: Option<MetadataFilter>,
    ) -> Result<Vec<SearchResult>> {
        let ns = self.registry.namespace(namespace);
        let guard = ns.read();
        Ok(guard.full_text_search(
            query_text,
            k.unwrap_or(DEFAULT_K),
            &filter.unwrap_or_default(),
            self.registry.bm25_params(),
        ))
    }

    pub fn hybrid_search(
        &self,
        namespace: &str,
        query_vec: &[f32],
        query_text: &str,
        opts: HybridSearchOptions,
    ) -> Result<Vec<HybridResult>> {
        let ns = self.registry.namespace(namespace);
        let guard = ns.read();
        guard.hybrid_search(
            query_vec,
            query_text,
            WeightedHybridOptions {
                vector_weight: opts.vector_weight,
                text_weight: opts.text_weight,
                k: opts.k,
                filter: &opts.filter,
                rerank: opts.rerank,
            },
            self.registry.bm25_params(),
        )
    }

    pub fn hybrid_search_rrf(
        &self,
        namespace: &str,
        query_vec: &[f32],
        query_text: &str,
        opts: RrfSearchOptions,
    ) -> Result<Vec<HybridResult>> {
        let ns = self.registry.namespace(namespace);
        let guard = ns.read();
        guard.hybrid_search_rrf(
            query_vec,
            query_text,
            opts.k,
            opts.rrf_k,
            &opts.filter,
            self.registry.bm25_params(),
        )
    }

    pub fn save(&self, namespace: &str, file_base: &Path) -> Result<()> {
        let ns = self.registry.namespace(namespace);
        let guard = ns.write();
        guard.save(file_base)?;
        tracing::info!(namespace, path = %file_base.display(), "snapshot saved");
        Ok(())
    }

    pub fn load(&self, namespace: &str, file_base: &Path) -> Result<()> {
        let ns = self.registry.namespace(namespace);
        let mut guard = ns.write();
        guard.load(file_base)?;
        tracing::info!(namespace, path = %file_base.display(), "snapshot loaded");
        Ok(())
    }

    pub fn compact(&self, namespace: &str) {
        let ns = self.registry.namespace(namespace);
        ns.write().compact();
    }

    /// Cancels the compaction timer, if one is running.
    pub fn destroy(&self) {
        self.registry.destroy();
    }
}
