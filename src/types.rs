//! Shared data types: document entries and result shapes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable integer handle for a document within a namespace.
pub type Slot = usize;

/// Arbitrary JSON-serializable document metadata.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A single stored document: public id, vector, and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub public_id: String,
    pub vector: Vec<f32>,
    pub metadata: Metadata,
}

/// An exact-match metadata filter: every `key == value` pair must hold.
pub type MetadataFilter = HashMap<String, serde_json::Value>;

pub(crate) fn matches_filter(metadata: &Metadata, filter: &MetadataFilter) -> bool {
    filter
        .iter()
        .all(|(k, v)| metadata.get(k).map(|mv| mv == v).unwrap_or(false))
}

/// Result of a pure vector or pure BM25 search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub id: String,
    pub similarity: f32,
    pub metadata: Metadata,
}

/// Result of weighted or RRF hybrid search: a [`SearchResult`] plus the
/// per-signal score breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HybridResult {
    pub id: String,
    pub similarity: f32,
    pub metadata: Metadata,
    pub vector_score: f32,
    pub text_score: f32,
    pub combined_score: f32,
}

/// Introspection snapshot returned by `Engine::namespace_stats`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NamespaceStats {
    pub live_docs: usize,
    pub capacity: usize,
    pub dim: usize,
    pub unique_terms: usize,
    pub free_slots: usize,
}
