//! hybridstore
//!
//! Embedded, in-process, multi-namespace hybrid retrieval engine: dense
//! vector k-NN, BM25 keyword search, and two flavors of fusion (weighted
//! linear, reciprocal rank), with optional MMR diversity reranking,
//! incremental mutation, durable per-namespace snapshots, and safe
//! concurrent access.
//!
//! ## Architecture
//! - Data model: slot arena + public-id bimap per namespace (`namespace`)
//! - Text: deterministic tokenizer (`tokenizer`) + in-memory inverted index
//!   and BM25 statistics (`inverted_index`)
//! - Vectors: an external collaborator behind a narrow adapter trait
//!   (`vector_index`), backed by `hnsw_rs`
//! - Concurrency: one `parking_lot::RwLock` per namespace, never nested
//!   across namespaces (`namespace::Namespace`)
//! - Lifecycle: lazy per-namespace creation plus an optional background
//!   compaction timer (`registry`)

pub mod config;
pub mod distance;
pub mod engine;
pub mod error;
pub mod inverted_index;
pub mod namespace;
pub mod registry;
pub mod tokenizer;
pub mod types;
pub mod vector_index;

pub use config::{Bm25Params, EngineConfig};
pub use engine::{Engine, HybridSearchOptions, RrfSearchOptions};
pub use error::{RetrievalError, Result};
pub use namespace::BatchEntry;
pub use types::{HybridResult, Metadata, MetadataFilter, NamespaceStats, SearchResult};
