//! Engine and namespace configuration types.

use serde::{Deserialize, Serialize};

/// Configuration every namespace in a registry is lazily created with.
///
/// `dim` and `max_elements` are immutable for the lifetime of a namespace:
/// every vector inserted or updated must have exactly `dim` components, and
/// `next_slot` may never exceed `max_elements` while the free list is empty.
/// This is derived from [`EngineConfig`] at registry construction time, not
/// supplied per namespace — every namespace in one engine shares the same
/// `dim`/`max_elements`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceConfig {
    pub dim: usize,
    pub max_elements: usize,
}

/// Configuration supplied once, at engine construction.
///
/// `dim` and `max_elements` apply to every namespace the registry lazily
/// creates — there is no per-namespace override and no separate namespace
/// creation step. `auto_compaction` and `compaction_interval_ms` govern the
/// optional background compaction timer, likewise shared across every
/// namespace. BM25 parameters are configured separately via [`Bm25Params`]
/// because they can be changed at any time without restarting the engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Vector dimension every namespace in this engine requires.
    pub dim: usize,
    /// Maximum live elements per namespace before capacity is exhausted.
    pub max_elements: usize,
    /// Run compaction across all namespaces on a timer.
    pub auto_compaction: bool,
    /// Interval between compaction sweeps, in milliseconds. Only consulted
    /// when `auto_compaction` is true.
    pub compaction_interval_ms: u64,
}

impl EngineConfig {
    pub fn new(dim: usize, max_elements: usize) -> Self {
        EngineConfig {
            dim,
            max_elements,
            auto_compaction: false,
            compaction_interval_ms: 3_600_000,
        }
    }

    pub(crate) fn namespace_config(&self) -> NamespaceConfig {
        NamespaceConfig {
            dim: self.dim,
            max_elements: self.max_elements,
        }
    }
}

/// BM25 tuning parameters, shared process-wide across all namespaces.
///
/// Mutating this is lock-free (a single atomic-ish swap behind the registry's
/// own synchronization) and intended to be done rarely, typically at
/// startup. See `WEIGHT_SUM_EPSILON` for the unrelated tolerance used on
/// floating-point weight sums elsewhere in hybrid search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Bm25Params { k1: 1.5, b: 0.75 }
    }
}

/// Tolerance used when validating that `vector_weight + text_weight == 1.0`
/// in weighted hybrid search, since callers doing float arithmetic to reach
/// the weights may land a few ULPs off exact.
pub const WEIGHT_SUM_EPSILON: f32 = 1e-4;

/// Diversity weight used by MMR reranking.
pub const MMR_LAMBDA: f32 = 0.7;

/// Default RRF smoothing constant.
pub const DEFAULT_RRF_K: u32 = 60;

/// Default result count when a caller does not specify `k`.
pub const DEFAULT_K: usize = 5;
