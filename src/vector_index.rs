//! Vector-Index Adapter: a narrow capability contract in front of an
//! external approximate-nearest-neighbor collaborator. This crate never
//! reimplements HNSW; it adapts the `hnsw_rs` crate to the contract the
//! retrieval engine needs.
//!
//! `hnsw_rs` has no native point deletion and never reuses a graph node once
//! built — inserting a second point under an already-present external id
//! does not replace the first, it leaves both live in the graph. A boolean
//! tombstone cannot paper over this: the moment a freed slot is reused for a
//! new vector, the stale node from the old occupant is still reachable and
//! indistinguishable from the new one. So `mark_delete` does not tombstone;
//! it rebuilds the graph from the surviving points immediately, the same
//! rebuild-and-swap pattern `compact` uses at the namespace level. By the
//! time a freed slot is handed to `add_point` again, the old node under
//! that slot is already gone from the graph.
//!
//! Persistence deliberately does not lean on `hnsw_rs`'s own `HnswIo`
//! self-referential loader (`Hnsw<'a>` borrowing from `&'a mut HnswIo`),
//! which requires managing drop order with `ManuallyDrop` and a raw pointer.
//! Since the namespace's own metadata snapshot already carries every live
//! vector, the adapter instead persists its own compact `(slot, vector)`
//! list and rebuilds the graph with `parallel_insert_data` on load, which
//! keeps every operation after load fully mutable and avoids unsafe
//! lifetime plumbing. See `DESIGN.md`.

use crate::error::{RetrievalError, Result};
use crate::types::Slot;
use hnsw_rs::anndists::dist::distances::DistCosine;
use hnsw_rs::hnsw::Hnsw;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Tuning constants, chosen for small-to-medium embedded corpora (sub-1M
// points). See the HNSW paper and `hnsw_rs` documentation for the tradeoffs;
// higher values cost more memory and build time for better recall.
const MAX_NB_CONNECTION: usize = 16;
const MAX_LAYER: usize = 16;
const EF_CONSTRUCTION: usize = 200;
const EF_SEARCH: usize = 96;

/// A single nearest-neighbor hit: the stored slot and its cosine distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub slot: Slot,
    pub distance: f32,
}

/// Vector-Index Adapter contract.
pub trait VectorIndex: Send + Sync {
    fn add_point(&mut self, vector: &[f32], slot: Slot) -> Result<()>;
    fn mark_delete(&mut self, slot: Slot);
    fn search_knn(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;
    fn write_index(&self, path: &Path) -> Result<()>;
    fn read_index(&mut self, path: &Path) -> Result<()>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedPoints {
    dim: usize,
    points: Vec<(Slot, Vec<f32>)>,
}

/// `hnsw_rs`-backed cosine vector index, adapted to the [`VectorIndex`]
/// contract.
pub struct HnswVectorIndex {
    dim: usize,
    max_elements: usize,
    hnsw: Hnsw<'static, f32, DistCosine>,
    points: Vec<(Slot, Vec<f32>)>,
}

impl HnswVectorIndex {
    pub fn new(dim: usize, max_elements: usize) -> Self {
        let hnsw = Hnsw::new(
            MAX_NB_CONNECTION,
            max_elements.max(1),
            MAX_LAYER,
            EF_CONSTRUCTION,
            DistCosine {},
        );
        HnswVectorIndex {
            dim,
            max_elements,
            hnsw,
            points: Vec::new(),
        }
    }

    fn rebuild(&mut self, points: Vec<(Slot, Vec<f32>)>) {
        let hnsw = Hnsw::new(
            MAX_NB_CONNECTION,
            self.max_elements.max(points.len()).max(1),
            MAX_LAYER,
            EF_CONSTRUCTION,
            DistCosine {},
        );
        if !points.is_empty() {
            let data: Vec<(&Vec<f32>, usize)> =
                points.iter().map(|(slot, v)| (v, *slot)).collect();
            hnsw.parallel_insert_data(&data);
        }
        self.hnsw = hnsw;
        self.points = points;
    }
}

impl VectorIndex for HnswVectorIndex {
    fn add_point(&mut self, vector: &[f32], slot: Slot) -> Result<()> {
        if vector.len() != self.dim {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        let owned = vector.to_vec();
        self.hnsw.insert((&owned, slot));
        self.points.push((slot, owned));
        Ok(())
    }

    /// Removes `slot` from the live point set and rebuilds the graph from
    /// what remains. `hnsw_rs` cannot delete a node in place, so anything
    /// short of a rebuild would leave a stale node reachable under `slot`
    /// once that slot id is handed to `add_point` again.
    fn mark_delete(&mut self, slot: Slot) {
        if let Some(pos) = self.points.iter().position(|(s, _)| *s == slot) {
            self.points.remove(pos);
            let points = std::mem::take(&mut self.points);
            self.rebuild(points);
        }
    }

    fn search_knn(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if k == 0 || self.points.is_empty() {
            return Ok(Vec::new());
        }
        let k = k.min(self.points.len());
        let raw = self.hnsw.search(query, k, EF_SEARCH);
        Ok(raw
            .into_iter()
            .map(|neighbor| Neighbor {
                slot: neighbor.d_id,
                distance: neighbor.distance,
            })
            .collect())
    }

    fn write_index(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let payload = PersistedPoints {
            dim: self.dim,
            points: self.points.clone(),
        };
        let bytes = bincode::serialize(&payload)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn read_index(&mut self, path: &Path) -> Result<()> {
        let bytes = std::fs::read(path)?;
        let payload: PersistedPoints = bincode::deserialize(&bytes)?;
        if payload.dim != self.dim {
            return Err(RetrievalError::LoadCorrupt(format!(
                "vector index dim mismatch: namespace expects {}, blob has {}",
                self.dim, payload.dim
            )));
        }
        self.rebuild(payload.points);
        Ok(())
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}
