//! Mutation Engine: insert, batch insert, update, delete, and indexed-field
//! configuration. Every method here assumes the caller already holds the
//! namespace's write lock.

use crate::error::{RetrievalError, Result};
use crate::namespace::store::NamespaceInner;
use crate::types::{DocumentEntry, Metadata};

/// One entry of a batch insert request.
pub struct BatchEntry {
    pub public_id: String,
    pub vector: Vec<f32>,
    pub metadata: Metadata,
}

impl NamespaceInner {
    pub fn insert(
        &mut self,
        public_id: String,
        vector: Vec<f32>,
        metadata: Metadata,
    ) -> Result<()> {
        if vector.len() != self.dim {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        if self.id_to_slot.contains_key(&public_id) {
            return Err(RetrievalError::DuplicateId(public_id));
        }
        let slot = self.allocate_slot().ok_or(RetrievalError::CapacityExhausted {
            max_elements: self.max_elements,
        })?;

        self.vector_index.add_point(&vector, slot)?;
        self.inverted.index(slot, &self.indexed_fields, &metadata);
        self.id_to_slot.insert(public_id.clone(), slot);
        self.place_entry(
            slot,
            DocumentEntry {
                public_id,
                vector,
                metadata,
            },
        );
        Ok(())
    }

    /// First pass validates id uniqueness (against live ids and within the
    /// batch) with no state change on failure. Second pass inserts each
    /// entry; a dimension failure partway through leaves earlier entries in
    /// the batch committed. This partial-apply behavior on a late dimension
    /// mismatch is intentional, not an oversight: documented here rather
    /// than pre-validated away.
    pub fn batch_insert(&mut self, entries: Vec<BatchEntry>) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for e in &entries {
            if self.id_to_slot.contains_key(&e.public_id) || !seen.insert(e.public_id.clone()) {
                return Err(RetrievalError::DuplicateId(e.public_id.clone()));
            }
        }
        for e in entries {
            self.insert(e.public_id, e.vector, e.metadata)?;
        }
        Ok(())
    }

    /// Marks the slot deleted in the vector index, then re-adds it with
    /// `new_vector` at the same slot id, and always re-runs `Index` on the
    /// effective metadata — even when only the vector changed — so behavior
    /// stays uniform.
    pub fn update(
        &mut self,
        public_id: &str,
        new_vector: Vec<f32>,
        new_metadata: Option<Metadata>,
    ) -> Result<()> {
        if new_vector.len() != self.dim {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dim,
                actual: new_vector.len(),
            });
        }
        let slot = *self
            .id_to_slot
            .get(public_id)
            .ok_or_else(|| RetrievalError::NotFound(public_id.to_string()))?;

        self.vector_index.mark_delete(slot);
        self.vector_index.add_point(&new_vector, slot)?;

        let metadata = match new_metadata {
            Some(m) => m,
            None => self
                .entry(slot)
                .map(|e| e.metadata.clone())
                .unwrap_or_default(),
        };
        self.inverted.index(slot, &self.indexed_fields, &metadata);
        self.place_entry(
            slot,
            DocumentEntry {
                public_id: public_id.to_string(),
                vector: new_vector,
                metadata,
            },
        );
        Ok(())
    }

    /// Deleting a missing id is a no-op, never an error.
    pub fn delete(&mut self, public_id: &str) {
        let Some(slot) = self.id_to_slot.remove(public_id) else {
            return;
        };
        self.vector_index.mark_delete(slot);
        self.remove_entry(slot);
        self.free_list.push(slot);
        self.inverted.unindex(slot);
    }

    /// Replaces the indexed-field list. Existing documents are not
    /// retroactively re-indexed — only documents inserted, updated, or
    /// compacted afterward pick up the new fields. Changing this list
    /// mid-life leaves stale postings and doc lengths referring to the old
    /// field set until those entries are touched again or the namespace is
    /// compacted.
    pub fn set_indexed_fields(&mut self, fields: Vec<String>) {
        self.indexed_fields = fields;
    }
}
