//! Save/load and compaction.
//!
//! The vector index writes its own binary blob at `{file_base}.idx`; the
//! namespace's own state (id maps, free list, postings, doc lengths) is
//! written as a single JSON blob at `{file_base}.meta.json`.

use crate::error::{RetrievalError, Result};
use crate::namespace::store::NamespaceInner;
use crate::types::{DocumentEntry, Slot};
use crate::vector_index::HnswVectorIndex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct PersistedEntry {
    public_id: String,
    vector: Vec<f32>,
    metadata: crate::types::Metadata,
}

#[derive(Serialize, Deserialize)]
struct PersistedMeta {
    #[serde(rename = "idMap")]
    id_map: std::collections::HashMap<String, Slot>,
    #[serde(rename = "revMap")]
    rev_map: Vec<(Slot, PersistedEntry)>,
    #[serde(rename = "nextInternalId")]
    next_internal_id: Slot,
    #[serde(rename = "freeList")]
    free_list: Vec<Slot>,
    #[serde(rename = "fullTextIndex")]
    full_text_index: Vec<(String, Vec<Slot>)>,
    #[serde(rename = "indexedFields")]
    indexed_fields: Vec<String>,
    #[serde(rename = "docLengths")]
    doc_lengths: Vec<(Slot, u32)>,
    #[serde(rename = "avgDocLength")]
    avg_doc_length: f32,
    #[serde(rename = "totalDocs")]
    total_docs: usize,
    dim: usize,
    max_elements: usize,
}

impl NamespaceInner {
    /// Ensures the parent directory exists, then writes the vector index
    /// blob and the metadata JSON blob.
    pub fn save(&self, file_base: &Path) -> Result<()> {
        if let Some(parent) = file_base.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.vector_index.write_index(&idx_path(file_base))?;

        let mut rev_map = Vec::with_capacity(self.live_count());
        for (slot, entry) in self.slot_to_entry.iter().enumerate() {
            if let Some(entry) = entry {
                rev_map.push((
                    slot,
                    PersistedEntry {
                        public_id: entry.public_id.clone(),
                        vector: entry.vector.clone(),
                        metadata: entry.metadata.clone(),
                    },
                ));
            }
        }

        let mut full_text_index = Vec::new();
        let mut doc_lengths = Vec::new();
        for (slot, _) in &rev_map {
            if let Some(dl) = self.inverted.doc_length(*slot) {
                doc_lengths.push((*slot, dl));
            }
        }
        let mut terms: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
        for (slot, _) in &rev_map {
            let Some(entry) = self.entry(*slot) else {
                continue;
            };
            for field in &self.indexed_fields {
                if let Some(serde_json::Value::String(text)) = entry.metadata.get(field) {
                    for tok in crate::tokenizer::tokenize(text) {
                        terms.insert(tok);
                    }
                }
            }
        }
        for term in terms {
            if let Some(postings) = self.inverted.postings(&term) {
                full_text_index.push((term, postings.iter().copied().collect()));
            }
        }

        let meta = PersistedMeta {
            id_map: self.id_to_slot.clone(),
            rev_map,
            next_internal_id: self.next_slot,
            free_list: self.free_list.clone(),
            full_text_index,
            indexed_fields: self.indexed_fields.clone(),
            doc_lengths,
            avg_doc_length: self.inverted.avg_doc_length(),
            total_docs: self.inverted.total_docs(),
            dim: self.dim,
            max_elements: self.max_elements,
        };
        let bytes = serde_json::to_vec_pretty(&meta)?;
        std::fs::write(meta_path(file_base), bytes)?;
        Ok(())
    }

    /// Replaces the namespace's entire state with the deserialized contents
    /// of `file_base`'s two blobs. Any residual pre-load state is discarded.
    pub fn load(&mut self, file_base: &Path) -> Result<()> {
        let bytes = std::fs::read(meta_path(file_base))
            .map_err(|e| RetrievalError::LoadCorrupt(e.to_string()))?;
        let meta: PersistedMeta =
            serde_json::from_slice(&bytes).map_err(|e| RetrievalError::LoadCorrupt(e.to_string()))?;

        if meta.dim != self.dim || meta.max_elements != self.max_elements {
            return Err(RetrievalError::LoadCorrupt(format!(
                "namespace config mismatch: expected dim={} max_elements={}, snapshot has dim={} max_elements={}",
                self.dim, self.max_elements, meta.dim, meta.max_elements
            )));
        }

        let mut vector_index = HnswVectorIndex::new(self.dim, self.max_elements);
        vector_index.read_index(&idx_path(file_base))?;

        let mut slot_to_entry: Vec<Option<DocumentEntry>> = Vec::new();
        let mut inverted = crate::inverted_index::InvertedIndex::new();
        for (slot, persisted) in &meta.rev_map {
            if *slot >= slot_to_entry.len() {
                slot_to_entry.resize_with(slot + 1, || None);
            }
            slot_to_entry[*slot] = Some(DocumentEntry {
                public_id: persisted.public_id.clone(),
                vector: persisted.vector.clone(),
                metadata: persisted.metadata.clone(),
            });
        }
        for (slot, entry) in slot_to_entry.iter().enumerate() {
            if let Some(entry) = entry {
                inverted.index(slot, &meta.indexed_fields, &entry.metadata);
            }
        }

        self.vector_index = Box::new(vector_index);
        self.slot_to_entry = slot_to_entry;
        self.id_to_slot = meta.id_map;
        self.next_slot = meta.next_internal_id;
        self.free_list = meta.free_list;
        self.indexed_fields = meta.indexed_fields;
        self.inverted = inverted;
        Ok(())
    }

    /// Rebuilds the namespace with contiguous slot numbering. Iteration
    /// order over live ids is not observable.
    pub fn compact(&mut self) {
        let mut fresh = NamespaceInner::new(crate::config::NamespaceConfig {
            dim: self.dim,
            max_elements: self.max_elements,
        });
        fresh.indexed_fields = self.indexed_fields.clone();

        for entry in self.slot_to_entry.iter().flatten() {
            let slot = fresh
                .allocate_slot()
                .expect("compaction never exceeds the original live count");
            fresh
                .vector_index
                .add_point(&entry.vector, slot)
                .expect("vector dimension was already validated at insert time");
            fresh.inverted.index(slot, &fresh.indexed_fields, &entry.metadata);
            fresh.id_to_slot.insert(entry.public_id.clone(), slot);
            fresh.place_entry(slot, entry.clone());
        }

        *self = fresh;
    }
}

fn idx_path(file_base: &Path) -> std::path::PathBuf {
    file_base.with_extension("idx")
}

fn meta_path(file_base: &Path) -> std::path::PathBuf {
    let mut p = file_base.as_os_str().to_os_string();
    p.push(".meta.json");
    std::path::PathBuf::from(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamespaceConfig;
    use serde_json::json;

    fn ns() -> NamespaceInner {
        let mut n = NamespaceInner::new(NamespaceConfig {
            dim: 4,
            max_elements: 16,
        });
        n.set_indexed_fields(vec!["t".to_string()]);
        n
    }

    #[test]
    fn save_then_load_round_trips_search_results() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("ns1");

        let mut n = ns();
        for i in 0..5 {
            let mut m = crate::types::Metadata::new();
            m.insert("t".to_string(), json!(format!("term{i} shared")));
            n.insert(format!("doc{i}"), vec![i as f32, 0.0, 0.0, 1.0], m)
                .unwrap();
        }
        let before = n
            .search(&[0.0, 0.0, 0.0, 1.0], 3, &crate::types::MetadataFilter::new())
            .unwrap();
        n.save(&base).unwrap();

        let mut fresh = ns();
        fresh.load(&base).unwrap();
        let after = fresh
            .search(&[0.0, 0.0, 0.0, 1.0], 3, &crate::types::MetadataFilter::new())
            .unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn load_rejects_dimension_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("ns1");
        let n = ns();
        n.save(&base).unwrap();

        let mut other = NamespaceInner::new(NamespaceConfig {
            dim: 8,
            max_elements: 16,
        });
        let err = other.load(&base).unwrap_err();
        assert!(matches!(err, RetrievalError::LoadCorrupt(_)));
    }

    #[test]
    fn compaction_resets_free_list_and_preserves_live_entries() {
        let mut n = ns();
        n.insert("a".into(), vec![1.0, 0.0, 0.0, 0.0], crate::types::Metadata::new())
            .unwrap();
        n.insert("b".into(), vec![0.0, 1.0, 0.0, 0.0], crate::types::Metadata::new())
            .unwrap();
        n.delete("a");
        assert_eq!(n.free_list.len(), 1);

        n.compact();
        assert!(n.free_list.is_empty());
        assert_eq!(n.next_slot, 1);
        assert_eq!(n.live_count(), 1);
        assert!(n.id_to_slot.contains_key("b"));
    }
}
