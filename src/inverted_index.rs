//! In-memory inverted index with BM25 statistics.
//!
//! Unlike an on-disk, chunked B+Tree full-text engine, this index is a plain
//! in-memory postings map: the crate's persisted format is a single JSON
//! metadata blob per namespace, so there is no benefit to a disk-resident
//! structure here — the whole thing is rebuilt on load anyway.

use crate::tokenizer::tokenize;
use crate::types::{Metadata, Slot};
use ahash::{AHashMap, AHashSet};

/// Postings plus BM25 document-length statistics for one namespace.
#[derive(Debug, Clone, Default)]
pub struct InvertedIndex {
    postings: AHashMap<String, AHashSet<Slot>>,
    doc_lengths: AHashMap<Slot, u32>,
    total_docs: usize,
    avg_doc_length: f32,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_docs(&self) -> usize {
        self.total_docs
    }

    pub fn avg_doc_length(&self) -> f32 {
        self.avg_doc_length
    }

    pub fn doc_length(&self, slot: Slot) -> Option<u32> {
        self.doc_lengths.get(&slot).copied()
    }

    pub fn document_frequency(&self, term: &str) -> usize {
        self.postings.get(term).map(|s| s.len()).unwrap_or(0)
    }

    pub fn postings(&self, term: &str) -> Option<&AHashSet<Slot>> {
        self.postings.get(term)
    }

    pub fn unique_terms(&self) -> usize {
        self.postings.len()
    }

    /// Index (or re-index) `slot` against the given indexed-field values.
    ///
    /// `remove` must be called first if `slot` was previously indexed, since
    /// this only adds postings — callers compose `unindex` + `index` for
    /// re-indexing (as `Update` does) to keep the two operations orthogonal.
    pub fn index(&mut self, slot: Slot, indexed_fields: &[String], metadata: &Metadata) {
        self.unindex(slot);

        let mut doc_length: u32 = 0;
        for field in indexed_fields {
            if let Some(serde_json::Value::String(text)) = metadata.get(field) {
                let tokens = tokenize(text);
                doc_length += tokens.len() as u32;
                for token in tokens {
                    self.postings.entry(token).or_default().insert(slot);
                }
            }
        }
        self.doc_lengths.insert(slot, doc_length);
        self.refresh_stats();
    }

    /// Remove `slot` from every posting and drop its document length.
    pub fn unindex(&mut self, slot: Slot) {
        if self.doc_lengths.remove(&slot).is_none() {
            return;
        }
        self.postings.retain(|_, slots| {
            slots.remove(&slot);
            !slots.is_empty()
        });
        self.refresh_stats();
    }

    fn refresh_stats(&mut self) {
        self.total_docs = self.doc_lengths.len();
        self.avg_doc_length = if self.total_docs == 0 {
            0.0
        } else {
            self.doc_lengths.values().copied().sum::<u32>() as f32 / self.total_docs as f32
        };
    }
}

/// BM25 score of `query term frequencies` against one candidate document.
///
/// `idf(t) = ln((N - df + 0.5)/(df + 0.5) + 1)`.
pub fn bm25_score(
    index: &InvertedIndex,
    qtf: &AHashMap<String, u32>,
    dtf: &AHashMap<String, u32>,
    doc_length: u32,
    k1: f32,
    b: f32,
) -> f32 {
    let n = index.total_docs() as f32;
    let avg_dl = index.avg_doc_length();
    let mut score = 0.0f32;
    for (term, _) in qtf {
        let Some(&tf) = dtf.get(term) else { continue };
        if tf == 0 {
            continue;
        }
        let df = index.document_frequency(term) as f32;
        let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
        let tf = tf as f32;
        let norm = 1.0 - b + b * (doc_length as f32 / avg_dl.max(f32::MIN_POSITIVE));
        score += idf * (tf * (k1 + 1.0)) / (tf + k1 * norm);
    }
    score
}
