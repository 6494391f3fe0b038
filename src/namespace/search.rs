//! Retrieval Engine: vector k-NN, BM25 text search, weighted and RRF hybrid
//! fusion, and MMR diversity reranking. Every method assumes the caller
//! already holds at least a read lock on the namespace.

use crate::config::{Bm25Params, MMR_LAMBDA, WEIGHT_SUM_EPSILON};
use crate::distance::cosine_similarity;
use crate::error::{RetrievalError, Result};
use crate::inverted_index::bm25_score;
use crate::namespace::store::NamespaceInner;
use crate::tokenizer::tokenize;
use crate::types::{matches_filter, HybridResult, MetadataFilter, SearchResult, Slot};
use ahash::AHashMap;
use std::collections::HashMap;

/// Options for [`NamespaceInner::hybrid_search`].
pub struct WeightedHybridOptions<'a> {
    pub vector_weight: f32,
    pub text_weight: f32,
    pub k: usize,
    pub filter: &'a MetadataFilter,
    pub rerank: bool,
}

impl NamespaceInner {
    /// Pure vector k-NN search.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<SearchResult>> {
        if query.len() != self.dim {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }
        let raw = self.raw_vector_search(query, k, filter)?;
        Ok(raw
            .into_iter()
            .map(|(_slot, similarity, entry)| SearchResult {
                id: entry.public_id.clone(),
                similarity,
                metadata: entry.metadata.clone(),
            })
            .collect())
    }

    /// Requests `min(2k, live_count)` neighbors for filter slack, converts
    /// distance to similarity, applies the metadata filter, and returns the
    /// first `k` survivors in index order.
    fn raw_vector_search(
        &self,
        query: &[f32],
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<(Slot, f32, &crate::types::DocumentEntry)>> {
        let fetch = (2 * k).min(self.live_count());
        let neighbors = self.vector_index.search_knn(query, fetch)?;
        let mut out = Vec::with_capacity(k);
        for n in neighbors {
            if out.len() == k {
                break;
            }
            let Some(entry) = self.entry(n.slot) else {
                continue;
            };
            if !matches_filter(&entry.metadata, filter) {
                continue;
            }
            let similarity = 1.0 - n.distance;
            out.push((n.slot, similarity, entry));
        }
        Ok(out)
    }

    /// Pure BM25 keyword search.
    pub fn full_text_search(
        &self,
        query_text: &str,
        k: usize,
        filter: &MetadataFilter,
        bm25: Bm25Params,
    ) -> Vec<SearchResult> {
        self.raw_text_search(query_text, k, filter, bm25)
            .into_iter()
            .map(|(_slot, score, entry)| SearchResult {
                id: entry.public_id.clone(),
                similarity: score,
                metadata: entry.metadata.clone(),
            })
            .collect()
    }

    fn raw_text_search(
        &self,
        query_text: &str,
        k: usize,
        filter: &MetadataFilter,
        bm25: Bm25Params,
    ) -> Vec<(Slot, f32, &crate::types::DocumentEntry)> {
        if self.indexed_fields.is_empty() {
            return Vec::new();
        }
        let query_tokens = tokenize(query_text);
        if query_tokens.is_empty() {
            return Vec::new();
        }
        let mut qtf: AHashMap<String, u32> = AHashMap::new();
        for t in &query_tokens {
            *qtf.entry(t.clone()).or_insert(0) += 1;
        }

        let mut candidates: std::collections::HashSet<Slot> = std::collections::HashSet::new();
        for term in qtf.keys() {
            if let Some(postings) = self.inverted.postings(term) {
                candidates.extend(postings.iter().copied());
            }
        }

        let mut scored: Vec<(Slot, f32)> = candidates
            .into_iter()
            .filter_map(|slot| {
                let entry = self.entry(slot)?;
                let mut dtf: AHashMap<String, u32> = AHashMap::new();
                for field in &self.indexed_fields {
                    if let Some(serde_json::Value::String(text)) = entry.metadata.get(field) {
                        for tok in tokenize(text) {
                            if qtf.contains_key(&tok) {
                                *dtf.entry(tok).or_insert(0) += 1;
                            }
                        }
                    }
                }
                let dl = self.inverted.doc_length(slot).unwrap_or(0);
                let score = bm25_score(&self.inverted, &qtf, &dtf, dl, bm25.k1, bm25.b);
                Some((slot, score))
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .filter_map(|(slot, score)| {
                let entry = self.entry(slot)?;
                if !matches_filter(&entry.metadata, filter) {
                    return None;
                }
                Some((slot, score, entry))
            })
            .take(k)
            .collect()
    }

    /// Weighted linear fusion of min-max normalized vector and text scores.
    pub fn hybrid_search(
        &self,
        query_vec: &[f32],
        query_text: &str,
        opts: WeightedHybridOptions,
        bm25: Bm25Params,
    ) -> Result<Vec<HybridResult>> {
        if (opts.vector_weight + opts.text_weight - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(RetrievalError::BadWeights {
                vector_weight: opts.vector_weight,
                text_weight: opts.text_weight,
            });
        }
        if query_vec.len() != self.dim {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dim,
                actual: query_vec.len(),
            });
        }

        let k_prime = (3 * opts.k).min(self.live_count());
        let vector_hits = self.raw_vector_search(query_vec, k_prime, opts.filter)?;
        let text_hits = self.raw_text_search(query_text, k_prime, opts.filter, bm25);

        let vector_norm = normalize(vector_hits.iter().map(|(_, s, _)| *s).collect());
        let text_norm = normalize(text_hits.iter().map(|(_, s, _)| *s).collect());

        let mut combined: HashMap<String, HybridAccum> = HashMap::new();
        for (i, (_, _, entry)) in vector_hits.iter().enumerate() {
            combined
                .entry(entry.public_id.clone())
                .or_insert_with(|| HybridAccum::new(entry.vector.clone(), entry.metadata.clone()))
                .vector_score = vector_norm[i];
        }
        for (i, (_, _, entry)) in text_hits.iter().enumerate() {
            combined
                .entry(entry.public_id.clone())
                .or_insert_with(|| HybridAccum::new(entry.vector.clone(), entry.metadata.clone()))
                .text_score = text_norm[i];
        }

        let mut results: Vec<(Vec<f32>, HybridResult)> = combined
            .into_iter()
            .map(|(id, acc)| {
                let combined_score =
                    opts.vector_weight * acc.vector_score + opts.text_weight * acc.text_score;
                (
                    acc.vector,
                    HybridResult {
                        id,
                        similarity: combined_score,
                        metadata: acc.metadata,
                        vector_score: acc.vector_score,
                        text_score: acc.text_score,
                        combined_score,
                    },
                )
            })
            .collect();
        results.sort_by(|a, b| {
            b.1.combined_score
                .partial_cmp(&a.1.combined_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        if opts.rerank {
            results = mmr_rerank(results, query_vec);
        }

        Ok(results.into_iter().take(opts.k).map(|(_, r)| r).collect())
    }

    /// Reciprocal Rank Fusion hybrid search.
    pub fn hybrid_search_rrf(
        &self,
        query_vec: &[f32],
        query_text: &str,
        k: usize,
        rrf_k: u32,
        filter: &MetadataFilter,
        bm25: Bm25Params,
    ) -> Result<Vec<HybridResult>> {
        if query_vec.len() != self.dim {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dim,
                actual: query_vec.len(),
            });
        }
        let k_prime = (3 * k).min(self.live_count());
        let vector_hits = self.raw_vector_search(query_vec, k_prime, filter)?;
        let text_hits = self.raw_text_search(query_text, k_prime, filter, bm25);

        let mut rrf: HashMap<String, HybridAccum> = HashMap::new();
        for (rank, (_, _, entry)) in vector_hits.iter().enumerate() {
            let contribution = 1.0 / (rrf_k as f32 + (rank + 1) as f32);
            let acc = rrf
                .entry(entry.public_id.clone())
                .or_insert_with(|| HybridAccum::new(entry.vector.clone(), entry.metadata.clone()));
            acc.vector_score = contribution;
            acc.rrf_score += contribution;
        }
        for (rank, (_, _, entry)) in text_hits.iter().enumerate() {
            let contribution = 1.0 / (rrf_k as f32 + (rank + 1) as f32);
            let acc = rrf
                .entry(entry.public_id.clone())
                .or_insert_with(|| HybridAccum::new(entry.vector.clone(), entry.metadata.clone()));
            acc.text_score = contribution;
            acc.rrf_score += contribution;
        }

        let mut results: Vec<HybridResult> = rrf
            .into_iter()
            .map(|(id, acc)| HybridResult {
                id,
                similarity: acc.rrf_score,
                metadata: acc.metadata,
                vector_score: acc.vector_score,
                text_score: acc.text_score,
                combined_score: acc.rrf_score,
            })
            .collect();
        results.sort_by(|a, b| {
            b.combined_score
                .partial_cmp(&a.combined_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);
        Ok(results)
    }
}

struct HybridAccum {
    vector: Vec<f32>,
    metadata: crate::types::Metadata,
    vector_score: f32,
    text_score: f32,
    rrf_score: f32,
}

impl HybridAccum {
    fn new(vector: Vec<f32>, metadata: crate::types::Metadata) -> Self {
        HybridAccum {
            vector,
            metadata,
            vector_score: 0.0,
            text_score: 0.0,
            rrf_score: 0.0,
        }
    }
}

/// Min-max normalize a raw score list; divides by 1 instead of 0 when every
/// score is equal.
fn normalize(scores: Vec<f32>) -> Vec<f32> {
    if scores.is_empty() {
        return scores;
    }
    let min = scores.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let divisor = (max - min).max(0.0);
    let divisor = if divisor == 0.0 { 1.0 } else { divisor };
    scores.into_iter().map(|s| (s - min) / divisor).collect()
}

/// Greedy MMR reranking over an already fused, already ordered list. Ties
/// broken by position (first occurrence wins), since `max_by` over an
/// empty-tie set picks the earliest maximal element scanned first.
fn mmr_rerank(
    candidates: Vec<(Vec<f32>, HybridResult)>,
    _query_vec: &[f32],
) -> Vec<(Vec<f32>, HybridResult)> {
    if candidates.len() <= 1 {
        return candidates;
    }
    let mut remaining: Vec<(Vec<f32>, HybridResult)> = candidates;
    let mut selected = vec![remaining.remove(0)];

    while !remaining.is_empty() {
        let mut best_idx = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for (i, (vector, result)) in remaining.iter().enumerate() {
            let max_sim = selected
                .iter()
                .map(|(sv, _)| cosine_similarity(vector, sv))
                .fold(f32::NEG_INFINITY, f32::max);
            let mmr = MMR_LAMBDA * result.combined_score - (1.0 - MMR_LAMBDA) * max_sim;
            if mmr > best_score {
                best_score = mmr;
                best_idx = i;
            }
        }
        selected.push(remaining.remove(best_idx));
    }
    selected
}
