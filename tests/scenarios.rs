//! End-to-end scenarios exercised through the public `Engine` API only.

use hybridstore::{Engine, EngineConfig, HybridSearchOptions, RrfSearchOptions};
use serde_json::json;

fn engine() -> Engine {
    engine_with(4, 64)
}

fn engine_with(dim: usize, max_elements: usize) -> Engine {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Engine::new(EngineConfig::new(dim, max_elements))
}

#[test]
fn s1_pure_vector_knn() {
    let engine = engine();
    engine.insert("s1", "a".into(), vec![1.0, 0.0, 0.0, 0.0], None).unwrap();
    engine.insert("s1", "b".into(), vec![0.0, 1.0, 0.0, 0.0], None).unwrap();
    let s = 1.0f32 / 2.0f32.sqrt();
    engine.insert("s1", "c".into(), vec![s, s, 0.0, 0.0], None).unwrap();

    let results = engine
        .search("s1", &[1.0, 0.0, 0.0, 0.0], Some(2), None)
        .unwrap();
    assert_eq!(results.iter().map(|r| r.id.clone()).collect::<Vec<_>>(), vec!["a", "c"]);
    assert!((results[0].similarity - 1.0).abs() < 1e-5);
    assert!((results[1].similarity - 0.7071068).abs() < 1e-3);
}

#[test]
fn s2_bm25_ordering_by_idf_and_tf() {
    let engine = engine();
    engine.set_indexed_fields("s2", vec!["t".to_string()]);

    let mut m1 = hybridstore::Metadata::new();
    m1.insert("t".to_string(), json!("alpha beta"));
    engine.insert("s2", "d1".into(), vec![1.0, 0.0, 0.0, 0.0], Some(m1)).unwrap();

    let mut m2 = hybridstore::Metadata::new();
    m2.insert("t".to_string(), json!("alpha alpha"));
    engine.insert("s2", "d2".into(), vec![0.0, 1.0, 0.0, 0.0], Some(m2)).unwrap();

    let mut m3 = hybridstore::Metadata::new();
    m3.insert("t".to_string(), json!("beta gamma delta"));
    engine.insert("s2", "d3".into(), vec![0.0, 0.0, 1.0, 0.0], Some(m3)).unwrap();

    let results = engine.full_text_search("s2", "alpha", Some(3), None).unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["d2", "d1"]);
}

#[test]
fn s3_tokenizer_and_case() {
    let engine = engine();
    engine.set_indexed_fields("s3", vec!["t".to_string()]);

    let mut m = hybridstore::Metadata::new();
    m.insert("t".to_string(), json!("Hello, World!"));
    engine.insert("s3", "x".into(), vec![1.0, 0.0, 0.0, 0.0], Some(m)).unwrap();

    let hits = engine.full_text_search("s3", "hello", None, None).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "x");

    let hits = engine.full_text_search("s3", "HELLO-world", None, None).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "x");

    let hits = engine.full_text_search("s3", "", None, None).unwrap();
    assert!(hits.is_empty());
}

#[test]
fn s4_metadata_filter() {
    let engine = engine();
    for i in 0..10 {
        let category = if i % 2 == 0 { "A" } else { "B" };
        let mut m = hybridstore::Metadata::new();
        m.insert("category".to_string(), json!(category));
        engine
            .insert("s4", format!("doc{i}"), vec![1.0, i as f32, 0.0, 0.0], Some(m))
            .unwrap();
    }

    let mut filter = hybridstore::MetadataFilter::new();
    filter.insert("category".to_string(), json!("A"));
    let results = engine
        .search("s4", &[1.0, 0.0, 0.0, 0.0], Some(5), Some(filter))
        .unwrap();
    assert!(results.len() <= 5);
    assert!(results.iter().all(|r| r.metadata.get("category").unwrap() == "A"));
}

#[test]
fn s5_delete_then_reinsert_same_id() {
    let engine = engine();
    engine.insert("s5", "p".into(), vec![1.0, 0.0, 0.0, 0.0], None).unwrap();
    let before_stats = engine.namespace_stats("s5");

    engine.delete("s5", "p");
    engine.insert("s5", "p".into(), vec![0.0, 0.0, 1.0, 0.0], None).unwrap();
    let after_stats = engine.namespace_stats("s5");

    assert_eq!(before_stats.free_slots, after_stats.free_slots);

    let results = engine.search("s5", &[0.0, 0.0, 1.0, 0.0], Some(1), None).unwrap();
    assert_eq!(results[0].id, "p");
    assert!((results[0].similarity - 1.0).abs() < 1e-5);

    let results = engine.search("s5", &[1.0, 0.0, 0.0, 0.0], Some(1), None).unwrap();
    assert!(results[0].id == "p" && results[0].similarity < 0.5);
}

#[test]
fn s6_persistence_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("snap");

    let engine = engine();
    engine.set_indexed_fields("s6", vec!["t".to_string()]);
    for i in 0..50 {
        let mut m = hybridstore::Metadata::new();
        m.insert("t".to_string(), json!(format!("term{} shared category{}", i % 7, i % 3)));
        m.insert("category".to_string(), json!(format!("cat{}", i % 3)));
        let v = vec![i as f32, (i % 5) as f32, 0.0, 1.0];
        engine.insert("s6", format!("doc{i}"), v, Some(m)).unwrap();
    }

    let query_vec = vec![10.0, 2.0, 0.0, 1.0];
    let vec_before = engine.search("s6", &query_vec, Some(5), None).unwrap();
    let text_before = engine.full_text_search("s6", "term3", Some(5), None).unwrap();
    let hybrid_before = engine
        .hybrid_search("s6", &query_vec, "term3", HybridSearchOptions::default())
        .unwrap();
    let rrf_before = engine
        .hybrid_search_rrf("s6", &query_vec, "term3", RrfSearchOptions::default())
        .unwrap();

    engine.save("s6", &base).unwrap();

    let fresh = engine_with(4, 64);
    fresh.load("s6", &base).unwrap();

    let vec_after = fresh.search("s6", &query_vec, Some(5), None).unwrap();
    let text_after = fresh.full_text_search("s6", "term3", Some(5), None).unwrap();
    let hybrid_after = fresh
        .hybrid_search("s6", &query_vec, "term3", HybridSearchOptions::default())
        .unwrap();
    let rrf_after = fresh
        .hybrid_search_rrf("s6", &query_vec, "term3", RrfSearchOptions::default())
        .unwrap();

    assert_eq!(vec_before, vec_after);
    assert_eq!(text_before, text_after);
    assert_eq!(hybrid_before, hybrid_after);
    assert_eq!(rrf_before, rrf_after);
}

#[test]
fn s7_rrf_tie_breaking() {
    let engine = engine();
    engine.set_indexed_fields("s7", vec!["t".to_string()]);

    engine.insert("s7", "a".into(), vec![1.0, 0.0, 0.0, 0.0], Some(meta("w"))).unwrap();
    engine.insert("s7", "b".into(), vec![0.9, 0.1, 0.0, 0.0], Some(meta("w w w"))).unwrap();
    engine.insert("s7", "c".into(), vec![0.8, 0.2, 0.0, 0.0], Some(meta("w w"))).unwrap();

    let results = engine
        .hybrid_search_rrf(
            "s7",
            &[1.0, 0.0, 0.0, 0.0],
            "w",
            RrfSearchOptions { k: 3, rrf_k: 60, filter: hybridstore::MetadataFilter::new() },
        )
        .unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a", "c"]);
}

fn meta(text: &str) -> hybridstore::Metadata {
    let mut m = hybridstore::Metadata::new();
    m.insert("t".to_string(), json!(text));
    m
}

#[test]
fn bad_weights_are_rejected() {
    let engine = engine();
    engine.insert("weights", "a".into(), vec![1.0, 0.0, 0.0, 0.0], None).unwrap();

    let err = engine
        .hybrid_search(
            "weights",
            &[1.0, 0.0, 0.0, 0.0],
            "x",
            HybridSearchOptions {
                vector_weight: 0.4,
                text_weight: 0.4,
                ..HybridSearchOptions::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, hybridstore::RetrievalError::BadWeights { .. }));
}

#[test]
fn capacity_exhausted_is_reported() {
    let engine = engine_with(4, 1);
    engine.insert("tiny", "a".into(), vec![1.0, 0.0, 0.0, 0.0], None).unwrap();
    let err = engine
        .insert("tiny", "b".into(), vec![0.0, 1.0, 0.0, 0.0], None)
        .unwrap_err();
    assert!(matches!(err, hybridstore::RetrievalError::CapacityExhausted { .. }));
}

#[test]
fn namespaces_are_created_lazily_on_first_reference() {
    let engine = engine();
    assert!(engine.list_namespaces().is_empty());
    assert!(!engine.namespace_exists("fresh"));

    engine.insert("fresh", "a".into(), vec![1.0, 0.0, 0.0, 0.0], None).unwrap();

    assert!(engine.namespace_exists("fresh"));
    assert_eq!(engine.list_namespaces(), vec!["fresh".to_string()]);
}
