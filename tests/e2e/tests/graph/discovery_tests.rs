//! Discovery scan tests
//!
//! Covers the two discovery queries that feed dream consolidation: embedding
//! similarity over unconnected pairs and creation-time proximity.

use reverie_core::{ConnectionKind, MemoryInput};
use reverie_e2e_tests::harness::db_manager::TestDatabaseManager;
use reverie_e2e_tests::mocks::fixtures::{unit_embedding, BatchConfig, TestDataFactory};

// ============================================================================
// SEMANTIC DISCOVERY
// ============================================================================

#[test]
fn test_similarity_scan_finds_cluster_pairs_only() {
    let db = TestDatabaseManager::new_temp();
    let scenario = TestDataFactory::create_similarity_scenario(&db.storage);

    let pairs = db.storage.find_similar_unconnected_pairs(0.85, 100).unwrap();
    let expected: usize = scenario.metadata["expected_pairs"].parse().unwrap();
    assert_eq!(pairs.len(), expected);

    let outlier = &scenario.memory_ids[3];
    for pair in &pairs {
        assert_ne!(&pair.id_a, outlier);
        assert_ne!(&pair.id_b, outlier);
        assert!(pair.similarity >= 0.85);
    }
}

#[test]
fn test_similarity_scan_is_ordered_strongest_first() {
    let db = TestDatabaseManager::new_temp();
    // Angles 0.0, 0.3, 0.6: pair similarities cos(0.3) > cos(0.6)
    TestDataFactory::create_batch(
        &db.storage,
        BatchConfig {
            count: 3,
            with_embeddings: true,
            angle_step: 0.3,
            ..Default::default()
        },
    );

    let pairs = db.storage.find_similar_unconnected_pairs(0.5, 100).unwrap();
    assert_eq!(pairs.len(), 3);
    for window in pairs.windows(2) {
        assert!(window[0].similarity >= window[1].similarity);
    }
}

#[test]
fn test_similarity_scan_limit_keeps_strongest() {
    let db = TestDatabaseManager::new_temp();
    TestDataFactory::create_batch(
        &db.storage,
        BatchConfig {
            count: 3,
            with_embeddings: true,
            angle_step: 0.3,
            ..Default::default()
        },
    );

    let all = db.storage.find_similar_unconnected_pairs(0.5, 100).unwrap();
    let top = db.storage.find_similar_unconnected_pairs(0.5, 1).unwrap();
    assert_eq!(top.len(), 1);
    assert!((top[0].similarity - all[0].similarity).abs() < 1e-12);
}

#[test]
fn test_similarity_scan_skips_connected_pairs_in_either_direction() {
    let db = TestDatabaseManager::new_temp();
    let a = TestDataFactory::create_embedded(&db.storage, "a", unit_embedding(0.0));
    let b = TestDataFactory::create_embedded(&db.storage, "b", unit_embedding(0.05));

    db.storage
        .reinforce_edge_pair(&a.id, &b.id, 0.1, ConnectionKind::Semantic)
        .unwrap();

    let pairs = db.storage.find_similar_unconnected_pairs(0.85, 100).unwrap();
    assert!(pairs.is_empty(), "connected pair must not be rediscovered");
}

#[test]
fn test_similarity_scan_ignores_memories_without_embeddings() {
    let db = TestDatabaseManager::new_temp();
    TestDataFactory::create_memory(&db.storage, "no embedding one");
    TestDataFactory::create_memory(&db.storage, "no embedding two");

    let pairs = db.storage.find_similar_unconnected_pairs(0.0, 100).unwrap();
    assert!(pairs.is_empty());
}

#[test]
fn test_similarity_scan_agent_filter() {
    let db = TestDatabaseManager::new_temp();
    db.seed_for_agent(
        "agent-1",
        &[("mine a", unit_embedding(0.0)), ("mine b", unit_embedding(0.05))],
    );
    db.seed_for_agent("agent-2", &[("theirs", unit_embedding(0.02))]);

    let scoped = db
        .storage
        .find_similar_unconnected_pairs_filtered(Some("agent-1"), 0.85, 100)
        .unwrap();
    assert_eq!(scoped.len(), 1);

    let unscoped = db
        .storage
        .find_similar_unconnected_pairs_filtered(None, 0.85, 100)
        .unwrap();
    assert_eq!(unscoped.len(), 3, "no filter scans across agents");
}

// ============================================================================
// TEMPORAL DISCOVERY
// ============================================================================

#[test]
fn test_temporal_scan_respects_window() {
    let db = TestDatabaseManager::new_temp();
    let scenario = TestDataFactory::create_timeline_scenario(&db.storage);

    let pairs = db.storage.find_temporally_unconnected_pairs(1.0, 100).unwrap();
    let expected: usize = scenario.metadata["expected_pairs"].parse().unwrap();
    assert_eq!(pairs.len(), expected);

    let straggler = &scenario.memory_ids[3];
    for (a, b) in &pairs {
        assert_ne!(a, straggler);
        assert_ne!(b, straggler);
    }
}

#[test]
fn test_temporal_scan_skips_connected_pairs() {
    let db = TestDatabaseManager::new_temp();
    let ids = db.seed_timeline(&["close one", "close two"], 0.5);

    db.storage
        .reinforce_edge_pair(&ids[0], &ids[1], 0.2, ConnectionKind::Temporal)
        .unwrap();

    let pairs = db.storage.find_temporally_unconnected_pairs(1.0, 100).unwrap();
    assert!(pairs.is_empty());
}

#[test]
fn test_temporal_scan_includes_embeddingless_memories() {
    let db = TestDatabaseManager::new_temp();
    // One embedded, one not; temporal proximity alone should pair them
    db.storage
        .insert_memory(MemoryInput {
            content: "embedded".to_string(),
            embedding: Some(unit_embedding(0.0)),
            agent_id: None,
        })
        .unwrap();
    db.storage
        .insert_memory(MemoryInput {
            content: "plain".to_string(),
            embedding: None,
            agent_id: None,
        })
        .unwrap();

    let pairs = db.storage.find_temporally_unconnected_pairs(1.0, 100).unwrap();
    assert_eq!(pairs.len(), 1);
}

#[test]
fn test_temporal_scan_limit() {
    let db = TestDatabaseManager::new_temp();
    db.seed_timeline(&["a", "b", "c", "d"], 0.1);

    let pairs = db.storage.find_temporally_unconnected_pairs(10.0, 2).unwrap();
    assert_eq!(pairs.len(), 2);
}
