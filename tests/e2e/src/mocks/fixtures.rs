//! Test Data Factory
//!
//! Provides utilities for generating realistic test data:
//! - Memories with deterministic embedding vectors
//! - Batch generation for stress testing
//! - Pre-built scenarios for common test cases

use reverie_core::{MemoryInput, MemoryRecord, Storage};
use std::collections::HashMap;

/// Factory for creating test data
///
/// Generates deterministic test data with configurable properties.
///
/// # Example
///
/// ```rust,ignore
/// let storage = Storage::new(Some(path))?;
///
/// // Create a single memory
/// let memory = TestDataFactory::create_memory(&storage, "test content");
///
/// // Create a batch
/// let ids = TestDataFactory::create_batch(&storage, BatchConfig::default());
///
/// // Create a specific scenario
/// let scenario = TestDataFactory::create_similarity_scenario(&storage);
/// ```
pub struct TestDataFactory;

/// Configuration for batch memory generation
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of memories to create
    pub count: usize,
    /// Base content prefix
    pub content_prefix: String,
    /// Whether to attach embedding vectors
    pub with_embeddings: bool,
    /// Angle step between consecutive embeddings, in radians. Small steps
    /// make neighbors similar, large steps spread them apart.
    pub angle_step: f64,
    /// Owning agent for every memory in the batch
    pub agent_id: Option<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            count: 10,
            content_prefix: "Test memory".to_string(),
            with_embeddings: false,
            angle_step: 0.3,
            agent_id: None,
        }
    }
}

/// Scenario containing related test data
#[derive(Debug)]
pub struct TestScenario {
    /// IDs of created memories
    pub memory_ids: Vec<String>,
    /// Description of the scenario
    pub description: String,
    /// Metadata for test assertions
    pub metadata: HashMap<String, String>,
}

/// Unit vector at the given angle, for embeddings with a known cosine
/// similarity: cos(angle difference)
pub fn unit_embedding(angle: f64) -> Vec<f32> {
    vec![angle.cos() as f32, angle.sin() as f32]
}

impl TestDataFactory {
    // ========================================================================
    // SINGLE MEMORY CREATION
    // ========================================================================

    /// Create a single memory with no embedding
    pub fn create_memory(storage: &Storage, content: &str) -> MemoryRecord {
        storage
            .insert_memory(MemoryInput {
                content: content.to_string(),
                embedding: None,
                agent_id: None,
            })
            .expect("Failed to create test memory")
    }

    /// Create a single memory with an explicit embedding
    pub fn create_embedded(storage: &Storage, content: &str, embedding: Vec<f32>) -> MemoryRecord {
        storage
            .insert_memory(MemoryInput {
                content: content.to_string(),
                embedding: Some(embedding),
                agent_id: None,
            })
            .expect("Failed to create test memory")
    }

    // ========================================================================
    // BATCH CREATION
    // ========================================================================

    /// Create a batch of memories according to the config
    pub fn create_batch(storage: &Storage, config: BatchConfig) -> Vec<String> {
        let mut ids = Vec::with_capacity(config.count);

        for i in 0..config.count {
            let embedding = if config.with_embeddings {
                Some(unit_embedding(i as f64 * config.angle_step))
            } else {
                None
            };

            let input = MemoryInput {
                content: format!("{} {}", config.content_prefix, i),
                embedding,
                agent_id: config.agent_id.clone(),
            };

            if let Ok(memory) = storage.insert_memory(input) {
                ids.push(memory.id);
            }
        }

        ids
    }

    // ========================================================================
    // SCENARIOS
    // ========================================================================

    /// A tight similarity cluster plus one outlier
    ///
    /// The first three memories sit within 0.1 radians of each other
    /// (pairwise cosine similarity > 0.98); the outlier is orthogonal to all
    /// of them. Semantic discovery at default thresholds should link every
    /// cluster pair and never touch the outlier.
    pub fn create_similarity_scenario(storage: &Storage) -> TestScenario {
        let mut memory_ids = Vec::new();

        for (i, content) in ["cluster alpha", "cluster beta", "cluster gamma"]
            .iter()
            .enumerate()
        {
            let memory =
                Self::create_embedded(storage, content, unit_embedding(i as f64 * 0.05));
            memory_ids.push(memory.id);
        }

        let outlier =
            Self::create_embedded(storage, "outlier", unit_embedding(std::f64::consts::FRAC_PI_2));
        memory_ids.push(outlier.id);

        let mut metadata = HashMap::new();
        metadata.insert("cluster_size".to_string(), "3".to_string());
        metadata.insert("expected_pairs".to_string(), "3".to_string());

        TestScenario {
            memory_ids,
            description: "Three near-identical memories and one orthogonal outlier".to_string(),
            metadata,
        }
    }

    /// A burst of temporally close memories plus one distant straggler
    ///
    /// The first three memories were created within an hour of each other;
    /// the straggler is a week older. Temporal discovery with a small window
    /// should link only pairs within the burst.
    pub fn create_timeline_scenario(storage: &Storage) -> TestScenario {
        use chrono::{Duration, Utc};

        let now = Utc::now();
        let mut memory_ids = Vec::new();

        let stamps = [
            ("burst one", now - Duration::minutes(60)),
            ("burst two", now - Duration::minutes(40)),
            ("burst three", now - Duration::minutes(10)),
            ("straggler", now - Duration::days(7)),
        ];
        for (content, created_at) in stamps {
            let memory = storage
                .insert_memory_at(
                    MemoryInput {
                        content: content.to_string(),
                        embedding: None,
                        agent_id: None,
                    },
                    created_at,
                )
                .expect("Failed to create test memory");
            memory_ids.push(memory.id);
        }

        let mut metadata = HashMap::new();
        metadata.insert("burst_size".to_string(), "3".to_string());
        metadata.insert("expected_pairs".to_string(), "3".to_string());

        TestScenario {
            memory_ids,
            description: "A one-hour burst of three memories and a week-old straggler".to_string(),
            metadata,
        }
    }

    /// A pair of memories observed activating together `observations` times
    pub fn create_coactivation_scenario(storage: &Storage, observations: usize) -> TestScenario {
        let first = Self::create_memory(storage, "co-activated first");
        let second = Self::create_memory(storage, "co-activated second");
        let members = vec![first.id.clone(), second.id.clone()];

        for _ in 0..observations {
            storage
                .record_coactivation(&members)
                .expect("Failed to record co-activation");
        }

        let mut metadata = HashMap::new();
        metadata.insert("observations".to_string(), observations.to_string());

        TestScenario {
            memory_ids: members,
            description: format!("Two memories co-activated {} times", observations),
            metadata,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::db_manager::TestDatabaseManager;
    use reverie_core::cosine_similarity;

    #[test]
    fn test_unit_embeddings_have_known_similarity() {
        let a = unit_embedding(0.0);
        let b = unit_embedding(0.1);
        let similarity = cosine_similarity(&a, &b);
        assert!((similarity - 0.1f64.cos()).abs() < 1e-6);
    }

    #[test]
    fn test_create_batch_with_embeddings() {
        let db = TestDatabaseManager::new_temp();
        let ids = TestDataFactory::create_batch(
            &db.storage,
            BatchConfig {
                count: 4,
                with_embeddings: true,
                ..Default::default()
            },
        );
        assert_eq!(ids.len(), 4);
        for id in &ids {
            assert!(db.storage.get_memory_embedding(id).unwrap().is_some());
        }
    }

    #[test]
    fn test_similarity_scenario_shape() {
        let db = TestDatabaseManager::new_temp();
        let scenario = TestDataFactory::create_similarity_scenario(&db.storage);
        assert_eq!(scenario.memory_ids.len(), 4);
        assert_eq!(scenario.metadata["expected_pairs"], "3");
    }

    #[test]
    fn test_coactivation_scenario_counts() {
        let db = TestDatabaseManager::new_temp();
        let scenario = TestDataFactory::create_coactivation_scenario(&db.storage, 3);
        let groups = db.storage.find_coactivation_groups(3).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 3);
        assert_eq!(groups[0].member_ids.len(), scenario.memory_ids.len());
    }
}
