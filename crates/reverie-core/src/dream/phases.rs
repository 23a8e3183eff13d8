//! Consolidation Phases
//!
//! The four graph passes a dream run executes, in this order:
//! 1. **Semantic Discovery**: link unconnected memory pairs that are close in
//!    embedding space
//! 2. **Temporal Discovery**: link unconnected memory pairs created close in time
//! 3. **Co-activation Reinforcement**: strengthen edges inside groups of
//!    memories that keep being used together
//! 4. **Decay Pruning**: drop edges that are both weak and long unused
//!
//! Each phase is a free function over the store handle returning the number of
//! edge writes (or deletes) it performed. Counters and notes belong to the
//! orchestrator; phases never touch the run record.

use crate::graph::ConnectionKind;
use crate::memory::EndpointKind;
use crate::storage::{Result, Storage};

/// Maximum discovered pairs per phase per run
pub const DISCOVERY_BATCH_LIMIT: usize = 100;

/// Discovered semantic links start weak: initial strength = similarity x this
pub const SEMANTIC_STRENGTH_FACTOR: f64 = 0.3;

/// Fixed initial strength for temporal links, regardless of the time gap
pub const TEMPORAL_INITIAL_STRENGTH: f64 = 0.2;

/// Cap on any single co-activation reinforcement
pub const COACTIVATION_BONUS_CAP: f64 = 0.15;

/// Per-observation co-activation bonus before the cap
pub const COACTIVATION_BONUS_STEP: f64 = 0.02;

/// Phase 1: create weak bidirectional semantic edges between similar,
/// unconnected memory pairs
///
/// Returns the number of directed edges written, twice the pair count.
pub fn discover_semantic(storage: &Storage, threshold: f64) -> Result<usize> {
    let pairs = storage.find_similar_unconnected_pairs(threshold, DISCOVERY_BATCH_LIMIT)?;
    for pair in &pairs {
        let strength = pair.similarity * SEMANTIC_STRENGTH_FACTOR;
        storage.reinforce_edge_pair(&pair.id_a, &pair.id_b, strength, ConnectionKind::Semantic)?;
    }
    Ok(pairs.len() * 2)
}

/// Phase 2: create weak bidirectional temporal edges between unconnected
/// memory pairs created within `window_hours` of each other
pub fn discover_temporal(storage: &Storage, window_hours: f64) -> Result<usize> {
    let pairs = storage.find_temporally_unconnected_pairs(window_hours, DISCOVERY_BATCH_LIMIT)?;
    for (id_a, id_b) in &pairs {
        storage.reinforce_edge_pair(id_a, id_b, TEMPORAL_INITIAL_STRENGTH, ConnectionKind::Temporal)?;
    }
    Ok(pairs.len() * 2)
}

/// Phase 3: strengthen every pairwise edge within groups observed together at
/// least `min_count` times
///
/// Direction-agnostic, unlike discovery: one reinforcement per unordered pair.
/// The bonus grows with the observation count but never exceeds the cap.
/// Quadratic in group size; groups are expected to be small.
pub fn reinforce_coactivated(storage: &Storage, min_count: i64) -> Result<usize> {
    let groups = storage.find_coactivation_groups(min_count)?;
    let mut reinforced = 0;
    for group in &groups {
        if group.member_ids.len() < 2 {
            continue;
        }
        let bonus = (group.count as f64 * COACTIVATION_BONUS_STEP).min(COACTIVATION_BONUS_CAP);
        for i in 0..group.member_ids.len() {
            for j in (i + 1)..group.member_ids.len() {
                storage.reinforce_edge(
                    &group.member_ids[i],
                    EndpointKind::Memory,
                    &group.member_ids[j],
                    EndpointKind::Memory,
                    bonus,
                    ConnectionKind::Semantic,
                )?;
                reinforced += 1;
            }
        }
    }
    Ok(reinforced)
}

/// Phase 4: delete edges that are both weaker than `min_strength` and unused
/// for more than `days_unused` days
pub fn prune_weak(storage: &Storage, min_strength: f64, days_unused: i64) -> Result<usize> {
    storage.prune_edges(min_strength, days_unused)
}
