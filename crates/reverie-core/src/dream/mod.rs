//! Dream Consolidation
//!
//! Offline maintenance of the association graph, run while no one is asking
//! questions. A dream executes four phases in strict order (semantic
//! discovery, temporal discovery, co-activation reinforcement, decay pruning),
//! aggregates their counters, and persists an audit record per run. Later
//! phases see the edges earlier phases wrote, so the order is load-bearing.
//!
//! A run is at-least-once, not atomic: a failing phase aborts the run and
//! leaves earlier phases' edge writes in place, with the run record kept
//! open-ended as the visible trace.

pub mod phases;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{Result, Storage, StorageError};

/// Default minimum cosine similarity for semantic discovery
pub const DEFAULT_SEMANTIC_THRESHOLD: f64 = 0.85;

/// Default temporal proximity window (hours)
pub const DEFAULT_TEMPORAL_WINDOW_HOURS: f64 = 4.0;

/// Default minimum joint-activation count for co-activation reinforcement
pub const DEFAULT_COACTIVATION_MIN_COUNT: i64 = 3;

/// Default strength floor for pruning
pub const DEFAULT_PRUNE_MIN_STRENGTH: f64 = 0.05;

/// Default unused-duration floor for pruning (days)
pub const DEFAULT_PRUNE_DAYS_UNUSED: i64 = 30;

// ============================================================================
// RUN CONFIGURATION
// ============================================================================

/// Per-run knobs, each independently overridable
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamOptions {
    /// Minimum cosine similarity to create a semantic edge
    pub semantic_threshold: f64,
    /// Maximum creation-time gap for temporal edge creation, in hours
    pub temporal_window_hours: f64,
    /// Minimum observed co-activation frequency to qualify for reinforcement
    pub coactivation_min_count: i64,
    /// Strength floor for pruning eligibility
    pub prune_min_strength: f64,
    /// Unused-duration floor for pruning eligibility, in days
    pub prune_days_unused: i64,
}

impl Default for DreamOptions {
    fn default() -> Self {
        Self {
            semantic_threshold: DEFAULT_SEMANTIC_THRESHOLD,
            temporal_window_hours: DEFAULT_TEMPORAL_WINDOW_HOURS,
            coactivation_min_count: DEFAULT_COACTIVATION_MIN_COUNT,
            prune_min_strength: DEFAULT_PRUNE_MIN_STRENGTH,
            prune_days_unused: DEFAULT_PRUNE_DAYS_UNUSED,
        }
    }
}

// ============================================================================
// RUN RECORD
// ============================================================================

/// Audit record for one consolidation run
///
/// An absent completion timestamp marks a run that is still going or died
/// mid-flight. Counters on an open-ended record reflect only the phases that
/// finished before the failure.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamLog {
    pub id: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub connections_created: i64,
    pub connections_strengthened: i64,
    pub connections_pruned: i64,
    /// Always 0. Reserved for concept clustering, a declared future phase.
    pub concepts_created: i64,
    /// One human-readable note per executed phase, plus an error note on failure
    pub notes: Vec<String>,
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

/// Runs dream consolidation cycles, one at a time
///
/// The atomic guard gives run-level mutual exclusion: a second `run` while one
/// is in flight fails fast with [`StorageError::DreamInProgress`] instead of
/// racing the first over the same edges.
pub struct Dreamer {
    storage: Arc<Storage>,
    is_running: AtomicBool,
}

impl Dreamer {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            is_running: AtomicBool::new(false),
        }
    }

    /// Whether a run currently holds the guard
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Execute one full consolidation run
    ///
    /// Persists an open run record before the first phase, executes the four
    /// phases in order, then closes the record with final counters and notes.
    /// On phase failure the original error propagates; partial counters and an
    /// error note are flushed best-effort and the record stays open-ended.
    pub fn run(&self, options: &DreamOptions) -> Result<DreamLog> {
        if self
            .is_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(StorageError::DreamInProgress);
        }

        let result = self.run_exclusive(options);
        self.is_running.store(false, Ordering::SeqCst);
        result
    }

    fn run_exclusive(&self, options: &DreamOptions) -> Result<DreamLog> {
        let started_at = Utc::now();
        let id = self.storage.insert_dream_log(started_at)?;
        tracing::info!(run_id = id, "Dream consolidation starting");

        let mut log = DreamLog {
            id,
            started_at,
            completed_at: None,
            connections_created: 0,
            connections_strengthened: 0,
            connections_pruned: 0,
            concepts_created: 0,
            notes: Vec::new(),
        };

        if let Err(e) = self.run_phases(options, &mut log) {
            tracing::warn!(run_id = id, error = %e, "Dream consolidation failed");
            log.notes.push(format!("Dream failed: {}", e));
            // Best-effort flush; the original phase error is what the caller sees
            let _ = self.storage.update_dream_log(
                id,
                log.connections_created,
                log.connections_strengthened,
                log.connections_pruned,
                log.concepts_created,
                &log.notes,
                None,
            );
            return Err(e);
        }

        let completed_at = Utc::now();
        self.storage.update_dream_log(
            id,
            log.connections_created,
            log.connections_strengthened,
            log.connections_pruned,
            log.concepts_created,
            &log.notes,
            Some(completed_at),
        )?;
        log.completed_at = Some(completed_at);

        tracing::info!(
            run_id = id,
            created = log.connections_created,
            strengthened = log.connections_strengthened,
            pruned = log.connections_pruned,
            "Dream consolidation complete"
        );
        Ok(log)
    }

    fn run_phases(&self, options: &DreamOptions, log: &mut DreamLog) -> Result<()> {
        let created = phases::discover_semantic(&self.storage, options.semantic_threshold)?;
        log.connections_created += created as i64;
        log.notes
            .push(format!("Created {} semantic connections", created));

        let created = phases::discover_temporal(&self.storage, options.temporal_window_hours)?;
        log.connections_created += created as i64;
        log.notes
            .push(format!("Created {} temporal connections", created));

        let strengthened =
            phases::reinforce_coactivated(&self.storage, options.coactivation_min_count)?;
        log.connections_strengthened += strengthened as i64;
        log.notes
            .push(format!("Strengthened {} co-activated connections", strengthened));

        let pruned = phases::prune_weak(
            &self.storage,
            options.prune_min_strength,
            options.prune_days_unused,
        )?;
        log.connections_pruned += pruned as i64;
        log.notes.push(format!("Pruned {} weak connections", pruned));

        // Concept clustering would run here; it is unimplemented and always
        // contributes 0 to concepts_created
        Ok(())
    }
}
