//! Association graph types
//!
//! Edges are directed and typed. Bidirectionality is a caller convention:
//! discovery writes A→B and B→A explicitly, it is never implied by storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CONNECTION KINDS
// ============================================================================

/// Kinds of association edges
///
/// Co-activation reinforcement reuses `Semantic`; a dedicated kind never
/// existed in the data.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    /// Discovered through embedding similarity, or reinforced by co-use
    #[default]
    Semantic,
    /// Discovered through creation-time proximity
    Temporal,
}

impl ConnectionKind {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionKind::Semantic => "semantic",
            ConnectionKind::Temporal => "temporal",
        }
    }

    /// Parse from string name
    pub fn parse_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "temporal" => ConnectionKind::Temporal,
            _ => ConnectionKind::Semantic,
        }
    }
}

impl std::fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CONNECTION RECORD
// ============================================================================

/// A directed edge of the association graph
///
/// Keyed by (source_id, source_kind, target_id, target_kind). Strength stays
/// inside [0, 1]; the storage layer clamps every write.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Source endpoint identifier
    pub source_id: String,
    /// Source endpoint kind ("memory" or "concept")
    pub source_kind: String,
    /// Target endpoint identifier
    pub target_id: String,
    /// Target endpoint kind
    pub target_kind: String,
    /// Edge kind, fixed at creation
    pub kind: String,
    /// Association strength in [0, 1]
    pub strength: f64,
    /// When the edge was first created
    pub created_at: DateTime<Utc>,
    /// Last reinforcement time
    pub last_used_at: DateTime<Utc>,
    /// How many times the edge has been reinforced
    pub use_count: i64,
}

// ============================================================================
// DISCOVERY RESULT SHAPES
// ============================================================================

/// A currently-unconnected memory pair above the similarity threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarPair {
    /// First memory id
    pub id_a: String,
    /// Second memory id
    pub id_b: String,
    /// Cosine similarity of the two embeddings
    pub similarity: f64,
}

/// A set of memories observed activating together
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoactivationGroup {
    /// Member memory ids, sorted
    pub member_ids: Vec<String>,
    /// How many times the set was observed together
    pub count: i64,
}
