//! Memory records - the endpoints of the association graph
//!
//! A memory is an opaque unit of content with an embedding vector and a
//! creation timestamp. The consolidation engine never mutates memories;
//! it only wires them together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// ENDPOINT KINDS
// ============================================================================

/// Kinds of graph endpoints an edge can attach to
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// A stored memory record
    #[default]
    Memory,
    /// An abstract concept distilled from memories (reserved for the
    /// clustering phase, which is not implemented yet)
    Concept,
}

impl EndpointKind {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::Memory => "memory",
            EndpointKind::Concept => "concept",
        }
    }

    /// Parse from string name
    pub fn parse_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "concept" => EndpointKind::Concept,
            _ => EndpointKind::Memory,
        }
    }
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// MEMORY RECORD
// ============================================================================

/// A memory as seen by the graph layer
///
/// The embedding itself stays in the database as a blob; records only carry
/// a flag saying whether one exists.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRecord {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// The remembered content
    pub content: String,
    /// Owning agent, when the caller partitions memories per agent
    pub agent_id: Option<String>,
    /// When the memory was created
    pub created_at: DateTime<Utc>,
    /// Whether an embedding vector is stored for this memory
    pub has_embedding: bool,
}

// ============================================================================
// INPUT TYPES
// ============================================================================

/// Input for storing a new memory
///
/// Uses `deny_unknown_fields` to prevent field injection attacks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MemoryInput {
    /// The content to remember
    pub content: String,
    /// Embedding vector, produced by the caller's embedding pipeline.
    /// Memories without one never qualify for semantic discovery.
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    /// Owning agent identifier
    #[serde(default)]
    pub agent_id: Option<String>,
}

// ============================================================================
// TESTS
// ============================================================================
