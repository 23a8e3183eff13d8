//! # Reverie Core
//!
//! Association graph engine for AI memory systems. Memories live elsewhere;
//! Reverie owns the weighted edges between them and the offline "dreaming"
//! that maintains those edges:
//!
//! - **Semantic Discovery**: link memories that are close in embedding space
//! - **Temporal Discovery**: link memories created close together in time
//! - **Co-activation Reinforcement**: strengthen links that keep firing together
//! - **Decay Pruning**: forget links that are weak and long unused
//!
//! Every run is persisted as a [`DreamLog`] audit record, so the graph's
//! history stays observable.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use reverie_core::{Dreamer, DreamOptions, MemoryInput, Storage};
//!
//! // Create storage (uses default platform-specific location)
//! let storage = Arc::new(Storage::new(None)?);
//!
//! // Register a memory with its embedding
//! let memory = storage.insert_memory(MemoryInput {
//!     content: "The borrow checker rejects aliased mutation".to_string(),
//!     embedding: Some(embedding),
//!     agent_id: None,
//! })?;
//!
//! // Run one consolidation cycle
//! let dreamer = Dreamer::new(storage.clone());
//! let log = dreamer.run(&DreamOptions::default())?;
//! println!("Created {} connections", log.connections_created);
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): Compile SQLite from source for portability
//! - `encryption`: SQLCipher at-rest encryption, keyed via `REVERIE_ENCRYPTION_KEY`

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod dream;
pub mod embedding;
pub mod graph;
pub mod memory;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Memory types
pub use memory::{EndpointKind, MemoryInput, MemoryRecord};

// Graph types
pub use graph::{CoactivationGroup, Connection, ConnectionKind, SimilarPair};

// Embedding helpers
pub use embedding::{cosine_similarity, embedding_from_bytes, embedding_to_bytes};

// Storage layer
pub use storage::{Result, Storage, StorageError};

// Dream consolidation
pub use dream::{DreamLog, DreamOptions, Dreamer};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        Connection, ConnectionKind, DreamLog, DreamOptions, Dreamer, EndpointKind, MemoryInput,
        MemoryRecord, Result, Storage, StorageError,
    };
}
