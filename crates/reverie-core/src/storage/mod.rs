//! Storage Module
//!
//! SQLite-based storage layer with:
//! - Memory records with embedded f32 blob vectors
//! - Directed association edges with clamped strengths
//! - Co-activation observation counters
//! - Dream run audit log

mod migrations;
mod sqlite;

pub use migrations::MIGRATIONS;
pub use sqlite::{Result, Storage, StorageError};
