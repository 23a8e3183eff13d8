//! Database Migrations
//!
//! Schema migration definitions for the storage layer.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema - memories and association graph",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Dream run log for consolidation audit trail",
        up: MIGRATION_V2_UP,
    },
    Migration {
        version: 3,
        description: "Co-activation observation counters",
        up: MIGRATION_V3_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS memories (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    agent_id TEXT,
    embedding BLOB,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_memories_created ON memories(created_at);
CREATE INDEX IF NOT EXISTS idx_memories_agent ON memories(agent_id);

-- Directed association edges. No foreign keys: endpoints are polymorphic
-- over kind ('memory' today, 'concept' reserved for clustering).
CREATE TABLE IF NOT EXISTS connections (
    source_id TEXT NOT NULL,
    source_kind TEXT NOT NULL DEFAULT 'memory',
    target_id TEXT NOT NULL,
    target_kind TEXT NOT NULL DEFAULT 'memory',
    kind TEXT NOT NULL,  -- 'semantic', 'temporal'
    strength REAL NOT NULL,
    created_at TEXT NOT NULL,
    last_used_at TEXT NOT NULL,
    use_count INTEGER DEFAULT 0,
    PRIMARY KEY (source_id, source_kind, target_id, target_kind)
);

CREATE INDEX IF NOT EXISTS idx_connections_source ON connections(source_id);
CREATE INDEX IF NOT EXISTS idx_connections_target ON connections(target_id);
CREATE INDEX IF NOT EXISTS idx_connections_strength ON connections(strength);
CREATE INDEX IF NOT EXISTS idx_connections_kind ON connections(kind);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// V2: Dream run log
///
/// One row per consolidation run. completed_at stays NULL when a run fails
/// partway, which is how observers tell a finished run from an aborted one.
const MIGRATION_V2_UP: &str = r#"
CREATE TABLE IF NOT EXISTS dream_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    completed_at TEXT,
    connections_created INTEGER NOT NULL DEFAULT 0,
    connections_strengthened INTEGER NOT NULL DEFAULT 0,
    connections_pruned INTEGER NOT NULL DEFAULT 0,
    concepts_created INTEGER NOT NULL DEFAULT 0,
    notes TEXT NOT NULL DEFAULT '[]'
);

CREATE INDEX IF NOT EXISTS idx_dream_log_started ON dream_log(started_at);

UPDATE schema_version SET version = 2, applied_at = datetime('now');
"#;

/// V3: Co-activation observation counters
///
/// Keyed by the sorted member-id list so the same set always lands on the
/// same row regardless of observation order.
const MIGRATION_V3_UP: &str = r#"
CREATE TABLE IF NOT EXISTS coactivations (
    member_key TEXT PRIMARY KEY,
    member_ids TEXT NOT NULL,  -- JSON array, sorted
    count INTEGER NOT NULL DEFAULT 1,
    last_observed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_coactivations_count ON coactivations(count);

UPDATE schema_version SET version = 3, applied_at = datetime('now');
"#;

/// Get current schema version from database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );

            // Use execute_batch to handle multi-statement SQL
            conn.execute_batch(migration.up)?;

            applied += 1;
        }
    }

    Ok(applied)
}
