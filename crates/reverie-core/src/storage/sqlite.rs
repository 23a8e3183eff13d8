//! SQLite Storage Implementation
//!
//! Owns the memories table, the association graph, co-activation counters,
//! and the dream run log. All strength clamping happens here, in SQL, so no
//! caller can write an out-of-range edge.

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

use crate::dream::DreamLog;
use crate::embedding::{cosine_similarity, embedding_from_bytes, embedding_to_bytes};
use crate::graph::{CoactivationGroup, Connection as ConnectionRecord, ConnectionKind, SimilarPair};
use crate::memory::{EndpointKind, MemoryInput, MemoryRecord};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid timestamp
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Rejected input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
    /// A consolidation run already holds the run guard
    #[error("A dream consolidation run is already in progress")]
    DreamInProgress,
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// STORAGE
// ============================================================================

/// Main storage struct
///
/// Uses separate reader/writer connections for interior mutability.
/// All methods take `&self` (not `&mut self`), making Storage `Send + Sync`
/// so the MCP layer can use `Arc<Storage>` instead of `Arc<Mutex<Storage>>`.
pub struct Storage {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
}

impl Storage {
    /// Apply PRAGMAs and optional encryption to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        // Apply encryption key if SQLCipher is enabled and key is provided
        #[cfg(feature = "encryption")]
        {
            if let Ok(key) = std::env::var("REVERIE_ENCRYPTION_KEY") {
                if !key.is_empty() {
                    conn.pragma_update(None, "key", &key)?;
                }
            }
        }

        // Configure SQLite for performance
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;

        Ok(())
    }

    /// Create new storage instance
    ///
    /// `db_path` is the database file; when `None`, a platform data directory
    /// is created and `reverie.db` placed inside it.
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("com", "reverie", "core").ok_or_else(|| {
                    StorageError::Init("Could not determine project directories".to_string())
                })?;

                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                // Restrict directory permissions to owner-only on Unix
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let perms = std::fs::Permissions::from_mode(0o700);
                    let _ = std::fs::set_permissions(data_dir, perms);
                }
                data_dir.join("reverie.db")
            }
        };

        // Open writer connection
        let writer_conn = Connection::open(&path)?;

        // Restrict database file permissions to owner-only on Unix
        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        Self::configure_connection(&writer_conn)?;

        // Apply migrations on writer only
        super::migrations::apply_migrations(&writer_conn)?;

        // Open reader connection to same path
        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
        })
    }

    // ========================================================================
    // MEMORIES
    // ========================================================================

    /// Store a new memory, stamped with the current time
    pub fn insert_memory(&self, input: MemoryInput) -> Result<MemoryRecord> {
        self.insert_memory_at(input, Utc::now())
    }

    /// Store a new memory with an explicit creation time
    ///
    /// Import and backfill paths need the original timestamp; temporal
    /// discovery reads it.
    pub fn insert_memory_at(
        &self,
        input: MemoryInput,
        created_at: DateTime<Utc>,
    ) -> Result<MemoryRecord> {
        let id = Uuid::new_v4().to_string();
        let embedding_bytes = input.embedding.as_deref().map(embedding_to_bytes);
        let has_embedding = embedding_bytes.is_some();

        let writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        writer.execute(
            "INSERT INTO memories (id, content, agent_id, embedding, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                input.content,
                input.agent_id,
                embedding_bytes,
                created_at.to_rfc3339()
            ],
        )?;

        Ok(MemoryRecord {
            id,
            content: input.content,
            agent_id: input.agent_id,
            created_at,
            has_embedding,
        })
    }

    /// Fetch a memory by id
    pub fn get_memory(&self, id: &str) -> Result<MemoryRecord> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        reader
            .query_row(
                "SELECT id, content, agent_id, created_at, embedding IS NOT NULL
                 FROM memories WHERE id = ?1",
                params![id],
                row_to_memory,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("Memory {}", id)))
    }

    /// Fetch a memory's embedding vector, if one is stored
    pub fn get_memory_embedding(&self, id: &str) -> Result<Option<Vec<f32>>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let bytes: Option<Vec<u8>> = reader
            .query_row(
                "SELECT embedding FROM memories WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("Memory {}", id)))?;

        Ok(bytes.as_deref().and_then(embedding_from_bytes))
    }

    /// Count stored memories
    pub fn count_memories(&self) -> Result<i64> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let count = reader.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Substring search over memory content, newest first
    pub fn search_memories(&self, query: &str, limit: usize) -> Result<Vec<MemoryRecord>> {
        let pattern = format!("%{}%", escape_like(query));
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(
            "SELECT id, content, agent_id, created_at, embedding IS NOT NULL
             FROM memories
             WHERE content LIKE ?1 ESCAPE '\\'
             ORDER BY created_at DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![pattern, limit as i64], row_to_memory)?;
        let mut memories = Vec::new();
        for row in rows {
            memories.push(row?);
        }
        Ok(memories)
    }

    // ========================================================================
    // EDGE REINFORCEMENT
    // ========================================================================

    /// Create or strengthen a directed edge
    ///
    /// Creates the edge with `clamp(delta, 0, 1)` on first use; otherwise adds
    /// `delta` (which may be negative), clamps to [0, 1], refreshes the
    /// last-used timestamp, and bumps the use counter. `kind` is only written
    /// at creation.
    pub fn reinforce_edge(
        &self,
        source_id: &str,
        source_kind: EndpointKind,
        target_id: &str,
        target_kind: EndpointKind,
        delta: f64,
        kind: ConnectionKind,
    ) -> Result<()> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        upsert_edge(
            &writer,
            source_id,
            source_kind,
            target_id,
            target_kind,
            delta,
            kind,
        )?;
        Ok(())
    }

    /// Create or strengthen both directions of a memory pair in one transaction
    ///
    /// Discovery announces pairs, not directions; writing A→B and B→A inside
    /// a single transaction means a crash can never leave half a pair.
    pub fn reinforce_edge_pair(
        &self,
        id_a: &str,
        id_b: &str,
        delta: f64,
        kind: ConnectionKind,
    ) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        let tx = writer.transaction()?;
        for (source, target) in [(id_a, id_b), (id_b, id_a)] {
            upsert_edge(
                &tx,
                source,
                EndpointKind::Memory,
                target,
                EndpointKind::Memory,
                delta,
                kind,
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Fetch one directed edge, if present
    pub fn get_connection(
        &self,
        source_id: &str,
        source_kind: EndpointKind,
        target_id: &str,
        target_kind: EndpointKind,
    ) -> Result<Option<ConnectionRecord>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let conn = reader
            .query_row(
                "SELECT source_id, source_kind, target_id, target_kind, kind,
                        strength, created_at, last_used_at, use_count
                 FROM connections
                 WHERE source_id = ?1 AND source_kind = ?2
                   AND target_id = ?3 AND target_kind = ?4",
                params![
                    source_id,
                    source_kind.as_str(),
                    target_id,
                    target_kind.as_str()
                ],
                row_to_connection,
            )
            .optional()?;
        Ok(conn)
    }

    /// Count stored edges
    pub fn count_connections(&self) -> Result<i64> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let count = reader.query_row("SELECT COUNT(*) FROM connections", [], |row| row.get(0))?;
        Ok(count)
    }

    /// All memory-to-memory edges whose endpoints are both in `ids`
    pub fn connections_for_memories(&self, ids: &[String]) -> Result<Vec<ConnectionRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "SELECT source_id, source_kind, target_id, target_kind, kind,
                    strength, created_at, last_used_at, use_count
             FROM connections
             WHERE source_kind = 'memory' AND target_kind = 'memory'
               AND source_id IN ({placeholders})
               AND target_id IN ({placeholders})
             ORDER BY strength DESC"
        );

        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(&sql)?;
        let rows = stmt.query_map(
            params_from_iter(ids.iter().chain(ids.iter())),
            row_to_connection,
        )?;

        let mut connections = Vec::new();
        for row in rows {
            connections.push(row?);
        }
        Ok(connections)
    }

    // ========================================================================
    // DISCOVERY QUERIES
    // ========================================================================

    /// Memory pairs with similarity >= threshold and no edge in either direction
    ///
    /// Sorted by similarity descending so the batch cap keeps the strongest
    /// candidates. Memories without embeddings never qualify.
    pub fn find_similar_unconnected_pairs(
        &self,
        threshold: f64,
        limit: usize,
    ) -> Result<Vec<SimilarPair>> {
        self.scan_unconnected_similar(None, threshold, limit)
    }

    /// Agent-scoped variant used by the graph-building tool surface
    pub fn find_similar_unconnected_pairs_filtered(
        &self,
        agent_id: Option<&str>,
        threshold: f64,
        limit: usize,
    ) -> Result<Vec<SimilarPair>> {
        self.scan_unconnected_similar(agent_id, threshold, limit)
    }

    fn scan_unconnected_similar(
        &self,
        agent_id: Option<&str>,
        threshold: f64,
        limit: usize,
    ) -> Result<Vec<SimilarPair>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;

        let mut stmt = reader.prepare(
            "SELECT id, embedding FROM memories
             WHERE embedding IS NOT NULL
               AND (?1 IS NULL OR agent_id = ?1)
             ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![agent_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;

        let mut embeddings: Vec<(String, Vec<f32>)> = Vec::new();
        for row in rows {
            let (id, bytes) = row?;
            if let Some(vector) = embedding_from_bytes(&bytes) {
                embeddings.push((id, vector));
            }
        }
        drop(stmt);

        // Existing memory<->memory edges, both orientations, for the
        // unconnected filter
        let mut edge_stmt = reader.prepare(
            "SELECT source_id, target_id FROM connections
             WHERE source_kind = 'memory' AND target_kind = 'memory'",
        )?;
        let edge_rows = edge_stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut connected: HashSet<(String, String)> = HashSet::new();
        for row in edge_rows {
            let (source, target) = row?;
            connected.insert((source, target));
        }

        let mut pairs = Vec::new();
        for i in 0..embeddings.len() {
            for j in (i + 1)..embeddings.len() {
                let (id_a, vec_a) = &embeddings[i];
                let (id_b, vec_b) = &embeddings[j];
                if connected.contains(&(id_a.clone(), id_b.clone()))
                    || connected.contains(&(id_b.clone(), id_a.clone()))
                {
                    continue;
                }
                let similarity = cosine_similarity(vec_a, vec_b);
                if similarity >= threshold {
                    pairs.push(SimilarPair {
                        id_a: id_a.clone(),
                        id_b: id_b.clone(),
                        similarity,
                    });
                }
            }
        }

        pairs.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id_a.cmp(&b.id_a))
                .then_with(|| a.id_b.cmp(&b.id_b))
        });
        pairs.truncate(limit);

        Ok(pairs)
    }

    /// Memory pairs created within `window_hours` of each other and not yet
    /// connected in either direction
    pub fn find_temporally_unconnected_pairs(
        &self,
        window_hours: f64,
        limit: usize,
    ) -> Result<Vec<(String, String)>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(
            "SELECT a.id, b.id
             FROM memories a
             JOIN memories b ON a.id < b.id
             WHERE ABS(julianday(a.created_at) - julianday(b.created_at)) * 24.0 <= ?1
               AND NOT EXISTS (
                   SELECT 1 FROM connections c
                   WHERE c.source_kind = 'memory' AND c.target_kind = 'memory'
                     AND ((c.source_id = a.id AND c.target_id = b.id)
                       OR (c.source_id = b.id AND c.target_id = a.id))
               )
             ORDER BY a.created_at, b.created_at
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![window_hours, limit as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut pairs = Vec::new();
        for row in rows {
            pairs.push(row?);
        }
        Ok(pairs)
    }

    // ========================================================================
    // CO-ACTIVATION
    // ========================================================================

    /// Record one joint activation of a memory set, returning the running count
    ///
    /// The set is keyed by its sorted member list, so observation order never
    /// splits a group across rows.
    pub fn record_coactivation(&self, member_ids: &[String]) -> Result<i64> {
        if member_ids.len() < 2 {
            return Err(StorageError::InvalidInput(
                "A co-activation needs at least 2 members".to_string(),
            ));
        }

        let mut sorted: Vec<String> = member_ids.to_vec();
        sorted.sort();
        sorted.dedup();
        if sorted.len() < 2 {
            return Err(StorageError::InvalidInput(
                "A co-activation needs at least 2 distinct members".to_string(),
            ));
        }

        let member_key = sorted.join("|");
        let members_json =
            serde_json::to_string(&sorted).unwrap_or_else(|_| "[]".to_string());
        let now = Utc::now().to_rfc3339();

        let writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        writer.execute(
            "INSERT INTO coactivations (member_key, member_ids, count, last_observed_at)
             VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(member_key) DO UPDATE SET
                 count = count + 1,
                 last_observed_at = ?3",
            params![member_key, members_json, now],
        )?;

        let count = writer.query_row(
            "SELECT count FROM coactivations WHERE member_key = ?1",
            params![member_key],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Memory groups observed together at least `min_count` times
    pub fn find_coactivation_groups(&self, min_count: i64) -> Result<Vec<CoactivationGroup>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(
            "SELECT member_ids, count FROM coactivations
             WHERE count >= ?1
             ORDER BY count DESC, member_key",
        )?;

        let rows = stmt.query_map(params![min_count], |row| {
            let members_json: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((members_json, count))
        })?;

        let mut groups = Vec::new();
        for row in rows {
            let (members_json, count) = row?;
            let member_ids: Vec<String> =
                serde_json::from_str(&members_json).unwrap_or_default();
            groups.push(CoactivationGroup { member_ids, count });
        }
        Ok(groups)
    }

    // ========================================================================
    // PRUNING
    // ========================================================================

    /// Delete edges that are both weaker than `min_strength` and unused for
    /// more than `days_unused` days
    ///
    /// Both conditions must hold. Returns the number of edges removed.
    pub fn prune_edges(&self, min_strength: f64, days_unused: i64) -> Result<usize> {
        let cutoff = (Utc::now() - Duration::days(days_unused)).to_rfc3339();
        let writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        let removed = writer.execute(
            "DELETE FROM connections
             WHERE strength < ?1 AND last_used_at < ?2",
            params![min_strength, cutoff],
        )?;
        Ok(removed)
    }

    // ========================================================================
    // DREAM RUN LOG
    // ========================================================================

    /// Open a new run record holding only the start timestamp
    pub fn insert_dream_log(&self, started_at: DateTime<Utc>) -> Result<i64> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        writer.execute(
            "INSERT INTO dream_log (started_at) VALUES (?1)",
            params![started_at.to_rfc3339()],
        )?;
        Ok(writer.last_insert_rowid())
    }

    /// Overwrite a run record's counters, notes and (optionally) completion time
    ///
    /// The failure path calls this with `completed_at = None` so partial
    /// progress is persisted while the record stays open-ended.
    #[allow(clippy::too_many_arguments)]
    pub fn update_dream_log(
        &self,
        id: i64,
        connections_created: i64,
        connections_strengthened: i64,
        connections_pruned: i64,
        concepts_created: i64,
        notes: &[String],
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let notes_json = serde_json::to_string(notes).unwrap_or_else(|_| "[]".to_string());
        let writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        let rows = writer.execute(
            "UPDATE dream_log SET
                connections_created = ?1,
                connections_strengthened = ?2,
                connections_pruned = ?3,
                concepts_created = ?4,
                notes = ?5,
                completed_at = ?6
             WHERE id = ?7",
            params![
                connections_created,
                connections_strengthened,
                connections_pruned,
                concepts_created,
                notes_json,
                completed_at.map(|t| t.to_rfc3339()),
                id
            ],
        )?;

        if rows == 0 {
            return Err(StorageError::NotFound(format!("Dream log {}", id)));
        }
        Ok(())
    }

    /// Fetch one run record by id
    pub fn get_dream_log(&self, id: i64) -> Result<DreamLog> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        reader
            .query_row(
                "SELECT id, started_at, completed_at, connections_created,
                        connections_strengthened, connections_pruned,
                        concepts_created, notes
                 FROM dream_log WHERE id = ?1",
                params![id],
                row_to_dream_log,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("Dream log {}", id)))
    }

    /// Recent run records, most recent start first
    pub fn list_recent_runs(&self, limit: usize) -> Result<Vec<DreamLog>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(
            "SELECT id, started_at, completed_at, connections_created,
                    connections_strengthened, connections_pruned,
                    concepts_created, notes
             FROM dream_log
             ORDER BY started_at DESC, id DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], row_to_dream_log)?;
        let mut runs = Vec::new();
        for row in rows {
            runs.push(row?);
        }
        Ok(runs)
    }

    /// Raw SQL hook for tests that need to break or backdate state
    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> Result<()> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        writer.execute_batch(sql)?;
        Ok(())
    }

    /// The most recently completed run, if any
    pub fn last_completed_run(&self) -> Result<Option<DreamLog>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let run = reader
            .query_row(
                "SELECT id, started_at, completed_at, connections_created,
                        connections_strengthened, connections_pruned,
                        concepts_created, notes
                 FROM dream_log
                 WHERE completed_at IS NOT NULL
                 ORDER BY completed_at DESC, id DESC
                 LIMIT 1",
                [],
                row_to_dream_log,
            )
            .optional()?;
        Ok(run)
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn parse_dt(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_memory(row: &rusqlite::Row) -> rusqlite::Result<MemoryRecord> {
    Ok(MemoryRecord {
        id: row.get(0)?,
        content: row.get(1)?,
        agent_id: row.get(2)?,
        created_at: parse_dt(row.get(3)?),
        has_embedding: row.get(4)?,
    })
}

fn row_to_connection(row: &rusqlite::Row) -> rusqlite::Result<ConnectionRecord> {
    Ok(ConnectionRecord {
        source_id: row.get(0)?,
        source_kind: row.get(1)?,
        target_id: row.get(2)?,
        target_kind: row.get(3)?,
        kind: row.get(4)?,
        strength: row.get(5)?,
        created_at: parse_dt(row.get(6)?),
        last_used_at: parse_dt(row.get(7)?),
        use_count: row.get(8)?,
    })
}

fn row_to_dream_log(row: &rusqlite::Row) -> rusqlite::Result<DreamLog> {
    let completed: Option<String> = row.get(2)?;
    let notes_json: String = row.get(7)?;
    Ok(DreamLog {
        id: row.get(0)?,
        started_at: parse_dt(row.get(1)?),
        completed_at: completed.map(parse_dt),
        connections_created: row.get(3)?,
        connections_strengthened: row.get(4)?,
        connections_pruned: row.get(5)?,
        concepts_created: row.get(6)?,
        notes: serde_json::from_str(&notes_json).unwrap_or_default(),
    })
}

/// Shared UPSERT used by both single-edge and pair reinforcement
fn upsert_edge(
    conn: &Connection,
    source_id: &str,
    source_kind: EndpointKind,
    target_id: &str,
    target_kind: EndpointKind,
    delta: f64,
    kind: ConnectionKind,
) -> rusqlite::Result<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO connections
             (source_id, source_kind, target_id, target_kind, kind,
              strength, created_at, last_used_at, use_count)
         VALUES (?1, ?2, ?3, ?4, ?5, MIN(MAX(?6, 0.0), 1.0), ?7, ?7, 1)
         ON CONFLICT(source_id, source_kind, target_id, target_kind) DO UPDATE SET
             strength = MIN(MAX(strength + ?6, 0.0), 1.0),
             last_used_at = ?7,
             use_count = use_count + 1",
        params![
            source_id,
            source_kind.as_str(),
            target_id,
            target_kind.as_str(),
            kind.as_str(),
            delta,
            now
        ],
    )?;
    Ok(())
}

/// Escape LIKE wildcards so user queries match literally
fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// ============================================================================
// TESTS
// ============================================================================
