//! build_temporal_graph tool — Chain memories matching a query along their
//! creation timeline.
//!
//! Consecutive matches within the time window get linked with the same fixed
//! strength the temporal discovery phase uses. When both memories carry
//! embeddings the link is additionally gated on similarity, so a week of
//! unrelated notes does not turn into one long chain.

use std::sync::Arc;

use reverie_core::dream::phases::TEMPORAL_INITIAL_STRENGTH;
use reverie_core::{cosine_similarity, ConnectionKind, Storage};

const DEFAULT_WINDOW_HOURS: f64 = 168.0;
const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;
const SEARCH_LIMIT: usize = 50;

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "Substring to match against memory content"
            },
            "windowHours": {
                "type": "number",
                "description": "Maximum gap between consecutive matches for them to be linked",
                "default": DEFAULT_WINDOW_HOURS,
                "minimum": 0.0
            },
            "threshold": {
                "type": "number",
                "description": "Minimum cosine similarity between consecutive matches that both have embeddings",
                "default": DEFAULT_SIMILARITY_THRESHOLD,
                "minimum": 0.0,
                "maximum": 1.0
            }
        },
        "required": ["query"]
    })
}

pub async fn execute(
    storage: &Arc<Storage>,
    args: Option<serde_json::Value>,
) -> Result<serde_json::Value, String> {
    let query = args
        .as_ref()
        .and_then(|a| a.get("query"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or("Missing required parameter: query")?;

    let window_hours = args
        .as_ref()
        .and_then(|a| a.get("windowHours"))
        .and_then(|v| v.as_f64())
        .unwrap_or(DEFAULT_WINDOW_HOURS)
        .max(0.0);

    let threshold = args
        .as_ref()
        .and_then(|a| a.get("threshold"))
        .and_then(|v| v.as_f64())
        .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD)
        .clamp(0.0, 1.0);

    let mut matches = storage
        .search_memories(&query, SEARCH_LIMIT)
        .map_err(|e| format!("Failed to search memories: {}", e))?;

    if matches.is_empty() {
        return Ok(serde_json::json!({
            "status": "no_matches",
            "query": query,
        }));
    }

    // Oldest first, so consecutive pairs follow the timeline
    matches.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    let mut edges = Vec::new();
    let mut created = 0usize;
    for pair in matches.windows(2) {
        let (earlier, later) = (&pair[0], &pair[1]);
        let gap_hours = (later.created_at - earlier.created_at).num_seconds() as f64 / 3600.0;
        if gap_hours > window_hours {
            continue;
        }

        // Similarity gate only applies when both sides have embeddings;
        // otherwise proximity in time is enough.
        let similarity = match (
            embedding_of(storage, &earlier.id)?,
            embedding_of(storage, &later.id)?,
        ) {
            (Some(a), Some(b)) => {
                let s = cosine_similarity(&a, &b);
                if s < threshold {
                    continue;
                }
                Some(s)
            }
            _ => None,
        };

        storage
            .reinforce_edge_pair(
                &earlier.id,
                &later.id,
                TEMPORAL_INITIAL_STRENGTH,
                ConnectionKind::Temporal,
            )
            .map_err(|e| format!("Failed to link memories: {}", e))?;
        created += 2;
        edges.push(serde_json::json!({
            "source": earlier.id,
            "target": later.id,
            "gapHours": gap_hours,
            "similarity": similarity,
        }));
    }

    let nodes: Vec<serde_json::Value> = matches
        .iter()
        .map(|m| {
            serde_json::json!({
                "id": m.id,
                "content": m.content,
                "createdAt": m.created_at.to_rfc3339(),
            })
        })
        .collect();

    Ok(serde_json::json!({
        "status": "built",
        "query": query,
        "nodes": nodes,
        "edges": edges,
        "connectionsCreated": created,
    }))
}

fn embedding_of(storage: &Storage, id: &str) -> Result<Option<Vec<f32>>, String> {
    storage
        .get_memory_embedding(id)
        .map_err(|e| format!("Failed to load embedding for {}: {}", id, e))
}
