//! build_similarity_graph tool — Wire up unconnected memories whose
//! embeddings are close in vector space.
//!
//! Uses the same strength rule as the semantic discovery phase, so a graph
//! built on demand is indistinguishable from one built by a dream run.

use std::collections::BTreeSet;
use std::sync::Arc;

use reverie_core::dream::phases::SEMANTIC_STRENGTH_FACTOR;
use reverie_core::{ConnectionKind, Storage};

const DEFAULT_THRESHOLD: f64 = 0.75;
const DEFAULT_LIMIT: u64 = 100;
const MAX_LIMIT: u64 = 500;

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "agentId": {
                "type": "string",
                "description": "Restrict the build to memories owned by this agent"
            },
            "threshold": {
                "type": "number",
                "description": "Minimum cosine similarity for linking two memories",
                "default": DEFAULT_THRESHOLD,
                "minimum": 0.0,
                "maximum": 1.0
            },
            "limit": {
                "type": "integer",
                "description": "Maximum number of pairs to link in one call",
                "default": DEFAULT_LIMIT,
                "minimum": 1,
                "maximum": MAX_LIMIT
            }
        }
    })
}

pub async fn execute(
    storage: &Arc<Storage>,
    args: Option<serde_json::Value>,
) -> Result<serde_json::Value, String> {
    let agent_id = args
        .as_ref()
        .and_then(|a| a.get("agentId"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let threshold = args
        .as_ref()
        .and_then(|a| a.get("threshold"))
        .and_then(|v| v.as_f64())
        .unwrap_or(DEFAULT_THRESHOLD)
        .clamp(0.0, 1.0);

    let limit = args
        .as_ref()
        .and_then(|a| a.get("limit"))
        .and_then(|v| v.as_u64())
        .unwrap_or(DEFAULT_LIMIT)
        .clamp(1, MAX_LIMIT) as usize;

    let pairs = storage
        .find_similar_unconnected_pairs_filtered(agent_id.as_deref(), threshold, limit)
        .map_err(|e| format!("Failed to scan for similar memories: {}", e))?;

    let mut edges = Vec::with_capacity(pairs.len());
    let mut node_ids = BTreeSet::new();
    for pair in &pairs {
        let strength = pair.similarity * SEMANTIC_STRENGTH_FACTOR;
        storage
            .reinforce_edge_pair(&pair.id_a, &pair.id_b, strength, ConnectionKind::Semantic)
            .map_err(|e| format!("Failed to link memories: {}", e))?;
        node_ids.insert(pair.id_a.clone());
        node_ids.insert(pair.id_b.clone());
        edges.push(serde_json::json!({
            "source": pair.id_a,
            "target": pair.id_b,
            "similarity": pair.similarity,
            "strength": strength,
        }));
    }

    let mut nodes = Vec::with_capacity(node_ids.len());
    for id in &node_ids {
        let memory = storage
            .get_memory(id)
            .map_err(|e| format!("Failed to load memory {}: {}", id, e))?;
        nodes.push(serde_json::json!({
            "id": memory.id,
            "content": memory.content,
            "agentId": memory.agent_id,
        }));
    }

    Ok(serde_json::json!({
        "status": "built",
        "threshold": threshold,
        "nodes": nodes,
        "edges": edges,
        "connectionsCreated": pairs.len() * 2,
    }))
}
