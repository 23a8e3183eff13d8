//! remember tool — Store a memory so it can participate in the association graph.

use std::sync::Arc;

use reverie_core::{MemoryInput, Storage};

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "content": {
                "type": "string",
                "description": "The memory content to store"
            },
            "embedding": {
                "type": "array",
                "items": { "type": "number" },
                "description": "Optional embedding vector used for semantic discovery"
            },
            "agentId": {
                "type": "string",
                "description": "Optional agent identifier for scoping graph builds"
            }
        },
        "required": ["content"]
    })
}

pub async fn execute(
    storage: &Arc<Storage>,
    args: Option<serde_json::Value>,
) -> Result<serde_json::Value, String> {
    let content = args
        .as_ref()
        .and_then(|a| a.get("content"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or("Missing required parameter: content")?;

    if content.trim().is_empty() {
        return Err("Parameter 'content' must not be empty".to_string());
    }

    let embedding = match args.as_ref().and_then(|a| a.get("embedding")) {
        Some(value) => {
            let raw = value
                .as_array()
                .ok_or("Parameter 'embedding' must be an array of numbers")?;
            let mut vector = Vec::with_capacity(raw.len());
            for item in raw {
                let n = item
                    .as_f64()
                    .ok_or("Parameter 'embedding' must contain only numbers")?;
                vector.push(n as f32);
            }
            Some(vector)
        }
        None => None,
    };

    let agent_id = args
        .as_ref()
        .and_then(|a| a.get("agentId"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let memory = storage
        .insert_memory(MemoryInput {
            content,
            embedding,
            agent_id,
        })
        .map_err(|e| format!("Failed to store memory: {}", e))?;

    Ok(serde_json::json!({
        "status": "stored",
        "memory": {
            "id": memory.id,
            "content": memory.content,
            "agentId": memory.agent_id,
            "createdAt": memory.created_at.to_rfc3339(),
            "hasEmbedding": memory.has_embedding,
        }
    }))
}
