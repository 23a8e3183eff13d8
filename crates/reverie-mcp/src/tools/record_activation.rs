//! record_activation tool — Note that a group of memories was used together.
//!
//! Co-activation counts feed the reinforcement phase of the next dream run.

use std::sync::Arc;

use reverie_core::Storage;

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "memoryIds": {
                "type": "array",
                "items": { "type": "string" },
                "minItems": 2,
                "description": "IDs of the memories that were activated together (at least two distinct)"
            }
        },
        "required": ["memoryIds"]
    })
}

pub async fn execute(
    storage: &Arc<Storage>,
    args: Option<serde_json::Value>,
) -> Result<serde_json::Value, String> {
    let raw = args
        .as_ref()
        .and_then(|a| a.get("memoryIds"))
        .and_then(|v| v.as_array())
        .ok_or("Missing required parameter: memoryIds")?;

    let mut member_ids = Vec::with_capacity(raw.len());
    for item in raw {
        let id = item
            .as_str()
            .ok_or("Parameter 'memoryIds' must contain only strings")?;
        member_ids.push(id.to_string());
    }

    let count = storage
        .record_coactivation(&member_ids)
        .map_err(|e| format!("Failed to record activation: {}", e))?;

    Ok(serde_json::json!({
        "status": "recorded",
        "observationCount": count,
    }))
}
