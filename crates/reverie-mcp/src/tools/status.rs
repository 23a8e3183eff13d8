//! status tool — Snapshot of the store and the consolidation engine.

use std::sync::Arc;

use reverie_core::{Dreamer, Storage};

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {}
    })
}

pub async fn execute(
    storage: &Arc<Storage>,
    dreamer: &Arc<Dreamer>,
    _args: Option<serde_json::Value>,
) -> Result<serde_json::Value, String> {
    let memories = storage
        .count_memories()
        .map_err(|e| format!("Failed to count memories: {}", e))?;
    let connections = storage
        .count_connections()
        .map_err(|e| format!("Failed to count connections: {}", e))?;
    let last_dream = storage
        .last_completed_run()
        .map_err(|e| format!("Failed to load last run: {}", e))?;

    Ok(serde_json::json!({
        "status": "ok",
        "memories": memories,
        "connections": connections,
        "dreaming": dreamer.is_running(),
        "lastDream": serde_json::to_value(&last_dream).map_err(|e| e.to_string())?,
    }))
}
