//! dream_history tool — List recent consolidation runs from the audit log.

use std::sync::Arc;

use reverie_core::Storage;

const DEFAULT_LIMIT: u64 = 10;
const MAX_LIMIT: u64 = 100;

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "limit": {
                "type": "integer",
                "description": "Maximum number of runs to return, most recent first",
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
    let limit = args
        .as_ref()
        .and_then(|a| a.get("limit"))
        .and_then(|v| v.as_u64())
        .unwrap_or(DEFAULT_LIMIT)
        .clamp(1, MAX_LIMIT) as usize;

    let runs = storage
        .list_recent_runs(limit)
        .map_err(|e| format!("Failed to load run history: {}", e))?;

    Ok(serde_json::json!({
        "count": runs.len(),
        "runs": serde_json::to_value(&runs).map_err(|e| e.to_string())?,
    }))
}
