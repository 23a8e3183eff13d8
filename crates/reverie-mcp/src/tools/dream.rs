//! dream tool — Trigger one consolidation run over the association graph.

use std::sync::Arc;

use reverie_core::dream::{
    DEFAULT_COACTIVATION_MIN_COUNT, DEFAULT_PRUNE_DAYS_UNUSED, DEFAULT_PRUNE_MIN_STRENGTH,
    DEFAULT_SEMANTIC_THRESHOLD, DEFAULT_TEMPORAL_WINDOW_HOURS,
};
use reverie_core::{DreamOptions, Dreamer, StorageError};

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "semanticThreshold": {
                "type": "number",
                "description": "Minimum cosine similarity to create a semantic connection",
                "default": DEFAULT_SEMANTIC_THRESHOLD,
                "minimum": 0.0,
                "maximum": 1.0
            },
            "temporalWindowHours": {
                "type": "number",
                "description": "Maximum creation-time gap (hours) for temporal connections",
                "default": DEFAULT_TEMPORAL_WINDOW_HOURS,
                "minimum": 0.0
            },
            "coactivationMinCount": {
                "type": "integer",
                "description": "Minimum joint-activation count before a group is reinforced",
                "default": DEFAULT_COACTIVATION_MIN_COUNT,
                "minimum": 1
            },
            "pruneMinStrength": {
                "type": "number",
                "description": "Connections weaker than this are prune candidates",
                "default": DEFAULT_PRUNE_MIN_STRENGTH,
                "minimum": 0.0,
                "maximum": 1.0
            },
            "pruneDaysUnused": {
                "type": "integer",
                "description": "Connections unused for more than this many days are prune candidates",
                "default": DEFAULT_PRUNE_DAYS_UNUSED,
                "minimum": 0
            }
        }
    })
}

pub async fn execute(
    dreamer: &Arc<Dreamer>,
    args: Option<serde_json::Value>,
) -> Result<serde_json::Value, String> {
    let mut options = DreamOptions::default();

    if let Some(v) = args
        .as_ref()
        .and_then(|a| a.get("semanticThreshold"))
        .and_then(|v| v.as_f64())
    {
        options.semantic_threshold = v.clamp(0.0, 1.0);
    }
    if let Some(v) = args
        .as_ref()
        .and_then(|a| a.get("temporalWindowHours"))
        .and_then(|v| v.as_f64())
    {
        options.temporal_window_hours = v.max(0.0);
    }
    if let Some(v) = args
        .as_ref()
        .and_then(|a| a.get("coactivationMinCount"))
        .and_then(|v| v.as_i64())
    {
        options.coactivation_min_count = v.max(1);
    }
    if let Some(v) = args
        .as_ref()
        .and_then(|a| a.get("pruneMinStrength"))
        .and_then(|v| v.as_f64())
    {
        options.prune_min_strength = v.clamp(0.0, 1.0);
    }
    if let Some(v) = args
        .as_ref()
        .and_then(|a| a.get("pruneDaysUnused"))
        .and_then(|v| v.as_i64())
    {
        options.prune_days_unused = v.max(0);
    }

    match dreamer.run(&options) {
        Ok(log) => Ok(serde_json::json!({
            "status": "completed",
            "run": serde_json::to_value(&log).map_err(|e| e.to_string())?,
        })),
        Err(StorageError::DreamInProgress) => Ok(serde_json::json!({
            "status": "already_running",
            "message": "A dream consolidation run is already in progress",
        })),
        Err(e) => Err(format!("Dream run failed: {}", e)),
    }
}
