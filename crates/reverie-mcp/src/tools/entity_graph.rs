//! analyze_entity_graph tool — Declared analysis surface for entity graphs.
//!
//! The five analysis modes are part of the advertised tool contract, but the
//! entity extraction pipeline that feeds them ships separately. This build
//! validates arguments and reports the capability as unavailable rather than
//! dropping the tool from the listing.

use chrono::DateTime;

pub const ANALYSIS_MODES: [&str; 5] = [
    "solution_paths",
    "knowledge_domains",
    "related_concepts",
    "full_graph",
    "relation_history",
];

const DEFAULT_MODE: &str = "full_graph";

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "entity": {
                "type": "string",
                "description": "Entity name to center the analysis on"
            },
            "mode": {
                "type": "string",
                "enum": ANALYSIS_MODES,
                "description": "Analysis mode",
                "default": DEFAULT_MODE
            },
            "asOf": {
                "type": "string",
                "format": "date-time",
                "description": "Evaluate the graph as it stood at this instant (RFC 3339)"
            },
            "includeSuperseded": {
                "type": "boolean",
                "description": "Include relations that were later superseded",
                "default": false
            },
            "includeInvalid": {
                "type": "boolean",
                "description": "Include relations that were later invalidated",
                "default": false
            }
        }
    })
}

pub async fn execute(args: Option<serde_json::Value>) -> Result<serde_json::Value, String> {
    let mode = args
        .as_ref()
        .and_then(|a| a.get("mode"))
        .and_then(|v| v.as_str())
        .unwrap_or(DEFAULT_MODE)
        .to_string();

    if !ANALYSIS_MODES.contains(&mode.as_str()) {
        return Err(format!(
            "Unknown analysis mode '{}'. Expected one of: {}",
            mode,
            ANALYSIS_MODES.join(", ")
        ));
    }

    if let Some(as_of) = args
        .as_ref()
        .and_then(|a| a.get("asOf"))
        .and_then(|v| v.as_str())
    {
        DateTime::parse_from_rfc3339(as_of)
            .map_err(|e| format!("Invalid asOf timestamp '{}': {}", as_of, e))?;
    }

    Ok(serde_json::json!({
        "status": "unavailable",
        "mode": mode,
        "message": "Entity relationship analysis is not bundled with this server build",
    }))
}
