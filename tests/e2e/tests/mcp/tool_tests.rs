//! Tool invocation tests through the MCP dispatch layer
//!
//! Every tool is exercised via tools/call so the CallToolResult wrapping
//! (text content + isError) is covered alongside the tool logic itself.

use std::sync::Arc;

use reverie_core::{Dreamer, Storage};
use reverie_mcp::protocol::types::JsonRpcRequest;
use reverie_mcp::server::McpServer;
use tempfile::TempDir;

async fn test_server() -> (McpServer, TempDir) {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(Storage::new(Some(dir.path().join("test.db"))).unwrap());
    let dreamer = Arc::new(Dreamer::new(storage.clone()));
    let mut server = McpServer::new(storage, dreamer);

    let init = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id: Some(serde_json::json!(0)),
        method: "initialize".to_string(),
        params: None,
    };
    server.handle_request(init).await;
    (server, dir)
}

/// Calls a tool and unwraps the text content back into JSON.
async fn call_tool(
    server: &mut McpServer,
    name: &str,
    arguments: serde_json::Value,
) -> (bool, serde_json::Value) {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id: Some(serde_json::json!(1)),
        method: "tools/call".to_string(),
        params: Some(serde_json::json!({ "name": name, "arguments": arguments })),
    };
    let response = server.handle_request(request).await.unwrap();
    let result = response.result.expect("tools/call should produce a result");

    let is_error = result["isError"].as_bool().unwrap();
    let text = result["content"][0]["text"].as_str().unwrap();
    (is_error, serde_json::from_str(text).unwrap())
}

async fn remember(server: &mut McpServer, content: &str, embedding: Vec<f64>) -> String {
    let (is_error, value) = call_tool(
        server,
        "remember",
        serde_json::json!({ "content": content, "embedding": embedding }),
    )
    .await;
    assert!(!is_error);
    value["memory"]["id"].as_str().unwrap().to_string()
}

// ============================================================================
// MEMORY INTAKE
// ============================================================================

#[tokio::test]
async fn test_remember_returns_stored_memory() {
    let (mut server, _dir) = test_server().await;

    let (is_error, value) = call_tool(
        &mut server,
        "remember",
        serde_json::json!({
            "content": "The staging cluster runs postgres 16",
            "embedding": [0.6, 0.8],
            "agentId": "agent-7"
        }),
    )
    .await;

    assert!(!is_error);
    assert_eq!(value["status"], "stored");
    assert_eq!(value["memory"]["agentId"], "agent-7");
    assert_eq!(value["memory"]["hasEmbedding"], true);
    assert!(!value["memory"]["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_remember_without_content_is_tool_error() {
    let (mut server, _dir) = test_server().await;

    let (is_error, value) = call_tool(&mut server, "remember", serde_json::json!({})).await;

    assert!(is_error);
    assert!(value["error"].as_str().unwrap().contains("content"));
}

#[tokio::test]
async fn test_record_activation_counts_observations() {
    let (mut server, _dir) = test_server().await;
    let a = remember(&mut server, "first", vec![1.0, 0.0]).await;
    let b = remember(&mut server, "second", vec![0.0, 1.0]).await;

    let (is_error, value) = call_tool(
        &mut server,
        "record_activation",
        serde_json::json!({ "memoryIds": [a.clone(), b.clone()] }),
    )
    .await;
    assert!(!is_error);
    assert_eq!(value["status"], "recorded");
    assert_eq!(value["observationCount"], 1);

    let (_, value) = call_tool(
        &mut server,
        "record_activation",
        serde_json::json!({ "memoryIds": [b, a] }),
    )
    .await;
    assert_eq!(value["observationCount"], 2);
}

#[tokio::test]
async fn test_record_activation_rejects_singleton_group() {
    let (mut server, _dir) = test_server().await;
    let a = remember(&mut server, "alone", vec![1.0, 0.0]).await;

    let (is_error, value) = call_tool(
        &mut server,
        "record_activation",
        serde_json::json!({ "memoryIds": [a] }),
    )
    .await;

    assert!(is_error);
    assert!(value["error"].is_string());
}

// ============================================================================
// CONSOLIDATION
// ============================================================================

#[tokio::test]
async fn test_dream_completes_over_rpc() {
    let (mut server, _dir) = test_server().await;
    remember(&mut server, "cargo workspaces share a lockfile", vec![1.0, 0.0]).await;
    remember(&mut server, "workspace members share target dir", vec![0.98, 0.05]).await;

    let (is_error, value) = call_tool(&mut server, "dream", serde_json::json!({})).await;

    assert!(!is_error);
    assert_eq!(value["status"], "completed");
    assert!(value["run"]["connectionsCreated"].as_i64().unwrap() >= 2);
    assert_eq!(value["run"]["conceptsCreated"], 0);
}

#[tokio::test]
async fn test_dream_history_lists_completed_runs() {
    let (mut server, _dir) = test_server().await;
    call_tool(&mut server, "dream", serde_json::json!({})).await;

    let (is_error, value) = call_tool(&mut server, "dream_history", serde_json::json!({})).await;

    assert!(!is_error);
    assert_eq!(value["count"], 1);
    assert!(value["runs"][0]["completedAt"].is_string());
}

// ============================================================================
// GRAPH BUILDING
// ============================================================================

#[tokio::test]
async fn test_build_similarity_graph_over_rpc() {
    let (mut server, _dir) = test_server().await;
    remember(&mut server, "tokio spawns tasks", vec![1.0, 0.0]).await;
    remember(&mut server, "tokio runs futures", vec![0.99, 0.02]).await;

    let (is_error, value) = call_tool(
        &mut server,
        "build_similarity_graph",
        serde_json::json!({ "threshold": 0.9 }),
    )
    .await;

    assert!(!is_error);
    assert_eq!(value["status"], "built");
    assert_eq!(value["connectionsCreated"], 2);
    assert_eq!(value["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(value["edges"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_build_temporal_graph_requires_query() {
    let (mut server, _dir) = test_server().await;

    let (is_error, value) =
        call_tool(&mut server, "build_temporal_graph", serde_json::json!({})).await;

    assert!(is_error);
    assert!(value["error"].as_str().unwrap().contains("query"));
}

#[tokio::test]
async fn test_build_temporal_graph_reports_no_matches() {
    let (mut server, _dir) = test_server().await;
    remember(&mut server, "unrelated note", vec![1.0, 0.0]).await;

    let (is_error, value) = call_tool(
        &mut server,
        "build_temporal_graph",
        serde_json::json!({ "query": "zzzzzz" }),
    )
    .await;

    assert!(!is_error);
    assert_eq!(value["status"], "no_matches");
}

#[tokio::test]
async fn test_build_temporal_graph_links_matching_chain() {
    let (mut server, _dir) = test_server().await;
    remember(&mut server, "deploy started for api service", vec![1.0, 0.0]).await;
    remember(&mut server, "deploy finished for api service", vec![0.99, 0.05]).await;

    let (is_error, value) = call_tool(
        &mut server,
        "build_temporal_graph",
        serde_json::json!({ "query": "deploy" }),
    )
    .await;

    assert!(!is_error);
    assert_eq!(value["status"], "built");
    assert_eq!(value["connectionsCreated"], 2);
    assert_eq!(value["edges"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_analyze_entity_graph_is_declared_but_unavailable() {
    let (mut server, _dir) = test_server().await;

    let (is_error, value) = call_tool(
        &mut server,
        "analyze_entity_graph",
        serde_json::json!({ "entity": "postgres", "mode": "solution_paths" }),
    )
    .await;

    assert!(!is_error);
    assert_eq!(value["status"], "unavailable");
    assert_eq!(value["mode"], "solution_paths");
}

#[tokio::test]
async fn test_analyze_entity_graph_rejects_unknown_mode() {
    let (mut server, _dir) = test_server().await;

    let (is_error, value) = call_tool(
        &mut server,
        "analyze_entity_graph",
        serde_json::json!({ "mode": "betweenness_centrality" }),
    )
    .await;

    assert!(is_error);
    assert!(value["error"].as_str().unwrap().contains("Unknown analysis mode"));
}

// ============================================================================
// DIAGNOSTICS
// ============================================================================

#[tokio::test]
async fn test_status_reflects_stored_state() {
    let (mut server, _dir) = test_server().await;
    remember(&mut server, "one memory", vec![1.0, 0.0]).await;

    let (is_error, value) = call_tool(&mut server, "status", serde_json::json!({})).await;

    assert!(!is_error);
    assert_eq!(value["status"], "ok");
    assert_eq!(value["memories"], 1);
    assert_eq!(value["connections"], 0);
    assert_eq!(value["dreaming"], false);
    assert!(value["lastDream"].is_null());
}

#[tokio::test]
async fn test_unknown_tool_is_protocol_error_not_tool_error() {
    let (mut server, _dir) = test_server().await;

    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id: Some(serde_json::json!(1)),
        method: "tools/call".to_string(),
        params: Some(serde_json::json!({ "name": "forget", "arguments": {} })),
    };
    let response = server.handle_request(request).await.unwrap();

    assert!(response.result.is_none());
    assert_eq!(response.error.unwrap().code, -32601);
}
