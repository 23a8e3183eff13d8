//! MCP protocol conformance tests
//!
//! Initialization gating, version negotiation, notification handling, and
//! error codes as a JSON-RPC client observes them.

use std::sync::Arc;

use reverie_core::{Dreamer, Storage};
use reverie_mcp::protocol::types::{JsonRpcError, JsonRpcRequest, MCP_VERSION};
use reverie_mcp::server::McpServer;
use tempfile::TempDir;

fn test_server() -> (McpServer, TempDir) {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(Storage::new(Some(dir.path().join("test.db"))).unwrap());
    let dreamer = Arc::new(Dreamer::new(storage.clone()));
    (McpServer::new(storage, dreamer), dir)
}

fn make_request(method: &str, params: Option<serde_json::Value>) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id: Some(serde_json::json!(1)),
        method: method.to_string(),
        params,
    }
}

async fn initialized_server() -> (McpServer, TempDir) {
    let (mut server, dir) = test_server();
    server
        .handle_request(make_request("initialize", None))
        .await;
    (server, dir)
}

// ============================================================================
// INITIALIZATION GATING
// ============================================================================

#[tokio::test]
async fn test_every_method_is_gated_until_initialize() {
    for method in ["tools/list", "tools/call", "ping", "unknown/method"] {
        let (mut server, _dir) = test_server();
        let response = server.handle_request(make_request(method, None)).await.unwrap();
        assert_eq!(
            response.error.unwrap().code,
            -32003,
            "method {} must be rejected before initialize",
            method
        );
    }
}

#[tokio::test]
async fn test_initialized_notification_is_not_gated() {
    let (mut server, _dir) = test_server();
    // Sending the notification before initialize must not produce an error
    // response (notifications never get responses)
    let response = server
        .handle_request(make_request("notifications/initialized", None))
        .await;
    assert!(response.is_none());
}

// ============================================================================
// VERSION NEGOTIATION
// ============================================================================

#[tokio::test]
async fn test_older_client_version_wins() {
    let (mut server, _dir) = test_server();
    let response = server
        .handle_request(make_request(
            "initialize",
            Some(serde_json::json!({ "protocolVersion": "2024-11-05" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.result.unwrap()["protocolVersion"], "2024-11-05");
}

#[tokio::test]
async fn test_newer_client_version_falls_back_to_server_version() {
    let (mut server, _dir) = test_server();
    let response = server
        .handle_request(make_request(
            "initialize",
            Some(serde_json::json!({ "protocolVersion": "2099-01-01" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.result.unwrap()["protocolVersion"], MCP_VERSION);
}

#[tokio::test]
async fn test_missing_protocol_version_defaults_to_server_version() {
    let (mut server, _dir) = test_server();
    let response = server
        .handle_request(make_request("initialize", Some(serde_json::json!({}))))
        .await
        .unwrap();
    assert_eq!(response.result.unwrap()["protocolVersion"], MCP_VERSION);
}

// ============================================================================
// CAPABILITIES
// ============================================================================

#[tokio::test]
async fn test_capabilities_advertise_tools_only() {
    let (mut server, _dir) = test_server();
    let response = server
        .handle_request(make_request("initialize", None))
        .await
        .unwrap();
    let result = response.result.unwrap();

    assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
    assert!(result["capabilities"].get("resources").is_none());
    assert!(result["capabilities"].get("prompts").is_none());
}

// ============================================================================
// ERROR SHAPES
// ============================================================================

#[tokio::test]
async fn test_unknown_method_uses_method_not_found_code() {
    let (mut server, _dir) = initialized_server().await;
    let response = server
        .handle_request(make_request("resources/list", None))
        .await
        .unwrap();
    assert_eq!(response.error.unwrap().code, -32601);
}

#[tokio::test]
async fn test_tools_call_without_params_uses_invalid_params_code() {
    let (mut server, _dir) = initialized_server().await;
    let response = server
        .handle_request(make_request("tools/call", None))
        .await
        .unwrap();
    assert_eq!(response.error.unwrap().code, -32602);
}

#[test]
fn test_error_helpers_carry_standard_codes() {
    assert_eq!(JsonRpcError::parse_error().code, -32700);
    assert_eq!(JsonRpcError::method_not_found().code, -32601);
    assert_eq!(JsonRpcError::invalid_params("x").code, -32602);
    assert_eq!(JsonRpcError::internal_error("x").code, -32603);
    assert_eq!(JsonRpcError::server_not_initialized().code, -32003);
}

#[test]
fn test_error_responses_serialize_without_result_field() {
    let response = reverie_mcp::protocol::types::JsonRpcResponse::error(
        Some(serde_json::json!(9)),
        JsonRpcError::method_not_found(),
    );
    let json = serde_json::to_value(&response).unwrap();
    assert!(json.get("result").is_none());
    assert_eq!(json["error"]["code"], -32601);
    assert_eq!(json["id"], 9);
}
