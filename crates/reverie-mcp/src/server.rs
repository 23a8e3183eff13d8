//! MCP Server Core
//!
//! Handles the main MCP server logic, routing requests to the tool handlers.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::protocol::messages::{
    CallToolRequest, CallToolResult, InitializeRequest, InitializeResult, ListToolsResult,
    ServerCapabilities, ServerInfo, ToolDescription, ToolResultContent,
};
use crate::protocol::types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_VERSION};
use crate::tools;
use reverie_core::{Dreamer, Storage};

/// MCP Server implementation
pub struct McpServer {
    storage: Arc<Storage>,
    dreamer: Arc<Dreamer>,
    initialized: bool,
}

impl McpServer {
    pub fn new(storage: Arc<Storage>, dreamer: Arc<Dreamer>) -> Self {
        Self {
            storage,
            dreamer,
            initialized: false,
        }
    }

    /// Handle an incoming JSON-RPC request
    pub async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("Handling request: {}", request.method);

        // Check initialization for non-initialize requests
        if !self.initialized
            && request.method != "initialize"
            && request.method != "notifications/initialized"
        {
            warn!("Rejecting request '{}': server not initialized", request.method);
            return Some(JsonRpcResponse::error(
                request.id,
                JsonRpcError::server_not_initialized(),
            ));
        }

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params).await,
            "notifications/initialized" => {
                // Notification, no response needed
                return None;
            }
            "tools/list" => self.handle_tools_list().await,
            "tools/call" => self.handle_tools_call(request.params).await,
            "ping" => Ok(serde_json::json!({})),
            method => {
                warn!("Unknown method: {}", method);
                Err(JsonRpcError::method_not_found())
            }
        };

        Some(match result {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(error) => JsonRpcResponse::error(request.id, error),
        })
    }

    /// Handle initialize request
    async fn handle_initialize(
        &mut self,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, JsonRpcError> {
        let request: InitializeRequest = match params {
            Some(p) => {
                serde_json::from_value(p).map_err(|e| JsonRpcError::invalid_params(&e.to_string()))?
            }
            None => InitializeRequest::default(),
        };

        // Version negotiation: use client's version if older than server's
        // Claude Desktop rejects servers with newer protocol versions
        let negotiated_version = if request.protocol_version.as_str() < MCP_VERSION {
            info!(
                "Client requested older protocol version {}, using it",
                request.protocol_version
            );
            request.protocol_version.clone()
        } else {
            MCP_VERSION.to_string()
        };

        self.initialized = true;
        info!("MCP session initialized with protocol version {}", negotiated_version);

        let result = InitializeResult {
            protocol_version: negotiated_version,
            server_info: ServerInfo {
                name: "reverie".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            capabilities: ServerCapabilities {
                tools: Some({
                    let mut map = HashMap::new();
                    map.insert("listChanged".to_string(), serde_json::json!(false));
                    map
                }),
                resources: None,
                prompts: None,
            },
            instructions: Some(
                "Reverie maintains a weighted association graph over stored memories. Use \
                 remember to store memories (with embeddings when available) and record_activation \
                 whenever several memories are used together. Run dream periodically to let the \
                 consolidation cycle discover semantic and temporal links, strengthen co-activated \
                 pairs, and prune stale edges; dream_history shows what past cycles did. The \
                 build_similarity_graph and build_temporal_graph tools wire up connections on \
                 demand without waiting for a dream cycle."
                    .to_string(),
            ),
        };

        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(&e.to_string()))
    }

    /// Handle tools/list request
    async fn handle_tools_list(&self) -> Result<serde_json::Value, JsonRpcError> {
        let tools = vec![
            // ================================================================
            // MEMORY INTAKE
            // ================================================================
            ToolDescription {
                name: "remember".to_string(),
                description: Some("Store a memory so it can participate in the association graph. Accepts optional embedding vector and agentId.".to_string()),
                input_schema: tools::remember::schema(),
            },
            ToolDescription {
                name: "record_activation".to_string(),
                description: Some("Record that a group of memories was activated together. Accumulated observations feed co-activation reinforcement during the next dream cycle.".to_string()),
                input_schema: tools::record_activation::schema(),
            },
            // ================================================================
            // CONSOLIDATION
            // ================================================================
            ToolDescription {
                name: "dream".to_string(),
                description: Some("Run a dream consolidation cycle: semantic discovery, temporal discovery, co-activation reinforcement, and decay pruning, in that order. Returns the audit record with per-phase notes.".to_string()),
                input_schema: tools::dream::schema(),
            },
            ToolDescription {
                name: "dream_history".to_string(),
                description: Some("List recent dream cycles, most recent first. Each record carries counters and per-phase notes.".to_string()),
                input_schema: tools::dream_history::schema(),
            },
            // ================================================================
            // GRAPH BUILDING
            // ================================================================
            ToolDescription {
                name: "build_similarity_graph".to_string(),
                description: Some("Link unconnected memories whose embeddings exceed a similarity threshold. Optional agentId filter scopes the build to one agent's memories.".to_string()),
                input_schema: tools::similarity_graph::schema(),
            },
            ToolDescription {
                name: "build_temporal_graph".to_string(),
                description: Some("Chain memories matching a query along the timeline. Consecutive matches within the window get linked; pairs with embeddings are also gated on similarity.".to_string()),
                input_schema: tools::temporal_graph::schema(),
            },
            ToolDescription {
                name: "analyze_entity_graph".to_string(),
                description: Some("Analyze the entity relationship graph. Modes: solution_paths, knowledge_domains, related_concepts, full_graph, relation_history. Supports asOf time travel plus includeSuperseded/includeInvalid flags.".to_string()),
                input_schema: tools::entity_graph::schema(),
            },
            // ================================================================
            // DIAGNOSTICS
            // ================================================================
            ToolDescription {
                name: "status".to_string(),
                description: Some("Snapshot of the store: memory and connection counts, whether a dream cycle is running, and the last completed run.".to_string()),
                input_schema: tools::status::schema(),
            },
        ];

        let result = ListToolsResult { tools };
        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(&e.to_string()))
    }

    /// Handle tools/call request
    async fn handle_tools_call(
        &self,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, JsonRpcError> {
        let request: CallToolRequest = match params {
            Some(p) => {
                serde_json::from_value(p).map_err(|e| JsonRpcError::invalid_params(&e.to_string()))?
            }
            None => return Err(JsonRpcError::invalid_params("Missing tool call parameters")),
        };

        let result = match request.name.as_str() {
            "remember" => tools::remember::execute(&self.storage, request.arguments).await,
            "record_activation" => {
                tools::record_activation::execute(&self.storage, request.arguments).await
            }
            "dream" => tools::dream::execute(&self.dreamer, request.arguments).await,
            "dream_history" => {
                tools::dream_history::execute(&self.storage, request.arguments).await
            }
            "build_similarity_graph" => {
                tools::similarity_graph::execute(&self.storage, request.arguments).await
            }
            "build_temporal_graph" => {
                tools::temporal_graph::execute(&self.storage, request.arguments).await
            }
            "analyze_entity_graph" => tools::entity_graph::execute(request.arguments).await,
            "status" => tools::status::execute(&self.storage, &self.dreamer, request.arguments).await,
            name => {
                return Err(JsonRpcError::method_not_found_with_message(&format!(
                    "Unknown tool: {}",
                    name
                )));
            }
        };

        let response = match result {
            Ok(content) => {
                let call_result = CallToolResult {
                    content: vec![ToolResultContent {
                        content_type: "text".to_string(),
                        text: serde_json::to_string_pretty(&content)
                            .unwrap_or_else(|_| content.to_string()),
                    }],
                    is_error: Some(false),
                };
                serde_json::to_value(call_result)
                    .map_err(|e| JsonRpcError::internal_error(&e.to_string()))
            }
            Err(e) => {
                let call_result = CallToolResult {
                    content: vec![ToolResultContent {
                        content_type: "text".to_string(),
                        text: serde_json::json!({ "error": e }).to_string(),
                    }],
                    is_error: Some(true),
                };
                serde_json::to_value(call_result)
                    .map_err(|e| JsonRpcError::internal_error(&e.to_string()))
            }
        };

        response
    }
}

// ============================================================================
// TESTS
// ============================================================================
