//! MCP Tools
//!
//! Tool implementations for the Reverie MCP server.
//!
//! Writing tools (remember, record_activation) feed the graph; dream runs
//! consolidation; the graph builders create edges on demand; dream_history
//! and status are read-only observability.

pub mod dream;
pub mod dream_history;
pub mod entity_graph;
pub mod record_activation;
pub mod remember;
pub mod similarity_graph;
pub mod status;
pub mod temporal_graph;
