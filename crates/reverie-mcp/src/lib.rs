//! # Reverie MCP
//!
//! MCP (Model Context Protocol) server exposing the Reverie association
//! graph to AI assistants over stdio. Tools cover memory registration,
//! activation tracking, dream consolidation, on-demand graph building, and
//! run history.
//!
//! The modules are public so integration tests can drive the server and the
//! individual tools without going through a child process.

pub mod protocol;
pub mod server;
pub mod tools;
