//! Line-delimited JSON-RPC transport over stdin/stdout.
//!
//! Each request arrives as one line on stdin and each response leaves as one
//! line on stdout. Logging goes to stderr so the protocol stream stays
//! parseable. EOF on stdin is the shutdown signal: MCP clients close our
//! stdin when the session ends.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, warn};

use super::types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::server::McpServer;

/// Emitted when a response itself fails to serialize, so the client is never
/// left waiting on a request it already sent.
const FALLBACK_ERROR_LINE: &str =
    r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error"}}"#;

/// Serve MCP over this process's stdin/stdout until the client disconnects.
pub async fn serve(server: McpServer) -> io::Result<()> {
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();
    pump(server, reader, writer).await
}

/// Drive the request/response loop over arbitrary line-oriented endpoints.
async fn pump<R, W>(mut server: McpServer, mut reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!("Stdin reached EOF, stopping transport");
                break;
            }
            Ok(_) => {
                if let Some(reply) = respond_to(&mut server, line.trim()).await {
                    writer.write_all(reply.as_bytes()).await?;
                    writer.write_all(b"\n").await?;
                    writer.flush().await?;
                }
            }
            Err(e) => {
                error!("Failed to read from stdin: {}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Turn one wire line into at most one serialized response line.
///
/// Blank lines and notifications produce no reply. A line that is not valid
/// JSON-RPC is answered with a parse error at a null id instead of being
/// dropped silently, so a misbehaving client still hears back.
async fn respond_to(server: &mut McpServer, line: &str) -> Option<String> {
    if line.is_empty() {
        return None;
    }

    debug!("Received request line ({} bytes)", line.len());

    let response = match serde_json::from_str::<JsonRpcRequest>(line) {
        Ok(request) => server.handle_request(request).await?,
        Err(e) => {
            warn!("Rejecting unparseable request: {}", e);
            JsonRpcResponse::error(None, JsonRpcError::parse_error())
        }
    };

    match serde_json::to_string(&response) {
        Ok(json) => Some(json),
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            Some(FALLBACK_ERROR_LINE.to_string())
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
