//! MCP (Model Context Protocol) Server
//!
//! Implements an MCP server using manual JSON-RPC 2.0 over stdio. The
//! protocol surface is small enough that a direct implementation beats
//! pulling in an MCP framework crate.
//!
//! # Architecture
//!
//! - **Transport**: JSON-RPC 2.0 over stdio (line-based)
//! - **Dependencies**: Only `serde_json` and anyhow (no MCP-specific crates)
//! - **Concurrency**: Each `tools/call` runs as its own task; responses are
//!   funneled through one writer so output lines never interleave. Requests
//!   abandoned upstream simply have their late response ignored.
//!
//! # Usage
//!
//! Start the MCP server with: `pgops serve`
//!
//! Configure in Claude Desktop:
//! ```json
//! {
//!   "mcpServers": {
//!     "pgops": {
//!       "command": "pgops",
//!       "args": ["serve"]
//!     }
//!   }
//! }
//! ```

use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::catalog::{self, ToolParam, MAX_LIMIT, TOOLS};
use crate::ops::{Operations, ToolArgs, COMPOSITE_TOOLS};

// ============================================================================
// JSON-RPC 2.0 Structures
// ============================================================================

/// JSON-RPC 2.0 Request
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl JsonRpcResponse {
    fn result(id: Option<Value>, value: Value) -> Self {
        Self { jsonrpc: "2.0".to_string(), id, result: Some(value), error: None }
    }

    fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError { code, message, data: None }),
        }
    }
}

// ============================================================================
// MCP Tool Result Structures
// ============================================================================

/// Text content block for MCP tool results
#[derive(Debug, Serialize)]
struct TextContent {
    #[serde(rename = "type")]
    content_type: String,
    text: String,
}

impl TextContent {
    fn new(text: String) -> Self {
        Self { content_type: "text".to_string(), text }
    }
}

/// MCP tool call result
#[derive(Debug, Serialize)]
struct CallToolResult {
    content: Vec<TextContent>,
    #[serde(rename = "isError")]
    is_error: bool,
}

impl CallToolResult {
    /// Wrap operation output; text already carries the `Error: ` prefix
    /// when the operation failed.
    fn text(text: String) -> Result<Value> {
        let is_error = text.starts_with("Error:");
        let result = Self { content: vec![TextContent::new(text)], is_error };
        Ok(serde_json::to_value(result)?)
    }
}

// ============================================================================
// MCP Server
// ============================================================================

/// Run the MCP server loop until stdin closes
///
/// Each request line is parsed and dispatched on its own task; the response
/// lines go through a single writer task so concurrent tool calls cannot
/// interleave bytes on stdout.
///
/// # Errors
///
/// Returns an error only on stdio failure; tool-level faults are answered
/// in-band as JSON-RPC responses.
pub async fn serve(ops: Arc<Operations>) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    let (tx, mut rx) = mpsc::channel::<String>(64);
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = rx.recv().await {
            if stdout.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if stdout.write_all(b"\n").await.is_err() {
                break;
            }
            if stdout.flush().await.is_err() {
                break;
            }
        }
    });

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response_tx = tx.clone();
        match serde_json::from_str::<JsonRpcRequest>(&line) {
            Ok(request) => {
                let ops = Arc::clone(&ops);
                tokio::spawn(async move {
                    let response = handle_request(&ops, request).await;
                    if let Ok(encoded) = serde_json::to_string(&response) {
                        let _ = response_tx.send(encoded).await;
                    }
                });
            }
            Err(e) => {
                let response = JsonRpcResponse::error(None, -32700, format!("Parse error: {e}"));
                if let Ok(encoded) = serde_json::to_string(&response) {
                    let _ = response_tx.send(encoded).await;
                }
            }
        }
    }

    drop(tx);
    let _ = writer.await;
    Ok(())
}

/// Route a JSON-RPC request to the matching protocol handler
async fn handle_request(ops: &Operations, request: JsonRpcRequest) -> JsonRpcResponse {
    let result = match request.method.as_str() {
        "initialize" => handle_initialize(),
        "tools/list" => Ok(handle_list_tools()),
        "tools/call" => handle_call_tool(ops, request.params).await,
        _ => Err(anyhow!("Unknown method: {}", request.method)),
    };

    match result {
        Ok(value) => JsonRpcResponse::result(request.id, value),
        Err(e) => JsonRpcResponse::error(request.id, -32603, e.to_string()),
    }
}

// ============================================================================
// MCP Protocol Handlers
// ============================================================================

/// Handle MCP initialize request
fn handle_initialize() -> Result<Value> {
    Ok(json!({
        "protocolVersion": "2024-11-05",
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": "pgops",
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

/// Handle tools/list request
///
/// The catalog records drive their own schemas; the composite tools carry
/// hand-written ones.
fn handle_list_tools() -> Value {
    let mut tools: Vec<Value> = TOOLS
        .iter()
        .map(|spec| {
            json!({
                "name": spec.name,
                "description": spec.description,
                "inputSchema": schema_for(spec.param),
            })
        })
        .collect();

    tools.push(json!({
        "name": "get_server_info",
        "description": "Server version, connection settings (password omitted), and monitoring extension status",
        "inputSchema": { "type": "object", "properties": {} }
    }));
    tools.push(json!({
        "name": "get_database_size_info",
        "description": "Disk usage per database, largest first, with a grand total",
        "inputSchema": { "type": "object", "properties": {} }
    }));
    tools.push(json!({
        "name": "get_table_size_info",
        "description": "Table, index, and total sizes for one schema, largest first, with a grand total",
        "inputSchema": {
            "type": "object",
            "properties": {
                "schema_name": {
                    "type": "string",
                    "description": "Schema to analyze (default: public)"
                }
            }
        }
    }));
    tools.push(json!({
        "name": "get_postgresql_config",
        "description": "Show one configuration parameter in detail, or the key tuning parameters when no name is given",
        "inputSchema": {
            "type": "object",
            "properties": {
                "config_name": {
                    "type": "string",
                    "description": "Configuration parameter name (shows key parameters if omitted)"
                }
            }
        }
    }));

    json!({ "tools": tools })
}

fn schema_for(param: Option<ToolParam>) -> Value {
    match param {
        Some(ToolParam::Database) => json!({
            "type": "object",
            "properties": {
                "database_name": {
                    "type": "string",
                    "description": "Database to inspect (uses the default database if omitted)"
                }
            }
        }),
        Some(ToolParam::Limit { default }) => json!({
            "type": "object",
            "properties": {
                "limit": {
                    "type": "number",
                    "description": format!("Number of rows to return (default: {default}, max: {MAX_LIMIT})")
                }
            }
        }),
        None => json!({ "type": "object", "properties": {} }),
    }
}

/// Handle tools/call request
async fn handle_call_tool(ops: &Operations, params: Option<Value>) -> Result<Value> {
    let params = params.ok_or_else(|| anyhow!("Missing params"))?;
    let name = params["name"].as_str().ok_or_else(|| anyhow!("Missing tool name"))?;

    if catalog::find_tool(name).is_none() && !COMPOSITE_TOOLS.contains(&name) {
        return Err(anyhow!("Unknown tool: {name}"));
    }

    let args = match params.get("arguments") {
        Some(Value::Null) | None => ToolArgs::default(),
        Some(arguments) => serde_json::from_value(arguments.clone())
            .map_err(|e| anyhow!("Invalid tool arguments: {e}"))?,
    };

    CallToolResult::text(ops.run_tool(name, &args).await)
}
