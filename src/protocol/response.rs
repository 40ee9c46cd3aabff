use serde::Serialize;
use serde_json::{json, Value};

use super::request::RpcId;
use crate::config::ConfigError;

pub const JSONRPC_VERSION: &str = "2.0";

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 response layer
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RpcId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<RpcId>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<RpcId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC 2.0 error object (protocol-level errors).
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    pub fn invalid_request_with(detail: impl Into<String>) -> Self {
        Self { code: Self::INVALID_REQUEST, message: detail.into(), data: None }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: Self::METHOD_NOT_FOUND,
            message: "Method not found".into(),
            data: Some(json!({ "method": method })),
        }
    }

    /// Unknown tool name. Shares `-32601` with [`Self::method_not_found`];
    /// the two are told apart by message and by `data.name`.
    pub fn tool_not_found(name: &str) -> Self {
        Self {
            code: Self::METHOD_NOT_FOUND,
            message: "Tool not found".into(),
            data: Some(json!({ "name": name })),
        }
    }

    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self { code: Self::INVALID_PARAMS, message: detail.into(), data: None }
    }

    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self {
            code: Self::INTERNAL_ERROR,
            message: "Internal error".into(),
            data: Some(json!({ "message": detail.into() })),
        }
    }
}

/// Server-initiated JSON-RPC notification (no `id`, never answered).
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn progress(token: Value, progress: u32, total: u32, message: &str) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            method: "notifications/progress".into(),
            params: Some(json!({
                "progressToken": token,
                "progress": progress,
                "total": total,
                "message": message,
            })),
        }
    }
}

// ---------------------------------------------------------------------------
// MCP tool result layer (returned inside a *successful* JSON-RPC response)
// ---------------------------------------------------------------------------

/// MCP tool call result wrapper.
///
/// Payloads are always carried as text; structured output is JSON-encoded
/// into the single text block.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub content: Vec<ToolResultContent>,
    #[serde(rename = "isError")]
    pub is_error: bool,
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// A single content block inside a tool result.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResultContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolResultContent {
                content_type: "text".into(),
                text: text.into(),
            }],
            is_error: false,
            meta: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(text)
        }
    }

    /// Serialize `payload` as the text content of a successful result.
    pub fn json<T: Serialize>(payload: &T) -> Result<Self, ToolError> {
        Ok(Self::text(serde_json::to_string(payload)?))
    }

    pub fn into_error(mut self) -> Self {
        self.is_error = true;
        self
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

// ---------------------------------------------------------------------------
// Tool-level failures
// ---------------------------------------------------------------------------

/// A failure inside a tool handler.
///
/// Never surfaces as a JSON-RPC error: the dispatcher converts it into a
/// [`ToolResult`] with `isError: true`.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid arguments for {tool}: {detail}")]
    InvalidArguments { tool: &'static str, detail: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
    #[error("failed to serialize tool output: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("tool handler panicked: {0}")]
    Panicked(String),
    #[error("no argument validator registered for {0}")]
    MissingValidator(&'static str),
}

impl ToolError {
    pub fn invalid_arguments(tool: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidArguments { tool, detail: detail.into() }
    }
}

/// The text content is a small JSON object so agents can parse failures
/// the same way they parse successes.
impl From<ToolError> for ToolResult {
    fn from(err: ToolError) -> Self {
        let payload = json!({ "error": true, "message": err.to_string() });
        Self::error(payload.to_string())
    }
}
