pub mod admin;
pub mod analysis;
pub mod data;

use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::protocol::{
    InitializeParams, JsonRpcError, JsonRpcMessage, JsonRpcResponse, RpcId, ToolCallParams,
    ToolError, ToolResult, JSONRPC_VERSION,
};
use crate::server::ServerState;
use crate::tools::Tool;
use crate::transport::{Outbox, ProgressReporter};

/// Protocol version offered when the client does not name one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2025-03-26";

const SERVER_NAME: &str = "elfa-mcp-server";

const INSTRUCTIONS: &str = "Use elfa_* for ELFA data (requires x-elfa-api-key). \
                            Use ta_* to compute RSI/Bollinger on price arrays.";

/// Dispatch a JSON-RPC message to the appropriate handler.
///
/// Returns `None` for notifications (no response required). Every request
/// gets exactly one response, including when a tool fails.
pub async fn dispatch(
    msg: &JsonRpcMessage,
    state: &ServerState,
    outbox: &Outbox,
) -> Option<JsonRpcResponse> {
    let Some(id) = msg.id.clone() else {
        handle_notification(msg);
        return None;
    };

    if let Some(version) = msg.jsonrpc.as_deref().filter(|v| *v != JSONRPC_VERSION) {
        return Some(JsonRpcResponse::error(
            Some(id),
            JsonRpcError::invalid_request_with(format!("Unsupported jsonrpc version: {version}")),
        ));
    }

    let result = match msg.method.as_str() {
        "ping" | "logging/setLevel" => json!({}),

        "initialize" => initialize_result(msg.params.as_ref()),

        "resources/list" => json!({ "resources": [] }),
        "resources/templates/list" => json!({ "resourceTemplates": [] }),
        "resources/read" => json!({ "contents": [] }),
        "prompts/list" => json!({ "prompts": [] }),
        "prompts/get" => json!({ "description": "Prompt not available", "messages": [] }),

        "tools/list" => json!({ "tools": state.catalogue.definitions() }),

        "tools/call" => return Some(call_tool(id, msg.params.as_ref(), state, outbox).await),

        "completion/complete" => json!({
            "completion": { "values": [], "total": 0, "hasMore": false }
        }),

        other => {
            debug!(method = other, "method not found");
            return Some(JsonRpcResponse::error(
                Some(id),
                JsonRpcError::method_not_found(other),
            ));
        }
    };

    Some(JsonRpcResponse::success(Some(id), result))
}

fn handle_notification(msg: &JsonRpcMessage) {
    match msg.method.as_str() {
        "notifications/initialized" => info!("client initialized"),
        "notifications/cancelled" => {
            // In-flight tool calls always run to completion.
            let request_id = msg
                .params
                .as_ref()
                .and_then(|p| p.get("requestId"))
                .cloned()
                .unwrap_or(Value::Null);
            info!(request_id = %request_id, "client cancelled request");
        }
        other => debug!(method = other, "ignoring notification"),
    }
}

fn initialize_result(params: Option<&Value>) -> Value {
    let params: InitializeParams = params
        .and_then(|p| serde_json::from_value(p.clone()).ok())
        .unwrap_or_default();

    if let Some(client) = &params.client_info {
        info!(
            client = client.name.as_deref().unwrap_or("unknown"),
            version = client.version.as_deref().unwrap_or("unknown"),
            "initialize"
        );
    }

    let protocol_version = params
        .protocol_version
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_PROTOCOL_VERSION.to_string());

    json!({
        "protocolVersion": protocol_version,
        "capabilities": {
            "logging": {},
            "prompts": { "listChanged": false },
            "resources": { "subscribe": false, "listChanged": false },
            "tools": { "listChanged": false }
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        },
        "instructions": INSTRUCTIONS
    })
}

async fn call_tool(
    id: RpcId,
    params: Option<&Value>,
    state: &ServerState,
    outbox: &Outbox,
) -> JsonRpcResponse {
    let params: ToolCallParams = match params {
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(
                    Some(id),
                    JsonRpcError::invalid_params(format!("Invalid tools/call params: {e}")),
                );
            }
        },
        None => {
            return JsonRpcResponse::error(
                Some(id),
                JsonRpcError::invalid_params("Missing params for tools/call"),
            );
        }
    };

    let Some(tool) = state.catalogue.lookup(&params.name) else {
        debug!(name = %params.name, "tool not found");
        return JsonRpcResponse::error(Some(id), JsonRpcError::tool_not_found(&params.name));
    };

    let progress = ProgressReporter::new(params.progress_token(), outbox);
    let arguments = params.arguments.unwrap_or_else(|| json!({}));
    let started = Instant::now();

    let tool_result = match AssertUnwindSafe(run_tool(tool, arguments, state, &progress))
        .catch_unwind()
        .await
    {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => err.into(),
        Err(panic) => {
            let detail = panic_message(panic.as_ref());
            error!(tool = tool.name(), panic = %detail, "tool handler panicked");
            ToolError::Panicked(detail).into()
        }
    };

    info!(
        tool = tool.name(),
        is_error = tool_result.is_error,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "tool call finished"
    );

    match serde_json::to_value(&tool_result) {
        Ok(result) => JsonRpcResponse::success(Some(id), result),
        Err(e) => JsonRpcResponse::error(Some(id), JsonRpcError::internal_error(e.to_string())),
    }
}

/// Admin tools borrow the runtime state only for their synchronous body.
/// Data tools work from a snapshot of the config, so no borrow is held
/// across the HTTP request.
async fn run_tool(
    tool: Tool,
    arguments: Value,
    state: &ServerState,
    progress: &ProgressReporter<'_>,
) -> Result<ToolResult, ToolError> {
    state.catalogue.validate_arguments(tool, &arguments)?;

    let client = &state.client;

    match tool {
        Tool::SetAuth => admin::set_auth(parse_arguments(tool, arguments)?, &mut state.runtime_mut()),
        Tool::SetBase => admin::set_base(parse_arguments(tool, arguments)?, &mut state.runtime_mut()),
        Tool::ReloadEnv => admin::reload_env(&mut state.runtime_mut(), &state.env_loader),
        Tool::Status => admin::status(&state.runtime()),
        Tool::Query => {
            let config = state.config_snapshot();
            data::query(parse_arguments(tool, arguments)?, &config, client, progress).await
        }
        Tool::Trending | Tool::TrendingTokens => {
            let config = state.config_snapshot();
            data::trending_tokens(parse_arguments(tool, arguments)?, &config, client, progress).await
        }
        Tool::TokenNews => {
            let config = state.config_snapshot();
            data::token_news(parse_arguments(tool, arguments)?, &config, client, progress).await
        }
        Tool::KeywordMentions => {
            let config = state.config_snapshot();
            data::keyword_mentions(parse_arguments(tool, arguments)?, &config, client, progress).await
        }
        Tool::Rsi => analysis::rsi(parse_arguments(tool, arguments)?),
        Tool::Bollinger => analysis::bollinger(parse_arguments(tool, arguments)?),
        Tool::Summary => analysis::summary(parse_arguments(tool, arguments)?),
    }
}

fn parse_arguments<T: DeserializeOwned>(tool: Tool, arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::invalid_arguments(tool.name(), e.to_string()))
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
