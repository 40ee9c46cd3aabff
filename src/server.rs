use std::cell::{Ref, RefCell, RefMut};
use std::panic::AssertUnwindSafe;
use std::rc::Rc;

use futures_util::FutureExt;
use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::task::LocalSet;
use tracing::{debug, error, warn};

use crate::config::{RuntimeConfig, RuntimeState, ServerConfig};
use crate::env::EnvLoader;
use crate::handlers;
use crate::protocol::{JsonRpcError, JsonRpcMessage, JsonRpcResponse, RpcId};
use crate::proxy::ElfaClient;
use crate::tools::{CatalogueError, ToolCatalogue};
use crate::transport::Outbox;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error on JSON-RPC stream: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error(transparent)]
    Catalogue(#[from] CatalogueError),
}

/// Everything a dispatch needs: the immutable catalogue, the mutable ELFA
/// runtime state, and the collaborators used by the tools.
pub struct ServerState {
    pub catalogue: ToolCatalogue,
    runtime: RefCell<RuntimeState>,
    pub client: ElfaClient,
    pub env_loader: EnvLoader,
}

impl ServerState {
    pub fn new(
        config: &ServerConfig,
        runtime: RuntimeState,
        env_loader: EnvLoader,
    ) -> Result<Self, ServerError> {
        Ok(Self {
            catalogue: ToolCatalogue::new()?,
            runtime: RefCell::new(runtime),
            client: ElfaClient::new(config.http_timeout)?,
            env_loader,
        })
    }

    pub fn runtime(&self) -> Ref<'_, RuntimeState> {
        self.runtime.borrow()
    }

    /// Never hold the returned guard across an await point.
    pub fn runtime_mut(&self) -> RefMut<'_, RuntimeState> {
        self.runtime.borrow_mut()
    }

    pub fn config_snapshot(&self) -> RuntimeConfig {
        self.runtime.borrow().config.clone()
    }
}

/// MCP server that communicates over newline-delimited JSON-RPC 2.0.
///
/// Each line runs as its own task on a `LocalSet`, so a slow ELFA request
/// does not hold up reading or answering later lines. The elements of a
/// batch are still dispatched one after another, in order.
pub struct McpServer {
    state: Rc<ServerState>,
    max_message_bytes: usize,
}

impl McpServer {
    pub fn new(state: ServerState, config: &ServerConfig) -> Self {
        Self {
            state: Rc::new(state),
            max_message_bytes: config.max_message_bytes,
        }
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    pub async fn run(&self) -> Result<(), ServerError> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve until `reader` reaches EOF and every in-flight request has
    /// been answered, then flush all queued output.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<(), ServerError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (outbox, mut rx) = Outbox::channel();
        let state = Rc::clone(&self.state);
        let max_message_bytes = self.max_message_bytes;

        let read_side = async move {
            let result = read_loop(reader, state, &outbox, max_message_bytes).await;
            // Line tasks hold their own handles; the writer finishes once
            // the last of them is done.
            drop(outbox);
            result
        };

        let write_side = async {
            while let Some(line) = rx.recv().await {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<(), ServerError>(())
        };

        LocalSet::new()
            .run_until(async { tokio::try_join!(read_side, write_side) })
            .await?;
        Ok(())
    }
}

async fn read_loop<R>(
    reader: R,
    state: Rc<ServerState>,
    outbox: &Outbox,
    max_message_bytes: usize,
) -> Result<(), ServerError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut raw = Vec::new();

    loop {
        raw.clear();
        let n = reader.read_until(b'\n', &mut raw).await?;
        if n == 0 {
            break;
        }

        if n > max_message_bytes {
            warn!(bytes = n, limit = max_message_bytes, "dropping oversized frame");
            continue;
        }

        let trimmed = match std::str::from_utf8(&raw) {
            Ok(s) => s.trim(),
            Err(e) => {
                warn!(error = %e, "dropping frame that is not valid UTF-8");
                continue;
            }
        };

        if trimmed.is_empty() {
            continue;
        }

        let frame: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "dropping non-JSON line from host");
                continue;
            }
        };

        tokio::task::spawn_local(process_frame(frame, Rc::clone(&state), outbox.clone()));
    }

    Ok(())
}

async fn process_frame(frame: Value, state: Rc<ServerState>, outbox: Outbox) {
    match frame {
        Value::Array(batch) => {
            for item in batch {
                process_message(item, &state, &outbox).await;
            }
        }
        single => process_message(single, &state, &outbox).await,
    }
}

/// Dispatch one message and queue its reply, if any.
///
/// A panic anywhere in dispatch still answers the request with an
/// internal error; the server keeps running.
async fn process_message(value: Value, state: &ServerState, outbox: &Outbox) {
    let msg = match JsonRpcMessage::deserialize(&value) {
        Ok(m) => m,
        Err(e) => {
            match reject_envelope(&value, &e) {
                Some(response) => outbox.send(&response),
                None => warn!(error = %e, "dropping message without a usable JSON-RPC envelope"),
            }
            return;
        }
    };

    match AssertUnwindSafe(handlers::dispatch(&msg, state, outbox))
        .catch_unwind()
        .await
    {
        Ok(Some(response)) => outbox.send(&response),
        Ok(None) => {}
        Err(_) => {
            error!(method = %msg.method, "dispatch panicked");
            if msg.id.is_some() {
                outbox.send(&JsonRpcResponse::error(
                    msg.id.clone(),
                    JsonRpcError::internal_error(format!("{} failed unexpectedly", msg.method)),
                ));
            }
        }
    }
}

/// Error reply for an envelope that carries a usable id but does not
/// otherwise parse. Without such an id there is nobody to answer.
fn reject_envelope(value: &Value, parse_error: &serde_json::Error) -> Option<JsonRpcResponse> {
    let id: RpcId = serde_json::from_value(value.get("id")?.clone()).ok()?;
    debug!(id = ?id, error = %parse_error, "rejecting malformed envelope");

    let error = match value.get("method") {
        Some(method) if !method.is_string() => JsonRpcError::method_not_found(&method.to_string()),
        _ => JsonRpcError::invalid_request_with(format!("Invalid request: {parse_error}")),
    };
    Some(JsonRpcResponse::error(Some(id), error))
}
