use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{error, warn};

use crate::protocol::JsonRpcNotification;

/// Queue of complete outbound JSON-RPC lines.
///
/// Replies and progress notifications share this queue, and a single
/// writer drains it, so lines reach the output stream whole and in the
/// order they were queued.
#[derive(Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<String>,
}

impl Outbox {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send<T: Serialize>(&self, message: &T) {
        let line = match serde_json::to_string(message) {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "failed to serialize outbound message");
                return;
            }
        };
        if self.tx.send(line).is_err() {
            warn!("output stream closed; dropping outbound message");
        }
    }
}

/// Emits `notifications/progress` for one tool call.
///
/// Does nothing when the caller supplied no progress token.
pub struct ProgressReporter<'a> {
    token: Option<Value>,
    outbox: &'a Outbox,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(token: Option<Value>, outbox: &'a Outbox) -> Self {
        Self { token, outbox }
    }

    pub fn report(&self, progress: u32, total: u32, message: &str) {
        if let Some(token) = &self.token {
            self.outbox
                .send(&JsonRpcNotification::progress(token.clone(), progress, total, message));
        }
    }
}
