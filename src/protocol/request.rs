use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// JSON-RPC 2.0 ID: a number or a string.
///
/// Numbers are kept as `serde_json::Number` so fractional and `u64` ids are
/// echoed back exactly as sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(Number),
    Str(String),
}

/// One inbound JSON-RPC 2.0 message.
///
/// A message without `id` is a notification and never receives a reply.
/// `method` defaults to the empty string so that an envelope missing it
/// still reaches the method table (and gets "method not found").
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcMessage {
    pub jsonrpc: Option<String>,
    pub id: Option<RpcId>,
    #[serde(default)]
    pub method: String,
    pub params: Option<Value>,
}

impl JsonRpcMessage {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// MCP `initialize` params.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: Option<String>,
    #[serde(rename = "clientInfo")]
    pub client_info: Option<ClientInfo>,
}

/// Client information sent during `initialize`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    pub name: Option<String>,
    pub version: Option<String>,
}

/// Parameters for `tools/call`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    pub arguments: Option<Value>,
    #[serde(rename = "_meta")]
    pub meta: Option<Value>,
}

impl ToolCallParams {
    /// The caller's opaque progress token, if one was supplied in `_meta`.
    pub fn progress_token(&self) -> Option<Value> {
        self.meta
            .as_ref()
            .and_then(|meta| meta.get("progressToken"))
            .filter(|token| !token.is_null())
            .cloned()
    }
}

// ---------------------------------------------------------------------------
// Tool arguments
// ---------------------------------------------------------------------------

/// A scalar forwarded verbatim as a downstream query parameter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum QueryScalar {
    Str(String),
    Num(Number),
    Bool(bool),
}

impl fmt::Display for QueryScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Num(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Keywords may be sent as a list or as one comma-separated string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Keywords {
    List(Vec<String>),
    Joined(String),
}

impl Keywords {
    pub fn joined(&self) -> String {
        match self {
            Self::List(items) => items.join(","),
            Self::Joined(s) => s.clone(),
        }
    }
}

/// Arguments for `elfa_set_auth`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAuthArgs {
    pub key: String,
    pub header_name: Option<String>,
    pub scheme: Option<String>,
}

/// Arguments for `elfa_set_base`.
#[derive(Debug, Clone, Deserialize)]
pub struct SetBaseArgs {
    pub base: String,
}

/// Arguments for `elfa_query`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryArgs {
    pub path: String,
    pub method: Option<String>,
    pub query: Option<Map<String, Value>>,
    pub body: Option<Value>,
}

/// Arguments for `elfa_trending` and `elfa_trending_tokens`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingArgs {
    pub timeframe: Option<String>,
    pub start: Option<QueryScalar>,
    pub end: Option<QueryScalar>,
    pub chain: Option<String>,
    pub limit: Option<QueryScalar>,
    pub cursor: Option<String>,
    pub min_mentions: Option<QueryScalar>,
}

/// Arguments for `elfa_token_news`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenNewsArgs {
    pub symbols: Option<String>,
    pub coin_ids: Option<String>,
    pub chain: Option<String>,
    pub start: Option<QueryScalar>,
    pub end: Option<QueryScalar>,
    pub time_window: Option<String>,
    pub limit: Option<QueryScalar>,
    pub cursor: Option<String>,
    pub sources: Option<String>,
}

/// Arguments for `elfa_keyword_mentions`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordMentionsArgs {
    pub keywords: Option<Keywords>,
    pub account_name: Option<String>,
    pub search_type: Option<String>,
    pub start: Option<QueryScalar>,
    pub end: Option<QueryScalar>,
    pub time_window: Option<String>,
    pub chain: Option<String>,
    pub limit: Option<QueryScalar>,
    pub cursor: Option<String>,
    pub sources: Option<String>,
}

/// Arguments for `ta_rsi`.
///
/// `values` stays loosely typed: entries that are not finite numbers are
/// dropped by the TA engine rather than rejected here.
#[derive(Debug, Clone, Deserialize)]
pub struct RsiArgs {
    pub values: Vec<Value>,
    pub period: Option<f64>,
}

/// Arguments for `ta_bollinger`.
#[derive(Debug, Clone, Deserialize)]
pub struct BollingerArgs {
    pub values: Vec<Value>,
    pub period: Option<f64>,
    pub mult: Option<f64>,
}

/// Arguments for `ta_summary`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryArgs {
    pub values: Vec<Value>,
    pub rsi_period: Option<f64>,
    pub bb_period: Option<f64>,
    pub bb_mult: Option<f64>,
}
