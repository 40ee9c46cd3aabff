//! Outbound calls to the ELFA HTTP API.
//!
//! Every call resolves to a [`ProxyResponse`]; neither non-2xx statuses nor
//! transport failures are raised past this module.

use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue, ACCEPT};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::{AuthHeader, RuntimeConfig};
use crate::protocol::QueryScalar;

pub const TRENDING_TOKENS_PATH: &str = "/v2/aggregations/trending-tokens";
pub const TOKEN_NEWS_PATH: &str = "/v2/data/token-news";
pub const KEYWORD_MENTIONS_PATH: &str = "/v2/data/keyword-mentions";

const USER_AGENT: &str = concat!("elfa-mcp-server/", env!("CARGO_PKG_VERSION"));

/// Status reported when a request fails before any response arrives.
const TRANSPORT_FAILURE_STATUS: u16 = 500;

/// Ordered query parameters; setting a name twice replaces the first value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name.to_string(), value)),
        }
    }

    pub fn set_opt<T: ToString>(&mut self, name: &str, value: Option<T>) {
        if let Some(v) = value {
            self.set(name, v.to_string());
        }
    }

    /// Encode an arbitrary JSON value. `null` is skipped, arrays are
    /// comma-joined and objects are sent as JSON text.
    pub fn set_value(&mut self, name: &str, value: &Value) {
        if let Some(encoded) = encode_value(value) {
            self.set(name, encoded);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn encode_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(encode_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Time-range selection for the data endpoints.
///
/// Explicit bounds and a relative window are mutually exclusive on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeRange {
    Explicit { from: String, to: String },
    Window(String),
}

impl TimeRange {
    /// Explicit only when both bounds are given; otherwise the caller's
    /// window, falling back to `default_window`.
    pub fn resolve(
        start: Option<&QueryScalar>,
        end: Option<&QueryScalar>,
        window: Option<&str>,
        default_window: &str,
    ) -> Self {
        match (start, end) {
            (Some(from), Some(to)) => Self::Explicit {
                from: from.to_string(),
                to: to.to_string(),
            },
            _ => Self::Window(
                window
                    .filter(|w| !w.trim().is_empty())
                    .unwrap_or(default_window)
                    .to_string(),
            ),
        }
    }

    pub fn apply(&self, query: &mut QueryParams) {
        match self {
            Self::Explicit { from, to } => {
                query.set("from", from.as_str());
                query.set("to", to.as_str());
            }
            Self::Window(window) => query.set("timeWindow", window.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub path: String,
    pub method: Method,
    pub query: QueryParams,
    /// Sent as JSON for any method other than GET.
    pub body: Option<Value>,
}

impl ProxyRequest {
    pub fn get(path: &str, query: QueryParams) -> Self {
        Self {
            path: path.to_string(),
            method: Method::GET,
            query,
            body: None,
        }
    }
}

/// Normalized outcome of one proxy call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProxyResponse {
    pub ok: bool,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProxyResponse {
    fn failure(status: u16, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            status,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElfaClient {
    http: reqwest::Client,
}

impl ElfaClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    /// Resolve `path` against `base_url` and attach the query.
    ///
    /// Rejects paths that would leave the base URL's origin, so a caller
    /// cannot redirect the auth header to another host.
    pub fn request_url(base_url: &str, path: &str, query: &QueryParams) -> Result<Url, String> {
        let base = Url::parse(base_url).map_err(|e| format!("invalid base URL: {e}"))?;
        let mut url = base
            .join(path)
            .map_err(|e| format!("invalid path '{path}': {e}"))?;
        if url.origin() != base.origin() {
            return Err(format!("path '{path}' resolves outside {base_url}"));
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }

    pub async fn send(&self, config: &RuntimeConfig, request: &ProxyRequest) -> ProxyResponse {
        let url = match Self::request_url(&config.base_url, &request.path, &request.query) {
            Ok(url) => url,
            Err(e) => {
                warn!(path = %request.path, error = %e, "rejected ELFA request");
                return ProxyResponse::failure(400, e);
            }
        };

        let mut builder = self
            .http
            .request(request.method.clone(), url.clone())
            .header(ACCEPT, "application/json");

        if let Some(value) = config.auth.header_value() {
            let name = HeaderName::from_static(auth_header_name(config));
            match HeaderValue::from_str(&value) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    builder = builder.header(name, value);
                }
                Err(e) => warn!(error = %e, "auth key is not a valid header value; sending without it"),
            }
        }

        if let Some(body) = request.body.as_ref().filter(|_| request.method != Method::GET) {
            builder = builder.json(body);
        }

        debug!(method = %request.method, url = %url, "ELFA request");

        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                let status = e.status().map(|s| s.as_u16()).unwrap_or(TRANSPORT_FAILURE_STATUS);
                let message = e.to_string();
                warn!(status, path = %request.path, error = %message, "ELFA request failed");
                return ProxyResponse::failure(
                    status,
                    if message.is_empty() { "request failed".to_string() } else { message },
                );
            }
        };

        let status = response.status();
        let raw = match response.text().await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(status = status.as_u16(), path = %request.path, error = %e, "failed to read ELFA response body");
                return ProxyResponse::failure(status.as_u16(), e.to_string());
            }
        };

        let data = parse_body(&raw);
        if status.is_success() {
            return ProxyResponse {
                ok: true,
                status: status.as_u16(),
                data: Some(data),
                error: None,
            };
        }

        let error = upstream_error(&data)
            .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
        warn!(status = status.as_u16(), path = %request.path, error = %error, "ELFA returned an error status");
        ProxyResponse {
            ok: false,
            status: status.as_u16(),
            data: Some(data),
            error: Some(error),
        }
    }
}

fn auth_header_name(config: &RuntimeConfig) -> &'static str {
    // HeaderName::from_static requires lowercase.
    match config.auth.header {
        AuthHeader::ElfaApiKey => "x-elfa-api-key",
        AuthHeader::Authorization => "authorization",
    }
}

/// JSON when possible, `{"raw": text}` otherwise, `null` for an empty body.
fn parse_body(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::json!({ "raw": raw }))
}

fn upstream_error(data: &Value) -> Option<String> {
    ["error", "message"].iter().find_map(|field| match data.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Object(inner)) => inner
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    })
}
