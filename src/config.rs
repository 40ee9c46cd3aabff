use std::time::Duration;

use serde::Serialize;
use tracing::info;
use url::Url;

use crate::env::{EnvInfo, EnvLoader};

/// Default timeout for outbound ELFA calls (30 seconds).
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default maximum bytes per inbound JSON-RPC frame (1 MiB).
const DEFAULT_MAX_MESSAGE_BYTES: usize = 1024 * 1024;

pub const DEFAULT_BASE_URL: &str = "https://api.elfa.ai";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for 'base': {0}")]
    InvalidBaseUrl(String),
    #[error("unsupported URL scheme for 'base': {0} (expected http or https)")]
    UnsupportedScheme(String),
    #[error("unsupported headerName '{0}' (expected x-elfa-api-key or Authorization)")]
    UnsupportedHeader(String),
}

/// Startup configuration loaded from environment variables.
///
/// Fixed for the life of the process; the ELFA connection settings that
/// can change at runtime live in [`RuntimeConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_timeout: Duration,
    pub max_message_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment.
    ///
    /// - `ELFA_HTTP_TIMEOUT_SECS` (optional, default 30): deadline per outbound call
    /// - `ELFA_MAX_MESSAGE_BYTES` (optional, default 1 MiB): inbound frame limit
    pub fn from_env() -> Result<Self, String> {
        let http_timeout_secs = match std::env::var("ELFA_HTTP_TIMEOUT_SECS") {
            Ok(val) => val
                .parse::<u64>()
                .map_err(|_| "ELFA_HTTP_TIMEOUT_SECS must be a positive integer".to_string())?,
            Err(_) => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let max_message_bytes = match std::env::var("ELFA_MAX_MESSAGE_BYTES") {
            Ok(val) => val
                .parse::<usize>()
                .map_err(|_| "ELFA_MAX_MESSAGE_BYTES must be a positive integer".to_string())?,
            Err(_) => DEFAULT_MAX_MESSAGE_BYTES,
        };

        Ok(Self {
            http_timeout: Duration::from_secs(http_timeout_secs),
            max_message_bytes,
        })
    }
}

/// Which header carries the ELFA credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthHeader {
    ElfaApiKey,
    Authorization,
}

impl AuthHeader {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ElfaApiKey => "x-elfa-api-key",
            Self::Authorization => "Authorization",
        }
    }

    /// Case-insensitive match against the two supported header names.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("x-elfa-api-key") {
            Some(Self::ElfaApiKey)
        } else if name.eq_ignore_ascii_case("authorization") {
            Some(Self::Authorization)
        } else {
            None
        }
    }

    /// ELFA expects the raw key in `x-elfa-api-key`; `Authorization` gets a bearer token.
    pub fn default_scheme(self) -> &'static str {
        match self {
            Self::ElfaApiKey => "",
            Self::Authorization => "Bearer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub header: AuthHeader,
    pub scheme: String,
    pub key: String,
}

impl AuthConfig {
    /// Header value to send, or `None` when no key is configured.
    pub fn header_value(&self) -> Option<String> {
        if self.key.is_empty() {
            None
        } else if self.scheme.is_empty() {
            Some(self.key.clone())
        } else {
            Some(format!("{} {}", self.scheme, self.key))
        }
    }

    pub fn masked(&self) -> MaskedAuth {
        MaskedAuth {
            header_name: self.header.as_str(),
            scheme: self.scheme.clone(),
            key: mask_key(&self.key),
        }
    }
}

/// Auth settings safe to echo back to a caller.
#[derive(Debug, Clone, Serialize)]
pub struct MaskedAuth {
    #[serde(rename = "headerName")]
    pub header_name: &'static str,
    pub scheme: String,
    pub key: String,
}

/// ELFA connection settings read by every proxy call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Never ends with `/`.
    pub base_url: String,
    pub auth: AuthConfig,
}

impl RuntimeConfig {
    pub fn from_env(fallback_base: Option<&str>) -> Self {
        Self::from_lookup(|name| std::env::var(name).ok(), fallback_base)
    }

    /// Build from a variable lookup.
    ///
    /// `ELFA_BASE` wins over `fallback_base`, which wins over the built-in
    /// default. The key comes from `ELFA_API_KEY`, then `ELFA_KEY`.
    pub fn from_lookup<F>(lookup: F, fallback_base: Option<&str>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let base = non_empty("ELFA_BASE")
            .or_else(|| fallback_base.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let key = non_empty("ELFA_API_KEY")
            .or_else(|| non_empty("ELFA_KEY"))
            .map(|k| k.trim().to_string())
            .unwrap_or_default();

        let header = non_empty("ELFA_HEADER")
            .and_then(|h| AuthHeader::parse(&h))
            .unwrap_or(AuthHeader::ElfaApiKey);

        let scheme = non_empty("ELFA_AUTH_TYPE")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| header.default_scheme().to_string());

        Self {
            base_url: strip_trailing_slashes(base.trim()),
            auth: AuthConfig { header, scheme, key },
        }
    }
}

/// Validate a caller-supplied base URL and return it without trailing slashes.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidBaseUrl(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(strip_trailing_slashes(url.as_str())),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}

fn strip_trailing_slashes(s: &str) -> String {
    s.trim_end_matches('/').to_string()
}

/// Mask a secret for display.
///
/// Keys longer than 8 characters show the first and last four around an
/// ellipsis; shorter keys are starred except for their last two characters.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let n = chars.len();
    if n == 0 {
        return String::new();
    }
    if n <= 8 {
        let visible: String = chars[n.saturating_sub(2)..].iter().collect();
        return format!("{}{}", "*".repeat(n.saturating_sub(2)), visible);
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[n - 4..].iter().collect();
    format!("{head}…{tail}")
}

/// Mutable ELFA state owned by the server: connection settings plus the
/// diagnostics of the last `.env` load.
///
/// Only admin tools mutate it, and they do so without awaiting. Data tools
/// copy the config before their request goes out, so an update made while
/// a request is in flight applies from the next call on.
#[derive(Debug, Clone)]
pub struct RuntimeState {
    pub config: RuntimeConfig,
    pub env: EnvInfo,
}

impl RuntimeState {
    pub fn new(config: RuntimeConfig, env: EnvInfo) -> Self {
        Self { config, env }
    }

    /// Re-run `.env` discovery and rebuild the whole config from the
    /// environment, keeping the current base URL when `ELFA_BASE` is unset.
    pub fn reload(&mut self, loader: &EnvLoader) {
        let env = loader.load();
        let config = RuntimeConfig::from_env(Some(&self.config.base_url));
        info!(
            base = %config.base_url,
            header = config.auth.header.as_str(),
            key = %mask_key(&config.auth.key),
            "runtime config reloaded"
        );
        *self = Self { config, env };
    }
}
