use serde::Serialize;
use tracing::info;

use crate::config::{normalize_base_url, AuthConfig, AuthHeader, ConfigError, MaskedAuth, RuntimeState};
use crate::env::{EnvInfo, EnvLoader};
use crate::protocol::{SetAuthArgs, SetBaseArgs, ToolError, ToolResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    ok: bool,
    #[serde(flatten)]
    auth: MaskedAuth,
}

#[derive(Debug, Serialize)]
struct BaseResponse<'a> {
    ok: bool,
    base: &'a str,
}

#[derive(Debug, Serialize)]
struct StatusResponse<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    ok: Option<bool>,
    base: &'a str,
    #[serde(flatten)]
    env: &'a EnvInfo,
    auth: MaskedAuth,
}

/// Handle `elfa_set_auth`.
///
/// Changing the header without naming a scheme switches to that header's
/// default scheme; otherwise the current scheme is kept.
pub fn set_auth(args: SetAuthArgs, runtime: &mut RuntimeState) -> Result<ToolResult, ToolError> {
    let key = args.key.trim();
    if key.is_empty() {
        return Err(ToolError::invalid_arguments("elfa_set_auth", "'key' must be a non-empty string"));
    }

    let current = &runtime.config.auth;
    let header = match args.header_name.as_deref() {
        Some(name) => AuthHeader::parse(name).ok_or_else(|| ConfigError::UnsupportedHeader(name.to_string()))?,
        None => current.header,
    };
    let scheme = match args.scheme {
        Some(scheme) => scheme.trim().to_string(),
        None if header != current.header => header.default_scheme().to_string(),
        None => current.scheme.clone(),
    };

    runtime.config.auth = AuthConfig {
        header,
        scheme,
        key: key.to_string(),
    };

    let masked = runtime.config.auth.masked();
    info!(header = masked.header_name, scheme = %masked.scheme, key = %masked.key, "ELFA auth updated");
    ToolResult::json(&AuthResponse { ok: true, auth: masked })
}

/// Handle `elfa_set_base`.
pub fn set_base(args: SetBaseArgs, runtime: &mut RuntimeState) -> Result<ToolResult, ToolError> {
    runtime.config.base_url = normalize_base_url(&args.base)?;
    info!(base = %runtime.config.base_url, "ELFA base URL updated");
    ToolResult::json(&BaseResponse {
        ok: true,
        base: &runtime.config.base_url,
    })
}

/// Handle `elfa_reload_env`.
pub fn reload_env(runtime: &mut RuntimeState, loader: &EnvLoader) -> Result<ToolResult, ToolError> {
    runtime.reload(loader);
    ToolResult::json(&status_response(runtime, Some(true)))
}

/// Handle `elfa_status`.
pub fn status(runtime: &RuntimeState) -> Result<ToolResult, ToolError> {
    ToolResult::json(&status_response(runtime, None))
}

fn status_response(runtime: &RuntimeState, ok: Option<bool>) -> StatusResponse<'_> {
    StatusResponse {
        ok,
        base: &runtime.config.base_url,
        env: &runtime.env,
        auth: runtime.config.auth.masked(),
    }
}
