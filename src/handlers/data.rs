use reqwest::Method;
use serde_json::json;

use crate::config::RuntimeConfig;
use crate::protocol::{
    KeywordMentionsArgs, QueryArgs, TokenNewsArgs, ToolError, ToolResult, TrendingArgs,
};
use crate::proxy::{
    ElfaClient, ProxyRequest, QueryParams, TimeRange, KEYWORD_MENTIONS_PATH, TOKEN_NEWS_PATH,
    TRENDING_TOKENS_PATH,
};
use crate::transport::ProgressReporter;

const TRENDING_DEFAULT_WINDOW: &str = "7d";
const TOKEN_NEWS_DEFAULT_WINDOW: &str = "30d";
const KEYWORD_MENTIONS_DEFAULT_WINDOW: &str = "30d";

/// Handle `elfa_query`: forward an arbitrary path/method/query/body.
pub async fn query(
    args: QueryArgs,
    config: &RuntimeConfig,
    client: &ElfaClient,
    progress: &ProgressReporter<'_>,
) -> Result<ToolResult, ToolError> {
    let method_name = args.method.as_deref().unwrap_or("GET").trim().to_ascii_uppercase();
    let method = Method::from_bytes(method_name.as_bytes())
        .map_err(|_| ToolError::UnsupportedMethod(method_name.clone()))?;

    let mut params = QueryParams::default();
    for (name, value) in args.query.iter().flatten() {
        params.set_value(name, value);
    }

    let request = ProxyRequest {
        path: args.path,
        method,
        query: params,
        body: args.body,
    };
    forward(&request, config, client, progress).await
}

/// Handle `elfa_trending_tokens` (and its alias `elfa_trending`).
pub async fn trending_tokens(
    args: TrendingArgs,
    config: &RuntimeConfig,
    client: &ElfaClient,
    progress: &ProgressReporter<'_>,
) -> Result<ToolResult, ToolError> {
    let mut params = QueryParams::default();
    params.set_opt("chain", args.chain);
    params.set_opt("limit", args.limit);
    params.set_opt("cursor", args.cursor);
    params.set_opt("minMentions", args.min_mentions);
    TimeRange::resolve(
        args.start.as_ref(),
        args.end.as_ref(),
        args.timeframe.as_deref(),
        TRENDING_DEFAULT_WINDOW,
    )
    .apply(&mut params);

    forward(&ProxyRequest::get(TRENDING_TOKENS_PATH, params), config, client, progress).await
}

/// Handle `elfa_token_news`.
pub async fn token_news(
    args: TokenNewsArgs,
    config: &RuntimeConfig,
    client: &ElfaClient,
    progress: &ProgressReporter<'_>,
) -> Result<ToolResult, ToolError> {
    let mut params = QueryParams::default();
    params.set_opt("symbols", args.symbols);
    params.set_opt("coinIds", args.coin_ids);
    params.set_opt("chain", args.chain);
    params.set_opt("limit", args.limit);
    params.set_opt("cursor", args.cursor);
    params.set_opt("sources", args.sources);
    TimeRange::resolve(
        args.start.as_ref(),
        args.end.as_ref(),
        args.time_window.as_deref(),
        TOKEN_NEWS_DEFAULT_WINDOW,
    )
    .apply(&mut params);

    forward(&ProxyRequest::get(TOKEN_NEWS_PATH, params), config, client, progress).await
}

/// Handle `elfa_keyword_mentions`.
pub async fn keyword_mentions(
    args: KeywordMentionsArgs,
    config: &RuntimeConfig,
    client: &ElfaClient,
    progress: &ProgressReporter<'_>,
) -> Result<ToolResult, ToolError> {
    let mut params = QueryParams::default();
    params.set_opt("keywords", args.keywords.as_ref().map(|k| k.joined()));
    params.set_opt("accountName", args.account_name);
    params.set_opt("searchType", args.search_type);
    params.set_opt("chain", args.chain);
    params.set_opt("limit", args.limit);
    params.set_opt("cursor", args.cursor);
    params.set_opt("sources", args.sources);
    TimeRange::resolve(
        args.start.as_ref(),
        args.end.as_ref(),
        args.time_window.as_deref(),
        KEYWORD_MENTIONS_DEFAULT_WINDOW,
    )
    .apply(&mut params);

    forward(&ProxyRequest::get(KEYWORD_MENTIONS_PATH, params), config, client, progress).await
}

/// The proxy primitive every data tool goes through.
///
/// A failed call is still a tool result: `isError` is set and the upstream
/// status is echoed in `_meta`.
async fn forward(
    request: &ProxyRequest,
    config: &RuntimeConfig,
    client: &ElfaClient,
    progress: &ProgressReporter<'_>,
) -> Result<ToolResult, ToolError> {
    progress.report(1, 3, "Calling ELFA");
    let response = client.send(config, request).await;
    progress.report(2, 3, "Formatting result");

    if !response.ok {
        return Ok(ToolResult::json(&response)?
            .into_error()
            .with_meta(json!({ "status": response.status })));
    }

    progress.report(3, 3, "Done");
    ToolResult::json(&response)
}
