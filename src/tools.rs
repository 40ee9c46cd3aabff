//! The fixed tool catalogue.
//!
//! Tools form a closed set ([`Tool`]); the wire name is only looked up at
//! the `tools/call` boundary. Each tool's `inputSchema` is compiled once at
//! startup and every call's arguments are checked against it before being
//! deserialized into the tool's argument struct.

use jsonschema::Validator;
use serde::Serialize;
use serde_json::{json, Value};

use crate::protocol::ToolError;
use crate::schema::{self, SchemaValidationError};

#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    #[error("input schema for {tool} does not compile: {source}")]
    Schema {
        tool: &'static str,
        source: SchemaValidationError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    SetAuth,
    SetBase,
    ReloadEnv,
    Status,
    Query,
    Trending,
    TrendingTokens,
    TokenNews,
    KeywordMentions,
    Rsi,
    Bollinger,
    Summary,
}

impl Tool {
    /// Catalogue order, as advertised by `tools/list`.
    pub const ALL: [Tool; 12] = [
        Tool::SetAuth,
        Tool::SetBase,
        Tool::ReloadEnv,
        Tool::Status,
        Tool::Query,
        Tool::Trending,
        Tool::TrendingTokens,
        Tool::TokenNews,
        Tool::KeywordMentions,
        Tool::Rsi,
        Tool::Bollinger,
        Tool::Summary,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tool::SetAuth => "elfa_set_auth",
            Tool::SetBase => "elfa_set_base",
            Tool::ReloadEnv => "elfa_reload_env",
            Tool::Status => "elfa_status",
            Tool::Query => "elfa_query",
            Tool::Trending => "elfa_trending",
            Tool::TrendingTokens => "elfa_trending_tokens",
            Tool::TokenNews => "elfa_token_news",
            Tool::KeywordMentions => "elfa_keyword_mentions",
            Tool::Rsi => "ta_rsi",
            Tool::Bollinger => "ta_bollinger",
            Tool::Summary => "ta_summary",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Tool::SetAuth => "Set ELFA API auth. Params: key (string), headerName (Authorization|x-elfa-api-key), scheme (e.g., Bearer).",
            Tool::SetBase => "Set ELFA base URL (e.g., https://api.elfa.ai).",
            Tool::ReloadEnv => "Reload .env files from common locations.",
            Tool::Status => "Show current ELFA config (key masked) and .env load info.",
            Tool::Query => "Generic ELFA proxy. Call any ELFA path with method/query/body. Returns JSON.",
            Tool::Trending => "Alias to /v2/aggregations/trending-tokens (timeframe, chain, limit, cursor).",
            Tool::TrendingTokens => "Trending tokens aggregation. Params: timeframe, chain, limit, cursor; start+end override timeframe.",
            Tool::TokenNews => "Token news. Params: symbols (comma), chain, start, end, limit, cursor, sources.",
            Tool::KeywordMentions => "Multi-keyword mentions. Params: keywords (array|string), start, end, chain, limit, cursor, sources.",
            Tool::Rsi => "Compute RSI (Wilder). Inputs: values:number[] (oldest→newest), period?:number(14). Returns latest RSI.",
            Tool::Bollinger => "Compute Bollinger Bands (SMA + population stdev). Inputs: values:number[] (oldest→newest), period?:number(20), mult?:number(2).",
            Tool::Summary => "Return both RSI and Bollinger in one call. Inputs: values:number[] (oldest→newest), rsiPeriod?:number(14), bbPeriod?:number(20), bbMult?:number(2).",
        }
    }

    pub fn annotations(self) -> ToolAnnotations {
        let (title, read_only_hint, open_world_hint) = match self {
            Tool::SetAuth => ("ELFA: Set Auth", false, false),
            Tool::SetBase => ("ELFA: Set Base URL", false, false),
            Tool::ReloadEnv => ("ELFA: Reload .env", false, false),
            Tool::Status => ("ELFA: Status", true, false),
            Tool::Query => ("ELFA: Generic Query", true, true),
            Tool::Trending => ("ELFA: Trending (Alias)", true, true),
            Tool::TrendingTokens => ("ELFA: Trending Tokens", true, true),
            Tool::TokenNews => ("ELFA: Token News", true, true),
            Tool::KeywordMentions => ("ELFA: Keyword Mentions", true, true),
            Tool::Rsi => ("TA: RSI", true, false),
            Tool::Bollinger => ("TA: Bollinger Bands", true, false),
            Tool::Summary => ("TA: Summary", true, false),
        };
        ToolAnnotations {
            title,
            read_only_hint,
            open_world_hint,
        }
    }

    pub fn input_schema(self) -> Value {
        let scalar = json!({ "type": ["string", "number"] });
        let period = json!({ "type": "integer", "minimum": 1 });
        let mult = json!({ "type": "number", "minimum": 0 });
        let values = json!({
            "type": "array",
            "description": "Closing prices, oldest to newest. Entries that are not numbers or numeric strings are skipped.",
            "items": {}
        });

        match self {
            Tool::SetAuth => json!({
                "type": "object",
                "properties": {
                    "key": { "type": "string", "minLength": 1 },
                    "headerName": { "type": "string" },
                    "scheme": { "type": "string" }
                },
                "required": ["key"]
            }),
            Tool::SetBase => json!({
                "type": "object",
                "properties": { "base": { "type": "string" } },
                "required": ["base"]
            }),
            Tool::ReloadEnv | Tool::Status => json!({ "type": "object", "properties": {} }),
            Tool::Query => json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "ELFA path like /v2/..." },
                    "method": { "type": "string", "description": "HTTP method" },
                    "query": { "type": "object", "description": "Query params map" },
                    "body": { "type": "object", "description": "JSON body for non-GET" }
                },
                "required": ["path"]
            }),
            Tool::Trending | Tool::TrendingTokens => json!({
                "type": "object",
                "properties": {
                    "timeframe": { "type": "string", "description": "24h, 7d, 30d" },
                    "start": scalar,
                    "end": scalar,
                    "chain": { "type": "string" },
                    "limit": { "type": "number" },
                    "cursor": { "type": "string" },
                    "minMentions": { "type": "number" }
                }
            }),
            Tool::TokenNews => json!({
                "type": "object",
                "properties": {
                    "symbols": { "type": "string" },
                    "coinIds": { "type": "string" },
                    "chain": { "type": "string" },
                    "start": scalar,
                    "end": scalar,
                    "timeWindow": { "type": "string" },
                    "limit": { "type": "number" },
                    "cursor": { "type": "string" },
                    "sources": { "type": "string" }
                }
            }),
            Tool::KeywordMentions => json!({
                "type": "object",
                "properties": {
                    "keywords": {
                        "type": ["array", "string"],
                        "items": { "type": "string" }
                    },
                    "accountName": { "type": "string" },
                    "searchType": { "type": "string" },
                    "start": scalar,
                    "end": scalar,
                    "timeWindow": { "type": "string" },
                    "chain": { "type": "string" },
                    "limit": { "type": "number" },
                    "cursor": { "type": "string" },
                    "sources": { "type": "string" }
                }
            }),
            Tool::Rsi => json!({
                "type": "object",
                "properties": { "values": values, "period": period },
                "required": ["values"]
            }),
            Tool::Bollinger => json!({
                "type": "object",
                "properties": { "values": values, "period": period, "mult": mult },
                "required": ["values"]
            }),
            Tool::Summary => json!({
                "type": "object",
                "properties": {
                    "values": values,
                    "rsiPeriod": period,
                    "bbPeriod": period,
                    "bbMult": mult
                },
                "required": ["values"]
            }),
        }
    }

    pub fn definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.name(),
            description: self.description(),
            input_schema: self.input_schema(),
            annotations: self.annotations(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    pub title: &'static str,
    pub read_only_hint: bool,
    pub open_world_hint: bool,
}

/// One `tools/list` entry.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    pub annotations: ToolAnnotations,
}

/// Immutable catalogue built once at startup.
pub struct ToolCatalogue {
    definitions: Vec<ToolDefinition>,
    validators: Vec<(Tool, Validator)>,
}

impl ToolCatalogue {
    pub fn new() -> Result<Self, CatalogueError> {
        let definitions: Vec<ToolDefinition> = Tool::ALL.iter().map(|t| t.definition()).collect();
        let validators = Tool::ALL
            .iter()
            .zip(&definitions)
            .map(|(tool, def)| {
                schema::compile(&def.input_schema)
                    .map(|validator| (*tool, validator))
                    .map_err(|source| CatalogueError::Schema {
                        tool: def.name,
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            definitions,
            validators,
        })
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn lookup(&self, name: &str) -> Option<Tool> {
        Tool::from_name(name)
    }

    /// Check `arguments` against the tool's `inputSchema`.
    pub fn validate_arguments(&self, tool: Tool, arguments: &Value) -> Result<(), ToolError> {
        let (_, validator) = self
            .validators
            .iter()
            .find(|(candidate, _)| *candidate == tool)
            .ok_or(ToolError::MissingValidator(tool.name()))?;
        schema::check(validator, arguments)
            .map_err(|e| ToolError::invalid_arguments(tool.name(), e.to_string()))
    }
}
