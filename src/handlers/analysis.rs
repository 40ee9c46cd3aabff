use serde::Serialize;
use serde_json::Value;

use crate::protocol::{BollingerArgs, RsiArgs, SummaryArgs, ToolError, ToolResult};
use crate::ta::{
    self, BollingerBands, DEFAULT_BOLLINGER_MULT, DEFAULT_BOLLINGER_PERIOD, DEFAULT_RSI_PERIOD,
};

const VALUES_REQUIRED: &str = "'values' must be a non-empty array of numbers (oldest → newest)";

#[derive(Debug, Serialize)]
struct RsiResponse {
    ok: bool,
    rsi: Option<f64>,
    period: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BollingerResponse {
    ok: bool,
    mean: Option<f64>,
    upper: Option<f64>,
    lower: Option<f64>,
    last: Option<f64>,
    percent_b: Option<f64>,
    bandwidth: Option<f64>,
    period: usize,
    mult: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    ok: bool,
    rsi: Option<f64>,
    bollinger: Option<BollingerBands>,
    rsi_period: usize,
    bb_period: usize,
    bb_mult: f64,
}

/// Handle `ta_rsi`.
pub fn rsi(args: RsiArgs) -> Result<ToolResult, ToolError> {
    let closes = closes("ta_rsi", &args.values)?;
    let period = period_or(args.period, DEFAULT_RSI_PERIOD);

    ToolResult::json(&RsiResponse {
        ok: true,
        rsi: ta::rsi(&closes, period),
        period,
    })
}

/// Handle `ta_bollinger`.
pub fn bollinger(args: BollingerArgs) -> Result<ToolResult, ToolError> {
    let closes = closes("ta_bollinger", &args.values)?;
    let period = period_or(args.period, DEFAULT_BOLLINGER_PERIOD);
    let mult = args.mult.unwrap_or(DEFAULT_BOLLINGER_MULT);
    let bands = ta::bollinger(&closes, period, mult);

    ToolResult::json(&BollingerResponse {
        ok: true,
        mean: bands.map(|b| b.mean),
        upper: bands.map(|b| b.upper),
        lower: bands.map(|b| b.lower),
        last: bands.map(|b| b.last),
        percent_b: bands.and_then(|b| b.percent_b),
        bandwidth: bands.and_then(|b| b.bandwidth),
        period,
        mult,
    })
}

/// Handle `ta_summary`: both indicators over the same series.
pub fn summary(args: SummaryArgs) -> Result<ToolResult, ToolError> {
    let closes = closes("ta_summary", &args.values)?;
    let rsi_period = period_or(args.rsi_period, DEFAULT_RSI_PERIOD);
    let bb_period = period_or(args.bb_period, DEFAULT_BOLLINGER_PERIOD);
    let bb_mult = args.bb_mult.unwrap_or(DEFAULT_BOLLINGER_MULT);

    ToolResult::json(&SummaryResponse {
        ok: true,
        rsi: ta::rsi(&closes, rsi_period),
        bollinger: ta::bollinger(&closes, bb_period, bb_mult),
        rsi_period,
        bb_period,
        bb_mult,
    })
}

/// An empty `values` array is a tool error; an array whose entries are
/// all unusable is not (the indicators simply come back null).
fn closes(tool: &'static str, values: &[Value]) -> Result<Vec<f64>, ToolError> {
    if values.is_empty() {
        return Err(ToolError::invalid_arguments(tool, VALUES_REQUIRED));
    }
    Ok(ta::normalize(values))
}

/// The input schema already guarantees an integer >= 1.
fn period_or(period: Option<f64>, default: usize) -> usize {
    period.map(|p| p as usize).unwrap_or(default)
}
