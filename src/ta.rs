//! Technical analysis over closing prices: RSI (Wilder) and Bollinger Bands.
//!
//! Pure functions, no I/O. Inputs are ordered oldest to newest and only the
//! latest value of each indicator is returned. Non-finite samples are
//! dropped before any computation, so a series with such gaps behaves
//! exactly like the same series with those entries removed.

use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_BOLLINGER_PERIOD: usize = 20;
pub const DEFAULT_BOLLINGER_MULT: f64 = 2.0;

/// Coerce loosely-typed JSON samples into finite prices.
///
/// Numbers and numeric strings are kept; everything else (nulls, booleans,
/// non-numeric strings, nested values) is dropped.
pub fn normalize(values: &[Value]) -> Vec<f64> {
    values
        .iter()
        .filter_map(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|x| x.is_finite())
        .collect()
}

/// Latest RSI using Wilder's smoothing.
///
/// Needs at least `period + 1` finite samples. The first `period` deltas
/// seed the average gain/loss with a simple mean; each later delta is
/// folded in as `avg = (avg * (period - 1) + current) / period`.
///
/// A flat series yields 50, a series with no losses yields 100, and the
/// result is clamped to `[0, 100]`.
pub fn rsi(values: &[f64], period: usize) -> Option<f64> {
    let closes: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    if period == 0 || closes.len() <= period {
        return None;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let period_f = period as f64;

    let (gains, losses) = deltas[..period].iter().fold((0.0_f64, 0.0_f64), |(g, l), &d| {
        if d >= 0.0 {
            (g + d, l)
        } else {
            (g, l - d)
        }
    });
    let mut avg_gain = gains / period_f;
    let mut avg_loss = losses / period_f;

    for &d in &deltas[period..] {
        let gain = if d > 0.0 { d } else { 0.0 };
        let loss = if d < 0.0 { -d } else { 0.0 };
        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;
    }

    if !avg_gain.is_finite() || !avg_loss.is_finite() {
        return None;
    }
    if avg_loss == 0.0 {
        return Some(if avg_gain == 0.0 { 50.0 } else { 100.0 });
    }

    let rs = avg_gain / avg_loss;
    let value = 100.0 - 100.0 / (1.0 + rs);
    value.is_finite().then(|| value.clamp(0.0, 100.0))
}

/// Bollinger Bands over the trailing `period` samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BollingerBands {
    pub mean: f64,
    pub upper: f64,
    pub lower: f64,
    pub last: f64,
    /// `None` when the bands have zero width.
    pub percent_b: Option<f64>,
    /// `None` when the window mean is zero.
    pub bandwidth: Option<f64>,
}

/// Latest Bollinger Bands: SMA of the trailing window plus/minus `mult`
/// population standard deviations.
///
/// Needs at least `period` finite samples.
pub fn bollinger(values: &[f64], period: usize, mult: f64) -> Option<BollingerBands> {
    let closes: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    if period == 0 || closes.len() < period {
        return None;
    }

    let window = &closes[closes.len() - period..];
    let mean = window.iter().sum::<f64>() / period as f64;
    if !mean.is_finite() {
        return None;
    }

    let variance = window.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / period as f64;
    let stdev = variance.sqrt();
    if !stdev.is_finite() {
        return None;
    }

    let upper = mean + mult * stdev;
    let lower = mean - mult * stdev;
    let last = closes[closes.len() - 1];
    let width = upper - lower;

    let percent_b = (width != 0.0)
        .then(|| (last - lower) / width)
        .filter(|x| x.is_finite());
    let bandwidth = (mean != 0.0)
        .then(|| width / mean)
        .filter(|x| x.is_finite());

    Some(BollingerBands {
        mean,
        upper,
        lower,
        last,
        percent_b,
        bandwidth,
    })
}
