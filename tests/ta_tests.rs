//! TA engine tests: RSI (Wilder) and Bollinger Bands.

use elfa_mcp_server::ta::{bollinger, normalize, rsi};
use serde_json::json;

/// Deterministic pseudo-random walk (LCG) for range checks.
fn random_walk(len: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    let mut price = 100.0;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let step = ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5;
            price += step * 4.0;
            price
        })
        .collect()
}

// ---------------------------------------------------------------------------
// RSI
// ---------------------------------------------------------------------------

#[test]
fn rsi_strictly_increasing_is_100_for_every_period() {
    for period in 1..=30 {
        let closes: Vec<f64> = (0..=period).map(|x| 10.0 + x as f64).collect();
        assert_eq!(rsi(&closes, period), Some(100.0), "period {period}");
    }
}

#[test]
fn rsi_flat_series_is_50() {
    for period in [1, 2, 14, 21] {
        let closes = vec![42.5; period + 5];
        assert_eq!(rsi(&closes, period), Some(50.0), "period {period}");
    }
}

#[test]
fn rsi_strictly_decreasing_is_0() {
    let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
    let value = rsi(&closes, 14).unwrap();
    assert!(value.abs() < 1e-10, "expected 0, got {value}");
}

#[test]
fn rsi_needs_period_plus_one_samples() {
    let closes: Vec<f64> = (1..=14).map(|x| x as f64).collect();
    assert_eq!(rsi(&closes, 14), None);
    assert_eq!(rsi(&[], 14), None);
    assert_eq!(rsi(&[1.0, 2.0, 3.0], 0), None);
}

#[test]
fn rsi_matches_reference_series() {
    let closes = [
        44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
        45.61, 46.28, 46.28,
    ];
    let value = rsi(&closes, 14).unwrap();
    assert!((value - 70.464_135_021_097).abs() < 1e-9, "got {value}");
}

#[test]
fn rsi_applies_wilder_smoothing_after_seed() {
    // Seed over two deltas (+1, +1), then a -2 delta:
    // avg_gain = (1 * 1 + 0) / 2 = 0.5, avg_loss = (0 * 1 + 2) / 2 = 1.0
    // RS = 0.5, RSI = 100 - 100 / 1.5
    let value = rsi(&[10.0, 11.0, 12.0, 10.0], 2).unwrap();
    assert!((value - (100.0 - 100.0 / 1.5)).abs() < 1e-12, "got {value}");
}

#[test]
fn rsi_always_within_range() {
    for seed in 1..50u64 {
        let closes = random_walk(120, seed);
        for period in [2, 5, 14, 30] {
            let value = rsi(&closes, period).expect("enough samples");
            assert!(value.is_finite());
            assert!((0.0..=100.0).contains(&value), "RSI {value} out of range");
        }
    }
}

#[test]
fn rsi_ignores_non_finite_samples() {
    let clean: Vec<f64> = random_walk(40, 7);
    let mut dirty = clean.clone();
    dirty.insert(3, f64::NAN);
    dirty.insert(10, f64::INFINITY);
    dirty.push(f64::NEG_INFINITY);
    assert_eq!(rsi(&dirty, 14), rsi(&clean, 14));
}

// ---------------------------------------------------------------------------
// Bollinger Bands
// ---------------------------------------------------------------------------

#[test]
fn bollinger_uses_population_stdev_over_trailing_window() {
    let mut closes: Vec<f64> = vec![1000.0, -50.0];
    closes.extend((1..=20).map(|x| x as f64));

    let bands = bollinger(&closes, 20, 2.0).unwrap();
    let stdev = (399.0_f64 / 12.0).sqrt();

    assert!((bands.mean - 10.5).abs() < 1e-12);
    assert!((bands.upper - (10.5 + 2.0 * stdev)).abs() < 1e-12);
    assert!((bands.lower - (10.5 - 2.0 * stdev)).abs() < 1e-12);
    assert_eq!(bands.last, 20.0);
    assert!((bands.percent_b.unwrap() - 0.911_877_235_523_957).abs() < 1e-9);
    assert!((bands.bandwidth.unwrap() - 2.196_678_589_461_104).abs() < 1e-9);
}

#[test]
fn bollinger_needs_period_samples() {
    let closes: Vec<f64> = (1..=19).map(|x| x as f64).collect();
    assert!(bollinger(&closes, 20, 2.0).is_none());
    assert!(bollinger(&closes, 19, 2.0).is_some());
    assert!(bollinger(&closes, 0, 2.0).is_none());
}

#[test]
fn bollinger_flat_window_has_no_percent_b() {
    let bands = bollinger(&[5.0; 20], 20, 2.0).unwrap();
    assert_eq!(bands.upper, bands.lower);
    assert_eq!(bands.mean, 5.0);
    assert_eq!(bands.percent_b, None);
    assert_eq!(bands.bandwidth, Some(0.0));
}

#[test]
fn bollinger_zero_mean_has_no_bandwidth() {
    let bands = bollinger(&[-1.0, 1.0], 2, 2.0).unwrap();
    assert_eq!(bands.mean, 0.0);
    assert_eq!(bands.bandwidth, None);
    assert!((bands.percent_b.unwrap() - 0.75).abs() < 1e-12);
}

#[test]
fn bollinger_bands_bracket_the_mean() {
    for seed in 1..30u64 {
        let closes = random_walk(60, seed);
        for period in [2, 10, 20, 60] {
            let b = bollinger(&closes, period, 2.0).unwrap();
            assert!(b.lower < b.mean && b.mean < b.upper, "seed {seed} period {period}");
            assert!(b.percent_b.unwrap().is_finite());
            assert!(b.bandwidth.unwrap().is_finite());
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

#[test]
fn normalize_keeps_numbers_and_numeric_strings() {
    let raw = vec![
        json!(1.5),
        json!("2.5"),
        json!(null),
        json!("abc"),
        json!(true),
        json!({"close": 3}),
        json!([4]),
        json!(" 6 "),
        json!("NaN"),
        json!("inf"),
        json!(7),
    ];
    assert_eq!(normalize(&raw), vec![1.5, 2.5, 6.0, 7.0]);
}

#[test]
fn series_with_junk_entries_matches_series_without_them() {
    let clean: Vec<f64> = random_walk(30, 11);
    let mut raw: Vec<serde_json::Value> = clean.iter().map(|x| json!(x)).collect();
    raw.insert(0, json!(null));
    raw.insert(5, json!("not a price"));
    raw.insert(12, json!(false));
    raw.push(json!("Infinity"));

    let normalized = normalize(&raw);
    assert_eq!(normalized, clean);
    assert_eq!(rsi(&normalized, 14), rsi(&clean, 14));
    assert_eq!(bollinger(&normalized, 20, 2.0), bollinger(&clean, 20, 2.0));
}
