//! Pure indicator math over f64 series.
//!
//! Deterministic, no I/O. Each function returns the newest reading
//! only, since the cascade never looks further back than one
//! evaluation instant. A series shorter than the required warmup
//! yields `None`, which callers treat as an inconclusive signal.

/// Exponential moving average of the newest point.
///
/// Seeded with the simple mean of the first `span` values, then
/// smoothed with `alpha = 2 / (span + 1)`.
pub fn ema(values: &[f64], span: usize) -> Option<f64> {
    if span == 0 || values.len() < span {
        return None;
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut current = values[..span].iter().sum::<f64>() / span as f64;
    for value in &values[span..] {
        current = alpha * value + (1.0 - alpha) * current;
    }
    Some(current)
}

/// Relative strength index of the newest point, Wilder smoothing.
///
/// First averages are simple means over the first `period` changes;
/// subsequent averages use `avg = (prev * (period - 1) + change) / period`.
pub fn rsi(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period + 1 {
        return None;
    }

    let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    let mut avg_gain = changes[..period]
        .iter()
        .map(|c| c.max(0.0))
        .sum::<f64>()
        / period as f64;
    let mut avg_loss = changes[..period]
        .iter()
        .map(|c| (-c).max(0.0))
        .sum::<f64>()
        / period as f64;

    for change in &changes[period..] {
        avg_gain = (avg_gain * (period - 1) as f64 + change.max(0.0)) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + (-change).max(0.0)) / period as f64;
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }
    Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
}

/// Stochastic oscillator: newest (%K, %D).
///
/// Raw %K over `k_period` highs/lows, smoothed by a `k_slow` simple
/// mean into %K, which a `d_period` simple mean turns into %D. A flat
/// window (highest high equals lowest low) reads as neutral 50.
pub fn stoch(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    k_period: usize,
    k_slow: usize,
    d_period: usize,
) -> Option<(f64, f64)> {
    if k_period == 0 || k_slow == 0 || d_period == 0 {
        return None;
    }
    let n = close.len();
    if high.len() != n || low.len() != n {
        return None;
    }
    // Bars needed for one %D point.
    if n < k_period + k_slow + d_period - 2 {
        return None;
    }

    let raw: Vec<f64> = (k_period - 1..n)
        .map(|i| {
            let window = i + 1 - k_period..=i;
            let hh = high[window.clone()].iter().cloned().fold(f64::MIN, f64::max);
            let ll = low[window].iter().cloned().fold(f64::MAX, f64::min);
            if hh == ll {
                50.0
            } else {
                (close[i] - ll) / (hh - ll) * 100.0
            }
        })
        .collect();

    let k_series = sma_series(&raw, k_slow);
    let d_series = sma_series(&k_series, d_period);

    Some((*k_series.last()?, *d_series.last()?))
}

/// Rolling simple mean; output is `window - 1` points shorter.
fn sma_series(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || values.len() < window {
        return Vec::new();
    }
    values
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn test_ema_insufficient_data() {
        assert!(ema(&[1.0, 2.0], 3).is_none());
        assert!(ema(&[], 9).is_none());
        assert!(ema(&[1.0], 0).is_none());
    }

    #[test]
    fn test_ema_constant_series() {
        let values = vec![5.0; 30];
        let result = ema(&values, 9).unwrap();
        assert!((result - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_ema_tracks_recent_values() {
        let values = rising(60);
        let fast = ema(&values, 9).unwrap();
        let slow = ema(&values, 50).unwrap();
        // Shorter span hugs the newest (highest) values.
        assert!(fast > slow);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        assert!(rsi(&rising(14), 14).is_none());
        assert!(rsi(&rising(15), 14).is_some());
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let result = rsi(&rising(20), 14).unwrap();
        assert!((result - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_all_losses_is_0() {
        let values: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let result = rsi(&values, 14).unwrap();
        assert!(result.abs() < 1e-9);
    }

    #[test]
    fn test_rsi_balanced_zigzag_near_midline() {
        // +1.0 / -0.8 alternation: avg gain 0.5, avg loss 0.4,
        // RS = 1.25 so RSI sits near 55.
        let mut values = vec![100.0];
        for i in 0..60 {
            let prev = *values.last().unwrap();
            values.push(if i % 2 == 0 { prev + 1.0 } else { prev - 0.8 });
        }
        let result = rsi(&values, 14).unwrap();
        assert!(result > 50.0 && result < 62.0, "rsi = {result}");
    }

    #[test]
    fn test_stoch_insufficient_data() {
        let v = rising(10);
        assert!(stoch(&v, &v, &v, 9, 6, 9).is_none());
    }

    #[test]
    fn test_stoch_flat_window_is_neutral() {
        let closes = vec![100.0; 40];
        let (k, d) = stoch(&closes, &closes, &closes, 9, 6, 9).unwrap();
        assert!((k - 50.0).abs() < 1e-9);
        assert!((d - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_stoch_range_bounds() {
        let closes = rising(40);
        let highs: Vec<f64> = closes.iter().map(|c| c + 0.5).collect();
        let lows: Vec<f64> = closes.iter().map(|c| c - 0.5).collect();
        let (k, d) = stoch(&highs, &lows, &closes, 9, 6, 9).unwrap();
        assert!((0.0..=100.0).contains(&k));
        assert!((0.0..=100.0).contains(&d));
        // Persistent rise keeps closes near the top of each window.
        assert!(k > 80.0);
    }

    #[test]
    fn test_stoch_recent_upswing_k_above_d() {
        // Flat, then a fresh rise: raw %K climbs, so the short mean (%K)
        // leads the long mean (%D).
        let mut closes = vec![100.0; 30];
        for i in 1..=5 {
            closes.push(100.0 + 0.2 * i as f64);
        }
        let highs: Vec<f64> = closes.iter().map(|c| c + 0.5).collect();
        let lows: Vec<f64> = closes.iter().map(|c| c - 0.5).collect();
        let (k, d) = stoch(&highs, &lows, &closes, 9, 6, 9).unwrap();
        assert!(k > d, "k = {k}, d = {d}");
        assert!(k < 80.0);
        assert!(d > 20.0);
    }

    #[test]
    fn test_sma_series_len() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(sma_series(&values, 2), vec![1.5, 2.5, 3.5]);
        assert!(sma_series(&values, 5).is_empty());
    }
}
