//! OHLC bar series for one ticker and interval.
//!
//! A `PriceSeries` is fetched whole, never mutated, and owned by the
//! cascade stage (or monitor tick) that requested it. Indicator math
//! runs on f64 projections of the decimal columns.

use crate::decimal::Price;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bar interval supported by the signal cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarInterval {
    /// Five-minute bars (instant trend, momentum, oscillator, monitor).
    Min5,
    /// Thirty-minute bars (general trend).
    Min30,
}

impl BarInterval {
    /// Wire representation used by the market-data API.
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::Min5 => "5Min",
            Self::Min30 => "30Min",
        }
    }
}

impl fmt::Display for BarInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

/// Lookback window for a bar request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookback {
    /// Number of calendar days back from now.
    pub days: i64,
}

impl Lookback {
    pub fn days(days: i64) -> Self {
        Self { days }
    }

    /// Window start relative to `now`.
    pub fn start_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - chrono::Duration::days(self.days)
    }
}

/// One OHLC bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
}

/// Ordered sequence of bars for one ticker/interval pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub ticker: String,
    pub interval: BarInterval,
    pub bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, interval: BarInterval, bars: Vec<Bar>) -> Self {
        Self {
            ticker: ticker.into(),
            interval,
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Close of the newest bar, if any.
    pub fn last_close(&self) -> Option<Price> {
        self.bars.last().map(|b| b.close)
    }

    /// Close column as f64 for indicator math.
    pub fn closes_f64(&self) -> Vec<f64> {
        self.bars
            .iter()
            .filter_map(|b| b.close.inner().to_f64())
            .collect()
    }

    /// High column as f64 for indicator math.
    pub fn highs_f64(&self) -> Vec<f64> {
        self.bars
            .iter()
            .filter_map(|b| b.high.inner().to_f64())
            .collect()
    }

    /// Low column as f64 for indicator math.
    pub fn lows_f64(&self) -> Vec<f64> {
        self.bars
            .iter()
            .filter_map(|b| b.low.inner().to_f64())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(close: rust_decimal::Decimal) -> Bar {
        Bar {
            timestamp: Utc::now(),
            open: Price::new(close),
            high: Price::new(close + dec!(1)),
            low: Price::new(close - dec!(1)),
            close: Price::new(close),
        }
    }

    #[test]
    fn test_last_close() {
        let series = PriceSeries::new("AAPL", BarInterval::Min5, vec![bar(dec!(10)), bar(dec!(11))]);
        assert_eq!(series.last_close(), Some(Price::new(dec!(11))));
    }

    #[test]
    fn test_empty_series() {
        let series = PriceSeries::new("AAPL", BarInterval::Min30, vec![]);
        assert!(series.is_empty());
        assert!(series.last_close().is_none());
        assert!(series.closes_f64().is_empty());
    }

    #[test]
    fn test_f64_projections() {
        let series = PriceSeries::new("AAPL", BarInterval::Min5, vec![bar(dec!(10.5))]);
        assert_eq!(series.closes_f64(), vec![10.5]);
        assert_eq!(series.highs_f64(), vec![11.5]);
        assert_eq!(series.lows_f64(), vec![9.5]);
    }

    #[test]
    fn test_interval_query() {
        assert_eq!(BarInterval::Min5.as_query(), "5Min");
        assert_eq!(BarInterval::Min30.as_query(), "30Min");
    }

    #[test]
    fn test_lookback_start() {
        let now = Utc::now();
        let start = Lookback::days(5).start_from(now);
        assert_eq!(now - start, chrono::Duration::days(5));
    }
}
