//! Poll loop over an open position.
//!
//! Each tick fetches the live position price and tests, in priority
//! order, the hard price bounds (take-profit before stop-loss) and
//! then a stochastic reversal of the held direction. A tick budget
//! bounds how long a position may be held; exhausting it resolves to
//! `TimedOut`, and the orchestrator still issues a market exit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use swing_broker::{BrokerError, DynBroker};
use swing_core::{BarInterval, ExitReason, Lookback, RiskLevels, TrendDirection};
use swing_signal::indicators::stoch;

use crate::error::MonitorResult;

const STOCH_K: usize = 9;
const STOCH_K_SLOW: usize = 6;
const STOCH_D: usize = 9;
const BARS_LOOKBACK_DAYS: i64 = 1;

/// Tick budget for one supervised hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Maximum number of poll ticks before the hold times out.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u32,
    /// Sleep between ticks, milliseconds.
    #[serde(default = "default_tick_delay_ms")]
    pub tick_delay_ms: u64,
}

fn default_max_ticks() -> u32 {
    360
}

fn default_tick_delay_ms() -> u64 {
    10_000
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_ticks: default_max_ticks(),
            tick_delay_ms: default_tick_delay_ms(),
        }
    }
}

/// Terminal verdict of one supervised hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// An exit condition fired.
    ExitTriggered {
        reason: ExitReason,
        at: DateTime<Utc>,
    },
    /// The tick budget ran out with no condition fired.
    TimedOut,
}

/// %K/%D ordering flipped against the held direction.
fn stoch_reversed(k: f64, d: f64, direction: TrendDirection) -> bool {
    match direction {
        TrendDirection::Long => k < d,
        TrendDirection::Short => k > d,
    }
}

/// Supervises one open position until it is exit-worthy.
pub struct PositionMonitor {
    broker: DynBroker,
    config: MonitorConfig,
}

impl PositionMonitor {
    pub fn new(broker: DynBroker, config: MonitorConfig) -> Self {
        Self { broker, config }
    }

    /// Watch the position until a bound is crossed, the oscillator
    /// reverses, or the tick budget runs out.
    ///
    /// Transient broker trouble consumes the tick and the loop keeps
    /// going; only a non-retryable failure aborts the watch.
    pub async fn watch(&self, ticker: &str, levels: &RiskLevels) -> MonitorResult<MonitorOutcome> {
        let max_ticks = self.config.max_ticks.max(1);
        let delay = Duration::from_millis(self.config.tick_delay_ms);

        for tick in 1..=max_ticks {
            match self.evaluate_tick(ticker, levels, tick).await? {
                Some(reason) => {
                    let at = Utc::now();
                    info!(ticker, tick, %reason, "exit condition fired");
                    return Ok(MonitorOutcome::ExitTriggered { reason, at });
                }
                None => {
                    if tick < max_ticks {
                        sleep(delay).await;
                    }
                }
            }
        }

        warn!(ticker, max_ticks, "hold timed out, requesting exit");
        Ok(MonitorOutcome::TimedOut)
    }

    /// One tick: price bounds first, reversal second.
    async fn evaluate_tick(
        &self,
        ticker: &str,
        levels: &RiskLevels,
        tick: u32,
    ) -> MonitorResult<Option<ExitReason>> {
        let price = match self.broker.open_position(ticker).await {
            Ok(position) => position.current_price,
            Err(e) if tick_tolerable(&e) => {
                warn!(ticker, tick, error = %e, "position poll failed, consuming tick");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(reason) = levels.bound_crossed(price) {
            return Ok(Some(reason));
        }

        let series = match self
            .broker
            .bars(ticker, BarInterval::Min5, Lookback::days(BARS_LOOKBACK_DAYS))
            .await
        {
            Ok(series) => series,
            Err(e) if tick_tolerable(&e) => {
                warn!(ticker, tick, error = %e, "bar fetch failed, skipping reversal check");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let reading = stoch(
            &series.highs_f64(),
            &series.lows_f64(),
            &series.closes_f64(),
            STOCH_K,
            STOCH_K_SLOW,
            STOCH_D,
        );
        if let Some((k, d)) = reading {
            if stoch_reversed(k, d, levels.direction) {
                return Ok(Some(ExitReason::Reversal));
            }
            debug!(ticker, tick, %price, stoch_k = k, stoch_d = d, "holding");
        } else {
            debug!(ticker, tick, %price, "holding, oscillator inconclusive");
        }

        Ok(None)
    }
}

/// NotFound is frequent while the broker settles; retryable transport
/// trouble likewise just costs the tick.
fn tick_tolerable(err: &BrokerError) -> bool {
    err.is_retryable() || matches!(err, BrokerError::NotFound(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use swing_broker::MockBroker;
    use swing_core::{Bar, Price, PriceSeries, Qty};

    fn fast_config(max_ticks: u32) -> MonitorConfig {
        MonitorConfig {
            max_ticks,
            tick_delay_ms: 1,
        }
    }

    fn long_levels() -> RiskLevels {
        RiskLevels::new(
            TrendDirection::Long,
            Price::new(dec!(100)),
            Price::new(dec!(95)),
            Price::new(dec!(110)),
        )
        .unwrap()
    }

    fn position_at(price: Decimal) -> swing_core::PositionHandle {
        swing_core::PositionHandle {
            ticker: "AAPL".into(),
            qty: Qty::new(dec!(3)),
            avg_entry_price: Price::new(dec!(100)),
            current_price: Price::new(price),
        }
    }

    fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .map(|&c| {
                let close = Decimal::try_from(c).unwrap();
                Bar {
                    timestamp: Utc::now(),
                    open: Price::new(close),
                    high: Price::new(close + dec!(0.5)),
                    low: Price::new(close - dec!(0.5)),
                    close: Price::new(close),
                }
            })
            .collect();
        PriceSeries::new("AAPL", BarInterval::Min5, bars)
    }

    /// Flat base then a 5-bar slide: %K drops below %D.
    fn recent_downswing_closes() -> Vec<f64> {
        let mut closes = vec![100.0; 30];
        for i in 1..=5 {
            closes.push(100.0 - 0.2 * i as f64);
        }
        closes
    }

    #[test]
    fn test_reversal_classification() {
        assert!(stoch_reversed(40.0, 50.0, TrendDirection::Long));
        assert!(!stoch_reversed(60.0, 50.0, TrendDirection::Long));
        assert!(stoch_reversed(60.0, 50.0, TrendDirection::Short));
        assert!(!stoch_reversed(40.0, 50.0, TrendDirection::Short));
    }

    #[tokio::test(start_paused = true)]
    async fn test_take_profit_crossing_triggers_exit() {
        let broker = Arc::new(MockBroker::new());
        broker.set_default_position(Some(position_at(dec!(111))));

        let monitor = PositionMonitor::new(broker, fast_config(5));
        let outcome = monitor.watch("AAPL", &long_levels()).await.unwrap();
        assert!(matches!(
            outcome,
            MonitorOutcome::ExitTriggered {
                reason: ExitReason::TakeProfit,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_loss_crossing_triggers_exit() {
        let broker = Arc::new(MockBroker::new());
        broker.set_default_position(Some(position_at(dec!(94))));

        let monitor = PositionMonitor::new(broker, fast_config(5));
        let outcome = monitor.watch("AAPL", &long_levels()).await.unwrap();
        assert!(matches!(
            outcome,
            MonitorOutcome::ExitTriggered {
                reason: ExitReason::StopLoss,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stochastic_reversal_triggers_exit() {
        let broker = Arc::new(MockBroker::new());
        broker.set_default_position(Some(position_at(dec!(102))));
        broker.push_bars(series_from_closes(&recent_downswing_closes()));

        let monitor = PositionMonitor::new(broker, fast_config(5));
        let outcome = monitor.watch("AAPL", &long_levels()).await.unwrap();
        assert!(matches!(
            outcome,
            MonitorOutcome::ExitTriggered {
                reason: ExitReason::Reversal,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_price_bound_beats_reversal() {
        // Price crossed take-profit AND the oscillator reversed; the
        // bound wins because it is checked first.
        let broker = Arc::new(MockBroker::new());
        broker.set_default_position(Some(position_at(dec!(111))));
        broker.push_bars(series_from_closes(&recent_downswing_closes()));

        let monitor = PositionMonitor::new(broker, fast_config(5));
        let outcome = monitor.watch("AAPL", &long_levels()).await.unwrap();
        assert!(matches!(
            outcome,
            MonitorOutcome::ExitTriggered {
                reason: ExitReason::TakeProfit,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_within_budget() {
        // Price stays inside the bounds and the flat oscillator never
        // flips; the watch must resolve, not hang.
        let broker = Arc::new(MockBroker::new());
        broker.set_default_position(Some(position_at(dec!(101))));
        broker.push_bars(series_from_closes(&[100.0; 40]));

        let monitor = PositionMonitor::new(broker, fast_config(3));
        let outcome = monitor.watch("AAPL", &long_levels()).await.unwrap();
        assert_eq!(outcome, MonitorOutcome::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_poll_failures_consume_ticks() {
        // No position ever appears; every tick is NotFound and the
        // watch resolves to TimedOut instead of erroring.
        let broker = Arc::new(MockBroker::new());

        let monitor = PositionMonitor::new(broker, fast_config(3));
        let outcome = monitor.watch("AAPL", &long_levels()).await.unwrap();
        assert_eq!(outcome, MonitorOutcome::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inconclusive_oscillator_keeps_watching() {
        // Too few bars for the stochastic; the tick completes without
        // a reversal verdict.
        let broker = Arc::new(MockBroker::new());
        broker.set_default_position(Some(position_at(dec!(101))));
        broker.push_bars(series_from_closes(&[100.0; 5]));

        let monitor = PositionMonitor::new(broker, fast_config(2));
        let outcome = monitor.watch("AAPL", &long_levels()).await.unwrap();
        assert_eq!(outcome, MonitorOutcome::TimedOut);
    }
}
