//! Layered entry-signal cascade.
//!
//! Four sequential gates, each consuming a freshly fetched bar series
//! and each retried on its own budget:
//!
//! 1. General trend  — EMA(9/26/50) on 30-minute closes
//! 2. Instant trend  — the same EMAs on 5-minute closes, same direction
//! 3. Momentum       — RSI(14) inside direction-specific bands
//! 4. Oscillator     — stochastic %K/%D (9,6,9) confirmation
//!
//! Slow, cheap signals gate fast, noisy ones; all four must agree
//! before a trade is authorized. Exhausting any gate's budget rejects
//! the cycle with no side effect.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use swing_broker::{Attempt, BrokerError, DynBroker, Outcome, RetryBudget};
use swing_core::{BarInterval, Lookback, PriceSeries, TrendDirection};

use crate::error::SignalResult;
use crate::indicators::{ema, rsi, stoch};

const EMA_FAST: usize = 9;
const EMA_MID: usize = 26;
const EMA_SLOW: usize = 50;
const RSI_PERIOD: usize = 14;
const STOCH_K: usize = 9;
const STOCH_K_SLOW: usize = 6;
const STOCH_D: usize = 9;

const TREND_LOOKBACK_DAYS: i64 = 5;
const INSTANT_LOOKBACK_DAYS: i64 = 1;

/// Per-gate retry budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// General trend gate (30-minute bars).
    #[serde(default = "default_general_trend_budget")]
    pub general_trend: RetryBudget,
    /// Instant trend gate (5-minute bars).
    #[serde(default = "default_instant_trend_budget")]
    pub instant_trend: RetryBudget,
    /// RSI momentum gate.
    #[serde(default = "default_momentum_budget")]
    pub momentum: RetryBudget,
    /// Stochastic oscillator gate.
    #[serde(default = "default_oscillator_budget")]
    pub oscillator: RetryBudget,
}

fn default_general_trend_budget() -> RetryBudget {
    RetryBudget::new(10, 30_000)
}

fn default_instant_trend_budget() -> RetryBudget {
    RetryBudget::new(5, 10_000)
}

fn default_momentum_budget() -> RetryBudget {
    RetryBudget::new(5, 10_000)
}

fn default_oscillator_budget() -> RetryBudget {
    RetryBudget::new(5, 10_000)
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            general_trend: default_general_trend_budget(),
            instant_trend: default_instant_trend_budget(),
            momentum: default_momentum_budget(),
            oscillator: default_oscillator_budget(),
        }
    }
}

/// EMA triple evaluated at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmaStack {
    pub fast: f64,
    pub mid: f64,
    pub slow: f64,
}

impl EmaStack {
    /// Compute the stack from a series, newest values.
    pub fn from_series(series: &PriceSeries) -> Option<Self> {
        let closes = series.closes_f64();
        Some(Self {
            fast: ema(&closes, EMA_FAST)?,
            mid: ema(&closes, EMA_MID)?,
            slow: ema(&closes, EMA_SLOW)?,
        })
    }
}

/// Direction implied by a strictly ordered EMA stack, if any.
pub fn trend_from_emas(stack: EmaStack) -> Option<TrendDirection> {
    if stack.slow < stack.mid && stack.mid < stack.fast {
        Some(TrendDirection::Long)
    } else if stack.fast < stack.mid && stack.mid < stack.slow {
        Some(TrendDirection::Short)
    } else {
        None
    }
}

/// Momentum bands: exclude overbought/oversold extremes so we never
/// enter a trend near exhaustion.
pub fn rsi_confirms(value: f64, direction: TrendDirection) -> bool {
    match direction {
        TrendDirection::Long => value > 50.0 && value < 80.0,
        TrendDirection::Short => value > 20.0 && value < 50.0,
    }
}

/// Stochastic confirmation: %K leads %D in the trade direction and
/// neither sits in the exhausted zone.
pub fn stoch_confirms(k: f64, d: f64, direction: TrendDirection) -> bool {
    match direction {
        TrendDirection::Long => k > d && k < 80.0 && d < 80.0,
        TrendDirection::Short => k < d && k > 20.0 && d > 20.0,
    }
}

/// The four-gate signal cascade for one ticker.
pub struct SignalCascade {
    broker: DynBroker,
    config: CascadeConfig,
}

impl SignalCascade {
    pub fn new(broker: DynBroker, config: CascadeConfig) -> Self {
        Self { broker, config }
    }

    /// Run all four gates in order.
    ///
    /// `Ok(None)` means no trade this cycle (inconclusive or
    /// disagreeing signals after every retry); it is a normal outcome.
    pub async fn authorize(&self, ticker: &str) -> SignalResult<Option<TrendDirection>> {
        let direction = match self.general_trend(ticker).await? {
            Some(direction) => direction,
            None => return Ok(None),
        };

        if !self.instant_trend(ticker, direction).await? {
            return Ok(None);
        }
        if !self.momentum(ticker, direction).await? {
            return Ok(None);
        }
        if !self.oscillator(ticker, direction).await? {
            return Ok(None);
        }

        info!(ticker, %direction, "signal cascade authorized trade");
        Ok(Some(direction))
    }

    /// Gate 1: strict EMA ordering on 30-minute closes.
    async fn general_trend(&self, ticker: &str) -> SignalResult<Option<TrendDirection>> {
        let outcome = self
            .config
            .general_trend
            .policy()
            .run("cascade.general_trend", |_| async move {
                let series = match self
                    .broker
                    .bars(ticker, BarInterval::Min30, Lookback::days(TREND_LOOKBACK_DAYS))
                    .await
                {
                    Ok(series) => series,
                    Err(e) => return attempt_from_broker_err(e),
                };

                let Some(stack) = EmaStack::from_series(&series) else {
                    return Attempt::Again("insufficient bars for EMA stack".to_string());
                };

                match trend_from_emas(stack) {
                    Some(direction) => {
                        info!(
                            ticker,
                            %direction,
                            ema_fast = stack.fast,
                            ema_mid = stack.mid,
                            ema_slow = stack.slow,
                            "general trend detected"
                        );
                        Attempt::Ready(direction)
                    }
                    None => Attempt::Again(format!(
                        "inconclusive trend (fast={:.3} mid={:.3} slow={:.3})",
                        stack.fast, stack.mid, stack.slow
                    )),
                }
            })
            .await;

        resolve_gate(ticker, "general_trend", outcome)
    }

    /// Gate 2: the same EMA ordering on 5-minute closes must agree.
    async fn instant_trend(&self, ticker: &str, direction: TrendDirection) -> SignalResult<bool> {
        let outcome = self
            .config
            .instant_trend
            .policy()
            .run("cascade.instant_trend", |_| async move {
                let series = match self.fetch_instant_bars(ticker).await {
                    Ok(series) => series,
                    Err(e) => return attempt_from_broker_err(e),
                };

                let Some(stack) = EmaStack::from_series(&series) else {
                    return Attempt::Again("insufficient bars for EMA stack".to_string());
                };

                if trend_from_emas(stack) == Some(direction) {
                    debug!(
                        ticker,
                        %direction,
                        ema_fast = stack.fast,
                        ema_mid = stack.mid,
                        ema_slow = stack.slow,
                        "instant trend confirmed"
                    );
                    Attempt::Ready(())
                } else {
                    Attempt::Again(format!(
                        "instant trend disagrees (fast={:.3} mid={:.3} slow={:.3})",
                        stack.fast, stack.mid, stack.slow
                    ))
                }
            })
            .await;

        resolve_gate(ticker, "instant_trend", outcome).map(|v| v.is_some())
    }

    /// Gate 3: RSI(14) within the direction band.
    async fn momentum(&self, ticker: &str, direction: TrendDirection) -> SignalResult<bool> {
        let outcome = self
            .config
            .momentum
            .policy()
            .run("cascade.momentum", |_| async move {
                let series = match self.fetch_instant_bars(ticker).await {
                    Ok(series) => series,
                    Err(e) => return attempt_from_broker_err(e),
                };

                let Some(value) = rsi(&series.closes_f64(), RSI_PERIOD) else {
                    return Attempt::Again("insufficient bars for RSI".to_string());
                };

                if rsi_confirms(value, direction) {
                    debug!(ticker, %direction, rsi = value, "momentum confirmed");
                    Attempt::Ready(())
                } else {
                    Attempt::Again(format!("rsi {value:.2} outside {direction} band"))
                }
            })
            .await;

        resolve_gate(ticker, "momentum", outcome).map(|v| v.is_some())
    }

    /// Gate 4: stochastic %K/%D confirmation.
    async fn oscillator(&self, ticker: &str, direction: TrendDirection) -> SignalResult<bool> {
        let outcome = self
            .config
            .oscillator
            .policy()
            .run("cascade.oscillator", |_| async move {
                let series = match self.fetch_instant_bars(ticker).await {
                    Ok(series) => series,
                    Err(e) => return attempt_from_broker_err(e),
                };

                let reading = stoch(
                    &series.highs_f64(),
                    &series.lows_f64(),
                    &series.closes_f64(),
                    STOCH_K,
                    STOCH_K_SLOW,
                    STOCH_D,
                );
                let Some((k, d)) = reading else {
                    return Attempt::Again("insufficient bars for stochastic".to_string());
                };

                if stoch_confirms(k, d, direction) {
                    debug!(ticker, %direction, stoch_k = k, stoch_d = d, "oscillator confirmed");
                    Attempt::Ready(())
                } else {
                    Attempt::Again(format!(
                        "stochastic disagrees (k={k:.2} d={d:.2}, {direction})"
                    ))
                }
            })
            .await;

        resolve_gate(ticker, "oscillator", outcome).map(|v| v.is_some())
    }

    async fn fetch_instant_bars(&self, ticker: &str) -> Result<PriceSeries, BrokerError> {
        self.broker
            .bars(ticker, BarInterval::Min5, Lookback::days(INSTANT_LOOKBACK_DAYS))
            .await
    }
}

fn attempt_from_broker_err<T>(err: BrokerError) -> Attempt<T, BrokerError> {
    if err.is_retryable() {
        Attempt::Again(err.to_string())
    } else {
        Attempt::Fail(err)
    }
}

fn resolve_gate<T>(
    ticker: &str,
    stage: &str,
    outcome: Outcome<T, BrokerError>,
) -> SignalResult<Option<T>> {
    match outcome {
        Outcome::Done(value) => Ok(Some(value)),
        Outcome::Exhausted => {
            info!(ticker, stage, "gate exhausted its retry budget, rejecting cycle");
            Ok(None)
        }
        Outcome::Failed(err) => Err(err.into()),
    }
}
