//! The trade-cycle orchestrator.
//!
//! One cycle: verify no open position, run the signal cascade, size
//! the entry, submit a price-bounded limit order, confirm the fill,
//! supervise the position, and close it with a market order. A failure
//! to close is the one case that never gives up: the close poll is
//! unbounded and keeps warning until the position is gone.

use std::sync::Arc;

use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use swing_broker::{Attempt, BrokerError, DynBroker, Outcome};
use swing_core::{BarInterval, CycleResult, ExitReason, Lookback, Price, Qty, TrendDirection};
use swing_exec::{ExecError, OrderLifecycleManager, RiskSizer};
use swing_position::{MonitorOutcome, PositionMonitor};
use swing_signal::SignalCascade;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Drives the full trade cycle for one ticker, forever.
pub struct TradeOrchestrator {
    broker: DynBroker,
    cascade: SignalCascade,
    lifecycle: OrderLifecycleManager,
    monitor: PositionMonitor,
    config: AppConfig,
    ticker: String,
}

impl TradeOrchestrator {
    pub fn new(broker: DynBroker, ticker: String, config: AppConfig) -> Self {
        let cascade = SignalCascade::new(Arc::clone(&broker), config.cascade);
        let lifecycle = OrderLifecycleManager::new(Arc::clone(&broker), config.lifecycle);
        let monitor = PositionMonitor::new(Arc::clone(&broker), config.monitor);
        Self {
            broker,
            cascade,
            lifecycle,
            monitor,
            config,
            ticker,
        }
    }

    /// Startup safety checks. Any failure here is process-fatal.
    ///
    /// Verifies the account is active, clears every resting order left
    /// over from a previous run, and confirms the ticker is tradable.
    pub async fn startup(&self) -> AppResult<()> {
        let policy = self.config.startup.policy();

        let outcome = policy
            .run("startup.account", |_| async {
                match self.broker.account().await {
                    Ok(account) => Attempt::Ready(account),
                    Err(e) if e.is_retryable() => Attempt::Again(e.to_string()),
                    Err(e) => Attempt::Fail(e),
                }
            })
            .await;
        let account = match outcome {
            Outcome::Done(account) => account,
            Outcome::Exhausted => {
                return Err(AppError::Startup("account check exhausted retries".into()))
            }
            Outcome::Failed(e) => return Err(e.into()),
        };
        if !account.is_active() {
            return Err(AppError::Startup(format!(
                "account status is {}, not ACTIVE",
                account.status
            )));
        }
        info!(equity = %account.equity, "account verified");

        let outcome = policy
            .run("startup.cancel_all", |_| async {
                match self.broker.cancel_all_orders().await {
                    Ok(()) => Attempt::Ready(()),
                    Err(e) if e.is_retryable() => Attempt::Again(e.to_string()),
                    Err(e) => Attempt::Fail(e),
                }
            })
            .await;
        match outcome {
            Outcome::Done(()) => info!("stale orders cleared"),
            Outcome::Exhausted => {
                return Err(AppError::Startup("cancel-all exhausted retries".into()))
            }
            Outcome::Failed(e) => return Err(e.into()),
        }
        let resting = self.broker.open_orders(&self.ticker).await?;
        if !resting.is_empty() {
            return Err(AppError::Startup(format!(
                "{} orders still resting after cancel-all",
                resting.len()
            )));
        }

        let asset = self.broker.asset(&self.ticker).await.map_err(|e| {
            AppError::Startup(format!("asset lookup for {} failed: {e}", self.ticker))
        })?;
        if !asset.tradable {
            return Err(AppError::Startup(format!("{} is not tradable", self.ticker)));
        }
        info!(ticker = %self.ticker, "ticker verified tradable");

        Ok(())
    }

    /// The process loop: one cycle, sleep, repeat. A cycle error is
    /// logged and the loop continues; only startup failures kill the
    /// process.
    pub async fn run(&self) -> AppResult<()> {
        loop {
            match self.run_cycle().await {
                Ok(result) => {
                    info!(success = result.success, exit = ?result.exit, "cycle finished")
                }
                Err(e) => error!(error = %e, "cycle aborted"),
            }
            sleep(Duration::from_millis(self.config.cycle_sleep_ms)).await;
        }
    }

    /// One full trade cycle.
    pub async fn run_cycle(&self) -> AppResult<CycleResult> {
        if self.has_open_position().await? {
            warn!(ticker = %self.ticker, "position already open, skipping cycle");
            return Ok(CycleResult::skipped());
        }

        let Some(direction) = self.cascade.authorize(&self.ticker).await? else {
            info!(ticker = %self.ticker, "no trade signal this cycle");
            return Ok(CycleResult::skipped());
        };

        let Some(reference) = self.reference_price().await? else {
            warn!(ticker = %self.ticker, "no reference price available, skipping cycle");
            return Ok(CycleResult::skipped());
        };

        let equity = self.broker.account().await?.equity;
        let qty = match RiskSizer::size(equity, reference, self.config.max_spend) {
            Ok(qty) => qty,
            Err(ExecError::Sizing(why)) => {
                warn!(ticker = %self.ticker, why, "sizing rejected, skipping cycle");
                return Ok(CycleResult::skipped());
            }
            Err(e) => return Err(e.into()),
        };

        let ack = match self
            .lifecycle
            .submit_entry(&self.ticker, direction, qty, reference)
            .await
        {
            Ok(ack) => ack,
            Err(ExecError::Broker(BrokerError::Rejected(why))) => {
                warn!(ticker = %self.ticker, why, "entry rejected, skipping cycle");
                return Ok(CycleResult::skipped());
            }
            Err(ExecError::Exhausted { action }) => {
                warn!(ticker = %self.ticker, action, "entry submission exhausted, skipping cycle");
                return Ok(CycleResult::skipped());
            }
            Err(e) => return Err(e.into()),
        };

        let position = match self.lifecycle.confirm_filled(&self.ticker).await? {
            Some(position) => position,
            None => {
                // Unfilled entry must be cancelled before anything else;
                // an Err here (unresolved order) aborts the cycle.
                self.lifecycle.cancel(&ack.id).await?;
                // The cancel can race the fill: a position showing up
                // now means the order executed while we were cancelling,
                // and it has to be supervised like any other fill.
                match self.broker.open_position(&self.ticker).await {
                    Ok(position) => {
                        warn!(ticker = %self.ticker, order_id = %ack.id, "entry filled during cancellation");
                        position
                    }
                    Err(BrokerError::NotFound(_)) => {
                        info!(ticker = %self.ticker, order_id = %ack.id, "unfilled entry cancelled");
                        return Ok(CycleResult::skipped());
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        // The broker's average entry price is authoritative, not the
        // reference price the limit was derived from.
        let levels = RiskSizer::levels(
            position.avg_entry_price,
            direction,
            self.config.stop_margin,
            self.config.profit_margin,
        )?;
        info!(
            ticker = %self.ticker,
            %direction,
            entry = %levels.entry,
            stop = %levels.stop_loss,
            take = %levels.take_profit,
            "position opened"
        );

        let exit = match self.monitor.watch(&self.ticker, &levels).await? {
            MonitorOutcome::ExitTriggered { reason, at } => {
                info!(ticker = %self.ticker, %reason, %at, "exit triggered");
                reason
            }
            MonitorOutcome::TimedOut => ExitReason::Timeout,
        };

        self.close_position(direction, position.qty).await;
        Ok(CycleResult::completed(exit))
    }

    /// Expected-frequent NotFound means no position; transient broker
    /// trouble is treated as "assume open" so the cycle skips instead
    /// of risking a double entry.
    async fn has_open_position(&self) -> AppResult<bool> {
        match self.broker.open_position(&self.ticker).await {
            Ok(_) => Ok(true),
            Err(BrokerError::NotFound(_)) => Ok(false),
            Err(e) if e.is_retryable() => {
                warn!(ticker = %self.ticker, error = %e, "position check failed, assuming open");
                Ok(true)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Last 5-minute close, the entry reference price.
    async fn reference_price(&self) -> AppResult<Option<Price>> {
        let series = self
            .broker
            .bars(&self.ticker, BarInterval::Min5, Lookback::days(1))
            .await?;
        Ok(series.last_close())
    }

    /// Market exit plus an unbounded close-confirmation poll.
    ///
    /// Leaving a position open is worse than looping, so this never
    /// returns until the broker stops reporting the position. The
    /// position is re-verified before the exit is submitted: a
    /// position that vanished mid-watch (closed externally, liquidated)
    /// must not draw a market order against a flat account.
    async fn close_position(&self, direction: TrendDirection, qty: Qty) {
        let delay = Duration::from_millis(self.config.close_poll_ms);
        let mut submitted = false;

        loop {
            match self.broker.open_position(&self.ticker).await {
                Err(BrokerError::NotFound(_)) => {
                    info!(ticker = %self.ticker, "position closed");
                    return;
                }
                Ok(_) => {
                    if submitted {
                        warn!(ticker = %self.ticker, "position still open after exit order");
                    } else {
                        match self.lifecycle.submit_exit(&self.ticker, direction, qty).await {
                            Ok(_) => submitted = true,
                            Err(e) => {
                                error!(ticker = %self.ticker, error = %e, "exit submission failed, retrying");
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(ticker = %self.ticker, error = %e, "close confirmation failed")
                }
            }

            sleep(delay).await;
        }
    }
}
