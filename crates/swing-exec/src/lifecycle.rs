//! Entry/exit order lifecycle.
//!
//! One manager owns every order the bot places. Entries are limit
//! orders bounded by a slippage allowance around the reference price;
//! exits are market orders submitted unconditionally. Cancellation
//! that exhausts its budget escalates to cancel-all and aborts the
//! cycle, because a resting order of unknown fill state must never
//! survive into the next cycle.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use swing_broker::{Attempt, BrokerError, DynBroker, Outcome, RetryBudget};
use swing_core::{OrderAck, OrderIntent, PositionHandle, Price, Qty, TrendDirection};

use crate::error::{ExecError, ExecResult};

/// Order-handling knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Slippage allowance on the entry limit price, fraction of the
    /// reference price, in (0, 1). Validated at config load.
    #[serde(default = "default_max_variation")]
    pub max_variation: Decimal,
    /// Order submission (entry and exit).
    #[serde(default = "default_submit_budget")]
    pub submit: RetryBudget,
    /// Fill-confirmation position polling.
    #[serde(default = "default_confirm_budget")]
    pub confirm: RetryBudget,
    /// Per-order cancellation.
    #[serde(default = "default_cancel_budget")]
    pub cancel: RetryBudget,
}

fn default_max_variation() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

fn default_submit_budget() -> RetryBudget {
    RetryBudget::new(3, 2_000)
}

fn default_confirm_budget() -> RetryBudget {
    RetryBudget::new(10, 3_000)
}

fn default_cancel_budget() -> RetryBudget {
    RetryBudget::new(5, 2_000)
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_variation: default_max_variation(),
            submit: default_submit_budget(),
            confirm: default_confirm_budget(),
            cancel: default_cancel_budget(),
        }
    }
}

/// Owns order submission, fill confirmation and cancellation for one
/// trade cycle.
pub struct OrderLifecycleManager {
    broker: DynBroker,
    config: LifecycleConfig,
}

impl OrderLifecycleManager {
    pub fn new(broker: DynBroker, config: LifecycleConfig) -> Self {
        Self { broker, config }
    }

    /// Entry limit price: reference price padded by the slippage
    /// allowance in the adverse direction.
    pub fn entry_limit_price(&self, reference: Price, direction: TrendDirection) -> Price {
        let factor = match direction {
            TrendDirection::Long => Decimal::ONE + self.config.max_variation,
            TrendDirection::Short => Decimal::ONE - self.config.max_variation,
        };
        reference.scaled(factor)
    }

    /// Submit the price-bounded entry order.
    ///
    /// Connectivity failures are retried; a rejection is surfaced
    /// immediately and never retried.
    pub async fn submit_entry(
        &self,
        ticker: &str,
        direction: TrendDirection,
        qty: Qty,
        reference: Price,
    ) -> ExecResult<OrderAck> {
        let limit = self.entry_limit_price(reference, direction);
        let intent = OrderIntent::limit_entry(ticker, direction.entry_side(), qty, limit);
        info!(ticker, %direction, %qty, %limit, "submitting limit entry");

        let outcome = self
            .config
            .submit
            .policy()
            .run("lifecycle.submit_entry", |_| {
                let intent = &intent;
                async move {
                    match self.broker.submit_order(intent).await {
                        Ok(ack) => Attempt::Ready(ack),
                        Err(e) => retry_or_fail(e),
                    }
                }
            })
            .await;

        resolve(outcome, "entry submission")
    }

    /// Poll until the broker reports an open position for `ticker`.
    ///
    /// `Ok(None)` means the order did not fill within the budget; the
    /// caller must cancel before doing anything else.
    pub async fn confirm_filled(&self, ticker: &str) -> ExecResult<Option<PositionHandle>> {
        let outcome = self
            .config
            .confirm
            .policy()
            .run("lifecycle.confirm_filled", |_| async move {
                match self.broker.open_position(ticker).await {
                    Ok(position) => Attempt::Ready(position),
                    Err(BrokerError::NotFound(_)) => {
                        Attempt::Again("no open position yet".to_string())
                    }
                    Err(e) => retry_or_fail(e),
                }
            })
            .await;

        match outcome {
            Outcome::Done(position) => {
                info!(ticker, qty = %position.qty, entry = %position.avg_entry_price, "entry filled");
                Ok(Some(position))
            }
            Outcome::Exhausted => {
                warn!(ticker, "entry not filled within budget");
                Ok(None)
            }
            Outcome::Failed(err) => Err(err.into()),
        }
    }

    /// Cancel one resting order, escalating to cancel-all on
    /// exhaustion.
    ///
    /// `NotFound` counts as resolved: the order left the book in the
    /// race after the fill-confirmation timeout, either filled or
    /// expired, and the caller must re-check the position to learn
    /// which. An `Err` from this method means the order's fill state
    /// is unknown; the cycle must abort.
    pub async fn cancel(&self, order_id: &str) -> ExecResult<()> {
        let outcome = self
            .config
            .cancel
            .policy()
            .run("lifecycle.cancel", |_| async move {
                match self.broker.cancel_order(order_id).await {
                    Ok(()) => Attempt::Ready(()),
                    Err(BrokerError::NotFound(_)) => {
                        warn!(order_id, "order already left the book");
                        Attempt::Ready(())
                    }
                    Err(e) => retry_or_fail(e),
                }
            })
            .await;

        match outcome {
            Outcome::Done(()) => {
                info!(order_id, "entry order cancelled");
                Ok(())
            }
            Outcome::Exhausted => {
                error!(order_id, "cancellation exhausted, escalating to cancel-all");
                if let Err(e) = self.broker.cancel_all_orders().await {
                    error!(order_id, error = %e, "cancel-all failed");
                }
                Err(ExecError::UnresolvedOrder(order_id.to_string()))
            }
            Outcome::Failed(err) => Err(err.into()),
        }
    }

    /// Submit the unconditional market exit.
    pub async fn submit_exit(
        &self,
        ticker: &str,
        direction: TrendDirection,
        qty: Qty,
    ) -> ExecResult<OrderAck> {
        let intent = OrderIntent::market_exit(ticker, direction.exit_side(), qty);
        info!(ticker, %direction, %qty, "submitting market exit");

        let outcome = self
            .config
            .submit
            .policy()
            .run("lifecycle.submit_exit", |_| {
                let intent = &intent;
                async move {
                    match self.broker.submit_order(intent).await {
                        Ok(ack) => Attempt::Ready(ack),
                        Err(e) => retry_or_fail(e),
                    }
                }
            })
            .await;

        resolve(outcome, "exit submission")
    }
}

fn retry_or_fail<T>(err: BrokerError) -> Attempt<T, BrokerError> {
    if err.is_retryable() {
        Attempt::Again(err.to_string())
    } else {
        Attempt::Fail(err)
    }
}

fn resolve<T>(outcome: Outcome<T, BrokerError>, action: &'static str) -> ExecResult<T> {
    match outcome {
        Outcome::Done(value) => Ok(value),
        Outcome::Exhausted => Err(ExecError::Exhausted { action }),
        Outcome::Failed(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rust_decimal_macros::dec;
    use swing_broker::{BrokerClient, MockBroker};
    use swing_core::{OrderSide, OrderType};

    fn fast_config() -> LifecycleConfig {
        LifecycleConfig {
            max_variation: dec!(0.01),
            submit: RetryBudget::new(3, 1),
            confirm: RetryBudget::new(3, 1),
            cancel: RetryBudget::new(3, 1),
        }
    }

    fn manager(broker: Arc<MockBroker>) -> OrderLifecycleManager {
        OrderLifecycleManager::new(broker, fast_config())
    }

    fn position(ticker: &str) -> PositionHandle {
        PositionHandle {
            ticker: ticker.into(),
            qty: Qty::new(dec!(3)),
            avg_entry_price: Price::new(dec!(100)),
            current_price: Price::new(dec!(100)),
        }
    }

    #[test]
    fn test_entry_limit_price_padding() {
        let broker = Arc::new(MockBroker::new());
        let mgr = manager(broker);
        let reference = Price::new(dec!(100));
        assert_eq!(
            mgr.entry_limit_price(reference, TrendDirection::Long),
            Price::new(dec!(101.00))
        );
        assert_eq!(
            mgr.entry_limit_price(reference, TrendDirection::Short),
            Price::new(dec!(99.00))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_entry_builds_limit_order() {
        let broker = Arc::new(MockBroker::new());
        let mgr = manager(broker.clone());

        let ack = mgr
            .submit_entry(
                "AAPL",
                TrendDirection::Long,
                Qty::new(dec!(3)),
                Price::new(dec!(100)),
            )
            .await
            .unwrap();
        assert_eq!(ack.id, "mock-order-1");

        let submitted = broker.submitted_orders();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].order_type, OrderType::Limit);
        assert_eq!(submitted[0].side, OrderSide::Buy);
        assert_eq!(submitted[0].limit_price, Some(Price::new(dec!(101.00))));
        assert!(!submitted[0].is_exit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_entry_retries_connectivity() {
        let broker = Arc::new(MockBroker::new());
        broker.fail_next_submit(BrokerError::Connectivity("blip".into()));
        let mgr = manager(broker.clone());

        let ack = mgr
            .submit_entry(
                "AAPL",
                TrendDirection::Long,
                Qty::new(dec!(3)),
                Price::new(dec!(100)),
            )
            .await
            .unwrap();
        assert_eq!(ack.id, "mock-order-1");
        assert_eq!(broker.submitted_orders().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_entry_rejection_not_retried() {
        let broker = Arc::new(MockBroker::new());
        broker.fail_next_submit(BrokerError::Rejected("insufficient buying power".into()));
        let mgr = manager(broker.clone());

        let result = mgr
            .submit_entry(
                "AAPL",
                TrendDirection::Long,
                Qty::new(dec!(3)),
                Price::new(dec!(100)),
            )
            .await;
        assert!(matches!(result, Err(ExecError::Broker(BrokerError::Rejected(_)))));
        assert!(broker.submitted_orders().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_filled_polls_until_position() {
        let broker = Arc::new(MockBroker::new());
        broker.push_position(None);
        broker.push_position(Some(position("AAPL")));
        let mgr = manager(broker);

        let filled = mgr.confirm_filled("AAPL").await.unwrap();
        assert_eq!(filled.unwrap().avg_entry_price, Price::new(dec!(100)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_filled_exhaustion_is_not_fatal() {
        let broker = Arc::new(MockBroker::new());
        let mgr = manager(broker);

        let filled = mgr.confirm_filled("AAPL").await.unwrap();
        assert!(filled.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_escalates_to_cancel_all() {
        let broker = Arc::new(MockBroker::new());
        let ack = broker
            .submit_order(&OrderIntent::limit_entry(
                "AAPL",
                OrderSide::Buy,
                Qty::new(dec!(3)),
                Price::new(dec!(101)),
            ))
            .await
            .unwrap();
        broker.fail_cancel_times(3);
        let mgr = manager(broker.clone());

        let result = mgr.cancel(&ack.id).await;
        assert!(matches!(result, Err(ExecError::UnresolvedOrder(_))));
        assert_eq!(broker.cancel_all_calls(), 1);
        assert_eq!(broker.outstanding_entry_orders(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_recovers_from_transient_failure() {
        let broker = Arc::new(MockBroker::new());
        let ack = broker
            .submit_order(&OrderIntent::limit_entry(
                "AAPL",
                OrderSide::Buy,
                Qty::new(dec!(3)),
                Price::new(dec!(101)),
            ))
            .await
            .unwrap();
        broker.fail_cancel_times(2);
        let mgr = manager(broker.clone());

        mgr.cancel(&ack.id).await.unwrap();
        assert_eq!(broker.cancel_all_calls(), 0);
        assert_eq!(broker.outstanding_entry_orders(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_not_found_is_resolved() {
        let broker = Arc::new(MockBroker::new());
        let ack = broker
            .submit_order(&OrderIntent::limit_entry(
                "AAPL",
                OrderSide::Buy,
                Qty::new(dec!(3)),
                Price::new(dec!(101)),
            ))
            .await
            .unwrap();
        // The order filled (or expired) before the cancel landed.
        broker.fail_next_cancel_with(BrokerError::NotFound(format!("order {}", ack.id)));
        let mgr = manager(broker.clone());

        mgr.cancel(&ack.id).await.unwrap();
        assert_eq!(broker.cancel_all_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_exit_is_market_opposite_side() {
        let broker = Arc::new(MockBroker::new());
        let mgr = manager(broker.clone());

        mgr.submit_exit("AAPL", TrendDirection::Long, Qty::new(dec!(3)))
            .await
            .unwrap();

        let submitted = broker.submitted_orders();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].order_type, OrderType::Market);
        assert_eq!(submitted[0].side, OrderSide::Sell);
        assert!(submitted[0].limit_price.is_none());
        assert!(submitted[0].is_exit);
    }
}
