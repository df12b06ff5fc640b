//! Programmable in-memory broker for tests.
//!
//! Downstream crates script account state, bar responses, position
//! polls and failure injection, then assert on recorded calls. The
//! mock also tracks entry orders so tests can verify that a second
//! entry is never submitted while one is unresolved.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use rust_decimal::Decimal;

use swing_core::{
    AccountSummary, AssetInfo, BarInterval, Lookback, OrderAck, OrderIntent, PositionHandle,
    PriceSeries,
};

use crate::client::{BoxFuture, BrokerClient};
use crate::error::{BrokerError, BrokerResult};

#[derive(Default)]
struct MockState {
    equity: Decimal,
    account_status: String,
    account_failures: u32,
    tradable: bool,
    asset_known: bool,
    /// Scripted bar responses per interval; the last entry repeats.
    bars: HashMap<BarInterval, VecDeque<PriceSeries>>,
    bars_failures: u32,
    /// Scripted open-position responses, consumed per call; when empty,
    /// `default_position` is served.
    position_script: VecDeque<Option<PositionHandle>>,
    default_position: Option<PositionHandle>,
    submitted: Vec<OrderIntent>,
    submit_failures: VecDeque<BrokerError>,
    cancel_errors: VecDeque<BrokerError>,
    cancel_failures: u32,
    cancel_all_calls: u32,
    open_entry_orders: Vec<OrderAck>,
    next_order_id: u64,
    overlapping_entry: bool,
}

/// Scripted broker double.
pub struct MockBroker {
    state: Mutex<MockState>,
}

impl Default for MockBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBroker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                equity: Decimal::from(10_000),
                account_status: "ACTIVE".to_string(),
                tradable: true,
                asset_known: true,
                next_order_id: 1,
                ..MockState::default()
            }),
        }
    }

    // --- Scripting ---

    pub fn set_equity(&self, equity: Decimal) {
        self.state.lock().equity = equity;
    }

    pub fn set_account_status(&self, status: impl Into<String>) {
        self.state.lock().account_status = status.into();
    }

    pub fn fail_account_times(&self, times: u32) {
        self.state.lock().account_failures = times;
    }

    pub fn set_tradable(&self, tradable: bool) {
        self.state.lock().tradable = tradable;
    }

    pub fn set_asset_known(&self, known: bool) {
        self.state.lock().asset_known = known;
    }

    /// Queue a bar response for `interval`; the final queued series
    /// keeps being served once the script runs dry.
    pub fn push_bars(&self, series: PriceSeries) {
        self.state
            .lock()
            .bars
            .entry(series.interval)
            .or_default()
            .push_back(series);
    }

    pub fn fail_bars_times(&self, times: u32) {
        self.state.lock().bars_failures = times;
    }

    /// Queue one open-position poll result (`None` → NotFound).
    pub fn push_position(&self, position: Option<PositionHandle>) {
        self.state.lock().position_script.push_back(position);
    }

    /// Served whenever the position script is empty.
    pub fn set_default_position(&self, position: Option<PositionHandle>) {
        self.state.lock().default_position = position;
    }

    /// Fail the next order submission with `err`.
    pub fn fail_next_submit(&self, err: BrokerError) {
        self.state.lock().submit_failures.push_back(err);
    }

    /// Fail the next `times` per-order cancellations with a
    /// connectivity error.
    pub fn fail_cancel_times(&self, times: u32) {
        self.state.lock().cancel_failures = times;
    }

    /// Fail the next per-order cancellation with `err`.
    pub fn fail_next_cancel_with(&self, err: BrokerError) {
        self.state.lock().cancel_errors.push_back(err);
    }

    // --- Assertions ---

    pub fn submitted_orders(&self) -> Vec<OrderIntent> {
        self.state.lock().submitted.clone()
    }

    pub fn cancel_all_calls(&self) -> u32 {
        self.state.lock().cancel_all_calls
    }

    pub fn outstanding_entry_orders(&self) -> usize {
        self.state.lock().open_entry_orders.len()
    }

    /// True if an entry order was ever submitted while another entry
    /// order was still unresolved.
    pub fn saw_overlapping_entry(&self) -> bool {
        self.state.lock().overlapping_entry
    }
}

impl BrokerClient for MockBroker {
    fn account(&self) -> BoxFuture<'_, BrokerResult<AccountSummary>> {
        Box::pin(async {
            let mut state = self.state.lock();
            if state.account_failures > 0 {
                state.account_failures -= 1;
                return Err(BrokerError::Connectivity("mock: account outage".into()));
            }
            Ok(AccountSummary {
                equity: state.equity,
                status: state.account_status.clone(),
            })
        })
    }

    fn asset<'a>(&'a self, ticker: &'a str) -> BoxFuture<'a, BrokerResult<AssetInfo>> {
        Box::pin(async move {
            let state = self.state.lock();
            if !state.asset_known {
                return Err(BrokerError::NotFound(format!("asset {ticker}")));
            }
            Ok(AssetInfo {
                symbol: ticker.to_string(),
                tradable: state.tradable,
            })
        })
    }

    fn open_position<'a>(
        &'a self,
        ticker: &'a str,
    ) -> BoxFuture<'a, BrokerResult<PositionHandle>> {
        Box::pin(async move {
            let mut state = self.state.lock();
            let scripted = match state.position_script.pop_front() {
                Some(entry) => entry,
                None => state.default_position.clone(),
            };
            match scripted {
                Some(position) => {
                    // A served position means the entry order filled.
                    state.open_entry_orders.clear();
                    Ok(position)
                }
                None => Err(BrokerError::NotFound(format!(
                    "no open position for {ticker}"
                ))),
            }
        })
    }

    fn submit_order<'a>(
        &'a self,
        intent: &'a OrderIntent,
    ) -> BoxFuture<'a, BrokerResult<OrderAck>> {
        Box::pin(async move {
            let mut state = self.state.lock();
            if let Some(err) = state.submit_failures.pop_front() {
                return Err(err);
            }

            let id = format!("mock-order-{}", state.next_order_id);
            state.next_order_id += 1;
            state.submitted.push(intent.clone());

            if intent.is_exit {
                // Market exits fill immediately: the position is gone on
                // the next unscripted poll.
                state.default_position = None;
            } else {
                if !state.open_entry_orders.is_empty() {
                    state.overlapping_entry = true;
                }
                state.open_entry_orders.push(OrderAck { id: id.clone() });
            }

            Ok(OrderAck { id })
        })
    }

    fn cancel_order<'a>(&'a self, order_id: &'a str) -> BoxFuture<'a, BrokerResult<()>> {
        Box::pin(async move {
            let mut state = self.state.lock();
            if let Some(err) = state.cancel_errors.pop_front() {
                return Err(err);
            }
            if state.cancel_failures > 0 {
                state.cancel_failures -= 1;
                return Err(BrokerError::Connectivity("mock: cancel outage".into()));
            }
            state.open_entry_orders.retain(|ack| ack.id != order_id);
            Ok(())
        })
    }

    fn cancel_all_orders(&self) -> BoxFuture<'_, BrokerResult<()>> {
        Box::pin(async {
            let mut state = self.state.lock();
            state.cancel_all_calls += 1;
            state.open_entry_orders.clear();
            Ok(())
        })
    }

    fn open_orders<'a>(&'a self, _ticker: &'a str) -> BoxFuture<'a, BrokerResult<Vec<OrderAck>>> {
        Box::pin(async {
            let state = self.state.lock();
            Ok(state.open_entry_orders.clone())
        })
    }

    fn bars<'a>(
        &'a self,
        ticker: &'a str,
        interval: BarInterval,
        _lookback: Lookback,
    ) -> BoxFuture<'a, BrokerResult<PriceSeries>> {
        Box::pin(async move {
            let mut state = self.state.lock();
            if state.bars_failures > 0 {
                state.bars_failures -= 1;
                return Err(BrokerError::DataUnavailable("mock: data outage".into()));
            }
            let queue = state.bars.entry(interval).or_default();
            match queue.len() {
                0 => Ok(PriceSeries::new(ticker, interval, Vec::new())),
                1 => Ok(queue.front().cloned().unwrap_or_else(|| {
                    PriceSeries::new(ticker, interval, Vec::new())
                })),
                _ => Ok(queue.pop_front().unwrap_or_else(|| {
                    PriceSeries::new(ticker, interval, Vec::new())
                })),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use swing_core::{OrderSide, Price, Qty};

    fn entry_intent() -> OrderIntent {
        OrderIntent::limit_entry(
            "AAPL",
            OrderSide::Buy,
            Qty::new(dec!(2)),
            Price::new(dec!(100)),
        )
    }

    #[tokio::test]
    async fn test_records_submissions_and_assigns_ids() {
        let broker = MockBroker::new();
        let intent = entry_intent();

        let ack = broker.submit_order(&intent).await.unwrap();
        assert_eq!(ack.id, "mock-order-1");
        assert_eq!(broker.submitted_orders().len(), 1);
        assert_eq!(broker.outstanding_entry_orders(), 1);
    }

    #[tokio::test]
    async fn test_position_script_then_default() {
        let broker = MockBroker::new();
        broker.push_position(None);
        broker.push_position(Some(PositionHandle {
            ticker: "AAPL".into(),
            qty: Qty::new(dec!(2)),
            avg_entry_price: Price::new(dec!(100)),
            current_price: Price::new(dec!(101)),
        }));

        assert!(matches!(
            broker.open_position("AAPL").await,
            Err(BrokerError::NotFound(_))
        ));
        assert!(broker.open_position("AAPL").await.is_ok());
        // Script empty, default is None.
        assert!(broker.open_position("AAPL").await.is_err());
    }

    #[tokio::test]
    async fn test_detects_overlapping_entries() {
        let broker = MockBroker::new();
        let intent = entry_intent();

        broker.submit_order(&intent).await.unwrap();
        assert!(!broker.saw_overlapping_entry());

        broker.submit_order(&intent).await.unwrap();
        assert!(broker.saw_overlapping_entry());
    }

    #[tokio::test]
    async fn test_cancel_failure_injection_and_escalation() {
        let broker = MockBroker::new();
        let ack = broker.submit_order(&entry_intent()).await.unwrap();

        broker.fail_cancel_times(2);
        assert!(broker.cancel_order(&ack.id).await.is_err());
        assert!(broker.cancel_order(&ack.id).await.is_err());

        broker.cancel_all_orders().await.unwrap();
        assert_eq!(broker.cancel_all_calls(), 1);
        assert_eq!(broker.outstanding_entry_orders(), 0);
    }

    #[tokio::test]
    async fn test_market_exit_clears_default_position() {
        let broker = MockBroker::new();
        broker.set_default_position(Some(PositionHandle {
            ticker: "AAPL".into(),
            qty: Qty::new(dec!(2)),
            avg_entry_price: Price::new(dec!(100)),
            current_price: Price::new(dec!(101)),
        }));
        assert!(broker.open_position("AAPL").await.is_ok());

        let exit = OrderIntent::market_exit("AAPL", OrderSide::Sell, Qty::new(dec!(2)));
        broker.submit_order(&exit).await.unwrap();
        assert!(broker.open_position("AAPL").await.is_err());
    }
}
