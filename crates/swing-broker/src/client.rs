//! Broker client trait.
//!
//! Trait-based abstraction over the brokerage/market-data API so the
//! cascade, lifecycle manager and monitor can be exercised against an
//! in-memory double. Methods return boxed futures to keep the trait
//! dyn-compatible.

use std::pin::Pin;
use std::sync::Arc;

use swing_core::{
    AccountSummary, AssetInfo, BarInterval, Lookback, OrderAck, OrderIntent, PositionHandle,
    PriceSeries,
};

use crate::error::BrokerResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Operations the trading core requires from the brokerage.
///
/// Error contract:
/// - transport failures → `BrokerError::Connectivity` (retryable)
/// - missing position   → `BrokerError::NotFound` (expected, frequent)
/// - order rejection    → `BrokerError::Rejected` (never retried)
/// - bar gaps/outages   → `BrokerError::DataUnavailable` (retryable)
pub trait BrokerClient: Send + Sync {
    /// Account equity and status.
    fn account(&self) -> BoxFuture<'_, BrokerResult<AccountSummary>>;

    /// Tradability of one ticker.
    fn asset<'a>(&'a self, ticker: &'a str) -> BoxFuture<'a, BrokerResult<AssetInfo>>;

    /// Live view of the open position for `ticker`.
    fn open_position<'a>(&'a self, ticker: &'a str)
        -> BoxFuture<'a, BrokerResult<PositionHandle>>;

    /// Submit an order; the broker assigns the order id.
    fn submit_order<'a>(&'a self, intent: &'a OrderIntent)
        -> BoxFuture<'a, BrokerResult<OrderAck>>;

    /// Cancel one resting order by id.
    fn cancel_order<'a>(&'a self, order_id: &'a str) -> BoxFuture<'a, BrokerResult<()>>;

    /// Cancel every resting order. Last-resort safety action.
    fn cancel_all_orders(&self) -> BoxFuture<'_, BrokerResult<()>>;

    /// Resting orders for `ticker`.
    fn open_orders<'a>(&'a self, ticker: &'a str) -> BoxFuture<'a, BrokerResult<Vec<OrderAck>>>;

    /// Historical OHLC bars, newest last.
    fn bars<'a>(
        &'a self,
        ticker: &'a str,
        interval: BarInterval,
        lookback: Lookback,
    ) -> BoxFuture<'a, BrokerResult<PriceSeries>>;
}

/// Shared handle to a broker implementation.
pub type DynBroker = Arc<dyn BrokerClient>;
