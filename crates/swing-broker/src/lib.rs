//! Broker/market-data interface boundary.
//!
//! The trading core talks to the brokerage through the `BrokerClient`
//! trait; everything network-facing is wrapped in `RetryPolicy` so
//! bounded-retry-with-sleep behavior is uniform and testable.
//!
//! - `client`: dyn-compatible async trait + `DynBroker` handle
//! - `error`: transport/domain error taxonomy
//! - `retry`: the shared bounded-retry primitive
//! - `rest`: Alpaca-style REST adapter
//! - `mock`: programmable in-memory broker for tests

pub mod client;
pub mod error;
pub mod mock;
pub mod rest;
pub mod retry;

pub use client::{BoxFuture, BrokerClient, DynBroker};
pub use error::{BrokerError, BrokerResult};
pub use mock::MockBroker;
pub use rest::{RestBroker, RestConfig};
pub use retry::{Attempt, Outcome, RetryBudget, RetryPolicy};
