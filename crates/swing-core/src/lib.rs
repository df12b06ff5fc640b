//! Core domain types for the swingbot trade cycle.
//!
//! This crate provides the value objects shared across the system:
//! - `Price`, `Qty`: precision-safe numeric types
//! - `Bar`, `PriceSeries`: OHLC market data for one ticker/interval
//! - `TrendDirection`, `OrderIntent`: trading enums and order values
//! - `RiskLevels`: stop-loss/take-profit bounds around an entry
//! - `CycleResult`, `ExitReason`: terminal outcomes of one cycle

pub mod bars;
pub mod cycle;
pub mod decimal;
pub mod error;
pub mod order;
pub mod position;
pub mod risk;

pub use bars::{Bar, BarInterval, Lookback, PriceSeries};
pub use cycle::{CycleResult, ExitReason};
pub use decimal::{Price, Qty};
pub use error::{CoreError, Result};
pub use order::{OrderIntent, OrderSide, OrderType, TimeInForce, TrendDirection};
pub use position::{AccountSummary, AssetInfo, OrderAck, PositionHandle};
pub use risk::RiskLevels;
