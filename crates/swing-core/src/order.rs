//! Order-related enums and the order intent value object.

use crate::decimal::{Price, Qty};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a confirmed trend.
///
/// An inconclusive reading is not a direction; the cascade expresses it
/// as the absence of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Long,
    Short,
}

impl TrendDirection {
    /// Side of the order that opens a position in this direction.
    pub fn entry_side(&self) -> OrderSide {
        match self {
            Self::Long => OrderSide::Buy,
            Self::Short => OrderSide::Sell,
        }
    }

    /// Side of the order that closes a position in this direction.
    pub fn exit_side(&self) -> OrderSide {
        self.entry_side().opposite()
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
        }
    }
}

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order type.
///
/// Entries are always limit (price-bounded slippage); exits are always
/// market (guaranteed execution).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit,
    Market,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Limit => "limit",
            Self::Market => "market",
        }
    }
}

/// Time in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    Day,
    Gtc,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Gtc => "gtc",
        }
    }
}

/// Order submission request.
///
/// A value object; the broker assigns the opaque order id on acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub ticker: String,
    pub side: OrderSide,
    pub qty: Qty,
    pub order_type: OrderType,
    pub limit_price: Option<Price>,
    pub time_in_force: TimeInForce,
    /// True when this order closes an existing position.
    pub is_exit: bool,
}

impl OrderIntent {
    /// Price-bounded entry order.
    pub fn limit_entry(
        ticker: impl Into<String>,
        side: OrderSide,
        qty: Qty,
        limit_price: Price,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            side,
            qty,
            order_type: OrderType::Limit,
            limit_price: Some(limit_price),
            time_in_force: TimeInForce::Day,
            is_exit: false,
        }
    }

    /// Unconditional exit order.
    pub fn market_exit(ticker: impl Into<String>, side: OrderSide, qty: Qty) -> Self {
        Self {
            ticker: ticker.into(),
            side,
            qty,
            order_type: OrderType::Market,
            limit_price: None,
            time_in_force: TimeInForce::Day,
            is_exit: true,
        }
    }
}
