//! Broker-boundary value objects.
//!
//! These are the shapes the trading core consumes from the broker
//! collaborator, independent of any wire format. They are re-derived
//! from the broker's authoritative state on every use and never cached
//! across cycles.

use crate::decimal::{Price, Qty};
use serde::{Deserialize, Serialize};

/// Live view of an open position, refreshed by polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionHandle {
    pub ticker: String,
    pub qty: Qty,
    pub avg_entry_price: Price,
    pub current_price: Price,
}

/// Account state relevant to sizing and the startup check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub equity: rust_decimal::Decimal,
    pub status: String,
}

impl AccountSummary {
    pub fn is_active(&self) -> bool {
        self.status == "ACTIVE"
    }
}

/// Tradability info for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub symbol: String,
    pub tradable: bool,
}

/// Broker acknowledgment of an accepted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAck {
    /// Opaque broker-assigned order identifier.
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_active() {
        let account = AccountSummary {
            equity: rust_decimal::Decimal::from(1000),
            status: "ACTIVE".to_string(),
        };
        assert!(account.is_active());

        let suspended = AccountSummary {
            status: "SUSPENDED".to_string(),
            ..account
        };
        assert!(!suspended.is_active());
    }
}
