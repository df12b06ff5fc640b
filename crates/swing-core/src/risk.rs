//! Stop-loss/take-profit levels around a confirmed entry price.

use crate::cycle::ExitReason;
use crate::decimal::Price;
use crate::error::{CoreError, Result};
use crate::order::TrendDirection;
use serde::{Deserialize, Serialize};

/// Exit bounds computed once per cycle from the confirmed entry price.
///
/// Invariant: for Long, `stop_loss < entry < take_profit`; for Short,
/// `take_profit < entry < stop_loss`. Enforced at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLevels {
    pub direction: TrendDirection,
    pub entry: Price,
    pub stop_loss: Price,
    pub take_profit: Price,
}

impl RiskLevels {
    /// Build levels, rejecting any ordering that violates the invariant.
    pub fn new(
        direction: TrendDirection,
        entry: Price,
        stop_loss: Price,
        take_profit: Price,
    ) -> Result<Self> {
        let ordered = match direction {
            TrendDirection::Long => stop_loss < entry && entry < take_profit,
            TrendDirection::Short => take_profit < entry && entry < stop_loss,
        };
        if !ordered {
            return Err(CoreError::InvalidLevels(format!(
                "{direction}: stop={stop_loss} entry={entry} take={take_profit}"
            )));
        }
        Ok(Self {
            direction,
            entry,
            stop_loss,
            take_profit,
        })
    }

    /// Price-bound exit test for the monitor loop.
    ///
    /// Take-profit is checked before stop-loss; both bounds are checked
    /// before any secondary signal by the caller.
    pub fn bound_crossed(&self, price: Price) -> Option<ExitReason> {
        match self.direction {
            TrendDirection::Long => {
                if price >= self.take_profit {
                    Some(ExitReason::TakeProfit)
                } else if price <= self.stop_loss {
                    Some(ExitReason::StopLoss)
                } else {
                    None
                }
            }
            TrendDirection::Short => {
                if price <= self.take_profit {
                    Some(ExitReason::TakeProfit)
                } else if price >= self.stop_loss {
                    Some(ExitReason::StopLoss)
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn long_levels() -> RiskLevels {
        RiskLevels::new(
            TrendDirection::Long,
            Price::new(dec!(100)),
            Price::new(dec!(95)),
            Price::new(dec!(110)),
        )
        .unwrap()
    }

    fn short_levels() -> RiskLevels {
        RiskLevels::new(
            TrendDirection::Short,
            Price::new(dec!(100)),
            Price::new(dec!(105)),
            Price::new(dec!(90)),
        )
        .unwrap()
    }

    #[test]
    fn test_long_ordering_enforced() {
        let bad = RiskLevels::new(
            TrendDirection::Long,
            Price::new(dec!(100)),
            Price::new(dec!(110)),
            Price::new(dec!(95)),
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_short_ordering_enforced() {
        let bad = RiskLevels::new(
            TrendDirection::Short,
            Price::new(dec!(100)),
            Price::new(dec!(90)),
            Price::new(dec!(105)),
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_long_take_profit_crossed() {
        let levels = long_levels();
        assert_eq!(
            levels.bound_crossed(Price::new(dec!(111))),
            Some(ExitReason::TakeProfit)
        );
    }

    #[test]
    fn test_long_stop_loss_crossed() {
        let levels = long_levels();
        assert_eq!(
            levels.bound_crossed(Price::new(dec!(94))),
            Some(ExitReason::StopLoss)
        );
    }

    #[test]
    fn test_long_within_bounds() {
        let levels = long_levels();
        assert!(levels.bound_crossed(Price::new(dec!(100))).is_none());
        assert!(levels.bound_crossed(Price::new(dec!(95.01))).is_none());
        assert!(levels.bound_crossed(Price::new(dec!(109.99))).is_none());
    }

    #[test]
    fn test_short_bounds_inverted() {
        let levels = short_levels();
        assert_eq!(
            levels.bound_crossed(Price::new(dec!(89))),
            Some(ExitReason::TakeProfit)
        );
        assert_eq!(
            levels.bound_crossed(Price::new(dec!(106))),
            Some(ExitReason::StopLoss)
        );
        assert!(levels.bound_crossed(Price::new(dec!(100))).is_none());
    }
}
