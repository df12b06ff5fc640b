//! Share sizing and stop/profit level computation.

use rust_decimal::Decimal;
use tracing::debug;

use swing_core::{Price, Qty, RiskLevels, TrendDirection};

use crate::error::{ExecError, ExecResult};

/// Pure sizing math. Margins and the spend cap are validated at config
/// load, so the functions here only reject on account arithmetic.
pub struct RiskSizer;

impl RiskSizer {
    /// Largest whole-share quantity buyable with `max_spend` at `price`.
    ///
    /// Rejects, never clamps: a zero quantity or a position the account
    /// equity cannot cover is a sizing failure that aborts the cycle.
    pub fn size(equity: Decimal, price: Price, max_spend: Decimal) -> ExecResult<Qty> {
        let qty = Qty::affordable(max_spend, price);
        if qty.is_zero() {
            return Err(ExecError::Sizing(format!(
                "spend cap {max_spend} buys zero shares at {price}"
            )));
        }
        let remaining = equity - qty.notional(price);
        if remaining <= Decimal::ZERO {
            return Err(ExecError::Sizing(format!(
                "equity {equity} cannot cover {qty} shares at {price}"
            )));
        }
        debug!(%qty, %price, %equity, "position sized");
        Ok(qty)
    }

    /// Stop-loss/take-profit bounds around the confirmed entry price.
    ///
    /// Long: stop = entry·(1−s), take = entry·(1+p); Short inverted.
    pub fn levels(
        entry: Price,
        direction: TrendDirection,
        stop_margin: Decimal,
        profit_margin: Decimal,
    ) -> ExecResult<RiskLevels> {
        let (stop_loss, take_profit) = match direction {
            TrendDirection::Long => (
                entry.scaled(Decimal::ONE - stop_margin),
                entry.scaled(Decimal::ONE + profit_margin),
            ),
            TrendDirection::Short => (
                entry.scaled(Decimal::ONE + stop_margin),
                entry.scaled(Decimal::ONE - profit_margin),
            ),
        };
        Ok(RiskLevels::new(direction, entry, stop_loss, take_profit)?)
    }
}
