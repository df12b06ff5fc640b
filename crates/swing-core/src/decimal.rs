//! Precision-safe decimal types for trading.
//!
//! Uses `rust_decimal` for exact decimal arithmetic. Prices and share
//! quantities are kept as distinct newtypes so they cannot be mixed up
//! in sizing or limit-price calculations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use crate::error::CoreError;

/// Price with exact decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Scale by a factor, e.g. `entry.scaled(Decimal::ONE - stop_margin)`.
    ///
    /// Used for stop/profit levels and limit-price slippage bounds.
    #[inline]
    pub fn scaled(&self, factor: Decimal) -> Self {
        Self(self.0 * factor)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Decimal = s.parse().map_err(CoreError::from)?;
        Ok(Self(value))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Price {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

/// Whole-share quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Qty(pub Decimal);

impl Qty {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Largest whole-share quantity purchasable with `spend` at `price`.
    ///
    /// Returns `Qty::ZERO` when price is not positive.
    #[inline]
    pub fn affordable(spend: Decimal, price: Price) -> Self {
        if !price.is_positive() {
            return Self::ZERO;
        }
        Self((spend / price.inner()).floor())
    }

    /// Notional value: qty * price.
    #[inline]
    pub fn notional(&self, price: Price) -> Decimal {
        self.0 * price.inner()
    }
}

impl fmt::Display for Qty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Decimal> for Qty {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_scaled() {
        let entry = Price::new(dec!(100));
        assert_eq!(entry.scaled(dec!(0.95)).inner(), dec!(95.00));
        assert_eq!(entry.scaled(dec!(1.10)).inner(), dec!(110.00));
    }

    #[test]
    fn test_affordable_floors() {
        let qty = Qty::affordable(dec!(1000), Price::new(dec!(333)));
        assert_eq!(qty.inner(), dec!(3));
    }

    #[test]
    fn test_affordable_below_one_share() {
        let qty = Qty::affordable(dec!(50), Price::new(dec!(333)));
        assert!(qty.is_zero());
    }

    #[test]
    fn test_affordable_zero_price() {
        let qty = Qty::affordable(dec!(1000), Price::ZERO);
        assert!(qty.is_zero());
    }

    #[test]
    fn test_notional() {
        let qty = Qty::new(dec!(4));
        assert_eq!(qty.notional(Price::new(dec!(25.5))), dec!(102.0));
    }

    #[test]
    fn test_price_from_str() {
        let price: Price = "101.50".parse().unwrap();
        assert_eq!(price, Price::new(dec!(101.50)));

        let err = "not a price".parse::<Price>().unwrap_err();
        assert!(matches!(err, CoreError::DecimalParse(_)));
    }
}
