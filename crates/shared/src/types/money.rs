//! Fixed-point money amounts.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! `Money` wraps `rust_decimal::Decimal` and is pinned to two decimal places,
//! so every value maps one-to-one onto an integer count of minor units (cents).

use std::iter::Sum;
use std::ops::{Add, Neg, Sub};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of decimal places carried by every amount.
pub const MONEY_SCALE: u32 = 2;

/// Errors raised when building a `Money` value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The value has more fractional digits than the currency allows.
    #[error("amount {0} has more than two decimal places")]
    TooPrecise(Decimal),

    /// The value does not fit into the minor-unit representation.
    #[error("amount is out of range")]
    OutOfRange,

    /// The text is not a decimal number.
    #[error("invalid amount: {0}")]
    Parse(String),
}

/// A signed monetary amount with exactly two decimal places.
///
/// Ledger amounts are always positive; balance deltas may be negative.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest representable amount: `i64::MAX` minor units.
    pub const MAX: Self = Self(Decimal::from_parts(u32::MAX, 0x7FFF_FFFF, 0, false, MONEY_SCALE));

    /// Creates an amount, rejecting values with sub-cent precision or beyond
    /// the `i64` minor-unit range.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.normalize().scale() > MONEY_SCALE {
            return Err(MoneyError::TooPrecise(amount));
        }
        let mut amount = amount;
        amount.rescale(MONEY_SCALE);
        let money = Self(amount);
        money.to_minor_units()?;
        Ok(money)
    }

    /// Creates an amount from a count of minor units (cents).
    #[must_use]
    pub fn from_minor_units(minor: i64) -> Self {
        Self(Decimal::new(minor, MONEY_SCALE))
    }

    /// Returns the amount as a count of minor units (cents).
    pub fn to_minor_units(self) -> Result<i64, MoneyError> {
        let mut amount = self.0;
        amount.rescale(MONEY_SCALE);
        i64::try_from(amount.mantissa()).map_err(|_| MoneyError::OutOfRange)
    }

    /// Returns the underlying decimal.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if the amount is strictly less than zero.
    #[must_use]
    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Adds two amounts, returning `None` if the result leaves the minor-unit range.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).and_then(Self::bounded)
    }

    /// Subtracts two amounts, returning `None` if the result leaves the minor-unit range.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).and_then(Self::bounded)
    }

    fn bounded(amount: Decimal) -> Option<Self> {
        Self::new(amount).ok()
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl std::str::FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|e| MoneyError::Parse(e.to_string()))?;
        Self::new(amount)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}
