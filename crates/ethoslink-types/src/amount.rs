//! Token unit and price types with 18-decimal precision
//!
//! EthosLink uses fixed-point arithmetic with u128 base units: one whole token
//! is `UNIT` (10^18) base units. Every supply, balance, and grant in the ledger
//! is denominated in base units; `Amount::from_whole` is the only place the
//! scale factor is applied. Balances are never negative, so the raw value is
//! unsigned and every subtraction is checked.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

/// Standard precision for token units (18 decimals)
pub const DECIMALS: u8 = 18;

/// Base units per whole token
pub const UNIT: u128 = 1_000_000_000_000_000_000;

/// A quantity of token units, in base units
///
/// Supplies, holding balances, and listed balances are all `Amount`s. Arithmetic
/// is checked: addition can overflow (rejected), subtraction below zero is a
/// domain error surfaced by the caller (insufficient balance).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(pub u128);

impl Amount {
    /// Create an amount from base units
    pub const fn new(base_units: u128) -> Self {
        Self(base_units)
    }

    /// The zero amount
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Create an amount from whole tokens (scales by `UNIT`)
    pub const fn from_whole(whole: u64) -> Self {
        Self(whole as u128 * UNIT)
    }

    /// Check if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction (None if the result would go negative)
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Approximate whole-token value, for display only
    pub fn to_whole(&self) -> f64 {
        self.0 as f64 / UNIT as f64
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        // Saturating: a sum over balances that already overflowed u128 is
        // unrepresentable anyway, and accessors must not panic.
        iter.fold(Amount::zero(), |acc, a| {
            acc.checked_add(a).unwrap_or(Amount(u128::MAX))
        })
    }
}

/// A per-listing quote value
///
/// Prices are opaque integers whose unit convention is fixed by the caller; the
/// ledger records and reports them but never does arithmetic on them, and no
/// settlement transfer is modeled.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Price(pub u128);

impl Price {
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    pub const fn zero() -> Self {
        Self(0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
