//! Token amounts used for voting power, vote tallies and quorums.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::uint::Uint;

/// Amount in base units (18 decimal places for the governance token).
#[derive(
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Debug,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct Amount {
    raw: Uint,
}

/// Maximum decimal places of the governance token [`Amount`].
pub const NATIVE_MAX_DECIMAL_PLACES: u8 = 18;

/// Decimal scale of the governance token [`Amount`].
pub const NATIVE_SCALE: u64 = 1_000_000_000_000_000_000;

#[allow(missing_docs)]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountParseError {
    #[error("Error decoding token amount: {0}")]
    InvalidDecimal(String),
    #[error("Token amount overflowed 256 bits")]
    Overflow,
}

impl Amount {
    /// Convert a [`u64`] to an [`Amount`].
    pub const fn from_u64(x: u64) -> Self {
        Self {
            raw: Uint::from_u64(x),
        }
    }

    /// Get the amount as a [`Uint`].
    pub const fn from_uint(raw: Uint) -> Self {
        Self { raw }
    }

    /// Get zero amount
    pub const fn zero() -> Self {
        Self::from_u64(0)
    }

    /// Check if [`Amount`] is zero.
    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// Create a new amount of the governance token from a whole number of
    /// tokens. Saturates at the maximum representable value.
    pub fn native_whole(amount: u64) -> Self {
        let raw = Uint::from(amount)
            .checked_mul(Uint::from(NATIVE_SCALE))
            .unwrap_or(Uint::MAX);
        Self { raw }
    }

    /// Get the raw [`Uint`] value in base units
    pub fn raw_amount(&self) -> Uint {
        self.raw
    }

    /// Checked addition. Returns `None` on overflow.
    pub fn checked_add(&self, amount: Amount) -> Option<Self> {
        self.raw.checked_add(amount.raw).map(|raw| Self { raw })
    }

    /// Checked subtraction. Returns `None` on underflow.
    pub fn checked_sub(&self, amount: Amount) -> Option<Self> {
        self.raw.checked_sub(amount.raw).map(|raw| Self { raw })
    }

    /// Saturating addition.
    pub fn saturating_add(&self, amount: Amount) -> Self {
        Self {
            raw: self.raw.saturating_add(amount.raw),
        }
    }

    /// Check if the given amount is covered by this amount
    pub fn can_spend(&self, amount: &Amount) -> bool {
        self.raw >= amount.raw
    }

    /// Approximate the amount in base units as an `f64`
    pub fn to_f64_lossy(&self) -> f64 {
        self.raw.to_f64_lossy()
    }

    /// Print as a decimal string of whole tokens, with trailing fractional
    /// zeros removed.
    pub fn to_string_native(&self) -> String {
        let decimals = NATIVE_MAX_DECIMAL_PLACES as usize;
        let mut string = self.raw.to_string();
        if string.len() > decimals {
            let split = string.len() - decimals;
            string.insert(split, '.');
        } else {
            let padding = "0".repeat(decimals - string.len());
            string = format!("0.{padding}{string}");
        }
        let trimmed = string.trim_end_matches('0').trim_end_matches('.');
        trimmed.to_string()
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    /// Parse a raw amount in base units
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountParseError::InvalidDecimal(s.to_string()));
        }
        Uint::from_dec_str(s)
            .map(Self::from_uint)
            .map_err(|_| AmountParseError::Overflow)
    }
}

impl From<u64> for Amount {
    fn from(x: u64) -> Self {
        Self::from_u64(x)
    }
}

impl From<Uint> for Amount {
    fn from(raw: Uint) -> Self {
        Self { raw }
    }
}

/// Testing helpers and strategies for tokens
#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use proptest::prelude::*;

    use super::*;

    /// Generate an arbitrary token amount in base units, up to ten billion
    /// whole tokens.
    pub fn arb_amount() -> impl Strategy<Value = Amount> {
        any::<u64>().prop_flat_map(|whole| {
            (0..=NATIVE_SCALE).prop_map(move |frac| {
                let whole = Amount::native_whole(whole % 10_000_000_000);
                whole.saturating_add(Amount::from_u64(frac))
            })
        })
    }

    /// Generate an arbitrary non-zero token amount
    pub fn arb_non_zero_amount() -> impl Strategy<Value = Amount> {
        arb_amount().prop_filter("amount must be non-zero", |a| !a.is_zero())
    }
}
