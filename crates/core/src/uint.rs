#![allow(clippy::assign_op_pattern)]
#![allow(clippy::arithmetic_side_effects)]
//! An unsigned 256 integer type. Used as the backing type of token amounts
//! and vote tallies, which are uint256 on chain.

use uint::construct_uint;

/// The value zero.
pub const ZERO: Uint = Uint::from_u64(0);

/// The value one.
pub const ONE: Uint = Uint::from_u64(1);

construct_uint! {
    /// Unsigned 256 bit integer.
    pub struct Uint(4);
}

impl Uint {
    const N_WORDS: usize = 4;

    /// Convert a [`u64`] to a [`Uint`].
    pub const fn from_u64(x: u64) -> Uint {
        Uint([x.to_le(), 0, 0, 0])
    }

    /// Approximate the value as an `f64`. Precision is lost beyond 53
    /// significant bits, which is fine for percentages and display.
    pub fn to_f64_lossy(&self) -> f64 {
        // 2^64
        const WORD: f64 = 18_446_744_073_709_551_616.0;
        self.0
            .iter()
            .take(Self::N_WORDS)
            .rev()
            .fold(0f64, |acc, word| acc * WORD + *word as f64)
    }
}

impl serde::Serialize for Uint {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let amount_string = self.to_string();
        serde::Serialize::serialize(&amount_string, serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Uint {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as serdeError;
        let amount_string: String =
            serde::Deserialize::deserialize(deserializer)?;
        Uint::from_dec_str(&amount_string).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_f64_approximation() {
        assert_eq!(ZERO.to_f64_lossy(), 0.0);
        assert_eq!(ONE.to_f64_lossy(), 1.0);
        assert_eq!(Uint::from_u64(u64::MAX).to_f64_lossy(), u64::MAX as f64);

        // 1000 tokens with 18 decimal places does not fit in a u64
        let big = Uint::from_dec_str("1000000000000000000000").unwrap();
        assert!((big.to_f64_lossy() - 1e21).abs() < 1e6);
    }

    #[test]
    fn test_serde_decimal_string() {
        let value = Uint::from_dec_str("123456789012345678901234").unwrap();
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, "\"123456789012345678901234\"");
        let decoded: Uint = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, value);
    }
}
