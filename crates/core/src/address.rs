//! Account addresses. Accounts are identified by 20-byte hex addresses with
//! a `0x` prefix, as handed out by the connected wallet.

use std::fmt::{Debug, Display};
use std::str::FromStr;

use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The length of a raw address in bytes
pub const ADDRESS_LEN: usize = 20;

/// The prefix of an encoded address
pub const ADDRESS_PREFIX: &str = "0x";

#[allow(missing_docs)]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Address must start with \"{ADDRESS_PREFIX}\", got {0}")]
    MissingPrefix(String),
    #[error("Error decoding address from hex: {0}")]
    DecodeHex(String),
    #[error("Unexpected address length {0}, expected {ADDRESS_LEN} bytes")]
    InvalidLength(usize),
}

/// Result of a function that may fail
pub type Result<T> = std::result::Result<T, DecodeError>;

/// An account address
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Construct an address from its raw bytes
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// The raw bytes of the address
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Encode an address as a `0x`-prefixed lowercase hex string
    pub fn encode(&self) -> String {
        format!("{ADDRESS_PREFIX}{}", HEXLOWER.encode(&self.0))
    }

    /// Decode an address from a `0x`-prefixed hex string. Mixed case is
    /// accepted.
    pub fn decode(string: impl AsRef<str>) -> Result<Self> {
        let string = string.as_ref().trim();
        let hex = string
            .strip_prefix(ADDRESS_PREFIX)
            .or_else(|| string.strip_prefix("0X"))
            .ok_or_else(|| DecodeError::MissingPrefix(string.to_string()))?;
        let bytes = HEXLOWER_PERMISSIVE
            .decode(hex.as_bytes())
            .map_err(|err| DecodeError::DecodeHex(err.to_string()))?;
        let bytes: [u8; ADDRESS_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| DecodeError::InvalidLength(bytes.len()))?;
        Ok(Self(bytes))
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({})", self.encode())
    }
}

impl FromStr for Address {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self> {
        Address::decode(s)
    }
}

impl TryFrom<String> for Address {
    type Error = DecodeError;

    fn try_from(value: String) -> Result<Self> {
        Address::decode(value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.encode()
    }
}

/// Helpers for testing with addresses.
#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use proptest::prelude::*;

    use super::*;

    /// An established user address for testing & development
    pub fn established_address_1() -> Address {
        Address::decode("0x1111111111111111111111111111111111111111")
            .expect("The token address decoding shouldn't fail")
    }

    /// An established user address for testing & development
    pub fn established_address_2() -> Address {
        Address::decode("0x2222222222222222222222222222222222222222")
            .expect("The token address decoding shouldn't fail")
    }

    /// An established user address for testing & development
    pub fn established_address_3() -> Address {
        Address::decode("0x3333333333333333333333333333333333333333")
            .expect("The token address decoding shouldn't fail")
    }

    /// Generate an arbitrary address
    pub fn arb_address() -> impl Strategy<Value = Address> {
        any::<[u8; ADDRESS_LEN]>().prop_map(Address::from_bytes)
    }
}
