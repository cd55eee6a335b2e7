//! Chain related data types

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Height of a block, i.e. the level.
#[derive(
    Default,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct BlockHeight(pub u64);

impl BlockHeight {
    /// The number of blocks from `self` until `other`, or `None` if `other`
    /// is not after `self`.
    pub fn blocks_until(&self, other: BlockHeight) -> Option<u64> {
        other.0.checked_sub(self.0).filter(|blocks| *blocks > 0)
    }
}

impl Display for BlockHeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BlockHeight {
    fn from(height: u64) -> Self {
        BlockHeight(height)
    }
}

impl From<BlockHeight> for u64 {
    fn from(height: BlockHeight) -> Self {
        height.0
    }
}

/// Numeric identifier of the chain the wallet is connected to.
#[derive(
    Default,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        ChainId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_until() {
        let current = BlockHeight(100);
        assert_eq!(current.blocks_until(BlockHeight(160)), Some(60));
        assert_eq!(current.blocks_until(BlockHeight(100)), None);
        assert_eq!(current.blocks_until(BlockHeight(40)), None);
    }
}
