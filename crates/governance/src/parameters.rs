use quorum_core::time::DurationSecs;
use quorum_core::token;
use serde::{Deserialize, Serialize};

/// Default number of whole tokens needed to create a proposal
pub const DEFAULT_MIN_PROPOSAL_VOTING_POWER: u64 = 100_000;

/// Default assumed time between two blocks
pub const DEFAULT_BLOCK_TIME_SECS: u64 = 15;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Governance parameters used by the client side engine. The chain remains
/// authoritative; these only drive local gating and display.
pub struct GovernanceParameters {
    /// Minimum voting power, in base units, needed to create a proposal
    pub min_proposal_voting_power: token::Amount,
    /// Assumed time between two blocks, used to estimate the remaining
    /// voting time
    pub block_time_secs: u64,
    /// Maximum size in bytes of a proposal's title and description
    pub max_proposal_content_size: u64,
    /// Number of proposals requested per page
    pub page_size: u64,
}

impl Default for GovernanceParameters {
    fn default() -> Self {
        Self {
            min_proposal_voting_power: token::Amount::native_whole(
                DEFAULT_MIN_PROPOSAL_VOTING_POWER,
            ),
            block_time_secs: DEFAULT_BLOCK_TIME_SECS,
            max_proposal_content_size: 10_000,
            page_size: 10,
        }
    }
}

impl GovernanceParameters {
    /// The assumed block time as a duration
    pub fn block_time(&self) -> DurationSecs {
        DurationSecs(self.block_time_secs)
    }
}
