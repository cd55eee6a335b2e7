use std::fmt::Display;
use std::str::FromStr;

use quorum_core::address::Address;
use quorum_core::chain::BlockHeight;
use quorum_core::time::DateTimeUtc;
use quorum_core::token;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Proposal identifier, assigned on chain
pub type ProposalId = u64;

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProposalError {
    #[error("Unknown proposal state code {0}")]
    InvalidStateCode(u8),
    #[error("Unknown proposal state {0:?}")]
    InvalidStateName(String),
}

/// The on-chain state of a proposal, as last reported by the chain.
///
/// ```text
/// Pending ──▶ Active ──▶ Succeeded ──▶ Queued ──▶ Executed
///               │  │                      │
///               │  └──▶ Defeated          └──▶ Expired
///               └──▶ Canceled
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProposalState {
    /// Created, voting window not yet open
    Pending,
    /// Voting window open
    Active,
    /// Canceled by the proposer or by governance
    Canceled,
    /// Voting window closed without passing
    Defeated,
    /// Voting window closed and the proposal passed
    Succeeded,
    /// Queued in the timelock
    Queued,
    /// The timelock window lapsed without execution
    Expired,
    /// Executed
    Executed,
}

impl ProposalState {
    /// All the states, in the governor contract's numbering order
    pub const ALL: [ProposalState; 8] = [
        ProposalState::Pending,
        ProposalState::Active,
        ProposalState::Canceled,
        ProposalState::Defeated,
        ProposalState::Succeeded,
        ProposalState::Queued,
        ProposalState::Expired,
        ProposalState::Executed,
    ];

    /// No further transition is possible out of a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProposalState::Canceled
                | ProposalState::Defeated
                | ProposalState::Expired
                | ProposalState::Executed
        )
    }

    /// The proposal did not make it: either defeated or canceled
    pub fn is_failed(&self) -> bool {
        matches!(self, ProposalState::Defeated | ProposalState::Canceled)
    }

    /// Check whether the state machine allows moving from `self` to `next`.
    /// Staying in the same state is always allowed.
    pub fn can_transition_to(&self, next: ProposalState) -> bool {
        use ProposalState::*;

        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Pending, Active)
                | (Active, Canceled)
                | (Active, Defeated)
                | (Active, Succeeded)
                | (Succeeded, Queued)
                | (Queued, Executed)
                | (Queued, Expired)
        )
    }

    /// The governor contract's numeric code for this state
    pub fn code(&self) -> u8 {
        match self {
            ProposalState::Pending => 0,
            ProposalState::Active => 1,
            ProposalState::Canceled => 2,
            ProposalState::Defeated => 3,
            ProposalState::Succeeded => 4,
            ProposalState::Queued => 5,
            ProposalState::Expired => 6,
            ProposalState::Executed => 7,
        }
    }
}

impl Display for ProposalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProposalState::Pending => write!(f, "pending"),
            ProposalState::Active => write!(f, "active"),
            ProposalState::Canceled => write!(f, "canceled"),
            ProposalState::Defeated => write!(f, "defeated"),
            ProposalState::Succeeded => write!(f, "succeeded"),
            ProposalState::Queued => write!(f, "queued"),
            ProposalState::Expired => write!(f, "expired"),
            ProposalState::Executed => write!(f, "executed"),
        }
    }
}

impl FromStr for ProposalState {
    type Err = ProposalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ProposalState::ALL
            .into_iter()
            .find(|state| state.to_string() == normalized)
            .ok_or_else(|| ProposalError::InvalidStateName(s.to_string()))
    }
}

impl TryFrom<u8> for ProposalState {
    type Error = ProposalError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        ProposalState::ALL
            .get(usize::from(code))
            .copied()
            .ok_or(ProposalError::InvalidStateCode(code))
    }
}

/// A governance proposal as read from the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// The proposal id
    pub id: ProposalId,
    /// The proposal title
    pub title: String,
    /// The proposal description
    pub description: String,
    /// The account that created the proposal
    pub proposer: Address,
    /// Last known state
    pub state: ProposalState,
    /// First block of the voting window
    pub start_block: BlockHeight,
    /// Last block of the voting window
    pub end_block: BlockHeight,
    /// Accumulated weight of `for` votes
    pub for_votes: token::Amount,
    /// Accumulated weight of `against` votes
    pub against_votes: token::Amount,
    /// Accumulated weight of abstentions
    pub abstain_votes: token::Amount,
    /// Minimum combined `for` and `against` weight for a binding result
    pub quorum: token::Amount,
    /// Set once the proposal has been executed
    pub executed: bool,
    /// Earliest time at which a queued proposal may be executed
    pub eta: Option<DateTimeUtc>,
}

impl Proposal {
    /// The combined `for` and `against` weight. Abstentions are not
    /// decisive.
    pub fn decisive_votes(&self) -> token::Amount {
        self.for_votes.saturating_add(self.against_votes)
    }
}

impl Display for Proposal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Proposal Id: {}", self.id)?;
        writeln!(f, "{:4}Title: {}", "", self.title)?;
        writeln!(f, "{:4}Proposer: {}", "", self.proposer)?;
        writeln!(f, "{:4}State: {}", "", self.state)?;
        writeln!(
            f,
            "{:4}Voting window: blocks {} to {}",
            "", self.start_block, self.end_block
        )?;
        write!(
            f,
            "{:4}Votes: {} for, {} against, {} abstain (quorum {})",
            "",
            self.for_votes.to_string_native(),
            self.against_votes.to_string_native(),
            self.abstain_votes.to_string_native(),
            self.quorum.to_string_native()
        )
    }
}

/// The user supplied content of a proposal to be created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalDraft {
    /// The proposal title
    pub title: String,
    /// The proposal description
    pub description: String,
}

impl ProposalDraft {
    /// The size of the proposal content in bytes
    pub fn content_size(&self) -> u64 {
        let size = self.title.len().saturating_add(self.description.len());
        u64::try_from(size).unwrap_or(u64::MAX)
    }
}

/// Testing helpers and strategies for governance proposals
#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use proptest::prelude::*;
    use quorum_core::address::testing::{arb_address, established_address_1};
    use quorum_core::token::testing::arb_amount;

    use super::*;

    /// A proposal in the given state with no votes and a zero quorum
    pub fn proposal(id: ProposalId, state: ProposalState) -> Proposal {
        Proposal {
            id,
            title: format!("Proposal #{id}"),
            description: "Test proposal".to_string(),
            proposer: established_address_1(),
            state,
            start_block: BlockHeight(100),
            end_block: BlockHeight(200),
            for_votes: token::Amount::zero(),
            against_votes: token::Amount::zero(),
            abstain_votes: token::Amount::zero(),
            quorum: token::Amount::zero(),
            executed: state == ProposalState::Executed,
            eta: None,
        }
    }

    /// Generate an arbitrary proposal state
    pub fn arb_proposal_state() -> impl Strategy<Value = ProposalState> {
        proptest::sample::select(ProposalState::ALL.to_vec())
    }

    prop_compose! {
        /// Generate an arbitrary proposal
        pub fn arb_proposal()(
            id in any::<u16>(),
            proposer in arb_address(),
            state in arb_proposal_state(),
            start in 0u64..10_000,
            length in 1u64..10_000,
            for_votes in arb_amount(),
            against_votes in arb_amount(),
            abstain_votes in arb_amount(),
            quorum in arb_amount(),
        ) -> Proposal {
            Proposal {
                id: u64::from(id),
                title: format!("Proposal #{id}"),
                description: String::new(),
                proposer,
                state,
                start_block: BlockHeight(start),
                end_block: BlockHeight(start + length),
                for_votes,
                against_votes,
                abstain_votes,
                quorum,
                executed: state == ProposalState::Executed,
                eta: None,
            }
        }
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_state_codes_follow_governor_order() {
        for (code, state) in ProposalState::ALL.iter().enumerate() {
            let code = u8::try_from(code).unwrap();
            assert_eq!(ProposalState::try_from(code).unwrap(), *state);
            assert_eq!(state.code(), code);
        }
        assert_matches!(
            ProposalState::try_from(8),
            Err(ProposalError::InvalidStateCode(8))
        );
    }

    #[test]
    fn test_state_names() {
        assert_eq!(
            "Succeeded".parse::<ProposalState>().unwrap(),
            ProposalState::Succeeded
        );
        assert_matches!(
            "voting".parse::<ProposalState>(),
            Err(ProposalError::InvalidStateName(_))
        );
    }

    #[test]
    fn test_terminal_states_have_no_exit() {
        for from in ProposalState::ALL {
            let exits = ProposalState::ALL
                .into_iter()
                .filter(|to| *to != from && from.can_transition_to(*to))
                .count();
            assert_eq!(from.is_terminal(), exits == 0, "{from}");
        }
    }

    #[test]
    fn test_state_machine_edges() {
        use ProposalState::*;

        assert!(Pending.can_transition_to(Active));
        assert!(Active.can_transition_to(Succeeded));
        assert!(Succeeded.can_transition_to(Queued));
        assert!(Queued.can_transition_to(Executed));
        assert!(Queued.can_transition_to(Expired));
        assert!(!Pending.can_transition_to(Succeeded));
        assert!(!Succeeded.can_transition_to(Executed));
        assert!(!Active.can_transition_to(Pending));
        assert!(!Executed.can_transition_to(Queued));
    }

    #[test]
    fn test_decisive_votes_exclude_abstentions() {
        let mut proposal = testing::proposal(1, ProposalState::Active);
        proposal.for_votes = token::Amount::native_whole(10);
        proposal.against_votes = token::Amount::native_whole(5);
        proposal.abstain_votes = token::Amount::native_whole(100);
        assert_eq!(proposal.decisive_votes(), token::Amount::native_whole(15));
    }
}
