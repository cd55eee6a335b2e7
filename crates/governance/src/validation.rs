//! Lifecycle gate: which actions the caller may take on a proposal in its
//! last known state. Every check here is local and runs before anything is
//! submitted to the chain.

use quorum_core::address::Address;
use quorum_core::time::DateTimeUtc;
use quorum_core::token;
use thiserror::Error;

use crate::parameters::GovernanceParameters;
use crate::storage::proposal::{
    Proposal, ProposalDraft, ProposalId, ProposalState,
};
use crate::storage::vote::VoteLedger;

/// The reason an action was rejected by the gate
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GateError {
    /// No wallet is connected
    #[error("No account is connected")]
    NotConnected,
    /// The proposal is not known locally
    #[error("Proposal {0} is not loaded")]
    UnknownProposal(ProposalId),
    /// The proposal is not in the state the action requires
    #[error("Proposal {id} is {actual}, but the action requires {expected}")]
    InvalidState {
        /// The proposal id
        id: ProposalId,
        /// The state the action requires
        expected: ProposalState,
        /// The last known state
        actual: ProposalState,
    },
    /// The caller has no voting power
    #[error("The account has no voting power")]
    NoVotingPower,
    /// The caller already voted, or a vote is pending confirmation
    #[error("Account {account} has already voted on proposal {id}")]
    AlreadyVoted {
        /// The proposal id
        id: ProposalId,
        /// The voter
        account: Address,
    },
    /// The proposal has already been executed
    #[error("Proposal {0} has already been executed")]
    AlreadyExecuted(ProposalId),
    /// A queued proposal has no execution time
    #[error("Proposal {0} has no execution time set")]
    MissingEta(ProposalId),
    /// The timelock has not elapsed yet
    #[error("Proposal {id} cannot be executed before {eta}, it is now {now}")]
    TimelockNotElapsed {
        /// The proposal id
        id: ProposalId,
        /// Earliest execution time
        eta: DateTimeUtc,
        /// Time of the check
        now: DateTimeUtc,
    },
    /// Not enough voting power to create a proposal
    #[error(
        "Creating a proposal requires a voting power of at least {threshold}, \
         but the account has {power}"
    )]
    InsufficientVotingPower {
        /// The caller's voting power, in whole tokens
        power: String,
        /// The required voting power, in whole tokens
        threshold: String,
    },
    /// The proposal title is empty
    #[error("The proposal title cannot be empty")]
    EmptyTitle,
    /// The proposal content is too large
    #[error(
        "Invalid proposal content length: the proposal content length is {0} \
         but maximum is {1}"
    )]
    InvalidContentLength(u64, u64),
}

fn require_state(
    proposal: &Proposal,
    expected: ProposalState,
) -> Result<(), GateError> {
    if proposal.state == expected {
        Ok(())
    } else {
        Err(GateError::InvalidState {
            id: proposal.id,
            expected,
            actual: proposal.state,
        })
    }
}

/// A vote requires an active proposal, some voting power, and no prior
/// (or pending) vote from the same account.
pub fn validate_vote(
    proposal: &Proposal,
    account: &Address,
    voting_power: token::Amount,
    ledger: &VoteLedger,
) -> Result<(), GateError> {
    require_state(proposal, ProposalState::Active)?;
    if ledger.has_voted(account, proposal.id) {
        return Err(GateError::AlreadyVoted {
            id: proposal.id,
            account: *account,
        });
    }
    if voting_power.is_zero() {
        return Err(GateError::NoVotingPower);
    }
    Ok(())
}

/// Check if `account` may vote on `proposal`
pub fn can_vote(
    proposal: &Proposal,
    account: &Address,
    voting_power: token::Amount,
    ledger: &VoteLedger,
) -> bool {
    validate_vote(proposal, account, voting_power, ledger).is_ok()
}

/// Queueing requires a succeeded proposal that was not executed.
pub fn validate_queue(proposal: &Proposal) -> Result<(), GateError> {
    require_state(proposal, ProposalState::Succeeded)?;
    if proposal.executed {
        return Err(GateError::AlreadyExecuted(proposal.id));
    }
    Ok(())
}

/// Check if `proposal` may be queued
pub fn can_queue(proposal: &Proposal) -> bool {
    validate_queue(proposal).is_ok()
}

/// Execution requires a queued proposal whose timelock has elapsed.
pub fn validate_execute(
    proposal: &Proposal,
    now: DateTimeUtc,
) -> Result<(), GateError> {
    require_state(proposal, ProposalState::Queued)?;
    let eta = proposal.eta.ok_or(GateError::MissingEta(proposal.id))?;
    if now < eta {
        return Err(GateError::TimelockNotElapsed {
            id: proposal.id,
            eta,
            now,
        });
    }
    Ok(())
}

/// Check if `proposal` may be executed at `now`
pub fn can_execute(proposal: &Proposal, now: DateTimeUtc) -> bool {
    validate_execute(proposal, now).is_ok()
}

/// Creating a proposal requires a voting power of at least the creation
/// threshold.
pub fn validate_create(
    voting_power: token::Amount,
    params: &GovernanceParameters,
) -> Result<(), GateError> {
    if voting_power.can_spend(&params.min_proposal_voting_power) {
        Ok(())
    } else {
        Err(GateError::InsufficientVotingPower {
            power: voting_power.to_string_native(),
            threshold: params.min_proposal_voting_power.to_string_native(),
        })
    }
}

/// Check if an account with `voting_power` may create a proposal
pub fn can_create(
    voting_power: token::Amount,
    params: &GovernanceParameters,
) -> bool {
    validate_create(voting_power, params).is_ok()
}

/// Check the content of a proposal to be created
pub fn validate_draft(
    draft: &ProposalDraft,
    params: &GovernanceParameters,
) -> Result<(), GateError> {
    if draft.title.trim().is_empty() {
        return Err(GateError::EmptyTitle);
    }
    let size = draft.content_size();
    if size > params.max_proposal_content_size {
        return Err(GateError::InvalidContentLength(
            size,
            params.max_proposal_content_size,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use quorum_core::address::testing::{
        established_address_1, established_address_2,
    };
    use quorum_core::time::DurationSecs;
    use quorum_core::token::testing::arb_non_zero_amount;

    use super::*;
    use crate::storage::proposal::testing::{arb_proposal_state, proposal};

    fn now() -> DateTimeUtc {
        DateTimeUtc::from_unix_timestamp(1_700_000_000).unwrap()
    }

    #[test]
    fn test_vote_denied_after_vote() {
        let account = established_address_1();
        let mut ledger = VoteLedger::new();
        ledger.record(account, 1);
        let proposal = proposal(1, ProposalState::Active);

        assert_matches!(
            validate_vote(
                &proposal,
                &account,
                token::Amount::native_whole(1_000_000),
                &ledger
            ),
            Err(GateError::AlreadyVoted { id: 1, .. })
        );
        // another account is unaffected
        assert!(can_vote(
            &proposal,
            &established_address_2(),
            token::Amount::from_u64(1),
            &ledger
        ));
    }

    #[test]
    fn test_vote_denied_without_voting_power() {
        let proposal = proposal(1, ProposalState::Active);
        assert_matches!(
            validate_vote(
                &proposal,
                &established_address_1(),
                token::Amount::zero(),
                &VoteLedger::new()
            ),
            Err(GateError::NoVotingPower)
        );
    }

    proptest! {
        #[test]
        fn test_vote_denied_outside_voting_window(
            state in arb_proposal_state(),
            voting_power in arb_non_zero_amount(),
        ) {
            let proposal = proposal(1, state);
            let allowed = can_vote(
                &proposal,
                &established_address_1(),
                voting_power,
                &VoteLedger::new(),
            );
            prop_assert_eq!(allowed, state == ProposalState::Active);
        }
    }

    #[test]
    fn test_queue_requires_succeeded_and_not_executed() {
        assert!(can_queue(&proposal(1, ProposalState::Succeeded)));
        assert_matches!(
            validate_queue(&proposal(1, ProposalState::Active)),
            Err(GateError::InvalidState {
                expected: ProposalState::Succeeded,
                actual: ProposalState::Active,
                ..
            })
        );

        let mut executed = proposal(2, ProposalState::Succeeded);
        executed.executed = true;
        assert_matches!(
            validate_queue(&executed),
            Err(GateError::AlreadyExecuted(2))
        );
    }

    #[test]
    fn test_execute_timelock() {
        let mut queued = proposal(1, ProposalState::Queued);
        assert_matches!(
            validate_execute(&queued, now()),
            Err(GateError::MissingEta(1))
        );

        queued.eta = Some(now() + DurationSecs(1000));
        assert_matches!(
            validate_execute(&queued, now()),
            Err(GateError::TimelockNotElapsed { id: 1, .. })
        );

        queued.eta = Some(now() - DurationSecs(1000));
        assert!(can_execute(&queued, now()));

        queued.eta = Some(now());
        assert!(can_execute(&queued, now()));

        let mut succeeded = proposal(2, ProposalState::Succeeded);
        succeeded.eta = Some(now() - DurationSecs(1000));
        assert!(!can_execute(&succeeded, now()));
    }

    #[test]
    fn test_create_threshold() {
        let params = GovernanceParameters::default();
        assert_matches!(
            validate_create(token::Amount::native_whole(50_000), &params),
            Err(GateError::InsufficientVotingPower { power, threshold })
                if power == "50000" && threshold == "100000"
        );
        assert!(can_create(token::Amount::native_whole(100_000), &params));
        assert!(!can_create(
            token::Amount::native_whole(100_000)
                .checked_sub(token::Amount::from_u64(1))
                .unwrap(),
            &params
        ));
    }

    #[test]
    fn test_draft_validation() {
        let params = GovernanceParameters {
            max_proposal_content_size: 16,
            ..Default::default()
        };
        let draft = ProposalDraft {
            title: "Fund".to_string(),
            description: "the grants".to_string(),
        };
        assert_eq!(validate_draft(&draft, &params), Ok(()));

        let empty = ProposalDraft {
            title: "  ".to_string(),
            ..draft.clone()
        };
        assert_eq!(validate_draft(&empty, &params), Err(GateError::EmptyTitle));

        let long = ProposalDraft {
            description: "the grants committee".to_string(),
            ..draft
        };
        assert_eq!(
            validate_draft(&long, &params),
            Err(GateError::InvalidContentLength(24, 16))
        );
    }
}
