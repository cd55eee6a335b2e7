use std::collections::BTreeSet;
use std::fmt::Display;

use quorum_core::address::Address;
use serde::{Deserialize, Serialize};

use super::proposal::ProposalId;

/// The side of a vote, numbered the way the governor contract's
/// `castVoteWithReason` expects its `support` argument.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProposalVote {
    /// Against
    Against,
    /// For
    For,
    /// Abstain
    Abstain,
}

impl ProposalVote {
    /// The `support` argument of the vote call
    pub fn support(&self) -> u8 {
        match self {
            ProposalVote::Against => 0,
            ProposalVote::For => 1,
            ProposalVote::Abstain => 2,
        }
    }
}

impl Display for ProposalVote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProposalVote::For => write!(f, "for"),
            ProposalVote::Against => write!(f, "against"),
            ProposalVote::Abstain => write!(f, "abstain"),
        }
    }
}

impl TryFrom<u8> for ProposalVote {
    type Error = String;

    fn try_from(support: u8) -> Result<Self, Self::Error> {
        match support {
            0 => Ok(ProposalVote::Against),
            1 => Ok(ProposalVote::For),
            2 => Ok(ProposalVote::Abstain),
            _ => Err(format!("invalid vote support {support}")),
        }
    }
}

impl TryFrom<String> for ProposalVote {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "for" | "yay" => Ok(ProposalVote::For),
            "against" | "nay" => Ok(ProposalVote::Against),
            "abstain" => Ok(ProposalVote::Abstain),
            _ => Err("invalid vote".to_string()),
        }
    }
}

/// Which accounts are known to have voted on which proposals.
///
/// Entries are only ever added: once an account is known to have voted on a
/// proposal, the ledger keeps saying so until it is dropped as a whole
/// (which happens when the session switches account or chain).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteLedger {
    entries: BTreeSet<(ProposalId, Address)>,
}

impl VoteLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if `account` is known to have voted on `proposal_id`
    pub fn has_voted(&self, account: &Address, proposal_id: ProposalId) -> bool {
        self.entries.contains(&(proposal_id, *account))
    }

    /// Record that `account` has voted on `proposal_id`. Returns `true` if
    /// the entry is new.
    pub fn record(&mut self, account: Address, proposal_id: ProposalId) -> bool {
        let inserted = self.entries.insert((proposal_id, account));
        if inserted {
            tracing::debug!(%account, proposal_id, "Recorded vote");
        }
        inserted
    }

    /// Apply the answer of a `hasVoted` query. A negative answer never
    /// removes an existing entry.
    pub fn reconcile(
        &mut self,
        account: Address,
        proposal_id: ProposalId,
        has_voted: bool,
    ) {
        if has_voted {
            self.record(account, proposal_id);
        } else if self.has_voted(&account, proposal_id) {
            tracing::debug!(
                %account,
                proposal_id,
                "Chain does not report the vote yet, keeping the local entry"
            );
        }
    }

    /// The number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the ledger has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(any(test, feature = "testing"))]
/// Testing helpers and strategies for governance votes
pub mod testing {
    use proptest::prelude::*;

    use super::*;

    /// Generate an arbitrary proposal vote
    pub fn arb_proposal_vote() -> impl Strategy<Value = ProposalVote> {
        prop_oneof![
            Just(ProposalVote::For),
            Just(ProposalVote::Against),
            Just(ProposalVote::Abstain),
        ]
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;
    use quorum_core::address::testing::{
        established_address_1, established_address_2,
    };

    use super::*;

    #[test]
    fn test_ledger_is_keyed_by_account_and_proposal() {
        let mut ledger = VoteLedger::new();
        let alice = established_address_1();
        let bob = established_address_2();

        assert!(ledger.record(alice, 1));
        assert!(!ledger.record(alice, 1));
        assert!(ledger.has_voted(&alice, 1));
        assert!(!ledger.has_voted(&alice, 2));
        assert!(!ledger.has_voted(&bob, 1));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_negative_reconcile_keeps_entry() {
        let mut ledger = VoteLedger::new();
        let alice = established_address_1();

        ledger.record(alice, 7);
        ledger.reconcile(alice, 7, false);
        assert!(ledger.has_voted(&alice, 7));

        ledger.reconcile(alice, 8, false);
        assert!(!ledger.has_voted(&alice, 8));
        ledger.reconcile(alice, 8, true);
        assert!(ledger.has_voted(&alice, 8));
    }

    #[test]
    fn test_vote_parsing() {
        assert_eq!(
            ProposalVote::try_from("  For ".to_string()),
            Ok(ProposalVote::For)
        );
        assert_eq!(
            ProposalVote::try_from("nay".to_string()),
            Ok(ProposalVote::Against)
        );
        assert!(ProposalVote::try_from("maybe".to_string()).is_err());
        assert!(ProposalVote::try_from(3u8).is_err());
    }

    proptest! {
        #[test]
        fn test_support_code_is_stable(vote in testing::arb_proposal_vote()) {
            prop_assert_eq!(ProposalVote::try_from(vote.support()), Ok(vote));
        }
    }
}
