//! Governance storage: the local mirror of the proposals read from chain.

/// Proposal structures
pub mod proposal;
/// Vote structures
pub mod vote;

use std::collections::BTreeMap;

use self::proposal::{Proposal, ProposalId};

/// The position of the last page loaded from the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    /// Zero-based page index
    pub page: u64,
    /// Number of proposals per page
    pub page_size: u64,
}

/// The set of proposals known locally, keyed by id.
///
/// The store only mirrors what the chain reported; it never invents state
/// transitions and never deletes proposals.
#[derive(Debug, Clone, Default)]
pub struct ProposalStore {
    proposals: BTreeMap<ProposalId, Proposal>,
    total: u64,
    cursor: Option<PageCursor>,
}

impl ProposalStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a proposal by id
    pub fn get(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    /// Iterate over the proposals in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &Proposal> + Clone {
        self.proposals.values()
    }

    /// The number of proposals held locally
    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    /// Check if no proposal is held locally
    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// The total number of proposals on chain, as of the last page load
    pub fn total(&self) -> u64 {
        self.total
    }

    /// The last page loaded, if any
    pub fn cursor(&self) -> Option<PageCursor> {
        self.cursor
    }

    /// Insert or replace a proposal with the chain's view of it
    pub fn upsert(&mut self, proposal: Proposal) {
        if let Some(known) = self.proposals.get(&proposal.id) {
            if !known.state.can_transition_to(proposal.state) {
                tracing::warn!(
                    proposal_id = proposal.id,
                    from = %known.state,
                    to = %proposal.state,
                    "Chain reported an unexpected proposal state transition"
                );
            }
        }
        self.proposals.insert(proposal.id, proposal);
    }

    /// Apply the response of a page read
    pub fn apply_page(
        &mut self,
        cursor: PageCursor,
        proposals: Vec<Proposal>,
        total: u64,
    ) {
        tracing::debug!(
            page = cursor.page,
            page_size = cursor.page_size,
            count = proposals.len(),
            total,
            "Applying proposals page"
        );
        for proposal in proposals {
            self.upsert(proposal);
        }
        self.total = total;
        self.cursor = Some(cursor);
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::proposal::testing::proposal;
    use super::proposal::ProposalState;
    use super::*;

    #[test]
    fn test_page_upserts_without_deleting() {
        let mut store = ProposalStore::new();
        let cursor = PageCursor {
            page: 0,
            page_size: 2,
        };
        store.apply_page(
            cursor,
            vec![
                proposal(1, ProposalState::Active),
                proposal(2, ProposalState::Pending),
            ],
            3,
        );
        store.apply_page(
            PageCursor { page: 1, ..cursor },
            vec![proposal(3, ProposalState::Executed)],
            3,
        );

        assert_eq!(store.len(), 3);
        assert_eq!(store.total(), 3);
        assert_eq!(store.cursor(), Some(PageCursor { page: 1, ..cursor }));
        let ids: Vec<_> = store.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_upsert_takes_chain_state_even_when_unexpected() {
        let mut store = ProposalStore::new();
        store.upsert(proposal(1, ProposalState::Queued));
        store.upsert(proposal(1, ProposalState::Active));
        assert_eq!(store.get(1).unwrap().state, ProposalState::Active);
        assert!(store.get(2).is_none());
    }
}
