//! Filtering and ordering of proposals for presentation.

use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::storage::proposal::{Proposal, ProposalState};
use crate::storage::ProposalStore;

/// Which proposals to show
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProposalFilter {
    /// Every proposal
    #[default]
    All,
    /// Proposals open for voting
    Active,
    /// Proposals that passed and await queueing
    Succeeded,
    /// Executed proposals
    Executed,
    /// Defeated or canceled proposals
    Failed,
}

impl ProposalFilter {
    /// Check if a proposal in `state` is shown by this filter
    pub fn matches(&self, state: ProposalState) -> bool {
        match self {
            ProposalFilter::All => true,
            ProposalFilter::Active => state == ProposalState::Active,
            ProposalFilter::Succeeded => state == ProposalState::Succeeded,
            ProposalFilter::Executed => state == ProposalState::Executed,
            ProposalFilter::Failed => state.is_failed(),
        }
    }
}

/// The order in which proposals are shown. Every order breaks ties by
/// ascending id.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum ProposalSort {
    /// Latest voting start first
    #[default]
    Newest,
    /// Earliest voting start first
    Oldest,
    /// Most decisive votes first
    MostVotes,
    /// Voting window closing soonest first
    Ending,
}

impl ProposalSort {
    /// Compare two proposals, as a total order
    pub fn compare(&self, a: &Proposal, b: &Proposal) -> Ordering {
        let primary = match self {
            ProposalSort::Newest => b.start_block.cmp(&a.start_block),
            ProposalSort::Oldest => a.start_block.cmp(&b.start_block),
            ProposalSort::MostVotes => {
                b.decisive_votes().cmp(&a.decisive_votes())
            }
            ProposalSort::Ending => a.end_block.cmp(&b.end_block),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

impl Display for ProposalFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProposalFilter::All => write!(f, "all"),
            ProposalFilter::Active => write!(f, "active"),
            ProposalFilter::Succeeded => write!(f, "succeeded"),
            ProposalFilter::Executed => write!(f, "executed"),
            ProposalFilter::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for ProposalFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(ProposalFilter::All),
            "active" => Ok(ProposalFilter::Active),
            "succeeded" => Ok(ProposalFilter::Succeeded),
            "executed" => Ok(ProposalFilter::Executed),
            "failed" => Ok(ProposalFilter::Failed),
            other => Err(format!("Unknown proposal filter {other:?}")),
        }
    }
}

impl Display for ProposalSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProposalSort::Newest => write!(f, "newest"),
            ProposalSort::Oldest => write!(f, "oldest"),
            ProposalSort::MostVotes => write!(f, "mostVotes"),
            ProposalSort::Ending => write!(f, "ending"),
        }
    }
}

impl FromStr for ProposalSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newest" => Ok(ProposalSort::Newest),
            "oldest" => Ok(ProposalSort::Oldest),
            "mostvotes" | "most-votes" => Ok(ProposalSort::MostVotes),
            "ending" => Ok(ProposalSort::Ending),
            other => Err(format!("Unknown proposal sort {other:?}")),
        }
    }
}

/// Filter then sort the proposals of `store`. The same filter and sort over
/// the same store always yields the same sequence.
pub fn list_proposals(
    store: &ProposalStore,
    filter: ProposalFilter,
    sort: ProposalSort,
) -> impl Iterator<Item = &Proposal> {
    store
        .iter()
        .filter(move |proposal| filter.matches(proposal.state))
        .sorted_by(move |a, b| sort.compare(a, b))
}
