//! The chain collaborator: read-only governance queries.

use quorum_core::address::Address;
use quorum_core::chain::BlockHeight;
use quorum_core::token;
use quorum_governance::storage::proposal::{Proposal, ProposalId};
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// A page of proposals, as returned by the chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalsPage {
    /// The proposals of the requested page
    pub proposals: Vec<Proposal>,
    /// The total number of proposals on chain
    pub total: u64,
}

/// A client of the governance contracts. The chain is the system of record;
/// everything the engine knows about proposals comes through here.
#[async_trait::async_trait(?Send)]
pub trait GovernanceClient {
    /// Read a page of proposals. Pages are zero-based.
    async fn get_proposals(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<ProposalsPage, QueryError>;

    /// Read a single proposal. `Ok(None)` if it does not exist.
    async fn get_proposal(
        &self,
        id: ProposalId,
    ) -> Result<Option<Proposal>, QueryError>;

    /// Read the current voting power of `account`
    async fn get_user_voting_power(
        &self,
        account: &Address,
    ) -> Result<token::Amount, QueryError>;

    /// Check if `account` has voted on proposal `id`
    async fn has_voted(
        &self,
        account: &Address,
        id: ProposalId,
    ) -> Result<bool, QueryError>;

    /// The latest block height. May be approximate.
    async fn current_block(&self) -> Result<BlockHeight, QueryError>;

    /// The balance of the governance treasury
    async fn treasury_balance(&self) -> Result<token::Amount, QueryError>;
}
