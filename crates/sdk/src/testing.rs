//! In-memory collaborators for tests: a scripted chain, a wallet session
//! that can switch accounts and chains, and a transaction submitter whose
//! transactions settle on demand.

use std::cell::{Cell, RefCell, RefMut};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use quorum_core::address::Address;
use quorum_core::chain::{BlockHeight, ChainId};
use quorum_core::token;
use quorum_governance::storage::proposal::{Proposal, ProposalId};

use crate::error::{QueryError, SubmitError};
use crate::queries::{GovernanceClient, ProposalsPage};
use crate::tx::{
    CallDescriptor, Settlement, Settler, TxHandle, TxOpts, TxSubmitter,
};
use crate::wallet::{ListenerId, Session, SessionEvent, SessionListener};

/// The queries of [`GovernanceClient`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FakeQuery {
    #[allow(missing_docs)]
    Proposals,
    #[allow(missing_docs)]
    Proposal,
    #[allow(missing_docs)]
    VotingPower,
    #[allow(missing_docs)]
    HasVoted,
    #[allow(missing_docs)]
    CurrentBlock,
    #[allow(missing_docs)]
    Treasury,
}

/// The chain data served by [`FakeGovernanceClient`]
#[derive(Debug, Clone, Default)]
pub struct FakeChain {
    /// Proposals by id
    pub proposals: BTreeMap<ProposalId, Proposal>,
    /// Voting power by account. Unknown accounts have none.
    pub voting_power: BTreeMap<Address, token::Amount>,
    /// Recorded votes
    pub votes: BTreeSet<(ProposalId, Address)>,
    /// The latest block
    pub current_block: BlockHeight,
    /// Treasury balance
    pub treasury: token::Amount,
}

/// A [`GovernanceClient`] over in-memory chain data. Any query can be made
/// to fail until it is recovered.
#[derive(Debug, Default)]
pub struct FakeGovernanceClient {
    chain: RefCell<FakeChain>,
    failing: RefCell<BTreeSet<FakeQuery>>,
    calls: RefCell<BTreeMap<FakeQuery, usize>>,
}

impl FakeGovernanceClient {
    /// A client serving `chain`
    pub fn new(chain: FakeChain) -> Self {
        Self {
            chain: RefCell::new(chain),
            ..Self::default()
        }
    }

    /// Mutable access to the served chain data
    pub fn chain_mut(&self) -> RefMut<'_, FakeChain> {
        self.chain.borrow_mut()
    }

    /// Make `query` fail until recovered
    pub fn fail(&self, query: FakeQuery) {
        self.failing.borrow_mut().insert(query);
    }

    /// Make every query fail until recovered
    pub fn fail_all(&self) {
        for query in [
            FakeQuery::Proposals,
            FakeQuery::Proposal,
            FakeQuery::VotingPower,
            FakeQuery::HasVoted,
            FakeQuery::CurrentBlock,
            FakeQuery::Treasury,
        ] {
            self.fail(query);
        }
    }

    /// Make `query` succeed again
    pub fn recover(&self, query: FakeQuery) {
        self.failing.borrow_mut().remove(&query);
    }

    /// The number of times `query` was made
    pub fn calls(&self, query: FakeQuery) -> usize {
        self.calls.borrow().get(&query).copied().unwrap_or_default()
    }

    fn query(&self, query: FakeQuery) -> Result<(), QueryError> {
        let mut calls = self.calls.borrow_mut();
        let count = calls.entry(query).or_default();
        *count = count.saturating_add(1);
        if self.failing.borrow().contains(&query) {
            Err(QueryError::NoResponse(format!("{query:?} is unavailable")))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait(?Send)]
impl GovernanceClient for FakeGovernanceClient {
    async fn get_proposals(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<ProposalsPage, QueryError> {
        self.query(FakeQuery::Proposals)?;
        let chain = self.chain.borrow();
        let skip = usize::try_from(page.saturating_mul(page_size))
            .unwrap_or(usize::MAX);
        let take = usize::try_from(page_size).unwrap_or(usize::MAX);
        Ok(ProposalsPage {
            proposals: chain
                .proposals
                .values()
                .skip(skip)
                .take(take)
                .cloned()
                .collect(),
            total: chain.proposals.len() as u64,
        })
    }

    async fn get_proposal(
        &self,
        id: ProposalId,
    ) -> Result<Option<Proposal>, QueryError> {
        self.query(FakeQuery::Proposal)?;
        Ok(self.chain.borrow().proposals.get(&id).cloned())
    }

    async fn get_user_voting_power(
        &self,
        account: &Address,
    ) -> Result<token::Amount, QueryError> {
        self.query(FakeQuery::VotingPower)?;
        Ok(self
            .chain
            .borrow()
            .voting_power
            .get(account)
            .copied()
            .unwrap_or_default())
    }

    async fn has_voted(
        &self,
        account: &Address,
        id: ProposalId,
    ) -> Result<bool, QueryError> {
        self.query(FakeQuery::HasVoted)?;
        Ok(self.chain.borrow().votes.contains(&(id, *account)))
    }

    async fn current_block(&self) -> Result<BlockHeight, QueryError> {
        self.query(FakeQuery::CurrentBlock)?;
        Ok(self.chain.borrow().current_block)
    }

    async fn treasury_balance(&self) -> Result<token::Amount, QueryError> {
        self.query(FakeQuery::Treasury)?;
        Ok(self.chain.borrow().treasury)
    }
}

/// A wallet session driven by the test
#[derive(Default)]
pub struct FakeSession {
    connected: Cell<bool>,
    account: Cell<Option<Address>>,
    chain_id: Cell<Option<ChainId>>,
    listeners: RefCell<BTreeMap<ListenerId, Rc<dyn Fn(SessionEvent)>>>,
    next_listener: Cell<u64>,
}

impl FakeSession {
    /// A session connected with `account` on `chain_id`
    pub fn connected(account: Address, chain_id: ChainId) -> Self {
        let session = Self::default();
        session.connected.set(true);
        session.account.set(Some(account));
        session.chain_id.set(Some(chain_id));
        session
    }

    /// A session without a wallet
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Switch to another account and notify the listeners
    pub fn switch_account(&self, account: Address) {
        self.connected.set(true);
        self.account.set(Some(account));
        self.emit(SessionEvent::AccountChanged(Some(account)));
    }

    /// Switch to another chain and notify the listeners
    pub fn switch_chain(&self, chain_id: ChainId) {
        self.chain_id.set(Some(chain_id));
        self.emit(SessionEvent::ChainChanged(chain_id));
    }

    /// Disconnect the wallet and notify the listeners
    pub fn disconnect(&self) {
        self.connected.set(false);
        self.account.set(None);
        self.emit(SessionEvent::AccountChanged(None));
    }

    /// The number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn emit(&self, event: SessionEvent) {
        let listeners: Vec<_> =
            self.listeners.borrow().values().cloned().collect();
        for listener in listeners {
            listener(event);
        }
    }
}

impl Session for FakeSession {
    fn is_connected(&self) -> bool {
        self.connected.get()
    }

    fn account(&self) -> Option<Address> {
        self.account.get()
    }

    fn current_chain_id(&self) -> Option<ChainId> {
        self.chain_id.get()
    }

    fn subscribe(&self, listener: SessionListener) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0.saturating_add(1));
        self.listeners.borrow_mut().insert(id, Rc::from(listener));
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.listeners.borrow_mut().remove(&id);
    }
}

impl fmt::Debug for FakeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeSession")
            .field("connected", &self.connected.get())
            .field("account", &self.account.get())
            .field("chain_id", &self.chain_id.get())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// A [`TxSubmitter`] that records submissions. Submitted transactions stay
/// pending until settled by the test.
#[derive(Debug, Default)]
pub struct FakeTxSubmitter {
    attempts: Cell<usize>,
    submissions: RefCell<Vec<(CallDescriptor, TxOpts)>>,
    settlers: RefCell<Vec<Settler>>,
    reject: RefCell<Option<SubmitError>>,
}

impl FakeTxSubmitter {
    /// Fail the next submission with `err`
    pub fn reject_next(&self, err: SubmitError) {
        *self.reject.borrow_mut() = Some(err);
    }

    /// The number of calls to `execute_transaction`, successful or not
    pub fn attempts(&self) -> usize {
        self.attempts.get()
    }

    /// The successful submissions, in order
    pub fn submissions(&self) -> Vec<(CallDescriptor, TxOpts)> {
        self.submissions.borrow().clone()
    }

    /// Settle every pending transaction
    pub fn settle_all(&self, settlement: Settlement) {
        for settler in self.settlers.borrow_mut().drain(..) {
            settler.settle(settlement.clone());
        }
    }
}

#[async_trait::async_trait(?Send)]
impl TxSubmitter for FakeTxSubmitter {
    async fn execute_transaction(
        &self,
        call: CallDescriptor,
        opts: TxOpts,
    ) -> Result<TxHandle, SubmitError> {
        self.attempts.set(self.attempts.get().saturating_add(1));
        if let Some(err) = self.reject.borrow_mut().take() {
            return Err(err);
        }
        let mut submissions = self.submissions.borrow_mut();
        let hash = format!("0x{:064x}", submissions.len());
        submissions.push((call, opts));
        let (handle, settler) = TxHandle::pending(hash);
        self.settlers.borrow_mut().push(settler);
        Ok(handle)
    }
}
