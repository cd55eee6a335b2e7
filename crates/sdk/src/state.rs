//! The locally held governance state and the guard that keeps background
//! work from writing into a state it no longer belongs to.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use quorum_core::address::Address;
use quorum_core::chain::{BlockHeight, ChainId};
use quorum_core::token;
use quorum_governance::storage::vote::VoteLedger;
use quorum_governance::storage::ProposalStore;

/// Everything the engine knows about the chain's governance, as of the
/// last reads. Mutated only by reload responses and by the optimistic vote
/// record.
#[derive(Debug, Clone, Default)]
pub struct GovernanceState {
    /// Bumped whenever the session's account or chain changes
    pub generation: u64,
    /// The connected account
    pub account: Option<Address>,
    /// The chain of the session
    pub chain_id: Option<ChainId>,
    /// Proposals read from the chain
    pub store: ProposalStore,
    /// Known votes of the session's account
    pub ledger: VoteLedger,
    /// The account's voting power, as of the last read
    pub voting_power: token::Amount,
    /// The last known block height
    pub current_block: BlockHeight,
    /// The treasury balance, as of the last read
    pub treasury: token::Amount,
}

/// Shared handle to the governance state
pub type SharedState = Rc<RefCell<GovernanceState>>;

impl GovernanceState {
    /// Create an empty shared state
    pub fn shared() -> SharedState {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Adopt the session's account and chain. If either differs from the
    /// current ones, everything read so far is dropped and a new generation
    /// starts. Returns `true` if a new generation started.
    pub fn switch_session(
        &mut self,
        account: Option<Address>,
        chain_id: Option<ChainId>,
    ) -> bool {
        if self.account == account && self.chain_id == chain_id {
            return false;
        }
        let generation = self.generation.wrapping_add(1);
        tracing::debug!(
            generation,
            account = ?account,
            chain_id = ?chain_id,
            "Governance session changed, starting a new generation"
        );
        *self = Self {
            generation,
            account,
            chain_id,
            ..Self::default()
        };
        true
    }
}

/// A weak reference to the state, valid only for the generation it was
/// taken in.
#[derive(Debug, Clone)]
pub struct StateGuard {
    state: Weak<RefCell<GovernanceState>>,
    generation: u64,
}

impl StateGuard {
    /// Guard the current generation of `state`
    pub fn new(state: &SharedState) -> Self {
        Self {
            state: Rc::downgrade(state),
            generation: state.borrow().generation,
        }
    }

    /// The guarded generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Check if the state is still alive and in the guarded generation
    pub fn is_current(&self) -> bool {
        match self.state.upgrade() {
            Some(state) => {
                let generation = state.borrow().generation;
                generation == self.generation
            }
            None => false,
        }
    }

    /// Apply `update` to the state if it is still alive and in the guarded
    /// generation, otherwise discard it.
    pub fn apply<F, R>(&self, update: F) -> Option<R>
    where
        F: FnOnce(&mut GovernanceState) -> R,
    {
        let Some(state) = self.state.upgrade() else {
            tracing::debug!(
                generation = self.generation,
                "Governance state is gone, discarding update"
            );
            return None;
        };
        let mut state = state.borrow_mut();
        if state.generation != self.generation {
            tracing::debug!(
                guarded = self.generation,
                current = state.generation,
                "Discarding update to a stale governance state"
            );
            return None;
        }
        Some(update(&mut state))
    }
}
