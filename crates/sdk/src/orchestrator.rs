//! Governance actions: gate, submit, optimistically record, reconcile.
//!
//! An action is first checked against the state held right now. Only if the
//! gate accepts it is it handed to the transaction submitter. A submitted
//! vote is recorded in the vote ledger at once, so that no second vote is
//! offered while the first one is pending. Once the transaction settles,
//! whatever the outcome, the affected data is read again from the chain.
//! A failed reconciliation read never reverts the recorded vote.

use std::rc::Rc;

use quorum_core::address::Address;
use quorum_governance::storage::proposal::{
    Proposal, ProposalDraft, ProposalId,
};
use quorum_governance::storage::vote::ProposalVote;
use quorum_governance::storage::{PageCursor, ProposalStore};
use quorum_governance::validation::{self, GateError};

use crate::context::GovernanceContext;
use crate::error::ActionError;
use crate::queries::GovernanceClient;
use crate::rpc;
use crate::state::StateGuard;
use crate::task_env::TaskSpawner;
pub use crate::tx::ActionKind;
use crate::tx::{
    CallDescriptor, SettlementFuture, TxHandle, TxOpts, TxSubmitter,
};
use crate::wallet::Session;

/// A governance action with its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Create a proposal
    Create(ProposalDraft),
    /// Vote on a proposal
    Vote {
        /// The proposal
        proposal_id: ProposalId,
        /// The side of the vote
        support: ProposalVote,
        /// Free text reason, may be empty
        reason: String,
    },
    /// Queue a succeeded proposal
    Queue(ProposalId),
    /// Execute a queued proposal
    Execute(ProposalId),
}

impl Action {
    /// The kind of the action
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Create(_) => ActionKind::Create,
            Action::Vote { .. } => ActionKind::Vote,
            Action::Queue(_) => ActionKind::Queue,
            Action::Execute(_) => ActionKind::Execute,
        }
    }

    /// The proposal acted on. `None` for a creation.
    pub fn proposal_id(&self) -> Option<ProposalId> {
        match self {
            Action::Create(_) => None,
            Action::Vote { proposal_id, .. } => Some(*proposal_id),
            Action::Queue(id) | Action::Execute(id) => Some(*id),
        }
    }

    /// The contract call performing the action
    pub fn call_descriptor(&self) -> CallDescriptor {
        match self {
            Action::Create(draft) => CallDescriptor::propose(draft),
            Action::Vote {
                proposal_id,
                support,
                reason,
            } => CallDescriptor::CastVoteWithReason {
                proposal_id: *proposal_id,
                support: *support,
                reason: reason.clone(),
            },
            Action::Queue(proposal_id) => CallDescriptor::Queue {
                proposal_id: *proposal_id,
            },
            Action::Execute(proposal_id) => CallDescriptor::Execute {
                proposal_id: *proposal_id,
            },
        }
    }
}

fn known_proposal(
    store: &ProposalStore,
    id: ProposalId,
) -> Result<&Proposal, GateError> {
    store.get(id).ok_or(GateError::UnknownProposal(id))
}

impl<C, S, T, Sp> GovernanceContext<C, S, T, Sp>
where
    C: GovernanceClient + 'static,
    S: Session + 'static,
    T: TxSubmitter,
    Sp: TaskSpawner + Clone + 'static,
{
    /// Check `action` against the current local state
    pub fn check_action(&self, action: &Action) -> Result<(), GateError> {
        let state = self.state.borrow();
        match action {
            Action::Create(draft) => {
                if state.account.is_none() {
                    return Err(GateError::NotConnected);
                }
                validation::validate_create(state.voting_power, &self.params)?;
                validation::validate_draft(draft, &self.params)
            }
            Action::Vote { proposal_id, .. } => {
                let account = state.account.ok_or(GateError::NotConnected)?;
                validation::validate_vote(
                    known_proposal(&state.store, *proposal_id)?,
                    &account,
                    state.voting_power,
                    &state.ledger,
                )
            }
            Action::Queue(id) => {
                validation::validate_queue(known_proposal(&state.store, *id)?)
            }
            Action::Execute(id) => validation::validate_execute(
                known_proposal(&state.store, *id)?,
                self.clock.now(),
            ),
        }
    }

    /// Perform a governance action.
    ///
    /// Returns as soon as the transaction is submitted. Reconciliation with
    /// the chain runs in the background once the returned handle settles.
    pub async fn perform_action(
        &self,
        action: Action,
    ) -> Result<TxHandle, ActionError> {
        let kind = action.kind();
        if let Err(err) = self.check_action(&action) {
            tracing::info!(%kind, error = %err, "Governance action rejected");
            return Err(err.into());
        }
        let guard = StateGuard::new(&self.state);
        let account = self.state.borrow().account;
        let cursor = self.current_cursor();

        let call = action.call_descriptor();
        let opts = TxOpts::for_action(kind);
        tracing::info!(
            %kind,
            method = call.method(),
            priority = ?opts.priority,
            gas_strategy = ?opts.gas_strategy,
            "Submitting governance action"
        );
        let handle = match self.submitter.execute_transaction(call, opts).await
        {
            Ok(handle) => handle,
            Err(err) => {
                tracing::warn!(
                    %kind,
                    error = %err,
                    "Governance action submission failed"
                );
                return Err(err.into());
            }
        };
        tracing::info!(%kind, hash = %handle.hash, "Governance action submitted");

        if let (Action::Vote { proposal_id, .. }, Some(account)) =
            (&action, account)
        {
            guard.apply(|state| state.ledger.record(account, *proposal_id));
        }

        self.spawner.spawn_async(reconcile_action(
            Rc::clone(&self.client),
            guard,
            action,
            account,
            handle.settlement(),
            cursor,
        ));
        Ok(handle)
    }
}

/// Wait for `settlement`, then read the data touched by `action` again
async fn reconcile_action<C>(
    client: Rc<C>,
    guard: StateGuard,
    action: Action,
    account: Option<Address>,
    settlement: SettlementFuture,
    cursor: PageCursor,
) where
    C: GovernanceClient + ?Sized,
{
    let kind = action.kind();
    let settlement = settlement.await;
    tracing::debug!(%kind, %settlement, "Governance action settled");

    let client = client.as_ref();
    let results = match action {
        Action::Create(_) => {
            vec![rpc::reload_page(client, &guard, cursor).await]
        }
        Action::Vote { proposal_id, .. } => {
            let mut results =
                vec![rpc::reload_proposal(client, &guard, proposal_id).await];
            if let Some(account) = account {
                results.push(
                    rpc::reload_voting_power(client, &guard, &account).await,
                );
                results.push(
                    rpc::reload_vote(client, &guard, account, proposal_id)
                        .await,
                );
            }
            results
        }
        Action::Queue(id) | Action::Execute(id) => {
            vec![rpc::reload_proposal(client, &guard, id).await]
        }
    };
    for err in results.into_iter().filter_map(Result::err) {
        tracing::warn!(
            %kind,
            error = %err,
            "Reconciliation read failed, keeping the local state"
        );
    }
}
