//! Reads from the chain collaborator into the local state.
//!
//! A failed read never aborts the others: load cycle failures are logged and
//! replaced by neutral defaults, reconciliation failures are logged and leave
//! the local state as it was.

use std::cell::RefCell;
use std::rc::Weak;

use quorum_core::address::Address;
use quorum_core::token;
use quorum_governance::storage::proposal::ProposalId;
use quorum_governance::storage::PageCursor;

use crate::error::{Error, QueryError};
use crate::queries::GovernanceClient;
use crate::state::{GovernanceState, StateGuard};
use crate::wallet::Session;

/// The outcome of a load cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// The session's account or chain changed and the state was reset
    pub new_generation: bool,
    /// The state was dropped or replaced while loading, some or all of the
    /// responses were discarded
    pub stale: bool,
    /// Reads that failed and were replaced by defaults
    pub failures: Vec<Error>,
}

impl LoadReport {
    fn stale() -> Self {
        Self {
            stale: true,
            ..Self::default()
        }
    }

    /// Check if every read succeeded and was applied
    pub fn is_complete(&self) -> bool {
        !self.stale && self.failures.is_empty()
    }
}

/// Turn a failed load cycle read into `None`, keeping track of the failure
fn absorb<T>(
    query: &'static str,
    response: Result<T, QueryError>,
    failures: &mut Vec<Error>,
) -> Option<T> {
    match response {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                query,
                error = %err,
                "Governance read failed, continuing with a default"
            );
            failures.push(Error::DataUnavailable(err));
            None
        }
    }
}

/// Run a load cycle: read the wallet session, then the requested page of
/// proposals, the account's voting power and votes on that page, the
/// current block and the treasury balance.
///
/// A session with another account or chain than the state's starts a new
/// generation first. Responses are applied only to the generation the
/// cycle started in.
pub async fn load_governance<C, S>(
    client: &C,
    session: &S,
    state: &Weak<RefCell<GovernanceState>>,
    cursor: PageCursor,
) -> LoadReport
where
    C: GovernanceClient + ?Sized,
    S: Session + ?Sized,
{
    let account = if session.is_connected() {
        session.account()
    } else {
        None
    };
    let chain_id = session.current_chain_id();

    let Some(shared) = state.upgrade() else {
        tracing::debug!("Governance state is gone, skipping the load");
        return LoadReport::stale();
    };
    let new_generation =
        shared.borrow_mut().switch_session(account, chain_id);
    let guard = StateGuard::new(&shared);
    drop(shared);

    tracing::debug!(
        generation = guard.generation(),
        page = cursor.page,
        page_size = cursor.page_size,
        connected = account.is_some(),
        "Loading governance data"
    );

    let voting_power = async {
        match account.as_ref() {
            Some(account) => client.get_user_voting_power(account).await,
            None => Ok(token::Amount::zero()),
        }
    };
    let (page, voting_power, current_block, treasury) = futures::join!(
        client.get_proposals(cursor.page, cursor.page_size),
        voting_power,
        client.current_block(),
        client.treasury_balance(),
    );

    let mut failures = vec![];
    if let Some(page) = absorb("proposals", page, &mut failures) {
        let ids: Vec<ProposalId> =
            page.proposals.iter().map(|proposal| proposal.id).collect();
        guard.apply(|state| {
            state.store.apply_page(cursor, page.proposals, page.total)
        });
        if let Some(account) = account {
            let votes = futures::future::join_all(
                ids.iter().map(|id| client.has_voted(&account, *id)),
            )
            .await;
            for (id, voted) in ids.into_iter().zip(votes) {
                if let Some(voted) = absorb("has_voted", voted, &mut failures)
                {
                    guard.apply(|state| {
                        state.ledger.reconcile(account, id, voted)
                    });
                }
            }
        }
    }

    let voting_power = absorb("voting_power", voting_power, &mut failures)
        .unwrap_or_default();
    guard.apply(|state| state.voting_power = voting_power);

    if let Some(block) =
        absorb("current_block", current_block, &mut failures)
    {
        guard.apply(|state| state.current_block = block);
    }

    let treasury =
        absorb("treasury", treasury, &mut failures).unwrap_or_default();
    guard.apply(|state| state.treasury = treasury);

    let stale = !guard.is_current();
    tracing::debug!(
        generation = guard.generation(),
        failures = failures.len(),
        stale,
        "Finished loading governance data"
    );
    LoadReport {
        new_generation,
        stale,
        failures,
    }
}

/// Reload a single proposal
pub async fn reload_proposal<C>(
    client: &C,
    guard: &StateGuard,
    id: ProposalId,
) -> Result<(), Error>
where
    C: GovernanceClient + ?Sized,
{
    let proposal = client
        .get_proposal(id)
        .await
        .map_err(Error::ReloadFailed)?
        .ok_or_else(|| {
            Error::ReloadFailed(QueryError::NotFound(format!("proposal {id}")))
        })?;
    guard.apply(|state| state.store.upsert(proposal));
    Ok(())
}

/// Reload the voting power of `account`
pub async fn reload_voting_power<C>(
    client: &C,
    guard: &StateGuard,
    account: &Address,
) -> Result<(), Error>
where
    C: GovernanceClient + ?Sized,
{
    let voting_power = client
        .get_user_voting_power(account)
        .await
        .map_err(Error::ReloadFailed)?;
    guard.apply(|state| state.voting_power = voting_power);
    Ok(())
}

/// Reload whether `account` voted on proposal `id`. A negative answer does
/// not remove a vote already recorded locally.
pub async fn reload_vote<C>(
    client: &C,
    guard: &StateGuard,
    account: Address,
    id: ProposalId,
) -> Result<(), Error>
where
    C: GovernanceClient + ?Sized,
{
    let voted = client
        .has_voted(&account, id)
        .await
        .map_err(Error::ReloadFailed)?;
    guard.apply(|state| state.ledger.reconcile(account, id, voted));
    Ok(())
}

/// Reload a page of proposals
pub async fn reload_page<C>(
    client: &C,
    guard: &StateGuard,
    cursor: PageCursor,
) -> Result<(), Error>
where
    C: GovernanceClient + ?Sized,
{
    let page = client
        .get_proposals(cursor.page, cursor.page_size)
        .await
        .map_err(Error::ReloadFailed)?;
    guard.apply(|state| {
        state.store.apply_page(cursor, page.proposals, page.total)
    });
    Ok(())
}
