//! The governance context: the collaborators, the shared state and the
//! queries the presentation layer asks of them.

use std::cell::Ref;
use std::rc::Rc;

use quorum_core::chain::BlockHeight;
use quorum_core::time::{Clock, SystemClock};
use quorum_core::token;
use quorum_governance::parameters::GovernanceParameters;
use quorum_governance::storage::proposal::{
    Proposal, ProposalId, ProposalState,
};
use quorum_governance::storage::PageCursor;
use quorum_governance::utils::{self, ProposalResult, TimeRemaining};
use quorum_governance::validation;
use quorum_governance::view::{self, ProposalFilter, ProposalSort};

use crate::queries::GovernanceClient;
use crate::rpc::{self, LoadReport};
use crate::state::{GovernanceState, SharedState};
use crate::task_env::TaskSpawner;
use crate::tx::TxSubmitter;
use crate::wallet::{Session, Subscription};

/// Holds the injected collaborators and the local governance state of one
/// mounted view. Dropping the context discards the results of any reload
/// still in flight.
pub struct GovernanceContext<C, S, T, Sp> {
    pub(crate) client: Rc<C>,
    pub(crate) session: Rc<S>,
    pub(crate) submitter: T,
    pub(crate) spawner: Sp,
    pub(crate) clock: Rc<dyn Clock>,
    pub(crate) params: GovernanceParameters,
    pub(crate) state: SharedState,
}

impl<C, S, T, Sp> GovernanceContext<C, S, T, Sp>
where
    C: GovernanceClient + 'static,
    S: Session + 'static,
    T: TxSubmitter,
    Sp: TaskSpawner + Clone + 'static,
{
    /// Create a context with an empty state, using the system clock
    pub fn new(
        client: C,
        session: S,
        submitter: T,
        spawner: Sp,
        params: GovernanceParameters,
    ) -> Self {
        Self {
            client: Rc::new(client),
            session: Rc::new(session),
            submitter,
            spawner,
            clock: Rc::new(SystemClock),
            params,
            state: GovernanceState::shared(),
        }
    }

    /// Replace the clock used for timelock checks
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The chain client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The wallet session
    pub fn session(&self) -> &S {
        &self.session
    }

    /// The transaction submitter
    pub fn submitter(&self) -> &T {
        &self.submitter
    }

    /// The governance parameters
    pub fn params(&self) -> &GovernanceParameters {
        &self.params
    }

    /// Read access to the local state. Do not hold it across an await.
    pub fn state(&self) -> Ref<'_, GovernanceState> {
        self.state.borrow()
    }

    pub(crate) fn page_cursor(&self, page: u64) -> PageCursor {
        PageCursor {
            page,
            page_size: self.params.page_size,
        }
    }

    /// The last loaded page, or the first page if none was loaded yet
    pub(crate) fn current_cursor(&self) -> PageCursor {
        self.state
            .borrow()
            .store
            .cursor()
            .unwrap_or_else(|| self.page_cursor(0))
    }

    /// Run a load cycle for the current page
    pub async fn load(&self) -> LoadReport {
        let cursor = self.current_cursor();
        self.load_cursor(cursor).await
    }

    /// Run a load cycle for the given page
    pub async fn load_page(&self, page: u64) -> LoadReport {
        self.load_cursor(self.page_cursor(page)).await
    }

    async fn load_cursor(&self, cursor: PageCursor) -> LoadReport {
        rpc::load_governance(
            self.client.as_ref(),
            self.session.as_ref(),
            &Rc::downgrade(&self.state),
            cursor,
        )
        .await
    }

    /// Reload everything in the background whenever the wallet switches
    /// account or chain, for as long as the returned subscription is held.
    pub fn watch_session(&self) -> Subscription<S> {
        let client = Rc::clone(&self.client);
        let session = Rc::downgrade(&self.session);
        let state = Rc::downgrade(&self.state);
        let spawner = self.spawner.clone();
        let cursor = self.page_cursor(0);
        Subscription::new(
            Rc::clone(&self.session),
            Box::new(move |event| {
                let Some(session) = session.upgrade() else {
                    return;
                };
                tracing::debug!(
                    ?event,
                    "Wallet session changed, reloading governance data"
                );
                let client = Rc::clone(&client);
                let state = state.clone();
                spawner.spawn_async(async move {
                    let report = rpc::load_governance(
                        client.as_ref(),
                        session.as_ref(),
                        &state,
                        cursor,
                    )
                    .await;
                    if !report.is_complete() {
                        tracing::debug!(
                            failures = report.failures.len(),
                            stale = report.stale,
                            "Session reload was partial"
                        );
                    }
                });
            }),
        )
    }

    /// Filter and sort the known proposals
    pub fn list_proposals(
        &self,
        filter: ProposalFilter,
        sort: ProposalSort,
    ) -> Vec<Proposal> {
        let state = self.state.borrow();
        view::list_proposals(&state.store, filter, sort)
            .cloned()
            .collect()
    }

    /// Look up a known proposal
    pub fn proposal(&self, id: ProposalId) -> Option<Proposal> {
        self.state.borrow().store.get(id).cloned()
    }

    /// The result of a proposal from its current tallies
    pub fn get_result(&self, proposal: &Proposal) -> ProposalResult {
        ProposalResult::of(proposal)
    }

    /// Check if the session's account may vote on proposal `id`
    pub fn can_vote(&self, id: ProposalId) -> bool {
        let state = self.state.borrow();
        match (state.account, state.store.get(id)) {
            (Some(account), Some(proposal)) => validation::can_vote(
                proposal,
                &account,
                state.voting_power,
                &state.ledger,
            ),
            _ => false,
        }
    }

    /// Check if proposal `id` may be queued
    pub fn can_queue(&self, id: ProposalId) -> bool {
        self.state
            .borrow()
            .store
            .get(id)
            .is_some_and(validation::can_queue)
    }

    /// Check if proposal `id` may be executed now
    pub fn can_execute(&self, id: ProposalId) -> bool {
        let now = self.clock.now();
        self.state
            .borrow()
            .store
            .get(id)
            .is_some_and(|proposal| validation::can_execute(proposal, now))
    }

    /// Check if the session's account may create a proposal
    pub fn can_create(&self) -> bool {
        let state = self.state.borrow();
        state.account.is_some()
            && validation::can_create(state.voting_power, &self.params)
    }

    /// The estimated time left to vote on proposal `id`. Only active
    /// proposals have a voting window to report on.
    pub fn time_remaining(&self, id: ProposalId) -> Option<TimeRemaining> {
        let state = self.state.borrow();
        let proposal = state
            .store
            .get(id)
            .filter(|proposal| proposal.state == ProposalState::Active)?;
        Some(utils::time_remaining(
            proposal.end_block,
            state.current_block,
            self.params.block_time(),
        ))
    }

    /// The session account's voting power, as of the last read
    pub fn voting_power(&self) -> token::Amount {
        self.state.borrow().voting_power
    }

    /// Check if the session's account is known to have voted on `id`,
    /// including votes still pending confirmation
    pub fn has_voted(&self, id: ProposalId) -> bool {
        let state = self.state.borrow();
        state
            .account
            .is_some_and(|account| state.ledger.has_voted(&account, id))
    }

    /// The treasury balance, as of the last read
    pub fn treasury_balance(&self) -> token::Amount {
        self.state.borrow().treasury
    }

    /// The last known block height
    pub fn current_block(&self) -> BlockHeight {
        self.state.borrow().current_block
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use quorum_core::address::testing::{
        established_address_1, established_address_2,
    };
    use quorum_core::chain::ChainId;
    use quorum_governance::storage::proposal::testing::proposal;
    use quorum_governance::storage::proposal::ProposalState;

    use super::*;
    use crate::error::{Error, QueryError};
    use crate::task_env::testing::QueuedSpawner;
    use crate::testing::{
        FakeChain, FakeGovernanceClient, FakeQuery, FakeSession,
        FakeTxSubmitter,
    };

    type TestContext = GovernanceContext<
        FakeGovernanceClient,
        FakeSession,
        FakeTxSubmitter,
        QueuedSpawner,
    >;

    fn whole(amount: u64) -> token::Amount {
        token::Amount::native_whole(amount)
    }

    fn chain() -> FakeChain {
        let mut chain = FakeChain {
            current_block: BlockHeight(150),
            treasury: whole(5_000),
            ..FakeChain::default()
        };
        for (id, state) in [
            (1, ProposalState::Active),
            (2, ProposalState::Succeeded),
            (3, ProposalState::Defeated),
        ] {
            chain.proposals.insert(id, proposal(id, state));
        }
        chain.voting_power.insert(established_address_1(), whole(10));
        chain.voting_power.insert(established_address_2(), whole(20));
        chain.votes.insert((3, established_address_1()));
        chain
    }

    fn setup() -> (TestContext, QueuedSpawner) {
        let spawner = QueuedSpawner::new();
        let ctx = GovernanceContext::new(
            FakeGovernanceClient::new(chain()),
            FakeSession::connected(established_address_1(), ChainId(1)),
            FakeTxSubmitter::default(),
            spawner.clone(),
            GovernanceParameters::default(),
        );
        (ctx, spawner)
    }

    #[tokio::test]
    async fn test_load_reads_everything() {
        let (ctx, _spawner) = setup();
        let report = ctx.load().await;
        assert!(report.is_complete());
        assert!(report.new_generation);

        assert_eq!(ctx.state().store.len(), 3);
        assert_eq!(ctx.state().store.total(), 3);
        assert_eq!(ctx.voting_power(), whole(10));
        assert_eq!(ctx.treasury_balance(), whole(5_000));
        assert_eq!(ctx.current_block(), BlockHeight(150));
        assert!(ctx.has_voted(3));
        assert!(!ctx.has_voted(1));
        assert!(ctx.can_vote(1));
        assert!(ctx.can_queue(2));
        assert!(!ctx.can_create());

        // 50 blocks of 15s
        assert_eq!(ctx.time_remaining(1), Some(TimeRemaining::Hours(0)));
        // same end block, but the voting window is not open
        assert_eq!(ctx.time_remaining(2), None);
        assert_eq!(ctx.time_remaining(3), None);
        assert_eq!(ctx.time_remaining(99), None);
        let ids: Vec<_> = ctx
            .list_proposals(ProposalFilter::All, ProposalSort::Oldest)
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_failed_reads_do_not_block_the_others() {
        let (ctx, _spawner) = setup();
        ctx.client().fail(FakeQuery::Proposals);
        ctx.client().fail(FakeQuery::VotingPower);

        let report = ctx.load().await;
        assert!(!report.stale);
        assert_eq!(report.failures.len(), 2);
        assert_matches!(
            &report.failures[0],
            Error::DataUnavailable(QueryError::NoResponse(_))
        );
        assert!(ctx.state().store.is_empty());
        assert!(ctx.voting_power().is_zero());
        assert_eq!(ctx.treasury_balance(), whole(5_000));
        assert_eq!(ctx.current_block(), BlockHeight(150));

        // the next successful load heals the state
        ctx.client().recover(FakeQuery::Proposals);
        ctx.client().recover(FakeQuery::VotingPower);
        assert!(ctx.load().await.is_complete());
        assert_eq!(ctx.state().store.len(), 3);
        assert_eq!(ctx.voting_power(), whole(10));
    }

    #[tokio::test]
    async fn test_load_pages() {
        let (ctx, _spawner) = setup();
        let ctx = GovernanceContext {
            params: GovernanceParameters {
                page_size: 2,
                ..GovernanceParameters::default()
            },
            ..ctx
        };
        ctx.load().await;
        assert_eq!(ctx.state().store.len(), 2);
        assert_eq!(ctx.state().store.total(), 3);

        ctx.load_page(1).await;
        assert_eq!(ctx.state().store.len(), 3);
        assert_eq!(
            ctx.state().store.cursor(),
            Some(PageCursor {
                page: 1,
                page_size: 2
            })
        );
    }

    #[tokio::test]
    async fn test_disconnected_session() {
        let spawner = QueuedSpawner::new();
        let ctx = GovernanceContext::new(
            FakeGovernanceClient::new(chain()),
            FakeSession::disconnected(),
            FakeTxSubmitter::default(),
            spawner,
            GovernanceParameters::default(),
        );
        assert!(ctx.load().await.is_complete());
        assert_eq!(ctx.state().store.len(), 3);
        assert!(!ctx.can_vote(1));
        assert!(!ctx.has_voted(3));
        assert_eq!(ctx.client().calls(FakeQuery::VotingPower), 0);
        assert_eq!(ctx.client().calls(FakeQuery::HasVoted), 0);
    }

    #[tokio::test]
    async fn test_session_change_reloads_fresh_state() {
        let (ctx, spawner) = setup();
        ctx.load().await;
        let generation = ctx.state().generation;
        let subscription = ctx.watch_session();
        assert_eq!(ctx.session().listener_count(), 1);

        ctx.session().switch_account(established_address_2());
        assert_eq!(spawner.pending(), 1);
        assert_eq!(spawner.run_pending().await, 1);

        assert_eq!(ctx.state().generation, generation + 1);
        assert_eq!(ctx.state().account, Some(established_address_2()));
        assert_eq!(ctx.voting_power(), whole(20));
        assert!(!ctx.has_voted(3));
        assert_eq!(ctx.state().store.len(), 3);

        ctx.session().switch_chain(ChainId(2));
        spawner.run_pending().await;
        assert_eq!(ctx.state().generation, generation + 2);

        drop(subscription);
        assert_eq!(ctx.session().listener_count(), 0);
        ctx.session().switch_account(established_address_1());
        assert_eq!(spawner.pending(), 0);
    }

    #[tokio::test]
    async fn test_reload_after_teardown_is_discarded() {
        let (ctx, spawner) = setup();
        let subscription = ctx.watch_session();
        ctx.session().switch_chain(ChainId(7));
        let session = Rc::clone(&ctx.session);
        let client = Rc::clone(&ctx.client);
        let state = Rc::downgrade(&ctx.state);
        drop(ctx);
        assert!(state.upgrade().is_none());

        // the session outlives the view, the queued reload finds no state
        assert_eq!(spawner.run_pending().await, 1);
        assert_eq!(client.calls(FakeQuery::Proposals), 0);
        assert!(state.upgrade().is_none());
        drop(subscription);
        assert_eq!(session.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_session_reload_on_local_set() {
        use crate::task_env::{
            LocalSetSpawner, LocalSetTaskEnvironment, TaskEnvironment,
        };

        LocalSetTaskEnvironment
            .run(|spawner: LocalSetSpawner| async move {
                let ctx = GovernanceContext::new(
                    FakeGovernanceClient::new(chain()),
                    FakeSession::connected(
                        established_address_1(),
                        ChainId(1),
                    ),
                    FakeTxSubmitter::default(),
                    spawner,
                    GovernanceParameters::default(),
                );
                let _subscription = ctx.watch_session();
                ctx.session().switch_account(established_address_2());
                while ctx.client().calls(FakeQuery::Treasury) == 0 {
                    tokio::task::yield_now().await;
                }
                // let the reload finish applying
                for _ in 0..10 {
                    tokio::task::yield_now().await;
                }
                assert_eq!(ctx.voting_power(), whole(20));
            })
            .await;
    }
}
