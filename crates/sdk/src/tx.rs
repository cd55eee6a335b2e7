//! The transaction collaborator: contract calls, submission hints and the
//! handles used to await settlement.

use std::fmt::{self, Display};
use std::future::Future;

use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use quorum_governance::storage::proposal::{ProposalDraft, ProposalId};
use quorum_governance::storage::vote::ProposalVote;
use serde::{Deserialize, Serialize};

use crate::error::SubmitError;

/// The kinds of governance actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Create a proposal
    Create,
    /// Vote on an active proposal
    Vote,
    /// Queue a succeeded proposal
    Queue,
    /// Execute a queued proposal
    Execute,
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Create => write!(f, "create"),
            ActionKind::Vote => write!(f, "vote"),
            ActionKind::Queue => write!(f, "queue"),
            ActionKind::Execute => write!(f, "execute"),
        }
    }
}

/// An opaque governor contract call handed to the transaction collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum CallDescriptor {
    /// `propose`
    Propose {
        /// Proposal title
        title: String,
        /// Proposal description
        description: String,
    },
    /// `castVoteWithReason`
    CastVoteWithReason {
        /// The proposal voted on
        proposal_id: ProposalId,
        /// The side of the vote
        support: ProposalVote,
        /// Free text reason, may be empty
        reason: String,
    },
    /// `queue`
    Queue {
        /// The proposal to queue
        proposal_id: ProposalId,
    },
    /// `execute`
    Execute {
        /// The proposal to execute
        proposal_id: ProposalId,
    },
}

impl CallDescriptor {
    /// Build a `propose` call from a draft
    pub fn propose(draft: &ProposalDraft) -> Self {
        CallDescriptor::Propose {
            title: draft.title.clone(),
            description: draft.description.clone(),
        }
    }

    /// The contract method name
    pub fn method(&self) -> &'static str {
        match self {
            CallDescriptor::Propose { .. } => "propose",
            CallDescriptor::CastVoteWithReason { .. } => "castVoteWithReason",
            CallDescriptor::Queue { .. } => "queue",
            CallDescriptor::Execute { .. } => "execute",
        }
    }
}

/// Transaction priority hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxPriority {
    #[allow(missing_docs)]
    Low,
    #[allow(missing_docs)]
    Normal,
    #[allow(missing_docs)]
    High,
}

/// Gas price strategy hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GasStrategy {
    #[allow(missing_docs)]
    Slow,
    #[allow(missing_docs)]
    Standard,
    #[allow(missing_docs)]
    Fast,
}

/// Submission hints handed to the transaction collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOpts {
    /// Priority of the transaction
    pub priority: TxPriority,
    /// Gas price strategy
    pub gas_strategy: GasStrategy,
}

impl TxOpts {
    /// The hints used for each kind of action. Votes and executions get
    /// the higher priority.
    pub fn for_action(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Create | ActionKind::Queue => TxOpts {
                priority: TxPriority::Normal,
                gas_strategy: GasStrategy::Standard,
            },
            ActionKind::Vote | ActionKind::Execute => TxOpts {
                priority: TxPriority::High,
                gas_strategy: GasStrategy::Fast,
            },
        }
    }
}

/// The outcome of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// The transaction was included and succeeded
    Confirmed,
    /// The transaction failed or was dropped
    Failed(String),
}

impl Settlement {
    /// Check if the transaction was confirmed
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Settlement::Confirmed)
    }
}

impl Display for Settlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Settlement::Confirmed => write!(f, "confirmed"),
            Settlement::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// A future resolving once a transaction settles. Cloning it shares the
/// same outcome.
pub type SettlementFuture = Shared<LocalBoxFuture<'static, Settlement>>;

/// A submitted transaction
#[derive(Clone)]
pub struct TxHandle {
    /// The transaction hash
    pub hash: String,
    settlement: SettlementFuture,
}

impl TxHandle {
    /// Create a handle settling with the output of `settlement`
    pub fn new<F>(hash: impl Into<String>, settlement: F) -> Self
    where
        F: Future<Output = Settlement> + 'static,
    {
        Self {
            hash: hash.into(),
            settlement: settlement.boxed_local().shared(),
        }
    }

    /// Create a handle that settles when the returned [`Settler`] is used.
    /// Dropping the settler settles the handle as failed.
    pub fn pending(hash: impl Into<String>) -> (Self, Settler) {
        let (sender, receiver) = oneshot::channel();
        let settlement = receiver.map(|outcome| {
            outcome.unwrap_or_else(|oneshot::Canceled| {
                Settlement::Failed("The transaction was abandoned".to_string())
            })
        });
        (Self::new(hash, settlement), Settler(sender))
    }

    /// Create an already settled handle
    pub fn settled(hash: impl Into<String>, settlement: Settlement) -> Self {
        Self::new(hash, futures::future::ready(settlement))
    }

    /// A future resolving to the outcome of the transaction
    pub fn settlement(&self) -> SettlementFuture {
        self.settlement.clone()
    }

    /// Wait for the transaction to settle
    pub async fn wait(&self) -> Settlement {
        self.settlement().await
    }
}

impl fmt::Debug for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxHandle")
            .field("hash", &self.hash)
            .field("settlement", &self.settlement.peek())
            .finish()
    }
}

/// Settles a pending [`TxHandle`]
#[derive(Debug)]
pub struct Settler(oneshot::Sender<Settlement>);

impl Settler {
    /// Settle the transaction. Has no effect if every handle was dropped.
    pub fn settle(self, settlement: Settlement) {
        // The receiver is gone when no one waits on the handle any more
        let _ = self.0.send(settlement);
    }
}

/// Submits signed contract calls to the chain
#[async_trait::async_trait(?Send)]
pub trait TxSubmitter {
    /// Sign and broadcast `call`. Returns once the transaction is
    /// submitted, its settlement is awaited through the handle.
    async fn execute_transaction(
        &self,
        call: CallDescriptor,
        opts: TxOpts,
    ) -> Result<TxHandle, SubmitError>;
}
