//! Governance proposal lifecycle: the local proposal store and vote ledger,
//! result tallying, action gating and the presentation projections.

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_lossless,
    clippy::arithmetic_side_effects,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]

/// governance parameters
pub mod parameters;
/// governance storage
pub mod storage;
/// Governance utility functions/structs
pub mod utils;
pub mod validation;
pub mod view;

pub use parameters::GovernanceParameters;
pub use storage::proposal::{
    Proposal, ProposalDraft, ProposalId, ProposalState,
};
pub use storage::vote::{ProposalVote, VoteLedger};
pub use storage::{PageCursor, ProposalStore};
pub use utils::{
    compute_proposal_result, time_remaining, ProposalResult, TimeRemaining,
};
pub use validation::GateError;
pub use view::{list_proposals, ProposalFilter, ProposalSort};
