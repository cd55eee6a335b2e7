//! Governance client SDK: drives proposal reads and governance actions
//! against injected chain, wallet session and transaction collaborators.

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

pub mod context;
pub mod error;
pub mod orchestrator;
pub mod queries;
pub mod rpc;
pub mod state;
pub mod task_env;
pub mod tx;
pub mod wallet;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use context::GovernanceContext;
pub use error::{ActionError, Error, QueryError, SubmitError};
pub use orchestrator::Action;
pub use queries::{GovernanceClient, ProposalsPage};
pub use {quorum_core as core, quorum_governance as governance};
