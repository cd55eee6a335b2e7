//! Error types of the governance SDK

use quorum_governance::validation::GateError;
use thiserror::Error;

/// The standard Result type that most code ought to return
pub type Result<T> = std::result::Result<T, Error>;

/// General error interface for anything that may go wrong in the SDK.
///
/// Only [`Error::PreconditionFailed`] and [`Error::SubmissionFailed`] are
/// ever returned to the caller of an action. Read failures are logged and
/// absorbed, they surface only in load reports.
#[derive(Clone, Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The local gate rejected the action before anything was submitted
    #[error("Precondition failed: {0}")]
    PreconditionFailed(#[from] GateError),
    /// The transaction collaborator rejected or failed the submission
    #[error("Transaction submission failed: {0}")]
    SubmissionFailed(String),
    /// A reconciliation read failed after an action settled
    #[error("Reloading governance data failed: {0}")]
    ReloadFailed(QueryError),
    /// A read of the load cycle failed and was replaced by a default
    #[error("Governance data unavailable: {0}")]
    DataUnavailable(QueryError),
}

/// The error returned by governance actions
pub type ActionError = Error;

/// Errors that deal with querying some kind of data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Error that corresponds to not receiving any response
    #[error("No response given in the query: {0}")]
    NoResponse(String),
    /// The queried item does not exist
    #[error("Unable to find {0}")]
    NotFound(String),
    /// Error that corresponds to a general error
    #[error("Error in the query: {0}")]
    General(String),
}

/// Errors of the transaction collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The signer refused the transaction
    #[error("The transaction was rejected by the signer: {0}")]
    Rejected(String),
    /// The transaction could not be broadcast
    #[error("The transaction could not be broadcast: {0}")]
    Broadcast(String),
}

impl From<SubmitError> for Error {
    fn from(err: SubmitError) -> Self {
        Error::SubmissionFailed(err.to_string())
    }
}
