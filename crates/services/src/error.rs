//! Shared error types for the services crate.

use thiserror::Error;

use checkin_core::model::{CheckInError, QuestionId};
use checkin_core::validate::TypeError;
use storage::repository::StorageError;

/// Errors emitted by the session guard.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("not signed in")]
    Unauthenticated,
}

/// Errors emitted by `SubmissionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmitError {
    /// User-correctable: required questions unanswered or answers of the
    /// wrong shape. Nothing was persisted.
    #[error("submission is incomplete ({} missing, {} type errors)", missing.len(), type_errors.len())]
    Incomplete {
        missing: Vec<QuestionId>,
        type_errors: Vec<TypeError>,
    },

    /// Configuration gap: no assigned template and no default to fall back
    /// to. Surfaced to the submitter, never retried automatically.
    #[error("no check-in template assigned or marked default")]
    NoTemplate,

    #[error("only clients can submit check-ins")]
    NotAClient,

    #[error("client session carries no coach assignment")]
    NoCoach,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    CheckIn(#[from] CheckInError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AggregationEngine`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AggregationError {
    #[error("only coaches can open a dashboard")]
    NotACoach,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
