//! Error types for snapshot operations.

use crate::api::ApiError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during snapshot operations.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The caller supplied arguments that can never produce a valid request.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The snapshot does not exist.
    #[error("{operation}: snapshot {id} not found")]
    NotFound { operation: &'static str, id: String },

    /// The remote side rejected the request outright (bad parameters,
    /// naming collision, quota). Never retried.
    #[error("{operation}: request for snapshot {id} rejected ({code}): {message}")]
    Rejected {
        operation: &'static str,
        id: String,
        code: String,
        message: String,
    },

    /// The snapshot reached a terminal status other than `available`.
    #[error("Snapshot {id} entered terminal status '{status}'")]
    RemoteFailure { id: String, status: String },

    /// A bounded wait or retry ran out of time before reaching a terminal state.
    #[error("{operation}: snapshot {id} timed out after {}: {detail}", humantime::format_duration(*.elapsed))]
    Timeout {
        operation: &'static str,
        id: String,
        elapsed: Duration,
        detail: String,
    },

    /// The calling context was cancelled while the operation was in flight.
    #[error("{operation}: cancelled while working on snapshot {id}")]
    Cancelled { operation: &'static str, id: String },

    /// A lookup matched several snapshots and most-recent resolution was not requested.
    #[error("Your query returned {count} results. Please try a more specific search criteria, or request the most recent snapshot.")]
    AmbiguousSelection { count: usize },

    /// A lookup matched no snapshots.
    #[error("Your query returned no results. Please change your search criteria and try again.")]
    NoMatch,

    /// The HTTP client could not be set up.
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(#[source] reqwest::Error),

    /// Any other remote error, with the operation and snapshot it happened on.
    #[error("{operation}: snapshot {id}: {source}")]
    Api {
        operation: &'static str,
        id: String,
        #[source]
        source: ApiError,
    },
}

impl SnapshotError {
    /// Attaches operation context to a remote error, lifting the kinds the
    /// caller can act on into their own variants.
    pub(crate) fn from_api(operation: &'static str, id: &str, err: ApiError) -> Self {
        let id = id.to_string();
        match err {
            ApiError::NotFound(_) => SnapshotError::NotFound { operation, id },
            ApiError::Rejected { code, message } => SnapshotError::Rejected {
                operation,
                id,
                code,
                message,
            },
            other => SnapshotError::Api {
                operation,
                id,
                source: other,
            },
        }
    }

    /// Returns true if the error means the snapshot is gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SnapshotError::NotFound { .. })
    }

    /// Returns true for errors produced by an exhausted time budget.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SnapshotError::Timeout { .. })
    }
}
