//! The remote snapshot API the orchestrators drive.

use crate::types::{CopyRequest, DescribeQuery, SnapshotRecord};
use async_trait::async_trait;
use thiserror::Error;

const NOT_FOUND_CODES: &[&str] = &[
    "DBSnapshotNotFound",
    "DBSnapshotNotFoundFault",
    "InvalidDBSnapshot.NotFound",
    "InvalidSnapshot.NotFound",
];

const IN_USE_CODES: &[&str] = &[
    "SnapshotInUse",
    "InvalidDBSnapshotState",
    "InvalidDBSnapshotStateFault",
];

const REJECTED_CODES: &[&str] = &[
    "InvalidParameterValue",
    "InvalidParameterCombination",
    "MissingParameter",
    "DBSnapshotAlreadyExists",
    "DBSnapshotAlreadyExistsFault",
    "SnapshotQuotaExceeded",
    "KMSKeyNotAccessibleFault",
    "ValidationError",
];

/// An error reported by the snapshot API, classified by what the caller can
/// do about it.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The snapshot does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The snapshot is busy, e.g. still attached to a running copy or export.
    #[error("snapshot in use: {0}")]
    InUse(String),

    /// The request itself was rejected.
    #[error("{code}: {message}")]
    Rejected { code: String, message: String },

    /// Any other coded error from the service.
    #[error("{code}: {message}")]
    Service { code: String, message: String },

    /// HTTP request error.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The response body could not be decoded.
    #[error(transparent)]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Classifies a remote error code.
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        if NOT_FOUND_CODES.contains(&code) {
            ApiError::NotFound(message)
        } else if IN_USE_CODES.contains(&code) {
            ApiError::InUse(message)
        } else if REJECTED_CODES.contains(&code) {
            ApiError::Rejected {
                code: code.to_string(),
                message,
            }
        } else {
            ApiError::Service {
                code: code.to_string(),
                message,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    pub fn is_in_use(&self) -> bool {
        matches!(self, ApiError::InUse(_))
    }
}

/// Operations of the remote snapshot-management API.
///
/// The remote side is the only source of truth. Implementations must not
/// cache records between calls.
#[async_trait]
pub trait SnapshotApi: Send + Sync {
    /// Starts a copy and returns the new snapshot as first reported.
    async fn copy_snapshot(&self, request: &CopyRequest) -> Result<SnapshotRecord, ApiError>;

    /// Describes a single snapshot. A missing snapshot is `ApiError::NotFound`.
    async fn describe_snapshot(&self, id: &str) -> Result<SnapshotRecord, ApiError>;

    /// Lists every snapshot matching the query, across all result pages.
    async fn describe_snapshots(
        &self,
        query: &DescribeQuery,
    ) -> Result<Vec<SnapshotRecord>, ApiError>;

    /// Deletes a snapshot.
    async fn delete_snapshot(&self, id: &str) -> Result<(), ApiError>;
}
