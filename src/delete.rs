//! Deleting a snapshot that may still be attached to a running operation.

use crate::api::{ApiError, SnapshotApi};
use crate::cancel::Cancellation;
use crate::error::SnapshotError;
use crate::policy::{run_bounded, Bounded, RetryPolicy};
use tokio::time::Instant;
use tokio_retry2::{Retry, RetryError};
use tracing::{info, warn};

const DELETE_OPERATION: &str = "DeleteDBSnapshot";

/// How a successful delete ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// This call removed the snapshot.
    Deleted,
    /// The snapshot was already gone.
    AlreadyGone,
}

/// Deletes a snapshot, retrying while it is in use.
///
/// A snapshot that is still attached to a copy or export detaches
/// asynchronously, and the only signal is the delete call itself. While the
/// remote side reports the snapshot in use, the delete is retried within the
/// policy's budget. Once the budget is spent one final attempt is made.
/// A snapshot that does not exist counts as deleted.
///
/// # Example
///
/// ```no_run
/// use rds_snapshot::{delete_snapshot, Cancellation, ClientConfig, HttpSnapshotApi, RetryPolicy};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let api = HttpSnapshotApi::new(&ClientConfig::default())?;
/// delete_snapshot(&api, "dst-1", &RetryPolicy::delete(), &Cancellation::never()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn delete_snapshot<A>(
    api: &A,
    id: &str,
    policy: &RetryPolicy,
    cancellation: &Cancellation,
) -> Result<DeleteOutcome, SnapshotError>
where
    A: SnapshotApi + ?Sized,
{
    if id.trim().is_empty() {
        return Err(SnapshotError::InvalidInput(
            "snapshot identifier must not be empty".to_string(),
        ));
    }

    info!(snapshot_id = id, "Deleting snapshot");
    let started = Instant::now();

    let retrying = Retry::spawn(policy.strategy(), || async move {
        match api.delete_snapshot(id).await {
            Ok(()) => Ok(DeleteOutcome::Deleted),
            Err(ApiError::NotFound(_)) => Ok(DeleteOutcome::AlreadyGone),
            Err(e @ ApiError::InUse(_)) => {
                warn!(snapshot_id = id, "Snapshot in use, trying again while it detaches: {}", e);
                RetryError::to_transient(e)
            }
            Err(e) => RetryError::to_permanent(e),
        }
    });

    let last_error = match run_bounded(retrying, policy, cancellation).await {
        Bounded::Done(Ok(outcome)) => {
            info!(snapshot_id = id, ?outcome, "Snapshot deleted");
            return Ok(outcome);
        }
        Bounded::Done(Err(e @ ApiError::InUse(_))) => e.to_string(),
        Bounded::Done(Err(e)) => return Err(SnapshotError::from_api(DELETE_OPERATION, id, e)),
        Bounded::TimedOut => "retry budget exhausted".to_string(),
        Bounded::Cancelled => {
            return Err(SnapshotError::Cancelled {
                operation: DELETE_OPERATION,
                id: id.to_string(),
            })
        }
    };

    warn!(snapshot_id = id, "Retry budget spent, making a final delete attempt");
    match api.delete_snapshot(id).await {
        Ok(()) => Ok(DeleteOutcome::Deleted),
        Err(ApiError::NotFound(_)) => Ok(DeleteOutcome::AlreadyGone),
        Err(ApiError::InUse(message)) => Err(SnapshotError::Timeout {
            operation: DELETE_OPERATION,
            id: id.to_string(),
            elapsed: started.elapsed(),
            detail: format!("snapshot still in use ({}); {}", message, last_error),
        }),
        Err(e) => Err(SnapshotError::from_api(DELETE_OPERATION, id, e)),
    }
}
