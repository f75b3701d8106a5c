//! Copying a snapshot and waiting for the copy to become available.

use crate::api::{ApiError, SnapshotApi};
use crate::cancel::Cancellation;
use crate::error::SnapshotError;
use crate::policy::{run_bounded, Bounded, RetryPolicy};
use crate::types::{CopyRequest, SnapshotRecord};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::time::Instant;
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, info, warn};

const COPY_OPERATION: &str = "CopyDBSnapshot";
const WAIT_OPERATION: &str = "WaitUntilDBSnapshotAvailable";
const READ_OPERATION: &str = "DescribeDBSnapshots";

/// Copies a snapshot and blocks until the copy is available.
///
/// The copy call itself is never retried: a second submission could collide
/// with the target created by the first. Once the copy is accepted the new
/// snapshot is polled as described in [`wait_for_available`].
///
/// # Example
///
/// ```no_run
/// use rds_snapshot::{copy_snapshot, Cancellation, ClientConfig, CopyRequest, HttpSnapshotApi, RetryPolicy};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let api = HttpSnapshotApi::new(&ClientConfig::default())?;
/// let request = CopyRequest::new("src-1", "dst-1", "us-west-2").copy_tags(true);
/// let snapshot = copy_snapshot(&api, &request, &RetryPolicy::copy_wait(), &Cancellation::never()).await?;
/// println!("{} is {}", snapshot.db_snapshot_identifier, snapshot.status);
/// # Ok(())
/// # }
/// ```
pub async fn copy_snapshot<A>(
    api: &A,
    request: &CopyRequest,
    policy: &RetryPolicy,
    cancellation: &Cancellation,
) -> Result<SnapshotRecord, SnapshotError>
where
    A: SnapshotApi + ?Sized,
{
    let request = request.validated().map_err(SnapshotError::InvalidInput)?;
    let target = request.target_db_snapshot_identifier.as_str();

    if cancellation.is_cancelled() {
        return Err(SnapshotError::Cancelled {
            operation: COPY_OPERATION,
            id: target.to_string(),
        });
    }

    info!(
        source = %request.source_db_snapshot_identifier,
        target_id = target,
        source_region = %request.source_region,
        "Requesting snapshot copy"
    );
    let created = api
        .copy_snapshot(&request)
        .await
        .map_err(|e| SnapshotError::from_api(COPY_OPERATION, target, e))?;

    wait_for_available(api, &created.db_snapshot_identifier, policy, cancellation).await
}

/// Outcome of a single status check that did not produce an available snapshot.
#[derive(Debug)]
enum PollError {
    Pending,
    Failed(SnapshotError),
}

/// Polls a snapshot until it is available.
///
/// A snapshot that is briefly invisible right after creation counts as
/// pending. A terminal failure status ends the wait with
/// [`SnapshotError::RemoteFailure`]; running out of budget yields
/// [`SnapshotError::Timeout`] instead.
pub async fn wait_for_available<A>(
    api: &A,
    id: &str,
    policy: &RetryPolicy,
    cancellation: &Cancellation,
) -> Result<SnapshotRecord, SnapshotError>
where
    A: SnapshotApi + ?Sized,
{
    info!(snapshot_id = id, "Waiting for snapshot to become available");
    let started = Instant::now();
    let checks = AtomicUsize::new(0);
    let last_status: Mutex<Option<String>> = Mutex::new(None);

    // The budget is enforced by `run_bounded`; the strategy only paces checks.
    let polling = Retry::spawn(policy.pacing(), || {
        let checks = &checks;
        let last_status = &last_status;
        async move {
            let attempt = checks.fetch_add(1, Ordering::SeqCst) + 1;
            match api.describe_snapshot(id).await {
                Ok(record) => {
                    debug!(snapshot_id = id, attempt, status = %record.status, "Checked snapshot status");
                    if let Ok(mut last) = last_status.lock() {
                        *last = Some(record.status.clone());
                    }
                    if record.is_available() {
                        Ok(record)
                    } else if record.is_failed() {
                        RetryError::to_permanent(PollError::Failed(SnapshotError::RemoteFailure {
                            id: id.to_string(),
                            status: record.status,
                        }))
                    } else {
                        RetryError::to_transient(PollError::Pending)
                    }
                }
                Err(ApiError::NotFound(_)) => {
                    debug!(snapshot_id = id, attempt, "Snapshot not visible yet");
                    RetryError::to_transient(PollError::Pending)
                }
                Err(e) => {
                    warn!(snapshot_id = id, attempt, "Failed to check snapshot status: {}", e);
                    RetryError::to_permanent(PollError::Failed(SnapshotError::from_api(
                        WAIT_OPERATION,
                        id,
                        e,
                    )))
                }
            }
        }
    });

    let outcome = run_bounded(polling, policy, cancellation).await;
    let checks = checks.load(Ordering::SeqCst);
    match outcome {
        Bounded::Done(Ok(record)) => {
            info!(snapshot_id = id, checks, "Snapshot is available");
            Ok(record)
        }
        Bounded::Done(Err(PollError::Failed(e))) => Err(e),
        Bounded::Done(Err(PollError::Pending)) | Bounded::TimedOut => {
            let status = last_status
                .lock()
                .ok()
                .and_then(|s| s.clone())
                .unwrap_or_else(|| "not yet visible".to_string());
            Err(SnapshotError::Timeout {
                operation: WAIT_OPERATION,
                id: id.to_string(),
                elapsed: started.elapsed(),
                detail: format!("last status '{}' after {} status checks", status, checks),
            })
        }
        Bounded::Cancelled => Err(SnapshotError::Cancelled {
            operation: WAIT_OPERATION,
            id: id.to_string(),
        }),
    }
}

/// Reads the current state of a snapshot.
///
/// A snapshot that no longer exists is `Ok(None)`, so callers can drop it
/// from their own bookkeeping instead of failing.
pub async fn read_snapshot<A>(api: &A, id: &str) -> Result<Option<SnapshotRecord>, SnapshotError>
where
    A: SnapshotApi + ?Sized,
{
    match api.describe_snapshot(id).await {
        Ok(record) => Ok(Some(record)),
        Err(ApiError::NotFound(_)) => {
            info!(snapshot_id = id, "Snapshot not found");
            Ok(None)
        }
        Err(e) => Err(SnapshotError::from_api(READ_OPERATION, id, e)),
    }
}
