//! Resolving lookup criteria to exactly one snapshot.

use crate::api::SnapshotApi;
use crate::error::SnapshotError;
use crate::filter::filter_by_instance;
use crate::select::select_most_recent;
use crate::types::{LookupCriteria, SnapshotRecord};
use tracing::{debug, info};

const LOOKUP_OPERATION: &str = "DescribeDBSnapshots";

/// Finds the single snapshot matching `criteria`.
///
/// At least one of the instance or snapshot identifier must be given. When
/// the query reaches shared or public snapshots, the instance identifier is
/// matched locally after the listing.
///
/// Several matches are an [`SnapshotError::AmbiguousSelection`] unless
/// `most_recent` is set, in which case the newest snapshot wins. No match is
/// [`SnapshotError::NoMatch`].
pub async fn lookup_snapshot<A>(
    api: &A,
    criteria: &LookupCriteria,
) -> Result<SnapshotRecord, SnapshotError>
where
    A: SnapshotApi + ?Sized,
{
    if criteria.instance_id().is_none() && criteria.snapshot_id().is_none() {
        return Err(SnapshotError::InvalidInput(
            "one of the snapshot identifier or the instance identifier must be given".to_string(),
        ));
    }

    let query = criteria.to_query();
    if criteria.crosses_account() && criteria.instance_id().is_some() {
        debug!(
            snapshot_type = ?criteria.snapshot_type,
            "Not combining instance identifier with cross-account query, filtering client-side"
        );
    }
    debug!(?query, "Describing snapshots");

    let context = criteria
        .snapshot_id()
        .or(criteria.instance_id())
        .unwrap_or_default();
    let mut snapshots = api
        .describe_snapshots(&query)
        .await
        .map_err(|e| SnapshotError::from_api(LOOKUP_OPERATION, context, e))?;

    if criteria.crosses_account() {
        if let Some(instance_id) = criteria.instance_id() {
            snapshots = filter_by_instance(snapshots, instance_id);
        }
    }

    match snapshots.len() {
        0 => Err(SnapshotError::NoMatch),
        1 => Ok(snapshots.remove(0)),
        count if criteria.most_recent => {
            info!(count, "Multiple snapshots matched, selecting the most recent");
            select_most_recent(snapshots).ok_or(SnapshotError::NoMatch)
        }
        count => Err(SnapshotError::AmbiguousSelection { count }),
    }
}
