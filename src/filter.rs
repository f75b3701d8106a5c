//! Client-side filtering of snapshot listings.

use crate::types::SnapshotRecord;
use tracing::debug;

/// Keeps the snapshots taken from `instance_id`, in their original order.
///
/// Shared and public snapshots belong to instances outside the current
/// account, so the remote side cannot match them by instance identifier.
/// Records without an instance identifier never match.
pub fn filter_by_instance(records: Vec<SnapshotRecord>, instance_id: &str) -> Vec<SnapshotRecord> {
    let total = records.len();
    let matching: Vec<SnapshotRecord> = records
        .into_iter()
        .filter(|r| r.db_instance_identifier.as_deref() == Some(instance_id))
        .collect();

    debug!(
        total,
        matching = matching.len(),
        instance_id,
        "Filtered snapshots by instance identifier"
    );
    matching
}
