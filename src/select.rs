//! Picking the newest snapshot out of several matches.

use crate::types::SnapshotRecord;

/// Returns the snapshot with the latest creation time.
///
/// Snapshots still being created have no creation time and order before
/// every timestamped one. Equal creation times (including all-missing)
/// resolve to the last such record in input order. Returns `None` only for
/// an empty input.
pub fn select_most_recent(records: Vec<SnapshotRecord>) -> Option<SnapshotRecord> {
    // `Option` orders `None` first and `max_by_key` keeps the last maximum.
    records.into_iter().max_by_key(|r| r.snapshot_create_time)
}
