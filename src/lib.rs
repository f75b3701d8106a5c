//! rds-snapshot - Copy, look up and delete RDS DB snapshots
//!
//! This library drives the RDS snapshot API through three blocking entry
//! points, each bounded by an explicit time budget and cancellable by the
//! caller.
//!
//! # Features
//!
//! - **Copy and Wait**: Copy a snapshot across regions or accounts and wait until it is available
//! - **Lookup**: Resolve criteria to a single snapshot, optionally picking the most recent
//! - **Idempotent Delete**: Retry while the snapshot is in use; a missing snapshot counts as deleted
//! - **Cancellation**: Stop any wait or retry loop promptly from another task
//!
//! # Example
//!
//! ```no_run
//! use rds_snapshot::{lookup_snapshot, ClientConfig, HttpSnapshotApi, LookupCriteria};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = HttpSnapshotApi::new(&ClientConfig::default())?;
//! let criteria = LookupCriteria {
//!     db_instance_identifier: Some("db-1".to_string()),
//!     include_shared: true,
//!     most_recent: true,
//!     ..Default::default()
//! };
//!
//! let snapshot = lookup_snapshot(&api, &criteria).await?;
//! println!("{}", snapshot.db_snapshot_identifier);
//! # Ok(())
//! # }
//! ```

mod api;
mod cancel;
mod copy;
mod delete;
mod error;
mod filter;
mod http;
mod lookup;
mod policy;
mod select;
mod types;

#[cfg(test)]
mod testing;

pub use api::{ApiError, SnapshotApi};
pub use cancel::{CancelHandle, Cancellation};
pub use copy::{copy_snapshot, read_snapshot, wait_for_available};
pub use delete::{delete_snapshot, DeleteOutcome};
pub use error::SnapshotError;
pub use filter::filter_by_instance;
pub use http::HttpSnapshotApi;
pub use lookup::lookup_snapshot;
pub use policy::{RetryPolicy, MIN_INTERVAL};
pub use select::select_most_recent;
pub use types::{
    ClientConfig, CopyRequest, DescribeQuery, LookupCriteria, SnapshotRecord, STATUS_AVAILABLE,
};
