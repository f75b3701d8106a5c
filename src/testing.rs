//! In-memory `SnapshotApi` for unit tests.
//!
//! Backed by a list of snapshot records. Scripted responses, when queued,
//! take precedence over the list for the matching operation.

use crate::api::{ApiError, SnapshotApi};
use crate::types::{CopyRequest, DescribeQuery, SnapshotRecord};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct FakeApi {
    snapshots: Mutex<Vec<SnapshotRecord>>,
    in_use: Mutex<HashSet<String>>,
    copy_script: Mutex<VecDeque<Result<SnapshotRecord, ApiError>>>,
    describe_script: Mutex<VecDeque<Result<SnapshotRecord, ApiError>>>,
    delete_script: Mutex<VecDeque<Result<(), ApiError>>>,
    pub copy_requests: Mutex<Vec<CopyRequest>>,
    pub queries: Mutex<Vec<DescribeQuery>>,
    pub describe_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshots(records: Vec<SnapshotRecord>) -> Self {
        let api = Self::new();
        *api.snapshots.lock().unwrap() = records;
        api
    }

    pub fn insert(&self, record: SnapshotRecord) {
        self.snapshots.lock().unwrap().push(record);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.snapshots
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.db_snapshot_identifier == id)
    }

    /// Every delete of `id` reports the snapshot as in use.
    pub fn mark_in_use(&self, id: &str) {
        self.in_use.lock().unwrap().insert(id.to_string());
    }

    pub fn script_copy(&self, response: Result<SnapshotRecord, ApiError>) {
        self.copy_script.lock().unwrap().push_back(response);
    }

    pub fn script_describe(&self, response: Result<SnapshotRecord, ApiError>) {
        self.describe_script.lock().unwrap().push_back(response);
    }

    pub fn script_delete(&self, response: Result<(), ApiError>) {
        self.delete_script.lock().unwrap().push_back(response);
    }

    pub fn describe_count(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn find(&self, id: &str) -> Option<SnapshotRecord> {
        self.snapshots
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.db_snapshot_identifier == id)
            .cloned()
    }
}

#[async_trait]
impl SnapshotApi for FakeApi {
    async fn copy_snapshot(&self, request: &CopyRequest) -> Result<SnapshotRecord, ApiError> {
        self.copy_requests.lock().unwrap().push(request.clone());
        if let Some(response) = self.copy_script.lock().unwrap().pop_front() {
            return response;
        }
        if self.contains(&request.target_db_snapshot_identifier) {
            return Err(ApiError::from_code(
                "DBSnapshotAlreadyExists",
                format!(
                    "Cannot create the snapshot because a snapshot with the identifier {} already exists.",
                    request.target_db_snapshot_identifier
                ),
            ));
        }
        let record = SnapshotRecord {
            source_db_snapshot_identifier: Some(request.source_db_snapshot_identifier.clone()),
            source_region: Some(request.source_region.clone()),
            ..SnapshotRecord::new(request.target_db_snapshot_identifier.clone(), "creating")
        };
        self.insert(record.clone());
        Ok(record)
    }

    async fn describe_snapshot(&self, id: &str) -> Result<SnapshotRecord, ApiError> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(response) = self.describe_script.lock().unwrap().pop_front() {
            return response;
        }
        self.find(id).ok_or_else(|| {
            ApiError::from_code("DBSnapshotNotFound", format!("DBSnapshot {} not found.", id))
        })
    }

    async fn describe_snapshots(
        &self,
        query: &DescribeQuery,
    ) -> Result<Vec<SnapshotRecord>, ApiError> {
        self.queries.lock().unwrap().push(query.clone());
        let snapshots = self.snapshots.lock().unwrap();
        Ok(snapshots
            .iter()
            .filter(|r| {
                query
                    .db_snapshot_identifier
                    .as_ref()
                    .map_or(true, |id| &r.db_snapshot_identifier == id)
            })
            .filter(|r| {
                query
                    .db_instance_identifier
                    .as_ref()
                    .map_or(true, |id| r.db_instance_identifier.as_ref() == Some(id))
            })
            .cloned()
            .collect())
    }

    async fn delete_snapshot(&self, id: &str) -> Result<(), ApiError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(response) = self.delete_script.lock().unwrap().pop_front() {
            return response;
        }
        if self.in_use.lock().unwrap().contains(id) {
            return Err(ApiError::from_code(
                "SnapshotInUse",
                format!("Snapshot {} is in use by a running copy.", id),
            ));
        }
        let mut snapshots = self.snapshots.lock().unwrap();
        let before = snapshots.len();
        snapshots.retain(|r| r.db_snapshot_identifier != id);
        if snapshots.len() == before {
            return Err(ApiError::from_code(
                "DBSnapshotNotFound",
                format!("DBSnapshot {} not found.", id),
            ));
        }
        Ok(())
    }
}
