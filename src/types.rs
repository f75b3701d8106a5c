//! Data structures for snapshot operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Snapshot status reported once a copy has completed.
pub const STATUS_AVAILABLE: &str = "available";

/// Statuses after which a snapshot will never become `available` on its own.
const TERMINAL_FAILURE_STATUSES: &[&str] = &[
    "failed",
    "error",
    "incompatible-restore",
    "incompatible-parameters",
    "incompatible-network",
    "deleted",
    "deleting",
];

/// Tag keys with this prefix are reserved by AWS and may not be set by callers.
const RESERVED_TAG_PREFIX: &str = "aws:";

/// Read-only view of a remote DB snapshot.
///
/// Only the identifier, owning instance, creation time and status carry
/// meaning here. The remaining attributes are passed through untouched.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SnapshotRecord {
    /// Snapshot identifier, unique per account and region.
    pub db_snapshot_identifier: String,
    /// Identifier of the instance the snapshot was taken from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_instance_identifier: Option<String>,
    /// Creation time. Absent while the snapshot is still being created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_create_time: Option<DateTime<Utc>>,
    /// Remote status, e.g. `creating`, `available`, `failed`.
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_snapshot_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocated_storage: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iops: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_db_snapshot_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,
}

impl SnapshotRecord {
    /// Creates a record with only an identifier and status set.
    pub fn new(id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            db_snapshot_identifier: id.into(),
            status: status.into(),
            ..Default::default()
        }
    }

    /// Returns true once the snapshot can be used.
    pub fn is_available(&self) -> bool {
        self.status == STATUS_AVAILABLE
    }

    /// Returns true if the snapshot is in a status it will not leave by itself
    /// and that status is not `available`.
    pub fn is_failed(&self) -> bool {
        TERMINAL_FAILURE_STATUSES.contains(&self.status.as_str())
    }
}

/// Parameters of a CopyDBSnapshot call.
///
/// Optional fields are sent only when set. The remote API distinguishes an
/// unset field from an empty one, so `None` never becomes `""` or `false`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CopyRequest {
    pub source_db_snapshot_identifier: String,
    pub target_db_snapshot_identifier: String,
    pub source_region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_signed_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy_tags: Option<bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl CopyRequest {
    /// Creates a request with the three required fields set.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        source_region: impl Into<String>,
    ) -> Self {
        Self {
            source_db_snapshot_identifier: source.into(),
            target_db_snapshot_identifier: target.into(),
            source_region: source_region.into(),
            ..Default::default()
        }
    }

    pub fn destination_region(mut self, region: impl Into<String>) -> Self {
        self.destination_region = Some(region.into());
        self
    }

    pub fn kms_key_id(mut self, key: impl Into<String>) -> Self {
        self.kms_key_id = Some(key.into());
        self
    }

    pub fn option_group_name(mut self, name: impl Into<String>) -> Self {
        self.option_group_name = Some(name.into());
        self
    }

    pub fn pre_signed_url(mut self, url: impl Into<String>) -> Self {
        self.pre_signed_url = Some(url.into());
        self
    }

    pub fn copy_tags(mut self, copy: bool) -> Self {
        self.copy_tags = Some(copy);
        self
    }

    /// Adds a tag. Keys in the reserved `aws:` namespace are ignored.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if !key.starts_with(RESERVED_TAG_PREFIX) {
            self.tags.insert(key, value.into());
        }
        self
    }

    /// Checks the required fields and drops reserved tags that were set directly.
    pub(crate) fn validated(&self) -> Result<CopyRequest, String> {
        let required = [
            ("source snapshot identifier", &self.source_db_snapshot_identifier),
            ("target snapshot identifier", &self.target_db_snapshot_identifier),
            ("source region", &self.source_region),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(format!("{} must not be empty", name));
            }
        }

        let mut request = self.clone();
        request
            .tags
            .retain(|key, _| !key.starts_with(RESERVED_TAG_PREFIX));
        Ok(request)
    }
}

/// What the caller is looking for when resolving a single snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupCriteria {
    pub db_instance_identifier: Option<String>,
    pub db_snapshot_identifier: Option<String>,
    /// e.g. `automated`, `manual`, `shared`, `public`.
    pub snapshot_type: Option<String>,
    pub include_shared: bool,
    pub include_public: bool,
    /// Resolve several matches to the newest one instead of failing.
    pub most_recent: bool,
}

impl LookupCriteria {
    /// The instance identifier, if one was given. Blank counts as unset.
    pub fn instance_id(&self) -> Option<&str> {
        non_blank(&self.db_instance_identifier)
    }

    /// The snapshot identifier, if one was given. Blank counts as unset.
    pub fn snapshot_id(&self) -> Option<&str> {
        non_blank(&self.db_snapshot_identifier)
    }

    /// Returns true when the query reaches beyond the current account, where
    /// the remote side cannot match on instance identifier.
    pub fn crosses_account(&self) -> bool {
        matches!(self.snapshot_type.as_deref(), Some("public") | Some("shared"))
            || self.include_shared
            || self.include_public
    }

    /// Builds the remote query. The instance identifier is only sent when the
    /// remote side can match on it.
    pub fn to_query(&self) -> DescribeQuery {
        DescribeQuery {
            db_instance_identifier: if self.crosses_account() {
                None
            } else {
                self.instance_id().map(str::to_string)
            },
            db_snapshot_identifier: self.snapshot_id().map(str::to_string),
            snapshot_type: non_blank(&self.snapshot_type).map(str::to_string),
            include_shared: self.include_shared,
            include_public: self.include_public,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Criteria of a DescribeDBSnapshots call.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DescribeQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_instance_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_snapshot_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_type: Option<String>,
    #[serde(default)]
    pub include_shared: bool,
    #[serde(default)]
    pub include_public: bool,
}

/// Connection settings for the snapshot API.
///
/// # Example
///
/// ```
/// use rds_snapshot::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig {
///     endpoint: "http://localhost:4566".to_string(),
///     region: "eu-west-1".to_string(),
///     request_timeout: Duration::from_secs(10),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the snapshot API gateway.
    pub endpoint: String,
    /// Region all calls are made against.
    pub region: String,
    /// Timeout applied to each individual HTTP request.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:4566".to_string(),
            region: "us-east-1".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_request_omits_unset_fields() {
        let request = CopyRequest::new("src-1", "dst-1", "us-west-2");
        let json = serde_json::to_value(&request).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), 3);
        assert!(!object.contains_key("kms_key_id"));
        assert!(!object.contains_key("copy_tags"));
        assert!(!object.contains_key("tags"));
    }

    #[test]
    fn test_copy_request_sends_explicit_false() {
        let request = CopyRequest::new("src-1", "dst-1", "us-west-2").copy_tags(false);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["copy_tags"], serde_json::Value::Bool(false));
    }

    #[test]
    fn test_reserved_tags_are_dropped() {
        let mut request = CopyRequest::new("src-1", "dst-1", "us-west-2")
            .tag("aws:cloudformation:stack-name", "x")
            .tag("team", "data");
        assert_eq!(request.tags.len(), 1);

        request
            .tags
            .insert("aws:createdBy".to_string(), "y".to_string());
        let validated = request.validated().unwrap();
        assert_eq!(validated.tags.len(), 1);
        assert_eq!(validated.tags["team"], "data");
    }

    #[test]
    fn test_validation_requires_identifiers() {
        let request = CopyRequest::new("src-1", "  ", "us-west-2");
        let err = request.validated().unwrap_err();
        assert!(err.contains("target"));
    }

    #[test]
    fn test_instance_identifier_sent_only_within_account() {
        let criteria = LookupCriteria {
            db_instance_identifier: Some("db-1".to_string()),
            ..Default::default()
        };
        assert!(!criteria.crosses_account());
        assert_eq!(
            criteria.to_query().db_instance_identifier.as_deref(),
            Some("db-1")
        );

        let shared = LookupCriteria {
            include_shared: true,
            ..criteria.clone()
        };
        assert!(shared.crosses_account());
        assert_eq!(shared.to_query().db_instance_identifier, None);

        let public_type = LookupCriteria {
            snapshot_type: Some("public".to_string()),
            ..criteria
        };
        assert_eq!(public_type.to_query().db_instance_identifier, None);
    }

    #[test]
    fn test_blank_identifiers_are_not_sent() {
        let criteria = LookupCriteria {
            db_instance_identifier: Some(String::new()),
            db_snapshot_identifier: Some("  ".to_string()),
            snapshot_type: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(criteria.instance_id(), None);
        assert_eq!(criteria.snapshot_id(), None);

        let query = criteria.to_query();
        assert_eq!(query.db_instance_identifier, None);
        assert_eq!(query.db_snapshot_identifier, None);
        assert_eq!(query.snapshot_type, None);
    }

    #[test]
    fn test_record_status_helpers() {
        assert!(SnapshotRecord::new("a", "available").is_available());
        assert!(SnapshotRecord::new("a", "failed").is_failed());
        let creating = SnapshotRecord::new("a", "creating");
        assert!(!creating.is_available());
        assert!(!creating.is_failed());
    }

    #[test]
    fn test_record_parses_rfc3339_create_time() {
        let record: SnapshotRecord = serde_json::from_str(
            r#"{"db_snapshot_identifier":"snap","status":"available","snapshot_create_time":"2024-03-01T12:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(
            record.snapshot_create_time.unwrap().to_rfc3339(),
            "2024-03-01T12:00:00+00:00"
        );
        assert_eq!(record.db_instance_identifier, None);
    }
}
