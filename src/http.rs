//! `SnapshotApi` over the JSON snapshot gateway.

use crate::api::{ApiError, SnapshotApi};
use crate::error::SnapshotError;
use crate::types::{ClientConfig, CopyRequest, DescribeQuery, SnapshotRecord};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Error body returned by the gateway for non-2xx responses.
#[derive(Deserialize, Debug)]
struct ErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize, Debug)]
struct CopyResponse {
    snapshot: SnapshotRecord,
}

#[derive(Deserialize, Debug)]
struct DescribePage {
    #[serde(default)]
    snapshots: Vec<SnapshotRecord>,
    #[serde(default)]
    marker: Option<String>,
}

#[derive(Serialize)]
struct PageQuery<'a> {
    #[serde(flatten)]
    query: &'a DescribeQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    marker: Option<&'a str>,
}

/// Snapshot API client talking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSnapshotApi {
    client: Client,
    base: Url,
}

impl HttpSnapshotApi {
    /// Builds a client for the region in `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, SnapshotError> {
        let mut base = Url::parse(&config.endpoint).map_err(|e| {
            SnapshotError::InvalidInput(format!("invalid endpoint '{}': {}", config.endpoint, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(SnapshotError::InvalidInput(format!(
                "endpoint '{}' cannot be used as a base URL",
                config.endpoint
            )));
        }
        if config.region.trim().is_empty() {
            return Err(SnapshotError::InvalidInput(
                "region must not be empty".to_string(),
            ));
        }
        if let Ok(mut segments) = base.path_segments_mut() {
            segments.pop_if_empty().extend(["regions", config.region.as_str()]);
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(SnapshotError::ClientSetup)?;

        Ok(Self { client, base })
    }

    /// Appends percent-encoded path segments to the regional base URL.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }
}

/// Turns a non-2xx response into a classified error.
async fn error_from_response(response: Response) -> ApiError {
    let status = response.status();
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => return ApiError::Transport(e),
    };

    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => ApiError::from_code(&body.code, body.message),
        Err(_) if status.as_u16() == 404 => ApiError::NotFound(format!("HTTP {}", status)),
        Err(_) => ApiError::Service {
            code: format!("HTTP {}", status.as_u16()),
            message: text,
        },
    }
}

async fn check(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(error_from_response(response).await)
    }
}

#[async_trait]
impl SnapshotApi for HttpSnapshotApi {
    async fn copy_snapshot(&self, request: &CopyRequest) -> Result<SnapshotRecord, ApiError> {
        let url = self.url(&["snapshots", "copy"]);
        info!("Submitting snapshot copy to {}", url);

        let response = self.client.post(url).json(request).send().await?;
        let body = check(response).await?.text().await?;
        let copied: CopyResponse = serde_json::from_str(&body)?;
        Ok(copied.snapshot)
    }

    async fn describe_snapshot(&self, id: &str) -> Result<SnapshotRecord, ApiError> {
        let url = self.url(&["snapshots", id]);
        debug!("Describing snapshot at {}", url);

        let response = self.client.get(url).send().await?;
        let body = check(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn describe_snapshots(
        &self,
        query: &DescribeQuery,
    ) -> Result<Vec<SnapshotRecord>, ApiError> {
        let url = self.url(&["snapshots"]);
        let mut snapshots = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let page_query = PageQuery {
                query,
                marker: marker.as_deref(),
            };
            let response = self.client.get(url.clone()).query(&page_query).send().await?;
            let body = check(response).await?.text().await?;
            let page: DescribePage = serde_json::from_str(&body)?;

            debug!(page_size = page.snapshots.len(), "Received snapshot page");
            snapshots.extend(page.snapshots);

            match page.marker {
                Some(next) if !next.is_empty() && marker.as_deref() != Some(next.as_str()) => {
                    marker = Some(next)
                }
                Some(next) if !next.is_empty() => {
                    warn!(marker = %next, "Snapshot listing repeated its marker, stopping");
                    break;
                }
                _ => break,
            }
        }

        Ok(snapshots)
    }

    async fn delete_snapshot(&self, id: &str) -> Result<(), ApiError> {
        let url = self.url(&["snapshots", id]);
        debug!("Deleting snapshot at {}", url);

        let response = self.client.delete(url).send().await?;
        check(response).await?;
        Ok(())
    }
}
