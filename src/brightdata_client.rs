use crate::config::Config;
use crate::errors::AppError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

// ============ Provider records ============

/// One scraped profile as returned in a dataset snapshot.
///
/// Every field is optional; aliases accept the provider's alternate field names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileRecord {
    pub name: Option<String>,
    #[serde(alias = "position")]
    pub headline: Option<String>,
    pub about: Option<String>,
    #[serde(alias = "city")]
    pub location: Option<String>,
    #[serde(alias = "avatar")]
    pub profile_pic: Option<String>,
    #[serde(alias = "banner_image")]
    pub background_pic: Option<String>,
    pub followers: Option<u64>,
    pub experience: Vec<Value>,
    pub posts: Vec<ProfilePost>,
    pub education: Vec<Value>,
    pub skills: Vec<String>,
    /// Collection time reported by the provider.
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilePost {
    #[serde(alias = "title")]
    pub text: String,
    pub images: Vec<String>,
    pub likes: u64,
    #[serde(alias = "created_at")]
    pub date: String,
}

/// Collection state of a triggered snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotStatus {
    Running,
    Ready,
    Failed,
}

impl SnapshotStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ready" | "done" | "complete" | "completed" => SnapshotStatus::Ready,
            "failed" | "error" | "canceled" | "cancelled" => SnapshotStatus::Failed,
            _ => SnapshotStatus::Running,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TriggerResponse {
    snapshot_id: String,
}

#[derive(Debug, Deserialize)]
struct ProgressResponse {
    status: String,
}

// ============ Dataset API client ============

/// Client for the profile-enrichment provider's asynchronous dataset API.
///
/// Collection is a three-step job: `trigger` submits the profile URL and returns a snapshot id,
/// `progress` reports collection state, and `snapshot` downloads the finished records.
#[derive(Clone)]
pub struct BrightDataClient {
    client: Client,
    base_url: String,
    api_key: String,
    dataset_id: String,
    webhook_url: Option<String>,
}

impl BrightDataClient {
    pub fn new(
        base_url: String,
        api_key: String,
        dataset_id: String,
        webhook_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::InternalError(format!("Failed to create Bright Data client: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            dataset_id,
            webhook_url,
        })
    }

    /// Builds a client from configuration, or `None` when no API key is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, AppError> {
        let Some(ref api_key) = config.brightdata_api_key else {
            return Ok(None);
        };

        Self::new(
            config.brightdata_base_url.clone(),
            api_key.clone(),
            config.brightdata_dataset_id.clone(),
            config.brightdata_webhook_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
        .map(Some)
    }

    /// Submits a collection job for one profile URL and returns its snapshot id.
    pub async fn trigger(&self, profile_url: &str) -> Result<String, AppError> {
        let mut params: Vec<(&str, &str)> = vec![("dataset_id", self.dataset_id.as_str())];
        if let Some(ref webhook) = self.webhook_url {
            params.push(("endpoint", webhook.as_str()));
            params.push(("format", "json"));
        }

        // Encode parameters instead of formatting them into the path
        let url = reqwest::Url::parse_with_params(
            &format!("{}/datasets/v3/trigger", self.base_url),
            &params,
        )
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        tracing::info!("Triggering profile collection for: {}", profile_url);

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&json!([{ "url": profile_url }]))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Bright Data trigger returned status {}: {}",
                status, error_text
            )));
        }

        let trigger: TriggerResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse trigger response: {}", e))
        })?;

        tracing::debug!("Collection job submitted: snapshot_id={}", trigger.snapshot_id);
        Ok(trigger.snapshot_id)
    }

    /// Reads the collection state of a snapshot.
    pub async fn progress(&self, snapshot_id: &str) -> Result<SnapshotStatus, AppError> {
        let url = format!("{}/datasets/v3/progress/{}", self.base_url, snapshot_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApiError(format!(
                "Bright Data progress returned status {} for snapshot {}",
                status, snapshot_id
            )));
        }

        let progress: ProgressResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse progress response: {}", e))
        })?;

        Ok(SnapshotStatus::parse(&progress.status))
    }

    /// Downloads the records of a finished snapshot.
    pub async fn snapshot(&self, snapshot_id: &str) -> Result<Vec<ProfileRecord>, AppError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/datasets/v3/snapshot/{}", self.base_url, snapshot_id),
            &[("format", "json")],
        )
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Bright Data snapshot returned status {}: {}",
                status, error_text
            )));
        }

        let records: Vec<ProfileRecord> = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse snapshot records: {}", e))
        })?;

        tracing::info!(
            "Snapshot {} delivered {} record(s)",
            snapshot_id,
            records.len()
        );
        Ok(records)
    }
}
