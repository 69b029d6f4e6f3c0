//! Job-state table for asynchronous enrichment.
//!
//! A job is created when the provider accepts a collection request and hands back a snapshot
//! id. The id is the correlation key for both the poller and the completion webhook.

use crate::models::Lead;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentJob {
    pub lead_id: String,
    pub profile_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    pub state: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Lead as it was when the job was submitted.
    pub lead: Lead,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Lead>,
}

#[derive(Clone)]
pub struct EnrichmentJobTable {
    jobs: Cache<String, EnrichmentJob>,
    /// snapshot id -> lead id
    by_snapshot: Cache<String, String>,
}

impl EnrichmentJobTable {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            jobs: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(max_capacity)
                .build(),
            by_snapshot: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(max_capacity)
                .build(),
        }
    }

    /// Records a pending job for `lead` correlated by `snapshot_id`.
    pub async fn submit(&self, lead: &Lead, profile_url: &str, snapshot_id: &str) {
        let now = Utc::now();
        let job = EnrichmentJob {
            lead_id: lead.id.clone(),
            profile_url: profile_url.to_string(),
            snapshot_id: Some(snapshot_id.to_string()),
            state: JobState::Pending,
            error: None,
            submitted_at: now,
            updated_at: now,
            lead: lead.clone(),
            result: None,
        };

        self.by_snapshot
            .insert(snapshot_id.to_string(), lead.id.clone())
            .await;
        self.jobs.insert(lead.id.clone(), job).await;
        tracing::debug!(lead_id = %lead.id, snapshot_id, "Enrichment job pending");
    }

    pub async fn complete(&self, lead_id: &str, enriched: Lead) {
        let Some(mut job) = self.jobs.get(lead_id).await else {
            tracing::debug!(lead_id, "No enrichment job to complete");
            return;
        };
        job.state = JobState::Complete;
        job.error = None;
        job.updated_at = Utc::now();
        job.result = Some(enriched);
        self.jobs.insert(lead_id.to_string(), job).await;
        tracing::debug!(lead_id, "Enrichment job complete");
    }

    /// Records a lead served from the profile cache as complete, without a snapshot.
    pub async fn complete_cached(&self, lead: &Lead, profile_url: &str, enriched: Lead) {
        let now = Utc::now();
        let job = match self.jobs.get(&lead.id).await {
            Some(mut job) => {
                job.profile_url = profile_url.to_string();
                // Detach any in-flight snapshot so its late webhook is ignored
                job.snapshot_id = None;
                job.state = JobState::Complete;
                job.error = None;
                job.updated_at = now;
                job.result = Some(enriched);
                job
            }
            None => EnrichmentJob {
                lead_id: lead.id.clone(),
                profile_url: profile_url.to_string(),
                snapshot_id: None,
                state: JobState::Complete,
                error: None,
                submitted_at: now,
                updated_at: now,
                lead: lead.clone(),
                result: Some(enriched),
            },
        };
        self.jobs.insert(lead.id.clone(), job).await;
        tracing::debug!(lead_id = %lead.id, "Enrichment job complete from cache");
    }

    /// Marks a job failed, creating the entry if the failure happened before submission.
    pub async fn fail(&self, lead: &Lead, profile_url: &str, reason: &str) {
        let now = Utc::now();
        let job = match self.jobs.get(&lead.id).await {
            Some(mut job) => {
                job.state = JobState::Failed;
                job.error = Some(reason.to_string());
                job.updated_at = now;
                job
            }
            None => EnrichmentJob {
                lead_id: lead.id.clone(),
                profile_url: profile_url.to_string(),
                snapshot_id: None,
                state: JobState::Failed,
                error: Some(reason.to_string()),
                submitted_at: now,
                updated_at: now,
                lead: lead.clone(),
                result: None,
            },
        };
        self.jobs.insert(lead.id.clone(), job).await;
        tracing::debug!(lead_id = %lead.id, reason, "Enrichment job failed");
    }

    pub async fn get(&self, lead_id: &str) -> Option<EnrichmentJob> {
        self.jobs.get(lead_id).await
    }

    pub async fn find_by_snapshot(&self, snapshot_id: &str) -> Option<EnrichmentJob> {
        let lead_id = self.by_snapshot.get(snapshot_id).await?;
        self.jobs.get(&lead_id).await
    }
}

impl Default for EnrichmentJobTable {
    /// Jobs are kept for a day.
    fn default() -> Self {
        Self::new(Duration::from_secs(86_400), 50_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProspectType;

    fn lead(id: &str) -> Lead {
        Lead {
            id: id.to_string(),
            company_name: "Example Capital".into(),
            contact_person: "Asha Rao".into(),
            title: "CFO".into(),
            email: String::new(),
            location: "Mumbai".into(),
            tech_stack: vec![],
            revenue: "TBD".into(),
            enrichment_score: 85,
            last_signal: String::new(),
            social_score: 80,
            website: None,
            source_url: None,
            social_links: None,
            description: None,
            prospect_type: ProspectType::B2B,
            visual_analysis: None,
            behavioral_insights: None,
            social_data: None,
        }
    }

    #[tokio::test]
    async fn test_pending_then_complete() {
        let table = EnrichmentJobTable::default();
        let l = lead("lead-0");
        table.submit(&l, "https://linkedin.com/in/a", "s_1").await;

        let job = table.find_by_snapshot("s_1").await.unwrap();
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.lead_id, "lead-0");

        let mut enriched = l.clone();
        enriched.description = Some("done".into());
        table.complete("lead-0", enriched.clone()).await;

        let job = table.get("lead-0").await.unwrap();
        assert_eq!(job.state, JobState::Complete);
        assert_eq!(job.result, Some(enriched));
    }

    #[tokio::test]
    async fn test_fail_without_prior_submission() {
        let table = EnrichmentJobTable::default();
        table
            .fail(&lead("lead-1"), "https://linkedin.com/in/b", "trigger rejected")
            .await;

        let job = table.get("lead-1").await.unwrap();
        assert_eq!(job.state, JobState::Failed);
        assert_eq!(job.snapshot_id, None);
        assert_eq!(job.error.as_deref(), Some("trigger rejected"));
    }

    #[tokio::test]
    async fn test_cached_completion_creates_job() {
        let table = EnrichmentJobTable::default();
        let l = lead("lead-2");
        let mut enriched = l.clone();
        enriched.description = Some("from cache".into());

        table
            .complete_cached(&l, "https://linkedin.com/in/c", enriched.clone())
            .await;

        let job = table.get("lead-2").await.unwrap();
        assert_eq!(job.state, JobState::Complete);
        assert_eq!(job.snapshot_id, None);
        assert_eq!(job.result, Some(enriched));
    }

    #[tokio::test]
    async fn test_unknown_snapshot() {
        let table = EnrichmentJobTable::default();
        assert!(table.find_by_snapshot("missing").await.is_none());
        table.complete("missing", lead("missing")).await;
        assert!(table.get("missing").await.is_none());
    }
}
