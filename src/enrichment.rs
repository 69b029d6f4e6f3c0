//! Lead enrichment against the profile-collection provider.
//!
//! Flow for one lead:
//! 1. Resolve a usable LinkedIn URL (skip otherwise)
//! 2. Serve from the profile cache when possible
//! 3. Trigger a collection job and record it as pending
//! 4. Poll progress until ready, failed, or out of attempts
//! 5. Download the snapshot and merge the first record into the lead
//!
//! Any failure leaves the lead untouched. The caller always gets a lead back.

use crate::brightdata_client::{BrightDataClient, ProfileRecord, SnapshotStatus};
use crate::circuit_breaker::{create_enrichment_circuit_breaker, EnrichmentBreaker};
use crate::config::Config;
use crate::errors::AppError;
use crate::insights::merge_profile;
use crate::jobs::EnrichmentJobTable;
use crate::models::{EnrichmentStatus, Lead};
use crate::profile_cache::ProfileCache;
use failsafe::futures::CircuitBreaker;
use std::time::Duration;

/// Returns the lead's LinkedIn URL if it is a well-formed http(s) URL with a host.
pub fn usable_profile_url(lead: &Lead) -> Option<String> {
    let raw = lead.linkedin_url()?;
    let parsed = url::Url::parse(raw).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return None;
    }
    Some(raw.to_string())
}

#[derive(Clone)]
pub struct LeadEnricher {
    client: Option<BrightDataClient>,
    cache: ProfileCache,
    jobs: EnrichmentJobTable,
    breaker: EnrichmentBreaker,
    poll_interval: Duration,
    max_polls: u32,
    timeout: Duration,
}

impl LeadEnricher {
    pub fn new(
        client: Option<BrightDataClient>,
        cache: ProfileCache,
        jobs: EnrichmentJobTable,
        config: &Config,
    ) -> Self {
        Self {
            client,
            cache,
            jobs,
            breaker: create_enrichment_circuit_breaker(),
            poll_interval: Duration::from_millis(config.enrichment_poll_interval_ms),
            max_polls: config.enrichment_max_polls.max(1),
            timeout: Duration::from_secs(config.enrichment_timeout_secs),
        }
    }

    /// Enricher with a fresh cache and job table.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let client = BrightDataClient::from_config(config)?;
        if client.is_none() {
            tracing::warn!("BRIGHTDATA_API_KEY not configured, leads will pass through unenriched");
        }
        Ok(Self::new(
            client,
            ProfileCache::default(),
            EnrichmentJobTable::default(),
            config,
        ))
    }

    pub fn jobs(&self) -> &EnrichmentJobTable {
        &self.jobs
    }

    pub fn cache(&self) -> &ProfileCache {
        &self.cache
    }

    /// Enriches one lead. Never fails: on any problem the input comes back unchanged.
    pub async fn enrich(&self, lead: &Lead) -> Lead {
        self.enrich_with_status(lead).await.0
    }

    /// Like [`LeadEnricher::enrich`], also reporting what happened to the lead.
    pub async fn enrich_with_status(&self, lead: &Lead) -> (Lead, EnrichmentStatus) {
        let Some(ref client) = self.client else {
            tracing::warn!("Enrichment skipped for {}: provider key not configured", lead.id);
            return (
                lead.clone(),
                EnrichmentStatus::skipped("enrichment provider not configured"),
            );
        };

        let Some(profile_url) = usable_profile_url(lead) else {
            tracing::warn!("Enrichment skipped for {}: no usable LinkedIn URL", lead.id);
            return (
                lead.clone(),
                EnrichmentStatus::skipped("no usable LinkedIn profile URL"),
            );
        };

        if let Some(record) = self.cache.get(&profile_url).await {
            tracing::info!("✅ Using cached profile for lead {}", lead.id);
            let merged = merge_profile(lead, &record);
            self.jobs
                .complete_cached(lead, &profile_url, merged.clone())
                .await;
            return (merged, EnrichmentStatus::Cached);
        }

        tracing::info!("🔍 Enriching lead {} from {}", lead.id, profile_url);

        let outcome = tokio::time::timeout(
            self.timeout,
            self.breaker.call(self.collect(client, lead, &profile_url)),
        )
        .await;

        let reason = match outcome {
            Ok(Ok(record)) => {
                self.cache.insert(&profile_url, &record).await;
                let merged = merge_profile(lead, &record);
                self.jobs.complete(&lead.id, merged.clone()).await;
                tracing::info!("✓ Lead {} enriched", lead.id);
                return (merged, EnrichmentStatus::Enriched);
            }
            Ok(Err(failsafe::Error::Rejected)) => "enrichment provider circuit open".to_string(),
            Ok(Err(failsafe::Error::Inner(e))) => e.to_string(),
            Err(_) => format!("enrichment timed out after {}s", self.timeout.as_secs()),
        };

        tracing::warn!("✗ Enrichment failed for lead {}: {}", lead.id, reason);
        self.jobs.fail(lead, &profile_url, &reason).await;
        (lead.clone(), EnrichmentStatus::failed(reason))
    }

    /// Runs one collection job to completion and returns the first record.
    async fn collect(
        &self,
        client: &BrightDataClient,
        lead: &Lead,
        profile_url: &str,
    ) -> Result<ProfileRecord, AppError> {
        let snapshot_id = client.trigger(profile_url).await?;
        self.jobs.submit(lead, profile_url, &snapshot_id).await;

        for attempt in 1..=self.max_polls {
            match client.progress(&snapshot_id).await? {
                SnapshotStatus::Ready => {
                    let records = client.snapshot(&snapshot_id).await?;
                    return records.into_iter().next().ok_or_else(|| {
                        AppError::ExternalApiError(format!(
                            "Snapshot {} contained no records",
                            snapshot_id
                        ))
                    });
                }
                SnapshotStatus::Failed => {
                    return Err(AppError::ExternalApiError(format!(
                        "Provider reported snapshot {} as failed",
                        snapshot_id
                    )));
                }
                SnapshotStatus::Running => {
                    // The completion webhook may have delivered the record already
                    if let Some(record) = self.cache.get(profile_url).await {
                        tracing::debug!("Snapshot {} delivered via webhook", snapshot_id);
                        return Ok(record);
                    }
                    tracing::debug!(
                        "Snapshot {} still running (poll {}/{})",
                        snapshot_id,
                        attempt,
                        self.max_polls
                    );
                    if attempt < self.max_polls {
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
            }
        }

        Err(AppError::Timeout(format!(
            "Snapshot {} not ready after {} polls",
            snapshot_id, self.max_polls
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProspectType, SocialLinks};

    fn lead_with_linkedin(url: Option<&str>) -> Lead {
        Lead {
            id: "lead-0-1".into(),
            company_name: "Example Capital".into(),
            contact_person: "Asha Rao".into(),
            title: "CFO".into(),
            email: "verified@leadflow.ai".into(),
            location: "Mumbai".into(),
            tech_stack: vec![],
            revenue: "TBD".into(),
            enrichment_score: 85,
            last_signal: "Verified LinkedIn Profile Found".into(),
            social_score: 80,
            website: None,
            source_url: Some("https://www.linkedin.com/in/asha".into()),
            social_links: url.map(|u| SocialLinks {
                linkedin: Some(u.to_string()),
                ..Default::default()
            }),
            description: None,
            prospect_type: ProspectType::B2B,
            visual_analysis: None,
            behavioral_insights: None,
            social_data: None,
        }
    }

    fn offline_enricher() -> LeadEnricher {
        let client = BrightDataClient::new(
            "http://127.0.0.1:9".into(),
            "key".into(),
            "gd_test".into(),
            None,
            Duration::from_millis(200),
        )
        .unwrap();
        LeadEnricher::new(
            Some(client),
            ProfileCache::default(),
            EnrichmentJobTable::default(),
            &Config::default(),
        )
    }

    #[test]
    fn test_usable_profile_url() {
        assert_eq!(
            usable_profile_url(&lead_with_linkedin(Some(" https://linkedin.com/in/a "))),
            Some("https://linkedin.com/in/a".to_string())
        );
        assert_eq!(usable_profile_url(&lead_with_linkedin(Some("linkedin.com/in/a"))), None);
        assert_eq!(usable_profile_url(&lead_with_linkedin(Some("ftp://x.com/a"))), None);
        // sourceUrl alone is not an enrichment key
        assert_eq!(usable_profile_url(&lead_with_linkedin(None)), None);
    }

    #[tokio::test]
    async fn test_without_provider_key_lead_passes_through() {
        let enricher = LeadEnricher::from_config(&Config::default()).unwrap();
        let lead = lead_with_linkedin(Some("https://linkedin.com/in/a"));

        let (out, status) = enricher.enrich_with_status(&lead).await;
        assert_eq!(out, lead);
        assert!(matches!(status, EnrichmentStatus::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_cached_profile_served_without_provider_call() {
        let enricher = offline_enricher();
        let lead = lead_with_linkedin(Some("https://linkedin.com/in/a"));
        let record = ProfileRecord {
            about: Some("Cached bio".into()),
            ..Default::default()
        };
        enricher
            .cache()
            .insert("https://www.linkedin.com/in/a/", &record)
            .await;

        let (out, status) = enricher.enrich_with_status(&lead).await;
        assert_eq!(status, EnrichmentStatus::Cached);
        assert_eq!(out.social_data.as_ref().unwrap().bio, "Cached bio");

        let job = enricher.jobs().get(&lead.id).await.unwrap();
        assert_eq!(job.state, crate::jobs::JobState::Complete);
        assert_eq!(job.result, Some(out));
    }

    #[tokio::test]
    async fn test_unreachable_provider_marks_job_failed() {
        let enricher = offline_enricher();
        let lead = lead_with_linkedin(Some("https://linkedin.com/in/a"));

        let (out, status) = enricher.enrich_with_status(&lead).await;
        assert_eq!(out, lead);
        assert!(matches!(status, EnrichmentStatus::Failed { .. }));

        let job = enricher.jobs().get(&lead.id).await.unwrap();
        assert_eq!(job.state, crate::jobs::JobState::Failed);
    }
}
