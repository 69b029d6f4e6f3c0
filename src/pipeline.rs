//! Discovery → enrichment coordination.
//!
//! One run moves through `Idle → Searching → Scraping → Idle` and reports each stage to the
//! caller as a [`PipelineUpdate`]. Enrichment fans out one future per lead and the final
//! update lists leads in discovery order.

use crate::discovery::{DiscoveryOutcome, ProspectDiscoverer};
use crate::enrichment::LeadEnricher;
use crate::models::{CohortSelection, EnrichmentStatus, Icp, Lead, PipelineStage};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::mpsc;

/// Every run emits at most four updates.
const UPDATE_BUFFER: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSummary {
    pub discovered: usize,
    pub enriched: usize,
    pub cached: usize,
    pub skipped: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_degraded: Option<String>,
}

impl PipelineSummary {
    fn tally(statuses: &[EnrichmentStatus], discovery_degraded: Option<String>) -> Self {
        let mut summary = Self {
            discovered: statuses.len(),
            discovery_degraded,
            ..Default::default()
        };
        for status in statuses {
            match status {
                EnrichmentStatus::Enriched => summary.enriched += 1,
                EnrichmentStatus::Cached => summary.cached += 1,
                EnrichmentStatus::Skipped { .. } => summary.skipped += 1,
                EnrichmentStatus::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

/// Stage transition with the leads known at that point.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineUpdate {
    pub stage: PipelineStage,
    pub leads: Vec<Lead>,
    /// Present on the final update only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<PipelineSummary>,
}

impl PipelineUpdate {
    fn new(stage: PipelineStage, leads: Vec<Lead>) -> Self {
        Self {
            stage,
            leads,
            summary: None,
        }
    }

    fn finished(leads: Vec<Lead>, summary: PipelineSummary) -> Self {
        Self {
            stage: PipelineStage::Idle,
            leads,
            summary: Some(summary),
        }
    }

    pub fn is_final(&self) -> bool {
        self.summary.is_some()
    }
}

/// Final result of a run, for callers that do not watch stages.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub leads: Vec<Lead>,
    pub statuses: Vec<EnrichmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_degraded: Option<String>,
}

impl PipelineReport {
    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary::tally(&self.statuses, self.discovery_degraded.clone())
    }
}

#[derive(Clone)]
pub struct PipelineCoordinator {
    discoverer: ProspectDiscoverer,
    enricher: LeadEnricher,
}

impl PipelineCoordinator {
    pub fn new(discoverer: ProspectDiscoverer, enricher: LeadEnricher) -> Self {
        Self {
            discoverer,
            enricher,
        }
    }

    /// Starts a run on its own task and returns the stream of stage updates.
    ///
    /// The stream ends after the final `Idle` update. Runs cannot be cancelled; dropping the
    /// receiver only stops the updates.
    pub fn run_pipeline(&self, icp: Icp, cohort: CohortSelection) -> mpsc::Receiver<PipelineUpdate> {
        let (tx, rx) = mpsc::channel(UPDATE_BUFFER);
        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator.drive(icp, cohort, tx).await;
        });
        rx
    }

    /// Runs the pipeline inline and returns only the final result.
    pub async fn run_to_completion(&self, icp: &Icp, cohort: &CohortSelection) -> PipelineReport {
        let (tx, _rx) = mpsc::channel(UPDATE_BUFFER);
        self.drive(icp.clone(), cohort.clone(), tx).await
    }

    async fn drive(
        &self,
        icp: Icp,
        cohort: CohortSelection,
        tx: mpsc::Sender<PipelineUpdate>,
    ) -> PipelineReport {
        emit(&tx, PipelineUpdate::new(PipelineStage::Searching, Vec::new())).await;

        // Discovery runs on its own task so a panic there ends the run instead of the caller
        let discoverer = self.discoverer.clone();
        let search = tokio::spawn(async move { discoverer.discover_outcome(&icp, &cohort).await });

        let DiscoveryOutcome { leads, degraded } = match search.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Discovery task aborted: {}", e);
                let report = PipelineReport {
                    leads: Vec::new(),
                    statuses: Vec::new(),
                    discovery_degraded: Some(format!("discovery aborted: {}", e)),
                };
                emit(&tx, PipelineUpdate::finished(Vec::new(), report.summary())).await;
                return report;
            }
        };

        emit(&tx, PipelineUpdate::new(PipelineStage::Searching, leads.clone())).await;

        if leads.is_empty() {
            tracing::info!("No prospects discovered, nothing to enrich");
            let report = PipelineReport {
                leads,
                statuses: Vec::new(),
                discovery_degraded: degraded,
            };
            emit(&tx, PipelineUpdate::finished(Vec::new(), report.summary())).await;
            return report;
        }

        emit(&tx, PipelineUpdate::new(PipelineStage::Scraping, leads.clone())).await;
        tracing::info!("Enriching {} lead(s) concurrently", leads.len());

        let results = join_all(
            leads
                .iter()
                .map(|lead| self.enricher.enrich_with_status(lead)),
        )
        .await;

        let (leads, statuses): (Vec<Lead>, Vec<EnrichmentStatus>) = results.into_iter().unzip();
        let report = PipelineReport {
            leads,
            statuses,
            discovery_degraded: degraded,
        };
        let summary = report.summary();
        tracing::info!(
            "Pipeline finished: {} enriched, {} cached, {} skipped, {} failed",
            summary.enriched,
            summary.cached,
            summary.skipped,
            summary.failed
        );

        emit(&tx, PipelineUpdate::finished(report.leads.clone(), summary)).await;
        report
    }
}

async fn emit(tx: &mpsc::Sender<PipelineUpdate>, update: PipelineUpdate) {
    tracing::debug!("Pipeline stage {:?} ({} leads)", update.stage, update.leads.len());
    if tx.send(update).await.is_err() {
        tracing::debug!("Pipeline update receiver dropped");
    }
}
