use crate::models::{CohortSelection, Icp, Lead, PipelineStage};
use crate::pipeline::{PipelineCoordinator, PipelineSummary};
use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Latest known state of one pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    pub run_id: Uuid,
    pub stage: PipelineStage,
    pub leads: Vec<Lead>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<PipelineSummary>,
    pub finished: bool,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Pipeline runs started over HTTP, polled by id.
#[derive(Clone)]
pub struct RunRegistry {
    runs: Cache<Uuid, RunSnapshot>,
}

impl RunRegistry {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            runs: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(max_capacity)
                .build(),
        }
    }

    /// Starts a run and records every stage update under a fresh id.
    pub async fn start(
        &self,
        coordinator: &PipelineCoordinator,
        icp: Icp,
        cohort: CohortSelection,
    ) -> Uuid {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        self.runs
            .insert(
                run_id,
                RunSnapshot {
                    run_id,
                    stage: PipelineStage::Idle,
                    leads: Vec::new(),
                    summary: None,
                    finished: false,
                    started_at,
                    updated_at: started_at,
                },
            )
            .await;

        let mut updates = coordinator.run_pipeline(icp, cohort);
        let runs = self.runs.clone();
        tokio::spawn(async move {
            while let Some(update) = updates.recv().await {
                let finished = update.is_final();
                runs.insert(
                    run_id,
                    RunSnapshot {
                        run_id,
                        stage: update.stage,
                        leads: update.leads,
                        summary: update.summary,
                        finished,
                        started_at,
                        updated_at: Utc::now(),
                    },
                )
                .await;
            }
            tracing::info!("Pipeline run {} finished", run_id);
        });

        tracing::info!("Pipeline run {} started", run_id);
        run_id
    }

    pub async fn get(&self, run_id: &Uuid) -> Option<RunSnapshot> {
        self.runs.get(run_id).await
    }
}

impl Default for RunRegistry {
    /// Runs are kept for an hour.
    fn default() -> Self {
        Self::new(Duration::from_secs(3600), 1_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::discovery::ProspectDiscoverer;
    use crate::enrichment::LeadEnricher;
    use crate::profile::fallback_icp;

    #[tokio::test]
    async fn test_run_reaches_finished_snapshot() {
        let config = Config::default();
        let coordinator = PipelineCoordinator::new(
            ProspectDiscoverer::new(None, 10),
            LeadEnricher::from_config(&config).unwrap(),
        );
        let registry = RunRegistry::default();
        let cohort = CohortSelection {
            industry: "Fintech".into(),
            geography: "Mumbai".into(),
            persona: "CFO".into(),
        };

        let run_id = registry.start(&coordinator, fallback_icp(), cohort).await;

        let mut snapshot = registry.get(&run_id).await.unwrap();
        for _ in 0..50 {
            if snapshot.finished {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            snapshot = registry.get(&run_id).await.unwrap();
        }

        assert!(snapshot.finished);
        assert_eq!(snapshot.stage, PipelineStage::Idle);
        assert!(snapshot.summary.unwrap().discovery_degraded.is_some());
        assert!(registry.get(&Uuid::new_v4()).await.is_none());
    }
}
