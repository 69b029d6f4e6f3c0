use crate::cohort::{available_view_modes, compile_options, default_view_mode, CohortOptions};
use crate::config::Config;
use crate::discovery::{DiscoveryOutcome, ProspectDiscoverer};
use crate::enrichment::LeadEnricher;
use crate::errors::AppError;
use crate::gemini_client::GeminiClient;
use crate::jobs::EnrichmentJob;
use crate::models::{filter_leads, CohortSelection, EnrichmentStatus, Icp, Lead, ViewMode};
use crate::pipeline::PipelineCoordinator;
use crate::profile::ProfileSynthesizer;
use crate::runs::{RunRegistry, RunSnapshot};
use crate::webhook_handler;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    pub synthesizer: ProfileSynthesizer,
    pub discoverer: ProspectDiscoverer,
    /// Owns the profile cache and the enrichment job table.
    pub enricher: LeadEnricher,
    pub coordinator: PipelineCoordinator,
    /// Pipeline runs started over HTTP (1 hour TTL).
    pub runs: RunRegistry,
}

impl AppState {
    /// Wires every component from configuration. Missing provider keys degrade the owning
    /// component; they never fail startup.
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let gemini = GeminiClient::from_config(&config)?;
        let synthesizer = ProfileSynthesizer::new(gemini.clone());
        let discoverer = ProspectDiscoverer::new(gemini, config.discovery_target);
        let enricher = LeadEnricher::from_config(&config)?;
        let coordinator = PipelineCoordinator::new(discoverer.clone(), enricher.clone());

        Ok(Self {
            config,
            synthesizer,
            discoverer,
            enricher,
            coordinator,
            runs: RunRegistry::default(),
        })
    }
}

/// Every `/api/v1` route. Protection layers are added by the server binary.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/icp", post(synthesize_icp))
        .route("/api/v1/cohorts/options", post(cohort_options))
        .route("/api/v1/prospects/discover", post(discover_prospects))
        .route("/api/v1/leads/enrich", post(enrich_lead))
        .route("/api/v1/pipeline/runs", post(start_pipeline_run))
        .route("/api/v1/pipeline/runs/:id", get(get_pipeline_run))
        .route("/api/v1/enrichment/jobs/:lead_id", get(get_enrichment_job))
        .route(
            "/api/v1/webhooks/enrichment",
            post(webhook_handler::enrichment_webhook),
        )
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "leadflow-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    pub url: String,
}

/// POST /api/v1/icp
///
/// Synthesizes the Ideal Customer Profile of a company website. Analysis failures map to
/// 502 with `retryable: true`.
pub async fn synthesize_icp(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SynthesizeRequest>,
) -> Result<Json<Icp>, AppError> {
    let icp = state.synthesizer.synthesize(&request.url).await?;
    Ok(Json(icp))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortOptionsRequest {
    pub icp: Icp,
    #[serde(default)]
    pub view_mode: Option<ViewMode>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortOptionsResponse {
    pub options: CohortOptions,
    pub default_selection: CohortSelection,
    pub available_view_modes: Vec<ViewMode>,
}

/// POST /api/v1/cohorts/options
///
/// Projects an ICP into cohort options. Without `viewMode` the ICP's natural view is used.
pub async fn cohort_options(
    Json(request): Json<CohortOptionsRequest>,
) -> Result<Json<CohortOptionsResponse>, AppError> {
    let view_mode = request
        .view_mode
        .unwrap_or_else(|| default_view_mode(&request.icp));

    let options = compile_options(&request.icp, view_mode).ok_or_else(|| {
        AppError::NotFound(format!("ICP has no cohort options for {:?}", view_mode))
    })?;

    Ok(Json(CohortOptionsResponse {
        default_selection: options.default_selection(),
        available_view_modes: available_view_modes(&request.icp),
        options,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CohortRequest {
    pub icp: Icp,
    pub cohort: CohortSelection,
}

/// POST /api/v1/prospects/discover
///
/// Always 200: a failed search comes back as an empty list with `degraded` set.
pub async fn discover_prospects(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CohortRequest>,
) -> Json<DiscoveryOutcome> {
    Json(
        state
            .discoverer
            .discover_outcome(&request.icp, &request.cohort)
            .await,
    )
}

#[derive(Debug, Deserialize)]
pub struct EnrichLeadRequest {
    pub lead: Lead,
}

#[derive(Debug, Serialize)]
pub struct EnrichLeadResponse {
    pub lead: Lead,
    pub enrichment: EnrichmentStatus,
}

/// POST /api/v1/leads/enrich
pub async fn enrich_lead(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EnrichLeadRequest>,
) -> Json<EnrichLeadResponse> {
    let (lead, enrichment) = state.enricher.enrich_with_status(&request.lead).await;
    Json(EnrichLeadResponse { lead, enrichment })
}

/// POST /api/v1/pipeline/runs
///
/// Starts a discovery + enrichment run in the background and returns its id.
pub async fn start_pipeline_run(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CohortRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let run_id = state
        .runs
        .start(&state.coordinator, request.icp, request.cohort)
        .await;

    (StatusCode::ACCEPTED, Json(json!({ "runId": run_id })))
}

#[derive(Debug, Deserialize)]
pub struct RunQuery {
    /// Optional lead filter over contact person, title and last signal
    pub q: Option<String>,
}

/// GET /api/v1/pipeline/runs/:id?q=
pub async fn get_pipeline_run(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<Uuid>,
    Query(query): Query<RunQuery>,
) -> Result<Json<RunSnapshot>, AppError> {
    let mut snapshot = state
        .runs
        .get(&run_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Pipeline run {} not found", run_id)))?;

    if let Some(term) = query.q.as_deref() {
        snapshot.leads = filter_leads(&snapshot.leads, term)
            .into_iter()
            .cloned()
            .collect();
    }

    Ok(Json(snapshot))
}

/// GET /api/v1/enrichment/jobs/:lead_id
pub async fn get_enrichment_job(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<String>,
) -> Result<Json<EnrichmentJob>, AppError> {
    state
        .enricher
        .jobs()
        .get(&lead_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No enrichment job for lead {}", lead_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BusinessModel;
    use crate::profile::fallback_icp;

    fn offline_state() -> Arc<AppState> {
        Arc::new(AppState::from_config(Config::default()).unwrap())
    }

    #[tokio::test]
    async fn test_synthesize_without_key_serves_fallback() {
        let Json(icp) = synthesize_icp(
            State(offline_state()),
            Json(SynthesizeRequest {
                url: "https://www.plindia.com".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(icp.business_model, BusinessModel::Hybrid);
    }

    #[tokio::test]
    async fn test_cohort_options_default_view_and_not_found() {
        let Json(response) = cohort_options(Json(CohortOptionsRequest {
            icp: fallback_icp(),
            view_mode: None,
        }))
        .await
        .unwrap();
        assert_eq!(response.options.view_mode, ViewMode::B2B);
        assert_eq!(response.default_selection.persona, "CFO");
        assert_eq!(response.available_view_modes.len(), 2);

        let mut icp = fallback_icp();
        icp.consumer_profile = None;
        let err = cohort_options(Json(CohortOptionsRequest {
            icp,
            view_mode: Some(ViewMode::B2C),
        }))
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_run_and_job_are_not_found() {
        let state = offline_state();
        let err = get_pipeline_run(
            State(state.clone()),
            Path(Uuid::new_v4()),
            Query(RunQuery { q: None }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = get_enrichment_job(State(state), Path("lead-0".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
