use crate::brightdata_client::SnapshotStatus;
use crate::errors::AppError;
use crate::handlers::AppState;
use crate::insights::merge_profile;
use crate::webhook_models::{EnrichmentWebhookPayload, SnapshotEvent, WebhookResponse};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

/// Enrichment provider completion webhook
///
/// Receives snapshot completion notices for collection jobs this service triggered.
/// Ready events carrying data complete the job and fill the profile cache, so an enricher
/// still polling the same snapshot picks the record up on its next attempt.
///
/// Expected payload: Single event object OR array of events
/// Authentication: X-Webhook-Token header must match WEBHOOK_SECRET env var
pub async fn enrichment_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<EnrichmentWebhookPayload>,
) -> Result<(StatusCode, Json<WebhookResponse>), AppError> {
    tracing::info!("Received enrichment webhook");

    // 1. Validate webhook secret (if configured)
    validate_webhook_secret(state.config.webhook_secret.as_deref(), &headers)?;

    // 2. Convert payload to vec of events (handles both single and batch)
    let events = payload.into_events();
    let mut response = WebhookResponse {
        status: "received".to_string(),
        received: events.len(),
        ..Default::default()
    };

    // 3. Apply each event to its job
    for event in events {
        match apply_snapshot_event(&state, event).await {
            EventOutcome::Completed => response.completed += 1,
            EventOutcome::Failed => response.failed += 1,
            EventOutcome::Ignored => response.ignored += 1,
        }
    }

    tracing::info!(
        "Webhook processing complete: {} received, {} completed, {} failed, {} ignored",
        response.received,
        response.completed,
        response.failed,
        response.ignored
    );

    Ok((StatusCode::OK, Json(response)))
}

/// Validate webhook secret from X-Webhook-Token header
fn validate_webhook_secret(expected: Option<&str>, headers: &HeaderMap) -> Result<(), AppError> {
    // If no secret is configured, skip validation (warn was already logged at startup)
    let Some(expected_secret) = expected else {
        return Ok(());
    };

    let token = headers
        .get("X-Webhook-Token")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing X-Webhook-Token header".to_string()))?;

    if !constant_time_compare(token, expected_secret) {
        tracing::warn!("Invalid webhook token received");
        return Err(AppError::Unauthorized("Invalid webhook token".to_string()));
    }

    Ok(())
}

/// Constant-time string comparison
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.as_bytes()
        .iter()
        .zip(b.as_bytes().iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[derive(Debug, PartialEq, Eq)]
enum EventOutcome {
    Completed,
    Failed,
    Ignored,
}

async fn apply_snapshot_event(state: &AppState, event: SnapshotEvent) -> EventOutcome {
    let jobs = state.enricher.jobs();

    let Some(job) = jobs.find_by_snapshot(&event.snapshot_id).await else {
        tracing::debug!("Ignoring webhook for unknown snapshot {}", event.snapshot_id);
        return EventOutcome::Ignored;
    };

    // The lead may have been resubmitted since; only its current snapshot may update the job
    if job.snapshot_id.as_deref() != Some(event.snapshot_id.as_str()) {
        tracing::debug!(
            "Ignoring stale snapshot {} for lead {} (current: {:?})",
            event.snapshot_id,
            job.lead_id,
            job.snapshot_id
        );
        return EventOutcome::Ignored;
    }

    match SnapshotStatus::parse(&event.status) {
        SnapshotStatus::Ready => {
            let Some(record) = event.data.into_iter().next() else {
                tracing::debug!(
                    "Ready event for snapshot {} carried no data, leaving it to the poller",
                    event.snapshot_id
                );
                return EventOutcome::Ignored;
            };

            state
                .enricher
                .cache()
                .insert(&job.profile_url, &record)
                .await;
            let merged = merge_profile(&job.lead, &record);
            jobs.complete(&job.lead_id, merged).await;
            tracing::info!(
                "✓ Snapshot {} completed lead {} via webhook",
                event.snapshot_id,
                job.lead_id
            );
            EventOutcome::Completed
        }
        SnapshotStatus::Failed => {
            let reason = event.error.unwrap_or_else(|| {
                format!("provider reported snapshot {} as failed", event.snapshot_id)
            });
            jobs.fail(&job.lead, &job.profile_url, &reason).await;
            EventOutcome::Failed
        }
        SnapshotStatus::Running => EventOutcome::Ignored,
    }
}
