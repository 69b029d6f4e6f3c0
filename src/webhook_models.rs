use crate::brightdata_client::ProfileRecord;
use serde::{Deserialize, Serialize};

/// Provider completion callback - can be single object or array
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum EnrichmentWebhookPayload {
    Single(SnapshotEvent),
    Batch(Vec<SnapshotEvent>),
}

impl EnrichmentWebhookPayload {
    /// Convert to a vec of events for uniform processing
    pub fn into_events(self) -> Vec<SnapshotEvent> {
        match self {
            EnrichmentWebhookPayload::Single(event) => vec![event],
            EnrichmentWebhookPayload::Batch(events) => events,
        }
    }
}

/// Completion notice for one collection snapshot
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapshotEvent {
    pub snapshot_id: String,

    /// "ready" / "failed" / "running"
    #[serde(default)]
    pub status: String,

    /// Collected records, present on ready events
    #[serde(default)]
    pub data: Vec<ProfileRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response sent back to the provider
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct WebhookResponse {
    pub status: String,
    pub received: usize,
    pub completed: usize,
    pub failed: usize,
    pub ignored: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_event() {
        let json = r#"
        {
            "snapshot_id": "s_m1abc",
            "status": "ready",
            "data": [{ "name": "Asha Rao", "followers": 1200 }]
        }
        "#;

        let payload: EnrichmentWebhookPayload = serde_json::from_str(json).unwrap();
        match payload {
            EnrichmentWebhookPayload::Single(event) => {
                assert_eq!(event.snapshot_id, "s_m1abc");
                assert_eq!(event.data[0].followers, Some(1200));
            }
            _ => panic!("Expected single event"),
        }
    }

    #[test]
    fn test_parse_batch_events() {
        let json = r#"
        [
            { "snapshot_id": "s_1", "status": "ready" },
            { "snapshot_id": "s_2", "status": "failed", "error": "profile private" }
        ]
        "#;

        let payload: EnrichmentWebhookPayload = serde_json::from_str(json).unwrap();
        let events = payload.into_events();
        assert_eq!(events.len(), 2);
        assert!(events[0].data.is_empty());
        assert_eq!(events[1].error.as_deref(), Some("profile private"));
    }
}
