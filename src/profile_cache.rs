//! Memoization of provider profile records keyed by profile URL.
//!
//! Entries are stored as a serialized envelope carrying a SHA-256 checksum of the record JSON.
//! A record whose checksum does not match on read is dropped and the caller refetches it from
//! the provider.

use crate::brightdata_client::ProfileRecord;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Serialized cache value: the record JSON plus its checksum.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProfileEnvelope {
    payload: String,
    checksum: String,
}

impl ProfileEnvelope {
    fn seal(record: &ProfileRecord) -> Option<Self> {
        let payload = serde_json::to_string(record).ok()?;
        let checksum = checksum(&payload);
        Some(Self { payload, checksum })
    }

    /// Returns the record when the checksum matches, `None` if tampered or unreadable.
    fn open(serialized: &str) -> Option<ProfileRecord> {
        let envelope: ProfileEnvelope = serde_json::from_str(serialized).ok()?;
        if checksum(&envelope.payload) != envelope.checksum {
            tracing::warn!(
                "Profile cache checksum mismatch. Expected: {}, Payload length: {}",
                envelope.checksum,
                envelope.payload.len()
            );
            return None;
        }
        serde_json::from_str(&envelope.payload).ok()
    }
}

fn checksum(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}

/// Canonical cache key for a profile URL.
///
/// Scheme, host case, `www.` prefix, query string, fragment and trailing slashes do not
/// distinguish profiles.
pub fn normalize_profile_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match url::Url::parse(trimmed) {
        Ok(parsed) => {
            let host = parsed
                .host_str()
                .unwrap_or_default()
                .to_ascii_lowercase();
            let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
            let path = parsed.path().trim_end_matches('/');
            format!("{}{}", host, path)
        }
        Err(_) => trimmed.trim_end_matches('/').to_ascii_lowercase(),
    }
}

#[derive(Clone)]
pub struct ProfileCache {
    entries: Cache<String, String>,
}

impl ProfileCache {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(max_capacity)
                .build(),
        }
    }

    pub async fn get(&self, profile_url: &str) -> Option<ProfileRecord> {
        let key = normalize_profile_url(profile_url);
        let serialized = self.entries.get(&key).await?;

        match ProfileEnvelope::open(&serialized) {
            Some(record) => {
                tracing::debug!("Profile cache HIT for {}", key);
                Some(record)
            }
            None => {
                tracing::warn!("Discarding corrupted profile cache entry for {}", key);
                self.entries.invalidate(&key).await;
                None
            }
        }
    }

    pub async fn insert(&self, profile_url: &str, record: &ProfileRecord) {
        let key = normalize_profile_url(profile_url);
        match ProfileEnvelope::seal(record) {
            Some(envelope) => {
                if let Ok(serialized) = serde_json::to_string(&envelope) {
                    self.entries.insert(key, serialized).await;
                }
            }
            None => tracing::warn!("Profile record for {} could not be serialized", key),
        }
    }
}

impl Default for ProfileCache {
    /// One hour TTL, 10k profiles.
    fn default() -> Self {
        Self::new(Duration::from_secs(3600), 10_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> ProfileRecord {
        ProfileRecord {
            name: Some(name.to_string()),
            followers: Some(4200),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_profile_url() {
        assert_eq!(
            normalize_profile_url("https://www.LinkedIn.com/in/asha-rao/?utm=x#top"),
            "linkedin.com/in/asha-rao"
        );
        assert_eq!(
            normalize_profile_url("http://linkedin.com/in/asha-rao"),
            "linkedin.com/in/asha-rao"
        );
    }

    #[tokio::test]
    async fn test_round_trip_through_equivalent_urls() {
        let cache = ProfileCache::default();
        cache
            .insert("https://www.linkedin.com/in/asha-rao/", &record("Asha"))
            .await;

        let hit = cache.get("https://linkedin.com/in/asha-rao").await;
        assert_eq!(hit, Some(record("Asha")));
        assert!(cache.get("https://linkedin.com/in/other").await.is_none());
    }

    #[tokio::test]
    async fn test_tampered_entry_is_discarded() {
        let cache = ProfileCache::default();
        let url = "https://linkedin.com/in/asha-rao";
        cache.insert(url, &record("Asha")).await;

        let key = normalize_profile_url(url);
        let stored = cache.entries.get(&key).await.unwrap();
        cache
            .entries
            .insert(key.clone(), stored.replace("Asha", "Mallory"))
            .await;

        assert!(cache.get(url).await.is_none());
        assert!(cache.entries.get(&key).await.is_none());
    }
}
