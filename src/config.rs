pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_BRIGHTDATA_BASE_URL: &str = "https://api.brightdata.com";
/// LinkedIn people-profile dataset.
pub const DEFAULT_BRIGHTDATA_DATASET_ID: &str = "gd_l1905it127m28y6590";

/// Process-wide configuration, read once at startup and passed into every component.
///
/// Both provider credentials are optional: a missing key degrades the owning component
/// (static ICP, empty discovery, pass-through enrichment) instead of failing startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub brightdata_api_key: Option<String>,
    pub brightdata_base_url: String,
    pub brightdata_dataset_id: String,
    /// Public URL of our completion webhook, forwarded to the provider on trigger.
    pub brightdata_webhook_url: Option<String>,
    /// Shared secret expected in `X-Webhook-Token` on provider callbacks.
    pub webhook_secret: Option<String>,
    pub request_timeout_secs: u64,
    pub enrichment_timeout_secs: u64,
    pub enrichment_poll_interval_ms: u64,
    pub enrichment_max_polls: u32,
    pub discovery_target: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            brightdata_api_key: None,
            brightdata_base_url: DEFAULT_BRIGHTDATA_BASE_URL.to_string(),
            brightdata_dataset_id: DEFAULT_BRIGHTDATA_DATASET_ID.to_string(),
            brightdata_webhook_url: None,
            webhook_secret: None,
            request_timeout_secs: 30,
            enrichment_timeout_secs: 120,
            enrichment_poll_interval_ms: 2000,
            enrichment_max_polls: 30,
            discovery_target: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = Self {
            port: parse_var("PORT", defaults.port)
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            gemini_api_key: optional_var("GEMINI_API_KEY").or_else(|| optional_var("API_KEY")),
            gemini_base_url: url_var("GEMINI_BASE_URL", defaults.gemini_base_url)?,
            gemini_model: optional_var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            brightdata_api_key: optional_var("BRIGHTDATA_API_KEY"),
            brightdata_base_url: url_var("BRIGHTDATA_BASE_URL", defaults.brightdata_base_url)?,
            brightdata_dataset_id: optional_var("BRIGHTDATA_DATASET_ID")
                .unwrap_or(defaults.brightdata_dataset_id),
            brightdata_webhook_url: optional_var("BRIGHTDATA_WEBHOOK_URL")
                .map(|url| {
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("BRIGHTDATA_WEBHOOK_URL must start with http:// or https://");
                    }
                    Ok(url)
                })
                .transpose()?,
            webhook_secret: optional_var("WEBHOOK_SECRET"),
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)
                .map_err(|_| anyhow::anyhow!("REQUEST_TIMEOUT_SECS must be a positive number"))?,
            enrichment_timeout_secs: parse_var(
                "ENRICHMENT_TIMEOUT_SECS",
                defaults.enrichment_timeout_secs,
            )
            .map_err(|_| anyhow::anyhow!("ENRICHMENT_TIMEOUT_SECS must be a positive number"))?,
            enrichment_poll_interval_ms: parse_var(
                "ENRICHMENT_POLL_INTERVAL_MS",
                defaults.enrichment_poll_interval_ms,
            )
            .map_err(|_| anyhow::anyhow!("ENRICHMENT_POLL_INTERVAL_MS must be a number"))?,
            enrichment_max_polls: parse_var("ENRICHMENT_MAX_POLLS", defaults.enrichment_max_polls)
                .map_err(|_| anyhow::anyhow!("ENRICHMENT_MAX_POLLS must be a number"))?,
            discovery_target: parse_var("DISCOVERY_TARGET", defaults.discovery_target)
                .map_err(|_| anyhow::anyhow!("DISCOVERY_TARGET must be a number"))?,
        };

        if config.request_timeout_secs == 0 || config.enrichment_timeout_secs == 0 {
            anyhow::bail!("Timeouts must be greater than zero");
        }
        if config.discovery_target == 0 {
            anyhow::bail!("DISCOVERY_TARGET must be greater than zero");
        }

        // Never log credential values, only whether they are present
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Gemini Base URL: {}", config.gemini_base_url);
        tracing::debug!("Gemini Model: {}", config.gemini_model);
        tracing::debug!("Bright Data Base URL: {}", config.brightdata_base_url);
        tracing::debug!("Server Port: {}", config.port);
        if !config.has_generative_key() {
            tracing::warn!("GEMINI_API_KEY not configured - ICP synthesis uses the static profile and discovery returns no leads");
        }
        if !config.has_enrichment_key() {
            tracing::warn!("BRIGHTDATA_API_KEY not configured - lead enrichment is skipped");
        }
        if config.webhook_secret.is_none() {
            tracing::warn!("WEBHOOK_SECRET not configured - enrichment webhook accepts unauthenticated calls");
        }

        Ok(config)
    }

    pub fn has_generative_key(&self) -> bool {
        self.gemini_api_key.is_some()
    }

    pub fn has_enrichment_key(&self) -> bool {
        self.brightdata_api_key.is_some()
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, T::Err> {
    match optional_var(name) {
        Some(raw) => raw.trim().parse(),
        None => Ok(default),
    }
}

fn url_var(name: &str, default: String) -> anyhow::Result<String> {
    let url = optional_var(name).unwrap_or(default);
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(url.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_degrade_without_credentials() {
        let config = Config::default();
        assert!(!config.has_generative_key());
        assert!(!config.has_enrichment_key());
        assert_eq!(config.discovery_target, 10);
        assert_eq!(config.brightdata_dataset_id, DEFAULT_BRIGHTDATA_DATASET_ID);
    }
}
