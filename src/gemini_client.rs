use crate::config::Config;
use crate::errors::AppError;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Client for the generative model's `generateContent` REST endpoint.
///
/// Every call requests a JSON response shaped by a caller-supplied schema. Grounded calls also
/// enable the live web search tool.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    /// Creates a new `GeminiClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root, e.g. `https://generativelanguage.googleapis.com`.
    /// * `model` - Model id used in the request path.
    /// * `api_key` - API key sent in the `x-goog-api-key` header.
    /// * `timeout` - Per-request timeout; expiry maps to `AppError::Timeout`.
    pub fn new(
        base_url: String,
        model: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("Failed to create Gemini client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    /// Builds a client from configuration, or `None` when no API key is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, AppError> {
        let Some(ref api_key) = config.gemini_api_key else {
            return Ok(None);
        };

        Self::new(
            config.gemini_base_url.clone(),
            config.gemini_model.clone(),
            api_key.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
        .map(Some)
    }

    /// Sends one instruction and returns the model's JSON text, with any markdown code
    /// fence removed.
    ///
    /// # Arguments
    ///
    /// * `prompt` - Natural-language instruction.
    /// * `schema` - Response schema the output must conform to.
    /// * `grounded` - Enables the web search tool.
    pub async fn generate_json(
        &self,
        prompt: &str,
        schema: &Value,
        grounded: bool,
    ) -> Result<String, AppError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema
            }
        });
        if grounded {
            body["tools"] = json!([{ "googleSearch": {} }]);
        }

        tracing::info!(
            model = %self.model,
            grounded,
            "Requesting generateContent ({} chars prompt)",
            prompt.len()
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Gemini returned {}: {}",
                status, error_text
            )));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse Gemini response: {}", e))
        })?;

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            tracing::warn!(feedback = ?parsed.prompt_feedback, "Gemini returned no candidates");
            return Err(AppError::ExternalApiError(
                "Gemini response contained no candidates".to_string(),
            ));
        };

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AppError::ExternalApiError(format!(
                "Gemini candidate had no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(strip_code_fence(&text).to_string())
    }
}

/// Removes a surrounding markdown code fence (```json ... ```), if any.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = GeminiClient::new(
            "https://example.com/".to_string(),
            "gemini-test".to_string(),
            "key".to_string(),
            Duration::from_secs(5),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_from_config_without_key_is_none() {
        let config = Config::default();
        assert!(GeminiClient::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```\n"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    }
}
