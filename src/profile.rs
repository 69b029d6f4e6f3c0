use crate::errors::{AppError, ResultExt};
use crate::gemini_client::GeminiClient;
use crate::models::{BusinessModel, ConsumerProfile, CorporateProfile, Icp};
use serde_json::{json, Value};

/// Turns a company URL into an Ideal Customer Profile with one generative call.
#[derive(Clone)]
pub struct ProfileSynthesizer {
    client: Option<GeminiClient>,
}

impl ProfileSynthesizer {
    /// `None` serves the static fallback profile for every URL.
    pub fn new(client: Option<GeminiClient>) -> Self {
        Self { client }
    }

    /// Synthesizes the ICP for `url`.
    ///
    /// # Errors
    ///
    /// * `AppError::BadRequest` - The URL is blank.
    /// * `AppError::AnalysisFailure` - The provider failed, timed out or returned a document
    ///   that is not a valid ICP. Never retried here.
    pub async fn synthesize(&self, url: &str) -> Result<Icp, AppError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(AppError::BadRequest("url must not be empty".to_string()));
        }

        let Some(ref client) = self.client else {
            tracing::warn!("Generative API key not configured, serving fallback ICP for {}", url);
            return Ok(fallback_icp());
        };

        tracing::info!("🧭 Synthesizing ICP for {}", url);

        let text = client
            .generate_json(&analysis_prompt(url), &icp_schema(), false)
            .await
            .map_err(AppError::analysis)?;

        let icp = parse_icp(&text).with_context(|| format!("ICP synthesis for {}", url))?;
        tracing::info!(
            "ICP for {} classified as {:?} (corporate: {}, consumer: {})",
            url,
            icp.business_model,
            icp.corporate_profile.is_some(),
            icp.consumer_profile.is_some()
        );
        Ok(icp)
    }
}

pub fn analysis_prompt(url: &str) -> String {
    format!(
        "Analyze the website {} and generate a comprehensive Indian market Ideal Customer Profile (ICP). \
         If it's a financial or multi-service brand, classify as 'Hybrid'. \
         Generate BOTH corporateProfile and consumerProfile details if applicable.",
        url
    )
}

/// Parses model output into an ICP. A document without any profile block is rejected.
pub fn parse_icp(text: &str) -> Result<Icp, AppError> {
    let icp: Icp = serde_json::from_str(text)
        .map_err(|e| AppError::analysis(format!("ICP did not match schema: {}", e)))?;

    if !icp.has_any_profile() {
        return Err(AppError::analysis(
            "ICP contained neither corporateProfile nor consumerProfile",
        ));
    }
    Ok(icp)
}

fn string_list() -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" } })
}

/// Response schema for ICP synthesis. The four top-level fields are required.
pub fn icp_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "businessModel": { "type": "STRING", "enum": ["B2B", "B2C", "Hybrid"] },
            "productsAndServices": string_list(),
            "valueProposition": { "type": "STRING" },
            "outboundStrategy": { "type": "STRING" },
            "corporateProfile": {
                "type": "OBJECT",
                "properties": {
                    "industries": string_list(),
                    "companySize": { "type": "STRING" },
                    "revenueRange": { "type": "STRING" },
                    "jobTitles": string_list(),
                    "geographies": string_list(),
                    "painPoints": string_list(),
                    "techStackPreference": string_list(),
                    "buyingTriggers": string_list()
                }
            },
            "consumerProfile": {
                "type": "OBJECT",
                "properties": {
                    "demographics": { "type": "STRING" },
                    "incomeBracket": { "type": "STRING" },
                    "wealthTiers": string_list(),
                    "interests": string_list(),
                    "lifestyleSegments": string_list(),
                    "purchasingBehavior": { "type": "STRING" },
                    "keyInfluencers": string_list()
                }
            }
        },
        "required": ["businessModel", "productsAndServices", "valueProposition", "outboundStrategy"]
    })
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Static Hybrid profile of an Indian brokerage, used when no generative key is configured.
pub fn fallback_icp() -> Icp {
    Icp {
        business_model: BusinessModel::Hybrid,
        products_and_services: strings(&[
            "Equity and Derivatives Trading",
            "Portfolio Management Services (PMS)",
            "Investment Banking",
            "Institutional Equities",
            "Wealth Management",
            "Mutual Funds and SIPs",
            "Currency and Commodity Trading",
            "Margin Funding (MTF)",
            "Loan Against Shares",
            "Corporate Advisory",
        ]),
        value_proposition: "Prabhudas Lilladher (PL) leverages over seven decades of trust and deep, \
            data-driven research to provide comprehensive financial solutions ranging from retail \
            broking to complex investment banking advisory, helping clients navigate the Indian \
            market's growth themes."
            .to_string(),
        outbound_strategy:
            "Omni-channel growth focusing on Digital HNI onboarding and Institutional partnerships."
                .to_string(),
        corporate_profile: Some(CorporateProfile {
            industries: strings(&["Financial Services", "Fintech", "Investment Banking"]),
            company_size: "500-2000".to_string(),
            revenue_range: "₹100Cr+".to_string(),
            job_titles: strings(&["CFO", "Treasury Head", "Investment Committee Member"]),
            geographies: strings(&["Mumbai", "Delhi NCR", "Bengaluru"]),
            pain_points: strings(&[
                "Complex regulatory compliance",
                "Sub-optimal portfolio yields",
            ]),
            tech_stack_preference: strings(&["Bloomberg", "SAP", "High-end Trading Algos"]),
            buying_triggers: strings(&[
                "IPO plans",
                "Surplus cash management",
                "Regulatory changes",
            ]),
        }),
        consumer_profile: Some(ConsumerProfile {
            demographics: "Ages 30-55, Urban Professionals".to_string(),
            income_bracket: "₹25L - ₹1Cr+ p.a.".to_string(),
            wealth_tiers: strings(&["Affluent", "HNIs", "UHNIs"]),
            interests: strings(&["Wealth Creation", "Direct Equity", "Global Markets"]),
            lifestyle_segments: strings(&["High Net Worth Individuals", "Active Traders"]),
            purchasing_behavior: "Research-driven, values high-touch advisory".to_string(),
            key_influencers: strings(&["Financial News Networks", "NIFTY/SENSEX analysts"]),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_url_rejected() {
        let synthesizer = ProfileSynthesizer::new(None);
        let err = synthesizer.synthesize("   ").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_fallback_without_key() {
        let icp = ProfileSynthesizer::new(None)
            .synthesize("https://example.com")
            .await
            .unwrap();
        assert_eq!(icp, fallback_icp());
        assert_eq!(icp.business_model, BusinessModel::Hybrid);
        assert!(icp.corporate_profile.is_some() && icp.consumer_profile.is_some());
    }

    #[test]
    fn test_parse_icp_fills_missing_fields() {
        let icp = parse_icp(
            r#"{"businessModel":"B2C","productsAndServices":["SIP"],
                "valueProposition":"v","outboundStrategy":"o",
                "consumerProfile":{"demographics":"30-45"}}"#,
        )
        .unwrap();
        let consumer = icp.consumer_profile.unwrap();
        assert!(consumer.wealth_tiers.is_empty());
        assert_eq!(consumer.demographics, "30-45");
        assert!(icp.corporate_profile.is_none());
    }

    #[test]
    fn test_parse_icp_rejects_schema_mismatch() {
        assert!(parse_icp("not json").unwrap_err().is_analysis_failure());
        assert!(parse_icp(r#"{"businessModel":"Retail"}"#)
            .unwrap_err()
            .is_analysis_failure());
        let no_profiles = r#"{"businessModel":"B2B","productsAndServices":[],
            "valueProposition":"v","outboundStrategy":"o"}"#;
        assert!(parse_icp(no_profiles).unwrap_err().is_analysis_failure());
    }

    #[test]
    fn test_schema_requires_top_level_fields() {
        let schema = icp_schema();
        assert_eq!(schema["required"].as_array().unwrap().len(), 4);
        assert_eq!(
            schema["properties"]["businessModel"]["enum"],
            json!(["B2B", "B2C", "Hybrid"])
        );
    }
}
