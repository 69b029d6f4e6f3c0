use crate::cohort::{available_view_modes, compile_options};
use crate::errors::AppError;
use crate::gemini_client::GeminiClient;
use crate::models::{
    BusinessModel, CohortSelection, Icp, Lead, ProspectType, SocialData, SocialLinks,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::OnceLock;

const DISCOVERED_ENRICHMENT_SCORE: i64 = 85;
const DISCOVERED_SOCIAL_SCORE: i64 = 80;
const DEFAULT_SIGNAL: &str = "Verified LinkedIn Profile Found";
const PLACEHOLDER_EMAIL: &str = "verified@leadflow.ai";

/// Candidate record as returned by the search-grounded generation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProspectCandidate {
    pub company_name: String,
    pub contact_person: String,
    pub title: String,
    pub location: String,
    pub source_url: String,
    pub website: Option<String>,
    pub social_links: Option<SocialLinks>,
    pub description: Option<String>,
}

/// Discovered leads plus, when the search failed, the reason.
///
/// `degraded` distinguishes "the search failed" from "the search found nobody".
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryOutcome {
    pub leads: Vec<Lead>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

impl DiscoveryOutcome {
    fn degraded(reason: impl Into<String>) -> Self {
        Self {
            leads: Vec::new(),
            degraded: Some(reason.into()),
        }
    }
}

#[derive(Clone)]
pub struct ProspectDiscoverer {
    client: Option<GeminiClient>,
    target: usize,
}

impl ProspectDiscoverer {
    pub fn new(client: Option<GeminiClient>, target: usize) -> Self {
        Self {
            client,
            target: target.max(1),
        }
    }

    /// Discovered leads for `cohort`. Any failure yields an empty list.
    pub async fn discover(&self, icp: &Icp, cohort: &CohortSelection) -> Vec<Lead> {
        self.discover_outcome(icp, cohort).await.leads
    }

    pub async fn discover_outcome(&self, icp: &Icp, cohort: &CohortSelection) -> DiscoveryOutcome {
        let Some(ref client) = self.client else {
            tracing::warn!("Prospect discovery skipped: generative API key not configured");
            return DiscoveryOutcome::degraded("generative API key not configured");
        };

        if !is_offered(icp, cohort) {
            tracing::debug!(
                "Freeform cohort override: {} / {} / {}",
                cohort.industry,
                cohort.geography,
                cohort.persona
            );
        }

        let prospect_type = classify_prospect(icp, &cohort.persona);
        let directive = build_search_directive(cohort, self.target);
        tracing::info!(
            "🔎 Discovering {} {:?} prospects: {} in {} for {}",
            self.target,
            prospect_type,
            cohort.industry,
            cohort.geography,
            cohort.persona
        );

        let candidates = match client
            .generate_json(&directive, &candidate_schema(), true)
            .await
            .and_then(|text| parse_candidates(&text))
        {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!("Prospect discovery degraded to empty result: {}", e);
                return DiscoveryOutcome::degraded(e.to_string());
            }
        };

        if candidates.len() > self.target {
            tracing::debug!(
                "Truncating {} candidates to {}",
                candidates.len(),
                self.target
            );
        }

        let leads = leads_from_candidates(
            candidates.into_iter().take(self.target).collect(),
            prospect_type,
            chrono::Utc::now().timestamp_millis(),
        );
        tracing::info!("Discovered {} prospect(s)", leads.len());

        DiscoveryOutcome {
            leads,
            degraded: None,
        }
    }
}

fn is_offered(icp: &Icp, cohort: &CohortSelection) -> bool {
    available_view_modes(icp)
        .into_iter()
        .filter_map(|mode| compile_options(icp, mode))
        .any(|options| options.offers(cohort))
}

/// Wealth-tier personas that mark an individual (B2C) search on a Hybrid ICP.
fn is_wealth_persona(persona: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)^\s*(mass\s+affluent|affluent|u?hnis?)\s*$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(persona))
}

/// B2C for consumer ICPs, and for Hybrid ICPs searched by wealth tier; B2B otherwise.
pub fn classify_prospect(icp: &Icp, persona: &str) -> ProspectType {
    let hybrid_wealth_search = icp.business_model == BusinessModel::Hybrid
        && (is_wealth_persona(persona)
            || icp
                .consumer_profile
                .as_ref()
                .is_some_and(|c| c.wealth_tiers.iter().any(|tier| tier == persona)));

    if icp.business_model == BusinessModel::B2C || hybrid_wealth_search {
        ProspectType::B2C
    } else {
        ProspectType::B2B
    }
}

pub fn build_search_directive(cohort: &CohortSelection, target: usize) -> String {
    format!(
        "Find {} ACTUAL high-priority prospects in India matching this cohort: {} in {} for \"{}\". \
         Target specific real people or companies. You MUST find their REAL LinkedIn Profile URLs.",
        target, cohort.industry, cohort.geography, cohort.persona
    )
}

/// Response schema for discovery: an array of candidates.
pub fn candidate_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "companyName": { "type": "STRING" },
                "contactPerson": { "type": "STRING" },
                "title": { "type": "STRING" },
                "location": { "type": "STRING" },
                "sourceUrl": { "type": "STRING", "description": "The LinkedIn Profile URL" },
                "socialLinks": {
                    "type": "OBJECT",
                    "properties": { "linkedin": { "type": "STRING" } }
                },
                "description": {
                    "type": "STRING",
                    "description": "Initial summary based on search results"
                }
            },
            "required": ["contactPerson", "title", "sourceUrl"]
        }
    })
}

pub fn parse_candidates(text: &str) -> Result<Vec<ProspectCandidate>, AppError> {
    serde_json::from_str(text)
        .map_err(|e| AppError::ExternalApiError(format!("Malformed prospect list: {}", e)))
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Turns candidates into leads with discovery defaults. Ids embed `now_millis`.
pub fn leads_from_candidates(
    candidates: Vec<ProspectCandidate>,
    prospect_type: ProspectType,
    now_millis: i64,
) -> Vec<Lead> {
    candidates
        .into_iter()
        .enumerate()
        .map(|(i, candidate)| {
            let source_url = non_blank(&candidate.source_url);

            let mut social_links = candidate.social_links.unwrap_or_default();
            if social_links
                .linkedin
                .as_deref()
                .map_or(true, |l| l.trim().is_empty())
            {
                social_links.linkedin = source_url.clone();
            }

            let last_signal = candidate
                .description
                .as_deref()
                .and_then(non_blank)
                .unwrap_or_else(|| DEFAULT_SIGNAL.to_string());

            let mut lead = Lead {
                id: format!("lead-{}-{}", i, now_millis),
                company_name: candidate.company_name,
                contact_person: candidate.contact_person,
                title: candidate.title,
                email: PLACEHOLDER_EMAIL.to_string(),
                location: candidate.location,
                tech_stack: Vec::new(),
                revenue: "TBD".to_string(),
                enrichment_score: 0,
                last_signal,
                social_score: 0,
                website: candidate.website,
                source_url,
                social_links: Some(social_links),
                description: candidate.description,
                prospect_type,
                visual_analysis: None,
                behavioral_insights: None,
                social_data: Some(SocialData {
                    profile_pic: format!("https://i.pravatar.cc/150?u={}", i + 100),
                    banner: format!("https://picsum.photos/800/200?random={}", i + 100),
                    ..Default::default()
                }),
            };
            lead.set_scores(DISCOVERED_ENRICHMENT_SCORE, DISCOVERED_SOCIAL_SCORE);
            lead
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::fallback_icp;

    fn cohort(persona: &str) -> CohortSelection {
        CohortSelection {
            industry: "Financial Services".into(),
            geography: "Mumbai".into(),
            persona: persona.into(),
        }
    }

    #[test]
    fn test_classify_prospect() {
        let mut icp = fallback_icp();
        assert_eq!(classify_prospect(&icp, "HNIs"), ProspectType::B2C);
        assert_eq!(classify_prospect(&icp, "uhni"), ProspectType::B2C);
        assert_eq!(classify_prospect(&icp, "Mass Affluent"), ProspectType::B2C);
        assert_eq!(classify_prospect(&icp, "CFO"), ProspectType::B2B);

        icp.business_model = BusinessModel::B2B;
        assert_eq!(classify_prospect(&icp, "HNIs"), ProspectType::B2B);
        icp.business_model = BusinessModel::B2C;
        assert_eq!(classify_prospect(&icp, "CFO"), ProspectType::B2C);
    }

    #[test]
    fn test_search_directive_embeds_cohort() {
        let directive = build_search_directive(&cohort("CFO"), 10);
        assert!(directive.starts_with("Find 10 ACTUAL high-priority prospects in India"));
        assert!(directive.contains("Financial Services in Mumbai for \"CFO\""));
        assert!(directive.contains("REAL LinkedIn Profile URLs"));
    }

    #[test]
    fn test_leads_from_candidates_defaults() {
        let candidates = parse_candidates(
            r#"[
                {"contactPerson":"Asha Rao","title":"CFO","sourceUrl":"https://linkedin.com/in/asha",
                 "description":"Raised Series B"},
                {"contactPerson":"Vikram Shah","title":"Treasury Head","sourceUrl":"https://linkedin.com/in/vik",
                 "socialLinks":{"twitter":"https://x.com/vik"}}
            ]"#,
        )
        .unwrap();

        let leads = leads_from_candidates(candidates, ProspectType::B2B, 1_700_000_000_000);
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].id, "lead-0-1700000000000");
        assert_eq!(leads[1].id, "lead-1-1700000000000");
        assert!(leads.iter().all(|l| l.enrichment_score == 85 && l.social_score == 80));
        assert_eq!(leads[0].last_signal, "Raised Series B");
        assert_eq!(leads[1].last_signal, "Verified LinkedIn Profile Found");
        assert_eq!(leads[0].email, "verified@leadflow.ai");
        assert_eq!(leads[0].revenue, "TBD");
        assert_eq!(leads[0].linkedin_url(), Some("https://linkedin.com/in/asha"));

        let links = leads[1].social_links.as_ref().unwrap();
        assert_eq!(links.linkedin.as_deref(), Some("https://linkedin.com/in/vik"));
        assert_eq!(links.twitter.as_deref(), Some("https://x.com/vik"));

        let stub = leads[1].social_data.as_ref().unwrap();
        assert_eq!(stub.profile_pic, "https://i.pravatar.cc/150?u=101");
        assert_eq!(stub.banner, "https://picsum.photos/800/200?random=101");
        assert!(stub.bio.is_empty() && stub.recent_posts.is_empty() && stub.metrics.is_empty());
    }

    #[test]
    fn test_malformed_candidates_rejected() {
        assert!(parse_candidates("{\"not\": \"a list\"}").is_err());
        assert!(parse_candidates("Sorry, I could not find anyone.").is_err());
    }

    #[tokio::test]
    async fn test_without_key_discovery_is_degraded_empty() {
        let discoverer = ProspectDiscoverer::new(None, 10);
        let outcome = discoverer
            .discover_outcome(&fallback_icp(), &cohort("CFO"))
            .await;
        assert!(outcome.leads.is_empty());
        assert!(outcome.degraded.is_some());
    }
}
