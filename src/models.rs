use serde::{Deserialize, Deserializer, Serialize};

// ============ Ideal Customer Profile ============

/// Business-model classification of the analyzed company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusinessModel {
    B2B,
    B2C,
    Hybrid,
}

/// Generated market profile for one company URL.
///
/// At least one of `corporate_profile` / `consumer_profile` is present on every ICP the
/// synthesizer returns. A missing block means "no data for that facet".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Icp {
    pub business_model: BusinessModel,
    #[serde(default)]
    pub products_and_services: Vec<String>,
    #[serde(default)]
    pub value_proposition: String,
    #[serde(default)]
    pub outbound_strategy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corporate_profile: Option<CorporateProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_profile: Option<ConsumerProfile>,
}

impl Icp {
    pub fn has_any_profile(&self) -> bool {
        self.corporate_profile.is_some() || self.consumer_profile.is_some()
    }
}

/// Organizational (B2B) facets of an ICP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorporateProfile {
    pub industries: Vec<String>,
    pub company_size: String,
    pub revenue_range: String,
    pub job_titles: Vec<String>,
    pub geographies: Vec<String>,
    pub pain_points: Vec<String>,
    pub tech_stack_preference: Vec<String>,
    pub buying_triggers: Vec<String>,
}

/// Individual (B2C) facets of an ICP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsumerProfile {
    pub demographics: String,
    pub income_bracket: String,
    pub wealth_tiers: Vec<String>,
    pub interests: Vec<String>,
    pub lifestyle_segments: Vec<String>,
    pub purchasing_behavior: String,
    pub key_influencers: Vec<String>,
}

// ============ Cohorts ============

/// Which half of an ICP a cohort is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewMode {
    B2B,
    B2C,
}

/// A concrete industry / geography / persona triple scoping one discovery search.
///
/// Values outside the ICP's offered options are accepted as freeform overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortSelection {
    pub industry: String,
    pub geography: String,
    pub persona: String,
}

// ============ Leads ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProspectType {
    B2B,
    B2C,
}

/// Named social platform links for a lead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualAnalysis {
    pub profile_aesthetic: String,
    pub cover_photo_context: String,
    pub image_gallery_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehavioralInsights {
    pub spending_capacity: String,
    pub investable_surplus: String,
    pub lifestyle_indications: String,
    pub purchasing_propensity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub text: String,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialMetric {
    pub date: String,
    pub followers: u64,
    /// Engagement rate in percent.
    pub engagement: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialData {
    pub bio: String,
    pub profile_pic: String,
    pub banner: String,
    pub recent_posts: Vec<SocialPost>,
    pub metrics: Vec<SocialMetric>,
}

/// A prospect record, progressively populated from identity through enrichment.
///
/// Enrichment blocks are omitted (not null-filled) until the enricher sets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    #[serde(default)]
    pub company_name: String,
    pub contact_person: String,
    pub title: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub revenue: String,
    #[serde(deserialize_with = "deserialize_score")]
    pub enrichment_score: u8,
    #[serde(default)]
    pub last_signal: String,
    #[serde(deserialize_with = "deserialize_score")]
    pub social_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_links: Option<SocialLinks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub prospect_type: ProspectType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_analysis: Option<VisualAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavioral_insights: Option<BehavioralInsights>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_data: Option<SocialData>,
}

impl Lead {
    /// LinkedIn profile URL used as the enrichment key, if present and non-blank.
    pub fn linkedin_url(&self) -> Option<&str> {
        self.social_links
            .as_ref()
            .and_then(|links| links.linkedin.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn set_scores(&mut self, enrichment: i64, social: i64) {
        self.enrichment_score = clamp_score(enrichment);
        self.social_score = clamp_score(social);
    }

    pub fn priority(&self) -> Priority {
        Priority::from_score(self.enrichment_score)
    }

    pub fn is_enriched(&self) -> bool {
        self.visual_analysis.is_some() || self.behavioral_insights.is_some()
    }
}

/// Clamps any integer into the `[0, 100]` score range.
pub fn clamp_score(raw: i64) -> u8 {
    raw.clamp(0, 100) as u8
}

fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if raw.is_nan() {
        return Ok(0);
    }
    Ok(clamp_score(raw.round() as i64))
}

/// Dashboard priority tier derived from the enrichment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Hot,
    Warm,
    Cool,
}

impl Priority {
    pub fn from_score(score: u8) -> Self {
        match score {
            85.. => Priority::Hot,
            70..=84 => Priority::Warm,
            _ => Priority::Cool,
        }
    }
}

/// Case-insensitive search over contact person, title and last signal.
pub fn filter_leads<'a>(leads: &'a [Lead], term: &str) -> Vec<&'a Lead> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return leads.iter().collect();
    }
    leads
        .iter()
        .filter(|lead| {
            lead.contact_person.to_lowercase().contains(&needle)
                || lead.title.to_lowercase().contains(&needle)
                || lead.last_signal.to_lowercase().contains(&needle)
        })
        .collect()
}

// ============ Pipeline ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PipelineStage {
    Idle,
    Searching,
    Scraping,
}

/// Per-lead enrichment result reported alongside the merged lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnrichmentStatus {
    Enriched,
    /// Served from the profile cache without a provider call.
    Cached,
    Skipped { reason: String },
    Failed { reason: String },
}

impl EnrichmentStatus {
    pub fn skipped(reason: impl Into<String>) -> Self {
        EnrichmentStatus::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        EnrichmentStatus::Failed {
            reason: reason.into(),
        }
    }

    pub fn merged_data(&self) -> bool {
        matches!(self, EnrichmentStatus::Enriched | EnrichmentStatus::Cached)
    }
}
