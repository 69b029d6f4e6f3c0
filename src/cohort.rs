//! Projection of an ICP into selectable cohort options.
//!
//! Everything here is pure; switching view mode is just a second call to
//! [`compile_options`] on the same ICP.

use crate::models::{BusinessModel, CohortSelection, Icp, ViewMode};
use serde::{Deserialize, Serialize};

/// Wealth ladder offered when the consumer profile lists no tiers.
pub const DEFAULT_WEALTH_TIERS: [&str; 4] = ["Mass Affluent", "Affluent", "HNIs", "UHNIs"];

const FALLBACK_INDUSTRY: &str = "General";
const FALLBACK_GEOGRAPHY: &str = "India";
const FALLBACK_PERSONA: &str = "Target User";

/// One selectable dimension: a display label and its ordered choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetOptions {
    pub label: String,
    pub items: Vec<String>,
}

impl FacetOptions {
    fn new(label: &str, items: Vec<String>) -> Self {
        Self {
            label: label.to_string(),
            items,
        }
    }

    fn first_or(&self, fallback: &str) -> String {
        self.items
            .first()
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortOptions {
    pub view_mode: ViewMode,
    pub industry: FacetOptions,
    pub geography: FacetOptions,
    pub persona: FacetOptions,
}

impl CohortOptions {
    /// First item of each facet, or a generic value for an empty facet.
    pub fn default_selection(&self) -> CohortSelection {
        CohortSelection {
            industry: self.industry.first_or(FALLBACK_INDUSTRY),
            geography: self.geography.first_or(FALLBACK_GEOGRAPHY),
            persona: self.persona.first_or(FALLBACK_PERSONA),
        }
    }

    /// True when every value of `selection` is one of the offered items.
    pub fn offers(&self, selection: &CohortSelection) -> bool {
        self.industry.items.contains(&selection.industry)
            && self.geography.items.contains(&selection.geography)
            && self.persona.items.contains(&selection.persona)
    }
}

/// Cohort options for `view_mode`, or `None` when the ICP has no block for it.
pub fn compile_options(icp: &Icp, view_mode: ViewMode) -> Option<CohortOptions> {
    match view_mode {
        ViewMode::B2B => {
            let corporate = icp.corporate_profile.as_ref()?;
            Some(CohortOptions {
                view_mode,
                industry: FacetOptions::new("Industry Cluster", corporate.industries.clone()),
                geography: FacetOptions::new("Region", corporate.geographies.clone()),
                persona: FacetOptions::new("Persona", corporate.job_titles.clone()),
            })
        }
        ViewMode::B2C => {
            let consumer = icp.consumer_profile.as_ref()?;
            let wealth_tiers = if consumer.wealth_tiers.is_empty() {
                DEFAULT_WEALTH_TIERS.iter().map(|s| s.to_string()).collect()
            } else {
                consumer.wealth_tiers.clone()
            };
            Some(CohortOptions {
                view_mode,
                industry: FacetOptions::new(
                    "Lifestyle Segment",
                    consumer.lifestyle_segments.clone(),
                ),
                geography: FacetOptions::new(
                    "Region / Target Interest",
                    consumer.interests.clone(),
                ),
                persona: FacetOptions::new("Wealth Tier (Wealth Segment)", wealth_tiers),
            })
        }
    }
}

/// View modes for which the ICP yields options, B2B first.
pub fn available_view_modes(icp: &Icp) -> Vec<ViewMode> {
    [ViewMode::B2B, ViewMode::B2C]
        .into_iter()
        .filter(|mode| compile_options(icp, *mode).is_some())
        .collect()
}

pub fn default_view_mode(icp: &Icp) -> ViewMode {
    match icp.business_model {
        BusinessModel::B2C => ViewMode::B2C,
        BusinessModel::B2B | BusinessModel::Hybrid => ViewMode::B2B,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConsumerProfile, CorporateProfile};
    use crate::profile::fallback_icp;

    fn consumer_only(wealth_tiers: Vec<String>) -> Icp {
        Icp {
            business_model: BusinessModel::B2C,
            products_and_services: vec![],
            value_proposition: String::new(),
            outbound_strategy: String::new(),
            corporate_profile: None,
            consumer_profile: Some(ConsumerProfile {
                wealth_tiers,
                interests: vec!["Direct Equity".into()],
                lifestyle_segments: vec!["Active Traders".into()],
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_hybrid_icp_offers_both_views() {
        let icp = fallback_icp();
        let b2b = compile_options(&icp, ViewMode::B2B).unwrap();
        let b2c = compile_options(&icp, ViewMode::B2C).unwrap();

        assert_eq!(b2b.industry.label, "Industry Cluster");
        assert_eq!(b2b.persona.items[0], "CFO");
        assert_eq!(b2c.persona.label, "Wealth Tier (Wealth Segment)");
        assert_eq!(b2c.geography.label, "Region / Target Interest");
        assert_eq!(available_view_modes(&icp), vec![ViewMode::B2B, ViewMode::B2C]);
    }

    #[test]
    fn test_empty_wealth_tiers_use_default_ladder() {
        let options = compile_options(&consumer_only(vec![]), ViewMode::B2C).unwrap();
        assert_eq!(
            options.persona.items,
            vec!["Mass Affluent", "Affluent", "HNIs", "UHNIs"]
        );
    }

    #[test]
    fn test_missing_block_yields_none() {
        let icp = consumer_only(vec!["HNIs".into()]);
        assert!(compile_options(&icp, ViewMode::B2B).is_none());
        assert_eq!(available_view_modes(&icp), vec![ViewMode::B2C]);
        assert_eq!(default_view_mode(&icp), ViewMode::B2C);
    }

    #[test]
    fn test_default_selection_fallbacks() {
        let mut icp = fallback_icp();
        icp.corporate_profile = Some(CorporateProfile::default());
        let selection = compile_options(&icp, ViewMode::B2B)
            .unwrap()
            .default_selection();
        assert_eq!(selection.industry, "General");
        assert_eq!(selection.geography, "India");
        assert_eq!(selection.persona, "Target User");
    }

    #[test]
    fn test_offers_detects_freeform_values() {
        let options = compile_options(&fallback_icp(), ViewMode::B2B).unwrap();
        let mut selection = options.default_selection();
        assert!(options.offers(&selection));
        selection.persona = "Chief Dreamer".into();
        assert!(!options.offers(&selection));
    }
}
