//! Derivation of lead insight blocks from a scraped profile record.
//!
//! Everything here is a pure function of the lead and the record: merging the same record
//! into the same lead twice produces identical blocks.

use crate::brightdata_client::{ProfilePost, ProfileRecord};
use crate::models::{BehavioralInsights, Lead, SocialData, SocialMetric, SocialPost, VisualAnalysis};
use regex::Regex;
use std::sync::OnceLock;

const DEFAULT_BIO: &str = "Top-tier executive with deep market expertise.";
const MAX_RECENT_POSTS: usize = 5;

// ============ Seniority ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Seniority {
    Individual,
    Manager,
    Director,
    VicePresident,
    CSuite,
    Founder,
}

impl Seniority {
    /// Reads seniority from a headline or job title. The most senior match wins.
    pub fn detect(headline: &str) -> Self {
        static PATTERNS: OnceLock<Vec<(Seniority, Regex)>> = OnceLock::new();
        let patterns = PATTERNS.get_or_init(|| {
            [
                (Seniority::Founder, r"\b(co-?)?founder\b|\bpromoter\b|\bowner\b"),
                (
                    Seniority::CSuite,
                    r"\bc[efiotm]o\b|\bchief\b|\bmanaging director\b|\bpresident\b|\bpartner\b",
                ),
                (Seniority::VicePresident, r"\bvp\b|\bhead of\b"),
                (Seniority::Director, r"\bdirector\b"),
                (Seniority::Manager, r"\bmanager\b|\blead\b"),
            ]
            .into_iter()
            .filter_map(|(level, pattern)| Regex::new(pattern).ok().map(|re| (level, re)))
            .collect()
        });

        // "vice president" must not read as "president"
        let normalized = headline
            .to_lowercase()
            .replace("vice president", "vp")
            .replace("vice-president", "vp");

        patterns
            .iter()
            .find(|(_, re)| re.is_match(&normalized))
            .map(|(level, _)| *level)
            .unwrap_or(Seniority::Individual)
    }

    fn base_score(self) -> u32 {
        match self {
            Seniority::Founder => 40,
            Seniority::CSuite => 35,
            Seniority::VicePresident => 28,
            Seniority::Director => 22,
            Seniority::Manager => 12,
            Seniority::Individual => 5,
        }
    }
}

// ============ Wealth tiers ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WealthTier {
    UltraHigh,
    VeryHigh,
    High,
    Moderate,
    Low,
}

impl WealthTier {
    pub fn from_score(score: u32) -> Self {
        match score {
            75.. => WealthTier::UltraHigh,
            55..=74 => WealthTier::VeryHigh,
            40..=54 => WealthTier::High,
            20..=39 => WealthTier::Moderate,
            _ => WealthTier::Low,
        }
    }

    pub fn spending_capacity(self) -> &'static str {
        match self {
            WealthTier::UltraHigh => "ULTRA-HIGH",
            WealthTier::VeryHigh => "VERY HIGH",
            WealthTier::High => "HIGH",
            WealthTier::Moderate => "MODERATE",
            WealthTier::Low => "LOW",
        }
    }

    pub fn investable_surplus(self) -> &'static str {
        match self {
            WealthTier::UltraHigh => "₹1Cr+ ANNUALLY",
            WealthTier::VeryHigh => "₹50L+ ANNUALLY",
            WealthTier::High => "₹25L - ₹50L RANGE",
            WealthTier::Moderate => "₹10L - ₹25L RANGE",
            WealthTier::Low => "UNDER ₹10L",
        }
    }

    pub fn purchasing_propensity(self) -> &'static str {
        match self {
            WealthTier::UltraHigh => "High (Focuses on Value and Network)",
            WealthTier::VeryHigh => "High (Quality and Brand Driven)",
            WealthTier::High => "Medium-High (Considered Purchases)",
            WealthTier::Moderate => "Medium (Value Conscious)",
            WealthTier::Low => "Low (Price Sensitive)",
        }
    }
}

const INVESTING_KEYWORDS: &[&str] = &[
    "angel",
    "investor",
    "venture",
    "portfolio",
    "private equity",
    "family office",
];
const LUXURY_KEYWORDS: &[&str] = &["luxury", "yacht", "golf", "private jet", "wine", "travel"];
const BOARD_KEYWORDS: &[&str] = &["board member", "board of directors", "advisory board"];

/// Lower-cased text the keyword signals are read from.
fn signal_corpus(lead: &Lead, record: &ProfileRecord) -> String {
    let mut corpus = String::new();
    for part in [
        record.headline.as_deref(),
        record.about.as_deref(),
        lead.description.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        corpus.push_str(part);
        corpus.push('\n');
    }
    for post in &record.posts {
        corpus.push_str(&post.text);
        corpus.push('\n');
    }
    corpus.to_lowercase()
}

fn mentions_any(corpus: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| corpus.contains(keyword))
}

fn follower_points(followers: Option<u64>) -> u32 {
    match followers.unwrap_or(0) {
        50_000.. => 25,
        10_000..=49_999 => 18,
        2_000..=9_999 => 10,
        500..=1_999 => 5,
        _ => 0,
    }
}

/// Seniority plus reach, career length and investing/luxury signals.
pub fn wealth_score(lead: &Lead, record: &ProfileRecord) -> u32 {
    let headline = record.headline.as_deref().unwrap_or(&lead.title);
    let corpus = signal_corpus(lead, record);

    let mut score = Seniority::detect(headline).base_score();
    score += follower_points(record.followers);
    score += record.experience.len().min(10) as u32 * 2;
    if mentions_any(&corpus, INVESTING_KEYWORDS) {
        score += 10;
    }
    if mentions_any(&corpus, LUXURY_KEYWORDS) {
        score += 5;
    }
    score
}

// ============ Blocks ============

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn existing_stub(lead: &Lead) -> SocialData {
    lead.social_data.clone().unwrap_or_default()
}

/// Average likes over followers, as a percentage rounded to two decimals.
pub fn engagement_rate(posts: &[ProfilePost], followers: u64) -> f64 {
    if posts.is_empty() || followers == 0 {
        return 0.0;
    }
    let total_likes = posts
        .iter()
        .fold(0u64, |acc, post| acc.saturating_add(post.likes));
    let average = total_likes as f64 / posts.len() as f64;
    (average / followers as f64 * 10_000.0).round() / 100.0
}

fn social_data(lead: &Lead, record: &ProfileRecord) -> SocialData {
    let stub = existing_stub(lead);

    let bio = non_blank(record.about.as_deref())
        .or_else(|| non_blank(lead.description.as_deref()))
        .unwrap_or(DEFAULT_BIO)
        .to_string();

    let recent_posts = record
        .posts
        .iter()
        .take(MAX_RECENT_POSTS)
        .enumerate()
        .map(|(i, post)| SocialPost {
            id: format!("bd-{}", i + 1),
            image: post.images.first().cloned(),
            text: post.text.clone(),
            likes: post.likes,
            date: post.date.clone(),
        })
        .collect();

    let metrics = record
        .followers
        .map(|followers| {
            let date = non_blank(record.timestamp.as_deref())
                .or_else(|| record.posts.first().and_then(|p| non_blank(Some(&p.date))))
                .unwrap_or("latest")
                .to_string();
            vec![SocialMetric {
                date,
                followers,
                engagement: engagement_rate(&record.posts, followers),
            }]
        })
        .unwrap_or_default();

    SocialData {
        bio,
        profile_pic: non_blank(record.profile_pic.as_deref())
            .map(str::to_string)
            .unwrap_or(stub.profile_pic),
        banner: non_blank(record.background_pic.as_deref())
            .map(str::to_string)
            .unwrap_or(stub.banner),
        recent_posts,
        metrics,
    }
}

fn lifestyle_indications(seniority: Seniority, corpus: &str) -> String {
    let mut indicators = Vec::new();
    if mentions_any(corpus, INVESTING_KEYWORDS) {
        indicators.push("Angel Investor");
    }
    if mentions_any(corpus, LUXURY_KEYWORDS) {
        indicators.push("Premium Luxury Traveler");
    }
    if mentions_any(corpus, BOARD_KEYWORDS) {
        indicators.push("Board Member");
    }
    if seniority == Seniority::Founder {
        indicators.push("Entrepreneur");
    }
    if seniority >= Seniority::Director {
        indicators.push("Corporate Executive");
    }

    if indicators.is_empty() {
        "Professional".to_string()
    } else {
        indicators.join(", ")
    }
}

fn behavioral_insights(lead: &Lead, record: &ProfileRecord) -> BehavioralInsights {
    let headline = record.headline.as_deref().unwrap_or(&lead.title);
    let tier = WealthTier::from_score(wealth_score(lead, record));
    let corpus = signal_corpus(lead, record);

    BehavioralInsights {
        spending_capacity: tier.spending_capacity().to_string(),
        investable_surplus: tier.investable_surplus().to_string(),
        lifestyle_indications: lifestyle_indications(Seniority::detect(headline), &corpus),
        purchasing_propensity: tier.purchasing_propensity().to_string(),
    }
}

fn visual_analysis(lead: &Lead, record: &ProfileRecord) -> VisualAnalysis {
    let headline = record.headline.as_deref().unwrap_or(&lead.title);
    let seniority = Seniority::detect(headline);
    let tier = WealthTier::from_score(wealth_score(lead, record));

    let profile_aesthetic = if non_blank(record.profile_pic.as_deref()).is_none() {
        "Minimal / No Profile Photo"
    } else if tier == WealthTier::UltraHigh {
        "Ultra-High Net Worth (UHNW) Professional"
    } else if seniority >= Seniority::Director {
        "Executive Professional"
    } else {
        "Professional Modern"
    };

    let cover_photo_context = match non_blank(record.background_pic.as_deref()) {
        Some(_) => match non_blank(record.location.as_deref()) {
            Some(location) => format!("Custom Professional Banner ({})", location),
            None => "Custom Professional Banner".to_string(),
        },
        None => "Default Platform Banner".to_string(),
    };

    let with_images = record
        .posts
        .iter()
        .filter(|post| !post.images.is_empty())
        .count();
    let image_gallery_summary = match (record.posts.len(), with_images) {
        (0, _) => "No recent posts available for visual review.".to_string(),
        (total, 0) => format!("{} recent posts, text only.", total),
        (total, images) => format!("{} of {} recent posts include images.", images, total),
    };

    VisualAnalysis {
        profile_aesthetic: profile_aesthetic.to_string(),
        cover_photo_context,
        image_gallery_summary,
    }
}

/// Returns `lead` with its social, visual and behavioral blocks replaced by data derived from
/// `record`. Identity, contact and classification fields are left untouched.
pub fn merge_profile(lead: &Lead, record: &ProfileRecord) -> Lead {
    let mut merged = lead.clone();
    merged.social_data = Some(social_data(lead, record));
    merged.visual_analysis = Some(visual_analysis(lead, record));
    merged.behavioral_insights = Some(behavioral_insights(lead, record));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProspectType;
    use serde_json::json;

    fn lead() -> Lead {
        Lead {
            id: "lead-0-1".into(),
            company_name: "Example Capital".into(),
            contact_person: "Asha Rao".into(),
            title: "Founder & CEO".into(),
            email: "verified@leadflow.ai".into(),
            location: "Mumbai".into(),
            tech_stack: vec![],
            revenue: "TBD".into(),
            enrichment_score: 85,
            last_signal: "Raised Series B".into(),
            social_score: 80,
            website: None,
            source_url: Some("https://linkedin.com/in/asha".into()),
            social_links: None,
            description: Some("Fintech founder".into()),
            prospect_type: ProspectType::B2B,
            visual_analysis: None,
            behavioral_insights: None,
            social_data: Some(SocialData {
                profile_pic: "https://i.pravatar.cc/150?u=100".into(),
                banner: "https://picsum.photos/800/200?random=100".into(),
                ..Default::default()
            }),
        }
    }

    fn record() -> ProfileRecord {
        ProfileRecord {
            headline: Some("Founder & CEO, Example Capital | Angel Investor".into()),
            about: Some("Building wealth tech for India.".into()),
            location: Some("Mumbai".into()),
            profile_pic: Some("https://cdn.example.com/asha.jpg".into()),
            followers: Some(20_000),
            experience: vec![json!({}); 6],
            posts: vec![
                ProfilePost {
                    text: "Closed our Series C".into(),
                    images: vec!["https://cdn.example.com/p1.jpg".into()],
                    likes: 300,
                    date: "2024-10-20".into(),
                },
                ProfilePost {
                    text: "AI in Indian fintech".into(),
                    images: vec![],
                    likes: 100,
                    date: "2024-10-18".into(),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_seniority_detection() {
        assert_eq!(Seniority::detect("Co-Founder at X"), Seniority::Founder);
        assert_eq!(Seniority::detect("CFO"), Seniority::CSuite);
        assert_eq!(Seniority::detect("Vice President, Sales"), Seniority::VicePresident);
        assert_eq!(Seniority::detect("Director - Wealth"), Seniority::Director);
        assert_eq!(Seniority::detect("Product Manager"), Seniority::Manager);
        assert_eq!(Seniority::detect("Analyst"), Seniority::Individual);
    }

    #[test]
    fn test_engagement_rate() {
        assert_eq!(engagement_rate(&record().posts, 20_000), 1.0);
        assert_eq!(engagement_rate(&[], 20_000), 0.0);
        assert_eq!(engagement_rate(&record().posts, 0), 0.0);
    }

    #[test]
    fn test_engagement_rate_saturates_on_huge_likes() {
        let posts = vec![
            ProfilePost {
                likes: u64::MAX,
                ..Default::default()
            },
            ProfilePost {
                likes: u64::MAX,
                ..Default::default()
            },
        ];
        let rate = engagement_rate(&posts, 1_000);
        assert!(rate.is_finite());
        assert!(rate > 0.0);
    }

    #[test]
    fn test_merge_overwrites_blocks_and_keeps_identity() {
        let original = lead();
        let merged = merge_profile(&original, &record());

        assert_eq!(merged.id, original.id);
        assert_eq!(merged.contact_person, original.contact_person);
        assert_eq!(merged.enrichment_score, 85);
        assert_eq!(merged.social_score, 80);

        let social = merged.social_data.unwrap();
        assert_eq!(social.bio, "Building wealth tech for India.");
        assert_eq!(social.profile_pic, "https://cdn.example.com/asha.jpg");
        assert_eq!(social.banner, "https://picsum.photos/800/200?random=100");
        assert_eq!(social.recent_posts.len(), 2);
        assert_eq!(social.recent_posts[0].id, "bd-1");
        assert_eq!(
            social.recent_posts[0].image.as_deref(),
            Some("https://cdn.example.com/p1.jpg")
        );
        assert_eq!(social.metrics.len(), 1);
        assert_eq!(social.metrics[0].date, "2024-10-20");

        let insights = merged.behavioral_insights.unwrap();
        assert_eq!(insights.spending_capacity, "ULTRA-HIGH");
        assert_eq!(insights.investable_surplus, "₹1Cr+ ANNUALLY");
        assert!(insights.lifestyle_indications.contains("Angel Investor"));

        let visual = merged.visual_analysis.unwrap();
        assert_eq!(
            visual.profile_aesthetic,
            "Ultra-High Net Worth (UHNW) Professional"
        );
        assert_eq!(visual.image_gallery_summary, "1 of 2 recent posts include images.");
    }

    #[test]
    fn test_merge_is_deterministic() {
        let first = merge_profile(&lead(), &record());
        let second = merge_profile(&first, &record());
        assert_eq!(first, second);
    }

    #[test]
    fn test_sparse_record_uses_fallbacks() {
        let mut l = lead();
        l.description = None;
        let merged = merge_profile(&l, &ProfileRecord::default());

        let social = merged.social_data.unwrap();
        assert_eq!(social.bio, DEFAULT_BIO);
        assert!(social.metrics.is_empty());
        assert_eq!(social.profile_pic, "https://i.pravatar.cc/150?u=100");

        let visual = merged.visual_analysis.unwrap();
        assert_eq!(visual.profile_aesthetic, "Minimal / No Profile Photo");
        assert_eq!(visual.cover_photo_context, "Default Platform Banner");
    }
}
