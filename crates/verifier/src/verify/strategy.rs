//! Segment-aware citation strategy: pure policy data keyed by segment,
//! refined by topic keywords. No extraction or lookups happen here.

use citeguard_common::types::{
    AuthorityHierarchy, CitationStrategy, DensityRecommendation, Segment,
};

pub(super) fn generate(topic: &str, segment: Segment) -> CitationStrategy {
    let mut strategy = match segment {
        Segment::B2b => b2b_defaults(topic),
        Segment::B2c => b2c_defaults(topic),
    };

    refine_by_topic(topic, &mut strategy);
    strategy
}

fn b2b_defaults(topic: &str) -> CitationStrategy {
    CitationStrategy {
        topic: topic.to_string(),
        segment: Segment::B2b,
        recommended_sources: vec![
            "Peer-reviewed journals".to_string(),
            "Industry analyst reports".to_string(),
            "Government statistics".to_string(),
            "Standards bodies".to_string(),
        ],
        preferred_formats: vec![
            "DOI-linked journal article".to_string(),
            "Technical report with publisher URL".to_string(),
            "Author-year academic citation".to_string(),
        ],
        authority_hierarchy: AuthorityHierarchy {
            tier1: vec![
                "Peer-reviewed journals".to_string(),
                "Government data".to_string(),
            ],
            tier2: vec![
                "Industry analyst reports".to_string(),
                "Standards bodies".to_string(),
            ],
            tier3: vec!["Trade publications".to_string()],
            tier4: vec!["Expert commentary".to_string()],
        },
        density_recommendation: DensityRecommendation {
            minimum_citations: 5,
            recommended_citations_per_section: 2,
        },
    }
}

fn b2c_defaults(topic: &str) -> CitationStrategy {
    CitationStrategy {
        topic: topic.to_string(),
        segment: Segment::B2c,
        recommended_sources: vec![
            "Consumer research organizations".to_string(),
            "Expert opinion".to_string(),
            "Established news outlets".to_string(),
        ],
        preferred_formats: vec![
            "Linked article from a recognized outlet".to_string(),
            "Named expert attribution".to_string(),
        ],
        authority_hierarchy: AuthorityHierarchy {
            tier1: vec![
                "Consumer research organizations".to_string(),
                "Government consumer guidance".to_string(),
            ],
            tier2: vec!["Expert opinion".to_string()],
            tier3: vec!["Established news outlets".to_string()],
            tier4: vec!["Practitioner blogs".to_string()],
        },
        density_recommendation: DensityRecommendation {
            minimum_citations: 3,
            recommended_citations_per_section: 1,
        },
    }
}

fn refine_by_topic(topic: &str, strategy: &mut CitationStrategy) {
    let topic = topic.to_lowercase();

    if contains_any(&topic, &["health", "medical", "clinical", "medicine"]) {
        strategy
            .recommended_sources
            .insert(0, "Clinical literature (PubMed-indexed)".to_string());
        strategy
            .authority_hierarchy
            .tier1
            .push("Clinical trials and systematic reviews".to_string());
    }

    if contains_any(&topic, &["software", "technology", "ai", "engineering"]) {
        strategy
            .recommended_sources
            .push("IEEE/ACM publications".to_string());
        strategy
            .authority_hierarchy
            .tier2
            .push("Preprint archives".to_string());
    }

    if contains_any(&topic, &["finance", "investment", "banking", "economy"]) {
        strategy
            .recommended_sources
            .push("Regulatory filings".to_string());
        strategy
            .authority_hierarchy
            .tier1
            .push("Central bank publications".to_string());
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
