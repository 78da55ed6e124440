use serde::{Deserialize, Serialize};

use super::verification::Segment;

/// Recommended citation plan for a topic/segment, produced before any
/// content exists. Pure policy data, no extraction or lookups involved.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationStrategy {
    pub topic: String,
    pub segment: Segment,
    pub recommended_sources: Vec<String>,
    pub preferred_formats: Vec<String>,
    pub authority_hierarchy: AuthorityHierarchy,
    pub density_recommendation: DensityRecommendation,
}

/// Source classes ranked from most to least authoritative.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthorityHierarchy {
    pub tier1: Vec<String>,
    pub tier2: Vec<String>,
    pub tier3: Vec<String>,
    pub tier4: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DensityRecommendation {
    pub minimum_citations: usize,
    pub recommended_citations_per_section: usize,
}
