use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::StatusThresholds;

use super::citation::Citation;
use super::extraction::ExtractionResult;

/// Audience class. Changes citation-strategy defaults and density targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    B2b,
    B2c,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::B2b => write!(f, "b2b"),
            Self::B2c => write!(f, "b2c"),
        }
    }
}

/// Sub-scores for one citation, each in [0, 10].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationScores {
    pub source_reputation: f64,
    pub recency: f64,
    pub authority_score: f64,
    pub relevance_score: f64,
}

/// Classification of a citation's overall score via fixed thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    HighAuthority,
    ModerateAuthority,
    LowAuthority,
    Unverified,
}

impl VerificationStatus {
    pub fn from_score(overall: f64, thresholds: &StatusThresholds) -> Self {
        if overall >= thresholds.high {
            Self::HighAuthority
        } else if overall >= thresholds.moderate {
            Self::ModerateAuthority
        } else if overall >= thresholds.low {
            Self::LowAuthority
        } else {
            Self::Unverified
        }
    }

    /// Whether this citation should be rewritten by enhancement.
    pub fn is_weak(&self) -> bool {
        matches!(self, Self::LowAuthority | Self::Unverified)
    }
}

/// How a citation's score was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationMethod {
    /// External lookups informed the score.
    #[serde(rename = "production-api")]
    ProductionApi,
    /// Deterministic non-network scoring path.
    #[serde(rename = "heuristic-fallback")]
    HeuristicFallback,
}

/// The judgement for one citation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub citation: Citation,
    pub verification: VerificationScores,
    /// Weighted combination of the sub-scores, [0, 10].
    pub overall_score: f64,
    pub verification_status: VerificationStatus,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    pub verification_method: VerificationMethod,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    pub title: String,
    pub citation_count: usize,
}

/// Aggregate verification report for one content object.
/// Always returned; downstream failures degrade scores instead of raising.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentVerificationReport {
    pub content_summary: ContentSummary,
    pub citations: Vec<VerificationResult>,
    /// Mean of per-citation overall scores; 0 when there are no citations.
    pub overall_credibility_score: f64,
    pub segment: Segment,
    pub extraction_result: ExtractionResult,
    pub processing_time_ms: u64,
    /// Set only for a catastrophic extraction-input failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Before/after result of the content-enhancement mode.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementOutcome {
    pub original_content: String,
    pub enhanced_content: String,
    pub original_verification: ContentVerificationReport,
    pub enhanced_verification: ContentVerificationReport,
    pub improvement_summary: ImprovementSummary,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementSummary {
    pub original_citation_count: usize,
    pub enhanced_citation_count: usize,
    pub original_score: f64,
    pub enhanced_score: f64,
    pub score_delta: f64,
    /// Human-readable description of what changed.
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_thresholds() {
        let t = StatusThresholds::default();
        assert_eq!(
            VerificationStatus::from_score(9.1, &t),
            VerificationStatus::HighAuthority
        );
        assert_eq!(
            VerificationStatus::from_score(8.0, &t),
            VerificationStatus::HighAuthority
        );
        assert_eq!(
            VerificationStatus::from_score(6.4, &t),
            VerificationStatus::ModerateAuthority
        );
        assert_eq!(
            VerificationStatus::from_score(3.0, &t),
            VerificationStatus::LowAuthority
        );
        assert_eq!(
            VerificationStatus::from_score(1.9, &t),
            VerificationStatus::Unverified
        );
    }

    #[test]
    fn test_weak_statuses() {
        assert!(VerificationStatus::Unverified.is_weak());
        assert!(VerificationStatus::LowAuthority.is_weak());
        assert!(!VerificationStatus::ModerateAuthority.is_weak());
        assert!(!VerificationStatus::HighAuthority.is_weak());
    }
}
