//! Deterministic scoring functions. Every score is a pure function of the
//! citation and its lookup results, so identical inputs always produce
//! identical scores.

use citeguard_common::config::{ScoreWeights, ScoringConfig};
use citeguard_common::types::{
    AuthorityRecord, Citation, CitationType, DoiVerification, UrlValidation, VerificationScores,
};

use crate::authority::DomainFlags;

/// Everything known about one citation when scoring happens.
pub(super) struct ScoringInputs<'a> {
    pub citation: &'a Citation,
    pub flags: DomainFlags,
    pub url_validation: Option<&'a UrlValidation>,
    pub authority: Option<&'a AuthorityRecord>,
    pub doi: Option<&'a DoiVerification>,
    pub current_year: i32,
}

pub(super) fn score_citation(inputs: &ScoringInputs<'_>, config: &ScoringConfig) -> VerificationScores {
    VerificationScores {
        source_reputation: reputation_score(inputs),
        recency: recency_score(
            inputs.citation.year,
            inputs.current_year,
            config.recency_window_years,
        ),
        authority_score: authority_score(inputs),
        relevance_score: relevance_score(inputs.citation),
    }
}

pub(super) fn overall_score(scores: &VerificationScores, weights: &ScoreWeights) -> f64 {
    let weight_sum = weights.reputation + weights.recency + weights.authority + weights.relevance;
    if weight_sum <= 0.0 {
        return 0.0;
    }
    let weighted = scores.source_reputation * weights.reputation
        + scores.recency * weights.recency
        + scores.authority_score * weights.authority
        + scores.relevance_score * weights.relevance;
    (weighted / weight_sum).clamp(0.0, 10.0)
}

/// Source reputation from domain class, transport security, and registry
/// confirmation. Ranges over [0, 10].
fn reputation_score(inputs: &ScoringInputs<'_>) -> f64 {
    let flags = &inputs.flags;
    let mut score: f64 = if flags.is_government {
        9.5
    } else if flags.is_educational {
        9.0
    } else if flags.is_non_profit {
        7.5
    } else if flags.is_news {
        7.0
    } else {
        5.0
    };

    // A registry-confirmed DOI is strong evidence regardless of domain.
    if inputs.doi.is_some_and(|d| d.valid) {
        score = score.max(9.0);
    }
    if inputs.doi.is_some_and(|d| !d.valid && d.error.is_some()) {
        score -= 2.0;
    }

    if let Some(validation) = inputs.url_validation {
        if validation.is_secure {
            score += 0.5;
        }
        if validation.is_valid && !validation.is_accessible {
            score -= 1.5;
        }
        if !validation.is_valid {
            score -= 3.0;
        }
    }

    score.clamp(0.0, 10.0)
}

/// Recency in [0, 10]: full marks inside the recent window, stepping down
/// with age. A missing year is neutral, neither penalized nor rewarded.
pub(super) fn recency_score(year: Option<i32>, current_year: i32, window_years: i32) -> f64 {
    let year = match year {
        Some(year) => year,
        None => return 5.0,
    };

    let age = current_year - year;
    if age < 0 {
        // Future-dated citations are suspicious but not disqualifying.
        return 5.0;
    }
    if age <= window_years {
        10.0
    } else if age <= 5 {
        8.0
    } else if age <= 10 {
        6.0
    } else {
        4.0
    }
}

/// Authority in [0, 10]: provider-reported when available, otherwise the
/// deterministic heuristic. Always positive.
fn authority_score(inputs: &ScoringInputs<'_>) -> f64 {
    match inputs.authority {
        Some(record) => {
            let blended = record.authority_score * 0.7 + record.trust_score * 0.3;
            let mut score = blended / 10.0;
            // Heavy spam signal drags the score down.
            if record.spam_score > 50.0 {
                score -= 2.0;
            }
            score.clamp(0.5, 10.0)
        }
        None => heuristic_authority(&inputs.flags),
    }
}

/// Non-network fallback: fixed mid-range score scaled by domain class.
pub(super) fn heuristic_authority(flags: &DomainFlags) -> f64 {
    let mut score: f64 = 5.0;
    if flags.is_government {
        score += 3.0;
    }
    if flags.is_educational {
        score += 2.5;
    }
    if flags.is_non_profit {
        score += 1.5;
    }
    if flags.is_news {
        score += 1.0;
    }
    score.min(10.0)
}

/// Relevance proxy in [0, 10]: how completely the citation identifies its
/// source. A fully-specified academic citation outranks a bare URL.
fn relevance_score(citation: &Citation) -> f64 {
    let mut score: f64 = 5.0;
    if citation.title.is_some() {
        score += 1.5;
    }
    if citation.source.is_some() {
        score += 1.5;
    }
    if !citation.authors.is_empty() {
        score += 1.0;
    }
    if citation.year.is_some() {
        score += 1.0;
    }
    if citation.citation_type == CitationType::Unknown {
        score -= 2.0;
    }
    score.clamp(0.0, 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use citeguard_common::types::Span;

    fn citation(citation_type: CitationType) -> Citation {
        Citation {
            id: "cit-test-0".to_string(),
            citation_type,
            text: "test".to_string(),
            section: "body".to_string(),
            span: Span { start: 0, end: 4 },
            url: None,
            doi: None,
            authors: Vec::new(),
            year: None,
            title: None,
            source: None,
        }
    }

    fn gov_flags() -> DomainFlags {
        DomainFlags {
            is_government: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_recency_steps() {
        assert_eq!(recency_score(Some(2026), 2026, 3), 10.0);
        assert_eq!(recency_score(Some(2023), 2026, 3), 10.0);
        assert_eq!(recency_score(Some(2021), 2026, 3), 8.0);
        assert_eq!(recency_score(Some(2017), 2026, 3), 6.0);
        assert_eq!(recency_score(Some(2000), 2026, 3), 4.0);
        // Missing year is neutral.
        assert_eq!(recency_score(None, 2026, 3), 5.0);
        // Future-dated is neutral too.
        assert_eq!(recency_score(Some(2030), 2026, 3), 5.0);
    }

    #[test]
    fn test_heuristic_authority_always_positive() {
        assert!(heuristic_authority(&DomainFlags::default()) > 0.0);
        assert_eq!(heuristic_authority(&DomainFlags::default()), 5.0);
        assert_eq!(heuristic_authority(&gov_flags()), 8.0);
    }

    #[test]
    fn test_overall_score_bounds_and_weighting() {
        let scores = VerificationScores {
            source_reputation: 10.0,
            recency: 10.0,
            authority_score: 10.0,
            relevance_score: 10.0,
        };
        let weights = ScoreWeights::default();
        assert!((overall_score(&scores, &weights) - 10.0).abs() < 1e-9);

        let zero = VerificationScores {
            source_reputation: 0.0,
            recency: 0.0,
            authority_score: 0.0,
            relevance_score: 0.0,
        };
        assert_eq!(overall_score(&zero, &weights), 0.0);
    }

    #[test]
    fn test_provider_record_drives_authority() {
        let record = AuthorityRecord {
            domain: "example.com".to_string(),
            authority_score: 90.0,
            trust_score: 80.0,
            spam_score: 1.0,
            backlinks: 0,
            referring_domains: 0,
            is_government: false,
            is_educational: false,
            is_non_profit: false,
            is_news: false,
            metadata: citeguard_common::types::AuthorityMetadata {
                source: "moz".to_string(),
                checked_at: Utc::now(),
            },
        };
        let c = citation(CitationType::Url);
        let inputs = ScoringInputs {
            citation: &c,
            flags: DomainFlags::default(),
            url_validation: None,
            authority: Some(&record),
            doi: None,
            current_year: 2026,
        };
        // 90*0.7 + 80*0.3 = 87 → 8.7
        assert!((authority_score(&inputs) - 8.7).abs() < 1e-9);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let c = citation(CitationType::Url);
        let inputs = ScoringInputs {
            citation: &c,
            flags: gov_flags(),
            url_validation: None,
            authority: None,
            doi: None,
            current_year: 2026,
        };
        let config = ScoringConfig::default();
        let first = score_citation(&inputs, &config);
        let second = score_citation(&inputs, &config);
        assert_eq!(first.source_reputation, second.source_reputation);
        assert_eq!(first.authority_score, second.authority_score);
        assert_eq!(first.recency, second.recency);
        assert_eq!(first.relevance_score, second.relevance_score);
    }

    #[test]
    fn test_all_subscores_in_range() {
        let mut c = citation(CitationType::Academic);
        c.authors = vec!["Smith, J.".to_string()];
        c.year = Some(2023);
        c.title = Some("AI Study".to_string());
        c.source = Some("Journal of AI".to_string());

        let inputs = ScoringInputs {
            citation: &c,
            flags: DomainFlags::default(),
            url_validation: None,
            authority: None,
            doi: None,
            current_year: 2026,
        };
        let scores = score_citation(&inputs, &ScoringConfig::default());
        for value in [
            scores.source_reputation,
            scores.recency,
            scores.authority_score,
            scores.relevance_score,
        ] {
            assert!((0.0..=10.0).contains(&value), "out of range: {}", value);
        }
    }
}
