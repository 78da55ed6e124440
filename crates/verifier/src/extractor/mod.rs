mod ai_pass;
mod patterns;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use citeguard_common::types::{
    Citation, CitationType, ContentInput, ExtractionMethod, ExtractionResult,
};

use crate::completion::CompletionClient;

/// Turns raw or structured content into a deduplicated list of citations.
///
/// The deterministic pattern pass always runs; the AI-assisted pass runs
/// when a completion capability is present and degrades silently when it
/// fails. Extraction never raises — unusable content yields an
/// error-fallback result.
pub struct CitationExtractor {
    completion: Option<Arc<dyn CompletionClient>>,
}

impl CitationExtractor {
    pub fn new(completion: Option<Arc<dyn CompletionClient>>) -> Self {
        Self { completion }
    }

    /// Pattern-only extractor.
    pub fn pattern_only() -> Self {
        Self { completion: None }
    }

    pub async fn extract(&self, content: &ContentInput) -> ExtractionResult {
        let start = Instant::now();

        if content.is_empty() {
            tracing::warn!("Extraction received empty or unparseable content");
            metrics::counter!("extract.error_fallback").increment(1);
            return ExtractionResult::error_fallback(start.elapsed().as_millis() as u64);
        }

        // Deterministic pass, deduplicated by (type, normalized key) with
        // the first occurrence winning across sections.
        let mut citations = Vec::new();
        let mut seen: HashSet<(CitationType, String)> = HashSet::new();
        for (section, text) in content.sections() {
            for citation in patterns::scan_section(&section, text) {
                let key = (citation.citation_type, citation.normalized_key());
                if seen.insert(key) {
                    citations.push(citation);
                }
            }
        }

        // Optional AI-assisted pass for citations patterns cannot catch.
        let mut ai_agreed = None;
        if let Some(client) = &self.completion {
            if let Some(outcome) = ai_pass::run(client.as_ref(), content, &citations).await {
                ai_agreed = Some(outcome.agreed);
                for citation in outcome.citations {
                    let key = (citation.citation_type, citation.normalized_key());
                    if seen.insert(key) {
                        citations.push(citation);
                    }
                }
            }
        }

        let mut by_type: HashMap<CitationType, usize> = HashMap::new();
        let mut by_section: HashMap<String, usize> = HashMap::new();
        for citation in &citations {
            *by_type.entry(citation.citation_type).or_insert(0) += 1;
            *by_section.entry(citation.section.clone()).or_insert(0) += 1;
        }

        let confidence = compute_confidence(&citations, ai_agreed);
        let elapsed = start.elapsed();
        metrics::histogram!("extract.latency").record(elapsed.as_secs_f64());
        metrics::counter!("extract.citations_found").increment(citations.len() as u64);
        tracing::debug!(
            citations = citations.len(),
            confidence = confidence,
            "Extraction complete"
        );

        ExtractionResult {
            total_found: citations.len(),
            citations,
            by_type,
            by_section,
            extraction_method: ExtractionMethod::HybridNlpPattern,
            confidence,
            processing_time_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Confidence in [0, 1]: mean per-citation field completeness, with a bonus
/// when the AI pass ran and agreed with the pattern pass. Zero citations
/// means zero confidence.
fn compute_confidence(citations: &[Citation], ai_agreed: Option<bool>) -> f64 {
    if citations.is_empty() {
        return 0.0;
    }

    let completeness_sum: f64 = citations.iter().map(field_completeness).sum();
    let base = completeness_sum / citations.len() as f64;

    let bonus = match ai_agreed {
        Some(true) => 0.1,
        _ => 0.0,
    };

    (base * 0.9 + bonus).clamp(0.0, 1.0)
}

/// Fraction of type-specific fields populated for one citation.
fn field_completeness(citation: &Citation) -> f64 {
    match citation.citation_type {
        CitationType::Url => {
            if citation.url.is_some() {
                1.0
            } else {
                0.0
            }
        }
        CitationType::Doi => {
            let populated = citation.doi.is_some() as u32 + citation.url.is_some() as u32;
            populated as f64 / 2.0
        }
        CitationType::Academic => {
            let populated = !citation.authors.is_empty() as u32
                + citation.year.is_some() as u32
                + citation.title.is_some() as u32
                + citation.source.is_some() as u32;
            populated as f64 / 4.0
        }
        CitationType::Unknown => 0.25,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citeguard_common::types::{ContentSection, Span, StructuredContent};

    fn extract_blocking(content: &ContentInput) -> ExtractionResult {
        let extractor = CitationExtractor::pattern_only();
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(extractor.extract(content))
    }

    #[test]
    fn test_single_url_extraction() {
        let result = extract_blocking(&ContentInput::from(
            "See https://example.com/ai-research for details.",
        ));
        assert_eq!(result.total_found, 1);
        assert_eq!(
            result.citations[0].url.as_deref(),
            Some("https://example.com/ai-research")
        );
        assert_eq!(result.by_type.get(&CitationType::Url), Some(&1));
        assert_eq!(result.extraction_method, ExtractionMethod::HybridNlpPattern);
    }

    #[test]
    fn test_doi_normalized_to_url() {
        let result = extract_blocking(&ContentInput::from("Published as doi:10.1000/182."));
        assert_eq!(result.total_found, 1);
        let citation = &result.citations[0];
        assert_eq!(citation.citation_type, CitationType::Doi);
        assert_eq!(citation.url.as_deref(), Some("https://doi.org/10.1000/182"));
    }

    #[test]
    fn test_dedup_across_sections() {
        let mut content = StructuredContent {
            title: Some("Study roundup".to_string()),
            sections: Default::default(),
        };
        content.sections.insert(
            "introduction".to_string(),
            ContentSection {
                content: "Start at https://example.com/study today.".to_string(),
            },
        );
        content.sections.insert(
            "conclusion".to_string(),
            ContentSection {
                content: "As shown at https://example.com/study earlier.".to_string(),
            },
        );

        let result = extract_blocking(&content.into());
        assert_eq!(result.total_found, 1);
        // First occurrence wins: sections iterate in name order.
        assert_eq!(result.citations[0].section, "conclusion");
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let content =
            ContentInput::from("See https://example.com/a and Smith, J. (2023). AI. Journal.");
        let first = extract_blocking(&content);
        let second = extract_blocking(&content);

        let first_ids: Vec<_> = first.citations.iter().map(|c| c.id.clone()).collect();
        let second_ids: Vec<_> = second.citations.iter().map(|c| c.id.clone()).collect();
        assert_eq!(first_ids, second_ids);
        assert_eq!(first.total_found, second.total_found);
    }

    #[test]
    fn test_empty_content_is_error_fallback() {
        let result = extract_blocking(&ContentInput::from("   \n\t "));
        assert_eq!(result.extraction_method, ExtractionMethod::ErrorFallback);
        assert_eq!(result.total_found, 0);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_confidence_bounds() {
        assert_eq!(compute_confidence(&[], None), 0.0);

        let full = Citation {
            id: "cit-x-0".to_string(),
            citation_type: CitationType::Academic,
            text: "Smith, J. (2023). AI Study. Journal of AI.".to_string(),
            section: "body".to_string(),
            span: Span { start: 0, end: 42 },
            url: None,
            doi: None,
            authors: vec!["Smith, J.".to_string()],
            year: Some(2023),
            title: Some("AI Study".to_string()),
            source: Some("Journal of AI".to_string()),
        };

        let with_agreement = compute_confidence(std::slice::from_ref(&full), Some(true));
        let without = compute_confidence(std::slice::from_ref(&full), None);
        assert!(with_agreement > without);
        assert!((0.0..=1.0).contains(&with_agreement));
        assert!((0.0..=1.0).contains(&without));
    }
}
