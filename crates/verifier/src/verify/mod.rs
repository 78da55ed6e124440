mod enhance;
mod scoring;
mod strategy;

use std::sync::Arc;
use std::time::Instant;

use chrono::{Datelike, Utc};
use tokio::sync::Semaphore;

use citeguard_common::config::VerifierConfig;
use citeguard_common::types::{
    Citation, CitationType, ContentInput, ContentSummary, ContentVerificationReport,
    EnhancementOutcome, ExtractionMethod, ImprovementSummary, CitationStrategy, Segment,
    VerificationMethod, VerificationResult, VerificationStatus,
};

use crate::authority::{classify_domain, extract_domain, AuthorityClient, AuthorityLookup};
use crate::cache::VerificationCache;
use crate::completion::{ApiCompletionClient, CompletionClient};
use crate::extractor::CitationExtractor;

/// Orchestrates citation verification: extraction, cache-first authority
/// lookups with heuristic fallback, scoring, and aggregation into a
/// content-level credibility score.
///
/// Collaborators are injected so tests can substitute any of them.
pub struct CitationVerifier {
    extractor: CitationExtractor,
    lookup: Arc<dyn AuthorityLookup>,
    cache: Arc<VerificationCache>,
    config: Arc<VerifierConfig>,
}

impl CitationVerifier {
    pub fn new(
        extractor: CitationExtractor,
        lookup: Arc<dyn AuthorityLookup>,
        cache: Arc<VerificationCache>,
        config: VerifierConfig,
    ) -> Self {
        Self {
            extractor,
            lookup,
            cache,
            config: Arc::new(config),
        }
    }

    /// Wire the production collaborators from configuration alone.
    pub fn from_config(config: VerifierConfig) -> Self {
        let completion: Option<Arc<dyn CompletionClient>> = config
            .ai
            .clone()
            .and_then(|ai| ApiCompletionClient::new(ai, config.retry.clone(), &config.http))
            .map(|client| Arc::new(client) as Arc<dyn CompletionClient>);

        let extractor = CitationExtractor::new(completion);
        let lookup: Arc<dyn AuthorityLookup> = Arc::new(AuthorityClient::new(config.clone()));
        let cache = Arc::new(VerificationCache::new(&config.cache));

        Self::new(extractor, lookup, cache, config)
    }

    pub fn cache(&self) -> &VerificationCache {
        &self.cache
    }

    /// Verify every citation in the content and aggregate a credibility
    /// score. Always returns a report; downstream lookup failures degrade
    /// individual citations to heuristic scoring instead of raising.
    pub async fn verify_citations(
        &self,
        content: &ContentInput,
        segment: Segment,
    ) -> ContentVerificationReport {
        let start = Instant::now();
        let extraction = self.extractor.extract(content).await;

        let title = content
            .title()
            .map(String::from)
            .unwrap_or_else(|| "Untitled content".to_string());

        if extraction.extraction_method == ExtractionMethod::ErrorFallback {
            return ContentVerificationReport {
                content_summary: ContentSummary {
                    title,
                    citation_count: 0,
                },
                citations: Vec::new(),
                overall_credibility_score: 0.0,
                segment,
                extraction_result: extraction,
                processing_time_ms: start.elapsed().as_millis() as u64,
                error: Some("Content is empty or unparseable".to_string()),
            };
        }

        // Per-citation fan-out, bounded so external providers are not
        // overwhelmed. Output order matches extraction order because
        // handles are awaited in spawn order.
        let semaphore = Arc::new(Semaphore::new(
            self.config.concurrency.max_concurrent_lookups.max(1),
        ));
        let mut handles = Vec::with_capacity(extraction.citations.len());
        for citation in extraction.citations.iter().cloned() {
            handles.push(tokio::spawn(verify_one(
                citation,
                Arc::clone(&self.lookup),
                Arc::clone(&self.cache),
                Arc::clone(&self.config),
                Arc::clone(&semaphore),
            )));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (handle, citation) in handles.into_iter().zip(extraction.citations.iter()) {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!(error = %e, citation = %citation.id, "Verification task failed");
                    results.push(heuristic_result(citation.clone(), &self.config));
                }
            }
        }

        let overall = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.overall_score).sum::<f64>() / results.len() as f64
        };

        let elapsed = start.elapsed();
        metrics::histogram!("verify.report.latency").record(elapsed.as_secs_f64());
        metrics::counter!("verify.citations_verified").increment(results.len() as u64);
        tracing::info!(
            citations = results.len(),
            credibility = overall,
            segment = %segment,
            "Content verification complete"
        );

        ContentVerificationReport {
            content_summary: ContentSummary {
                title,
                citation_count: results.len(),
            },
            citations: results,
            overall_credibility_score: overall,
            segment,
            extraction_result: extraction,
            processing_time_ms: elapsed.as_millis() as u64,
            error: None,
        }
    }

    /// Rewrite weak citations with supporting high-authority references and
    /// re-verify. Never removes citations; if the rewrite fails to improve
    /// the credibility score, the original content and report are returned
    /// unchanged.
    pub async fn enhance_citation_authority(
        &self,
        content: &ContentInput,
        segment: Segment,
    ) -> EnhancementOutcome {
        let original = self.verify_citations(content, segment).await;

        let weak: Vec<&VerificationResult> = original
            .citations
            .iter()
            .filter(|r| r.verification_status.is_weak())
            .collect();

        if weak.is_empty() {
            let rendered = enhance::flatten_content(content);
            return EnhancementOutcome {
                original_content: rendered.clone(),
                enhanced_content: rendered,
                improvement_summary: ImprovementSummary {
                    original_citation_count: original.content_summary.citation_count,
                    enhanced_citation_count: original.content_summary.citation_count,
                    original_score: original.overall_credibility_score,
                    enhanced_score: original.overall_credibility_score,
                    score_delta: 0.0,
                    notes: "All citations already meet the authority bar; content unchanged."
                        .to_string(),
                },
                enhanced_verification: original.clone(),
                original_verification: original,
            };
        }

        let enhanced_content = enhance::rewrite_weak_citations(content, &weak, segment);
        let enhanced = self.verify_citations(&enhanced_content, segment).await;

        if enhanced.overall_credibility_score < original.overall_credibility_score {
            // Deterministic guard: never report a regression.
            tracing::warn!(
                original = original.overall_credibility_score,
                enhanced = enhanced.overall_credibility_score,
                "Enhancement did not improve credibility, keeping original"
            );
            let rendered = enhance::flatten_content(content);
            return EnhancementOutcome {
                original_content: rendered.clone(),
                enhanced_content: rendered,
                improvement_summary: ImprovementSummary {
                    original_citation_count: original.content_summary.citation_count,
                    enhanced_citation_count: original.content_summary.citation_count,
                    original_score: original.overall_credibility_score,
                    enhanced_score: original.overall_credibility_score,
                    score_delta: 0.0,
                    notes: "Enhancement did not improve credibility; original content retained."
                        .to_string(),
                },
                enhanced_verification: original.clone(),
                original_verification: original,
            };
        }

        let delta = enhanced.overall_credibility_score - original.overall_credibility_score;
        let notes = format!(
            "Rewrote {} weak citation(s); credibility {:.1} → {:.1} (+{:.1}), {} → {} citations.",
            weak.len(),
            original.overall_credibility_score,
            enhanced.overall_credibility_score,
            delta,
            original.content_summary.citation_count,
            enhanced.content_summary.citation_count,
        );

        EnhancementOutcome {
            original_content: enhance::flatten_content(content),
            enhanced_content: enhance::flatten_content(&enhanced_content),
            improvement_summary: ImprovementSummary {
                original_citation_count: original.content_summary.citation_count,
                enhanced_citation_count: enhanced.content_summary.citation_count,
                original_score: original.overall_credibility_score,
                enhanced_score: enhanced.overall_credibility_score,
                score_delta: delta,
                notes,
            },
            original_verification: original,
            enhanced_verification: enhanced,
        }
    }

    /// Recommend a citation plan for a topic/segment before content exists.
    /// Pure policy data — no extraction or lookups.
    pub fn generate_citation_strategy(&self, topic: &str, segment: Segment) -> CitationStrategy {
        strategy::generate(topic, segment)
    }
}

/// Verify one citation: cache first, then the type-appropriate lookups,
/// heuristics when lookups return nothing. Terminal states are a cache
/// hit, a scored lookup result, or a heuristic score.
async fn verify_one(
    citation: Citation,
    lookup: Arc<dyn AuthorityLookup>,
    cache: Arc<VerificationCache>,
    config: Arc<VerifierConfig>,
    semaphore: Arc<Semaphore>,
) -> VerificationResult {
    let _permit = semaphore.acquire_owned().await.ok();

    let fingerprint = citation.fingerprint();
    if let Some(cached) = cache.get_result(&fingerprint) {
        return cached;
    }

    let mut issues = Vec::new();
    let mut url_validation = None;
    let mut authority = None;
    let mut doi_verification = None;
    let mut flags = crate::authority::DomainFlags::default();

    match citation.citation_type {
        CitationType::Url => {
            if let Some(url) = &citation.url {
                let domain = extract_domain(url);
                flags = classify_domain(&domain);

                let validation = lookup.validate_url(url).await;
                issues.extend(validation.errors.iter().cloned());
                url_validation = Some(validation);

                authority = match cache.get_domain(&domain) {
                    Some(record) => Some(record),
                    None => {
                        let record = lookup.get_domain_authority(&domain).await;
                        if let Some(record) = &record {
                            cache.set_domain(domain.clone(), record.clone());
                        }
                        record
                    }
                };
            }
        }
        CitationType::Doi => {
            if let Some(doi) = &citation.doi {
                let verification = lookup.verify_doi(doi).await;
                if !verification.valid {
                    if let Some(error) = &verification.error {
                        issues.push(format!("DOI verification failed: {}", error));
                    }
                }
                doi_verification = Some(verification);
            }
        }
        // No network-verifiable target; scored heuristically below.
        CitationType::Academic | CitationType::Unknown => {}
    }

    let inputs = scoring::ScoringInputs {
        citation: &citation,
        flags,
        url_validation: url_validation.as_ref(),
        authority: authority.as_ref(),
        doi: doi_verification.as_ref(),
        current_year: Utc::now().year(),
    };
    let scores = scoring::score_citation(&inputs, &config.scoring);
    let overall = scoring::overall_score(&scores, &config.scoring.weights);
    let status = VerificationStatus::from_score(overall, &config.scoring.thresholds);

    let production_evidence = url_validation.as_ref().is_some_and(|v| v.is_accessible)
        || authority.is_some()
        || doi_verification.as_ref().is_some_and(|d| d.valid);
    let method = if production_evidence {
        VerificationMethod::ProductionApi
    } else {
        VerificationMethod::HeuristicFallback
    };

    let suggestions = build_suggestions(&citation, url_validation.as_ref(), status);

    let result = VerificationResult {
        citation,
        verification: scores,
        overall_score: overall,
        verification_status: status,
        issues,
        suggestions,
        verification_method: method,
    };

    cache.set_result(fingerprint, result.clone());
    result
}

/// Pure heuristic result, used when a verification task itself fails.
fn heuristic_result(citation: Citation, config: &VerifierConfig) -> VerificationResult {
    let flags = citation
        .url
        .as_deref()
        .map(|url| classify_domain(&extract_domain(url)))
        .unwrap_or_default();

    let inputs = scoring::ScoringInputs {
        citation: &citation,
        flags,
        url_validation: None,
        authority: None,
        doi: None,
        current_year: Utc::now().year(),
    };
    let scores = scoring::score_citation(&inputs, &config.scoring);
    let overall = scoring::overall_score(&scores, &config.scoring.weights);
    let status = VerificationStatus::from_score(overall, &config.scoring.thresholds);
    let suggestions = build_suggestions(&citation, None, status);

    VerificationResult {
        citation,
        verification: scores,
        overall_score: overall,
        verification_status: status,
        issues: Vec::new(),
        suggestions,
        verification_method: VerificationMethod::HeuristicFallback,
    }
}

fn build_suggestions(
    citation: &Citation,
    url_validation: Option<&citeguard_common::types::UrlValidation>,
    status: VerificationStatus,
) -> Vec<String> {
    let mut suggestions = Vec::new();

    if let Some(validation) = url_validation {
        if validation.is_valid && !validation.is_secure {
            suggestions.push("Prefer the https version of this URL".to_string());
        }
        if !validation.is_valid {
            suggestions.push("Fix the URL format or replace the link".to_string());
        }
    }

    if citation.citation_type == CitationType::Academic && citation.year.is_none() {
        suggestions.push("Add a publication year".to_string());
    }

    if status.is_weak() {
        suggestions.push(
            "Replace with a higher-authority source (government, academic, or peer-reviewed)"
                .to_string(),
        );
    }

    suggestions
}
