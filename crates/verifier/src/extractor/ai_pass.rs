use serde::Deserialize;

use citeguard_common::types::{Citation, CitationType, ContentInput, Span};

use crate::completion::{CompletionClient, CompletionRequest};

/// Similarity above which an AI-suggested citation is considered the same
/// as an already-extracted one.
const FUZZY_DUPLICATE_THRESHOLD: f64 = 0.85;

const AI_PASS_MAX_TOKENS: u32 = 1024;

/// What the AI pass produced after defensive parsing and deduplication.
pub(super) struct AiPassOutcome {
    /// Citations the pattern pass missed.
    pub citations: Vec<Citation>,
    /// True when the AI pass found nothing beyond the pattern pass.
    pub agreed: bool,
}

/// One citation as returned by the completion capability.
/// Every field is optional; malformed items are skipped, not fatal.
#[derive(Debug, Deserialize)]
struct AiCitationWire {
    #[serde(default, rename = "type")]
    citation_type: Option<String>,
    text: String,
    #[serde(default)]
    section: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    doi: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AiCitationEnvelope {
    citations: Vec<AiCitationWire>,
}

/// Run the AI-assisted pass. Any capability error or unparseable output
/// returns None — the caller proceeds with pattern citations only.
pub(super) async fn run(
    client: &dyn CompletionClient,
    content: &ContentInput,
    existing: &[Citation],
) -> Option<AiPassOutcome> {
    let request = CompletionRequest {
        prompt: build_prompt(content),
        max_tokens: AI_PASS_MAX_TOKENS,
        temperature: Some(0.0),
    };

    let response = match client.generate_completion(&request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "AI extraction pass failed, continuing with pattern citations");
            metrics::counter!("extract.ai_pass.errors").increment(1);
            return None;
        }
    };

    let wire = match parse_wire_citations(&response.text) {
        Some(wire) => wire,
        None => {
            tracing::warn!("AI extraction pass returned unparseable output, ignoring");
            metrics::counter!("extract.ai_pass.unparseable").increment(1);
            return None;
        }
    };

    let mut extras = Vec::new();
    for item in wire {
        if let Some(citation) = place_citation(item, content, existing, &extras) {
            extras.push(citation);
        }
    }

    let agreed = extras.is_empty();
    Some(AiPassOutcome {
        citations: extras,
        agreed,
    })
}

fn build_prompt(content: &ContentInput) -> String {
    let mut body = String::new();
    for (name, text) in content.sections() {
        body.push_str(&format!("## {}\n{}\n\n", name, text));
    }

    format!(
        "Find citations in the content below that simple pattern matching would miss: \
         free-text academic mentions, named studies, and report references without URLs. \
         Return ONLY a JSON array. Each element: \
         {{\"type\": \"url\"|\"doi\"|\"academic\", \"text\": \"<exact span from the content>\", \
         \"section\": \"<section name>\", \"url\": null, \"doi\": null, \
         \"authors\": [], \"year\": null, \"title\": null, \"source\": null}}. \
         The \"text\" value must be copied verbatim from the content. \
         Return [] if there are none.\n\n{}",
        body
    )
}

/// Parse the model output into wire citations. Tolerates code fences and an
/// object wrapping the array under a "citations" key.
fn parse_wire_citations(text: &str) -> Option<Vec<AiCitationWire>> {
    let stripped = strip_code_fences(text);

    if let Ok(list) = serde_json::from_str::<Vec<AiCitationWire>>(stripped) {
        return Some(list);
    }
    if let Ok(envelope) = serde_json::from_str::<AiCitationEnvelope>(stripped) {
        return Some(envelope.citations);
    }
    None
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

/// Locate the AI-suggested span in the content and build a Citation,
/// skipping anything already covered by the pattern pass.
fn place_citation(
    item: AiCitationWire,
    content: &ContentInput,
    existing: &[Citation],
    extras: &[Citation],
) -> Option<Citation> {
    let text = item.text.trim();
    if text.is_empty() {
        return None;
    }

    // Fuzzy-duplicate check against everything already extracted.
    let normalized = text.to_lowercase();
    for other in existing.iter().chain(extras.iter()) {
        if strsim::jaro_winkler(&normalized, &other.text.to_lowercase())
            > FUZZY_DUPLICATE_THRESHOLD
        {
            return None;
        }
    }

    let (section, start) = locate_span(content, text, item.section.as_deref())?;

    let citation_type = match item.citation_type.as_deref() {
        Some("url") => CitationType::Url,
        Some("doi") => CitationType::Doi,
        Some("academic") => CitationType::Academic,
        _ if item.doi.is_some() => CitationType::Doi,
        _ if item.url.is_some() => CitationType::Url,
        _ if !item.authors.is_empty() || item.year.is_some() => CitationType::Academic,
        _ => CitationType::Unknown,
    };

    let span = Span {
        start,
        end: start + text.len(),
    };

    let url = match citation_type {
        CitationType::Doi => item
            .doi
            .as_ref()
            .map(|d| format!("https://doi.org/{}", d))
            .or(item.url.clone()),
        _ => item.url.clone(),
    };

    let mut citation = Citation {
        id: String::new(),
        citation_type,
        text: text.to_string(),
        section,
        span,
        url,
        doi: item.doi,
        authors: item.authors,
        year: item.year,
        title: item.title,
        source: item.source,
    };
    citation.id = Citation::derive_id(&citation.normalized_key(), span.start);

    // Key-level duplicate check (same URL/DOI phrased differently).
    let key = (citation.citation_type, citation.normalized_key());
    let duplicate = existing
        .iter()
        .chain(extras.iter())
        .any(|c| (c.citation_type, c.normalized_key()) == key);
    if duplicate {
        return None;
    }

    Some(citation)
}

/// Find the exact span in the content, preferring the section the model
/// named. Unlocatable spans are dropped — positions must be real.
fn locate_span(
    content: &ContentInput,
    text: &str,
    preferred_section: Option<&str>,
) -> Option<(String, usize)> {
    let sections = content.sections();

    if let Some(preferred) = preferred_section {
        if let Some((name, body)) = sections.iter().find(|(name, _)| name == preferred) {
            if let Some(start) = body.find(text) {
                return Some((name.clone(), start));
            }
        }
    }

    for (name, body) in &sections {
        if let Some(start) = body.find(text) {
            return Some((name.clone(), start));
        }
    }

    tracing::debug!(text = text, "AI citation span not found in content, skipping");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_array() {
        let out = parse_wire_citations(r#"[{"text": "the 2020 Stanford study"}]"#).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "the 2020 Stanford study");
    }

    #[test]
    fn test_parse_fenced_envelope() {
        let raw = "```json\n{\"citations\": [{\"text\": \"a\", \"year\": 2021}]}\n```";
        let out = parse_wire_citations(raw).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].year, Some(2021));
    }

    #[test]
    fn test_garbage_is_none() {
        assert!(parse_wire_citations("I could not find any citations.").is_none());
        assert!(parse_wire_citations("").is_none());
    }

    #[test]
    fn test_place_citation_locates_span() {
        let content = ContentInput::from("According to the Stanford AI Index 2024, adoption grew.");
        let item = AiCitationWire {
            citation_type: Some("academic".to_string()),
            text: "Stanford AI Index 2024".to_string(),
            section: None,
            url: None,
            doi: None,
            authors: vec!["Stanford HAI".to_string()],
            year: Some(2024),
            title: None,
            source: None,
        };

        let citation = place_citation(item, &content, &[], &[]).unwrap();
        assert_eq!(citation.span.start, 17);
        assert_eq!(citation.section, "body");
        assert_eq!(citation.citation_type, CitationType::Academic);
    }

    #[test]
    fn test_unlocatable_span_is_dropped() {
        let content = ContentInput::from("Nothing here.");
        let item = AiCitationWire {
            citation_type: None,
            text: "phantom reference".to_string(),
            section: None,
            url: None,
            doi: None,
            authors: Vec::new(),
            year: None,
            title: None,
            source: None,
        };
        assert!(place_citation(item, &content, &[], &[]).is_none());
    }
}
