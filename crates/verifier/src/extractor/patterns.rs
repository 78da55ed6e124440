use once_cell::sync::Lazy;
use regex::Regex;

use citeguard_common::types::{Citation, CitationType, Span};

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"')\]]+"#).expect("valid URL regex"));

static DOI_PREFIXED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bdoi:\s*(10\.\d{4,9}/\S+)").expect("valid DOI regex"));

static DOI_BARE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b10\.\d{4,9}/\S+").expect("valid bare DOI regex"));

/// `Surname, I. (YYYY). Title. Source.`
static ACADEMIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][A-Za-z'\-]+),\s((?:[A-Z]\.\s?)+)\((\d{4})\)\.\s+([^.]+)\.\s+([^.\n]+)\.")
        .expect("valid academic citation regex")
});

/// `Surname et al. (YYYY)`
static ET_AL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][A-Za-z'\-]+)\s+et\s+al\.\s*\((\d{4})\)").expect("valid et al regex")
});

/// Punctuation that a URL/DOI match may spuriously swallow at the end.
/// The DOI patterns match `\S+`, so a parenthesized mention like
/// `(doi:10.1000/182)` would otherwise keep the closing paren.
const TRAILING_PUNCT: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']'];

/// Run the deterministic pattern pass over one section.
/// Matches are returned in span order; deduplication happens upstream.
pub(super) fn scan_section(section: &str, text: &str) -> Vec<Citation> {
    let mut found = Vec::new();

    for m in URL_RE.find_iter(text) {
        let trimmed = m.as_str().trim_end_matches(TRAILING_PUNCT);
        let span = Span {
            start: m.start(),
            end: m.start() + trimmed.len(),
        };
        found.push(url_citation(trimmed, section, span));
    }

    for caps in DOI_PREFIXED_RE.captures_iter(text) {
        let whole = caps.get(0).expect("match group 0");
        let trimmed = whole.as_str().trim_end_matches(TRAILING_PUNCT);
        let doi = caps
            .get(1)
            .map(|g| g.as_str().trim_end_matches(TRAILING_PUNCT))
            .unwrap_or_default();
        found.push(doi_citation(
            doi,
            trimmed,
            section,
            Span {
                start: whole.start(),
                end: whole.start() + trimmed.len(),
            },
        ));
    }

    for m in DOI_BARE_RE.find_iter(text) {
        let doi = m.as_str().trim_end_matches(TRAILING_PUNCT);
        found.push(doi_citation(
            doi,
            doi,
            section,
            Span {
                start: m.start(),
                end: m.start() + doi.len(),
            },
        ));
    }

    for caps in ACADEMIC_RE.captures_iter(text) {
        let whole = caps.get(0).expect("match group 0");
        let surname = caps.get(1).map(|g| g.as_str()).unwrap_or_default();
        let initials = caps.get(2).map(|g| g.as_str().trim()).unwrap_or_default();
        let year = caps.get(3).and_then(|g| g.as_str().parse::<i32>().ok());
        let title = caps.get(4).map(|g| g.as_str().trim().to_string());
        let source = caps.get(5).map(|g| g.as_str().trim().to_string());

        found.push(academic_citation(
            whole.as_str(),
            section,
            Span {
                start: whole.start(),
                end: whole.end(),
            },
            vec![format!("{}, {}", surname, initials)],
            year,
            title,
            source,
        ));
    }

    for caps in ET_AL_RE.captures_iter(text) {
        let whole = caps.get(0).expect("match group 0");
        let surname = caps.get(1).map(|g| g.as_str()).unwrap_or_default();
        let year = caps.get(2).and_then(|g| g.as_str().parse::<i32>().ok());

        found.push(academic_citation(
            whole.as_str(),
            section,
            Span {
                start: whole.start(),
                end: whole.end(),
            },
            vec![format!("{} et al.", surname)],
            year,
            None,
            None,
        ));
    }

    found.sort_by_key(|c| c.span.start);
    found
}

fn url_citation(url: &str, section: &str, span: Span) -> Citation {
    // A doi.org link is a DOI citation; it must deduplicate against
    // doi:-prefixed mentions of the same identifier.
    if let Some(doi) = doi_from_url(url) {
        return doi_citation(&doi, url, section, span);
    }

    let key = url.trim_end_matches('/').to_lowercase();
    Citation {
        id: Citation::derive_id(&key, span.start),
        citation_type: CitationType::Url,
        text: url.to_string(),
        section: section.to_string(),
        span,
        url: Some(url.to_string()),
        doi: None,
        authors: Vec::new(),
        year: None,
        title: None,
        source: None,
    }
}

fn doi_citation(doi: &str, text: &str, section: &str, span: Span) -> Citation {
    let key = doi.to_lowercase();
    Citation {
        id: Citation::derive_id(&key, span.start),
        citation_type: CitationType::Doi,
        text: text.to_string(),
        section: section.to_string(),
        span,
        url: Some(format!("https://doi.org/{}", doi)),
        doi: Some(doi.to_string()),
        authors: Vec::new(),
        year: None,
        title: None,
        source: None,
    }
}

fn academic_citation(
    text: &str,
    section: &str,
    span: Span,
    authors: Vec<String>,
    year: Option<i32>,
    title: Option<String>,
    source: Option<String>,
) -> Citation {
    let key = format!(
        "{}|{}",
        authors
            .first()
            .map(|a| a.to_lowercase())
            .unwrap_or_default(),
        year.map(|y| y.to_string()).unwrap_or_default()
    );
    Citation {
        id: Citation::derive_id(&key, span.start),
        citation_type: CitationType::Academic,
        text: text.to_string(),
        section: section.to_string(),
        span,
        url: None,
        doi: None,
        authors,
        year,
        title,
        source,
    }
}

fn doi_from_url(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://doi.org/")
        .or_else(|| url.strip_prefix("http://doi.org/"))
        .or_else(|| url.strip_prefix("https://dx.doi.org/"))?;
    if rest.starts_with("10.") {
        Some(rest.to_string())
    } else {
        None
    }
}
