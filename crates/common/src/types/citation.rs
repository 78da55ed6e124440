use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Kind of reference detected in content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationType {
    Url,
    Doi,
    Academic,
    Unknown,
}

impl fmt::Display for CitationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Url => "url",
            Self::Doi => "doi",
            Self::Academic => "academic",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Byte offsets of a matched span within its section's content, suitable
/// for slicing the section string directly. Not character counts; the two
/// diverge on multibyte text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// One claimed reference found in content.
///
/// Citations are unique per `(type, normalized key)` within an extraction
/// run; duplicate spans referencing the same URL/DOI collapse to the first
/// occurrence regardless of section.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Citation {
    /// Stable identifier derived from the normalized key and span start,
    /// so repeated extraction of identical content yields identical ids.
    pub id: String,
    #[serde(rename = "type")]
    pub citation_type: CitationType,
    /// The raw matched span.
    pub text: String,
    /// Logical content section the span was found in.
    pub section: String,
    pub span: Span,
    /// Resolvable URL. For DOI citations this is the normalized
    /// `https://doi.org/<doi>` form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Publication name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Citation {
    /// Deduplication key, normalized per type: lowercased URL without a
    /// trailing slash, lowercased DOI, or `first-author|year` for academic
    /// citations. Falls back to the lowercased raw text.
    pub fn normalized_key(&self) -> String {
        match self.citation_type {
            CitationType::Url => self
                .url
                .as_deref()
                .map(normalize_url)
                .unwrap_or_else(|| self.text.to_lowercase()),
            CitationType::Doi => self
                .doi
                .as_deref()
                .map(|d| d.to_lowercase())
                .unwrap_or_else(|| self.text.to_lowercase()),
            CitationType::Academic => {
                let author = self
                    .authors
                    .first()
                    .map(|a| a.to_lowercase())
                    .unwrap_or_default();
                let year = self.year.map(|y| y.to_string()).unwrap_or_default();
                format!("{}|{}", author, year)
            }
            CitationType::Unknown => self.text.trim().to_lowercase(),
        }
    }

    /// Cache fingerprint, stable across extraction runs and positions.
    pub fn fingerprint(&self) -> String {
        format!("{}:{}", self.citation_type, self.normalized_key())
    }

    /// Derive the stable citation id from a normalized key and span start.
    pub fn derive_id(normalized_key: &str, start: usize) -> String {
        let mut hasher = std::hash::DefaultHasher::new();
        normalized_key.hash(&mut hasher);
        format!("cit-{:016x}-{}", hasher.finish(), start)
    }
}

fn normalize_url(url: &str) -> String {
    url.trim_end_matches('/').to_lowercase()
}
