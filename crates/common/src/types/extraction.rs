use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::citation::{Citation, CitationType};

/// Section name used when a plain string is extracted.
pub const SYNTHETIC_SECTION: &str = "body";

/// Structured content with named sections, as produced by the content
/// generation layer.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StructuredContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Sections keyed by logical name ("introduction", "conclusion", ...).
    #[serde(default)]
    pub sections: BTreeMap<String, ContentSection>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContentSection {
    pub content: String,
}

/// Content handed to extraction: either a plain string (treated as one
/// synthetic section) or structured sections.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentInput {
    Text(String),
    Structured(StructuredContent),
}

impl ContentInput {
    /// Section view in deterministic order. Plain text becomes a single
    /// synthetic section.
    pub fn sections(&self) -> Vec<(String, &str)> {
        match self {
            Self::Text(text) => vec![(SYNTHETIC_SECTION.to_string(), text.as_str())],
            Self::Structured(content) => content
                .sections
                .iter()
                .map(|(name, section)| (name.clone(), section.content.as_str()))
                .collect(),
        }
    }

    /// Whether there is any non-whitespace content to extract from.
    pub fn is_empty(&self) -> bool {
        self.sections()
            .iter()
            .all(|(_, text)| text.trim().is_empty())
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Text(_) => None,
            Self::Structured(content) => content.title.as_deref(),
        }
    }
}

impl From<&str> for ContentInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ContentInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<StructuredContent> for ContentInput {
    fn from(content: StructuredContent) -> Self {
        Self::Structured(content)
    }
}

/// How an extraction run completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionMethod {
    /// Pattern pass, optionally merged with an AI-assisted pass.
    #[serde(rename = "hybrid-nlp-pattern")]
    HybridNlpPattern,
    /// Content was empty or unparseable; nothing was extracted.
    #[serde(rename = "error-fallback")]
    ErrorFallback,
}

/// Output of one extraction run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub citations: Vec<Citation>,
    pub total_found: usize,
    pub by_type: HashMap<CitationType, usize>,
    pub by_section: HashMap<String, usize>,
    pub extraction_method: ExtractionMethod,
    /// In [0, 1]. Zero when no citations were found.
    pub confidence: f64,
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    /// Empty result for null/unparseable content. Extraction never raises.
    pub fn error_fallback(processing_time_ms: u64) -> Self {
        Self {
            citations: Vec::new(),
            total_found: 0,
            by_type: HashMap::new(),
            by_section: HashMap::new(),
            extraction_method: ExtractionMethod::ErrorFallback,
            confidence: 0.0,
            processing_time_ms,
        }
    }
}
