use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credibility record for one domain/source.
///
/// Created by an authority lookup, immutable afterwards, cached with a TTL.
/// An expired cache entry is treated as absent, never as negative evidence.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorityRecord {
    pub domain: String,
    /// Provider-reported authority, 0–100.
    pub authority_score: f64,
    /// Provider-reported trust, 0–100.
    pub trust_score: f64,
    /// Provider-reported spam likelihood, 0–100 (higher is worse).
    pub spam_score: f64,
    pub backlinks: u64,
    pub referring_domains: u64,
    pub is_government: bool,
    pub is_educational: bool,
    pub is_non_profit: bool,
    pub is_news: bool,
    pub metadata: AuthorityMetadata,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorityMetadata {
    /// Which provider answered ("moz", "openpagerank", ...).
    pub source: String,
    pub checked_at: DateTime<Utc>,
}

/// Outcome of validating one URL.
///
/// `is_valid` is pure syntactic validation; `is_accessible` additionally
/// requires a successful network probe. Network failures populate `errors`
/// rather than raising.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlValidation {
    pub is_valid: bool,
    pub is_accessible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub is_secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    pub metadata: UrlCheckMetadata,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlCheckMetadata {
    pub checked_at: DateTime<Utc>,
    pub response_time_ms: u64,
}

impl UrlValidation {
    /// Short-circuit result for a syntactically malformed URL.
    /// No network call is made.
    pub fn malformed() -> Self {
        Self {
            is_valid: false,
            is_accessible: false,
            status_code: None,
            is_secure: false,
            content_type: None,
            title: None,
            errors: vec!["Invalid URL format".to_string()],
            metadata: UrlCheckMetadata {
                checked_at: Utc::now(),
                response_time_ms: 0,
            },
        }
    }
}

/// Outcome of resolving one DOI against a scholarly registry.
/// Any resolution failure yields `valid: false` with an error message.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoiVerification {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl DoiVerification {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            metadata: None,
            error: Some(error.into()),
            checked_at: Utc::now(),
        }
    }
}
