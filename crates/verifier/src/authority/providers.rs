use std::future::Future;
use std::pin::Pin;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use citeguard_common::config::ProviderCredentials;
use citeguard_common::types::{AuthorityMetadata, AuthorityRecord};
use citeguard_common::{Result, VerifyError};

use super::classify::classify_domain;

const MOZ_DEFAULT_BASE_URL: &str = "https://lens.moz.com/v2";
const OPEN_PAGERANK_DEFAULT_BASE_URL: &str = "https://openpagerank.com/api/v1.0";

/// One domain-authority ranking provider. Providers are consulted in fixed
/// order; the first success wins.
pub trait DomainAuthorityProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn get_authority<'a>(
        &'a self,
        domain: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<AuthorityRecord>> + Send + 'a>>;
}

fn classify_into(record: &mut AuthorityRecord) {
    let flags = classify_domain(&record.domain);
    record.is_government = flags.is_government;
    record.is_educational = flags.is_educational;
    record.is_non_profit = flags.is_non_profit;
    record.is_news = flags.is_news;
}

fn classify_status_error(provider: &str, status: reqwest::StatusCode, body: String) -> VerifyError {
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        VerifyError::LookupConfiguration(format!("{} rejected credentials: {}", provider, status))
    } else {
        VerifyError::LookupTransient(format!("{} returned {}: {}", provider, status, body))
    }
}

fn classify_reqwest_error(provider: &str, e: reqwest::Error) -> VerifyError {
    if e.is_timeout() {
        VerifyError::Timeout(format!("{}: {}", provider, e))
    } else {
        VerifyError::LookupTransient(format!("{}: {}", provider, e))
    }
}

// ---------------------------------------------------------------------------
// Moz Links API (primary)
// ---------------------------------------------------------------------------

pub struct MozProvider {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: std::time::Duration,
}

#[derive(Serialize)]
struct MozRequest<'a> {
    targets: Vec<&'a str>,
}

#[derive(Deserialize)]
struct MozResponse {
    results: Vec<MozMetrics>,
}

#[derive(Deserialize)]
struct MozMetrics {
    #[serde(default)]
    domain_authority: f64,
    #[serde(default)]
    spam_score: f64,
    #[serde(default)]
    pages_to_root_domain: u64,
    #[serde(default)]
    root_domains_to_root_domain: u64,
}

impl MozProvider {
    pub fn new(
        http: reqwest::Client,
        credentials: &ProviderCredentials,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            http,
            api_key: credentials.api_key.clone(),
            base_url: credentials
                .base_url
                .clone()
                .unwrap_or_else(|| MOZ_DEFAULT_BASE_URL.to_string()),
            timeout,
        }
    }

    async fn fetch(&self, domain: &str) -> Result<AuthorityRecord> {
        let response = self
            .http
            .post(format!("{}/url_metrics", self.base_url))
            .header("x-moz-token", &self.api_key)
            .timeout(self.timeout)
            .json(&MozRequest {
                targets: vec![domain],
            })
            .send()
            .await
            .map_err(|e| classify_reqwest_error("moz", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status_error("moz", status, body));
        }

        let body: MozResponse = response
            .json()
            .await
            .map_err(|e| VerifyError::LookupTransient(format!("moz parse: {}", e)))?;

        let metrics = body
            .results
            .into_iter()
            .next()
            .ok_or_else(|| VerifyError::LookupTransient("moz returned no results".to_string()))?;

        let mut record = AuthorityRecord {
            domain: domain.to_string(),
            authority_score: metrics.domain_authority.clamp(0.0, 100.0),
            // Moz reports spam on 0-17; trust is derived as its inverse.
            trust_score: (100.0 - (metrics.spam_score / 17.0) * 100.0).clamp(0.0, 100.0),
            spam_score: ((metrics.spam_score / 17.0) * 100.0).clamp(0.0, 100.0),
            backlinks: metrics.pages_to_root_domain,
            referring_domains: metrics.root_domains_to_root_domain,
            is_government: false,
            is_educational: false,
            is_non_profit: false,
            is_news: false,
            metadata: AuthorityMetadata {
                source: "moz".to_string(),
                checked_at: Utc::now(),
            },
        };
        classify_into(&mut record);
        Ok(record)
    }
}

impl DomainAuthorityProvider for MozProvider {
    fn name(&self) -> &'static str {
        "moz"
    }

    fn get_authority<'a>(
        &'a self,
        domain: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<AuthorityRecord>> + Send + 'a>> {
        Box::pin(self.fetch(domain))
    }
}

// ---------------------------------------------------------------------------
// Open PageRank (secondary)
// ---------------------------------------------------------------------------

pub struct OpenPageRankProvider {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: std::time::Duration,
}

#[derive(Deserialize)]
struct OpenPageRankResponse {
    response: Vec<OpenPageRankEntry>,
}

#[derive(Deserialize)]
struct OpenPageRankEntry {
    #[serde(default)]
    page_rank_decimal: f64,
    #[serde(default)]
    status_code: u16,
}

impl OpenPageRankProvider {
    pub fn new(
        http: reqwest::Client,
        credentials: &ProviderCredentials,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            http,
            api_key: credentials.api_key.clone(),
            base_url: credentials
                .base_url
                .clone()
                .unwrap_or_else(|| OPEN_PAGERANK_DEFAULT_BASE_URL.to_string()),
            timeout,
        }
    }

    async fn fetch(&self, domain: &str) -> Result<AuthorityRecord> {
        let response = self
            .http
            .get(format!("{}/getPageRank", self.base_url))
            .header("API-OPR", &self.api_key)
            .timeout(self.timeout)
            .query(&[("domains[]", domain)])
            .send()
            .await
            .map_err(|e| classify_reqwest_error("openpagerank", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status_error("openpagerank", status, body));
        }

        let body: OpenPageRankResponse = response
            .json()
            .await
            .map_err(|e| VerifyError::LookupTransient(format!("openpagerank parse: {}", e)))?;

        let entry = body.response.into_iter().next().ok_or_else(|| {
            VerifyError::LookupTransient("openpagerank returned no results".to_string())
        })?;

        if entry.status_code != 200 {
            return Err(VerifyError::LookupTransient(format!(
                "openpagerank has no rank for {} (status {})",
                domain, entry.status_code
            )));
        }

        // page_rank_decimal is 0-10; scale to the 0-100 authority range.
        let authority = (entry.page_rank_decimal * 10.0).clamp(0.0, 100.0);
        let mut record = AuthorityRecord {
            domain: domain.to_string(),
            authority_score: authority,
            trust_score: authority,
            spam_score: 0.0,
            backlinks: 0,
            referring_domains: 0,
            is_government: false,
            is_educational: false,
            is_non_profit: false,
            is_news: false,
            metadata: AuthorityMetadata {
                source: "openpagerank".to_string(),
                checked_at: Utc::now(),
            },
        };
        classify_into(&mut record);
        Ok(record)
    }
}

impl DomainAuthorityProvider for OpenPageRankProvider {
    fn name(&self) -> &'static str {
        "openpagerank"
    }

    fn get_authority<'a>(
        &'a self,
        domain: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<AuthorityRecord>> + Send + 'a>> {
        Box::pin(self.fetch(domain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_moz_response() {
        let json = r#"{
            "results": [{
                "domain_authority": 93.0,
                "spam_score": 1.0,
                "pages_to_root_domain": 120000,
                "root_domains_to_root_domain": 4500
            }]
        }"#;
        let parsed: MozResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].domain_authority, 93.0);
    }

    #[test]
    fn test_parse_open_pagerank_response() {
        let json = r#"{
            "response": [{"status_code": 200, "page_rank_decimal": 7.22, "domain": "example.com"}]
        }"#;
        let parsed: OpenPageRankResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.response[0].status_code, 200);
        assert!((parsed.response[0].page_rank_decimal - 7.22).abs() < 1e-9);
    }

    #[test]
    fn test_auth_failure_is_configuration_error() {
        let err = classify_status_error(
            "moz",
            reqwest::StatusCode::UNAUTHORIZED,
            "bad token".to_string(),
        );
        assert!(err.is_configuration());

        let err = classify_status_error(
            "moz",
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "oops".to_string(),
        );
        assert!(err.is_transient());
    }
}
