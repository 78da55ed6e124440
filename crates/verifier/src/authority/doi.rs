use chrono::Utc;
use serde::Deserialize;

use citeguard_common::config::{ProviderConfig, RetryConfig};
use citeguard_common::types::DoiVerification;
use citeguard_common::{Result, VerifyError};

use super::retry::with_retry;

#[derive(Deserialize)]
struct CrossrefResponse {
    message: serde_json::Value,
}

/// Resolve a DOI against the Crossref works endpoint.
/// Any resolution failure yields `valid: false` with the error recorded.
pub(super) async fn verify_doi(
    http: &reqwest::Client,
    doi: &str,
    providers: &ProviderConfig,
    retry_config: &RetryConfig,
    timeout: std::time::Duration,
) -> DoiVerification {
    let doi = doi.trim();
    if !doi.starts_with("10.") || !doi.contains('/') {
        return DoiVerification::failed("Invalid DOI format");
    }

    let start = std::time::Instant::now();
    let result = with_retry("verify_doi", retry_config, || {
        resolve(http, doi, &providers.crossref_base_url, timeout)
    })
    .await;
    metrics::histogram!("lookup.doi.latency").record(start.elapsed().as_secs_f64());

    match result {
        Ok(Some(metadata)) => DoiVerification {
            valid: true,
            metadata: Some(metadata),
            error: None,
            checked_at: Utc::now(),
        },
        // The registry answered definitively: this DOI does not exist.
        Ok(None) => DoiVerification::failed(format!("DOI not found: {}", doi)),
        Err(e) => {
            metrics::counter!("lookup.doi.errors").increment(1);
            DoiVerification::failed(e.to_string())
        }
    }
}

async fn resolve(
    http: &reqwest::Client,
    doi: &str,
    base_url: &str,
    timeout: std::time::Duration,
) -> Result<Option<serde_json::Value>> {
    let response = http
        .get(format!("{}/works/{}", base_url, doi))
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                VerifyError::Timeout(format!("crossref: {}", e))
            } else {
                VerifyError::LookupTransient(format!("crossref: {}", e))
            }
        })?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        // A 404 is a definitive answer, not a transient failure.
        return Ok(None);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(VerifyError::LookupTransient(format!(
            "crossref returned {}: {}",
            status, body
        )));
    }

    let body: CrossrefResponse = response
        .json()
        .await
        .map_err(|e| VerifyError::LookupTransient(format!("crossref parse: {}", e)))?;

    Ok(Some(prune_metadata(body.message)))
}

/// Keep only the registry fields the verifier reports on.
fn prune_metadata(message: serde_json::Value) -> serde_json::Value {
    let mut pruned = serde_json::Map::new();
    if let Some(obj) = message.as_object() {
        for field in ["title", "publisher", "container-title", "issued", "type"] {
            if let Some(value) = obj.get(field) {
                pruned.insert(field.to_string(), value.clone());
            }
        }
    }
    serde_json::Value::Object(pruned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_doi_format_short_circuits() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let http = reqwest::Client::new();
        let providers = ProviderConfig::default();
        let retry = RetryConfig::default();

        let result = rt.block_on(verify_doi(
            &http,
            "not-a-doi",
            &providers,
            &retry,
            std::time::Duration::from_millis(10),
        ));
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("Invalid DOI format"));
    }

    #[test]
    fn test_prune_metadata_keeps_reported_fields() {
        let message = serde_json::json!({
            "title": ["A Study"],
            "publisher": "Journal House",
            "reference-count": 42,
            "issued": {"date-parts": [[2023]]}
        });
        let pruned = prune_metadata(message);
        assert!(pruned.get("title").is_some());
        assert!(pruned.get("publisher").is_some());
        assert!(pruned.get("issued").is_some());
        assert!(pruned.get("reference-count").is_none());
    }
}
