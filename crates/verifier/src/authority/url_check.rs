use std::time::Instant;

use chrono::Utc;
use scraper::{Html, Selector};

use citeguard_common::config::{HttpConfig, RetryConfig};
use citeguard_common::types::{UrlCheckMetadata, UrlValidation};
use citeguard_common::{Result, VerifyError};

use super::retry::with_retry;

/// Validate a URL: syntactic check first, then a network probe.
///
/// A malformed URL short-circuits without a network call. Network failures
/// populate `errors` and never propagate; the retry budget applies to
/// transient failures only.
pub(super) async fn validate_url(
    http: &reqwest::Client,
    url: &str,
    http_config: &HttpConfig,
    retry_config: &RetryConfig,
) -> UrlValidation {
    if !is_well_formed(url) {
        metrics::counter!("lookup.url.malformed").increment(1);
        return UrlValidation::malformed();
    }

    let start = Instant::now();
    let is_secure = url.starts_with("https://");
    let timeout = std::time::Duration::from_millis(http_config.timeout_ms);

    let probe = with_retry("validate_url", retry_config, || {
        probe_url(http, url, timeout)
    })
    .await;

    let elapsed_ms = start.elapsed().as_millis() as u64;
    metrics::histogram!("lookup.url.latency").record(start.elapsed().as_secs_f64());

    match probe {
        Ok(outcome) => UrlValidation {
            is_valid: true,
            is_accessible: outcome.accessible,
            status_code: Some(outcome.status_code),
            is_secure,
            content_type: outcome.content_type,
            title: outcome.title,
            errors: if outcome.accessible {
                Vec::new()
            } else {
                vec![format!(
                    "URL not accessible: HTTP status {}",
                    outcome.status_code
                )]
            },
            metadata: UrlCheckMetadata {
                checked_at: Utc::now(),
                response_time_ms: elapsed_ms,
            },
        },
        Err(e) => {
            metrics::counter!("lookup.url.errors").increment(1);
            UrlValidation {
                is_valid: true,
                is_accessible: false,
                status_code: None,
                is_secure,
                content_type: None,
                title: None,
                errors: vec![format!("URL not accessible: {}", e)],
                metadata: UrlCheckMetadata {
                    checked_at: Utc::now(),
                    response_time_ms: elapsed_ms,
                },
            }
        }
    }
}

/// Pure syntactic validation: http(s) scheme and a plausible host.
pub(super) fn is_well_formed(url: &str) -> bool {
    let rest = match url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    {
        Some(rest) => rest,
        None => return false,
    };

    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    let host = host.rsplit('@').next().unwrap_or("");
    let host = host.split(':').next().unwrap_or("");

    !host.is_empty()
        && host.contains('.')
        && !host.contains(char::is_whitespace)
        && !host.starts_with('.')
        && !host.ends_with('.')
}

struct ProbeOutcome {
    status_code: u16,
    accessible: bool,
    content_type: Option<String>,
    title: Option<String>,
}

/// HEAD probe with GET fallback when HEAD is rejected. GET responses with
/// an HTML body also yield the page title.
async fn probe_url(
    http: &reqwest::Client,
    url: &str,
    timeout: std::time::Duration,
) -> Result<ProbeOutcome> {
    let head = http
        .head(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(classify_reqwest_error)?;

    let head_status = head.status();
    if head_status != reqwest::StatusCode::METHOD_NOT_ALLOWED
        && head_status != reqwest::StatusCode::NOT_IMPLEMENTED
    {
        return Ok(ProbeOutcome {
            status_code: head_status.as_u16(),
            accessible: head_status.is_success(),
            content_type: header_string(&head, "content-type"),
            title: None,
        });
    }

    let get = http
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(classify_reqwest_error)?;

    let status = get.status();
    let content_type = header_string(&get, "content-type");
    let is_html = content_type
        .as_deref()
        .is_some_and(|ct| ct.contains("text/html"));

    let title = if status.is_success() && is_html {
        let body = get
            .text()
            .await
            .map_err(|e| VerifyError::LookupTransient(e.to_string()))?;
        extract_title(&body)
    } else {
        None
    };

    Ok(ProbeOutcome {
        status_code: status.as_u16(),
        accessible: status.is_success(),
        content_type,
        title,
    })
}

fn header_string(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn classify_reqwest_error(e: reqwest::Error) -> VerifyError {
    if e.is_timeout() {
        VerifyError::Timeout(e.to_string())
    } else {
        VerifyError::LookupTransient(e.to_string())
    }
}

fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_urls() {
        assert!(is_well_formed("https://example.com"));
        assert!(is_well_formed("http://example.com/path?q=1"));
        assert!(is_well_formed("https://sub.example.co.uk:8443/a"));
    }

    #[test]
    fn test_malformed_urls() {
        assert!(!is_well_formed("example.com"));
        assert!(!is_well_formed("ftp://example.com"));
        assert!(!is_well_formed("https://"));
        assert!(!is_well_formed("https://nodot"));
        assert!(!is_well_formed("https://bad host.com"));
        assert!(!is_well_formed("not a url"));
    }

    #[test]
    fn test_malformed_url_short_circuits() {
        let validation = UrlValidation::malformed();
        assert!(!validation.is_valid);
        assert!(!validation.is_accessible);
        assert!(!validation.is_secure);
        assert_eq!(validation.errors, vec!["Invalid URL format".to_string()]);
    }

    #[test]
    fn test_extract_title() {
        let html = "<html><head><title> My Study </title></head><body></body></html>";
        assert_eq!(extract_title(html), Some("My Study".to_string()));
        assert_eq!(extract_title("<html><body>no title</body></html>"), None);
    }
}
