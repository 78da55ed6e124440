use serde::{Deserialize, Serialize};

use crate::error::VerifyError;

/// Complete verifier configuration, passed at construction.
///
/// Every section has serde defaults so a host can configure only what it
/// cares about. `VerifierConfig::default()` is a working offline setup:
/// no providers, no AI capability, cache enabled.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub cache: CacheConfig,
    pub http: HttpConfig,
    pub retry: RetryConfig,
    pub providers: ProviderConfig,
    pub scoring: ScoringConfig,
    pub concurrency: ConcurrencyConfig,
    /// AI completion capability. None disables the AI extraction pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai: Option<AiConfig>,
}

impl VerifierConfig {
    /// Parse configuration from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, VerifyError> {
        toml::from_str(content).map_err(|e| VerifyError::Config(e.to_string()))
    }
}

/// Verification cache parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When false, every cache read is a miss and writes are dropped.
    pub enabled: bool,
    /// Entry time-to-live in minutes.
    pub ttl_minutes: u64,
    /// Max entries per namespace before eviction kicks in.
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_minutes: 60,
            max_size: 1000,
        }
    }
}

/// Outbound HTTP parameters, applied per external call.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            user_agent: "citeguard/0.1".to_string(),
        }
    }
}

/// Bounded retry for external lookups. Delay is linear: attempt n waits
/// n * delay_ms before the next try.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 500,
        }
    }
}

/// Domain-authority and DOI provider configuration.
/// Providers left as None are skipped during lookup.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Primary domain-authority provider (Moz Links API shape).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moz: Option<ProviderCredentials>,
    /// Secondary domain-authority provider (Open PageRank).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_pagerank: Option<ProviderCredentials>,
    /// Scholarly registry base URL for DOI resolution.
    pub crossref_base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            moz: None,
            open_pagerank: None,
            crossref_base_url: "https://api.crossref.org".to_string(),
        }
    }
}

/// Credentials and endpoint for one external provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderCredentials {
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Scoring weights, status thresholds, and the recency window.
/// These are tunable policy, not hard invariants.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    pub thresholds: StatusThresholds,
    /// Years back from now within which a citation counts as fully recent.
    pub recency_window_years: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            thresholds: StatusThresholds::default(),
            recency_window_years: 3,
        }
    }
}

/// Weights combining the four sub-scores into the overall score.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub reputation: f64,
    pub recency: f64,
    pub authority: f64,
    pub relevance: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            reputation: 0.3,
            recency: 0.2,
            authority: 0.3,
            relevance: 0.2,
        }
    }
}

/// Overall-score cutoffs for verification status classification.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusThresholds {
    pub high: f64,
    pub moderate: f64,
    pub low: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            high: 8.0,
            moderate: 5.0,
            low: 2.0,
        }
    }
}

/// Concurrency bound for the per-citation lookup fan-out.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    pub max_concurrent_lookups: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: 4,
        }
    }
}

/// AI completion capability configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AiConfig {
    /// Provider name ("anthropic" or "openai").
    pub provider: String,
    /// Model identifier.
    pub model: String,
    /// Max tokens in the response.
    pub max_tokens: u32,
    /// Temperature (0.0–1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_offline_ready() {
        let config = VerifierConfig::default();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl_minutes, 60);
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.providers.moz.is_none());
        assert!(config.ai.is_none());
        let weight_sum = config.scoring.weights.reputation
            + config.scoring.weights.recency
            + config.scoring.weights.authority
            + config.scoring.weights.relevance;
        assert!((weight_sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_toml_overlays_defaults() {
        let toml = r#"
            [cache]
            enabled = false
            ttl_minutes = 5

            [providers.open_pagerank]
            api_key = "opr-key"
        "#;

        let config = VerifierConfig::from_toml_str(toml).unwrap();
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.ttl_minutes, 5);
        // Untouched sections keep their defaults.
        assert_eq!(config.cache.max_size, 1000);
        assert_eq!(config.http.timeout_ms, 10_000);
        assert_eq!(
            config.providers.open_pagerank.unwrap().api_key,
            "opr-key"
        );
        assert!(config.providers.moz.is_none());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = VerifierConfig::from_toml_str("cache = 12").unwrap_err();
        assert!(matches!(err, VerifyError::Config(_)));
    }
}
