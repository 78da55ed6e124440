mod anthropic;
mod openai;

use std::future::Future;
use std::pin::Pin;

use citeguard_common::config::{AiConfig, HttpConfig, RetryConfig};

/// A single completion request.
#[derive(Clone, Debug)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
}

/// Token accounting reported by the provider.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Completion text plus usage.
#[derive(Clone, Debug)]
pub struct CompletionResponse {
    pub text: String,
    pub usage: TokenUsage,
}

/// Errors from completion API calls.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("Completion HTTP error: {0}")]
    Http(String),

    #[error("Completion auth error: {0}")]
    Auth(String),

    #[error("Completion rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("Completion API error: {0}")]
    Api(String),

    #[error("Completion response parse error: {0}")]
    Parse(String),
}

impl CompletionError {
    /// Whether this error should not be retried.
    fn is_non_retryable(&self) -> bool {
        matches!(self, CompletionError::Auth(_))
    }
}

/// Object-safe trait for testability (dyn dispatch).
/// Tests provide a mock; production uses ApiCompletionClient.
pub trait CompletionClient: Send + Sync {
    fn generate_completion<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, CompletionError>> + Send + 'a>>;
}

/// Completion API client with provider dispatch and retry logic.
pub struct ApiCompletionClient {
    http: reqwest::Client,
    config: AiConfig,
    retry_config: RetryConfig,
    api_key: String,
}

impl ApiCompletionClient {
    /// Create a new completion client.
    /// Reads the API key from the appropriate env var based on provider.
    /// Returns None if the key is not set — the capability is then absent.
    pub fn new(
        config: AiConfig,
        retry_config: RetryConfig,
        http_config: &HttpConfig,
    ) -> Option<Self> {
        let env_var = match config.provider.as_str() {
            "anthropic" => "ANTHROPIC_API_KEY",
            "openai" => "OPENAI_API_KEY",
            other => {
                tracing::warn!(provider = other, "Unknown completion provider");
                return None;
            }
        };

        let api_key = match std::env::var(env_var) {
            Ok(key) if !key.is_empty() => key,
            _ => {
                tracing::warn!(
                    env_var = env_var,
                    provider = config.provider.as_str(),
                    "API key not set — completion capability disabled"
                );
                return None;
            }
        };

        Some(Self {
            http: crate::http::client(http_config),
            config,
            retry_config,
            api_key,
        })
    }

    /// Send a completion request to the configured provider with retries.
    /// Delay is linear per the retry config.
    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let result = self.send_once(request).await;

            match result {
                Ok(response) => return Ok(response),
                Err(ref e) if e.is_non_retryable() => {
                    metrics::counter!("completion.api.errors", "provider" => self.config.provider.clone())
                        .increment(1);
                    return result;
                }
                Err(CompletionError::RateLimited { retry_after }) => {
                    if attempt >= self.retry_config.max_attempts {
                        metrics::counter!("completion.api.errors", "provider" => self.config.provider.clone())
                            .increment(1);
                        return Err(CompletionError::RateLimited { retry_after });
                    }
                    let wait = retry_after
                        .map(|s| s * 1000)
                        .unwrap_or(self.retry_config.delay_ms * attempt as u64);
                    tracing::warn!(attempt, wait_ms = wait, "Completion rate limited, retrying");
                    tokio::time::sleep(std::time::Duration::from_millis(wait)).await;
                }
                Err(e) => {
                    if attempt >= self.retry_config.max_attempts {
                        metrics::counter!("completion.api.errors", "provider" => self.config.provider.clone())
                            .increment(1);
                        return Err(e);
                    }
                    let wait = self.retry_config.delay_ms * attempt as u64;
                    tracing::warn!(attempt, wait_ms = wait, error = %e, "Completion API error, retrying");
                    tokio::time::sleep(std::time::Duration::from_millis(wait)).await;
                }
            }
        }
    }

    /// Single attempt — routes to provider-specific implementation.
    async fn send_once(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        match self.config.provider.as_str() {
            "anthropic" => {
                anthropic::send_completion(
                    &self.http,
                    &self.api_key,
                    &self.config.model,
                    request.max_tokens.min(self.config.max_tokens),
                    request.temperature.or(self.config.temperature),
                    &request.prompt,
                )
                .await
            }
            "openai" => {
                openai::send_completion(
                    &self.http,
                    &self.api_key,
                    &self.config.model,
                    request.max_tokens.min(self.config.max_tokens),
                    request.temperature.or(self.config.temperature),
                    &request.prompt,
                )
                .await
            }
            other => Err(CompletionError::Api(format!("Unknown provider: {}", other))),
        }
    }
}

impl CompletionClient for ApiCompletionClient {
    fn generate_completion<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, CompletionError>> + Send + 'a>>
    {
        Box::pin(self.complete(request))
    }
}
