use std::future::Future;

use citeguard_common::config::RetryConfig;
use citeguard_common::{Result, VerifyError};

/// Run an operation with bounded retries and linear backoff.
///
/// Only transient errors are retried; configuration errors short-circuit so
/// the caller can move on to the next provider. Attempt n waits
/// n * delay_ms before the next try.
pub(crate) async fn with_retry<T, F, Fut>(
    op_name: &str,
    config: &RetryConfig,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < config.max_attempts => {
                let wait = config.delay_ms * attempt as u64;
                tracing::warn!(
                    op = op_name,
                    attempt,
                    wait_ms = wait,
                    error = %e,
                    "Transient lookup error, retrying"
                );
                metrics::counter!("lookup.retries", "op" => op_name.to_string()).increment(1);
                tokio::time::sleep(std::time::Duration::from_millis(wait)).await;
            }
            Err(e) => {
                if e.is_transient() {
                    tracing::warn!(op = op_name, attempts = attempt, error = %e, "Lookup gave up");
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_transient_errors_retry_then_give_up() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry("test", &fast_retry(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(VerifyError::LookupTransient("boom".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_configuration_error_does_not_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry("test", &fast_retry(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(VerifyError::LookupConfiguration("no key".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = with_retry("test", &fast_retry(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(VerifyError::Timeout("slow".to_string()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
