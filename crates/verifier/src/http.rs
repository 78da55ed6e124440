use citeguard_common::config::HttpConfig;

/// Build the shared outbound HTTP client with the configured user agent.
/// An unbuildable configuration falls back to the default client rather
/// than failing verification.
pub(crate) fn client(config: &HttpConfig) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to build HTTP client with configured user agent, using defaults");
            reqwest::Client::new()
        })
}
