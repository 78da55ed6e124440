mod classify;
mod doi;
mod providers;
mod retry;
mod url_check;

use std::future::Future;
use std::pin::Pin;

pub use classify::{classify_domain, extract_domain, DomainFlags};
pub use providers::{DomainAuthorityProvider, MozProvider, OpenPageRankProvider};

use citeguard_common::config::VerifierConfig;
use citeguard_common::types::{AuthorityRecord, DoiVerification, UrlValidation};

/// Object-safe lookup interface consumed by the orchestrator.
/// Tests provide a mock; production uses AuthorityClient.
///
/// Every operation degrades instead of raising: a result of None/invalid
/// means "could not verify", never "low authority".
pub trait AuthorityLookup: Send + Sync {
    fn validate_url<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = UrlValidation> + Send + 'a>>;

    fn get_domain_authority<'a>(
        &'a self,
        domain: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<AuthorityRecord>> + Send + 'a>>;

    fn verify_doi<'a>(
        &'a self,
        doi: &'a str,
    ) -> Pin<Box<dyn Future<Output = DoiVerification> + Send + 'a>>;
}

/// Production authority lookup: URL probing, ranking-provider chain, and
/// DOI registry resolution, each independently cacheable and independently
/// fallible.
pub struct AuthorityClient {
    http: reqwest::Client,
    config: VerifierConfig,
    providers: Vec<Box<dyn DomainAuthorityProvider>>,
}

impl AuthorityClient {
    /// Build the client with the provider chain the config enables, in
    /// fixed priority order: Moz first, Open PageRank second.
    pub fn new(config: VerifierConfig) -> Self {
        let http = crate::http::client(&config.http);
        let timeout = std::time::Duration::from_millis(config.http.timeout_ms);

        let mut providers: Vec<Box<dyn DomainAuthorityProvider>> = Vec::new();
        if let Some(credentials) = &config.providers.moz {
            providers.push(Box::new(MozProvider::new(http.clone(), credentials, timeout)));
        }
        if let Some(credentials) = &config.providers.open_pagerank {
            providers.push(Box::new(OpenPageRankProvider::new(
                http.clone(),
                credentials,
                timeout,
            )));
        }

        if providers.is_empty() {
            tracing::info!("No domain-authority providers configured, lookups will return None");
        }

        Self {
            http,
            config,
            providers,
        }
    }

    #[cfg(test)]
    fn with_providers(
        config: VerifierConfig,
        providers: Vec<Box<dyn DomainAuthorityProvider>>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            providers,
        }
    }

    pub async fn validate_url(&self, url: &str) -> UrlValidation {
        url_check::validate_url(&self.http, url, &self.config.http, &self.config.retry).await
    }

    /// Walk the provider chain; first success wins. Returns None only when
    /// no provider is configured or every configured provider failed.
    pub async fn get_domain_authority(&self, domain: &str) -> Option<AuthorityRecord> {
        for provider in &self.providers {
            let result = retry::with_retry(provider.name(), &self.config.retry, || {
                provider.get_authority(domain)
            })
            .await;

            match result {
                Ok(record) => {
                    metrics::counter!("lookup.authority.success", "provider" => provider.name())
                        .increment(1);
                    return Some(record);
                }
                Err(e) if e.is_configuration() => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %e,
                        "Provider unusable as configured, trying next"
                    );
                }
                Err(e) => {
                    metrics::counter!("lookup.authority.errors", "provider" => provider.name())
                        .increment(1);
                    tracing::warn!(
                        provider = provider.name(),
                        domain = domain,
                        error = %e,
                        "Domain authority lookup failed, trying next provider"
                    );
                }
            }
        }

        None
    }

    pub async fn verify_doi(&self, doi: &str) -> DoiVerification {
        doi::verify_doi(
            &self.http,
            doi,
            &self.config.providers,
            &self.config.retry,
            std::time::Duration::from_millis(self.config.http.timeout_ms),
        )
        .await
    }
}

impl AuthorityLookup for AuthorityClient {
    fn validate_url<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = UrlValidation> + Send + 'a>> {
        Box::pin(self.validate_url(url))
    }

    fn get_domain_authority<'a>(
        &'a self,
        domain: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<AuthorityRecord>> + Send + 'a>> {
        Box::pin(self.get_domain_authority(domain))
    }

    fn verify_doi<'a>(
        &'a self,
        doi: &'a str,
    ) -> Pin<Box<dyn Future<Output = DoiVerification> + Send + 'a>> {
        Box::pin(self.verify_doi(doi))
    }
}
