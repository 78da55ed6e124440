use thiserror::Error;

/// Top-level error type for citation verification operations.
#[derive(Debug, Error)]
pub enum VerifyError {
    // --- Input errors (the only kind that surfaces on a report) ---
    #[error("Extraction error: {0}")]
    Extraction(String),

    // --- Lookup errors (absorbed into degraded results) ---
    #[error("Transient lookup error: {0}")]
    LookupTransient(String),

    #[error("Lookup provider not configured: {0}")]
    LookupConfiguration(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    // --- Operational errors ---
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("AI capability error: {0}")]
    Ai(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VerifyError {
    /// Whether this error may succeed on retry (network/timeout class).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::LookupTransient(_) | Self::Timeout(_))
    }

    /// Whether this error means a provider is unusable as configured
    /// (skip it and try the next one, do not retry).
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::LookupConfiguration(_))
    }
}

/// Result type alias for citation verification operations.
pub type Result<T> = std::result::Result<T, VerifyError>;
