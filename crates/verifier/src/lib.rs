//! Citation verification core: extract citations from generated content,
//! verify the credibility of each citation's source, and roll the results
//! into a content-level credibility score.
//!
//! Library only — the hosting layer owns transport and metrics export.

pub mod authority;
pub mod cache;
pub mod completion;
pub mod extractor;
mod http;
pub mod verify;

pub use authority::{AuthorityClient, AuthorityLookup};
pub use cache::{CacheStats, VerificationCache};
pub use completion::{ApiCompletionClient, CompletionClient};
pub use extractor::CitationExtractor;
pub use verify::CitationVerifier;
