mod authority;
mod citation;
mod extraction;
mod strategy;
mod verification;

pub use authority::{
    AuthorityMetadata, AuthorityRecord, DoiVerification, UrlCheckMetadata, UrlValidation,
};
pub use citation::{Citation, CitationType, Span};
pub use extraction::{
    ContentInput, ContentSection, ExtractionMethod, ExtractionResult, StructuredContent,
    SYNTHETIC_SECTION,
};
pub use strategy::{AuthorityHierarchy, CitationStrategy, DensityRecommendation};
pub use verification::{
    ContentSummary, ContentVerificationReport, EnhancementOutcome, ImprovementSummary, Segment,
    VerificationMethod, VerificationResult, VerificationScores, VerificationStatus,
};
