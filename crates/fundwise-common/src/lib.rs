//! fundwise-common — Shared record schemas, errors, and code helpers used across all Fundwise crates.

pub mod error;
pub mod codes;
pub mod lenient;
pub mod records;

// Re-export commonly used types
pub use error::{FundwiseError, Result};
pub use records::{
    FundingFlow, ForecastRow, OpportunityField, ReferenceRecords, SimilarityNeighbor,
    SimilarityNode, TaxonomyArtifact, TaxonomyRecord,
};
