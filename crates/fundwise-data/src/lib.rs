//! fundwise-data — Reference data accessor.
//!
//! Loads the precomputed opportunity, forecast, funding-flow, similarity and
//! taxonomy artifacts into an indexed snapshot. Pure read; no ranking logic
//! belongs here.

pub mod snapshot;
pub mod source;
pub mod validate;

pub use snapshot::ReferenceData;
pub use source::{InMemorySource, JsonArtifactSource, ReferenceSource};
pub use validate::{validate, ValidationReport};
