//! No-data placeholder funders.
//!
//! Emitted by the cascade only when every evidence tier came back empty.
//! The entries are hand-assigned, not derived from reference data.

/// A synthetic funder entry with hand-assigned scores.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderFunder {
    pub name: String,
    pub flow: f64,
    pub institution_presence: f64,
}

pub trait NoDataPlaceholder: Send + Sync {
    /// Identifier for logs.
    fn name(&self) -> &str;

    /// Funders to emit, best first. May be empty.
    fn funders(&self) -> Vec<PlaceholderFunder>;
}

/// Generic major funders with descending synthetic scores.
#[derive(Debug, Clone, Default)]
pub struct GenericFunderPriors;

const GENERIC_FUNDERS: [&str; 6] = [
    "NSF",
    "NIH",
    "Department of Energy",
    "Department of Defense",
    "Private Foundations",
    "Industry Partnerships",
];

impl NoDataPlaceholder for GenericFunderPriors {
    fn name(&self) -> &str {
        "generic_funder_priors"
    }

    fn funders(&self) -> Vec<PlaceholderFunder> {
        GENERIC_FUNDERS
            .iter()
            .enumerate()
            .map(|(i, name)| PlaceholderFunder {
                name: name.to_string(),
                flow: (100.0 - 10.0 * i as f64).max(1.0),
                institution_presence: (60.0 - 8.0 * i as f64).max(1.0),
            })
            .collect()
    }
}

/// Emits nothing, so an empty cascade surfaces as missing reference data.
#[derive(Debug, Clone, Default)]
pub struct NoPlaceholder;

impl NoDataPlaceholder for NoPlaceholder {
    fn name(&self) -> &str {
        "none"
    }

    fn funders(&self) -> Vec<PlaceholderFunder> {
        Vec::new()
    }
}
