//! Artifact sanity checks run before a snapshot is trusted for decisions.

use fundwise_common::{FundwiseError, Result};
use serde::Serialize;

use crate::snapshot::ReferenceData;

/// Record counts of a snapshot that passed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub opportunity_rows: usize,
    pub forecast_rows: usize,
    pub flow_edges: usize,
    pub neighbor_links: usize,
    pub taxonomy_records: usize,
    pub similarity_nodes: usize,
}

/// Key artifacts must be non-empty and opportunity scores normalised to [0, 1].
pub fn validate(data: &ReferenceData) -> Result<ValidationReport> {
    let records = data.records();
    let mut problems = Vec::new();

    if records.opportunity.is_empty() {
        problems.push("opportunity scores are empty".to_string());
    }
    if records.forecast.is_empty() {
        problems.push("forecast rows are empty".to_string());
    }
    if records.similarity_map.is_empty() {
        problems.push("similarity map is empty".to_string());
    }

    let out_of_range: Vec<&str> = records
        .opportunity
        .iter()
        .filter(|f| !(0.0..=1.0).contains(&f.opportunity_score))
        .map(|f| f.code.as_str())
        .collect();
    if !out_of_range.is_empty() {
        problems.push(format!(
            "opportunity_score outside [0, 1] for fields: {}",
            out_of_range.join(", ")
        ));
    }

    if records.opportunity.iter().any(|f| f.code.is_empty()) {
        problems.push("opportunity table has rows without a field code".to_string());
    }

    if !problems.is_empty() {
        tracing::warn!(problems = problems.len(), "Artifact validation failed");
        return Err(FundwiseError::Validation(problems));
    }

    Ok(ValidationReport {
        opportunity_rows: records.opportunity.len(),
        forecast_rows: records.forecast.len(),
        flow_edges: records.flows.len(),
        neighbor_links: records.neighbors.len(),
        taxonomy_records: records.taxonomy.len(),
        similarity_nodes: records.similarity_map.len(),
    })
}
