//! Indexed, immutable reference-data snapshot.
//!
//! One snapshot serves one invocation. It is built once from
//! [`ReferenceRecords`] and never mutated, so it can be shared across
//! threads behind an `Arc` with no coordination.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fundwise_common::codes::{field_id_to_code, normalize_code, parent_category_from_code};
use fundwise_common::{
    FundingFlow, ForecastRow, OpportunityField, ReferenceRecords, SimilarityNeighbor,
    SimilarityNode, TaxonomyRecord,
};

#[derive(Debug, Clone)]
pub struct ReferenceData {
    records: ReferenceRecords,
    field_index: HashMap<String, usize>,
    flows_by_code: HashMap<String, Vec<usize>>,
    neighbors_by_code: HashMap<String, Vec<usize>>,
    parent_by_code: HashMap<String, String>,
    loaded_at: DateTime<Utc>,
}

impl ReferenceData {
    pub fn from_records(mut records: ReferenceRecords) -> Self {
        normalise_codes(&mut records);

        // First record wins when a code repeats.
        let mut field_index = HashMap::with_capacity(records.opportunity.len());
        for (i, field) in records.opportunity.iter().enumerate() {
            field_index.entry(field.code.clone()).or_insert(i);
        }

        let mut flows_by_code: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, flow) in records.flows.iter().enumerate() {
            flows_by_code.entry(flow.field_code.clone()).or_default().push(i);
        }

        let mut neighbors_by_code: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, n) in records.neighbors.iter().enumerate() {
            neighbors_by_code
                .entry(field_id_to_code(&n.field_id))
                .or_default()
                .push(i);
        }

        let parent_by_code = records
            .taxonomy
            .iter()
            .filter(|t| !t.parent_category_code.is_empty())
            .map(|t| (t.field_code.clone(), t.parent_category_code.clone()))
            .collect();

        tracing::debug!(
            fields = records.opportunity.len(),
            flows = records.flows.len(),
            neighbors = records.neighbors.len(),
            taxonomy = records.taxonomy.len(),
            map_nodes = records.similarity_map.len(),
            "Reference snapshot indexed"
        );

        Self {
            records,
            field_index,
            flows_by_code,
            neighbors_by_code,
            parent_by_code,
            loaded_at: Utc::now(),
        }
    }

    pub fn records(&self) -> &ReferenceRecords {
        &self.records
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn fields(&self) -> &[OpportunityField] {
        &self.records.opportunity
    }

    pub fn field(&self, code: &str) -> Option<&OpportunityField> {
        self.field_index
            .get(code.trim())
            .map(|&i| &self.records.opportunity[i])
    }

    pub fn flows(&self) -> &[FundingFlow] {
        &self.records.flows
    }

    /// Funding edges observed directly for one field.
    pub fn flows_for<'a>(&'a self, code: &str) -> impl Iterator<Item = &'a FundingFlow> + 'a {
        self.flows_by_code
            .get(code.trim())
            .into_iter()
            .flatten()
            .map(move |&i| &self.records.flows[i])
    }

    pub fn direct_flow_count(&self, code: &str) -> usize {
        self.flows_by_code.get(code.trim()).map_or(0, Vec::len)
    }

    /// Precomputed neighbours whose source is `code`, in artifact order.
    pub fn neighbors_of<'a>(&'a self, code: &str) -> impl Iterator<Item = &'a SimilarityNeighbor> + 'a {
        self.neighbors_by_code
            .get(code.trim())
            .into_iter()
            .flatten()
            .map(move |&i| &self.records.neighbors[i])
    }

    pub fn taxonomy(&self) -> &[TaxonomyRecord] {
        &self.records.taxonomy
    }

    /// Parent category from the taxonomy, else the first two digits of the code.
    pub fn parent_category(&self, code: &str) -> String {
        let code = code.trim();
        self.parent_by_code
            .get(code)
            .cloned()
            .unwrap_or_else(|| parent_category_from_code(code))
    }

    /// Parent category strictly from the taxonomy artifact.
    pub fn taxonomy_parent(&self, code: &str) -> Option<&str> {
        self.parent_by_code.get(code.trim()).map(String::as_str)
    }

    pub fn forecast_rows(&self) -> &[ForecastRow] {
        &self.records.forecast
    }

    /// Largest forecast for `code` in `year`, if any row exists.
    pub fn forecast_for(&self, code: &str, year: i32) -> Option<f64> {
        let code = code.trim();
        self.records
            .forecast
            .iter()
            .filter(|r| r.field_code == code && r.year == year)
            .map(|r| r.aau_forecast)
            .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v))))
    }

    /// `code → forecast` for every field with a row in `year`, largest row per field.
    pub fn forecasts_in_year(&self, year: i32) -> HashMap<&str, f64> {
        let mut out: HashMap<&str, f64> = HashMap::new();
        for r in self.records.forecast.iter().filter(|r| r.year == year) {
            out.entry(r.field_code.as_str())
                .and_modify(|v| *v = v.max(r.aau_forecast))
                .or_insert(r.aau_forecast);
        }
        out
    }

    pub fn similarity_map(&self) -> &[SimilarityNode] {
        &self.records.similarity_map
    }
}

fn normalise_codes(records: &mut ReferenceRecords) {
    for f in &mut records.opportunity {
        f.code = normalize_code(&f.code);
    }
    for r in &mut records.forecast {
        r.field_code = normalize_code(&r.field_code);
    }
    for flow in &mut records.flows {
        flow.field_code = normalize_code(&flow.field_code);
    }
    for t in &mut records.taxonomy {
        t.field_code = normalize_code(&t.field_code);
        t.parent_category_code = normalize_code(&t.parent_category_code);
    }
    for n in &mut records.similarity_map {
        n.field_code = normalize_code(&n.field_code);
    }
}

impl From<ReferenceRecords> for ReferenceData {
    fn from(records: ReferenceRecords) -> Self {
        Self::from_records(records)
    }
}
