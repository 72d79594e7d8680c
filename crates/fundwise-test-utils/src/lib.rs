//! Shared test fixtures for the Fundwise workspace.
//!
//! `FixtureBuilder` assembles small [`ReferenceRecords`] sets fluently so
//! tests can describe exactly the reference data a scenario needs.

use fundwise_common::codes::code_to_field_id;
use fundwise_common::{
    FundingFlow, ForecastRow, OpportunityField, ReferenceRecords, SimilarityNeighbor,
    SimilarityNode, TaxonomyRecord,
};

#[derive(Debug, Clone, Default)]
pub struct FixtureBuilder {
    records: ReferenceRecords,
}

impl FixtureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field with neutral opportunity, growth and gap.
    pub fn field(self, code: &str, name: &str, aau_total: f64) -> Self {
        self.field_with(OpportunityField {
            code: code.to_string(),
            name: name.to_string(),
            opportunity_score: 0.5,
            growth_rate: 0.0,
            under_target_gap: 0.0,
            aau_total,
        })
    }

    /// Field with explicit opportunity, growth and under-target gap.
    pub fn scored_field(
        self,
        code: &str,
        name: &str,
        aau_total: f64,
        opportunity_score: f64,
        growth_rate: f64,
        under_target_gap: f64,
    ) -> Self {
        self.field_with(OpportunityField {
            code: code.to_string(),
            name: name.to_string(),
            opportunity_score,
            growth_rate,
            under_target_gap,
            aau_total,
        })
    }

    pub fn field_with(mut self, field: OpportunityField) -> Self {
        self.records.opportunity.push(field);
        self
    }

    pub fn flow(mut self, funder: &str, code: &str, value: f64, institution_total: f64) -> Self {
        self.records.flows.push(FundingFlow {
            funder_name: funder.to_string(),
            field_name: String::new(),
            field_code: code.to_string(),
            value,
            institution_field_total: institution_total,
        });
        self
    }

    /// Neighbour edge `from → to`, using the `field-<code>` id convention.
    pub fn neighbor(self, from: &str, to: &str, similarity: f64) -> Self {
        self.named_neighbor(from, to, None, similarity)
    }

    pub fn named_neighbor(mut self, from: &str, to: &str, name: Option<&str>, similarity: f64) -> Self {
        self.records.neighbors.push(SimilarityNeighbor {
            field_id: code_to_field_id(from),
            neighbor_field_id: code_to_field_id(to),
            neighbor_field_name: name.map(str::to_string),
            similarity,
        });
        self
    }

    pub fn taxonomy(mut self, code: &str, parent: &str, parent_name: &str) -> Self {
        self.records.taxonomy.push(TaxonomyRecord {
            field_code: code.to_string(),
            field_name: String::new(),
            parent_category_code: parent.to_string(),
            parent_category_name: parent_name.to_string(),
            support_pairs: 1.0,
            total_pairs: 1.0,
            confidence: 1.0,
        });
        self
    }

    pub fn forecast(mut self, code: &str, year: i32, value: f64) -> Self {
        self.records.forecast.push(ForecastRow {
            field_code: code.to_string(),
            field_name: String::new(),
            year,
            aau_forecast: value,
            aau_forecast_low: None,
            aau_forecast_high: None,
        });
        self
    }

    pub fn node(mut self, code: &str, name: &str, x: f64, y: f64, funding: f64) -> Self {
        self.records.similarity_map.push(SimilarityNode {
            grant_id: code_to_field_id(code),
            field_code: code.to_string(),
            field_name: name.to_string(),
            funding,
            x_coord: x,
            y_coord: y,
        });
        self
    }

    pub fn build(self) -> ReferenceRecords {
        self.records
    }
}

/// A small but complete reference set: two parent categories, direct flows
/// for some fields, neighbour links and a similarity map.
pub fn sample_records() -> ReferenceRecords {
    FixtureBuilder::new()
        .scored_field("4601", "Applied computing", 50_000_000.0, 0.72, 0.35, 0.05)
        .scored_field("4602", "Artificial intelligence", 120_000_000.0, 0.91, 0.8, 0.01)
        .scored_field("4605", "Data management and data science", 30_000_000.0, 0.55, 0.1, 0.0)
        .scored_field("4611", "Machine learning", 80_000_000.0, 0.88, 0.6, 0.02)
        .scored_field("3101", "Biochemistry and cell biology", 200_000_000.0, 0.64, 0.05, -0.01)
        .scored_field("3102", "Bioinformatics and computational biology", 60_000_000.0, 0.7, 0.25, 0.04)
        .taxonomy("4601", "46", "Information and computing sciences")
        .taxonomy("4602", "46", "Information and computing sciences")
        .taxonomy("4605", "46", "Information and computing sciences")
        .taxonomy("4611", "46", "Information and computing sciences")
        .taxonomy("3101", "31", "Biological sciences")
        .taxonomy("3102", "31", "Biological sciences")
        .flow("National Science Foundation", "4601", 4_000_000.0, 1_200_000.0)
        .flow("DARPA", "4601", 2_500_000.0, 900_000.0)
        .flow("Google Research", "4601", 800_000.0, 50_000.0)
        .flow("National Science Foundation", "4602", 9_000_000.0, 3_000_000.0)
        .flow("Office of Naval Research", "4602", 3_000_000.0, 400_000.0)
        .flow("National Institutes of Health", "3101", 20_000_000.0, 2_000_000.0)
        .flow("Howard Hughes Medical Institute", "3101", 5_000_000.0, 100_000.0)
        .flow("National Institutes of Health", "3102", 6_000_000.0, 700_000.0)
        .named_neighbor("4605", "4602", Some("Artificial intelligence"), 0.62)
        .named_neighbor("4605", "4601", Some("Applied computing"), 0.4)
        .named_neighbor("4605", "3102", Some("Bioinformatics and computational biology"), 0.1)
        .forecast("4601", 2026, 60_000_000.0)
        .forecast("4602", 2026, 260_000_000.0)
        .forecast("3101", 2026, 210_000_000.0)
        .forecast("4601", 2025, 55_000_000.0)
        .node("4601", "Applied computing", 0.1, 0.2, 48_000_000.0)
        .node("4602", "Artificial intelligence", 0.3, 0.25, 110_000_000.0)
        .node("4605", "Data management and data science", 0.15, -0.1, 29_000_000.0)
        .node("4611", "Machine learning", 0.35, 0.3, 75_000_000.0)
        .node("3101", "Biochemistry and cell biology", -0.8, -0.6, 190_000_000.0)
        .node("3102", "Bioinformatics and computational biology", -0.3, -0.2, 58_000_000.0)
        .build()
}

/// Absolute-tolerance float comparison with a readable failure message.
pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} ± {tolerance}, got {actual}"
    );
}
