/// Reference record schemas.
/// These are the Rust representations of the precomputed JSON artifacts the
/// engine reads. Field renames keep the artifact spelling on the wire; the
/// defaulting rules live in [`crate::lenient`].

use serde::{Deserialize, Serialize};

use crate::lenient;

// ---------------------------------------------------------------------------
// Opportunity scores (opportunity_scores_v1.json)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpportunityField {
    #[serde(rename = "FOR4_CODE", default, deserialize_with = "lenient::text")]
    pub code: String,
    #[serde(rename = "FOR4_NAME", default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "opportunity_score_v1", default, deserialize_with = "lenient::number")]
    pub opportunity_score: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub growth_rate: f64,
    /// External funding share minus the institution's own share.
    /// Positive means the institution under-invests in this field.
    #[serde(default, deserialize_with = "lenient::number")]
    pub under_target_gap: f64,
    /// Historical field funding total in USD.
    #[serde(rename = "AAU_total", default, deserialize_with = "lenient::number")]
    pub aau_total: f64,
}

// ---------------------------------------------------------------------------
// Forecast (forecast_v1.json)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    #[serde(rename = "FOR4_CODE", default, deserialize_with = "lenient::text")]
    pub field_code: String,
    #[serde(rename = "FOR4_NAME", default, deserialize_with = "lenient::text")]
    pub field_name: String,
    #[serde(default, deserialize_with = "lenient::year")]
    pub year: i32,
    #[serde(default, deserialize_with = "lenient::number")]
    pub aau_forecast: f64,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub aau_forecast_low: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub aau_forecast_high: Option<f64>,
}

// ---------------------------------------------------------------------------
// Funding flows (sankey.json)
// ---------------------------------------------------------------------------

/// One funder → field edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundingFlow {
    #[serde(rename = "source", default, deserialize_with = "lenient::text")]
    pub funder_name: String,
    /// Display name of the receiving field, if the artifact carries one.
    #[serde(rename = "target", default, deserialize_with = "lenient::text")]
    pub field_name: String,
    #[serde(rename = "FOR4_CODE", default, deserialize_with = "lenient::text")]
    pub field_code: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub value: f64,
    /// The institution's own historical funding in this field.
    #[serde(
        rename = "cmu_field_total",
        alias = "institution_field_total",
        default,
        deserialize_with = "lenient::number"
    )]
    pub institution_field_total: f64,
}

impl FundingFlow {
    pub const UNKNOWN_FUNDER: &'static str = "Unknown funder";

    /// Funder display name, substituting a placeholder for blank sources.
    pub fn funder_label(&self) -> &str {
        if self.funder_name.is_empty() {
            Self::UNKNOWN_FUNDER
        } else {
            &self.funder_name
        }
    }
}

// ---------------------------------------------------------------------------
// Similarity neighbours (similarity_neighbors_v1.json)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityNeighbor {
    /// `field-<code>` id of the source field.
    #[serde(rename = "grant_id", default, deserialize_with = "lenient::text")]
    pub field_id: String,
    #[serde(rename = "neighbor_grant_id", default, deserialize_with = "lenient::text")]
    pub neighbor_field_id: String,
    #[serde(rename = "neighbor_for4_name", default, deserialize_with = "lenient::optional_text")]
    pub neighbor_field_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub similarity: f64,
}

// ---------------------------------------------------------------------------
// Similarity map nodes (similarity_map_v1.json)
// ---------------------------------------------------------------------------

/// A field positioned in the precomputed 2-D embedding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityNode {
    #[serde(default, deserialize_with = "lenient::text")]
    pub grant_id: String,
    #[serde(rename = "for4_code", default, deserialize_with = "lenient::text")]
    pub field_code: String,
    #[serde(rename = "for4_name", default, deserialize_with = "lenient::text")]
    pub field_name: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub funding: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub x_coord: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub y_coord: f64,
}

// ---------------------------------------------------------------------------
// Taxonomy (for_taxonomy_v1.json)
// ---------------------------------------------------------------------------

/// Maps a four-digit field to its two-digit parent category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyRecord {
    #[serde(rename = "for4_code", default, deserialize_with = "lenient::text")]
    pub field_code: String,
    #[serde(rename = "for4_name", default, deserialize_with = "lenient::text")]
    pub field_name: String,
    #[serde(rename = "for2_code", default, deserialize_with = "lenient::text")]
    pub parent_category_code: String,
    #[serde(rename = "for2_name", default, deserialize_with = "lenient::text")]
    pub parent_category_name: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub support_pairs: f64,
    #[serde(rename = "for4_total_pairs", default, deserialize_with = "lenient::number")]
    pub total_pairs: f64,
    /// Share of shared grants supporting this mapping.
    #[serde(default, deserialize_with = "lenient::number")]
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyArtifact {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub records: Vec<TaxonomyRecord>,
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// All reference record sets for one invocation, before indexing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecords {
    #[serde(default)]
    pub opportunity: Vec<OpportunityField>,
    #[serde(default)]
    pub forecast: Vec<ForecastRow>,
    #[serde(default)]
    pub flows: Vec<FundingFlow>,
    #[serde(default)]
    pub neighbors: Vec<SimilarityNeighbor>,
    #[serde(default)]
    pub taxonomy: Vec<TaxonomyRecord>,
    #[serde(default)]
    pub similarity_map: Vec<SimilarityNode>,
}
