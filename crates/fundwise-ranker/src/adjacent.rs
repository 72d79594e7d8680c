//! Adjacent-field ranking.
//!
//! Scores how easily a project in one field could be repositioned into each
//! other field on the similarity map. Three signals feed the pivot ease:
//! - shared parent category in the taxonomy
//! - proximity on the 2-D similarity map
//! - lexical overlap of the field names

use std::cmp::Ordering;

use fundwise_common::lenient::coerce_amount;
use fundwise_common::SimilarityNode;
use fundwise_config::AdjacentConfig;
use fundwise_data::ReferenceData;
use serde::{Deserialize, Serialize};

use crate::normalise::{proximity, rescale};
use crate::tokenize::{jaccard, tokenize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryField {
    pub field_code: String,
    pub field_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacentCandidate {
    pub field_code: String,
    pub field_name: String,
    pub pivot_ease: f64,
    /// Map proximity in [0, 1].
    pub raw_similarity: f64,
    pub same_parent_category: bool,
    pub lexical_overlap: f64,
    pub available_funding: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjacentRanking {
    pub primary: Option<PrimaryField>,
    pub adjacent: Vec<AdjacentCandidate>,
}

fn resolve_primary<'a>(data: &'a ReferenceData, code: &str) -> Option<&'a SimilarityNode> {
    let nodes = data.similarity_map();
    let code = code.trim();
    let found = if code.is_empty() {
        None
    } else {
        nodes.iter().find(|n| n.field_code == code)
    };
    match found {
        Some(node) => Some(node),
        None => {
            let fallback = nodes.first();
            if let Some(node) = fallback {
                tracing::warn!(
                    requested = %code,
                    fallback = %node.field_code,
                    "Adjacent target not on similarity map; using first map node"
                );
            }
            fallback
        }
    }
}

/// Rank up to `top_n` fields adjacent to `field_code` (clamped into the
/// configured window) by pivot ease, highest first.
pub fn rank_adjacent_fields(
    data: &ReferenceData,
    field_code: &str,
    top_n: Option<usize>,
    cfg: &AdjacentConfig,
) -> AdjacentRanking {
    let Some(primary) = resolve_primary(data, field_code) else {
        tracing::debug!("Similarity map is empty; no adjacent fields");
        return AdjacentRanking::default();
    };
    let limit = cfg.clamp_top_n(top_n);

    let forecasts = data.forecasts_in_year(cfg.forecast_year);
    let primary_parent = data.taxonomy_parent(&primary.field_code);
    let primary_tokens = tokenize(&primary.field_name);
    let w = &cfg.weights;

    let mut adjacent: Vec<AdjacentCandidate> = data
        .similarity_map()
        .iter()
        .filter(|n| n.field_code != primary.field_code)
        .map(|candidate| {
            let same_parent = matches!(
                (primary_parent, data.taxonomy_parent(&candidate.field_code)),
                (Some(a), Some(b)) if a == b
            );
            let lexical = jaccard(&primary_tokens, &tokenize(&candidate.field_name));
            let dx = primary.x_coord - candidate.x_coord;
            let dy = primary.y_coord - candidate.y_coord;
            let map_proximity = proximity(dx.hypot(dy), cfg.max_distance);

            let same = if same_parent { 1.0 } else { 0.0 };
            let raw = w.same_category * same + w.map_proximity * map_proximity + w.lexical * lexical;

            let available_funding = forecasts
                .get(candidate.field_code.as_str())
                .copied()
                .or_else(|| data.field(&candidate.field_code).map(|f| f.aau_total))
                .unwrap_or(candidate.funding);

            AdjacentCandidate {
                field_code: candidate.field_code.clone(),
                field_name: candidate.field_name.clone(),
                pivot_ease: rescale(raw, cfg.ease_floor, cfg.ease_span),
                raw_similarity: map_proximity,
                same_parent_category: same_parent,
                lexical_overlap: lexical,
                available_funding: coerce_amount(Some(available_funding)),
            }
        })
        .collect();

    adjacent.sort_by(|a, b| b.pivot_ease.partial_cmp(&a.pivot_ease).unwrap_or(Ordering::Equal));
    adjacent.truncate(limit);

    tracing::debug!(
        field = %primary.field_code,
        candidates = adjacent.len(),
        "Adjacent fields ranked"
    );

    AdjacentRanking {
        primary: Some(PrimaryField {
            field_code: primary.field_code.clone(),
            field_name: primary.field_name.clone(),
        }),
        adjacent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundwise_test_utils::{sample_records, FixtureBuilder};

    fn sample() -> ReferenceData {
        sample_records().into()
    }

    #[test]
    fn test_empty_map_yields_nothing() {
        let data: ReferenceData = FixtureBuilder::new().field("4601", "Applied computing", 1.0).build().into();
        let ranking = rank_adjacent_fields(&data, "4601", None, &AdjacentConfig::default());
        assert_eq!(ranking, AdjacentRanking::default());
    }

    #[test]
    fn test_unknown_code_falls_back_to_first_node() {
        let ranking = rank_adjacent_fields(&sample(), "9999", None, &AdjacentConfig::default());
        assert_eq!(ranking.primary.unwrap().field_code, "4601");

        let ranking = rank_adjacent_fields(&sample(), "", None, &AdjacentConfig::default());
        assert_eq!(ranking.primary.unwrap().field_code, "4601");
    }

    #[test]
    fn test_primary_excluded_and_top_n_clamped() {
        let ranking = rank_adjacent_fields(&sample(), "4602", Some(1), &AdjacentConfig::default());
        assert_eq!(ranking.adjacent.len(), 3);
        assert!(ranking.adjacent.iter().all(|c| c.field_code != "4602"));

        let ranking = rank_adjacent_fields(&sample(), "4602", Some(20), &AdjacentConfig::default());
        assert_eq!(ranking.adjacent.len(), 5);
    }

    #[test]
    fn test_same_category_neighbour_ranks_first() {
        let ranking = rank_adjacent_fields(&sample(), "4602", None, &AdjacentConfig::default());
        let first = &ranking.adjacent[0];
        // Machine learning shares the parent category and sits closest on the map
        assert_eq!(first.field_code, "4611");
        assert!(first.same_parent_category);
        let last = ranking.adjacent.last().unwrap();
        assert_eq!(last.field_code, "3101");
        assert!(!last.same_parent_category);
        assert!(ranking
            .adjacent
            .windows(2)
            .all(|w| w[0].pivot_ease >= w[1].pivot_ease));
    }

    #[test]
    fn test_available_funding_resolution_order() {
        let ranking = rank_adjacent_fields(&sample(), "4605", Some(8), &AdjacentConfig::default());
        let funding = |code: &str| {
            ranking
                .adjacent
                .iter()
                .find(|c| c.field_code == code)
                .map(|c| c.available_funding)
                .unwrap()
        };
        // forecast for the configured year
        assert_eq!(funding("4601"), 60_000_000.0);
        // no forecast: historical total
        assert_eq!(funding("4611"), 80_000_000.0);

        let data: ReferenceData = FixtureBuilder::new()
            .node("4601", "Applied computing", 0.0, 0.0, 1.0)
            .node("4602", "Artificial intelligence", 0.1, 0.1, 42.0)
            .build()
            .into();
        let ranking = rank_adjacent_fields(&data, "4601", None, &AdjacentConfig::default());
        // neither forecast nor opportunity row: node funding
        assert_eq!(ranking.adjacent[0].available_funding, 42.0);
    }

    #[test]
    fn test_missing_taxonomy_never_counts_as_same_category() {
        let data: ReferenceData = FixtureBuilder::new()
            .node("4601", "Applied computing", 0.0, 0.0, 1.0)
            .node("4602", "Artificial intelligence", 0.0, 0.0, 1.0)
            .build()
            .into();
        let ranking = rank_adjacent_fields(&data, "4601", None, &AdjacentConfig::default());
        let c = &ranking.adjacent[0];
        assert!(!c.same_parent_category);
        assert_eq!(c.raw_similarity, 1.0);
        // 0.08 + 0.84 × 0.30
        assert!((c.pivot_ease - 0.332).abs() < 1e-9);
    }
}
