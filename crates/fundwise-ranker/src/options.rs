//! Pick-lists for building a decision request.

use std::cmp::Ordering;
use std::collections::HashSet;

use fundwise_data::ReferenceData;
use serde::{Deserialize, Serialize};

use crate::cascade::FunderKey;

const MAX_FUNDERS: usize = 50;

const CAMPUSES: [(&str, &str); 7] = [
    ("grid.147455.6", "CMU Pittsburgh Main Campus"),
    ("grid.448660.8", "CMU Software Engineering Institute"),
    ("grid.452171.4", "CMU Silicon Valley"),
    ("grid.484692.5", "CMU Robotics Institute Unit"),
    ("grid.508475.b", "CMU Heinz/Policy Unit"),
    ("grid.509981.c", "CMU Qatar / Global Unit"),
    ("grid.512173.3", "CMU Africa / Global Unit"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampusOption {
    pub code: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub code: String,
    pub name: String,
    pub opportunity_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOptions {
    pub campuses: Vec<CampusOption>,
    /// Highest opportunity first.
    pub fields: Vec<FieldOption>,
    /// Distinct funder names in first-seen order.
    pub funders: Vec<String>,
}

pub fn campuses() -> Vec<CampusOption> {
    CAMPUSES
        .iter()
        .map(|(code, label)| CampusOption {
            code: code.to_string(),
            label: label.to_string(),
        })
        .collect()
}

pub fn decision_options(data: &ReferenceData) -> DecisionOptions {
    let mut fields: Vec<FieldOption> = data
        .fields()
        .iter()
        .map(|f| FieldOption {
            code: f.code.clone(),
            name: f.name.clone(),
            opportunity_score: f.opportunity_score,
        })
        .collect();
    fields.sort_by(|a, b| {
        b.opportunity_score
            .partial_cmp(&a.opportunity_score)
            .unwrap_or(Ordering::Equal)
    });

    let mut seen = HashSet::new();
    let funders = data
        .flows()
        .iter()
        .map(|f| f.funder_name.trim())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(FunderKey::from_name(name)))
        .take(MAX_FUNDERS)
        .map(str::to_string)
        .collect();

    DecisionOptions { campuses: campuses(), fields, funders }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundwise_test_utils::{sample_records, FixtureBuilder};

    #[test]
    fn test_fields_sorted_by_opportunity() {
        let options = decision_options(&sample_records().into());
        assert_eq!(options.campuses.len(), 7);
        assert_eq!(options.campuses[0].code, "grid.147455.6");
        assert_eq!(options.fields[0].code, "4602");
        assert_eq!(options.fields.last().map(|f| f.code.as_str()), Some("4605"));
    }

    #[test]
    fn test_funders_distinct_in_first_seen_order() {
        let options = decision_options(&sample_records().into());
        assert_eq!(
            options.funders,
            vec![
                "National Science Foundation",
                "DARPA",
                "Google Research",
                "Office of Naval Research",
                "National Institutes of Health",
                "Howard Hughes Medical Institute",
            ]
        );
    }

    #[test]
    fn test_funders_capped_and_blank_names_skipped() {
        let mut builder = FixtureBuilder::new().flow("", "4601", 1.0, 0.0);
        for i in 0..60 {
            builder = builder.flow(&format!("Funder {i}"), "4601", 1.0, 0.0);
        }
        let options = decision_options(&builder.build().into());
        assert_eq!(options.funders.len(), 50);
        assert_eq!(options.funders[0], "Funder 0");
    }
}
