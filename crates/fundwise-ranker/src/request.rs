//! Caller-supplied decision inputs.
//!
//! Requests arrive as JSON from whatever surface fronts the engine. Field
//! names accept both the current spelling and the legacy `for4_code` /
//! `cmu_campus_code` keys. Optional amounts that fail to parse become absent.

use fundwise_common::lenient;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetMode {
    /// Budget derived from the field's historical funding.
    #[default]
    Auto,
    /// Caller-specified budget, used when positive.
    Manual,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectAllocation {
    #[serde(default)]
    pub area: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub amount: f64,
}

/// One research idea submitted for a funding recommendation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionRequest {
    #[serde(default)]
    pub idea_text: String,
    #[serde(alias = "cmu_campus_code", default, deserialize_with = "lenient::text")]
    pub campus_code: String,
    #[serde(alias = "for4_code", default, deserialize_with = "lenient::text")]
    pub field_code: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub project_length_months: f64,
    #[serde(default)]
    pub budget_mode: BudgetMode,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub requested_budget: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub already_received: Option<f64>,
    #[serde(default)]
    pub subject_allocations: Vec<SubjectAllocation>,
}

impl DecisionRequest {
    /// Auto-budgeted request for a field and project length.
    pub fn auto(field_code: &str, months: f64) -> Self {
        Self {
            field_code: field_code.to_string(),
            project_length_months: months,
            ..Self::default()
        }
    }

    pub fn with_manual_budget(mut self, budget: f64) -> Self {
        self.budget_mode = BudgetMode::Manual;
        self.requested_budget = Some(budget);
        self
    }

    pub fn with_already_received(mut self, amount: f64) -> Self {
        self.already_received = Some(amount);
        self
    }

    pub fn with_allocation(mut self, area: &str, amount: f64) -> Self {
        self.subject_allocations.push(SubjectAllocation {
            area: area.to_string(),
            amount,
        });
        self
    }
}

/// Administrator portfolio submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRequest {
    #[serde(default, deserialize_with = "lenient::number")]
    pub planning_horizon_months: f64,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub current_funding: Option<f64>,
    #[serde(default)]
    pub portfolio: Vec<DecisionRequest>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_keys_accepted() {
        let req: DecisionRequest = serde_json::from_str(
            r#"{"idea_text": "robot swarms", "cmu_campus_code": "grid.147455.6",
                "for4_code": 4602, "project_length_months": "24", "budget_mode": "manual",
                "requested_budget": 750000, "already_received": "oops"}"#,
        )
        .unwrap();
        assert_eq!(req.field_code, "4602");
        assert_eq!(req.campus_code, "grid.147455.6");
        assert_eq!(req.project_length_months, 24.0);
        assert_eq!(req.budget_mode, BudgetMode::Manual);
        assert_eq!(req.requested_budget, Some(750_000.0));
        assert_eq!(req.already_received, None);
    }

    #[test]
    fn test_budget_mode_defaults_to_auto() {
        let req: DecisionRequest = serde_json::from_str(r#"{"field_code": "4601"}"#).unwrap();
        assert_eq!(req.budget_mode, BudgetMode::Auto);
        assert!(req.subject_allocations.is_empty());
    }
}
