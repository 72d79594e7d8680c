//! Budget estimation.
//!
//! Sizes a project as a share of its field's historical funding, scaled by
//! project length, then resolves the budget the rest of the decision works
//! against and how much of it is still uncovered.

use fundwise_common::lenient::coerce_amount;
use fundwise_common::OpportunityField;
use fundwise_config::BudgetConfig;
use serde::{Deserialize, Serialize};

use crate::request::{BudgetMode, DecisionRequest, SubjectAllocation};

const BASIS_METHOD: &str =
    "Field-level historical funding signal (multi-year aggregate) with project-length scaling.";
const BASIS_NOTE: &str =
    "Uses aggregated historical field funding, not individual project-level grant records.";

/// Explains how the recommended range was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetBasis {
    pub method: String,
    pub base_field_total: f64,
    pub length_factor: f64,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetEstimate {
    pub mode: BudgetMode,
    pub recommended_low: f64,
    pub recommended_mid: f64,
    pub recommended_high: f64,
    pub selected_budget: f64,
    pub already_received: f64,
    pub remaining_need: f64,
    pub subject_allocation_total: f64,
    pub subject_allocations: Vec<SubjectAllocation>,
    pub basis: BudgetBasis,
}

/// `clamp(months / reference_months, min_factor, max_factor)`.
/// Zero or unparseable lengths use the configured default length.
pub fn length_factor(months: f64, cfg: &BudgetConfig) -> f64 {
    let months = if months.is_finite() && months > 0.0 {
        months
    } else {
        cfg.default_months
    };
    (months / cfg.reference_months).clamp(cfg.min_length_factor, cfg.max_length_factor)
}

/// Formula-derived midpoint before subject allocations are considered.
pub fn base_mid(field: &OpportunityField, months: f64, cfg: &BudgetConfig) -> f64 {
    let total = coerce_amount(Some(field.aau_total));
    (total * cfg.field_share * length_factor(months, cfg)).clamp(cfg.min_budget, cfg.max_budget)
}

/// Sum of non-negative subject allocation amounts.
pub fn subject_total(allocations: &[SubjectAllocation]) -> f64 {
    allocations
        .iter()
        .map(|a| coerce_amount(Some(a.amount)).max(0.0))
        .sum()
}

pub fn estimate_budget(
    field: &OpportunityField,
    request: &DecisionRequest,
    cfg: &BudgetConfig,
) -> BudgetEstimate {
    let factor = length_factor(request.project_length_months, cfg);
    let allocation_total = subject_total(&request.subject_allocations);

    // Midpoint never falls below the itemised subject total.
    let mid = base_mid(field, request.project_length_months, cfg).max(allocation_total);

    let requested = coerce_amount(request.requested_budget);
    let selected = if request.budget_mode == BudgetMode::Manual && requested > 0.0 {
        requested.round()
    } else {
        mid.round()
    };
    let already_received = coerce_amount(request.already_received).max(0.0).round();
    // Computed on the rounded values that are reported.
    let remaining_need = (selected - already_received).max(0.0);

    tracing::debug!(
        field = %field.code,
        length_factor = factor,
        mid,
        selected,
        remaining_need,
        "Budget estimated"
    );

    BudgetEstimate {
        mode: request.budget_mode,
        recommended_low: (mid * cfg.low_multiplier).round(),
        recommended_mid: mid.round(),
        recommended_high: (mid * cfg.high_multiplier).round(),
        selected_budget: selected,
        already_received,
        remaining_need,
        subject_allocation_total: allocation_total.round(),
        subject_allocations: request.subject_allocations.clone(),
        basis: BudgetBasis {
            method: BASIS_METHOD.to_string(),
            base_field_total: coerce_amount(Some(field.aau_total)),
            length_factor: factor,
            note: BASIS_NOTE.to_string(),
        },
    }
}
