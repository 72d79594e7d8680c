//! Researcher decision.
//!
//! Budget → funder cascade → scoring → risk flags → grant plan, for one
//! research idea against one reference snapshot.

use fundwise_common::{FundwiseError, Result};
use fundwise_config::EngineConfig;
use fundwise_data::ReferenceData;
use serde::{Deserialize, Serialize};

use crate::budget::{estimate_budget, BudgetEstimate};
use crate::cascade::{match_funders, CascadeTier, SourceTier};
use crate::placeholder::{GenericFunderPriors, NoDataPlaceholder};
use crate::request::DecisionRequest;
use crate::risk::derive_risk_flags;
use crate::scorer::{score_funders, FunderRecommendation};

const PHASE_ACTIONS: [&str; 3] = [
    "Submit primary proposal",
    "Submit backup in parallel",
    "Hold as contingency",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub field_code: String,
    pub field_name: String,
    pub opportunity_score: f64,
    pub growth_rate: f64,
    pub under_target_gap: f64,
    pub forecast_year: i32,
    /// Forecast funding in `forecast_year`, 0 when the field has no row.
    pub forecast: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantPhase {
    pub phase: usize,
    pub target_funder: String,
    pub why: String,
    pub suggested_action: String,
}

/// Where the funder evidence came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikelihoodContext {
    pub funder_data_mode: SourceTier,
    pub fallback_note: String,
    pub neighbors_used: Vec<String>,
    pub field_funder_links_found: usize,
    pub tiers_run: Vec<CascadeTier>,
    /// Tiers that added at least one funder.
    pub contributing_tiers: Vec<CascadeTier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub request: DecisionRequest,
    pub summary: FieldSummary,
    pub budget: BudgetEstimate,
    pub top_funders: Vec<FunderRecommendation>,
    pub risk_flags: Vec<String>,
    pub grant_plan: Vec<GrantPhase>,
    pub likelihood_context: LikelihoodContext,
}

fn percent(x: f64) -> i64 {
    (x * 100.0).round() as i64
}

fn grant_plan(funders: &[FunderRecommendation]) -> Vec<GrantPhase> {
    funders
        .iter()
        .zip(PHASE_ACTIONS)
        .enumerate()
        .map(|(i, (f, action))| GrantPhase {
            phase: i + 1,
            target_funder: f.funder_name.clone(),
            why: format!(
                "Fit {}% | Win probability {}%",
                percent(f.fit_score),
                percent(f.win_probability)
            ),
            suggested_action: action.to_string(),
        })
        .collect()
}

/// Run one researcher decision with the default placeholder funders.
pub fn run_researcher_decision(
    data: &ReferenceData,
    request: &DecisionRequest,
    config: &EngineConfig,
) -> Result<DecisionResult> {
    run_researcher_decision_with(data, request, config, &GenericFunderPriors)
}

/// Run one researcher decision.
///
/// Fails with [`FundwiseError::UnknownField`] when the field code is not in
/// the opportunity table.
pub fn run_researcher_decision_with(
    data: &ReferenceData,
    request: &DecisionRequest,
    config: &EngineConfig,
    placeholder: &dyn NoDataPlaceholder,
) -> Result<DecisionResult> {
    let code = request.field_code.trim();
    let field = data
        .field(code)
        .ok_or_else(|| FundwiseError::UnknownField(code.to_string()))?;

    tracing::info!(field = %code, months = request.project_length_months, "Running researcher decision");

    let budget = estimate_budget(field, request, &config.budget);
    let cascade = match_funders(data, code, &config.cascade, placeholder)?;

    let year = config.scoring.forecast_year;
    let forecast = data.forecast_for(code, year).unwrap_or(0.0);
    let top_funders = score_funders(&cascade.candidates, field, budget.remaining_need, forecast, &config.scoring);
    let risk_flags = derive_risk_flags(budget.remaining_need, field, &top_funders, &config.scoring.risk);

    tracing::debug!(
        field = %code,
        source_tier = %cascade.source_tier,
        funders = top_funders.len(),
        flags = risk_flags.len(),
        "Researcher decision scored"
    );

    Ok(DecisionResult {
        request: request.clone(),
        summary: FieldSummary {
            field_code: field.code.clone(),
            field_name: field.name.clone(),
            opportunity_score: field.opportunity_score,
            growth_rate: field.growth_rate,
            under_target_gap: field.under_target_gap,
            forecast_year: year,
            forecast,
        },
        budget,
        grant_plan: grant_plan(&top_funders),
        top_funders,
        risk_flags,
        likelihood_context: LikelihoodContext {
            funder_data_mode: cascade.source_tier,
            fallback_note: cascade.fallback_note,
            neighbors_used: cascade.related_fields_used,
            field_funder_links_found: cascade.direct_links_found,
            tiers_run: cascade.tiers_run,
            contributing_tiers: cascade.contributing_tiers,
        },
    })
}
