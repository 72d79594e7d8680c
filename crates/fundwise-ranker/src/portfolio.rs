//! Admin portfolio aggregation.
//!
//! Runs a researcher decision for every project in a portfolio, ranks the
//! projects by priority and rolls up need against expected inflow.

use std::cmp::Ordering;

use fundwise_common::lenient::coerce_amount;
use fundwise_common::{FundwiseError, Result};
use fundwise_config::EngineConfig;
use fundwise_data::ReferenceData;
use serde::{Deserialize, Serialize};

use crate::decision::{run_researcher_decision_with, DecisionResult};
use crate::placeholder::{GenericFunderPriors, NoDataPlaceholder};
use crate::request::{DecisionRequest, PortfolioRequest};

/// Portfolios at or below this size are decided sequentially.
#[cfg(feature = "parallel")]
const PARALLEL_THRESHOLD: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRanking {
    pub field_code: String,
    pub field_name: String,
    pub remaining_need: f64,
    pub expected_inflow: f64,
    pub priority_score: f64,
    /// `"N/A"` when the project surfaced no funders.
    pub top_funder: String,
    pub top_funder_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAction {
    pub rank: usize,
    pub action: String,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioResult {
    pub planning_horizon_months: f64,
    pub projects_analyzed: usize,
    pub total_remaining_need: f64,
    pub expected_funding_inflow: f64,
    pub coverage_ratio: f64,
    pub current_funding: f64,
    pub portfolio_rankings: Vec<PortfolioRanking>,
    pub portfolio_actions: Vec<PortfolioAction>,
}

/// Collapse one researcher decision into its portfolio row.
pub fn rank_project(result: &DecisionResult) -> PortfolioRanking {
    let expected_inflow: f64 = result
        .top_funders
        .iter()
        .map(|f| f.expected_award_amount * f.win_probability)
        .sum();
    let need = result.budget.remaining_need;
    let priority = need
        * (1.0 + result.summary.under_target_gap.max(0.0))
        * (1.0 + result.summary.growth_rate.max(0.0));
    let top = result.top_funders.first();

    PortfolioRanking {
        field_code: result.summary.field_code.clone(),
        field_name: result.summary.field_name.clone(),
        remaining_need: need,
        expected_inflow: expected_inflow.round(),
        priority_score: priority.round(),
        top_funder: top.map_or_else(|| "N/A".to_string(), |f| f.funder_name.clone()),
        top_funder_probability: top.map_or(0.0, |f| f.win_probability),
    }
}

/// Sort rows by priority and compute portfolio totals and actions.
pub fn aggregate_portfolio(
    planning_horizon_months: f64,
    current_funding: Option<f64>,
    mut rankings: Vec<PortfolioRanking>,
) -> PortfolioResult {
    rankings.sort_by(|a, b| {
        b.priority_score
            .partial_cmp(&a.priority_score)
            .unwrap_or(Ordering::Equal)
    });

    let total_need: f64 = rankings.iter().map(|r| r.remaining_need).sum();
    let inflow: f64 = rankings.iter().map(|r| r.expected_inflow).sum();
    let coverage_ratio = if total_need > 0.0 { inflow / total_need } else { 0.0 };

    let portfolio_actions = rankings
        .iter()
        .take(3)
        .enumerate()
        .map(|(i, r)| PortfolioAction {
            rank: i + 1,
            action: format!("Prioritize {} outreach to {}", r.field_name, r.top_funder),
            rationale: format!(
                "Need {} | Expected inflow {}",
                group_thousands(r.remaining_need),
                group_thousands(r.expected_inflow)
            ),
        })
        .collect();

    PortfolioResult {
        planning_horizon_months: coerce_amount(Some(planning_horizon_months)),
        projects_analyzed: rankings.len(),
        total_remaining_need: total_need.round(),
        expected_funding_inflow: inflow.round(),
        coverage_ratio,
        current_funding: coerce_amount(current_funding).max(0.0).round(),
        portfolio_rankings: rankings,
        portfolio_actions,
    }
}

/// `1234567.0` → `"1,234,567"`.
pub fn group_thousands(value: f64) -> String {
    let n = coerce_amount(Some(value)).round() as i64;
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn decide_all(
    data: &ReferenceData,
    projects: &[DecisionRequest],
    config: &EngineConfig,
    placeholder: &dyn NoDataPlaceholder,
) -> Result<Vec<DecisionResult>> {
    #[cfg(feature = "parallel")]
    {
        if projects.len() > PARALLEL_THRESHOLD {
            use rayon::prelude::*;
            return projects
                .par_iter()
                .map(|p| run_researcher_decision_with(data, p, config, placeholder))
                .collect();
        }
    }

    projects
        .iter()
        .map(|p| run_researcher_decision_with(data, p, config, placeholder))
        .collect()
}

pub fn run_admin_decision(
    data: &ReferenceData,
    request: &PortfolioRequest,
    config: &EngineConfig,
) -> Result<PortfolioResult> {
    run_admin_decision_with(data, request, config, &GenericFunderPriors)
}

/// Decide every project and aggregate. Any failing project fails the whole
/// batch; no partial portfolio is returned.
pub fn run_admin_decision_with(
    data: &ReferenceData,
    request: &PortfolioRequest,
    config: &EngineConfig,
    placeholder: &dyn NoDataPlaceholder,
) -> Result<PortfolioResult> {
    if request.portfolio.is_empty() {
        return Err(FundwiseError::InvalidRequest("portfolio contains no projects".to_string()));
    }

    tracing::info!(projects = request.portfolio.len(), "Running admin portfolio decision");

    let decisions = decide_all(data, &request.portfolio, config, placeholder)?;
    let rankings = decisions.iter().map(rank_project).collect();
    let result = aggregate_portfolio(request.planning_horizon_months, request.current_funding, rankings);

    tracing::debug!(
        need = result.total_remaining_need,
        inflow = result.expected_funding_inflow,
        coverage = result.coverage_ratio,
        "Portfolio aggregated"
    );
    Ok(result)
}
