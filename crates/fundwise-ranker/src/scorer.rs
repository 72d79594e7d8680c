//! Funder scoring.
//!
//! Turns cascade candidates into recommendations: how well each funder fits
//! the field, how likely the institution is to win an award, how large that
//! award is likely to be and when it would land.

use std::cmp::Ordering;

use fundwise_common::OpportunityField;
use fundwise_config::{ScoringConfig, TimingThresholds};
use serde::{Deserialize, Serialize};

use crate::cascade::{FunderCandidate, SourceTier};
use crate::normalise::{clamp01, log_share_of_max, share_of_max};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunderRecommendation {
    pub funder_name: String,
    pub expected_award_amount: f64,
    pub award_timing_window: String,
    pub win_probability: f64,
    pub fit_score: f64,
    pub institution_presence_score: f64,
    pub source_tier: SourceTier,
}

/// Expected award timing from the field's forecast and growth.
pub fn timing_window(forecast: f64, growth_rate: f64, t: &TimingThresholds) -> &'static str {
    if forecast > t.fast_forecast || growth_rate > t.fast_growth {
        "6-12 months"
    } else if forecast > t.medium_forecast || growth_rate > t.medium_growth {
        "9-15 months"
    } else {
        "12-24 months"
    }
}

/// Win probability for one funder.
///
/// The composite is floored by a small prior that grows with institutional
/// presence and field opportunity.
pub fn win_probability(fit: f64, presence: f64, field: &OpportunityField, cfg: &ScoringConfig) -> f64 {
    let w = &cfg.win;
    let gap_penalty = clamp01(field.under_target_gap * cfg.gap_penalty_scale);
    let floor = clamp01(
        w.floor_base + w.floor_presence * presence + w.floor_opportunity * clamp01(field.opportunity_score),
    );
    let composite = clamp01(w.base + w.fit * fit + w.presence * presence - w.gap_penalty * gap_penalty);
    floor.max(composite)
}

/// `min(max(min_award, flow × share), max(min_cap, need × cap_share))`, rounded.
pub fn expected_award(flow: f64, remaining_need: f64, cfg: &ScoringConfig) -> f64 {
    let by_flow = (flow * cfg.award_flow_share).max(cfg.min_award);
    let cap = (remaining_need * cfg.need_cap_share).max(cfg.min_award_cap);
    by_flow.min(cap).round()
}

/// Score every candidate and return the best `surfaced_funders` by win
/// probability. Equal probabilities keep cascade order.
pub fn score_funders(
    candidates: &[FunderCandidate],
    field: &OpportunityField,
    remaining_need: f64,
    forecast: f64,
    cfg: &ScoringConfig,
) -> Vec<FunderRecommendation> {
    let max_flow = candidates.iter().map(|c| c.flow).fold(0.0_f64, f64::max);
    let max_presence = candidates
        .iter()
        .map(|c| c.institution_presence)
        .fold(1.0_f64, f64::max);
    let timing = timing_window(forecast, field.growth_rate, &cfg.timing);

    let mut scored: Vec<FunderRecommendation> = candidates
        .iter()
        .map(|c| {
            let fit = share_of_max(c.flow, max_flow);
            let presence = log_share_of_max(c.institution_presence, max_presence);
            FunderRecommendation {
                funder_name: c.name.clone(),
                expected_award_amount: expected_award(c.flow, remaining_need, cfg),
                award_timing_window: timing.to_string(),
                win_probability: win_probability(fit, presence, field, cfg),
                fit_score: fit,
                institution_presence_score: presence,
                source_tier: c.tier.source_tier(),
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.win_probability
            .partial_cmp(&a.win_probability)
            .unwrap_or(Ordering::Equal)
    });
    scored.truncate(cfg.surfaced_funders);
    scored
}
