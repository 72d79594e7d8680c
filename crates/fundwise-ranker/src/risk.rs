//! Advisory risk flags for a researcher decision.

use fundwise_common::OpportunityField;
use fundwise_config::RiskThresholds;

use crate::scorer::FunderRecommendation;

pub const LARGE_NEED: &str = "Large uncovered budget remains after current funding.";
pub const UNDER_TARGETED: &str =
    "The institution appears under-targeted in this field relative to external funding.";
pub const WEAK_TOP_FUNDER: &str = "Top funder likelihood is currently low; broaden the proposal set.";
pub const LOW_DIVERSITY: &str = "Limited funder diversity for this field.";

/// Derive flags from the remaining need, the field and the surfaced funders
/// (best first). Flags are reported in a fixed order.
pub fn derive_risk_flags(
    remaining_need: f64,
    field: &OpportunityField,
    funders: &[FunderRecommendation],
    t: &RiskThresholds,
) -> Vec<String> {
    let mut flags = Vec::new();
    if remaining_need > t.large_need {
        flags.push(LARGE_NEED.to_string());
    }
    if field.under_target_gap > t.under_target_gap {
        flags.push(UNDER_TARGETED.to_string());
    }
    let top_win = funders.first().map_or(0.0, |f| f.win_probability);
    if top_win < t.weak_win_probability {
        flags.push(WEAK_TOP_FUNDER.to_string());
    }
    if funders.len() < t.min_funder_diversity {
        flags.push(LOW_DIVERSITY.to_string());
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::SourceTier;

    fn funder(win: f64) -> FunderRecommendation {
        FunderRecommendation {
            funder_name: "NSF".to_string(),
            expected_award_amount: 100_000.0,
            award_timing_window: "9-15 months".to_string(),
            win_probability: win,
            fit_score: 1.0,
            institution_presence_score: 1.0,
            source_tier: SourceTier::FieldObserved,
        }
    }

    fn field(gap: f64) -> OpportunityField {
        OpportunityField { under_target_gap: gap, ..OpportunityField::default() }
    }

    #[test]
    fn test_healthy_decision_has_no_flags() {
        let funders = vec![funder(0.8), funder(0.6), funder(0.4)];
        assert!(derive_risk_flags(500_000.0, &field(0.0), &funders, &RiskThresholds::default()).is_empty());
    }

    #[test]
    fn test_every_flag_fires_in_order() {
        let flags = derive_risk_flags(3_500_000.0, &field(0.05), &[funder(0.2)], &RiskThresholds::default());
        assert_eq!(flags, vec![LARGE_NEED, UNDER_TARGETED, WEAK_TOP_FUNDER, LOW_DIVERSITY]);
    }

    #[test]
    fn test_no_funders_flags_weak_and_diversity() {
        let flags = derive_risk_flags(0.0, &field(0.0), &[], &RiskThresholds::default());
        assert_eq!(flags, vec![WEAK_TOP_FUNDER, LOW_DIVERSITY]);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let funders = vec![funder(0.35), funder(0.3), funder(0.3)];
        let flags = derive_risk_flags(3_000_000.0, &field(0.03), &funders, &RiskThresholds::default());
        assert!(flags.is_empty());
    }
}
