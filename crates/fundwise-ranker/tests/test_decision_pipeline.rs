//! End-to-end researcher and portfolio decisions over fixture snapshots.
//!
//! Run with: cargo test --package fundwise-ranker --test test_decision_pipeline

use fundwise_common::FundwiseError;
use fundwise_config::EngineConfig;
use fundwise_data::ReferenceData;
use fundwise_ranker::portfolio::{aggregate_portfolio, PortfolioRanking};
use fundwise_ranker::{
    match_funders, run_admin_decision, run_researcher_decision, CascadeTier, DecisionRequest,
    GenericFunderPriors, PortfolioRequest, SourceTier,
};
use fundwise_test_utils::{assert_close, sample_records, FixtureBuilder};
use pretty_assertions::assert_eq;

fn sample() -> ReferenceData {
    sample_records().into()
}

#[test]
fn test_scores_bounded_for_every_field() {
    let data = sample();
    let config = EngineConfig::default();
    for field in data.fields() {
        for months in [0.0, 6.0, 24.0, 120.0] {
            let request = DecisionRequest::auto(&field.code, months).with_already_received(100_000.0);
            let result = run_researcher_decision(&data, &request, &config).unwrap();
            assert!(!result.top_funders.is_empty());
            assert!(result.top_funders.len() <= 5);
            for f in &result.top_funders {
                assert!((0.0..=1.0).contains(&f.win_probability), "{}: {f:?}", field.code);
                assert!((0.0..=1.0).contains(&f.fit_score), "{}: {f:?}", field.code);
            }
            let b = &result.budget;
            assert_eq!(b.remaining_need, (b.selected_budget - b.already_received).max(0.0));
        }
    }
}

#[test]
fn test_subject_allocations_floor_the_midpoint() {
    let data = sample();
    let request = DecisionRequest::auto("4605", 6.0)
        .with_allocation("equipment", 900_000.0)
        .with_allocation("personnel", 600_000.0);
    let result = run_researcher_decision(&data, &request, &EngineConfig::default()).unwrap();
    assert!(result.budget.recommended_mid >= 1_500_000.0);
    assert_eq!(result.budget.subject_allocation_total, 1_500_000.0);
}

#[test]
fn test_direct_evidence_stops_the_cascade() {
    let data = sample();
    let outcome = match_funders(&data, "4601", &EngineConfig::default().cascade, &GenericFunderPriors).unwrap();
    assert_eq!(outcome.tiers_run, vec![CascadeTier::Direct]);
    assert_eq!(outcome.source_tier, SourceTier::FieldObserved);
}

#[test]
fn test_neighbours_without_direct_edges_report_similar_field_fallback() {
    // Zero direct edges, two neighbours above threshold, siblings available.
    let data: ReferenceData = FixtureBuilder::new()
        .field("4605", "Data management and data science", 10_000_000.0)
        .field("4601", "Applied computing", 50_000_000.0)
        .field("4602", "Artificial intelligence", 90_000_000.0)
        .field("4608", "Human-centred computing", 20_000_000.0)
        .taxonomy("4605", "46", "Information and computing sciences")
        .taxonomy("4601", "46", "Information and computing sciences")
        .taxonomy("4602", "46", "Information and computing sciences")
        .taxonomy("4608", "46", "Information and computing sciences")
        .neighbor("4605", "4601", 0.5)
        .neighbor("4605", "4602", 0.3)
        .flow("National Science Foundation", "4601", 3_000_000.0, 500_000.0)
        .flow("DARPA", "4602", 2_000_000.0, 200_000.0)
        .flow("Sloan Foundation", "4608", 400_000.0, 10_000.0)
        .flow("NIH", "3101", 90_000_000.0, 1_000_000.0)
        .build()
        .into();

    let result =
        run_researcher_decision(&data, &DecisionRequest::auto("4605", 12.0), &EngineConfig::default()).unwrap();
    let ctx = &result.likelihood_context;
    assert_eq!(ctx.funder_data_mode, SourceTier::SimilarFieldFallback);
    assert_eq!(ctx.field_funder_links_found, 0);
    assert!(!ctx.tiers_run.contains(&CascadeTier::Global));
    assert!(!ctx.contributing_tiers.contains(&CascadeTier::Direct));
    assert!(ctx.contributing_tiers.contains(&CascadeTier::SimilarityNeighbor));
    assert!(!result.top_funders.is_empty());
    assert!(result.top_funders.iter().all(|f| f.funder_name != "NIH"));
}

#[test]
fn test_field_with_no_evidence_still_gets_funders() {
    let data: ReferenceData = FixtureBuilder::new()
        .scored_field("9999", "Isolated field", 0.0, 0.4, 0.0, 0.0)
        .build()
        .into();
    let result =
        run_researcher_decision(&data, &DecisionRequest::auto("9999", 12.0), &EngineConfig::default()).unwrap();
    assert_eq!(result.likelihood_context.funder_data_mode, SourceTier::BaselineFallback);
    assert_eq!(result.top_funders.len(), 5);
    assert_eq!(result.budget.recommended_mid, 200_000.0);
    assert_eq!(result.top_funders[0].source_tier, SourceTier::BaselineFallback);
}

#[test]
fn test_portfolio_coverage_from_two_projects() {
    let row = |code: &str, need: f64, inflow: f64| PortfolioRanking {
        field_code: code.to_string(),
        field_name: code.to_string(),
        remaining_need: need,
        expected_inflow: inflow,
        priority_score: need,
        top_funder: "NSF".to_string(),
        top_funder_probability: 0.5,
    };
    let result = aggregate_portfolio(
        18.0,
        Some(0.0),
        vec![row("a", 1_000_000.0, 400_000.0), row("b", 500_000.0, 500_000.0)],
    );
    assert_close(result.coverage_ratio, 0.6, 1e-12);
    assert_eq!(result.projects_analyzed, 2);
}

#[test]
fn test_admin_decision_ranks_by_priority() {
    let data = sample();
    let request = PortfolioRequest {
        planning_horizon_months: 24.0,
        current_funding: Some(1_000_000.0),
        portfolio: vec![
            DecisionRequest::auto("4605", 12.0),
            DecisionRequest::auto("4602", 36.0),
            DecisionRequest::auto("3101", 24.0).with_already_received(10_000_000.0),
        ],
    };
    let result = run_admin_decision(&data, &request, &EngineConfig::default()).unwrap();
    assert_eq!(result.projects_analyzed, 3);
    assert_eq!(result.portfolio_rankings[0].field_code, "4602");
    assert_eq!(result.portfolio_rankings[2].field_code, "3101");
    assert_eq!(result.portfolio_rankings[2].remaining_need, 0.0);
    assert_eq!(result.portfolio_actions.len(), 3);
    assert!(result.portfolio_actions[0]
        .action
        .starts_with("Prioritize Artificial intelligence outreach to "));
    let expected_coverage = result.expected_funding_inflow / result.total_remaining_need;
    assert_close(result.coverage_ratio, expected_coverage, 1e-9);
}

#[test]
fn test_unknown_field_aborts_the_batch() {
    let data = sample();
    let request = PortfolioRequest {
        planning_horizon_months: 12.0,
        current_funding: None,
        portfolio: vec![DecisionRequest::auto("4601", 12.0), DecisionRequest::auto("0000", 12.0)],
    };
    let err = run_admin_decision(&data, &request, &EngineConfig::default()).unwrap_err();
    assert!(matches!(err, FundwiseError::UnknownField(code) if code == "0000"));
}

#[test]
fn test_empty_portfolio_is_invalid() {
    let err = run_admin_decision(&sample(), &PortfolioRequest::default(), &EngineConfig::default()).unwrap_err();
    assert!(matches!(err, FundwiseError::InvalidRequest(_)));
    assert!(err.is_caller_error());
}

#[test]
fn test_request_json_round_trips_into_decision() {
    let request: DecisionRequest = serde_json::from_str(
        r#"{"idea_text": "Privacy-preserving analytics", "cmu_campus_code": "grid.147455.6",
            "for4_code": "4601", "project_length_months": 24, "budget_mode": "auto"}"#,
    )
    .unwrap();
    let result = run_researcher_decision(&sample(), &request, &EngineConfig::default()).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["summary"]["field_code"], "4601");
    assert_eq!(json["likelihood_context"]["funder_data_mode"], "field_observed");
    assert_eq!(json["likelihood_context"]["tiers_run"][0], "direct");
    assert_eq!(json["likelihood_context"]["contributing_tiers"][0], "direct");
    assert_eq!(json["budget"]["mode"], "auto");
}
