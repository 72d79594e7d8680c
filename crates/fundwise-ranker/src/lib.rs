//! fundwise-ranker — Funding recommendation engine.
//! Budget estimation, funder matching cascade, scoring, portfolio aggregation
//! and adjacent-field ranking over an immutable reference snapshot.

pub mod request;
pub mod normalise;
pub mod budget;
pub mod placeholder;
pub mod cascade;
pub mod scorer;
pub mod risk;
pub mod decision;
pub mod portfolio;
pub mod tokenize;
pub mod adjacent;
pub mod options;
pub mod service;

pub use adjacent::{rank_adjacent_fields, AdjacentCandidate, AdjacentRanking, PrimaryField};
pub use budget::{estimate_budget, BudgetEstimate};
pub use cascade::{match_funders, CascadeOutcome, CascadeTier, FunderCandidate, FunderKey, SourceTier};
pub use decision::{run_researcher_decision, run_researcher_decision_with, DecisionResult};
pub use options::{decision_options, DecisionOptions};
pub use placeholder::{GenericFunderPriors, NoDataPlaceholder, NoPlaceholder};
pub use portfolio::{run_admin_decision, run_admin_decision_with, PortfolioResult};
pub use request::{BudgetMode, DecisionRequest, PortfolioRequest, SubjectAllocation};
pub use scorer::FunderRecommendation;
pub use service::DecisionService;
