//! Configuration loading for Fundwise.
//! Reads fundwise.toml from the current directory or the path in the FUNDWISE_CONFIG env var.
//! Every key is optional; the defaults are the calibrated model constants.

use fundwise_common::{FundwiseError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "FUNDWISE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "fundwise.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub cascade: CascadeConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub adjacent: AdjacentConfig,
}

// ── Reference data ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_opportunity_file")]
    pub opportunity_file: String,
    #[serde(default = "default_forecast_file")]
    pub forecast_file: String,
    #[serde(default = "default_flows_file")]
    pub flows_file: String,
    #[serde(default = "default_neighbors_file")]
    pub neighbors_file: String,
    #[serde(default = "default_taxonomy_file")]
    pub taxonomy_file: String,
    #[serde(default = "default_similarity_map_file")]
    pub similarity_map_file: String,
}

fn default_data_dir()            -> PathBuf { PathBuf::from("data") }
fn default_opportunity_file()    -> String { "opportunity_scores_v1.json".to_string() }
fn default_forecast_file()       -> String { "forecast_v1.json".to_string() }
fn default_flows_file()          -> String { "sankey.json".to_string() }
fn default_neighbors_file()      -> String { "similarity_neighbors_v1.json".to_string() }
fn default_taxonomy_file()       -> String { "for_taxonomy_v1.json".to_string() }
fn default_similarity_map_file() -> String { "similarity_map_v1.json".to_string() }

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            opportunity_file: default_opportunity_file(),
            forecast_file: default_forecast_file(),
            flows_file: default_flows_file(),
            neighbors_file: default_neighbors_file(),
            taxonomy_file: default_taxonomy_file(),
            similarity_map_file: default_similarity_map_file(),
        }
    }
}

impl DataConfig {
    pub fn path_of(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

// ── Budget estimation ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Project length treated as a length factor of 1.0.
    #[serde(default = "default_reference_months")]
    pub reference_months: f64,
    /// Used when the request carries no project length.
    #[serde(default = "default_months")]
    pub default_months: f64,
    #[serde(default = "default_min_length_factor")]
    pub min_length_factor: f64,
    #[serde(default = "default_max_length_factor")]
    pub max_length_factor: f64,
    /// Share of the field's historical total a single project is sized at.
    #[serde(default = "default_field_share")]
    pub field_share: f64,
    #[serde(default = "default_min_budget")]
    pub min_budget: f64,
    #[serde(default = "default_max_budget")]
    pub max_budget: f64,
    #[serde(default = "default_low_multiplier")]
    pub low_multiplier: f64,
    #[serde(default = "default_high_multiplier")]
    pub high_multiplier: f64,
}

fn default_reference_months()  -> f64 { 18.0 }
fn default_months()            -> f64 { 12.0 }
fn default_min_length_factor() -> f64 { 0.5 }
fn default_max_length_factor() -> f64 { 2.5 }
fn default_field_share()       -> f64 { 0.0045 }
fn default_min_budget()        -> f64 { 200_000.0 }
fn default_max_budget()        -> f64 { 6_000_000.0 }
fn default_low_multiplier()    -> f64 { 0.7 }
fn default_high_multiplier()   -> f64 { 1.4 }

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            reference_months: default_reference_months(),
            default_months: default_months(),
            min_length_factor: default_min_length_factor(),
            max_length_factor: default_max_length_factor(),
            field_share: default_field_share(),
            min_budget: default_min_budget(),
            max_budget: default_max_budget(),
            low_multiplier: default_low_multiplier(),
            high_multiplier: default_high_multiplier(),
        }
    }
}

// ── Funder matching cascade ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// A tier that leaves the running list at or above this count stops the cascade.
    #[serde(default = "default_min_candidates")]
    pub min_candidates: usize,
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    #[serde(default = "default_neighbor_min_similarity")]
    pub neighbor_min_similarity: f64,
    #[serde(default = "default_neighbor_limit")]
    pub neighbor_limit: usize,
    /// Lower bound on a neighbour's squared-similarity weight.
    #[serde(default = "default_neighbor_min_weight")]
    pub neighbor_min_weight: f64,
    #[serde(default = "default_sibling_limit")]
    pub sibling_limit: usize,
    /// How many neighbour/sibling names the provenance note lists.
    #[serde(default = "default_names_reported")]
    pub names_reported: usize,
}

fn default_min_candidates()          -> usize { 3 }
fn default_max_candidates()          -> usize { 6 }
fn default_neighbor_min_similarity() -> f64   { 0.15 }
fn default_neighbor_limit()          -> usize { 10 }
fn default_neighbor_min_weight()     -> f64   { 0.02 }
fn default_sibling_limit()           -> usize { 12 }
fn default_names_reported()          -> usize { 4 }

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            min_candidates: default_min_candidates(),
            max_candidates: default_max_candidates(),
            neighbor_min_similarity: default_neighbor_min_similarity(),
            neighbor_limit: default_neighbor_limit(),
            neighbor_min_weight: default_neighbor_min_weight(),
            sibling_limit: default_sibling_limit(),
            names_reported: default_names_reported(),
        }
    }
}

// ── Funder scoring and risk ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_forecast_year")]
    pub forecast_year: i32,
    #[serde(default = "default_surfaced_funders")]
    pub surfaced_funders: usize,
    #[serde(default = "default_award_flow_share")]
    pub award_flow_share: f64,
    #[serde(default = "default_min_award")]
    pub min_award: f64,
    /// No single funder is modelled as covering more than this share of the remaining need.
    #[serde(default = "default_need_cap_share")]
    pub need_cap_share: f64,
    #[serde(default = "default_min_award_cap")]
    pub min_award_cap: f64,
    #[serde(default = "default_gap_penalty_scale")]
    pub gap_penalty_scale: f64,
    #[serde(default)]
    pub win: WinWeights,
    #[serde(default)]
    pub timing: TimingThresholds,
    #[serde(default)]
    pub risk: RiskThresholds,
}

fn default_forecast_year()     -> i32   { 2026 }
fn default_surfaced_funders()  -> usize { 5 }
fn default_award_flow_share()  -> f64   { 0.25 }
fn default_min_award()         -> f64   { 80_000.0 }
fn default_need_cap_share()    -> f64   { 0.7 }
fn default_min_award_cap()     -> f64   { 120_000.0 }
fn default_gap_penalty_scale() -> f64   { 6.0 }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            forecast_year: default_forecast_year(),
            surfaced_funders: default_surfaced_funders(),
            award_flow_share: default_award_flow_share(),
            min_award: default_min_award(),
            need_cap_share: default_need_cap_share(),
            min_award_cap: default_min_award_cap(),
            gap_penalty_scale: default_gap_penalty_scale(),
            win: WinWeights::default(),
            timing: TimingThresholds::default(),
            risk: RiskThresholds::default(),
        }
    }
}

/// Coefficients of the win-probability model and its floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinWeights {
    #[serde(default = "default_win_base")]
    pub base: f64,
    #[serde(default = "default_win_fit")]
    pub fit: f64,
    #[serde(default = "default_win_presence")]
    pub presence: f64,
    #[serde(default = "default_win_gap_penalty")]
    pub gap_penalty: f64,
    #[serde(default = "default_floor_base")]
    pub floor_base: f64,
    #[serde(default = "default_floor_presence")]
    pub floor_presence: f64,
    #[serde(default = "default_floor_opportunity")]
    pub floor_opportunity: f64,
}

fn default_win_base()          -> f64 { 0.2 }
fn default_win_fit()           -> f64 { 0.45 }
fn default_win_presence()      -> f64 { 0.25 }
fn default_win_gap_penalty()   -> f64 { 0.2 }
fn default_floor_base()        -> f64 { 0.12 }
fn default_floor_presence()    -> f64 { 0.12 }
fn default_floor_opportunity() -> f64 { 0.08 }

impl Default for WinWeights {
    fn default() -> Self {
        Self {
            base: default_win_base(),
            fit: default_win_fit(),
            presence: default_win_presence(),
            gap_penalty: default_win_gap_penalty(),
            floor_base: default_floor_base(),
            floor_presence: default_floor_presence(),
            floor_opportunity: default_floor_opportunity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingThresholds {
    #[serde(default = "default_fast_forecast")]
    pub fast_forecast: f64,
    #[serde(default = "default_fast_growth")]
    pub fast_growth: f64,
    #[serde(default = "default_medium_forecast")]
    pub medium_forecast: f64,
    #[serde(default = "default_medium_growth")]
    pub medium_growth: f64,
}

fn default_fast_forecast()   -> f64 { 200_000_000.0 }
fn default_fast_growth()     -> f64 { 0.75 }
fn default_medium_forecast() -> f64 { 50_000_000.0 }
fn default_medium_growth()   -> f64 { 0.2 }

impl Default for TimingThresholds {
    fn default() -> Self {
        Self {
            fast_forecast: default_fast_forecast(),
            fast_growth: default_fast_growth(),
            medium_forecast: default_medium_forecast(),
            medium_growth: default_medium_growth(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskThresholds {
    #[serde(default = "default_large_need")]
    pub large_need: f64,
    #[serde(default = "default_under_target_gap")]
    pub under_target_gap: f64,
    #[serde(default = "default_weak_win_probability")]
    pub weak_win_probability: f64,
    #[serde(default = "default_min_funder_diversity")]
    pub min_funder_diversity: usize,
}

fn default_large_need()           -> f64   { 3_000_000.0 }
fn default_under_target_gap()     -> f64   { 0.03 }
fn default_weak_win_probability() -> f64   { 0.35 }
fn default_min_funder_diversity() -> usize { 3 }

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            large_need: default_large_need(),
            under_target_gap: default_under_target_gap(),
            weak_win_probability: default_weak_win_probability(),
            min_funder_diversity: default_min_funder_diversity(),
        }
    }
}

// ── Adjacent-field ranking ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjacentConfig {
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,
    #[serde(default = "default_min_top_n")]
    pub min_top_n: usize,
    #[serde(default = "default_max_top_n")]
    pub max_top_n: usize,
    /// Distance treated as zero proximity. √8 spans the diagonal of [-1, 1]².
    #[serde(default = "default_max_distance")]
    pub max_distance: f64,
    #[serde(default = "default_ease_floor")]
    pub ease_floor: f64,
    #[serde(default = "default_ease_span")]
    pub ease_span: f64,
    /// Forecast year preferred when reporting a candidate's available funding.
    #[serde(default = "default_forecast_year")]
    pub forecast_year: i32,
    #[serde(default)]
    pub weights: PivotWeights,
}

fn default_top_n()        -> usize { 6 }
fn default_min_top_n()    -> usize { 3 }
fn default_max_top_n()    -> usize { 8 }
fn default_max_distance() -> f64   { 8.0_f64.sqrt() }
fn default_ease_floor()   -> f64   { 0.08 }
fn default_ease_span()    -> f64   { 0.84 }

impl Default for AdjacentConfig {
    fn default() -> Self {
        Self {
            default_top_n: default_top_n(),
            min_top_n: default_min_top_n(),
            max_top_n: default_max_top_n(),
            max_distance: default_max_distance(),
            ease_floor: default_ease_floor(),
            ease_span: default_ease_span(),
            forecast_year: default_forecast_year(),
            weights: PivotWeights::default(),
        }
    }
}

impl AdjacentConfig {
    /// Clamp a requested result count into the configured window.
    pub fn clamp_top_n(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_top_n)
            .clamp(self.min_top_n, self.max_top_n.max(self.min_top_n))
    }
}

/// Pivot-ease composite weights. Taxonomy closeness dominates, then map
/// proximity, then lexical overlap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PivotWeights {
    #[serde(default = "default_same_category_weight")]
    pub same_category: f64,
    #[serde(default = "default_map_proximity_weight")]
    pub map_proximity: f64,
    #[serde(default = "default_lexical_weight")]
    pub lexical: f64,
}

fn default_same_category_weight() -> f64 { 0.55 }
fn default_map_proximity_weight() -> f64 { 0.30 }
fn default_lexical_weight()       -> f64 { 0.15 }

impl Default for PivotWeights {
    fn default() -> Self {
        Self {
            same_category: default_same_category_weight(),
            map_proximity: default_map_proximity_weight(),
            lexical: default_lexical_weight(),
        }
    }
}

impl PivotWeights {
    /// Validate that all weights sum to ~1.0
    pub fn validate(&self) -> bool {
        (self.sum() - 1.0).abs() < 1e-6
    }

    /// Renormalise weights so they sum to 1.0
    pub fn normalise(&mut self) {
        let sum = self.sum();
        if sum > 0.0 {
            self.same_category /= sum;
            self.map_proximity /= sum;
            self.lexical /= sum;
        }
    }

    fn sum(&self) -> f64 {
        self.same_category + self.map_proximity + self.lexical
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl EngineConfig {
    /// Load from `$FUNDWISE_CONFIG`, else `./fundwise.toml`, else built-in defaults.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        }
        Self::from_toml_file(&path)
    }

    /// Load from an explicit TOML file. The file must exist.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.finish()?;
        tracing::info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.finish()?;
        Ok(config)
    }

    /// Renormalise pivot weights and reject settings the engine cannot honour.
    fn finish(&mut self) -> Result<()> {
        if !self.adjacent.weights.validate() {
            tracing::warn!(weights = ?self.adjacent.weights, "Pivot weights do not sum to 1.0; renormalising");
            self.adjacent.weights.normalise();
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        let finite = [
            ("budget.reference_months", self.budget.reference_months),
            ("budget.default_months", self.budget.default_months),
            ("budget.min_length_factor", self.budget.min_length_factor),
            ("budget.max_length_factor", self.budget.max_length_factor),
            ("budget.min_budget", self.budget.min_budget),
            ("budget.max_budget", self.budget.max_budget),
            ("adjacent.max_distance", self.adjacent.max_distance),
            ("adjacent.ease_floor", self.adjacent.ease_floor),
            ("adjacent.ease_span", self.adjacent.ease_span),
            ("adjacent.weights.same_category", self.adjacent.weights.same_category),
            ("adjacent.weights.map_proximity", self.adjacent.weights.map_proximity),
            ("adjacent.weights.lexical", self.adjacent.weights.lexical),
        ];
        for (key, value) in finite {
            if !value.is_finite() {
                problems.push(format!("{key} must be a finite number"));
            }
        }
        if self.cascade.min_candidates == 0 {
            problems.push("cascade.min_candidates must be at least 1".to_string());
        }
        if self.cascade.max_candidates < self.cascade.min_candidates {
            problems.push("cascade.max_candidates must be >= cascade.min_candidates".to_string());
        }
        if self.budget.min_budget > self.budget.max_budget {
            problems.push("budget.min_budget must be <= budget.max_budget".to_string());
        }
        if self.budget.min_length_factor > self.budget.max_length_factor {
            problems.push("budget.min_length_factor must be <= budget.max_length_factor".to_string());
        }
        if self.budget.reference_months <= 0.0 {
            problems.push("budget.reference_months must be positive".to_string());
        }
        if self.adjacent.max_distance <= 0.0 {
            problems.push("adjacent.max_distance must be positive".to_string());
        }
        if self.adjacent.min_top_n > self.adjacent.max_top_n {
            problems.push("adjacent.min_top_n must be <= adjacent.max_top_n".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(FundwiseError::Config(problems.join("; ")))
        }
    }
}
