//! Async entry points over a reference source.
//!
//! Each call loads one fresh snapshot and computes over it synchronously, so
//! artifacts replaced on disk are picked up by the next call.

use std::sync::Arc;

use fundwise_common::Result;
use fundwise_config::EngineConfig;
use fundwise_data::{validate, ReferenceData, ReferenceSource, ValidationReport};

use crate::adjacent::{rank_adjacent_fields, AdjacentRanking};
use crate::decision::{run_researcher_decision_with, DecisionResult};
use crate::options::{decision_options, DecisionOptions};
use crate::placeholder::{GenericFunderPriors, NoDataPlaceholder};
use crate::portfolio::{run_admin_decision_with, PortfolioResult};
use crate::request::{DecisionRequest, PortfolioRequest};

pub struct DecisionService {
    source: Arc<dyn ReferenceSource>,
    placeholder: Arc<dyn NoDataPlaceholder>,
    config: EngineConfig,
}

impl DecisionService {
    pub fn new(source: Arc<dyn ReferenceSource>, config: EngineConfig) -> Self {
        Self {
            source,
            placeholder: Arc::new(GenericFunderPriors),
            config,
        }
    }

    /// Replace the funders emitted when no evidence exists at any tier.
    pub fn with_placeholder(mut self, placeholder: Arc<dyn NoDataPlaceholder>) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn snapshot(&self) -> Result<ReferenceData> {
        tracing::debug!(source = %self.source.describe(), "Loading reference snapshot");
        self.source.load().await
    }

    pub async fn researcher(&self, request: &DecisionRequest) -> Result<DecisionResult> {
        let data = self.snapshot().await?;
        run_researcher_decision_with(&data, request, &self.config, self.placeholder.as_ref())
    }

    pub async fn admin(&self, request: &PortfolioRequest) -> Result<PortfolioResult> {
        let data = self.snapshot().await?;
        run_admin_decision_with(&data, request, &self.config, self.placeholder.as_ref())
    }

    pub async fn adjacent(&self, field_code: &str, top_n: Option<usize>) -> Result<AdjacentRanking> {
        let data = self.snapshot().await?;
        Ok(rank_adjacent_fields(&data, field_code, top_n, &self.config.adjacent))
    }

    pub async fn options(&self) -> Result<DecisionOptions> {
        let data = self.snapshot().await?;
        Ok(decision_options(&data))
    }

    pub async fn validate(&self) -> Result<ValidationReport> {
        let data = self.snapshot().await?;
        validate(&data)
    }
}
