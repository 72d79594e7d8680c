//! Reference data access.
//!
//! Provides an abstraction over where the precomputed artifacts come from,
//! so the engine can be handed a snapshot without knowing about files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fundwise_common::{FundwiseError, ReferenceRecords, Result, TaxonomyArtifact};
use fundwise_config::DataConfig;
use serde::de::DeserializeOwned;

use crate::snapshot::ReferenceData;

/// Trait for loading an immutable reference-data snapshot.
///
/// Implementations can use:
/// - JSON artifacts on disk
/// - Records already held in memory (testing, embedding)
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    /// Load and index one snapshot. Called once per invocation.
    async fn load(&self) -> Result<ReferenceData>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

// ── JSON artifacts on disk ─────────────────────────────────────────────────

/// Reads the six JSON artifacts from a data directory.
///
/// The opportunity table is required: without it no field can be resolved.
/// Every other artifact is optional and loads as an empty set when its file
/// is absent.
pub struct JsonArtifactSource {
    config: DataConfig,
}

impl JsonArtifactSource {
    pub fn new(config: DataConfig) -> Self {
        Self { config }
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(DataConfig {
            dir: dir.into(),
            ..DataConfig::default()
        })
    }

    fn path(&self, file: &str) -> PathBuf {
        self.config.path_of(file)
    }
}

async fn read_required<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            FundwiseError::MissingReferenceData(format!("required artifact {} not found", path.display()))
        } else {
            FundwiseError::Io(e)
        }
    })?;
    Ok(serde_json::from_str(&raw)?)
}

async fn read_optional<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Optional artifact missing; treating as empty");
            Ok(T::default())
        }
        Err(e) => Err(FundwiseError::Io(e)),
    }
}

#[async_trait]
impl ReferenceSource for JsonArtifactSource {
    async fn load(&self) -> Result<ReferenceData> {
        let opportunity_path = self.path(&self.config.opportunity_file);
        let forecast_path = self.path(&self.config.forecast_file);
        let flows_path = self.path(&self.config.flows_file);
        let neighbors_path = self.path(&self.config.neighbors_file);
        let taxonomy_path = self.path(&self.config.taxonomy_file);
        let map_path = self.path(&self.config.similarity_map_file);

        let (opportunity, forecast, flows, neighbors, taxonomy, similarity_map) = tokio::try_join!(
            read_required(&opportunity_path),
            read_optional(&forecast_path),
            read_optional(&flows_path),
            read_optional(&neighbors_path),
            read_optional::<TaxonomyArtifact>(&taxonomy_path),
            read_optional(&map_path),
        )?;

        let records = ReferenceRecords {
            opportunity,
            forecast,
            flows,
            neighbors,
            taxonomy: taxonomy.records,
            similarity_map,
        };
        tracing::info!(
            source = %self.describe(),
            fields = records.opportunity.len(),
            flows = records.flows.len(),
            "Reference data loaded"
        );
        Ok(ReferenceData::from_records(records))
    }

    fn describe(&self) -> String {
        format!("json:{}", self.config.dir.display())
    }
}

// ── In-memory records ──────────────────────────────────────────────────────

/// Serves clones of records already in memory.
pub struct InMemorySource {
    records: ReferenceRecords,
}

impl InMemorySource {
    pub fn new(records: ReferenceRecords) -> Self {
        Self { records }
    }
}

#[async_trait]
impl ReferenceSource for InMemorySource {
    async fn load(&self) -> Result<ReferenceData> {
        Ok(ReferenceData::from_records(self.records.clone()))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
