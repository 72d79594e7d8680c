use thiserror::Error;

#[derive(Debug, Error)]
pub enum FundwiseError {
    #[error("Unknown field code: {0}")]
    UnknownField(String),

    #[error("Missing reference data: {0}")]
    MissingReferenceData(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Artifact validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FundwiseError {
    /// True for errors caused by the caller's input rather than the engine or its data.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, FundwiseError::UnknownField(_) | FundwiseError::InvalidRequest(_))
    }
}

pub type Result<T> = std::result::Result<T, FundwiseError>;
