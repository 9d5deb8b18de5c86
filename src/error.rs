//! Error types for sdrgen
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::llm::LlmError;
use crate::refine::Stage;

/// All error types that can occur while producing a BRD/SDR
#[derive(Debug, Error)]
pub enum SdrError {
    /// Missing credential, model identifier or an invalid setting
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A pipeline stage's call to the text generation service failed
    #[error("Generation failed during {stage} stage: {source}")]
    Generation {
        stage: Stage,
        #[source]
        source: LlmError,
    },

    /// Prompt template could not be registered or rendered
    #[error("Template error: {0}")]
    Template(String),

    /// Discovery input could not be loaded
    #[error("Discovery input error: {0}")]
    Discovery(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SdrError {
    /// The stage that failed, if this is a generation failure
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            SdrError::Generation { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Result type alias for sdrgen operations
pub type Result<T> = std::result::Result<T, SdrError>;
