//! Unified error types for triage

use thiserror::Error;

/// Unified error type for all triage operations
#[derive(Error, Debug)]
pub enum TriageError {
    // Model backend errors
    #[error("No model backend available: {0}")]
    BackendUnavailable(String),

    #[error("Model API error: {0}")]
    Api(String),

    #[error("Model API limit: {0}")]
    ApiLimit(String),

    // Decoding errors
    #[error("Decode error: {0}")]
    Decode(String),

    // Static analysis errors
    #[error("Syntax error: {0}")]
    Syntax(String),

    // Verification errors
    #[error("Verification error: {0}")]
    Verification(String),

    #[error("No entry point found in fix")]
    NoEntryPoint,

    // Auxiliary service errors
    #[error("Service error: {0}")]
    Service(String),

    // Workflow errors
    #[error("Workflow graph error: {0}")]
    Graph(String),

    #[error("Workflow exceeded {0} steps")]
    StepLimit(usize),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

/// Result type alias using TriageError
pub type Result<T> = std::result::Result<T, TriageError>;
