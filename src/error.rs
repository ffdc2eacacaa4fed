use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed scenario parameters; fatal to the generation call only
    #[error("Generation error: {0}")]
    Generation(String),

    /// Pipeline fit failure; no partial artifact is persisted
    #[error("Training error: {0}")]
    Training(String),

    /// Missing or corrupt artifact on durable storage
    #[error("Artifact load error: {0}")]
    ArtifactLoad(String),

    /// Inference requested while no artifact is loaded
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Malformed input row; reported per row in batch mode
    #[error("Inference error: {0}")]
    Inference(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::Generation(_) => "GENERATION_ERROR",
            AppError::Training(_) => "TRAINING_ERROR",
            AppError::ArtifactLoad(_) => "ARTIFACT_LOAD_ERROR",
            AppError::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            AppError::Inference(_) => "INFERENCE_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
