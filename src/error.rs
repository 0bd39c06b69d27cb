use thiserror::Error;

/// Main error type for the trainer and the prediction service
#[derive(Error, Debug)]
pub enum DiariskError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Dataset errors
    #[error("Dataset error: {0}")]
    Dataset(String),

    // Model artifact errors
    #[error("Model error: {0}")]
    Model(String),

    // Training errors
    #[error("Training failed: {0}")]
    Training(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for DiariskError
pub type Result<T> = std::result::Result<T, DiariskError>;
