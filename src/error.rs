use thiserror::Error;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("File path error: {0}")]
    Path(String),

    #[error("Malformed action for bill {bill_id}: {reason}")]
    MalformedAction { bill_id: String, reason: String },

    #[error("Audit append failed for bill {bill_id}: {source}")]
    Audit {
        bill_id: String,
        source: std::io::Error,
    },

    #[error("Pattern store is locked by another learner run: {0}")]
    LearnerLocked(String),
}
