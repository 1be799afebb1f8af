use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse scenario JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to build internal scenario model: {0}")]
    ScenarioConstructionError(String),

    #[error("Failed to build flow command: {0}")]
    CommandConstructionError(String),

    #[error("Node execution facility failed: {0}")]
    ExecutionError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
