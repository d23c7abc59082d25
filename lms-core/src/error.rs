use thiserror::Error;

/// Common result type for core operations.
pub type Result<T> = std::result::Result<T, LmsError>;

#[derive(Debug, Error)]
pub enum LmsError {
    #[error("invalid throttle rule: {0}")]
    InvalidRule(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
