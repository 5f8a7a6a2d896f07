//! Error types for cave level generation

use thiserror::Error;

/// Errors that can occur during level generation or queries
#[derive(Debug, Error)]
pub enum LevelGenError {
    /// Configuration validation failed
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Generation failed due to geometry issues
    #[error("generation failed: {0}")]
    GenerationFailed(String),
    /// Requested cell ID does not exist
    #[error("cell not found: {0}")]
    CellNotFound(usize),
    /// A generation parameter file could not be read
    #[error("failed to read generation parameters: {0}")]
    ParamsIo(#[from] std::io::Error),
    /// A generation parameter file could not be parsed
    #[error("failed to parse generation parameters: {0}")]
    ParamsParse(#[from] serde_json::Error),
}

/// Result type alias for level generation operations
pub type Result<T> = std::result::Result<T, LevelGenError>;
