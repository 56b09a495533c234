use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Browser automation error: {0}")]
    BrowserError(String),

    #[error("Sign-in did not complete within {0:?}")]
    LoginTimeout(Duration),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Interrupted by user")]
    Interrupted,
}

impl From<fantoccini::error::CmdError> for AppError {
    fn from(e: fantoccini::error::CmdError) -> Self {
        AppError::BrowserError(e.to_string())
    }
}

impl From<fantoccini::error::NewSessionError> for AppError {
    fn from(e: fantoccini::error::NewSessionError) -> Self {
        AppError::BrowserError(e.to_string())
    }
}
