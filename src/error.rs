//! Error types for perf-report

use thiserror::Error;

/// Result type alias for perf-report operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for perf-report
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Report server error: {0}")]
    SourceError(String),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),
}
