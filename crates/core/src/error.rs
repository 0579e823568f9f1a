//! Error types for perf-report-core (WASM-compatible)

use thiserror::Error;

/// Result type alias for perf-report-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that work in both native and WASM environments
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown statistic: {0}")]
    UnknownStatistic(String),

    #[error("Invalid revision: {0}")]
    InvalidRevision(String),
}
