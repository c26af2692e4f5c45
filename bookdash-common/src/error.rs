//! Common error types for BookDash

use thiserror::Error;

/// Common result type for BookDash operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the sync pipeline and its collaborators.
///
/// Fatality is decided by the caller, not the variant: the orchestrator
/// aborts a run on `CsvFormat` and `Database`, skips the offending row on
/// `Validation`, and records the failing book on `Transport`.
#[derive(Error, Debug)]
pub enum Error {
    /// CSV source is unreadable, empty, or missing required columns
    #[error("CSV format error: {0}")]
    CsvFormat(String),

    /// A single row or merged record fails field contracts
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Non-rate-limit fault from the enrichment service
    #[error("Enrichment transport error: {0}")]
    Transport(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),
}
