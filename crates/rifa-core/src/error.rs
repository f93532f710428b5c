//! Error types for rifa-core

use thiserror::Error;

/// Result type alias using rifa-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in rifa-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Sale not found
    #[error("Sale not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Ticket already held by a non-cancelled sale in this group
    #[error("Number {number} is already sold in group {group}")]
    AlreadySold { group: String, number: u32 },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote endpoint rejected a request
    #[error("Remote error: {0}")]
    Remote(String),

    /// Admin credential missing or wrong
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}
