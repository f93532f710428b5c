use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] rifa_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Sale ID cannot be empty")]
    EmptySaleId,
    #[error("Sale not found for id: {0}")]
    SaleNotFound(String),
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "Sync is not configured. Set remote_endpoint_url in the config file or RIFA_REMOTE_ENDPOINT to enable `rifa sync`."
    )]
    SyncNotConfigured,
    #[error(
        "Remote sheet is not configured. Set remote_sheet_url in the config file or RIFA_SHEET_URL to enable `rifa pull`."
    )]
    SheetNotConfigured,
}
