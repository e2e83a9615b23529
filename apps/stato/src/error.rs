//! # Application Errors
//!
//! Configuration errors are fatal to the invoking tool: main reports them
//! and exits non-zero. Per-endpoint fetch failures are NOT represented
//! here; those are recovered locally and only promoted to [`AppError`]
//! when every endpoint failed.

use crate::fetch::FetchError;
use stato_core::StatoError;
use thiserror::Error;

/// Errors that terminate a stato command.
#[derive(Debug, Error)]
pub enum AppError {
    /// A source specification failed to parse.
    #[error(transparent)]
    Source(#[from] StatoError),

    /// No sources were given on the command line or in the environment.
    #[error("no hosts specified via -H or STATO_SOURCES")]
    NoHosts,

    /// Every endpoint failed; carries the first per-endpoint error.
    #[error("failed to fetch snapshots: {0}")]
    AllFetchesFailed(FetchError),

    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed")]
    ClientSetup(#[source] reqwest::Error),

    /// Terminal or socket I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output encoding failed.
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}
