//! # Application Errors

use crate::client::ClientError;
use searchsync_core::SyncError;
use thiserror::Error;

/// Errors surfaced by the command-line application.
#[derive(Debug, Error)]
pub enum AppError {
    /// The reconciliation pass failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The GraphQL client could not be set up.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The run summary could not be rendered.
    #[error("render summary: {0}")]
    Summary(#[from] serde_json::Error),

    /// The config path could not be resolved.
    #[error("config path: {0}")]
    Path(String),
}
