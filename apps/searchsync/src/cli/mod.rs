//! # searchsync CLI Module
//!
//! One command: load the definitions file, push it to GitHub, and write
//! back the identifiers GitHub assigned.
//!
//! ## Modes
//!
//! - default: create new entries, update identified ones
//! - `--recreate`: delete and create every identified entry
//! - `--reset`: delete every identified entry and forget its id

mod commands;

use crate::client::DEFAULT_ENDPOINT;
use crate::error::AppError;
use clap::Parser;
use searchsync_core::{SyncMode, SyncReport};
use std::path::PathBuf;
use std::time::Duration;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// searchsync - declarative GitHub saved searches
///
/// Keeps the dashboard search shortcuts of a GitHub account in step with a
/// YAML or TOML file.
#[derive(Parser, Debug)]
#[command(name = "searchsync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the definitions file
    /// (default: $XDG_CONFIG_HOME/.github-searches.yaml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Delete and recreate every search that already has an id
    #[arg(long, conflicts_with = "reset")]
    pub recreate: bool,

    /// Delete every search that has an id and clear the ids
    #[arg(long)]
    pub reset: bool,

    /// GraphQL endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Pause after each remote operation, in milliseconds
    #[arg(long, default_value = "1000")]
    pub delay_ms: u64,

    /// Request timeout, in seconds
    #[arg(long, default_value = "30")]
    pub timeout_secs: u64,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// The reconciliation mode selected by the flags.
    #[must_use]
    pub fn mode(&self) -> SyncMode {
        if self.reset {
            SyncMode::Reset
        } else if self.recreate {
            SyncMode::Recreate
        } else {
            SyncMode::Normal
        }
    }

    /// Pause between remote operations.
    #[must_use]
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: &Cli) -> Result<SyncReport, AppError> {
    let report = cmd_sync(cli)?;
    print_summary(&report, cli.json)?;
    Ok(report)
}
