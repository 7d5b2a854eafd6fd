//! # searchsync
//!
//! Keeps GitHub dashboard saved searches in step with a local file.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 apps/searchsync (THE BINARY)             │
//! │                                                          │
//! │  ┌────────────┐   ┌──────────────┐   ┌───────────────┐   │
//! │  │    CLI     │   │  FileStore   │   │ GraphQlClient │   │
//! │  │   (clap)   │   │ (yaml/toml)  │   │   (reqwest)   │   │
//! │  └─────┬──────┘   └──────┬───────┘   └───────┬───────┘   │
//! │        │                 │                   │           │
//! │        └─────────────────┼───────────────────┘           │
//! │                          ▼                               │
//! │                 ┌──────────────────┐                     │
//! │                 │ searchsync-core  │                     │
//! │                 │   (THE LOGIC)    │                     │
//! │                 └──────────────────┘                     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Sync the default file
//! searchsync
//!
//! # Sync a specific file, deleting and recreating every shortcut
//! searchsync --config ./searches.yaml --recreate
//!
//! # Remove every shortcut the file knows about
//! searchsync --reset
//! ```

use clap::Parser;
use searchsync::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // SEARCHSYNC_LOG_FORMAT=json or --json-logs enables machine-parseable output.
    let json_logs = cli.json_logs
        || std::env::var("SEARCHSYNC_LOG_FORMAT").is_ok_and(|format| format == "json");

    let default_filter = if cli.verbose {
        "searchsync=debug,searchsync_core=debug"
    } else {
        "searchsync=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    if let Err(e) = cli::execute(&cli) {
        tracing::error!("Error: {}", e);
        eprintln!("searchsync: {e}");
        std::process::exit(1);
    }
}
