//! # CLI Command Implementations

use super::Cli;
use crate::client::{Credentials, GraphQlClient};
use crate::error::AppError;
use crate::paths::resolve_config_path;
use crate::store::FileStore;
use searchsync_core::{Action, Reconciler, SyncReport};

// =============================================================================
// SYNC COMMAND
// =============================================================================

/// Run one reconciliation pass against GitHub.
pub fn cmd_sync(cli: &Cli) -> Result<SyncReport, AppError> {
    let path = resolve_config_path(cli.config.as_deref())?;
    let credentials = Credentials::from_env()?;
    let client = GraphQlClient::new(&cli.endpoint, credentials, cli.timeout())?;

    tracing::info!(
        config = %path.display(),
        mode = ?cli.mode(),
        endpoint = %client.endpoint(),
        "starting sync"
    );

    let mut reconciler = Reconciler::new(client, cli.mode()).with_pacing(cli.pacing());
    let report = reconciler.sync(&FileStore::new(), &path)?;

    tracing::info!(
        created = report.created(),
        updated = report.updated(),
        recreated = report.recreated(),
        deleted = report.deleted(),
        saved = report.saved,
        "sync finished"
    );
    Ok(report)
}

// =============================================================================
// SUMMARY
// =============================================================================

/// Render the outcome of a pass as a JSON document.
pub fn summary_json(report: &SyncReport) -> Result<String, AppError> {
    let outcomes: Vec<serde_json::Value> = report
        .outcomes
        .iter()
        .map(|o| {
            serde_json::json!({
                "name": o.name,
                "action": action_label(&o.action),
                "id": action_id(&o.action),
            })
        })
        .collect();
    let output = serde_json::json!({
        "created": report.created(),
        "updated": report.updated(),
        "recreated": report.recreated(),
        "deleted": report.deleted(),
        "skipped": report.skipped(),
        "saved": report.saved,
        "outcomes": outcomes,
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Print the outcome of a pass.
pub fn print_summary(report: &SyncReport, json_mode: bool) -> Result<(), AppError> {
    if json_mode {
        println!("{}", summary_json(report)?);
        return Ok(());
    }

    for outcome in &report.outcomes {
        println!("{:<10} {}", action_label(&outcome.action), outcome.name);
    }
    println!();
    println!(
        "Created: {}  Updated: {}  Recreated: {}  Deleted: {}  Skipped: {}",
        report.created(),
        report.updated(),
        report.recreated(),
        report.deleted(),
        report.skipped()
    );
    println!(
        "Config:  {}",
        if report.saved { "saved" } else { "unchanged" }
    );
    Ok(())
}

/// Short verb for an action.
#[must_use]
pub fn action_label(action: &Action) -> &'static str {
    match action {
        Action::Created { .. } => "created",
        Action::Updated { .. } => "updated",
        Action::Recreated { .. } => "recreated",
        Action::Deleted { .. } => "deleted",
        Action::Skipped => "skipped",
    }
}

fn action_id(action: &Action) -> Option<&str> {
    match action {
        Action::Created { id }
        | Action::Updated { id }
        | Action::Recreated { id, .. }
        | Action::Deleted { id } => Some(id.as_str()),
        Action::Skipped => None,
    }
}
