//! Delete command implementation.
//!
//! Removes a ticket from the stored collection. A later import with the
//! add policy brings it back; blacklist it to hide it for good.

use crate::cli::commands::{CommandResult, with_key_hints};
use crate::config::{self, Workspace};
use crate::output::OutputContext;
use serde::Serialize;
use tracing::info;

/// Result of a delete operation for JSON output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub deleted: String,
    pub remaining: usize,
}

/// Execute the delete command.
///
/// # Errors
///
/// Returns `TICKET_NOT_FOUND` (with similar keys) for unknown tickets.
pub fn execute(key: &str, cli: &config::CliOverrides, ctx: &OutputContext) -> CommandResult {
    let mut ws = Workspace::open(cli)?;
    let removed = ws
        .store
        .remove_task(key)
        .map_err(|e| with_key_hints(e, &ws.store))?;
    ws.save()?;
    info!(key = %removed.key, "Deleted ticket");

    let result = DeleteResult {
        deleted: removed.key,
        remaining: ws.store.len(),
    };
    ctx.json(&result)?;
    ctx.success(&format!("Deleted {}", result.deleted));
    Ok(())
}
