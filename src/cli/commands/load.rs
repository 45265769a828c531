use crate::config::{self, Workspace};
use crate::error::Result;
use crate::output::OutputContext;
use crate::sync::Snapshot;
use serde_json::json;
use std::fs;
use std::path::Path;

/// Execute the load command.
///
/// Replaces the stored tickets and the user config (tags, rules,
/// blacklist) with the snapshot's contents.
///
/// # Errors
///
/// Returns `InvalidFormat` if the snapshot has no task list, or an I/O error.
pub fn execute(file: &Path, cli: &config::CliOverrides, ctx: &OutputContext) -> Result<()> {
    let text = fs::read_to_string(file)?;
    let snapshot = Snapshot::from_json(&text)?;

    let mut ws = Workspace::open(cli)?;
    ws.store.load_snapshot(snapshot)?;
    ws.store.flush_now(&mut ws.sink)?;

    let tasks = ws.store.len();
    ctx.json(&json!({
        "status": "loaded",
        "tasks": tasks,
        "path": file.display().to_string(),
    }))?;
    ctx.success(&format!("Loaded {tasks} tickets from {}", file.display()));
    Ok(())
}
