use crate::config::{self, Workspace};
use crate::error::Result;
use crate::output::OutputContext;
use crate::sync::{FileSink, SnapshotSink};
use serde_json::json;
use std::path::Path;
use tracing::info;

/// Execute the export command.
///
/// Writes a full snapshot (tickets, user config, metadata) to `output`, or
/// to stdout when no path is given.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn execute(output: Option<&Path>, cli: &config::CliOverrides, ctx: &OutputContext) -> Result<()> {
    let ws = Workspace::open(cli)?;
    let snapshot = ws.store.snapshot();

    let Some(path) = output else {
        println!("{}", snapshot.to_json()?);
        return Ok(());
    };

    FileSink::new(path).persist(&snapshot)?;
    info!(path = %path.display(), tasks = snapshot.tasks.len(), "Exported snapshot");
    ctx.json(&json!({
        "path": path.display().to_string(),
        "tasks": snapshot.tasks.len(),
    }))?;
    ctx.success(&format!(
        "Exported {} tickets to {}",
        snapshot.tasks.len(),
        path.display()
    ));
    Ok(())
}
