use crate::config::{self, Workspace};
use crate::error::{Result, TrackerError};
use crate::output::OutputContext;
use serde_json::json;

/// Execute the reset command: drop every ticket, keep the user config.
///
/// # Errors
///
/// Returns a validation error without `--yes`, or a save error.
pub fn execute(yes: bool, cli: &config::CliOverrides, ctx: &OutputContext) -> Result<()> {
    if !yes {
        return Err(TrackerError::validation(
            "yes",
            "reset removes every ticket; pass --yes to confirm",
        ));
    }

    let mut ws = Workspace::open(cli)?;
    let removed = ws.store.len();
    ws.store.reset();
    ws.store.flush_now(&mut ws.sink)?;

    ctx.json(&json!({ "status": "reset", "removed": removed }))?;
    ctx.success(&format!("Removed {removed} tickets"));
    Ok(())
}
