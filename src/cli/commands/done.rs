use crate::cli::commands::{CommandResult, status_word, with_key_hints};
use crate::config::{self, Workspace};
use crate::output::OutputContext;
use serde_json::json;

/// Execute the done command.
///
/// Sets the user completion override, or clears it with `undo` so the
/// tracker status decides again.
///
/// # Errors
///
/// Returns `TICKET_NOT_FOUND` (with similar keys) for unknown tickets.
pub fn execute(
    key: &str,
    undo: bool,
    cli: &config::CliOverrides,
    ctx: &OutputContext,
) -> CommandResult {
    let mut ws = Workspace::open(cli)?;
    let override_value = if undo { None } else { Some(true) };
    let changed = ws
        .store
        .set_done(key, override_value)
        .map_err(|e| with_key_hints(e, &ws.store))?;
    ws.save()?;

    let completed = ws.store.get(key).is_some_and(crate::model::Ticket::is_completed);
    ctx.json(&json!({
        "status": status_word(changed),
        "key": key,
        "done": override_value,
        "completed": completed,
    }))?;
    if undo {
        ctx.success(&format!("Cleared done override on {key}"));
    } else {
        ctx.success(&format!("Marked {key} done"));
    }
    Ok(())
}
