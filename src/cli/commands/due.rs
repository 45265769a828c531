use crate::cli::commands::{CommandResult, status_word, with_key_hints};
use crate::config::{self, Workspace};
use crate::error::Result;
use crate::output::OutputContext;
use crate::util::parse_user_date;
use chrono::{DateTime, Utc};
use serde_json::json;

/// Execute the due command. `none` (or `clear`) removes the due date.
///
/// # Errors
///
/// Returns a validation error for unparseable dates, or `TICKET_NOT_FOUND`.
pub fn execute(
    key: &str,
    date: &str,
    cli: &config::CliOverrides,
    ctx: &OutputContext,
) -> CommandResult {
    let due = parse_due(date)?;
    let mut ws = Workspace::open(cli)?;
    let changed = ws
        .store
        .set_due_date(key, due)
        .map_err(|e| with_key_hints(e, &ws.store))?;
    ws.save()?;

    ctx.json(&json!({
        "status": status_word(changed),
        "key": key,
        "dueDate": due,
    }))?;
    match due {
        Some(d) => ctx.success(&format!("{key} due {}", d.format("%Y-%m-%d"))),
        None => ctx.success(&format!("Cleared due date on {key}")),
    }
    Ok(())
}

fn parse_due(raw: &str) -> Result<Option<DateTime<Utc>>> {
    match raw.trim().to_lowercase().as_str() {
        "none" | "clear" | "" => Ok(None),
        _ => parse_user_date(raw, "due").map(Some),
    }
}
