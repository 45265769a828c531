//! Label command implementation.
//!
//! Labels are user data on a ticket; the store dedupes them
//! case-insensitively and refreshes the tag index after each change.

use crate::cli::LabelCommands;
use crate::cli::commands::{CommandResult, status_word, with_key_hints};
use crate::config::{self, Workspace};
use crate::error::TrackerError;
use crate::output::OutputContext;
use serde::Serialize;
use tracing::info;

/// JSON output for label add/remove operations.
#[derive(Serialize)]
struct LabelActionResult<'a> {
    status: &'static str,
    key: &'a str,
    label: &'a str,
    labels: Vec<String>,
}

/// Execute the label command.
///
/// # Errors
///
/// Returns an error for unknown tickets or empty labels.
pub fn execute(
    command: &LabelCommands,
    cli: &config::CliOverrides,
    ctx: &OutputContext,
) -> CommandResult {
    let mut ws = Workspace::open(cli)?;

    let (key, label, adding) = match command {
        LabelCommands::Add { key, label } => (key, label, true),
        LabelCommands::Remove { key, label } => (key, label, false),
    };
    validate_label(label)?;

    let result = if adding {
        ws.store.add_label(key, label)
    } else {
        ws.store.remove_label(key, label)
    };
    let changed = result.map_err(|e| with_key_hints(e, &ws.store))?;
    ws.save()?;

    let labels = ws
        .store
        .get(key)
        .map(|t| t.labels.clone())
        .unwrap_or_default();
    info!(key = %key, label = %label, adding, changed, "Label updated");

    ctx.json(&LabelActionResult {
        status: status_word(changed),
        key,
        label,
        labels: labels.clone(),
    })?;
    match (adding, changed) {
        (true, true) => ctx.success(&format!("Added label '{label}' to {key}")),
        (false, true) => ctx.success(&format!("Removed label '{label}' from {key}")),
        (true, false) => ctx.print(&format!("{key} already has label '{label}'")),
        (false, false) => ctx.print(&format!("{key} has no label '{label}'")),
    }
    if changed && !labels.is_empty() {
        ctx.print(&format!("Labels: {}", labels.join(", ")));
    }
    Ok(())
}

fn validate_label(label: &str) -> Result<(), TrackerError> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::validation("label", "label cannot be empty"));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(TrackerError::validation(
            "label",
            format!("label '{trimmed}' cannot contain whitespace"),
        ));
    }
    Ok(())
}
