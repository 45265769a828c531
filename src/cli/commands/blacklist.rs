use crate::cli::BlacklistCommands;
use crate::cli::commands::status_word;
use crate::config::{self, Workspace};
use crate::error::Result;
use crate::output::OutputContext;
use serde_json::json;

/// Execute the blacklist command.
///
/// Blacklisted keys are hidden from every view and count. The key does not
/// have to exist yet, so future imports stay hidden too.
///
/// # Errors
///
/// Returns a validation error for empty keys, or a persistence error.
pub fn execute(
    command: &BlacklistCommands,
    cli: &config::CliOverrides,
    ctx: &OutputContext,
) -> Result<()> {
    let mut ws = Workspace::open(cli)?;
    let config = ws.store.config_mut();

    let (action, key, changed) = match command {
        BlacklistCommands::List => {
            let keys = config.blacklist();
            if ctx.is_json() {
                return ctx.json(&keys);
            }
            if keys.is_empty() {
                ctx.print("Blacklist is empty.");
            }
            for key in keys {
                ctx.print(&key);
            }
            return Ok(());
        }
        BlacklistCommands::Add { key } => ("add", key, config.add_to_blacklist(key)?),
        BlacklistCommands::Remove { key } => ("remove", key, config.remove_from_blacklist(key)?),
    };

    ctx.json(&json!({
        "status": status_word(changed),
        "action": action,
        "key": key.trim().to_uppercase(),
    }))?;
    match (action, changed) {
        ("add", true) => ctx.success(&format!("Hid {key}")),
        (_, true) => ctx.success(&format!("Unhid {key}")),
        _ => ctx.print("Blacklist unchanged"),
    }
    Ok(())
}
