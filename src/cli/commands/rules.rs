//! Rules command implementation.
//!
//! Project rules map title patterns to a project name. They are stored in
//! the user config; `apply` assigns projects to tickets that have none.

use crate::cli::RulesCommands;
use crate::config::{self, Workspace};
use crate::error::Result;
use crate::model::ProjectRule;
use crate::output::OutputContext;
use serde_json::json;
use tracing::info;

/// Execute the rules command.
///
/// # Errors
///
/// Returns `RuleNotFound` or a validation error for bad names, or a
/// persistence error.
pub fn execute(command: &RulesCommands, cli: &config::CliOverrides, ctx: &OutputContext) -> Result<()> {
    let mut ws = Workspace::open(cli)?;

    let (action, changed) = match command {
        RulesCommands::List => {
            let rules = ws.store.config().project_rules();
            if ctx.is_json() {
                return ctx.json(&rules);
            }
            print_rules(&rules, ctx);
            return Ok(());
        }
        RulesCommands::Apply => {
            let assigned = ws.store.apply_project_rules();
            ws.save()?;
            ctx.json(&json!({ "action": "apply", "assigned": assigned }))?;
            ctx.success(&format!("Assigned a project to {assigned} tickets"));
            return Ok(());
        }
        RulesCommands::Add { name, patterns } => {
            ("add", ws.store.config_mut().add_project_rule(name, patterns)?)
        }
        RulesCommands::Remove { name } => {
            ("remove", ws.store.config_mut().remove_project_rule(name)?)
        }
        RulesCommands::Rename { old, new } => {
            ("rename", ws.store.config_mut().rename_project_rule(old, new)?)
        }
        RulesCommands::AddPattern { name, pattern } => (
            "add-pattern",
            ws.store.config_mut().add_rule_pattern(name, pattern)?,
        ),
        RulesCommands::RemovePattern { name, pattern } => (
            "remove-pattern",
            ws.store.config_mut().remove_rule_pattern(name, pattern)?,
        ),
    };
    info!(action, changed, "Project rules updated");

    ctx.json(&json!({
        "action": action,
        "changed": changed,
        "rules": ws.store.config().project_rules(),
    }))?;
    if changed {
        ctx.success(&format!("Rules updated ({action})"));
    } else {
        ctx.print("Rules unchanged");
    }
    Ok(())
}

fn print_rules(rules: &[ProjectRule], ctx: &OutputContext) {
    if rules.is_empty() {
        ctx.print("No project rules configured.");
        return;
    }
    for rule in rules {
        ctx.print(&format!("{}: {}", rule.name, rule.patterns.join(", ")));
    }
}
