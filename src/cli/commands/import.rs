//! Import command implementation.
//!
//! Parses a tracker XML export, assigns projects from the configured rules,
//! classifies the batch against the stored collection, then merges it with
//! the chosen policy. `--dry-run` reports the merge without saving.

use crate::cli::ImportArgs;
use crate::cli::commands::CommandResult;
use crate::config::{self, Settings, Workspace, apply_project_rules};
use crate::error::StructuredError;
use crate::format::ImportReport;
use crate::model::{Ticket, TicketField};
use crate::output::OutputContext;
use crate::sync::{self, MergePolicy, PolicyKind, classify, merge_checked};
use std::fs;
use tracing::{debug, info};

/// Execute the import command.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the XML is malformed, the
/// policy or fields are unknown, or the workspace cannot be saved.
pub fn execute(
    args: &ImportArgs,
    cli: &config::CliOverrides,
    ctx: &OutputContext,
) -> CommandResult {
    let mut ws = Workspace::open(cli)?;

    let xml = fs::read_to_string(&args.file).map_err(crate::error::TrackerError::from)?;
    let mut imported = sync::parse(&xml)?;
    let assigned = apply_project_rules(&mut imported, ws.store.config().project_rules().as_slice());
    debug!(parsed = imported.len(), assigned, "Parsed export");

    let policy = resolve_policy(args, &ws.settings, &imported)?;
    let classification = classify(&imported, ws.store.tasks());

    let report = if args.dry_run {
        let outcome = merge_checked(&imported, ws.store.tasks(), &policy)?;
        let total_after = outcome.tickets.len();
        ImportReport::new(policy.name(), true, &classification, outcome, total_after)
    } else {
        let outcome = ws.store.apply_import(&imported, &policy)?;
        ws.save()?;
        info!(
            file = %args.file.display(),
            policy = %policy,
            added = outcome.added,
            updated = outcome.updated,
            "Import complete"
        );
        ImportReport::new(policy.name(), false, &classification, outcome, ws.store.len())
    };

    ctx.json(&report)?;
    print_report(&report, ctx);
    Ok(())
}

/// Build the merge policy from flags, falling back to settings.
fn resolve_policy(
    args: &ImportArgs,
    settings: &Settings,
    imported: &[Ticket],
) -> CommandResult<MergePolicy> {
    let kind = match args.policy.as_deref() {
        Some(raw) => raw
            .parse::<PolicyKind>()
            .map_err(|_| StructuredError::invalid_policy(raw))?,
        None => settings.default_policy,
    };

    Ok(match kind {
        PolicyKind::Add => MergePolicy::AddOnly,
        PolicyKind::Replace => MergePolicy::FullReplace,
        PolicyKind::Update => {
            let fields = if args.fields.is_empty() {
                settings.update_fields.clone()
            } else {
                args.fields
                    .iter()
                    .map(|f| f.parse::<TicketField>())
                    .collect::<crate::error::Result<Vec<_>>>()?
            };
            if args.all || args.keys.is_empty() {
                MergePolicy::selective(fields, imported.iter().map(|t| t.key.as_str()))
            } else {
                MergePolicy::selective(fields, &args.keys)
            }
        }
    })
}

fn print_report(report: &ImportReport, ctx: &OutputContext) {
    let verb = if report.dry_run { "Would import" } else { "Imported" };
    ctx.success(&format!(
        "{verb} {} tickets with policy '{}': {} added, {} updated, {} unchanged",
        report.parsed,
        report.policy,
        report.outcome.added,
        report.outcome.updated,
        report.outcome.unchanged,
    ));
    ctx.print(&format!(
        "  {} new, {} already tracked ({} changed upstream); {} tickets total",
        report.new,
        report.existing,
        report.changed.len(),
        report.total_after,
    ));
    if report.outcome.duplicates_dropped > 0 {
        ctx.warning(&format!(
            "{} duplicate keys in the export were ignored",
            report.outcome.duplicates_dropped
        ));
    }
}
