//! Stats command implementation.
//!
//! Shows totals, a status breakdown and the facet counts the filter panel
//! would display (blacklisted tickets excluded).

use crate::config::{self, Workspace};
use crate::error::Result;
use crate::format::Statistics;
use crate::output::OutputContext;
use std::collections::BTreeMap;

/// Execute the stats command.
///
/// # Errors
///
/// Returns an error if the workspace cannot be opened.
pub fn execute(cli: &config::CliOverrides, ctx: &OutputContext) -> Result<()> {
    let ws = Workspace::open(cli)?;
    let stats = Statistics::from_store(&ws.store);

    if ctx.is_json() {
        return ctx.json(&stats);
    }

    let summary = &stats.summary;
    ctx.print(&format!(
        "Tickets: {} ({} visible, {} completed, {} blacklisted)",
        summary.total, summary.visible, summary.completed, summary.blacklisted
    ));

    ctx.section("By status");
    for (status, count) in &summary.by_status {
        ctx.print(&format!("  {} {:<12} {count}", status.icon(), status.label()));
    }

    print_counts(ctx, "Projects", &stats.projects);
    print_counts(ctx, "People", &stats.people);
    print_counts(ctx, "Tags", &stats.tags);
    Ok(())
}

fn print_counts(ctx: &OutputContext, title: &str, counts: &BTreeMap<String, usize>) {
    if counts.is_empty() {
        return;
    }
    ctx.section(title);
    let width = counts.keys().map(String::len).max().unwrap_or(0);
    for (name, count) in counts {
        ctx.print(&format!("  {name:<width$} {count}"));
    }
}
