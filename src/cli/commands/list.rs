//! List command implementation.

use crate::cli::ListArgs;
use crate::config::{self, Workspace};
use crate::error::Result;
use crate::format::{TextFormatOptions, TicketRow, format_ticket_line_with};
use crate::output::OutputContext;
use crate::storage::FilterState;
use tracing::debug;

/// Execute the list command.
///
/// # Errors
///
/// Returns an error if the workspace cannot be opened.
pub fn execute(args: &ListArgs, cli: &config::CliOverrides, ctx: &OutputContext) -> Result<()> {
    let ws = Workspace::open(cli)?;
    let filters = filters_from_args(args);
    debug!(?filters, "Listing tickets");

    let mut tickets = ws.store.filter_with(&filters);
    let matched = tickets.len();
    if let Some(limit) = args.limit {
        tickets.truncate(limit);
    }

    if ctx.is_json() {
        let rows: Vec<TicketRow<'_>> = tickets.iter().map(|t| TicketRow::from(*t)).collect();
        return ctx.json(&rows);
    }

    if tickets.is_empty() {
        ctx.print("No tickets found.");
        return Ok(());
    }

    let options = TextFormatOptions {
        use_color: ctx.use_color(),
        max_width: Some(ctx.width()),
    };
    for ticket in &tickets {
        ctx.print(&format_ticket_line_with(ticket, options));
    }
    if matched > tickets.len() {
        ctx.print(&format!("... {} more", matched - tickets.len()));
    }
    Ok(())
}

/// Translate list flags into a filter state.
#[must_use]
pub fn filters_from_args(args: &ListArgs) -> FilterState {
    FilterState {
        projects: args.projects.iter().cloned().collect(),
        people: args.people.iter().cloned().collect(),
        tags: args.tags.iter().cloned().collect(),
        show_done: !args.hide_done,
        show_label_done: !args.hide_label_done,
        search: args.search.clone().unwrap_or_default(),
    }
    .normalized()
}
