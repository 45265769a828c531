use crate::cli::commands::CommandResult;
use crate::config::{self, Workspace};
use crate::error::StructuredError;
use crate::format::{TicketRow, format_priority_badge, format_status_icon, format_status_label};
use crate::model::Ticket;
use crate::output::OutputContext;

/// Execute the show command.
///
/// # Errors
///
/// Returns a `TICKET_NOT_FOUND` error (with similar keys) for unknown keys.
pub fn execute(key: &str, cli: &config::CliOverrides, ctx: &OutputContext) -> CommandResult {
    let ws = Workspace::open(cli)?;
    let Some(ticket) = ws.store.get(key) else {
        let keys: Vec<String> = ws.store.tasks().iter().map(|t| t.key.clone()).collect();
        return Err(StructuredError::ticket_not_found(key, &keys));
    };

    if ctx.is_json() {
        ctx.json(&TicketRow::from(ticket))?;
        return Ok(());
    }

    for line in detail_lines(ticket, ws.store.is_blacklisted(&ticket.key), ctx.use_color()) {
        ctx.print(&line);
    }
    Ok(())
}

fn detail_lines(ticket: &Ticket, blacklisted: bool, color: bool) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} {}",
        format_status_icon(ticket.status_key, color),
        ticket.key,
        ticket.summary
    )];
    lines.push(format!(
        "Status:   {} ({})",
        format_status_label(&ticket.status_label, ticket.status_key, color),
        ticket.status
    ));
    lines.push(format!(
        "Priority: {}",
        format_priority_badge(ticket.priority_value, color)
    ));
    if !ticket.issue_type.is_empty() {
        lines.push(format!("Type:     {}", ticket.issue_type));
    }

    let optional = [
        ("Project", ticket.project.as_deref()),
        ("Reporter", ticket.reporter.as_deref()),
        ("Assignee", ticket.assignee.as_deref()),
        ("Resolution", ticket.resolution.as_deref()),
        ("Link", ticket.link.as_deref()),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            lines.push(format!("{:<9} {value}", format!("{name}:")));
        }
    }
    if !ticket.components.is_empty() {
        lines.push(format!("Components: {}", ticket.components.join(", ")));
    }
    if !ticket.labels.is_empty() {
        lines.push(format!("Labels:   {}", ticket.labels.join(", ")));
    }
    if let Some(due) = ticket.due_date {
        lines.push(format!("Due:      {}", due.format("%Y-%m-%d")));
    }
    if let Some(done) = ticket.done {
        lines.push(format!("Done:     {done} (override)"));
    }
    if blacklisted {
        lines.push("Hidden:   blacklisted".to_string());
    }
    if !ticket.description.is_empty() {
        lines.push(String::new());
        lines.push(ticket.description.clone());
    }
    lines
}
