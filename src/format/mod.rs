//! Output formatting for `ticketdeck`.
//!
//! Supports human-readable text output and machine-parseable JSON.
//! JSON goes to stdout; diagnostics go to stderr.
//!
//! # Output Types
//!
//! - [`TicketRow`] - Ticket with derived display fields (list/show)
//! - [`Statistics`] - Aggregate stats and facet counts (stats)
//! - [`ImportReport`] - Classification and merge counts (import)

mod output;
mod text;

pub use output::{ImportReport, Statistics, StatsSummary, TicketRow};
pub use text::{
    TextFormatOptions, format_priority_badge, format_status_icon, format_status_label,
    format_ticket_line, format_ticket_line_with, terminal_width, truncate_title,
};
