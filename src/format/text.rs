//! Text formatting functions for `ticketdeck`.
//!
//! Plain terminal output with optional ANSI color:
//! - Status icons (○ ◐ ◑ ◕ ➜ ✓)
//! - Priority badges (Highest..Lowest)
//! - Ticket line formatting

use crate::model::{Priority, StatusKey, Ticket};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const RESET: &str = "\x1b[0m";

/// Formatting options for text output.
#[derive(Debug, Clone, Copy)]
pub struct TextFormatOptions {
    pub use_color: bool,
    pub max_width: Option<usize>,
}

impl TextFormatOptions {
    #[must_use]
    pub const fn plain() -> Self {
        Self {
            use_color: false,
            max_width: None,
        }
    }
}

fn paint(text: &str, code: &str, use_color: bool) -> String {
    if use_color {
        format!("\x1b[{code}m{text}{RESET}")
    } else {
        text.to_string()
    }
}

const fn status_color(status: StatusKey) -> &'static str {
    match status {
        StatusKey::Backlog => "37",
        StatusKey::InProgress => "33",
        StatusKey::Review => "35",
        StatusKey::Ready => "36",
        StatusKey::Delivered => "34",
        StatusKey::Done => "90",
    }
}

/// Status icon with optional color.
#[must_use]
pub fn format_status_icon(status: StatusKey, use_color: bool) -> String {
    paint(status.icon(), status_color(status), use_color)
}

/// Status label with optional color.
#[must_use]
pub fn format_status_label(label: &str, status: StatusKey, use_color: bool) -> String {
    paint(label, status_color(status), use_color)
}

/// Priority as a bracketed badge, e.g. `[High]`.
#[must_use]
pub fn format_priority_badge(priority: Priority, use_color: bool) -> String {
    let code = match priority.0 {
        5 => "1;31",
        4 => "31",
        3 => "33",
        _ => "90",
    };
    format!("[{}]", paint(priority.text(), code, use_color))
}

/// Determine terminal width from environment (falls back to 80).
#[must_use]
pub fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|columns| columns.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(80)
}

/// Truncate a title to fit within `max_len` visible columns.
///
/// Handles wide characters (emojis, CJK) correctly using `unicode-width`.
#[must_use]
pub fn truncate_title(title: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(title) <= max_len {
        return title.to_string();
    }

    let (budget, ellipsis) = if max_len <= 3 {
        (max_len, "")
    } else {
        (max_len - 3, "...")
    };

    let mut width = 0;
    let mut out = String::new();
    for c in title.chars() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + cw > budget {
            break;
        }
        width += cw;
        out.push(c);
    }
    out.push_str(ellipsis);
    out
}

/// Format a single-line ticket summary.
///
/// Format: `{icon} {key} [{priority}] {summary} ({project})`, with a trailing
/// `*` when the user has overridden completion.
#[must_use]
pub fn format_ticket_line_with(ticket: &Ticket, options: TextFormatOptions) -> String {
    let badge_plain = format!("[{}]", ticket.priority_value.text());
    let suffix = ticket
        .project
        .as_deref()
        .map(|p| format!(" ({p})"))
        .unwrap_or_default();
    let marker = if ticket.done.is_some() { " *" } else { "" };

    let prefix_len = UnicodeWidthStr::width(ticket.status_key.icon())
        + 1
        + UnicodeWidthStr::width(ticket.key.as_str())
        + 1
        + UnicodeWidthStr::width(badge_plain.as_str())
        + 1;
    let fixed = prefix_len + UnicodeWidthStr::width(suffix.as_str()) + marker.len();

    let summary = options.max_width.map_or_else(
        || ticket.summary.clone(),
        |width| truncate_title(&ticket.summary, width.saturating_sub(fixed)),
    );

    format!(
        "{} {} {} {summary}{suffix}{marker}",
        format_status_icon(ticket.status_key, options.use_color),
        ticket.key,
        format_priority_badge(ticket.priority_value, options.use_color),
    )
}

#[must_use]
pub fn format_ticket_line(ticket: &Ticket) -> String {
    format_ticket_line_with(ticket, TextFormatOptions::plain())
}
