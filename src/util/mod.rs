//! Shared utilities for `ticketdeck`.
//!
//! - Time parsing for tracker dates
//! - Deadline debouncing for autosave
//! - Workspace discovery (`.ticketdeck`)

pub mod debounce;
pub mod time;

pub use debounce::Debouncer;
pub use time::{parse_tracker_date, parse_user_date};

use std::path::{Path, PathBuf};

/// Name of the workspace directory.
pub const WORKSPACE_DIR: &str = ".ticketdeck";

/// Walk up from `start` looking for a `.ticketdeck` directory.
#[must_use]
pub fn discover_workspace(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(WORKSPACE_DIR))
        .find(|candidate| candidate.is_dir())
}
