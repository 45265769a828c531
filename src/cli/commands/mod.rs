//! One module per `tdk` subcommand.
//!
//! Commands return [`CommandResult`] so they can hand back hinted errors
//! (similar keys, likely policy) alongside plain [`TrackerError`]s.

pub mod blacklist;
pub mod completions;
pub mod delete;
pub mod done;
pub mod due;
pub mod export;
pub mod import;
pub mod init;
pub mod label;
pub mod list;
pub mod load;
pub mod reset;
pub mod rules;
pub mod show;
pub mod stats;
pub mod tags;

use crate::error::{StructuredError, TrackerError};
use crate::storage::TaskStore;

pub type CommandResult<T = ()> = std::result::Result<T, StructuredError>;

/// Convert a store error, adding similar-key hints for unknown tickets.
pub(crate) fn with_key_hints(err: TrackerError, store: &TaskStore) -> StructuredError {
    match &err {
        TrackerError::TicketNotFound { key } => {
            let keys: Vec<String> = store.tasks().iter().map(|t| t.key.clone()).collect();
            StructuredError::ticket_not_found(key, &keys)
        }
        _ => StructuredError::from_error(&err),
    }
}

/// `"changed"` / `"unchanged"` for JSON action results.
pub(crate) const fn status_word(changed: bool) -> &'static str {
    if changed { "changed" } else { "unchanged" }
}
