//! `ticketdeck` - a local tracker for issue-tracker XML exports.
//!
//! The engine parses tracker RSS/XML exports into normalized tickets,
//! reconciles them against a stored collection under a merge policy, and
//! keeps the collection in a reactive store with derived indices, filters,
//! user configuration and snapshot persistence.
//!
//! The `tdk` binary in `main.rs` is a thin CLI over this library.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod output;
pub mod storage;
pub mod sync;
pub mod util;

pub use error::{ErrorCode, Result, StructuredError, TrackerError};
