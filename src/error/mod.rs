//! Error types and handling for `ticketdeck`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Wraps `anyhow` for errors raised by subscriber callbacks and glue code
//! - Two variants are exceptional input errors: `MalformedInput` (XML import)
//!   and `InvalidFormat` (snapshot load). Everything else is an expected
//!   runtime outcome that mutation methods hand back as `Err` without side
//!   effects.
//! - Provides structured JSON output for scripted callers

mod structured;

pub use structured::{ErrorCode, StructuredError};

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `ticketdeck` operations.
#[derive(Error, Debug)]
pub enum TrackerError {
    // === Input Errors ===
    /// The tracker export is not well-formed XML.
    #[error("Malformed input: {reason}")]
    MalformedInput { reason: String },

    /// A persisted snapshot is missing required fields.
    #[error("Invalid snapshot format: {reason}")]
    InvalidFormat { reason: String },

    // === Ticket Errors ===
    /// Ticket with the specified key was not found.
    #[error("Ticket not found: {key}")]
    TicketNotFound { key: String },

    /// Attempted to add a ticket whose key already exists.
    #[error("Ticket key already exists: {key}")]
    DuplicateKey { key: String },

    // === Validation Errors ===
    /// Field validation failed; the operation was not applied.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// No project rule with the given name.
    #[error("Project rule not found: {name}")]
    RuleNotFound { name: String },

    // === Configuration Errors ===
    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workspace not initialized.
    #[error("Workspace not initialized: run 'tdk init' first")]
    NotInitialized,

    /// Already initialized.
    #[error("Already initialized at '{path}'")]
    AlreadyInitialized { path: PathBuf },

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TrackerError {
    /// Can the user fix this without code changes?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedInput { .. }
                | Self::InvalidFormat { .. }
                | Self::NotInitialized
                | Self::TicketNotFound { .. }
                | Self::DuplicateKey { .. }
                | Self::Validation { .. }
                | Self::RuleNotFound { .. }
        )
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run: tdk init"),
            Self::AlreadyInitialized { .. } => Some("Use --force to reinitialize"),
            Self::MalformedInput { .. } => {
                Some("Export the issues again as XML; the file must be well-formed")
            }
            Self::InvalidFormat { .. } => Some("Snapshots must contain a 'tasks' list"),
            Self::DuplicateKey { .. } => Some("Use 'tdk import --policy update' to refresh it"),
            Self::RuleNotFound { .. } => Some("Run 'tdk rules list' to see configured rules"),
            _ => None,
        }
    }

    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a not-found error, normalizing the key for display.
    #[must_use]
    pub fn not_found(key: &str) -> Self {
        Self::TicketNotFound {
            key: key.trim().to_uppercase(),
        }
    }
}

/// Result type using `TrackerError`.
pub type Result<T> = std::result::Result<T, TrackerError>;
