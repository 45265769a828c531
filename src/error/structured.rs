//! Structured error output for scripted callers.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags
//! - Context for debugging

#![allow(clippy::option_if_let_else)]

use crate::error::TrackerError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Machine-readable error codes.
///
/// These codes are stable. Format: `SCREAMING_SNAKE_CASE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Input Errors (exit code 2) ===
    /// XML export could not be parsed
    MalformedInput,
    /// Snapshot lacks required fields
    InvalidFormat,

    // === Ticket Errors (exit code 3) ===
    /// Ticket with specified key not found
    TicketNotFound,
    /// Ticket key already present
    DuplicateKey,

    // === Validation Errors (exit code 4) ===
    /// Field validation failed
    ValidationFailed,
    /// Project rule not found
    RuleNotFound,
    /// Merge policy not recognized
    InvalidPolicy,

    // === Workspace / Config Errors (exit code 7) ===
    /// Workspace not initialized
    NotInitialized,
    /// Already initialized
    AlreadyInitialized,
    /// Configuration error
    ConfigError,

    // === I/O Errors (exit code 8) ===
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// YAML parsing error
    YamlError,

    // === Internal Errors (exit code 1) ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedInput => "MALFORMED_INPUT",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::TicketNotFound => "TICKET_NOT_FOUND",
            Self::DuplicateKey => "DUPLICATE_KEY",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::RuleNotFound => "RULE_NOT_FOUND",
            Self::InvalidPolicy => "INVALID_POLICY",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller might succeed by fixing input and retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed | Self::InvalidPolicy | Self::RuleNotFound
        )
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 2: Input errors
    /// - 3: Ticket errors
    /// - 4: Validation errors
    /// - 7: Workspace/config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::MalformedInput | Self::InvalidFormat => 2,
            Self::TicketNotFound | Self::DuplicateKey => 3,
            Self::ValidationFailed | Self::RuleNotFound | Self::InvalidPolicy => 4,
            Self::NotInitialized | Self::AlreadyInitialized | Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
            Self::InternalError => 1,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `TrackerError`.
    #[must_use]
    pub fn from_error(err: &TrackerError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);
        let hint = err.suggestion().map(str::to_string);

        Self {
            code,
            message: err.to_string(),
            hint,
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Create a structured not-found error with similar key suggestions.
    #[must_use]
    pub fn ticket_not_found(searched_key: &str, existing_keys: &[String]) -> Self {
        let similar = find_similar_keys(searched_key, existing_keys, 3);

        let hint = if similar.is_empty() {
            Some("Run 'tdk list' to see available tickets.".to_string())
        } else if similar.len() == 1 {
            Some(format!("Did you mean '{}'?", similar[0]))
        } else {
            Some(format!("Did you mean one of: {}?", similar.join(", ")))
        };

        Self {
            code: ErrorCode::TicketNotFound,
            message: format!("Ticket not found: {searched_key}"),
            hint,
            retryable: false,
            context: Some(json!({
                "searched_key": searched_key,
                "similar_keys": similar,
            })),
        }
    }

    /// Create a structured error for an unrecognized merge policy.
    #[must_use]
    pub fn invalid_policy(provided: &str) -> Self {
        let hint = match detect_policy_intent(provided) {
            Some(detected) => Some(format!("Did you mean --policy {detected}?")),
            None => Some("Valid policies: add, update, replace".to_string()),
        };

        Self {
            code: ErrorCode::InvalidPolicy,
            message: format!("Invalid merge policy: {provided}"),
            hint,
            retryable: true,
            context: Some(json!({
                "provided": provided,
                "valid_values": ["add", "update", "replace"],
            })),
        }
    }

    /// Serialize to JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &TrackerError) -> (ErrorCode, Option<Value>) {
        match err {
            TrackerError::MalformedInput { reason } => {
                (ErrorCode::MalformedInput, Some(json!({"reason": reason})))
            }
            TrackerError::InvalidFormat { reason } => {
                (ErrorCode::InvalidFormat, Some(json!({"reason": reason})))
            }
            TrackerError::TicketNotFound { key } => {
                (ErrorCode::TicketNotFound, Some(json!({"searched_key": key})))
            }
            TrackerError::DuplicateKey { key } => {
                (ErrorCode::DuplicateKey, Some(json!({"key": key})))
            }
            TrackerError::Validation { field, reason } => (
                ErrorCode::ValidationFailed,
                Some(json!({"field": field, "reason": reason})),
            ),
            TrackerError::RuleNotFound { name } => {
                (ErrorCode::RuleNotFound, Some(json!({"name": name})))
            }
            TrackerError::NotInitialized => (ErrorCode::NotInitialized, None),
            TrackerError::AlreadyInitialized { path } => (
                ErrorCode::AlreadyInitialized,
                Some(json!({"path": path.display().to_string()})),
            ),
            TrackerError::Config(_) => (ErrorCode::ConfigError, None),
            TrackerError::Io(_) => (ErrorCode::IoError, None),
            TrackerError::Json(_) => (ErrorCode::JsonError, None),
            TrackerError::Yaml(_) => (ErrorCode::YamlError, None),
            TrackerError::Other(_) => (ErrorCode::InternalError, None),
        }
    }
}

impl From<TrackerError> for StructuredError {
    fn from(err: TrackerError) -> Self {
        Self::from_error(&err)
    }
}

/// Merge policy synonyms for intent detection.
static POLICY_SYNONYMS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("add-only", "add"),
        ("append", "add"),
        ("new", "add"),
        ("merge", "update"),
        ("selective", "update"),
        ("upsert", "update"),
        ("overwrite", "replace"),
        ("full", "replace"),
        ("reset", "replace"),
    ]
    .into_iter()
    .collect()
});

/// Detect what merge policy the user likely meant.
fn detect_policy_intent(input: &str) -> Option<&'static str> {
    let lower = input.trim().to_lowercase();

    for policy in ["add", "update", "replace"] {
        if policy == lower || (!lower.is_empty() && policy.starts_with(&lower)) {
            return Some(policy);
        }
    }

    POLICY_SYNONYMS.get(lower.as_str()).copied()
}

/// Calculate the Levenshtein distance between two strings.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

/// Find keys similar to the searched key (case-insensitive).
///
/// Returns up to `max_suggestions` keys with distance <= 2.
#[must_use]
pub fn find_similar_keys(
    searched: &str,
    existing: &[String],
    max_suggestions: usize,
) -> Vec<String> {
    let needle = searched.trim().to_uppercase();
    let mut candidates: Vec<(usize, &str)> = existing
        .iter()
        .map(|key| (levenshtein_distance(&needle, &key.to_uppercase()), key.as_str()))
        .filter(|(dist, _)| *dist <= 2)
        .collect();

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    candidates
        .into_iter()
        .take(max_suggestions)
        .map(|(_, key)| key.to_string())
        .collect()
}
