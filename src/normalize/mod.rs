//! Status and priority normalization.
//!
//! Tracker exports carry free-text statuses in several languages. These pure
//! functions map them onto [`StatusKey`] and [`Priority`] using, in order:
//!
//! 1. an exact (case-insensitive) status table
//! 2. label synonyms on the ticket
//! 3. substring heuristics on the raw status, keeping the raw text as label
//! 4. the backlog default
//!
//! The heuristic step is best effort. It exists so unfamiliar workflows land
//! somewhere sensible rather than all falling into the backlog.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::model::{Priority, PriorityInfo, StatusInfo, StatusKey};

static STATUS_TABLE: LazyLock<HashMap<&'static str, StatusKey>> = LazyLock::new(|| {
    HashMap::from([
        ("open", StatusKey::Backlog),
        ("to do", StatusKey::Backlog),
        ("todo", StatusKey::Backlog),
        ("backlog", StatusKey::Backlog),
        ("new", StatusKey::Backlog),
        ("reopened", StatusKey::Backlog),
        ("ouvert", StatusKey::Backlog),
        ("à faire", StatusKey::Backlog),
        ("in progress", StatusKey::InProgress),
        ("en cours", StatusKey::InProgress),
        ("in development", StatusKey::InProgress),
        ("en développement", StatusKey::InProgress),
        ("in review", StatusKey::Review),
        ("code review", StatusKey::Review),
        ("en revue", StatusKey::Review),
        ("ready for test", StatusKey::Ready),
        ("ready for testing", StatusKey::Ready),
        ("prêt pour test", StatusKey::Ready),
        ("prêt à tester", StatusKey::Ready),
        ("delivered", StatusKey::Delivered),
        ("livré", StatusKey::Delivered),
        ("done", StatusKey::Done),
        ("closed", StatusKey::Done),
        ("resolved", StatusKey::Done),
        ("terminé", StatusKey::Done),
        ("fermé", StatusKey::Done),
        ("résolu", StatusKey::Done),
    ])
});

static LABEL_SYNONYMS: LazyLock<HashMap<&'static str, StatusKey>> = LazyLock::new(|| {
    HashMap::from([
        ("done", StatusKey::Done),
        ("fait", StatusKey::Done),
        ("terminé", StatusKey::Done),
        ("termine", StatusKey::Done),
        ("closed", StatusKey::Done),
        ("delivered", StatusKey::Delivered),
        ("livré", StatusKey::Delivered),
        ("livre", StatusKey::Delivered),
        ("ready", StatusKey::Ready),
        ("prêt", StatusKey::Ready),
        ("pret", StatusKey::Ready),
        ("review", StatusKey::Review),
        ("revue", StatusKey::Review),
        ("wip", StatusKey::InProgress),
        ("en cours", StatusKey::InProgress),
    ])
});

/// Substring heuristics, evaluated in order. First hit wins.
const STATUS_HEURISTICS: &[(&[&str], StatusKey)] = &[
    (&["progress", "cours", "développ", "develop"], StatusKey::InProgress),
    (&["review", "revue"], StatusKey::Review),
    (&["livr", "deliver"], StatusKey::Delivered),
    (&["prêt", "ready", "test"], StatusKey::Ready),
    (&["done", "closed", "resolved"], StatusKey::Done),
];

/// Map a raw tracker status (plus the ticket's labels) onto a canonical status.
///
/// Exact table matches and label synonyms produce the canonical label. The
/// substring heuristic keeps the raw status as the display label.
#[must_use]
pub fn normalize_status(raw: &str, labels: &[String]) -> StatusInfo {
    let trimmed = raw.trim();
    let lowered = trimmed.to_lowercase();

    if let Some(key) = STATUS_TABLE.get(lowered.as_str()) {
        return StatusInfo::canonical(*key);
    }

    if let Some(key) = labels.iter().find_map(|label| label_status(label)) {
        return StatusInfo::canonical(key);
    }

    if trimmed.is_empty() {
        return StatusInfo::canonical(StatusKey::Backlog);
    }

    let key = STATUS_HEURISTICS
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lowered.contains(n)))
        .map_or(StatusKey::Backlog, |(_, key)| *key);

    tracing::trace!(raw = trimmed, status = %key, "Status classified heuristically");

    StatusInfo {
        key,
        label: trimmed.to_string(),
    }
}

/// Status implied by a single label, if the label is a known synonym.
#[must_use]
pub fn label_status(label: &str) -> Option<StatusKey> {
    LABEL_SYNONYMS
        .get(label.trim().to_lowercase().as_str())
        .copied()
}

/// Map a raw tracker priority onto the five-level scale.
///
/// Matching is exact and case-sensitive; anything else is Medium.
#[must_use]
pub fn normalize_priority(raw: &str) -> PriorityInfo {
    let value = match raw.trim() {
        "Highest" => Priority::HIGHEST,
        "High" => Priority::HIGH,
        "Low" => Priority::LOW,
        "Lowest" => Priority::LOWEST,
        _ => Priority::MEDIUM,
    };
    PriorityInfo { value }
}
