//! Core data types for `ticketdeck`.
//!
//! This module defines the fundamental types used throughout the application:
//! - `Ticket` - A work item imported from the external tracker
//! - `StatusKey` - Canonical workflow states
//! - `Priority` - Five-level priority scale
//! - `TicketField` - Field selector used by selective merges
//! - `TicketPatch` - Partial update applied by the store
//! - `ProjectRule` - Keyword rule mapping titles to projects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Canonical workflow status, independent of the tracker's free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusKey {
    #[default]
    Backlog,
    InProgress,
    Review,
    Ready,
    Delivered,
    Done,
}

impl StatusKey {
    pub const ALL: [Self; 6] = [
        Self::Backlog,
        Self::InProgress,
        Self::Review,
        Self::Ready,
        Self::Delivered,
        Self::Done,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::InProgress => "inprogress",
            Self::Review => "review",
            Self::Ready => "ready",
            Self::Delivered => "delivered",
            Self::Done => "done",
        }
    }

    /// Canonical display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::InProgress => "In Progress",
            Self::Review => "In Review",
            Self::Ready => "Ready for Test",
            Self::Delivered => "Delivered",
            Self::Done => "Done",
        }
    }

    #[must_use]
    pub const fn icon(&self) -> &'static str {
        match self {
            Self::Backlog => "○",
            Self::InProgress => "◐",
            Self::Review => "◑",
            Self::Ready => "◕",
            Self::Delivered => "➜",
            Self::Done => "✓",
        }
    }

    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::Backlog => "status-backlog",
            Self::InProgress => "status-inprogress",
            Self::Review => "status-review",
            Self::Ready => "status-ready",
            Self::Delivered => "status-delivered",
            Self::Done => "status-done",
        }
    }

    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StatusKey {
    type Err = crate::error::TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-', ' '], "").as_str() {
            "backlog" => Ok(Self::Backlog),
            "inprogress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "ready" => Ok(Self::Ready),
            "delivered" => Ok(Self::Delivered),
            "done" => Ok(Self::Done),
            other => Err(crate::error::TrackerError::validation(
                "status",
                format!("unknown status key '{other}'"),
            )),
        }
    }
}

/// Normalized status: canonical key plus the label shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusInfo {
    pub key: StatusKey,
    /// Canonical label, or the tracker's raw label when classified heuristically.
    pub label: String,
}

impl StatusInfo {
    #[must_use]
    pub fn canonical(key: StatusKey) -> Self {
        Self {
            key,
            label: key.label().to_string(),
        }
    }

    #[must_use]
    pub const fn icon(&self) -> &'static str {
        self.key.icon()
    }

    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        self.key.css_class()
    }
}

/// Ticket priority (1=Lowest, 5=Highest).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Priority(pub u8);

impl Priority {
    pub const LOWEST: Self = Self(1);
    pub const LOW: Self = Self(2);
    pub const MEDIUM: Self = Self(3);
    pub const HIGH: Self = Self(4);
    pub const HIGHEST: Self = Self(5);

    #[must_use]
    pub const fn text(&self) -> &'static str {
        match self.0 {
            5 => "Highest",
            4 => "High",
            2 => "Low",
            1 => "Lowest",
            _ => "Medium",
        }
    }

    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.0 {
            5 => "priority-highest",
            4 => "priority-high",
            2 => "priority-low",
            1 => "priority-lowest",
            _ => "priority-medium",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::MEDIUM
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Normalized priority: numeric level plus display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityInfo {
    pub value: Priority,
}

impl PriorityInfo {
    #[must_use]
    pub const fn text(&self) -> &'static str {
        self.value.text()
    }

    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        self.value.css_class()
    }
}

/// A single work item imported from the external tracker.
///
/// Tickets are immutable by convention: only the store's mutation API
/// changes them once they are part of a collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Unique key (e.g., "WEB-123"), uppercased.
    pub key: String,

    #[serde(default)]
    pub summary: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Issue type as reported by the tracker (Bug, Story, ...).
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub issue_type: String,

    /// Raw status string from the tracker.
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub status_key: StatusKey,

    #[serde(default)]
    pub status_label: String,

    /// Raw priority string from the tracker.
    #[serde(default)]
    pub priority: String,

    #[serde(default)]
    pub priority_value: Priority,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fix_versions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// User override of completion; `None` defers to the status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
}

impl Ticket {
    /// Create a ticket with the given key and summary and backlog defaults.
    #[must_use]
    pub fn new(key: &str, summary: &str) -> Self {
        Self {
            key: normalize_key(key),
            summary: summary.trim().to_string(),
            description: String::new(),
            issue_type: String::new(),
            status: String::new(),
            status_key: StatusKey::Backlog,
            status_label: StatusKey::Backlog.label().to_string(),
            priority: String::new(),
            priority_value: Priority::MEDIUM,
            reporter: None,
            assignee: None,
            project: None,
            components: Vec::new(),
            fix_versions: Vec::new(),
            resolution: None,
            created: None,
            updated: None,
            due_date: None,
            labels: Vec::new(),
            link: None,
            done: None,
        }
    }

    /// Apply a normalized status to this ticket.
    pub fn set_status_info(&mut self, info: StatusInfo) {
        self.status_key = info.key;
        self.status_label = info.label;
    }

    #[must_use]
    pub fn status_info(&self) -> StatusInfo {
        StatusInfo {
            key: self.status_key,
            label: if self.status_label.is_empty() {
                self.status_key.label().to_string()
            } else {
                self.status_label.clone()
            },
        }
    }

    #[must_use]
    pub const fn priority_info(&self) -> PriorityInfo {
        PriorityInfo {
            value: self.priority_value,
        }
    }

    /// Completion honours the user override before the status.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.done.unwrap_or_else(|| self.status_key.is_done())
    }

    /// Key comparison under the same normalization used for storage.
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.key == normalize_key(key)
    }

    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        let needle = label.trim().to_lowercase();
        self.labels.iter().any(|l| l.to_lowercase() == needle)
    }

    /// Lower-cased reporter, or `None` when missing or blank.
    #[must_use]
    pub fn reporter_lower(&self) -> Option<String> {
        self.reporter
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_lowercase)
    }

    /// Compute the deterministic content hash for this ticket.
    ///
    /// Covers the fields a tracker export can change. Excludes the key,
    /// timestamps other than the due date, and the user's `done` override.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();

        let mut update = |s: &str| {
            hasher.update(s.as_bytes());
            hasher.update([0]);
        };

        update(&self.summary);
        update(&self.description);
        update(&self.issue_type);
        update(&self.status);
        update(&self.priority);
        update(self.reporter.as_deref().unwrap_or(""));
        update(self.assignee.as_deref().unwrap_or(""));
        update(self.project.as_deref().unwrap_or(""));
        update(&self.components.join("\u{1f}"));
        update(&self.labels.join("\u{1f}"));
        update(
            &self
                .due_date
                .map(|d| d.to_rfc3339())
                .unwrap_or_default(),
        );

        format!("{:x}", hasher.finalize())
    }
}

/// Normalize a ticket key for storage and comparison.
#[must_use]
pub fn normalize_key(key: &str) -> String {
    key.trim().to_uppercase()
}

/// Fields that a selective merge may overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TicketField {
    Summary,
    Description,
    Type,
    Status,
    Priority,
    DueDate,
    Labels,
    Project,
    Components,
    Assignee,
    Reporter,
    Resolution,
    Link,
}

impl TicketField {
    pub const ALL: [Self; 13] = [
        Self::Summary,
        Self::Description,
        Self::Type,
        Self::Status,
        Self::Priority,
        Self::DueDate,
        Self::Labels,
        Self::Project,
        Self::Components,
        Self::Assignee,
        Self::Reporter,
        Self::Resolution,
        Self::Link,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Description => "description",
            Self::Type => "type",
            Self::Status => "status",
            Self::Priority => "priority",
            Self::DueDate => "dueDate",
            Self::Labels => "labels",
            Self::Project => "project",
            Self::Components => "components",
            Self::Assignee => "assignee",
            Self::Reporter => "reporter",
            Self::Resolution => "resolution",
            Self::Link => "link",
        }
    }

    /// Copy this field from `source` into `target`, leaving everything else.
    pub fn copy(self, source: &Ticket, target: &mut Ticket) {
        match self {
            Self::Summary => target.summary.clone_from(&source.summary),
            Self::Description => target.description.clone_from(&source.description),
            Self::Type => target.issue_type.clone_from(&source.issue_type),
            Self::Status => {
                target.status.clone_from(&source.status);
                target.status_key = source.status_key;
                target.status_label.clone_from(&source.status_label);
            }
            Self::Priority => {
                target.priority.clone_from(&source.priority);
                target.priority_value = source.priority_value;
            }
            Self::DueDate => target.due_date = source.due_date,
            Self::Labels => target.labels.clone_from(&source.labels),
            Self::Project => target.project.clone_from(&source.project),
            Self::Components => target.components.clone_from(&source.components),
            Self::Assignee => target.assignee.clone_from(&source.assignee),
            Self::Reporter => target.reporter.clone_from(&source.reporter),
            Self::Resolution => target.resolution.clone_from(&source.resolution),
            Self::Link => target.link.clone_from(&source.link),
        }
    }
}

impl fmt::Display for TicketField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TicketField {
    type Err = crate::error::TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], "").as_str() {
            "summary" | "title" => Ok(Self::Summary),
            "description" => Ok(Self::Description),
            "type" => Ok(Self::Type),
            "status" => Ok(Self::Status),
            "priority" => Ok(Self::Priority),
            "duedate" | "due" => Ok(Self::DueDate),
            "labels" | "label" => Ok(Self::Labels),
            "project" => Ok(Self::Project),
            "components" | "component" => Ok(Self::Components),
            "assignee" => Ok(Self::Assignee),
            "reporter" => Ok(Self::Reporter),
            "resolution" => Ok(Self::Resolution),
            "link" => Ok(Self::Link),
            other => Err(crate::error::TrackerError::validation(
                "fields",
                format!("unknown ticket field '{other}'"),
            )),
        }
    }
}

/// Partial update for a ticket. `None` leaves a field untouched;
/// `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct TicketPatch {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub status_key: Option<StatusKey>,
    pub priority_value: Option<Priority>,
    pub assignee: Option<Option<String>>,
    pub reporter: Option<Option<String>>,
    pub project: Option<Option<String>>,
    pub components: Option<Vec<String>>,
    pub labels: Option<Vec<String>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub link: Option<Option<String>>,
    pub done: Option<Option<bool>>,
}

impl TicketPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.description.is_none()
            && self.status_key.is_none()
            && self.priority_value.is_none()
            && self.assignee.is_none()
            && self.reporter.is_none()
            && self.project.is_none()
            && self.components.is_none()
            && self.labels.is_none()
            && self.due_date.is_none()
            && self.link.is_none()
            && self.done.is_none()
    }

    /// Apply the patch in place.
    pub fn apply(&self, ticket: &mut Ticket) {
        if let Some(summary) = &self.summary {
            ticket.summary = summary.trim().to_string();
        }
        if let Some(description) = &self.description {
            ticket.description.clone_from(description);
        }
        if let Some(key) = self.status_key {
            ticket.set_status_info(StatusInfo::canonical(key));
        }
        if let Some(priority) = self.priority_value {
            ticket.priority_value = priority;
            ticket.priority = priority.text().to_string();
        }
        if let Some(assignee) = &self.assignee {
            ticket.assignee.clone_from(assignee);
        }
        if let Some(reporter) = &self.reporter {
            ticket.reporter.clone_from(reporter);
        }
        if let Some(project) = &self.project {
            ticket.project.clone_from(project);
        }
        if let Some(components) = &self.components {
            ticket.components.clone_from(components);
        }
        if let Some(labels) = &self.labels {
            ticket.labels = dedup_labels(labels.iter().map(String::as_str));
        }
        if let Some(due_date) = self.due_date {
            ticket.due_date = due_date;
        }
        if let Some(link) = &self.link {
            ticket.link.clone_from(link);
        }
        if let Some(done) = self.done {
            ticket.done = done;
        }
    }
}

/// Trim labels, drop blanks, and collapse duplicates that differ only by
/// case, keeping the first spelling.
#[must_use]
pub fn dedup_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    labels
        .into_iter()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|l| seen.insert(l.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// A user-defined keyword rule assigning tickets to a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectRule {
    pub name: String,
    /// Ordered, lower-cased, unique patterns.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl ProjectRule {
    /// Build a rule, normalizing the name and patterns.
    #[must_use]
    pub fn new<S: AsRef<str>>(name: &str, patterns: &[S]) -> Self {
        let mut rule = Self {
            name: name.trim().to_string(),
            patterns: Vec::new(),
        };
        for pattern in patterns {
            rule.add_pattern(pattern.as_ref());
        }
        rule
    }

    /// Add a pattern; returns false when it was blank or already present.
    pub fn add_pattern(&mut self, pattern: &str) -> bool {
        let normalized = pattern.trim().to_lowercase();
        if normalized.is_empty() || self.patterns.contains(&normalized) {
            return false;
        }
        self.patterns.push(normalized);
        true
    }

    /// Remove a pattern; returns false when it was not present.
    pub fn remove_pattern(&mut self, pattern: &str) -> bool {
        let normalized = pattern.trim().to_lowercase();
        let before = self.patterns.len();
        self.patterns.retain(|p| p != &normalized);
        self.patterns.len() != before
    }

    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_key_serializes_lowercase() {
        let json = serde_json::to_string(&StatusKey::InProgress).unwrap();
        assert_eq!(json, "\"inprogress\"");
        let parsed: StatusKey = serde_json::from_str("\"delivered\"").unwrap();
        assert_eq!(parsed, StatusKey::Delivered);
    }

    #[test]
    fn status_key_from_str_accepts_separators() {
        assert_eq!("in_progress".parse::<StatusKey>().unwrap(), StatusKey::InProgress);
        assert_eq!("In Progress".parse::<StatusKey>().unwrap(), StatusKey::InProgress);
        assert!("nope".parse::<StatusKey>().is_err());
    }

    #[test]
    fn ticket_new_normalizes_key() {
        let ticket = Ticket::new("  abc-1 ", " Fix login ");
        assert_eq!(ticket.key, "ABC-1");
        assert_eq!(ticket.summary, "Fix login");
        assert_eq!(ticket.status_key, StatusKey::Backlog);
        assert_eq!(ticket.priority_value, Priority::MEDIUM);
        assert!(ticket.has_key("abc-1"));
    }

    #[test]
    fn done_override_wins_over_status() {
        let mut ticket = Ticket::new("A-1", "x");
        assert!(!ticket.is_completed());
        ticket.status_key = StatusKey::Done;
        assert!(ticket.is_completed());
        ticket.done = Some(false);
        assert!(!ticket.is_completed());
    }

    #[test]
    fn ticket_deserialize_defaults_missing_fields() {
        let json = r#"{"key": "A-1", "summary": "Hello"}"#;
        let ticket: Ticket = serde_json::from_str(json).unwrap();
        assert_eq!(ticket.status_key, StatusKey::Backlog);
        assert_eq!(ticket.priority_value, Priority::MEDIUM);
        assert!(ticket.labels.is_empty());
        assert!(ticket.done.is_none());
    }

    #[test]
    fn ticket_serialization_uses_camel_case() {
        let mut ticket = Ticket::new("A-1", "Hello");
        ticket.due_date = Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        let json = serde_json::to_string(&ticket).unwrap();
        assert!(json.contains("\"statusKey\":\"backlog\""));
        assert!(json.contains("\"priorityValue\":3"));
        assert!(json.contains("\"dueDate\""));
        assert!(!json.contains("labels"));
    }

    #[test]
    fn content_hash_ignores_done_flag() {
        let mut a = Ticket::new("A-1", "Hello");
        let hash = a.content_hash();
        a.done = Some(true);
        assert_eq!(a.content_hash(), hash);
        a.summary = "Changed".to_string();
        assert_ne!(a.content_hash(), hash);
    }

    #[test]
    fn field_copy_status_moves_all_status_parts() {
        let mut source = Ticket::new("A-1", "src");
        source.status = "Resolved".to_string();
        source.set_status_info(StatusInfo::canonical(StatusKey::Done));
        let mut target = Ticket::new("A-1", "dst");
        TicketField::Status.copy(&source, &mut target);
        assert_eq!(target.status, "Resolved");
        assert_eq!(target.status_key, StatusKey::Done);
        assert_eq!(target.summary, "dst");
    }

    #[test]
    fn field_copy_status_leaves_resolution() {
        let mut source = Ticket::new("A-1", "src");
        source.resolution = Some("Fixed".to_string());
        let mut target = Ticket::new("A-1", "dst");
        TicketField::Status.copy(&source, &mut target);
        assert!(target.resolution.is_none());

        TicketField::Resolution.copy(&source, &mut target);
        assert_eq!(target.resolution.as_deref(), Some("Fixed"));
        assert_eq!("resolution".parse::<TicketField>().unwrap(), TicketField::Resolution);
    }

    #[test]
    fn has_key_matches_non_ascii_case() {
        let ticket = Ticket::new("é-1", "accent");
        assert_eq!(ticket.key, "É-1");
        assert!(ticket.has_key("é-1"));
        assert!(ticket.has_key(" É-1 "));
        assert!(!ticket.has_key("e-1"));
    }

    #[test]
    fn patch_sets_and_clears_fields() {
        let mut ticket = Ticket::new("A-1", "Hello");
        ticket.assignee = Some("ann".to_string());
        let patch = TicketPatch {
            assignee: Some(None),
            labels: Some(vec!["UI".to_string(), "ui".to_string(), " ".to_string()]),
            priority_value: Some(Priority::HIGH),
            ..Default::default()
        };
        patch.apply(&mut ticket);
        assert!(ticket.assignee.is_none());
        assert_eq!(ticket.labels, vec!["UI".to_string()]);
        assert_eq!(ticket.priority, "High");
        assert!(TicketPatch::default().is_empty());
    }

    #[test]
    fn project_rule_patterns_are_normalized_and_unique() {
        let mut rule = ProjectRule::new(" Alpha ", &["ALPHA", "alpha ", ""]);
        assert_eq!(rule.name, "Alpha");
        assert_eq!(rule.patterns, vec!["alpha".to_string()]);
        assert!(!rule.add_pattern(" Alpha"));
        assert!(rule.remove_pattern("ALPHA"));
        assert!(!rule.remove_pattern("alpha"));
        assert!(rule.has_name("alpha"));
    }

    #[test]
    fn ticket_field_parses_aliases() {
        assert_eq!("due".parse::<TicketField>().unwrap(), TicketField::DueDate);
        assert_eq!("dueDate".parse::<TicketField>().unwrap(), TicketField::DueDate);
        assert!("weird".parse::<TicketField>().is_err());
    }
}
