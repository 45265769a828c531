//! Import reconciliation for `ticketdeck`.
//!
//! This module handles:
//! - Parsing tracker XML exports (`xml`)
//! - Classifying an imported batch against the stored collection
//! - Merging with one of three policies
//! - Snapshot serialization (`snapshot`)
//!
//! Reconciliation is pure: both inputs are borrowed and a new collection is
//! returned. Keys are compared case-insensitively everywhere.

pub mod snapshot;
pub mod xml;

pub use snapshot::{FileSink, MemorySink, Snapshot, SnapshotConfig, SnapshotMetadata, SnapshotSink};
pub use xml::parse;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, TrackerError};
use crate::model::{Ticket, TicketField, normalize_key};

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Partition of an imported batch by key membership in the collection.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Classification {
    /// Imported tickets whose key is not in the collection.
    pub new: Vec<Ticket>,
    /// Imported tickets whose key is already in the collection.
    pub existing: Vec<Ticket>,
    /// `new.len() + existing.len()`.
    pub total: usize,
    /// Keys of existing matches whose imported content differs.
    pub changed: Vec<String>,
}

/// Classify imported tickets as new or existing.
///
/// Every imported ticket lands in exactly one partition, including repeated
/// keys within the batch.
#[must_use]
pub fn classify(imported: &[Ticket], existing: &[Ticket]) -> Classification {
    let by_key: HashMap<String, &Ticket> = existing
        .iter()
        .map(|t| (normalize_key(&t.key), t))
        .collect();

    let mut result = Classification::default();
    for ticket in imported {
        match by_key.get(&normalize_key(&ticket.key)) {
            Some(current) => {
                if current.content_hash() != ticket.content_hash() {
                    result.changed.push(ticket.key.clone());
                }
                result.existing.push(ticket.clone());
            }
            None => result.new.push(ticket.clone()),
        }
    }
    result.total = result.new.len() + result.existing.len();

    debug!(
        new = result.new.len(),
        existing = result.existing.len(),
        changed = result.changed.len(),
        "Classified import batch"
    );
    result
}

// ============================================================================
// MERGE POLICIES
// ============================================================================

/// How an imported batch is combined with the stored collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergePolicy {
    /// Append new tickets; existing tickets win.
    AddOnly,
    /// Overwrite only `fields` on the existing tickets named in `keys`.
    /// New tickets whose key is in `keys` are appended.
    SelectiveUpdate {
        fields: HashSet<TicketField>,
        keys: HashSet<String>,
    },
    /// Discard the collection and use the imported batch.
    FullReplace,
}

impl MergePolicy {
    /// Selective update with keys normalized for lookup.
    #[must_use]
    pub fn selective<I, K>(fields: impl IntoIterator<Item = TicketField>, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        Self::SelectiveUpdate {
            fields: fields.into_iter().collect(),
            keys: keys.into_iter().map(|k| normalize_key(k.as_ref())).collect(),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddOnly => "add",
            Self::SelectiveUpdate { .. } => "update",
            Self::FullReplace => "replace",
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Policy kind as chosen on the command line, before fields/keys are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    #[default]
    Add,
    Update,
    Replace,
}

impl FromStr for PolicyKind {
    type Err = TrackerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add" | "add-only" | "addonly" => Ok(Self::Add),
            "update" | "selective" | "selective-update" => Ok(Self::Update),
            "replace" | "full-replace" | "fullreplace" => Ok(Self::Replace),
            other => Err(TrackerError::validation(
                "policy",
                format!("unknown merge policy '{other}'"),
            )),
        }
    }
}

/// Result of a merge.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeOutcome {
    /// The merged collection.
    #[serde(skip)]
    pub tickets: Vec<Ticket>,
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub duplicates_dropped: usize,
}

/// Keep the first ticket for each key within one batch.
fn dedupe_batch(imported: &[Ticket]) -> (Vec<&Ticket>, usize) {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(imported.len());
    let mut dropped = 0;
    for ticket in imported {
        if seen.insert(normalize_key(&ticket.key)) {
            kept.push(ticket);
        } else {
            dropped += 1;
            debug!(key = %ticket.key, "Dropping duplicate key within import batch");
        }
    }
    (kept, dropped)
}

/// Merge an imported batch into the stored collection.
///
/// Existing tickets keep their relative order and new tickets are appended
/// in batch order. Only `FullReplace` ever changes a stored `done` flag.
#[must_use]
pub fn merge(imported: &[Ticket], existing: &[Ticket], policy: &MergePolicy) -> MergeOutcome {
    let (batch, duplicates_dropped) = dedupe_batch(imported);

    let outcome = match policy {
        MergePolicy::FullReplace => MergeOutcome {
            added: batch.len(),
            tickets: batch.into_iter().cloned().collect(),
            duplicates_dropped,
            ..MergeOutcome::default()
        },
        MergePolicy::AddOnly => {
            let mut tickets = existing.to_vec();
            let known: HashSet<String> = existing.iter().map(|t| normalize_key(&t.key)).collect();
            let mut added = 0;
            let mut unchanged = 0;
            for ticket in batch {
                if known.contains(&normalize_key(&ticket.key)) {
                    unchanged += 1;
                } else {
                    tickets.push(ticket.clone());
                    added += 1;
                }
            }
            MergeOutcome {
                tickets,
                added,
                updated: 0,
                unchanged,
                duplicates_dropped,
            }
        }
        MergePolicy::SelectiveUpdate { fields, keys } => {
            selective_update(&batch, existing, fields, keys, duplicates_dropped)
        }
    };

    info!(
        policy = %policy,
        added = outcome.added,
        updated = outcome.updated,
        unchanged = outcome.unchanged,
        duplicates_dropped = outcome.duplicates_dropped,
        total = outcome.tickets.len(),
        "Merged import batch"
    );
    outcome
}

fn selective_update(
    batch: &[&Ticket],
    existing: &[Ticket],
    fields: &HashSet<TicketField>,
    keys: &HashSet<String>,
    duplicates_dropped: usize,
) -> MergeOutcome {
    let selected = |key: &str| keys.contains(&normalize_key(key));

    let mut tickets = existing.to_vec();
    let index: HashMap<String, usize> = tickets
        .iter()
        .enumerate()
        .map(|(i, t)| (normalize_key(&t.key), i))
        .collect();

    let mut ordered_fields: Vec<TicketField> = fields.iter().copied().collect();
    ordered_fields.sort();

    let mut outcome = MergeOutcome {
        duplicates_dropped,
        ..MergeOutcome::default()
    };

    for incoming in batch {
        let key = normalize_key(&incoming.key);
        match index.get(&key) {
            Some(&i) if selected(&key) => {
                let target = &mut tickets[i];
                let before = target.clone();
                for field in &ordered_fields {
                    field.copy(incoming, target);
                }
                if *target == before {
                    outcome.unchanged += 1;
                } else {
                    outcome.updated += 1;
                }
            }
            Some(_) => outcome.unchanged += 1,
            None if selected(&key) => {
                tickets.push((*incoming).clone());
                outcome.added += 1;
            }
            None => {}
        }
    }

    outcome.tickets = tickets;
    outcome
}

/// Merge, then check the result kept key uniqueness.
///
/// # Errors
///
/// Returns `DuplicateKey` if `existing` itself holds a repeated key.
pub fn merge_checked(
    imported: &[Ticket],
    existing: &[Ticket],
    policy: &MergePolicy,
) -> Result<MergeOutcome> {
    let mut seen = HashSet::new();
    if let Some(dup) = existing.iter().find(|t| !seen.insert(normalize_key(&t.key))) {
        return Err(TrackerError::DuplicateKey {
            key: dup.key.clone(),
        });
    }
    Ok(merge(imported, existing, policy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StatusKey;

    fn ticket(key: &str, summary: &str) -> Ticket {
        Ticket::new(key, summary)
    }

    #[test]
    fn classify_partitions_by_case_insensitive_key() {
        let existing = vec![ticket("A-1", "one")];
        let mut lower = ticket("A-1", "one changed");
        lower.key = "a-1".to_string();
        let imported = vec![lower, ticket("A-2", "two")];

        let result = classify(&imported, &existing);
        assert_eq!(result.new.len(), 1);
        assert_eq!(result.existing.len(), 1);
        assert_eq!(result.total, 2);
        assert_eq!(result.changed, vec!["a-1".to_string()]);
    }

    #[test]
    fn classify_unchanged_is_not_reported() {
        let existing = vec![ticket("A-1", "one")];
        let result = classify(&existing, &existing);
        assert!(result.changed.is_empty());
    }

    #[test]
    fn add_only_keeps_existing_data() {
        let mut stored = ticket("A-1", "stored");
        stored.done = Some(true);
        let existing = vec![stored];
        let imported = vec![ticket("A-1", "imported"), ticket("A-2", "new")];

        let outcome = merge(&imported, &existing, &MergePolicy::AddOnly);
        assert_eq!(outcome.tickets.len(), 2);
        assert_eq!(outcome.tickets[0].summary, "stored");
        assert_eq!(outcome.tickets[0].done, Some(true));
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.unchanged, 1);
    }

    #[test]
    fn batch_duplicates_keep_first() {
        let imported = vec![ticket("A-1", "first"), ticket("a-1", "second")];
        let outcome = merge(&imported, &[], &MergePolicy::AddOnly);
        assert_eq!(outcome.tickets.len(), 1);
        assert_eq!(outcome.tickets[0].summary, "first");
        assert_eq!(outcome.duplicates_dropped, 1);
    }

    #[test]
    fn selective_update_touches_only_masked_fields() {
        let mut stored = ticket("A-1", "stored summary");
        stored.labels = vec!["keep".to_string()];
        stored.project = Some("Mine".to_string());
        stored.done = Some(false);
        let mut incoming = ticket("A-1", "imported summary");
        incoming.status = "Done".to_string();
        incoming.status_key = StatusKey::Done;
        incoming.status_label = "Done".to_string();
        incoming.labels = vec!["other".to_string()];
        incoming.done = Some(true);

        let policy = MergePolicy::selective([TicketField::Status], ["a-1"]);
        let outcome = merge(&[incoming], &[stored.clone()], &policy);

        let merged = &outcome.tickets[0];
        assert_eq!(merged.status_key, StatusKey::Done);
        assert_eq!(merged.summary, stored.summary);
        assert_eq!(merged.labels, stored.labels);
        assert_eq!(merged.project, stored.project);
        assert_eq!(merged.done, Some(false));
        assert_eq!(outcome.updated, 1);
    }

    #[test]
    fn selective_update_skips_unselected_keys() {
        let existing = vec![ticket("A-1", "old"), ticket("A-2", "old")];
        let imported = vec![ticket("A-1", "new"), ticket("A-2", "new"), ticket("A-3", "x")];
        let policy = MergePolicy::selective([TicketField::Summary], ["A-2", "A-3"]);

        let outcome = merge(&imported, &existing, &policy);
        assert_eq!(outcome.tickets[0].summary, "old");
        assert_eq!(outcome.tickets[1].summary, "new");
        assert_eq!(outcome.tickets.len(), 3);
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.unchanged, 1);
    }

    #[test]
    fn full_replace_discards_collection() {
        let existing = vec![ticket("A-1", "old"), ticket("A-2", "old")];
        let imported = vec![ticket("B-1", "new")];
        let outcome = merge(&imported, &existing, &MergePolicy::FullReplace);
        assert_eq!(outcome.tickets.len(), 1);
        assert_eq!(outcome.tickets[0].key, "B-1");
    }

    #[test]
    fn policy_kind_parses_aliases() {
        assert_eq!("ADD".parse::<PolicyKind>().unwrap(), PolicyKind::Add);
        assert_eq!("selective".parse::<PolicyKind>().unwrap(), PolicyKind::Update);
        assert_eq!("full-replace".parse::<PolicyKind>().unwrap(), PolicyKind::Replace);
        assert!("merge".parse::<PolicyKind>().is_err());
    }

    #[test]
    fn merge_checked_rejects_corrupt_collection() {
        let existing = vec![ticket("A-1", "x"), ticket("a-1", "y")];
        assert!(matches!(
            merge_checked(&[], &existing, &MergePolicy::AddOnly),
            Err(TrackerError::DuplicateKey { .. })
        ));
    }
}
