use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{StatusKey, Ticket};
use crate::storage::TaskStore;
use crate::sync::{Classification, MergeOutcome};

/// Ticket row for list views.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRow<'a> {
    #[serde(flatten)]
    pub ticket: &'a Ticket,
    pub completed: bool,
    pub priority_text: &'static str,
    pub status_class: &'static str,
}

impl<'a> From<&'a Ticket> for TicketRow<'a> {
    fn from(ticket: &'a Ticket) -> Self {
        Self {
            ticket,
            completed: ticket.is_completed(),
            priority_text: ticket.priority_value.text(),
            status_class: ticket.status_key.css_class(),
        }
    }
}

/// Headline counts.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total: usize,
    pub visible: usize,
    pub completed: usize,
    pub blacklisted: usize,
    pub by_status: BTreeMap<StatusKey, usize>,
}

/// Aggregate statistics: summary plus facet counts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub summary: StatsSummary,
    pub projects: BTreeMap<String, usize>,
    pub people: BTreeMap<String, usize>,
    pub tags: BTreeMap<String, usize>,
}

impl Statistics {
    /// Compute from a store. Blacklisted tickets are counted only in
    /// `summary.blacklisted`.
    #[must_use]
    pub fn from_store(store: &TaskStore) -> Self {
        let mut summary = StatsSummary {
            total: store.len(),
            ..StatsSummary::default()
        };
        for ticket in store.tasks() {
            if store.is_blacklisted(&ticket.key) {
                summary.blacklisted += 1;
                continue;
            }
            summary.visible += 1;
            if ticket.is_completed() {
                summary.completed += 1;
            }
            *summary.by_status.entry(ticket.status_key).or_default() += 1;
        }

        Self {
            summary,
            projects: store.project_counts(),
            people: store.people_counts(),
            tags: store.tag_counts(),
        }
    }
}

/// What an import did (or would do, for a dry run).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub policy: String,
    pub dry_run: bool,
    pub parsed: usize,
    pub new: usize,
    pub existing: usize,
    pub changed: Vec<String>,
    #[serde(flatten)]
    pub outcome: MergeOutcome,
    pub total_after: usize,
}

impl ImportReport {
    #[must_use]
    pub fn new(
        policy: &str,
        dry_run: bool,
        classification: &Classification,
        outcome: MergeOutcome,
        total_after: usize,
    ) -> Self {
        Self {
            policy: policy.to_string(),
            dry_run,
            parsed: classification.total,
            new: classification.new.len(),
            existing: classification.existing.len(),
            changed: classification.changed.clone(),
            outcome,
            total_after,
        }
    }
}
