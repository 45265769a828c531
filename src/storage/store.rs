//! The ticket store.
//!
//! Owns the canonical collection. Every mutation recomputes the derived
//! index before any subscriber runs, so subscribers always observe a
//! consistent store. Lifecycle:
//!
//! ```text
//! Empty --load--> Loaded --mutation--> Mutated --mark_saved--> Loaded
//!   ^                                    |
//!   +---------------reset----------------+
//! ```
//!
//! Any state can be mutated, and `reset` returns to `Empty` from anywhere.

use std::collections::{BTreeMap, HashSet};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::ViewMode;
use super::events::{EventBus, StoreEvent, SubscriptionId, Topic};
use super::filters::{self, FilterState};
use super::index::DerivedIndex;
use crate::config::rules::apply_project_rules;
use crate::config::store::{ConfigStore, UserConfig};
use crate::error::{Result, TrackerError};
use crate::model::{Ticket, TicketPatch, dedup_labels, normalize_key};
use crate::sync::{
    MergeOutcome, MergePolicy, Snapshot, SnapshotMetadata, SnapshotSink, merge_checked,
};
use crate::util::Debouncer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreState {
    #[default]
    Empty,
    Loaded,
    /// Holds changes not yet persisted.
    Mutated,
}

impl StoreState {
    #[must_use]
    pub const fn is_unsaved(&self) -> bool {
        matches!(self, Self::Mutated)
    }
}

#[derive(Debug, Default)]
pub struct TaskStore {
    tickets: Vec<Ticket>,
    index: DerivedIndex,
    filters: FilterState,
    view_mode: ViewMode,
    state: StoreState,
    bus: EventBus,
    config: ConfigStore,
    autosave: Option<Debouncer>,
}

impl TaskStore {
    /// An empty store with an in-memory config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: ConfigStore) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Persist automatically `delay` after the last mutation of a burst.
    #[must_use]
    pub fn with_autosave(mut self, delay: Duration) -> Self {
        self.autosave = Some(Debouncer::new(delay));
        self
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub fn tasks(&self) -> &[Ticket] {
        &self.tickets
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Ticket> {
        self.position(key).map(|i| &self.tickets[i])
    }

    #[must_use]
    pub const fn state(&self) -> StoreState {
        self.state
    }

    #[must_use]
    pub const fn has_unsaved_changes(&self) -> bool {
        self.state.is_unsaved()
    }

    #[must_use]
    pub const fn index(&self) -> &DerivedIndex {
        &self.index
    }

    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        &self.filters
    }

    #[must_use]
    pub const fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    #[must_use]
    pub const fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Mutable access to user configuration. Call [`Self::refresh`] after
    /// blacklist changes so facet counts are re-announced.
    pub fn config_mut(&mut self) -> &mut ConfigStore {
        &mut self.config
    }

    #[must_use]
    pub fn is_blacklisted(&self, key: &str) -> bool {
        self.config.is_blacklisted(key)
    }

    /// Tickets passing every active filter, in collection order.
    #[must_use]
    pub fn filtered_tasks(&self) -> Vec<&Ticket> {
        self.filter_with(&self.filters)
    }

    /// Tickets passing an ad-hoc filter, ignoring the stored filter state.
    #[must_use]
    pub fn filter_with(&self, filters: &FilterState) -> Vec<&Ticket> {
        let normalized = filters.clone().normalized();
        self.tickets
            .iter()
            .filter(|t| filters::passes(t, &normalized, |k| self.config.is_blacklisted(k)))
            .collect()
    }

    /// Per-project ticket counts, ignoring active filters.
    #[must_use]
    pub fn project_counts(&self) -> BTreeMap<String, usize> {
        filters::project_counts(&self.tickets, |k| self.config.is_blacklisted(k))
    }

    /// Per-reporter ticket counts, ignoring active filters.
    #[must_use]
    pub fn people_counts(&self) -> BTreeMap<String, usize> {
        filters::people_counts(&self.tickets, |k| self.config.is_blacklisted(k))
    }

    /// Per-tag ticket counts, ignoring active filters.
    ///
    /// Labels that collide with a project or person are left out, judged
    /// against non-blacklisted tickets only.
    #[must_use]
    pub fn tag_counts(&self) -> BTreeMap<String, usize> {
        let visible = DerivedIndex::build(&self.tickets, |t| !self.config.is_blacklisted(&t.key));
        filters::tag_counts(
            &self.tickets,
            |k| self.config.is_blacklisted(k),
            |label| visible.is_tag(label),
        )
    }

    /// Snapshot of the tickets and user configuration.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(
            self.tickets.clone(),
            self.config.config().to_snapshot_config(),
            SnapshotMetadata {
                projects: self.index.projects.iter().cloned().collect(),
                people: self.index.people.iter().cloned().collect(),
            },
        )
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    pub fn subscribe<F>(&mut self, topic: Topic, callback: F) -> SubscriptionId
    where
        F: FnMut(&StoreEvent) -> anyhow::Result<()> + 'static,
    {
        if topic == Topic::UserConfig {
            self.config.subscribe(callback)
        } else {
            self.bus.subscribe(topic, callback)
        }
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id) || self.config.unsubscribe(id)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Load a persisted collection. The store becomes `Loaded`.
    ///
    /// Keys are normalized; later duplicates of a key are dropped.
    pub fn load(&mut self, tickets: Vec<Ticket>) {
        self.tickets = dedupe_normalized(tickets);
        self.rebuild_index();
        if let Some(autosave) = &mut self.autosave {
            autosave.cancel();
        }
        info!(tasks = self.tickets.len(), "Collection loaded");
        self.emit_tasks();
        self.transition(StoreState::Loaded);
    }

    /// Load tickets and user configuration from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the config backend cannot persist the new config.
    pub fn load_snapshot(&mut self, snapshot: Snapshot) -> Result<()> {
        self.config
            .replace(UserConfig::from_snapshot_config(snapshot.config))?;
        self.load(snapshot.tasks);
        Ok(())
    }

    /// Record that the current state has been persisted.
    pub fn mark_saved(&mut self) {
        if let Some(autosave) = &mut self.autosave {
            autosave.cancel();
        }
        if self.state == StoreState::Mutated {
            self.transition(StoreState::Loaded);
        }
    }

    /// Drop every ticket and return to `Empty`.
    pub fn reset(&mut self) {
        self.tickets.clear();
        self.rebuild_index();
        if let Some(autosave) = &mut self.autosave {
            autosave.cancel();
        }
        info!("Collection reset");
        self.emit_tasks();
        self.transition(StoreState::Empty);
    }

    /// Recompute the index and re-announce the collection without marking it
    /// as changed. Used after configuration changes that affect facets.
    pub fn refresh(&mut self) {
        self.rebuild_index();
        self.emit_tasks();
    }

    // ========================================================================
    // Autosave
    // ========================================================================

    /// Persist if the autosave deadline has passed. Returns true if it saved.
    ///
    /// # Errors
    ///
    /// Returns the sink's error; the store stays unsaved and the autosave is
    /// rescheduled from `now`.
    pub fn flush_due(&mut self, now: Instant, sink: &mut dyn SnapshotSink) -> Result<bool> {
        let due = self.autosave.as_mut().is_some_and(|d| d.poll(now));
        if !due {
            return Ok(false);
        }
        if let Err(err) = self.flush_now(sink) {
            warn!(error = %err, "Autosave failed; rescheduling");
            if let Some(debouncer) = self.autosave.as_mut() {
                debouncer.schedule(now);
            }
            return Err(err);
        }
        Ok(true)
    }

    /// Persist immediately and mark the store saved.
    ///
    /// # Errors
    ///
    /// Returns the sink's error; the store stays unsaved.
    pub fn flush_now(&mut self, sink: &mut dyn SnapshotSink) -> Result<()> {
        sink.persist(&self.snapshot())?;
        debug!(tasks = self.tickets.len(), "Store flushed");
        self.mark_saved();
        Ok(())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Replace the whole collection.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if two tickets share a key; nothing changes.
    pub fn set_tasks(&mut self, tickets: Vec<Ticket>) -> Result<()> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(tickets.len());
        for mut ticket in tickets {
            ticket.key = normalize_key(&ticket.key);
            if !seen.insert(ticket.key.clone()) {
                return Err(TrackerError::DuplicateKey { key: ticket.key });
            }
            normalized.push(ticket);
        }
        self.tickets = normalized;
        self.commit();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a validation error for a blank key, or `DuplicateKey`.
    pub fn add_task(&mut self, mut ticket: Ticket) -> Result<()> {
        ticket.key = normalize_key(&ticket.key);
        if ticket.key.is_empty() {
            return Err(TrackerError::validation("key", "cannot be empty"));
        }
        if self.position(&ticket.key).is_some() {
            return Err(TrackerError::DuplicateKey { key: ticket.key });
        }
        debug!(key = %ticket.key, "Task added");
        self.tickets.push(ticket);
        self.commit();
        Ok(())
    }

    /// Apply a partial update. Returns false if nothing changed.
    ///
    /// # Errors
    ///
    /// Returns `TicketNotFound` for an unknown key.
    pub fn update_task(&mut self, key: &str, patch: &TicketPatch) -> Result<bool> {
        self.modify(key, |ticket| patch.apply(ticket))
    }

    /// # Errors
    ///
    /// Returns `TicketNotFound` for an unknown key.
    pub fn remove_task(&mut self, key: &str) -> Result<Ticket> {
        let index = self
            .position(key)
            .ok_or_else(|| TrackerError::not_found(key))?;
        let removed = self.tickets.remove(index);
        debug!(key = %removed.key, "Task removed");
        self.commit();
        Ok(removed)
    }

    /// Replace a ticket's labels (trimmed, case-insensitively unique).
    ///
    /// # Errors
    ///
    /// Returns `TicketNotFound` for an unknown key.
    pub fn update_labels(&mut self, key: &str, labels: &[String]) -> Result<bool> {
        let labels = dedup_labels(labels.iter().map(String::as_str));
        self.modify(key, |ticket| ticket.labels = labels)
    }

    /// # Errors
    ///
    /// Returns a validation error for a blank label, or `TicketNotFound`.
    pub fn add_label(&mut self, key: &str, label: &str) -> Result<bool> {
        let label = label.trim().to_string();
        if label.is_empty() {
            return Err(TrackerError::validation("label", "cannot be empty"));
        }
        self.modify(key, |ticket| {
            if !ticket.has_label(&label) {
                ticket.labels.push(label);
            }
        })
    }

    /// Remove a label, matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `TicketNotFound` for an unknown key.
    pub fn remove_label(&mut self, key: &str, label: &str) -> Result<bool> {
        let needle = label.trim().to_lowercase();
        self.modify(key, |ticket| {
            ticket.labels.retain(|l| l.to_lowercase() != needle);
        })
    }

    /// # Errors
    ///
    /// Returns `TicketNotFound` for an unknown key.
    pub fn set_due_date(&mut self, key: &str, due: Option<DateTime<Utc>>) -> Result<bool> {
        self.modify(key, |ticket| ticket.due_date = due)
    }

    /// Set or clear the completion override.
    ///
    /// # Errors
    ///
    /// Returns `TicketNotFound` for an unknown key.
    pub fn set_done(&mut self, key: &str, done: Option<bool>) -> Result<bool> {
        self.modify(key, |ticket| ticket.done = done)
    }

    /// Flip completion and return the new value.
    ///
    /// # Errors
    ///
    /// Returns `TicketNotFound` for an unknown key.
    pub fn toggle_done(&mut self, key: &str) -> Result<bool> {
        let completed = self
            .get(key)
            .map(Ticket::is_completed)
            .ok_or_else(|| TrackerError::not_found(key))?;
        self.set_done(key, Some(!completed))?;
        Ok(!completed)
    }

    /// Merge an imported batch and replace the collection with the result.
    ///
    /// The returned outcome carries the counts; its `tickets` are moved into
    /// the store and left empty.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if the stored collection is corrupt.
    pub fn apply_import(
        &mut self,
        imported: &[Ticket],
        policy: &MergePolicy,
    ) -> Result<MergeOutcome> {
        let mut outcome = merge_checked(imported, &self.tickets, policy)?;
        let merged = std::mem::take(&mut outcome.tickets);
        if merged != self.tickets {
            self.tickets = merged;
            self.commit();
        }
        Ok(outcome)
    }

    /// Parse an export, assign projects from the configured rules, then
    /// merge it with [`Self::apply_import`].
    ///
    /// # Errors
    ///
    /// Returns `MalformedInput` for bad XML; the collection is untouched.
    pub fn import_xml(&mut self, xml: &str, policy: &MergePolicy) -> Result<MergeOutcome> {
        let mut imported = crate::sync::parse(xml)?;
        apply_project_rules(&mut imported, self.config.config().project_rules.as_slice());
        self.apply_import(&imported, policy)
    }

    /// Re-run project rules over the whole collection.
    pub fn apply_project_rules(&mut self) -> usize {
        let rules = self.config.project_rules();
        let changed = apply_project_rules(&mut self.tickets, &rules);
        if changed > 0 {
            self.commit();
        }
        changed
    }

    // ========================================================================
    // Filters and view
    // ========================================================================

    pub fn set_filters(&mut self, filters: FilterState) {
        let filters = filters.normalized();
        if filters != self.filters {
            self.filters = filters;
            self.bus.emit(&StoreEvent::Filters);
        }
    }

    fn update_filters(&mut self, change: impl FnOnce(&mut FilterState)) {
        let mut next = self.filters.clone();
        change(&mut next);
        self.set_filters(next);
    }

    pub fn toggle_project(&mut self, project: &str) {
        self.update_filters(|f| {
            filters::toggle(&mut f.projects, project);
        });
    }

    pub fn toggle_person(&mut self, person: &str) {
        self.update_filters(|f| {
            filters::toggle(&mut f.people, person);
        });
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        self.update_filters(|f| {
            filters::toggle(&mut f.tags, tag);
        });
    }

    pub fn set_search(&mut self, search: &str) {
        self.update_filters(|f| f.search = search.to_string());
    }

    pub fn set_show_done(&mut self, show: bool) {
        self.update_filters(|f| f.show_done = show);
    }

    pub fn set_show_label_done(&mut self, show: bool) {
        self.update_filters(|f| f.show_label_done = show);
    }

    pub fn clear_filters(&mut self) {
        self.set_filters(FilterState::default());
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if mode != self.view_mode {
            self.view_mode = mode;
            self.bus.emit(&StoreEvent::ViewMode { mode });
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn position(&self, key: &str) -> Option<usize> {
        self.tickets.iter().position(|t| t.has_key(key))
    }

    fn modify<F>(&mut self, key: &str, change: F) -> Result<bool>
    where
        F: FnOnce(&mut Ticket),
    {
        let index = self
            .position(key)
            .ok_or_else(|| TrackerError::not_found(key))?;
        let before = self.tickets[index].clone();
        change(&mut self.tickets[index]);
        if self.tickets[index] == before {
            return Ok(false);
        }
        self.commit();
        Ok(true)
    }

    fn rebuild_index(&mut self) {
        self.index = DerivedIndex::build(&self.tickets, |_| true);
    }

    fn emit_tasks(&mut self) {
        self.bus.emit(&StoreEvent::Tasks {
            count: self.tickets.len(),
        });
    }

    /// Index, notify, mark unsaved, schedule autosave.
    fn commit(&mut self) {
        self.rebuild_index();
        self.emit_tasks();
        self.transition(StoreState::Mutated);
        if let Some(autosave) = &mut self.autosave {
            autosave.schedule(Instant::now());
        }
    }

    fn transition(&mut self, next: StoreState) {
        let was_unsaved = self.state.is_unsaved();
        self.state = next;
        if was_unsaved != next.is_unsaved() {
            self.bus.emit(&StoreEvent::UnsavedChanges {
                unsaved: next.is_unsaved(),
            });
        }
    }
}

fn dedupe_normalized(tickets: Vec<Ticket>) -> Vec<Ticket> {
    let mut seen = HashSet::new();
    tickets
        .into_iter()
        .filter_map(|mut ticket| {
            ticket.key = normalize_key(&ticket.key);
            (!ticket.key.is_empty() && seen.insert(ticket.key.clone())).then_some(ticket)
        })
        .collect()
}
