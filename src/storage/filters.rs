//! Filter state and the filter pipeline.
//!
//! Predicates run in a fixed order and stop at the first failure:
//! blacklist, project/component, reporter, tag, done visibility,
//! label-done visibility, summary search. Blacklist runs first so a
//! blacklisted ticket can never surface anywhere else.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::index::{ticket_projects, unique_lower_labels};
use crate::model::{StatusKey, Ticket};
use crate::normalize::label_status;

/// Person filter value selecting tickets without a reporter.
pub const NO_REPORTER: &str = "nopeople";

/// Active filters. Empty sets mean "no constraint".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    /// Lower-cased project or component names.
    pub projects: BTreeSet<String>,
    /// Lower-cased reporters, or [`NO_REPORTER`].
    pub people: BTreeSet<String>,
    /// Lower-cased labels; a ticket matches if it carries any of them.
    pub tags: BTreeSet<String>,
    pub show_done: bool,
    /// Show tickets whose labels mark them as done.
    pub show_label_done: bool,
    pub search: String,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            projects: BTreeSet::new(),
            people: BTreeSet::new(),
            tags: BTreeSet::new(),
            show_done: true,
            show_label_done: true,
            search: String::new(),
        }
    }
}

impl FilterState {
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Normalize set members and the search string.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let lower = |set: BTreeSet<String>| -> BTreeSet<String> {
            set.into_iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };
        self.projects = lower(self.projects);
        self.people = lower(self.people);
        self.tags = lower(self.tags);
        self.search = self.search.trim().to_lowercase();
        self
    }
}

/// Add `value` if absent, remove it if present. Returns the new membership.
pub fn toggle(set: &mut BTreeSet<String>, value: &str) -> bool {
    let value = value.trim().to_lowercase();
    if set.remove(&value) {
        false
    } else {
        set.insert(value);
        true
    }
}

fn matches_project(ticket: &Ticket, projects: &BTreeSet<String>) -> bool {
    projects.is_empty() || ticket_projects(ticket).any(|p| projects.contains(&p))
}

fn matches_person(ticket: &Ticket, people: &BTreeSet<String>) -> bool {
    if people.is_empty() {
        return true;
    }
    ticket.reporter_lower().map_or_else(
        || people.contains(NO_REPORTER),
        |reporter| people.contains(&reporter),
    )
}

fn matches_tag(ticket: &Ticket, tags: &BTreeSet<String>) -> bool {
    tags.is_empty() || ticket.labels.iter().any(|l| tags.contains(&l.trim().to_lowercase()))
}

fn has_done_label(ticket: &Ticket) -> bool {
    ticket
        .labels
        .iter()
        .any(|l| label_status(l) == Some(StatusKey::Done))
}

fn matches_search(ticket: &Ticket, search: &str) -> bool {
    search.is_empty() || ticket.summary.to_lowercase().contains(search)
}

/// Whether a ticket passes every active filter.
///
/// `filters` must be normalized.
pub fn passes<B>(ticket: &Ticket, filters: &FilterState, is_blacklisted: B) -> bool
where
    B: Fn(&str) -> bool,
{
    !is_blacklisted(&ticket.key)
        && matches_project(ticket, &filters.projects)
        && matches_person(ticket, &filters.people)
        && matches_tag(ticket, &filters.tags)
        && (filters.show_done || !ticket.is_completed())
        && (filters.show_label_done || !has_done_label(ticket))
        && matches_search(ticket, &filters.search)
}

/// Ticket count per project/component over non-blacklisted tickets.
pub fn project_counts<'a, B>(
    tickets: impl IntoIterator<Item = &'a Ticket>,
    is_blacklisted: B,
) -> BTreeMap<String, usize>
where
    B: Fn(&str) -> bool,
{
    let mut counts = BTreeMap::new();
    for ticket in tickets.into_iter().filter(|t| !is_blacklisted(&t.key)) {
        let unique: BTreeSet<String> = ticket_projects(ticket).collect();
        for project in unique {
            *counts.entry(project).or_default() += 1;
        }
    }
    counts
}

/// Ticket count per reporter over non-blacklisted tickets. Tickets without a
/// reporter are counted under [`NO_REPORTER`].
pub fn people_counts<'a, B>(
    tickets: impl IntoIterator<Item = &'a Ticket>,
    is_blacklisted: B,
) -> BTreeMap<String, usize>
where
    B: Fn(&str) -> bool,
{
    let mut counts = BTreeMap::new();
    for ticket in tickets.into_iter().filter(|t| !is_blacklisted(&t.key)) {
        let person = ticket
            .reporter_lower()
            .unwrap_or_else(|| NO_REPORTER.to_string());
        *counts.entry(person).or_default() += 1;
    }
    counts
}

/// Ticket count per tag over non-blacklisted tickets, restricted to the
/// labels the derived index treats as tags.
pub fn tag_counts<'a, B, T>(
    tickets: impl IntoIterator<Item = &'a Ticket>,
    is_blacklisted: B,
    is_tag: T,
) -> BTreeMap<String, usize>
where
    B: Fn(&str) -> bool,
    T: Fn(&str) -> bool,
{
    let mut counts = BTreeMap::new();
    for ticket in tickets.into_iter().filter(|t| !is_blacklisted(&t.key)) {
        for label in unique_lower_labels(ticket) {
            if is_tag(&label) {
                *counts.entry(label).or_default() += 1;
            }
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never(_: &str) -> bool {
        false
    }

    fn ticket(key: &str, summary: &str) -> Ticket {
        Ticket::new(key, summary)
    }

    #[test]
    fn default_filters_pass_everything() {
        let mut t = ticket("A-1", "x");
        t.status_key = StatusKey::Done;
        t.labels = vec!["done".to_string()];
        assert!(passes(&t, &FilterState::default(), never));
    }

    #[test]
    fn blacklist_short_circuits() {
        let t = ticket("A-1", "x");
        assert!(!passes(&t, &FilterState::default(), |k| k == "A-1"));
    }

    #[test]
    fn project_matches_component_too() {
        let mut t = ticket("A-1", "x");
        t.components = vec!["Auth".to_string()];
        let filters = FilterState {
            projects: BTreeSet::from(["auth".to_string()]),
            ..FilterState::default()
        };
        assert!(passes(&t, &filters, never));
    }

    #[test]
    fn no_reporter_sentinel() {
        let without = ticket("A-1", "x");
        let mut with = ticket("A-2", "x");
        with.reporter = Some("Ann".to_string());
        let filters = FilterState {
            people: BTreeSet::from([NO_REPORTER.to_string()]),
            ..FilterState::default()
        };
        assert!(passes(&without, &filters, never));
        assert!(!passes(&with, &filters, never));
    }

    #[test]
    fn tag_filter_matches_any_selected() {
        let mut t = ticket("A-1", "x");
        t.labels = vec!["UI".to_string()];
        let filters = FilterState {
            tags: BTreeSet::from(["ui".to_string(), "backend".to_string()]),
            ..FilterState::default()
        };
        assert!(passes(&t, &filters, never));
    }

    #[test]
    fn done_visibility_respects_override() {
        let mut t = ticket("A-1", "x");
        t.status_key = StatusKey::Done;
        let filters = FilterState {
            show_done: false,
            ..FilterState::default()
        };
        assert!(!passes(&t, &filters, never));
        t.done = Some(false);
        assert!(passes(&t, &filters, never));
    }

    #[test]
    fn label_done_visibility() {
        let mut t = ticket("A-1", "x");
        t.labels = vec!["Terminé".to_string()];
        let filters = FilterState {
            show_label_done: false,
            ..FilterState::default()
        };
        assert!(!passes(&t, &filters, never));
    }

    #[test]
    fn search_is_case_insensitive_on_summary() {
        let t = ticket("A-1", "Fix Login Button");
        let filters = FilterState {
            search: " LOGIN ".to_string(),
            ..FilterState::default()
        }
        .normalized();
        assert!(passes(&t, &filters, never));
        let filters = FilterState {
            search: "a-1".to_string(),
            ..FilterState::default()
        };
        assert!(!passes(&t, &filters, never));
    }

    #[test]
    fn toggle_flips_membership() {
        let mut set = BTreeSet::new();
        assert!(toggle(&mut set, " Web "));
        assert!(set.contains("web"));
        assert!(!toggle(&mut set, "WEB"));
        assert!(set.is_empty());
    }

    #[test]
    fn counts_skip_blacklisted() {
        let mut a = ticket("A-1", "x");
        a.project = Some("Web".to_string());
        a.components = vec!["web".to_string()];
        a.labels = vec!["ui".to_string()];
        let mut b = ticket("A-2", "x");
        b.project = Some("Web".to_string());
        b.reporter = Some("Ann".to_string());
        b.labels = vec!["ui".to_string()];
        let tickets = vec![a, b];
        let blacklisted = |k: &str| k == "A-2";

        assert_eq!(project_counts(&tickets, blacklisted).get("web"), Some(&1));
        let people = people_counts(&tickets, blacklisted);
        assert_eq!(people.get(NO_REPORTER), Some(&1));
        assert!(!people.contains_key("ann"));
        assert_eq!(tag_counts(&tickets, blacklisted, |_| true).get("ui"), Some(&1));
    }
}
