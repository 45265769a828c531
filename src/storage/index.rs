//! Derived facts over the ticket collection.
//!
//! Recomputed in full after every mutation. Collections stay in the low
//! thousands, so a linear pass is cheap and keeps the index trivially
//! consistent with the tickets.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::model::Ticket;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DerivedIndex {
    /// Lower-cased project and component names.
    pub projects: BTreeSet<String>,
    /// Lower-cased reporters.
    pub people: BTreeSet<String>,
    /// Lower-cased label to ticket count, minus labels that name a project
    /// or a person.
    pub tags: BTreeMap<String, usize>,
}

impl DerivedIndex {
    /// Build the index over the tickets that pass `include`.
    #[must_use]
    pub fn build<'a, I, F>(tickets: I, include: F) -> Self
    where
        I: IntoIterator<Item = &'a Ticket>,
        F: Fn(&Ticket) -> bool,
    {
        let mut index = Self::default();
        let mut labels: BTreeMap<String, usize> = BTreeMap::new();

        for ticket in tickets.into_iter().filter(|t| include(t)) {
            index.projects.extend(ticket_projects(ticket));
            if let Some(reporter) = ticket.reporter_lower() {
                index.people.insert(reporter);
            }
            for label in unique_lower_labels(ticket) {
                *labels.entry(label).or_default() += 1;
            }
        }

        index.tags = labels
            .into_iter()
            .filter(|(label, _)| !index.projects.contains(label) && !index.people.contains(label))
            .collect();
        index
    }

    #[must_use]
    pub fn is_tag(&self, label: &str) -> bool {
        self.tags.contains_key(&label.trim().to_lowercase())
    }
}

/// Lower-cased project plus component names for one ticket.
#[must_use]
pub fn ticket_projects(ticket: &Ticket) -> impl Iterator<Item = String> + '_ {
    ticket
        .project
        .iter()
        .chain(ticket.components.iter())
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
}

/// Lower-cased labels, each at most once.
#[must_use]
pub fn unique_lower_labels(ticket: &Ticket) -> BTreeSet<String> {
    ticket
        .labels
        .iter()
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .collect()
}
