//! Property tests for classification and merging.

use proptest::prelude::*;
use std::collections::HashSet;
use ticketdeck::model::{Ticket, TicketField, normalize_key};
use ticketdeck::normalize::normalize_status;
use ticketdeck::sync::{MergePolicy, classify, merge};

const STATUSES: [&str; 6] = ["Open", "In Progress", "Review", "Resolved", "Closed", "Blocked"];

fn ticket_strategy() -> impl Strategy<Value = Ticket> {
    (
        "[A-C]-[0-9]{1,2}",
        "[a-z ]{0,20}",
        0..STATUSES.len(),
        prop::collection::vec("[a-z]{1,6}", 0..3),
    )
        .prop_map(|(key, summary, status, labels)| {
            let mut ticket = Ticket::new(&key, &summary);
            ticket.status = STATUSES[status].to_string();
            ticket.set_status_info(normalize_status(STATUSES[status], &labels));
            ticket.labels = labels;
            ticket
        })
}

fn batch() -> impl Strategy<Value = Vec<Ticket>> {
    prop::collection::vec(ticket_strategy(), 0..30)
}

fn unique(tickets: Vec<Ticket>) -> Vec<Ticket> {
    let mut seen = HashSet::new();
    tickets
        .into_iter()
        .filter(|t| seen.insert(normalize_key(&t.key)))
        .collect()
}

proptest! {
    #[test]
    fn classify_partitions_every_imported_ticket(imported in batch(), existing in batch()) {
        let existing = unique(existing);
        let result = classify(&imported, &existing);

        prop_assert_eq!(result.new.len() + result.existing.len(), result.total);
        prop_assert_eq!(result.total, imported.len());

        let stored: HashSet<String> = existing.iter().map(|t| normalize_key(&t.key)).collect();
        prop_assert!(result.new.iter().all(|t| !stored.contains(&normalize_key(&t.key))));
        prop_assert!(result.existing.iter().all(|t| stored.contains(&normalize_key(&t.key))));
    }

    #[test]
    fn add_only_re_merge_is_idempotent(tickets in batch()) {
        let once = merge(&tickets, &[], &MergePolicy::AddOnly).tickets;
        let twice = merge(&tickets, &once, &MergePolicy::AddOnly);
        prop_assert_eq!(&twice.tickets, &once);
        prop_assert_eq!(twice.added, 0);
    }

    #[test]
    fn merged_keys_stay_unique(imported in batch(), existing in batch()) {
        let existing = unique(existing);
        for policy in [MergePolicy::AddOnly, MergePolicy::FullReplace] {
            let merged = merge(&imported, &existing, &policy).tickets;
            let keys: HashSet<String> = merged.iter().map(|t| normalize_key(&t.key)).collect();
            prop_assert_eq!(keys.len(), merged.len());
        }
    }

    #[test]
    fn status_only_update_leaves_other_fields(existing in batch(), imported in batch()) {
        let existing = unique(existing);
        let keys: Vec<String> = imported.iter().map(|t| t.key.clone()).collect();
        let policy = MergePolicy::selective([TicketField::Status], &keys);
        let merged = merge(&imported, &existing, &policy).tickets;

        for before in &existing {
            let after = merged
                .iter()
                .find(|t| t.key == before.key)
                .expect("existing tickets survive a selective update");
            prop_assert_eq!(&after.summary, &before.summary);
            prop_assert_eq!(&after.labels, &before.labels);
            prop_assert_eq!(&after.project, &before.project);
            prop_assert_eq!(after.done, before.done);
        }
    }
}
