//! Tracker XML export parsing.
//!
//! Reads the RSS-style item export produced by the tracker: a document with
//! any number of `<item>` elements, each describing one ticket. Unknown
//! elements are ignored. Items without a `<key>` are dropped.

use roxmltree::{Document, Node, ParsingOptions};
use tracing::{debug, info};

use crate::error::{Result, TrackerError};
use crate::model::{Ticket, dedup_labels, normalize_key};
use crate::normalize::{normalize_priority, normalize_status};
use crate::util::parse_tracker_date;

/// Parse a tracker XML export into normalized tickets.
///
/// Status and priority are normalized here; project rules are not applied.
///
/// # Errors
///
/// Returns `MalformedInput` if the document is not well-formed XML.
pub fn parse(xml: &str) -> Result<Vec<Ticket>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options).map_err(|e| {
        TrackerError::MalformedInput {
            reason: e.to_string(),
        }
    })?;

    let mut tickets = Vec::new();
    let mut dropped = 0usize;

    for item in doc.descendants().filter(|n| n.has_tag_name("item")) {
        match parse_item(item) {
            Some(ticket) => tickets.push(ticket),
            None => {
                dropped += 1;
                debug!(
                    position = item.range().start,
                    "Dropping item without a key"
                );
            }
        }
    }

    info!(parsed = tickets.len(), dropped, "Parsed tracker export");
    Ok(tickets)
}

fn parse_item(item: Node<'_, '_>) -> Option<Ticket> {
    let key = child_text(item, "key").map(|k| normalize_key(&k))?;
    if key.is_empty() {
        return None;
    }

    let title = child_text(item, "title").unwrap_or_default();
    let summary = child_text(item, "summary").unwrap_or_else(|| strip_key_prefix(&title, &key));

    let labels = dedup_labels(
        item.children()
            .filter(|n| n.has_tag_name("labels"))
            .flat_map(|labels| labels.children().filter(|n| n.has_tag_name("label")))
            .filter_map(element_text)
            .collect::<Vec<_>>()
            .iter()
            .map(String::as_str),
    );

    let status = child_text(item, "status").unwrap_or_default();
    let priority = child_text(item, "priority").unwrap_or_default();

    let mut ticket = Ticket::new(&key, &summary);
    ticket.description = child_text(item, "description").unwrap_or_default();
    ticket.issue_type = child_text(item, "type").unwrap_or_default();
    ticket.set_status_info(normalize_status(&status, &labels));
    ticket.status = status;
    ticket.priority_value = normalize_priority(&priority).value;
    ticket.priority = priority;
    ticket.reporter = child_text(item, "reporter");
    ticket.assignee = child_text(item, "assignee").filter(|a| !is_unassigned(a));
    ticket.project = child_project(item);
    ticket.components = child_texts(item, "component");
    ticket.fix_versions = child_texts(item, "fixVersion");
    ticket.resolution = child_text(item, "resolution");
    ticket.created = child_text(item, "created").and_then(|s| parse_tracker_date(&s));
    ticket.updated = child_text(item, "updated").and_then(|s| parse_tracker_date(&s));
    ticket.due_date = child_text(item, "due").and_then(|s| parse_tracker_date(&s));
    ticket.labels = labels;
    ticket.link = child_text(item, "link");

    Some(ticket)
}

/// Concatenated, trimmed text of an element. `None` when blank.
fn element_text(node: Node<'_, '_>) -> Option<String> {
    let text: String = node
        .descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect();
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn child_text(item: Node<'_, '_>, name: &str) -> Option<String> {
    item.children()
        .find(|n| n.has_tag_name(name))
        .and_then(element_text)
}

fn child_texts(item: Node<'_, '_>, name: &str) -> Vec<String> {
    item.children()
        .filter(|n| n.has_tag_name(name))
        .filter_map(element_text)
        .collect()
}

fn child_project(item: Node<'_, '_>) -> Option<String> {
    let node = item.children().find(|n| n.has_tag_name("project"))?;
    element_text(node).or_else(|| {
        node.attribute("key")
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
    })
}

fn is_unassigned(name: &str) -> bool {
    name.eq_ignore_ascii_case("unassigned")
}

/// Strip a leading `[KEY]` from an RSS title.
fn strip_key_prefix(title: &str, key: &str) -> String {
    let trimmed = title.trim();
    trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.split_once(']'))
        .filter(|(inner, _)| normalize_key(inner) == normalize_key(key))
        .map_or_else(|| trimmed.to_string(), |(_, rest)| rest.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, StatusKey};
    use chrono::Datelike;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="0.92">
  <channel>
    <title>Export</title>
    <item>
      <title>[WEB-12] Broken login button</title>
      <link>https://tracker.example.com/browse/WEB-12</link>
      <project id="10" key="WEB">Website</project>
      <key id="1012">web-12</key>
      <type>Bug</type>
      <priority>High</priority>
      <status>En cours</status>
      <resolution>Unresolved</resolution>
      <assignee username="ann">Ann Lee</assignee>
      <reporter username="bob">  Bob Stone </reporter>
      <labels>
        <label>UI</label>
        <label>ui</label>
        <label>urgent</label>
      </labels>
      <created>Mon, 15 Jan 2024 10:30:00 +0000</created>
      <due>Thu, 1 Jan 1900 00:00:00 +0000</due>
      <component>Frontend</component>
      <component>Auth</component>
      <fixVersion>1.2</fixVersion>
    </item>
    <item>
      <title>No key here</title>
    </item>
    <item>
      <key>WEB-13</key>
      <summary>Explicit summary</summary>
      <project key="WEB"></project>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_items_and_drops_keyless() {
        let tickets = parse(SAMPLE).unwrap();
        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[0].key, "WEB-12");
        assert_eq!(tickets[1].key, "WEB-13");
    }

    #[test]
    fn extracts_and_normalizes_fields() {
        let tickets = parse(SAMPLE).unwrap();
        let t = &tickets[0];
        assert_eq!(t.summary, "Broken login button");
        assert_eq!(t.issue_type, "Bug");
        assert_eq!(t.status_key, StatusKey::InProgress);
        assert_eq!(t.status, "En cours");
        assert_eq!(t.priority_value, Priority::HIGH);
        assert_eq!(t.reporter.as_deref(), Some("Bob Stone"));
        assert_eq!(t.assignee.as_deref(), Some("Ann Lee"));
        assert_eq!(t.project.as_deref(), Some("Website"));
        assert_eq!(t.components, vec!["Frontend", "Auth"]);
        assert_eq!(t.fix_versions, vec!["1.2"]);
        assert_eq!(t.labels, vec!["UI", "urgent"]);
        assert_eq!(t.created.map(|d| d.year()), Some(2024));
        assert!(t.due_date.is_none(), "pre-1970 dates are dropped");
        assert!(t.link.as_deref().unwrap().ends_with("WEB-12"));
    }

    #[test]
    fn applies_defaults_for_sparse_items() {
        let tickets = parse(SAMPLE).unwrap();
        let t = &tickets[1];
        assert_eq!(t.summary, "Explicit summary");
        assert_eq!(t.project.as_deref(), Some("WEB"));
        assert_eq!(t.status_key, StatusKey::Backlog);
        assert_eq!(t.priority_value, Priority::MEDIUM);
        assert!(t.labels.is_empty());
        assert!(t.components.is_empty());
        assert!(t.done.is_none());
    }

    #[test]
    fn malformed_xml_is_rejected() {
        let err = parse("<rss><item><key>A-1</key></rss>").unwrap_err();
        assert!(matches!(err, TrackerError::MalformedInput { .. }));
    }

    #[test]
    fn empty_document_yields_nothing() {
        assert!(parse("<rss><channel/></rss>").unwrap().is_empty());
    }

    #[test]
    fn unassigned_is_none() {
        let xml = "<rss><item><key>A-1</key><assignee>Unassigned</assignee></item></rss>";
        let tickets = parse(xml).unwrap();
        assert!(tickets[0].assignee.is_none());
    }

    #[test]
    fn strip_prefix_only_for_matching_key() {
        assert_eq!(strip_key_prefix("[A-1] Title", "A-1"), "Title");
        assert_eq!(strip_key_prefix("[Alpha] Title", "A-1"), "[Alpha] Title");
        assert_eq!(strip_key_prefix("Title", "A-1"), "Title");
    }
}
