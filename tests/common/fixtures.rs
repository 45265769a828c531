#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use ticketdeck::model::{Priority, StatusKey, Ticket};
use ticketdeck::normalize::normalize_status;

/// Two-item export used by the add-only scenario.
pub const TWO_ITEMS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="0.92">
  <channel>
    <title>Tracker export</title>
    <item>
      <title>[A-1] Set up the build</title>
      <key>A-1</key>
      <summary>Set up the build</summary>
      <project key="A">Alpha</project>
      <status>Open</status>
      <priority>High</priority>
      <reporter>Ann Lee</reporter>
      <labels><label>infra</label></labels>
    </item>
    <item>
      <title>[A-2] Write the README</title>
      <key>A-2</key>
      <summary>Write the README</summary>
      <project key="A">Alpha</project>
      <status>Resolved</status>
      <priority>Low</priority>
      <reporter>Bob Stone</reporter>
      <labels><label>docs</label></labels>
    </item>
  </channel>
</rss>"#;

/// Export whose items carry no project, so rules decide.
pub const UNPROJECTED: &str = r#"<rss>
  <channel>
    <item>
      <key>X-1</key>
      <summary>[Alpha] unrelated beta text</summary>
      <status>In Progress</status>
    </item>
    <item>
      <key>X-2</key>
      <summary>plain beta work</summary>
      <status>Review</status>
    </item>
  </channel>
</rss>"#;

/// Build an export from `(key, summary, status)` triples.
pub fn export_xml(items: &[(&str, &str, &str)]) -> String {
    let mut xml = String::from("<rss><channel>");
    for (key, summary, status) in items {
        xml.push_str(&format!(
            "<item><key>{key}</key><summary>{summary}</summary><status>{status}</status></item>"
        ));
    }
    xml.push_str("</channel></rss>");
    xml
}

/// A normalized ticket with deterministic dates.
pub fn ticket(key: &str, summary: &str, status: &str) -> Ticket {
    let mut ticket = Ticket::new(key, summary);
    ticket.status = status.to_string();
    ticket.set_status_info(normalize_status(status, &[]));
    ticket.created = Utc.timestamp_opt(1_735_689_600, 0).single();
    ticket
}

pub fn ticket_in(key: &str, project: &str, reporter: Option<&str>, labels: &[&str]) -> Ticket {
    let mut t = ticket(key, &format!("Work on {key}"), "Open");
    t.project = Some(project.to_string());
    t.reporter = reporter.map(str::to_string);
    t.labels = labels.iter().map(|l| (*l).to_string()).collect();
    t
}

/// `count` synthetic tickets spread over a few projects and people.
pub fn synthetic(count: usize) -> Vec<Ticket> {
    const PROJECTS: [&str; 4] = ["Web", "Api", "Mobile", "Infra"];
    const PEOPLE: [&str; 3] = ["Ann", "Bob", "Cy"];
    (0..count)
        .map(|i| {
            let labels: &[&str] = if i % 5 == 0 { &["urgent", "ui"] } else { &["ui"] };
            let mut t = ticket_in(
                &format!("T-{i}"),
                PROJECTS[i % PROJECTS.len()],
                Some(PEOPLE[i % PEOPLE.len()]),
                labels,
            );
            t.priority_value = Priority(u8::try_from(i % 5).unwrap_or(0) + 1);
            if i % 7 == 0 {
                t.set_status_info(normalize_status("Done", &[]));
                assert_eq!(t.status_key, StatusKey::Done);
            }
            t
        })
        .collect()
}
