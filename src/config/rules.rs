//! Project detection rules.
//!
//! A rule maps keywords to a project name. Detection looks at bracketed
//! tokens in the title first (`[Alpha] fix login`), then falls back to a
//! plain substring search over the whole title. Rules are scanned in their
//! stored order and the first match wins.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TrackerError};
use crate::model::{ProjectRule, Ticket};

static BRACKET_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]+)\]").expect("bracket token regex is valid"));

/// Lower-cased, trimmed contents of every `[...]` token in `title`.
fn bracket_tokens(title: &str) -> Vec<String> {
    BRACKET_TOKEN
        .captures_iter(title)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Detect the project a title belongs to.
///
/// Returns `None` when no rule matches. A bracket match in any rule beats a
/// plain-text match in an earlier rule.
#[must_use]
pub fn detect_project(title: &str, rules: &[ProjectRule]) -> Option<String> {
    let tokens = bracket_tokens(title);

    if !tokens.is_empty() {
        let bracket_hit = rules.iter().find(|rule| {
            rule.patterns.iter().filter(|p| !p.is_empty()).any(|pattern| {
                tokens
                    .iter()
                    .any(|token| token.contains(pattern.as_str()) || pattern.contains(token.as_str()))
            })
        });
        if let Some(rule) = bracket_hit {
            return Some(rule.name.clone());
        }
    }

    let lowered = title.to_lowercase();
    rules
        .iter()
        .find(|rule| {
            rule.patterns
                .iter()
                .any(|p| !p.is_empty() && lowered.contains(p.as_str()))
        })
        .map(|rule| rule.name.clone())
}

/// Assign projects from rules. A ticket with no match keeps its project.
///
/// Returns the number of tickets whose project changed.
pub fn apply_project_rules(tickets: &mut [Ticket], rules: &[ProjectRule]) -> usize {
    if rules.is_empty() {
        return 0;
    }

    let mut changed = 0;
    for ticket in tickets.iter_mut() {
        let Some(project) = detect_project(&ticket.summary, rules) else {
            continue;
        };
        if ticket.project.as_deref() != Some(project.as_str()) {
            debug!(key = %ticket.key, project = %project, "Project assigned by rule");
            ticket.project = Some(project);
            changed += 1;
        }
    }
    changed
}

/// Ordered collection of project rules with name-unique mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectRules(Vec<ProjectRule>);

impl ProjectRules {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Build from raw rules, merging duplicates by name.
    #[must_use]
    pub fn from_rules(rules: Vec<ProjectRule>) -> Self {
        let mut set = Self::new();
        for rule in rules {
            if set.add_rule(&rule.name, &rule.patterns).is_err() {
                debug!("Skipping project rule with a blank name");
            }
        }
        set
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ProjectRule] {
        &self.0
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<ProjectRule> {
        self.0.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ProjectRule> {
        self.0.iter().find(|r| r.has_name(name))
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut ProjectRule> {
        self.0.iter_mut().find(|r| r.has_name(name))
    }

    /// Add a rule, or merge the patterns into an existing rule of the same
    /// name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns a validation error if the name is blank.
    pub fn add_rule<S: AsRef<str>>(&mut self, name: &str, patterns: &[S]) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TrackerError::validation("rule name", "cannot be empty"));
        }

        if let Some(existing) = self.get_mut(name) {
            for pattern in patterns {
                existing.add_pattern(pattern.as_ref());
            }
        } else {
            self.0.push(ProjectRule::new(name, patterns));
        }
        Ok(())
    }

    /// Remove a rule by name.
    ///
    /// # Errors
    ///
    /// Returns `RuleNotFound` if no rule has that name.
    pub fn remove_rule(&mut self, name: &str) -> Result<ProjectRule> {
        let index = self
            .0
            .iter()
            .position(|r| r.has_name(name))
            .ok_or_else(|| TrackerError::RuleNotFound {
                name: name.trim().to_string(),
            })?;
        Ok(self.0.remove(index))
    }

    /// Rename a rule, keeping its position and patterns.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the new name is blank or belongs to a
    /// different rule, and `RuleNotFound` when `old` does not exist. The rule
    /// set is unchanged on error.
    pub fn rename_rule(&mut self, old: &str, new: &str) -> Result<()> {
        let new = new.trim();
        if new.is_empty() {
            return Err(TrackerError::validation("rule name", "cannot be empty"));
        }

        let index = self
            .0
            .iter()
            .position(|r| r.has_name(old))
            .ok_or_else(|| TrackerError::RuleNotFound {
                name: old.trim().to_string(),
            })?;

        let collides = self
            .0
            .iter()
            .enumerate()
            .any(|(i, r)| i != index && r.has_name(new));
        if collides {
            return Err(TrackerError::validation(
                "rule name",
                format!("a rule named '{new}' already exists"),
            ));
        }

        self.0[index].name = new.to_string();
        Ok(())
    }

    /// Add a pattern to a rule. Returns false if it was blank or present.
    ///
    /// # Errors
    ///
    /// Returns `RuleNotFound` if no rule has that name.
    pub fn add_pattern(&mut self, name: &str, pattern: &str) -> Result<bool> {
        self.get_mut(name)
            .map(|rule| rule.add_pattern(pattern))
            .ok_or_else(|| TrackerError::RuleNotFound {
                name: name.trim().to_string(),
            })
    }

    /// Remove a pattern from a rule. Returns false if it was absent.
    ///
    /// # Errors
    ///
    /// Returns `RuleNotFound` if no rule has that name.
    pub fn remove_pattern(&mut self, name: &str, pattern: &str) -> Result<bool> {
        self.get_mut(name)
            .map(|rule| rule.remove_pattern(pattern))
            .ok_or_else(|| TrackerError::RuleNotFound {
                name: name.trim().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, patterns: &[&str]) -> ProjectRule {
        ProjectRule::new(name, patterns)
    }

    #[test]
    fn bracket_match_beats_plain_text() {
        let rules = vec![rule("BETA", &["unrelated"]), rule("ALPHA", &["alpha"])];
        let title = "[Alpha] unrelated alpha-2 text";
        assert_eq!(detect_project(title, &rules).as_deref(), Some("ALPHA"));
    }

    #[test]
    fn bracket_match_is_bidirectional() {
        // token inside pattern
        let rules = vec![rule("Mobile", &["mobile-app"])];
        assert_eq!(detect_project("[mobile] crash", &rules).as_deref(), Some("Mobile"));
        // pattern inside token
        let rules = vec![rule("Web", &["web"])];
        assert_eq!(detect_project("[WEB-PORTAL] crash", &rules).as_deref(), Some("Web"));
    }

    #[test]
    fn plain_substring_fallback_in_rule_order() {
        let rules = vec![rule("First", &["login"]), rule("Second", &["button"])];
        let title = "Login button is broken";
        assert_eq!(detect_project(title, &rules).as_deref(), Some("First"));
    }

    #[test]
    fn no_match_returns_none() {
        let rules = vec![rule("First", &["login"])];
        assert!(detect_project("Nothing relevant", &rules).is_none());
        assert!(detect_project("anything", &[]).is_none());
    }

    #[test]
    fn apply_rules_never_clears_project() {
        let mut tickets = vec![Ticket::new("A-1", "Login broken"), Ticket::new("A-2", "Other")];
        tickets[1].project = Some("Keep".to_string());
        let rules = vec![rule("Auth", &["login"])];

        let changed = apply_project_rules(&mut tickets, &rules);
        assert_eq!(changed, 1);
        assert_eq!(tickets[0].project.as_deref(), Some("Auth"));
        assert_eq!(tickets[1].project.as_deref(), Some("Keep"));
    }

    #[test]
    fn add_rule_merges_same_name() {
        let mut rules = ProjectRules::new();
        rules.add_rule("Alpha", &["a1"]).unwrap();
        rules.add_rule(" alpha ", &["A1", "a2"]).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.as_slice()[0].patterns, vec!["a1", "a2"]);
        assert!(rules.add_rule("  ", &["x"]).is_err());
    }

    #[test]
    fn rename_rejects_empty_and_collisions() {
        let mut rules = ProjectRules::new();
        rules.add_rule("Alpha", &["a"]).unwrap();
        rules.add_rule("Beta", &["b"]).unwrap();
        let before = rules.clone();

        assert!(matches!(
            rules.rename_rule("Alpha", "  "),
            Err(TrackerError::Validation { .. })
        ));
        assert!(matches!(
            rules.rename_rule("Alpha", "BETA"),
            Err(TrackerError::Validation { .. })
        ));
        assert!(matches!(
            rules.rename_rule("Gamma", "Delta"),
            Err(TrackerError::RuleNotFound { .. })
        ));
        assert_eq!(rules, before);

        rules.rename_rule("alpha", "ALPHA").unwrap();
        assert_eq!(rules.as_slice()[0].name, "ALPHA");
    }

    #[test]
    fn pattern_mutation_is_idempotent() {
        let mut rules = ProjectRules::new();
        rules.add_rule("Alpha", &[] as &[&str]).unwrap();
        assert!(rules.add_pattern("alpha", " Foo ").unwrap());
        assert!(!rules.add_pattern("alpha", "foo").unwrap());
        assert!(rules.remove_pattern("ALPHA", "FOO").unwrap());
        assert!(!rules.remove_pattern("ALPHA", "foo").unwrap());
        assert!(rules.add_pattern("missing", "x").is_err());
    }

    #[test]
    fn remove_rule() {
        let mut rules = ProjectRules::from_rules(vec![rule("A", &["a"]), rule("a", &["b"])]);
        assert_eq!(rules.len(), 1);
        let removed = rules.remove_rule("A").unwrap();
        assert_eq!(removed.patterns, vec!["a", "b"]);
        assert!(rules.is_empty());
    }
}
