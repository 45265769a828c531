//! User configuration store: custom tags, project rules, blacklist.
//!
//! Every mutation persists through the [`ConfigBackend`] before subscribers
//! of [`Topic::UserConfig`] are notified. A mutation that would change
//! nothing neither persists nor notifies. Readers get owned copies.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::rules::ProjectRules;
use crate::error::Result;
use crate::model::{ProjectRule, dedup_labels, normalize_key};
use crate::storage::events::{EventBus, StoreEvent, SubscriptionId, Topic};
use crate::sync::SnapshotConfig;

/// Persisted user configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserConfig {
    /// Case preserved; unique case-insensitively, first spelling kept.
    pub custom_tags: Vec<String>,
    pub project_rules: ProjectRules,
    /// Uppercased ticket keys.
    pub blacklist: BTreeSet<String>,
}

impl UserConfig {
    /// Normalize tag and blacklist entries and merge duplicate rules.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            custom_tags: dedup_labels(self.custom_tags.iter().map(String::as_str)),
            project_rules: ProjectRules::from_rules(self.project_rules.to_vec()),
            blacklist: self
                .blacklist
                .into_iter()
                .map(|k| normalize_key(&k))
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn to_snapshot_config(&self) -> SnapshotConfig {
        SnapshotConfig {
            custom_tags: self.custom_tags.clone(),
            project_rules: self.project_rules.to_vec(),
            blacklist: self.blacklist.iter().cloned().collect(),
        }
    }

    #[must_use]
    pub fn from_snapshot_config(config: SnapshotConfig) -> Self {
        Self {
            custom_tags: config.custom_tags,
            project_rules: ProjectRules::from_rules(config.project_rules),
            blacklist: config.blacklist.into_iter().collect(),
        }
        .normalized()
    }
}

/// Where user configuration is persisted.
pub trait ConfigBackend {
    /// Load the stored configuration, or the default when none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if stored data exists but cannot be read.
    fn load(&self) -> Result<UserConfig>;

    /// Persist the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    fn save(&mut self, config: &UserConfig) -> Result<()>;
}

/// YAML file backend (`.ticketdeck/config.yaml`).
#[derive(Debug, Clone)]
pub struct YamlBackend {
    path: PathBuf,
}

impl YamlBackend {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigBackend for YamlBackend {
    fn load(&self) -> Result<UserConfig> {
        if !self.path.exists() {
            return Ok(UserConfig::default());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(UserConfig::default());
        }
        let config: UserConfig = serde_yaml::from_str(&contents)?;
        Ok(config.normalized())
    }

    fn save(&mut self, config: &UserConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(config)?;
        let temp_path = self.path.with_extension("yaml.tmp");
        fs::write(&temp_path, yaml)?;
        fs::rename(&temp_path, &self.path)?;
        debug!(path = %self.path.display(), "User config saved");
        Ok(())
    }
}

/// In-memory backend. Counts saves so tests can assert persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    pub stored: UserConfig,
    pub saves: usize,
}

impl ConfigBackend for MemoryBackend {
    fn load(&self) -> Result<UserConfig> {
        Ok(self.stored.clone())
    }

    fn save(&mut self, config: &UserConfig) -> Result<()> {
        self.stored = config.clone();
        self.saves += 1;
        Ok(())
    }
}

pub struct ConfigStore {
    config: UserConfig,
    /// Mirror of `config.blacklist` for O(1) lookups.
    blacklist_index: HashSet<String>,
    backend: Box<dyn ConfigBackend>,
    bus: EventBus,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("config", &self.config)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl ConfigStore {
    /// Open a store, loading whatever the backend holds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot load its data.
    pub fn open(backend: Box<dyn ConfigBackend>) -> Result<Self> {
        let config = backend.load()?;
        let blacklist_index = config.blacklist.iter().cloned().collect();
        Ok(Self {
            config,
            blacklist_index,
            backend,
            bus: EventBus::new(),
        })
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            config: UserConfig::default(),
            blacklist_index: HashSet::new(),
            backend: Box::new(MemoryBackend::default()),
            bus: EventBus::new(),
        }
    }

    // ---- queries --------------------------------------------------------

    #[must_use]
    pub fn config(&self) -> UserConfig {
        self.config.clone()
    }

    #[must_use]
    pub fn custom_tags(&self) -> Vec<String> {
        self.config.custom_tags.clone()
    }

    #[must_use]
    pub fn project_rules(&self) -> Vec<ProjectRule> {
        self.config.project_rules.to_vec()
    }

    #[must_use]
    pub fn blacklist(&self) -> Vec<String> {
        self.config.blacklist.iter().cloned().collect()
    }

    #[must_use]
    pub fn is_blacklisted(&self, key: &str) -> bool {
        if self.blacklist_index.is_empty() {
            return false;
        }
        self.blacklist_index.contains(&normalize_key(key))
    }

    // ---- subscriptions --------------------------------------------------

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&StoreEvent) -> anyhow::Result<()> + 'static,
    {
        self.bus.subscribe(Topic::UserConfig, callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    // ---- mutations ------------------------------------------------------

    /// Apply `change` to a copy; persist and notify only when it changed.
    fn mutate<F>(&mut self, change: F) -> Result<bool>
    where
        F: FnOnce(&mut UserConfig) -> Result<()>,
    {
        let mut next = self.config.clone();
        change(&mut next)?;
        if next == self.config {
            return Ok(false);
        }

        self.backend.save(&next)?;
        self.blacklist_index = next.blacklist.iter().cloned().collect();
        self.config = next;
        self.bus.emit(&StoreEvent::UserConfig);
        Ok(true)
    }

    /// Replace the whole configuration (snapshot load).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to persist.
    pub fn replace(&mut self, config: UserConfig) -> Result<bool> {
        let config = config.normalized();
        self.mutate(|current| {
            *current = config;
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Returns a validation error for a blank tag, or a backend error.
    pub fn add_custom_tag(&mut self, tag: &str) -> Result<bool> {
        let tag = tag.trim().to_string();
        if tag.is_empty() {
            return Err(crate::error::TrackerError::validation("tag", "cannot be empty"));
        }
        self.mutate(|c| {
            if !c.custom_tags.iter().any(|t| t.to_lowercase() == tag.to_lowercase()) {
                c.custom_tags.push(tag);
            }
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Returns an error if the backend fails to persist.
    pub fn remove_custom_tag(&mut self, tag: &str) -> Result<bool> {
        let needle = tag.trim().to_lowercase();
        self.mutate(|c| {
            c.custom_tags.retain(|t| t.to_lowercase() != needle);
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Returns a validation error for a blank key, or a backend error.
    pub fn add_to_blacklist(&mut self, key: &str) -> Result<bool> {
        let key = normalize_key(key);
        if key.is_empty() {
            return Err(crate::error::TrackerError::validation("key", "cannot be empty"));
        }
        let changed = self.mutate(|c| {
            c.blacklist.insert(key.clone());
            Ok(())
        })?;
        if changed {
            info!(key = %key, "Ticket blacklisted");
        }
        Ok(changed)
    }

    /// # Errors
    ///
    /// Returns an error if the backend fails to persist.
    pub fn remove_from_blacklist(&mut self, key: &str) -> Result<bool> {
        let key = normalize_key(key);
        self.mutate(|c| {
            c.blacklist.remove(&key);
            Ok(())
        })
    }

    /// Add a rule or merge patterns into a same-named rule.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, or a backend error.
    pub fn add_project_rule<S: AsRef<str>>(&mut self, name: &str, patterns: &[S]) -> Result<bool> {
        self.mutate(|c| c.project_rules.add_rule(name, patterns))
    }

    /// # Errors
    ///
    /// Returns `RuleNotFound` if no such rule exists, or a backend error.
    pub fn remove_project_rule(&mut self, name: &str) -> Result<bool> {
        self.mutate(|c| c.project_rules.remove_rule(name).map(|_| ()))
    }

    /// # Errors
    ///
    /// Returns a validation error for a blank or taken name, `RuleNotFound`
    /// for an unknown rule, or a backend error. Nothing changes on error.
    pub fn rename_project_rule(&mut self, old: &str, new: &str) -> Result<bool> {
        self.mutate(|c| c.project_rules.rename_rule(old, new))
    }

    /// # Errors
    ///
    /// Returns `RuleNotFound` if no such rule exists, or a backend error.
    pub fn add_rule_pattern(&mut self, name: &str, pattern: &str) -> Result<bool> {
        self.mutate(|c| c.project_rules.add_pattern(name, pattern).map(|_| ()))
    }

    /// # Errors
    ///
    /// Returns `RuleNotFound` if no such rule exists, or a backend error.
    pub fn remove_rule_pattern(&mut self, name: &str, pattern: &str) -> Result<bool> {
        self.mutate(|c| c.project_rules.remove_pattern(name, pattern).map(|_| ()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackerError;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    #[test]
    fn blacklist_is_uppercased_and_o1() {
        let mut store = ConfigStore::in_memory();
        assert!(store.add_to_blacklist(" web-1 ").unwrap());
        assert!(store.is_blacklisted("WEB-1"));
        assert!(store.is_blacklisted("web-1"));
        assert!(!store.add_to_blacklist("WEB-1").unwrap());
        assert_eq!(store.blacklist(), vec!["WEB-1".to_string()]);
        assert!(store.remove_from_blacklist("web-1").unwrap());
        assert!(!store.is_blacklisted("WEB-1"));
    }

    #[test]
    fn mutations_notify_subscribers() {
        let hits = Rc::new(RefCell::new(0));
        let mut store = ConfigStore::in_memory();
        let h = Rc::clone(&hits);
        store.subscribe(move |event| {
            assert_eq!(*event, StoreEvent::UserConfig);
            *h.borrow_mut() += 1;
            Ok(())
        });

        store.add_custom_tag("urgent").unwrap();
        store.add_custom_tag("urgent").unwrap();
        store.add_project_rule("Alpha", &["a"]).unwrap();
        assert_eq!(*hits.borrow(), 2);
    }

    #[test]
    fn custom_tags_dedupe_ignoring_case() {
        let mut store = ConfigStore::in_memory();
        assert!(store.add_custom_tag("Urgent").unwrap());
        assert!(!store.add_custom_tag("urgent").unwrap());
        assert!(!store.add_custom_tag(" URGENT ").unwrap());
        assert_eq!(store.custom_tags(), vec!["Urgent".to_string()]);

        assert!(store.remove_custom_tag("urgent").unwrap());
        assert!(store.custom_tags().is_empty());
    }

    #[test]
    fn loaded_config_collapses_tag_case_duplicates() {
        let config = UserConfig {
            custom_tags: vec!["Focus".to_string(), "focus".to_string(), " ".to_string()],
            ..UserConfig::default()
        }
        .normalized();
        assert_eq!(config.custom_tags, vec!["Focus".to_string()]);
    }

    #[test]
    fn failed_rename_is_a_noop() {
        let mut store = ConfigStore::in_memory();
        store.add_project_rule("Alpha", &["a"]).unwrap();
        let before = store.config();
        assert!(matches!(
            store.rename_project_rule("Alpha", ""),
            Err(TrackerError::Validation { .. })
        ));
        assert_eq!(store.config(), before);
    }

    #[test]
    fn reads_are_copies() {
        let mut store = ConfigStore::in_memory();
        store.add_project_rule("Alpha", &["a"]).unwrap();
        let mut rules = store.project_rules();
        rules[0].patterns.push("mutated".to_string());
        assert_eq!(store.project_rules()[0].patterns, vec!["a".to_string()]);
    }

    #[test]
    fn yaml_backend_round_trips() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("config.yaml");

        let mut store = ConfigStore::open(Box::new(YamlBackend::new(&path))).unwrap();
        store.add_custom_tag("urgent").unwrap();
        store.add_to_blacklist("a-9").unwrap();
        store.add_project_rule("Alpha", &["alpha", "ALPHA"]).unwrap();

        let reopened = ConfigStore::open(Box::new(YamlBackend::new(&path))).unwrap();
        assert_eq!(reopened.config(), store.config());
        assert!(reopened.is_blacklisted("A-9"));
    }

    #[test]
    fn empty_yaml_file_is_default() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("config.yaml");
        fs::write(&path, "").unwrap();
        let backend = YamlBackend::new(&path);
        assert_eq!(backend.load().unwrap(), UserConfig::default());
    }
}
