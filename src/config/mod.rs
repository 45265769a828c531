//! Configuration management for `ticketdeck`.
//!
//! Two kinds of configuration live here:
//!
//! - **Settings** steer the tool itself (autosave delay, default merge
//!   policy, ...). Sources and precedence (highest wins):
//!   1. CLI overrides
//!   2. Environment variables (`TDK_*`)
//!   3. Workspace settings (`.ticketdeck/settings.yaml`)
//!   4. Defaults
//! - **User config** (custom tags, project rules, blacklist) is data the
//!   user curates. It lives in [`store::ConfigStore`], persisted to
//!   `.ticketdeck/config.yaml`.

pub mod rules;
pub mod store;

pub use rules::{ProjectRules, apply_project_rules, detect_project};
pub use store::{ConfigBackend, ConfigStore, MemoryBackend, UserConfig, YamlBackend};

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TrackerError};
use crate::model::TicketField;
use crate::storage::TaskStore;
use crate::sync::{FileSink, PolicyKind, SnapshotSink};
use crate::util::{WORKSPACE_DIR, discover_workspace};

const TASKS_FILENAME: &str = "tasks.json";
const CONFIG_FILENAME: &str = "config.yaml";
const SETTINGS_FILENAME: &str = "settings.yaml";

/// Environment variable pointing at a workspace directory.
pub const DIR_ENV: &str = "TDK_DIR";

/// Default autosave delay.
const DEFAULT_AUTOSAVE_MS: u64 = 1500;

/// Files that make up a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    pub tasks: PathBuf,
    pub config: PathBuf,
    pub settings: PathBuf,
}

impl WorkspacePaths {
    /// Paths inside an existing or future `.ticketdeck` directory.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            tasks: root.join(TASKS_FILENAME),
            config: root.join(CONFIG_FILENAME),
            settings: root.join(SETTINGS_FILENAME),
        }
    }
}

/// Locate the active `.ticketdeck` directory.
///
/// An explicit directory wins, then `TDK_DIR`, then a walk up from the CWD.
/// An explicit directory may name the workspace itself or its parent.
///
/// # Errors
///
/// Returns `NotInitialized` if no workspace is found.
pub fn find_workspace(explicit: Option<&Path>) -> Result<PathBuf> {
    let env_dir = env::var(DIR_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);

    if let Some(dir) = explicit.map(Path::to_path_buf).or(env_dir) {
        let nested = dir.join(WORKSPACE_DIR);
        if nested.is_dir() {
            return Ok(nested);
        }
        if dir.is_dir() && dir.file_name().is_some_and(|n| n == WORKSPACE_DIR) {
            return Ok(dir);
        }
        return Err(TrackerError::NotInitialized);
    }

    let cwd = env::current_dir()?;
    discover_workspace(&cwd).ok_or(TrackerError::NotInitialized)
}

// ============================================================================
// Layered settings
// ============================================================================

/// One source of settings as flat `key -> value` strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_setting_key(key), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&normalize_setting_key(key))
            .map(String::as_str)
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        let mut flat = HashMap::new();
        flatten_yaml(&value, "", &mut flat);

        let mut layer = Self::default();
        for (key, value) in flat {
            layer.insert(&key, value);
        }
        Ok(layer)
    }

    /// Build a layer from `TDK_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    /// Build a layer from explicit variables, as [`Self::from_env`] does.
    #[must_use]
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut layer = Self::default();
        for (key, value) in vars {
            let Some(stripped) = key.strip_prefix("TDK_") else {
                continue;
            };
            if stripped == "LOG" || stripped == "DIR" {
                continue;
            }
            // TDK_IMPORT_POLICY may mean `import-policy` or `import.policy`.
            let lowered = stripped.to_lowercase();
            layer.insert(&lowered.replacen('_', ".", 1), value.clone());
            layer.insert(&lowered, value);
        }
        layer
    }
}

/// CLI overrides for settings.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dir: Option<PathBuf>,
    pub json: Option<bool>,
    pub autosave_ms: Option<u64>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();
        if let Some(json) = self.json {
            layer.insert("json", json.to_string());
        }
        if let Some(ms) = self.autosave_ms {
            layer.insert("autosave-ms", ms.to_string());
        }
        layer
    }
}

/// Default settings layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    layer.insert("autosave-ms", DEFAULT_AUTOSAVE_MS.to_string());
    layer.insert("import.policy", "add");
    layer.insert("import.fields", "summary,status,priority,due-date");
    layer
}

/// Load settings with the documented precedence.
///
/// # Errors
///
/// Returns an error if the settings file cannot be read or parsed.
pub fn load_config(workspace: &Path, cli: &CliOverrides) -> Result<ConfigLayer> {
    Ok(ConfigLayer::merge_layers(&[
        default_config_layer(),
        ConfigLayer::from_yaml(&WorkspacePaths::new(workspace).settings)?,
        ConfigLayer::from_env(),
        cli.as_layer(),
    ]))
}

/// Typed view of the merged settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub autosave_delay: Duration,
    pub default_policy: PolicyKind,
    /// Fields a selective update overwrites when `--fields` is absent.
    pub update_fields: Vec<TicketField>,
    pub json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_layer(&default_config_layer()).unwrap_or(Self {
            autosave_delay: Duration::from_millis(DEFAULT_AUTOSAVE_MS),
            default_policy: PolicyKind::Add,
            update_fields: Vec::new(),
            json: false,
        })
    }
}

impl Settings {
    /// Interpret a merged layer.
    ///
    /// # Errors
    ///
    /// Returns `Config` for values that do not parse.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let autosave_ms = match layer.get("autosave-ms") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                TrackerError::Config(format!("autosave-ms must be a number, got '{raw}'"))
            })?,
            None => DEFAULT_AUTOSAVE_MS,
        };

        let default_policy = layer
            .get("import.policy")
            .map_or(Ok(PolicyKind::Add), str::parse)
            .map_err(|e| TrackerError::Config(e.to_string()))?;

        let update_fields = layer
            .get("import.fields")
            .map(parse_field_list)
            .transpose()
            .map_err(|e| TrackerError::Config(e.to_string()))?
            .unwrap_or_default();

        let json = layer.get("json").and_then(parse_bool).unwrap_or(false);

        Ok(Self {
            autosave_delay: Duration::from_millis(autosave_ms),
            default_policy,
            update_fields,
            json,
        })
    }
}

/// Parse a comma-separated list of ticket fields.
///
/// # Errors
///
/// Returns a validation error naming the first unknown field.
pub fn parse_field_list(raw: &str) -> Result<Vec<TicketField>> {
    let mut fields = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let field: TicketField = part.parse()?;
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    Ok(fields)
}

// ============================================================================
// Workspace
// ============================================================================

/// An opened workspace: settings, the store and where it persists.
#[derive(Debug)]
pub struct Workspace {
    pub paths: WorkspacePaths,
    pub settings: Settings,
    pub store: TaskStore,
    pub sink: FileSink,
}

impl Workspace {
    /// Create a new workspace under `parent`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInitialized` unless `force`, or an I/O error.
    pub fn init(parent: &Path, force: bool) -> Result<WorkspacePaths> {
        let paths = WorkspacePaths::new(&parent.join(WORKSPACE_DIR));
        if paths.tasks.exists() && !force {
            return Err(TrackerError::AlreadyInitialized { path: paths.root });
        }

        fs::create_dir_all(&paths.root)?;
        let mut store = TaskStore::new();
        store.load(Vec::new());
        FileSink::new(&paths.tasks).persist(&store.snapshot())?;
        if !paths.config.exists() {
            YamlBackend::new(&paths.config).save(&UserConfig::default())?;
        }
        if !paths.settings.exists() {
            fs::write(
                &paths.settings,
                format!(
                    "# ticketdeck settings\nautosave-ms: {DEFAULT_AUTOSAVE_MS}\nimport:\n  policy: add\n"
                ),
            )?;
        }
        debug!(root = %paths.root.display(), "Workspace initialized");
        Ok(paths)
    }

    /// Open the workspace found from `cli.dir` (or the environment / CWD).
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized`, a settings error, or a load error.
    pub fn open(cli: &CliOverrides) -> Result<Self> {
        let root = find_workspace(cli.dir.as_deref())?;
        let paths = WorkspacePaths::new(&root);
        let settings = Settings::from_layer(&load_config(&root, cli)?)?;

        let config = ConfigStore::open(Box::new(YamlBackend::new(&paths.config)))?;
        let mut store = TaskStore::with_config(config).with_autosave(settings.autosave_delay);
        let sink = FileSink::new(&paths.tasks);
        if let Some(snapshot) = sink.load()? {
            store.load(snapshot.tasks);
        } else {
            store.load(Vec::new());
        }

        debug!(
            root = %paths.root.display(),
            tasks = store.len(),
            "Workspace opened"
        );
        Ok(Self {
            paths,
            settings,
            store,
            sink,
        })
    }

    /// Persist pending changes, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    pub fn save(&mut self) -> Result<()> {
        if self.store.has_unsaved_changes() {
            self.store.flush_now(&mut self.sink)?;
        }
        Ok(())
    }
}

fn normalize_setting_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}
