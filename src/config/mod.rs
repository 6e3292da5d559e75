#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::core::classify::{
    self, Classifier, DEFAULT_PREFIX, DEFAULT_SEPARATOR, KeywordRule,
};
use crate::core::record::{Frequency, TaskType};
use crate::core::schedule::{self, DEFAULT_STAGGER_WINDOW};
use crate::error::ImportError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub schedule: ScheduleConfig,
    pub classifier: ClassifierConfig,
    pub output: OutputConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// 1-based column holding the task description.
    pub description_column: usize,
    pub header_rows: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            description_column: 1,
            header_rows: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleConfig {
    pub stagger_window: u32,
    pub stagger_per_sheet: bool,
    /// Fixed YYYY-MM-DD start date; empty means today.
    pub start_date: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            stagger_window: DEFAULT_STAGGER_WINDOW,
            stagger_per_sheet: false,
            start_date: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub prefix: String,
    pub separator: String,
    pub default_frequency: Frequency,
    pub default_task_type: TaskType,
    pub frequency_rules: Vec<KeywordRule<Frequency>>,
    pub task_type_rules: Vec<KeywordRule<TaskType>>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_owned(),
            separator: DEFAULT_SEPARATOR.to_owned(),
            default_frequency: Frequency::Weekly,
            default_task_type: TaskType::Inspection,
            frequency_rules: classify::default_frequency_rules(),
            task_type_rules: classify::default_task_type_rules(),
        }
    }
}

impl ClassifierConfig {
    #[must_use]
    pub fn build(&self) -> Classifier {
        Classifier::new(
            &self.prefix,
            &self.separator,
            self.frequency_rules.clone(),
            self.default_frequency,
            self.task_type_rules.clone(),
            self.default_task_type,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub json_path: String,
    pub html_path: String,
    pub write_html: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_path: "imported_ppm_tasks.json".to_owned(),
            html_path: "import_tasks.html".to_owned(),
            write_html: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    pub title: String,
    pub collection: String,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub config_script: String,
    pub app_page: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            title: "Import Tasks - AGL Tracking".to_owned(),
            collection: "ppmTasks".to_owned(),
            batch_size: 10,
            batch_delay_ms: 100,
            config_script: "firebase-config.js".to_owned(),
            app_page: "index.html".to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_file: PathBuf,
}

pub fn default_paths() -> anyhow::Result<ConfigPaths> {
    let unix = home_config_path_unix();
    if !cfg!(windows) {
        return Ok(ConfigPaths { config_file: unix });
    }

    // Windows: prefer the Unix-style path if present for portability.
    if unix.exists() {
        return Ok(ConfigPaths { config_file: unix });
    }

    let proj = ProjectDirs::from("com", "ppm-import", "ppm-import")
        .context("failed to determine platform config directory")?;
    Ok(ConfigPaths {
        config_file: proj.config_dir().join("config.toml"),
    })
}

/// `--config` wins over the per-user default location.
pub fn resolve_paths(override_path: Option<&Path>) -> anyhow::Result<ConfigPaths> {
    match override_path {
        Some(p) => Ok(ConfigPaths {
            config_file: p.to_path_buf(),
        }),
        None => default_paths(),
    }
}

fn home_config_path_unix() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("~"));
    home.join(".config").join("ppm-import").join("config.toml")
}

fn home_dir() -> Option<PathBuf> {
    if let Some(v) = std::env::var_os("HOME") {
        return Some(PathBuf::from(v));
    }
    if let Some(v) = std::env::var_os("USERPROFILE") {
        return Some(PathBuf::from(v));
    }
    let drive = std::env::var_os("HOMEDRIVE");
    let path = std::env::var_os("HOMEPATH");
    match (drive, path) {
        (Some(d), Some(p)) => Some(PathBuf::from(d).join(PathBuf::from(p))),
        _ => None,
    }
}

#[must_use]
pub fn expand_tilde(input: &str) -> String {
    if let Some(rest) = input.strip_prefix("~/")
        && let Some(home) = home_dir()
    {
        return home.join(rest).to_string_lossy().to_string();
    }
    input.to_owned()
}

/// Expands `~` and `$VAR`; relative paths stay relative to the working
/// directory.
#[must_use]
pub fn expand_path(input: &str) -> PathBuf {
    PathBuf::from(expand_env_vars(&expand_tilde(input)))
}

fn expand_env_vars(input: &str) -> String {
    // Expand $VAR and ${VAR}. Leave unknown vars untouched.
    let Ok(re) = regex::Regex::new(r"\$\{?([A-Za-z_][A-Za-z0-9_]*)\}?") else {
        return input.to_owned();
    };
    re.replace_all(input, |caps: &regex::Captures<'_>| {
        let key = &caps[1];
        std::env::var(key).unwrap_or_else(|_| caps[0].to_owned())
    })
    .to_string()
}

pub fn load(override_path: Option<&Path>) -> anyhow::Result<(Config, ConfigPaths)> {
    let paths = resolve_paths(override_path)?;
    let (_doc, cfg) = load_from_file(&paths.config_file)?;
    cfg.validate()?;
    Ok((cfg, paths))
}

pub fn list_resolved_toml(override_path: Option<&Path>) -> anyhow::Result<String> {
    let (cfg, _paths) = load(override_path)?;
    Ok(toml::to_string_pretty(&cfg)?)
}

fn load_from_file(path: &Path) -> anyhow::Result<(toml_edit::DocumentMut, Config)> {
    if !path.exists() {
        return Ok((toml_edit::DocumentMut::new(), Config::default()));
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let doc = raw
        .parse::<toml_edit::DocumentMut>()
        .with_context(|| format!("failed to parse TOML in {}", path.display()))?;

    let cfg: Config = toml::from_str(&raw)
        .with_context(|| format!("failed to deserialize TOML in {}", path.display()))?;
    Ok((doc, cfg))
}

pub fn get_value_string_at_path(path: &Path, key: &str) -> anyhow::Result<Option<String>> {
    let (_doc, cfg) = load_from_file(path)?;
    cfg.validate()?;

    let value = lookup_value(&cfg, key.trim());
    Ok(value.map(format_value_for_stdout))
}

pub fn set_value_string_at_path(path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let (mut doc, cfg) = load_from_file(path)?;
    cfg.validate()?;

    let (norm_key, value_item) = parse_value_for_key(key, value)?;
    apply_set(&mut doc, &norm_key, value_item)?;

    // Validate by re-parsing the updated doc into a Config.
    let new_raw = doc.to_string();
    let new_cfg: Config = toml::from_str(&new_raw)
        .with_context(|| format!("config update produced invalid TOML for {}", path.display()))?;
    new_cfg.validate()?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, new_raw.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(())
}

impl Config {
    pub fn validate(&self) -> Result<(), ImportError> {
        if self.input.description_column == 0 {
            return Err(ImportError::Config(
                "input.description_column must be >= 1".to_owned(),
            ));
        }
        if self.schedule.stagger_window == 0 {
            return Err(ImportError::Config(
                "schedule.stagger_window must be >= 1".to_owned(),
            ));
        }
        if !self.schedule.start_date.trim().is_empty() {
            schedule::parse_iso_date(&self.schedule.start_date).map_err(|_| {
                ImportError::Config(format!(
                    "schedule.start_date must be YYYY-MM-DD, got '{}'",
                    self.schedule.start_date
                ))
            })?;
        }
        if self.classifier.separator.is_empty() {
            return Err(ImportError::Config(
                "classifier.separator must not be empty".to_owned(),
            ));
        }
        if rules_have_empty_keywords(&self.classifier.frequency_rules) {
            return Err(ImportError::Config(
                "classifier.frequency_rules entries need at least one non-empty keyword"
                    .to_owned(),
            ));
        }
        if rules_have_empty_keywords(&self.classifier.task_type_rules) {
            return Err(ImportError::Config(
                "classifier.task_type_rules entries need at least one non-empty keyword"
                    .to_owned(),
            ));
        }
        if self.output.json_path.trim().is_empty() {
            return Err(ImportError::Config(
                "output.json_path must not be empty".to_owned(),
            ));
        }
        if self.upload.batch_size == 0 {
            return Err(ImportError::Config(
                "upload.batch_size must be >= 1".to_owned(),
            ));
        }
        if self.upload.collection.trim().is_empty() {
            return Err(ImportError::Config(
                "upload.collection must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

fn rules_have_empty_keywords<T>(rules: &[KeywordRule<T>]) -> bool {
    rules
        .iter()
        .any(|r| r.keywords.is_empty() || r.keywords.iter().any(String::is_empty))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyType {
    Bool,
    Int,
    String,
    Date,
    Frequency,
    TaskType,
}

fn parse_value_for_key(key: &str, value: &str) -> anyhow::Result<(String, toml_edit::Item)> {
    let key = key.trim();
    if key == "classifier.frequency_rules" || key == "classifier.task_type_rules" {
        return Err(ImportError::InvalidConfigValue {
            key: key.to_owned(),
            msg: "keyword rules are edited in the config file as [[classifier.frequency_rules]] / [[classifier.task_type_rules]] tables".to_owned(),
        }
        .into());
    }
    let key_type = key_type(key).ok_or_else(|| ImportError::InvalidConfigKey(key.to_owned()))?;
    let invalid = |msg: String| ImportError::InvalidConfigValue {
        key: key.to_owned(),
        msg,
    };
    let item = match key_type {
        KeyType::Bool => toml_edit::value(parse_bool(value).map_err(invalid)?),
        KeyType::Int => toml_edit::value(parse_int(value).map_err(invalid)?),
        KeyType::String => toml_edit::value(value),
        KeyType::Date => {
            let v = value.trim();
            if !v.is_empty() {
                schedule::parse_iso_date(v).map_err(|e| invalid(e.to_string()))?;
            }
            toml_edit::value(v)
        }
        KeyType::Frequency => {
            let Some(f) = Frequency::from_label(value) else {
                let allowed = Frequency::ALL.map(Frequency::as_str).join(", ");
                return Err(invalid(format!("must be one of: {allowed}")).into());
            };
            toml_edit::value(f.as_str())
        }
        KeyType::TaskType => {
            let Some(t) = TaskType::from_label(value) else {
                let allowed = TaskType::ALL.map(TaskType::as_str).join(", ");
                return Err(invalid(format!("must be one of: {allowed}")).into());
            };
            toml_edit::value(t.as_str())
        }
    };

    Ok((key.to_owned(), item))
}

fn key_type(key: &str) -> Option<KeyType> {
    Some(match key {
        "classifier.prefix"
        | "classifier.separator"
        | "output.json_path"
        | "output.html_path"
        | "upload.title"
        | "upload.collection"
        | "upload.config_script"
        | "upload.app_page" => KeyType::String,

        "output.write_html" | "schedule.stagger_per_sheet" => KeyType::Bool,

        "input.description_column"
        | "input.header_rows"
        | "schedule.stagger_window"
        | "upload.batch_size"
        | "upload.batch_delay_ms" => KeyType::Int,

        "schedule.start_date" => KeyType::Date,

        "classifier.default_frequency" => KeyType::Frequency,
        "classifier.default_task_type" => KeyType::TaskType,

        _ => return None,
    })
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(format!("expected true|false, got '{other}'")),
    }
}

fn parse_int(s: &str) -> Result<i64, String> {
    let n = s
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("expected integer, got '{s}': {e}"))?;
    if n < 0 {
        return Err(format!("expected a non-negative integer, got {n}"));
    }
    Ok(n)
}

fn apply_set(
    doc: &mut toml_edit::DocumentMut,
    key: &str,
    value: toml_edit::Item,
) -> anyhow::Result<()> {
    let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
    if parts.is_empty() {
        return Err(ImportError::InvalidConfigKey(key.to_owned()).into());
    }

    let mut cur = doc.as_table_mut();
    for seg in &parts[..parts.len().saturating_sub(1)] {
        if !cur.contains_key(seg) {
            let mut t = toml_edit::Table::new();
            t.set_implicit(true);
            cur.insert(seg, toml_edit::Item::Table(t));
        }
        cur = cur[seg].as_table_mut().ok_or_else(|| {
            ImportError::Config(format!("cannot set {key}: '{seg}' is not a table"))
        })?;
    }

    let leaf = parts[parts.len() - 1];
    cur.insert(leaf, value);
    Ok(())
}

fn lookup_value(cfg: &Config, key: &str) -> Option<serde_json::Value> {
    let mut v = serde_json::to_value(cfg).ok()?;
    for seg in key.split('.').filter(|s| !s.is_empty()) {
        match v {
            serde_json::Value::Object(mut map) => {
                v = map.remove(seg)?;
            }
            _ => return None,
        }
    }
    Some(v)
}

fn format_value_for_stdout(v: serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "null".to_owned(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s,
        other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
    }
}
