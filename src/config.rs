//! Configuration primitives for the maternity intake assistant.
//!
//! Stored in a TOML file under the workspace root:
//!   $MATERNITY_INTAKE_HOME/config/config.toml when the variable is set
//!   `<OS data dir>/MaternityIntake/config/config.toml` otherwise
//!
//! Every field has a default so an absent or partial file is valid.

use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the workspace root.
pub const HOME_ENV_VAR: &str = "MATERNITY_INTAKE_HOME";

/// Standard relative path to the config file (resolved per OS at runtime).
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Root configuration persisted per installation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Interview behaviour (name rules, clarification budget, idle expiry).
    #[serde(default)]
    pub intake: IntakeSettings,
    /// Normalizer strategy and resource overrides.
    #[serde(default)]
    pub normalizer: NormalizerSettings,
    /// Where completed intakes are written.
    #[serde(default)]
    pub persistence: PersistenceSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeSettings {
    /// Whitespace-separated parts required in the full name.
    #[serde(default = "default_min_name_tokens")]
    pub min_name_tokens: usize,
    /// Clarifying re-prompts before a choice answer is stored as raw text.
    #[serde(default = "default_clarification_attempts")]
    pub clarification_attempts: u8,
    /// Sessions idle for longer than this are dropped. Disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_idle_minutes: Option<u32>,
}

impl Default for IntakeSettings {
    fn default() -> Self {
        Self {
            min_name_tokens: default_min_name_tokens(),
            clarification_attempts: default_clarification_attempts(),
            session_idle_minutes: None,
        }
    }
}

const fn default_min_name_tokens() -> usize {
    2
}

const fn default_clarification_attempts() -> u8 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizerStrategy {
    /// Lemma strategy when the lemma table loads, keyword otherwise.
    #[default]
    Auto,
    Keyword,
    Lemma,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizerSettings {
    #[serde(default)]
    pub strategy: NormalizerStrategy,
    /// Replaces the embedded synonym table. Relative paths resolve against the workspace root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms_path: Option<PathBuf>,
    /// Defaults to `resources/lemmas.toml` under the workspace root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma_table_path: Option<PathBuf>,
}

impl NormalizerSettings {
    pub fn lemma_table_file(&self, workspace_root: &Path) -> PathBuf {
        match &self.lemma_table_path {
            Some(path) => resolve(workspace_root, path),
            None => workspace_root.join("resources").join("lemmas.toml"),
        }
    }

    pub fn synonyms_file(&self, workspace_root: &Path) -> Option<PathBuf> {
        self.synonyms_path
            .as_deref()
            .map(|path| resolve(workspace_root, path))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordFormat {
    #[default]
    Jsonl,
    Csv,
}

impl RecordFormat {
    pub fn extension(self) -> &'static str {
        match self {
            RecordFormat::Jsonl => "jsonl",
            RecordFormat::Csv => "csv",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistenceSettings {
    #[serde(default)]
    pub format: RecordFormat,
    /// Defaults to `records/intakes.<ext>` under the workspace root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records_file: Option<PathBuf>,
}

impl PersistenceSettings {
    pub fn records_path(&self, workspace_root: &Path) -> PathBuf {
        match &self.records_file {
            Some(path) => resolve(workspace_root, path),
            None => workspace_root
                .join("records")
                .join(format!("intakes.{}", self.format.extension())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing-subscriber` filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "maternity_intake=info".to_string()
}

fn resolve(workspace_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace_root.join(path)
    }
}

/// Returns the root directory where the assistant stores data.
///
/// Order of precedence:
/// 1. `MATERNITY_INTAKE_HOME` environment variable.
/// 2. OS-specific data directory via `directories::BaseDirs`.
pub fn workspace_root() -> Result<PathBuf> {
    if let Ok(path) = env::var(HOME_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }
    let base_dirs = BaseDirs::new().context("Unable to determine OS data directory")?;
    Ok(base_dirs.data_dir().join("MaternityIntake"))
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(workspace_root()?.join("config"))
}

/// Path to the config file.
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Loads the configuration from disk or returns defaults.
pub fn load_or_default() -> Result<AppConfig> {
    let path = config_file_path()?;
    if path.exists() {
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let cfg: AppConfig = toml::from_str(&data)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        Ok(cfg)
    } else {
        Ok(AppConfig::default())
    }
}

/// Persists the configuration to disk.
pub fn save(config: &AppConfig) -> Result<()> {
    let dir = config_dir()?;
    fs::create_dir_all(&dir)?;
    let path = config_file_path()?;
    let data = toml::to_string_pretty(config)?;
    fs::write(&path, data)?;
    Ok(())
}
