//! CLI configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via RSTFSM_CONFIG or --config)
//! 3. Environment variables

use crate::error::CliError;
use rstfsm_core::{CoreError, MachineConfig, MachineConfigRaw};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Machine definition to load.
    pub machine: MachineSection,
    /// REPL configuration.
    pub repl: ReplConfig,
    /// Logging configuration.
    pub log: LogConfig,
}

impl Config {
    /// Loads configuration from `path` (or RSTFSM_CONFIG), then applies
    /// environment variable overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let env_path = std::env::var_os("RSTFSM_CONFIG").map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CliError> {
        let path = path.as_ref();
        let content = read_file(path)?;
        serde_yaml::from_str(&content).map_err(|e| CliError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Applies overrides from `lookup` (the process environment in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("RSTFSM_MACHINE") {
            self.machine.path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("RSTFSM_HISTORY_FILE") {
            self.repl.history_file = Some(PathBuf::from(path));
        }
        if let Some(prompt) = lookup("RSTFSM_PROMPT") {
            self.repl.prompt = prompt;
        }
        if let Some(level) = lookup("RSTFSM_LOG") {
            self.log.level = level;
        }
    }
}

/// Machine definition source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSection {
    /// Path to a JSON or YAML machine definition.
    pub path: Option<PathBuf>,
}

/// REPL configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    /// Line history file. Defaults to `$HOME/.rstfsm_history`.
    pub history_file: Option<PathBuf>,
    /// Prompt text.
    pub prompt: String,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            history_file: None,
            prompt: "rstfsm>".to_string(),
        }
    }
}

impl ReplConfig {
    /// Returns the history file path.
    pub fn history_path(&self) -> PathBuf {
        self.history_file.clone().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(|h| PathBuf::from(h).join(".rstfsm_history"))
                .unwrap_or_else(|_| ".rstfsm_history".into())
        })
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when RUST_LOG is unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Loads a machine definition. `.yaml`/`.yml` files are parsed as YAML,
/// everything else as JSON.
pub fn load_machine(path: impl AsRef<Path>) -> Result<MachineConfig, CliError> {
    let path = path.as_ref();
    let content = read_file(path)?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if !is_yaml {
        return Ok(MachineConfig::from_json_str(&content)?);
    }

    // null and ill-shaped documents are invalid configurations, as for JSON
    let raw: Option<MachineConfigRaw> =
        serde_yaml::from_str(&content).map_err(|e| invalid(e.to_string()))?;
    let raw = raw.ok_or_else(|| invalid("configuration is required".to_string()))?;
    Ok(MachineConfig::from_raw(raw)?)
}

fn invalid(reason: String) -> CoreError {
    CoreError::InvalidConfiguration { reason }
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}
