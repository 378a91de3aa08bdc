//! Configuration loading
//!
//! Reads `rules.yaml`, fills in defaults, compiles the placement rules and
//! pulls in the knowledge base. Everything returned from here is ready to
//! use; any error is fatal at startup.
//!
//! ```yaml
//! options:
//!   preserve_structure: false
//!   knowledge_base: notes/kb.md
//!   watch_dir: entropy
//! ignore:
//!   os_defaults: true
//!   files: [keep.me]
//!   extensions: [.tmp, .crdownload]
//!   folders: [node_modules]
//! rules:
//!   - pattern: '.*invoice.*\.pdf$'
//!     target: Documents/Finance/Invoices
//! gpt:
//!   enabled: true
//!   model: gemini-2.0-flash
//!   instructions: Sort my downloads into sensible folders.
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::ai::{SuggestionConfig, DEFAULT_QUEUE_CAPACITY};
use crate::rules::{IgnoreSpec, Rule, RuleError, RuleSet};

pub const DEFAULT_CONFIG_PATH: &str = "rules.yaml";
pub const CONFIG_PATH_ENV: &str = "ENTROPY_CONFIG";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_WATCH_DIR: &str = "entropy";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Couldn't open config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("AI suggestions are enabled but no API key is set (gpt.api_key or GEMINI_API_KEY)")]
    MissingApiKey,

    #[error("AI suggestions are enabled but gpt.model is blank")]
    MissingModel,
}

/// On-disk layout of the config file
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    options: RawOptions,
    #[serde(default)]
    ignore: IgnoreSpec,
    #[serde(default)]
    rules: Vec<Rule>,
    #[serde(default)]
    gpt: RawGpt,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawOptions {
    preserve_structure: bool,
    knowledge_base: String,
    watch_dir: String,
    settle_delay_ms: u64,
    rate_limit_secs: u64,
    queue_capacity: usize,
}

impl Default for RawOptions {
    fn default() -> Self {
        Self {
            preserve_structure: false,
            knowledge_base: String::new(),
            watch_dir: DEFAULT_WATCH_DIR.to_string(),
            settle_delay_ms: 500,
            rate_limit_secs: 3,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawGpt {
    enabled: bool,
    api_key: String,
    model: String,
    instructions: String,
}

impl Default for RawGpt {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            instructions: String::new(),
        }
    }
}

/// Validated, ready-to-run configuration
#[derive(Debug, Clone)]
pub struct Settings {
    /// Watched folder, as configured (not yet created or canonicalized)
    pub root: PathBuf,
    pub preserve_structure: bool,
    pub settle_delay: Duration,
    pub rate_interval: Duration,
    pub queue_capacity: usize,
    pub ignore: IgnoreSpec,
    pub rules: RuleSet,
    pub suggestions: SuggestionConfig,
    /// Present whenever suggestions are enabled
    pub api_key: Option<String>,
}

/// Path of the config file: first CLI argument, then `ENTROPY_CONFIG`, then `rules.yaml`
pub fn config_path(arg: Option<String>) -> PathBuf {
    arg.or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Read and validate a config file
pub fn load(path: &Path) -> Result<Settings, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse(&text, std::env::var(API_KEY_ENV).ok())
}

/// Validate config text. `env_api_key` is used when `gpt.api_key` is blank.
pub fn parse(text: &str, env_api_key: Option<String>) -> Result<Settings, ConfigError> {
    let raw: RawConfig = serde_yaml::from_str(text)?;

    let rules = RuleSet::compile(&raw.rules)?;

    let api_key = Some(raw.gpt.api_key.trim().to_string())
        .filter(|k| !k.is_empty())
        .or_else(|| env_api_key.filter(|k| !k.trim().is_empty()));

    if raw.gpt.enabled {
        if api_key.is_none() {
            return Err(ConfigError::MissingApiKey);
        }
        if raw.gpt.model.trim().is_empty() {
            return Err(ConfigError::MissingModel);
        }
    }

    let knowledge_base = load_knowledge_base(&raw.options.knowledge_base);

    Ok(Settings {
        root: expand_home(&raw.options.watch_dir),
        preserve_structure: raw.options.preserve_structure,
        settle_delay: Duration::from_millis(raw.options.settle_delay_ms),
        rate_interval: Duration::from_secs(raw.options.rate_limit_secs),
        queue_capacity: raw.options.queue_capacity.max(1),
        ignore: raw.ignore,
        rules,
        suggestions: SuggestionConfig {
            enabled: raw.gpt.enabled,
            model: raw.gpt.model.trim().to_string(),
            instructions: raw.gpt.instructions,
            knowledge_base,
            preserve_structure: raw.options.preserve_structure,
        },
        api_key,
    })
}

/// Read the knowledge base file. Missing or unreadable means no knowledge base.
pub fn load_knowledge_base(path: &str) -> String {
    if path.trim().is_empty() {
        return String::new();
    }

    let path = expand_home(path);
    match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Could not read knowledge base {}: {}", path.display(), e);
            String::new()
        }
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
