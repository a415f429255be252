//! TOML configuration.
//!
//! ```toml
//! [grading]
//! alphabet = ["x", "y", "z"]
//! root_policy = "all"
//! timeout_ms = 2000
//! max_steps = 200
//! max_step_chars = 500
//!
//! [server]
//! bind = "127.0.0.1:7341"
//!
//! [db]
//! path = "./data/stepcheck.sqlite"
//! ```
//!
//! Every section is optional. Without `[db]` nothing is persisted.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use stepcheck_core::alphabet::{Alphabet, DEFAULT_SYMBOLS};
use stepcheck_core::check::RootPolicy;
use stepcheck_core::grader::Grader;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub grading: GradingConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub db: Option<DbConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GradingConfig {
    #[serde(default = "default_alphabet")]
    pub alphabet: Vec<String>,
    #[serde(default)]
    pub root_policy: RootPolicy,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default = "default_max_step_chars")]
    pub max_step_chars: usize,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            alphabet: default_alphabet(),
            root_policy: RootPolicy::default(),
            timeout_ms: default_timeout_ms(),
            max_steps: default_max_steps(),
            max_step_chars: default_max_step_chars(),
        }
    }
}

fn default_alphabet() -> Vec<String> {
    DEFAULT_SYMBOLS.iter().map(|c| c.to_string()).collect()
}
fn default_timeout_ms() -> u64 {
    2000
}
fn default_max_steps() -> usize {
    200
}
fn default_max_step_chars() -> usize {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

impl Config {
    /// Build the grader described by `[grading]`.
    pub fn grader(&self) -> Result<Grader> {
        let alphabet = Alphabet::from_names(&self.grading.alphabet)
            .context("invalid grading.alphabet")?;
        Ok(Grader::new(alphabet, self.grading.root_policy))
    }

    /// The `[db]` section, or an error naming the command that needs it.
    pub fn require_db(&self, command: &str) -> Result<&DbConfig> {
        match &self.db {
            Some(db) => Ok(db),
            None => bail!("`{}` needs a [db] section with a path in the config file", command),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path`, or fall back to defaults when it does not exist.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::default())
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.grading.alphabet.is_empty() {
        bail!("grading.alphabet must list at least one symbol");
    }
    Alphabet::from_names(&config.grading.alphabet).context("invalid grading.alphabet")?;

    if config.grading.timeout_ms == 0 {
        bail!("grading.timeout_ms must be > 0");
    }
    if config.grading.max_steps == 0 {
        bail!("grading.max_steps must be > 0");
    }
    if config.grading.max_step_chars == 0 {
        bail!("grading.max_step_chars must be > 0");
    }
    if config.server.bind.trim().is_empty() {
        bail!("server.bind must not be empty");
    }
    Ok(())
}
