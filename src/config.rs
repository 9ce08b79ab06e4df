use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cache::SourcePolicy;
use crate::country::usecases::MAX_SELECTED;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Policy for `list` when none is given on the command line
  pub default_policy: Option<SourcePolicy>,
  /// Country selected when the user has not selected any
  #[serde(default = "default_country")]
  pub default_country: String,
  #[serde(default = "default_max_selected")]
  pub max_selected: usize,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Seconds before the stored country list is considered stale
  #[serde(default = "default_expiration_secs")]
  pub expiration_secs: i64,
  /// Keep the cache on disk; when false it lives only for this process
  #[serde(default = "default_true")]
  pub persist: bool,
  /// Database location (defaults to the user data directory)
  pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
  /// Default filter when RUST_LOG is unset
  #[serde(default = "default_log_level")]
  pub level: String,
  /// Log to stderr instead of the log file
  #[serde(default)]
  pub stderr: bool,
}

/// Largest window chrono can hold as a millisecond duration
const MAX_EXPIRATION_SECS: i64 = i64::MAX / 1000;

fn default_base_url() -> String {
  "https://restcountries.com/v3.1".to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

fn default_expiration_secs() -> i64 {
  3600
}

fn default_true() -> bool {
  true
}

fn default_country() -> String {
  "Egypt".to_string()
}

fn default_max_selected() -> usize {
  MAX_SELECTED
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      expiration_secs: default_expiration_secs(),
      persist: true,
      path: None,
    }
  }
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      stderr: false,
    }
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api: ApiConfig::default(),
      cache: CacheConfig::default(),
      default_policy: None,
      default_country: default_country(),
      max_selected: default_max_selected(),
      logging: LoggingConfig::default(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./countries.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/countries/config.yaml
  ///
  /// Without a file, defaults apply. `COUNTRIES_API_URL` overrides the API URL.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Ok(url) = std::env::var("COUNTRIES_API_URL") {
      config.api.base_url = url;
    }

    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("countries.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("countries").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    // An empty file deserializes to null
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    serde_yaml::from_str(contents)
  }

  fn validate(&self) -> Result<()> {
    if !(0..=MAX_EXPIRATION_SECS).contains(&self.cache.expiration_secs) {
      return Err(eyre!(
        "cache.expiration_secs must be between 0 and {} (got {})",
        MAX_EXPIRATION_SECS,
        self.cache.expiration_secs
      ));
    }
    if !(1..=MAX_SELECTED).contains(&self.max_selected) {
      return Err(eyre!(
        "max_selected must be between 1 and {} (got {})",
        MAX_SELECTED,
        self.max_selected
      ));
    }
    Ok(())
  }
}
