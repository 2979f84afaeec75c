//! Client configuration: optional TOML file layered under `WALKBUDDY_*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use serde::Deserialize;
use walkbuddy_store_sqlite::DEFAULT_MIN_PASSWORD_LENGTH;

/// Runtime client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
  /// SQLite file holding identities, the current session and profiles.
  pub database_path:       PathBuf,
  pub min_password_length: usize,
  /// How long login/logout wait for the session to reflect the change.
  pub settle_timeout_secs: u64,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      database_path:       PathBuf::from("~/.local/share/walkbuddy/walkbuddy.db"),
      min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
      settle_timeout_secs: 10,
    }
  }
}

impl ClientConfig {
  /// Load from `path` (missing file is fine) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("WALKBUDDY"))
      .build()
      .context("failed to read config file")?;
    Self::from_settings(settings)
  }

  fn from_settings(settings: config::Config) -> anyhow::Result<Self> {
    let mut cfg: ClientConfig = settings
      .try_deserialize()
      .context("failed to deserialise ClientConfig")?;
    cfg.database_path = expand_tilde(&cfg.database_path);
    Ok(cfg)
  }

  pub fn settle_timeout(&self) -> Duration { Duration::from_secs(self.settle_timeout_secs) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
