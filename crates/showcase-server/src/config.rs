//! Runtime configuration: built-in defaults, then `config.toml`, then
//! `SHOWCASE_*` environment variables.

use std::path::{Path, PathBuf};

use config::{ConfigError, Environment, File, Source};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_path:        PathBuf,
  pub session_ttl_hours: i64,
}

impl ServerConfig {
  /// Load from `path` (optional) layered with the environment.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::layered(File::from(path).required(false))
  }

  fn layered(file: impl Source + Send + Sync + 'static) -> Result<Self, ConfigError> {
    config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8080_i64)?
      .set_default("store_path", "~/.local/share/showcase/showcase.db")?
      .set_default("session_ttl_hours", 168_i64)?
      .add_source(file)
      .add_source(Environment::with_prefix("SHOWCASE"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
