//! Release context - build once, pass everywhere
//!
//! `main.rs` resolves the working directory and the optional tagship.toml
//! once, then hands a `&ReleaseContext` to every command.

use crate::core::config::TagshipConfig;
use crate::core::error::TagshipResult;
use std::path::{Path, PathBuf};

/// Shared state for a single invocation
#[derive(Debug, Clone)]
pub struct ReleaseContext {
  /// Directory the run starts from (absolute path)
  pub root: PathBuf,

  /// Effective configuration (defaults when no file was found)
  pub config: TagshipConfig,

  /// File the configuration came from, if any
  pub config_path: Option<PathBuf>,
}

impl ReleaseContext {
  /// Build context from a root directory, loading config from the search path
  /// or from an explicit `--config` file.
  pub fn build(root: &Path, explicit_config: Option<&Path>) -> TagshipResult<Self> {
    let (config, config_path) = match explicit_config {
      Some(path) => {
        let path = if path.is_absolute() { path.to_path_buf() } else { root.join(path) };
        (TagshipConfig::load_from(&path)?, Some(path))
      }
      None => TagshipConfig::load_or_default(root)?,
    };

    if let Some(ref path) = config_path {
      tracing::debug!(config = %path.display(), "loaded configuration");
    }

    Ok(Self {
      root: root.to_path_buf(),
      config,
      config_path,
    })
  }

  /// Context with default configuration, used when no config can be read
  pub fn with_defaults(root: &Path) -> Self {
    Self {
      root: root.to_path_buf(),
      config: TagshipConfig::default(),
      config_path: None,
    }
  }
}
