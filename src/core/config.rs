use crate::core::error::{ConfigError, ResultExt, TagshipResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default environment variable holding the registry token
pub const DEFAULT_TOKEN_ENV: &str = "CARGO_REGISTRY_TOKEN";

/// Configuration for cargo-tagship
/// Searched in order: tagship.toml, .tagship.toml, .cargo/tagship.toml, .config/tagship.toml
///
/// Every field has a default, so a workspace without a config file behaves like
/// the stock "bump version and `cargo publish`" job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagshipConfig {
  #[serde(default)]
  pub release: ReleaseSettings,
  #[serde(default)]
  pub publish: PublishSettings,
}

/// How the tag maps onto the manifest
///
/// # Example
///
/// ```toml
/// [release]
/// manifest = "crates/my-crate/Cargo.toml"
/// strip_prefix = "v"
/// require_semver = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseSettings {
  /// Manifest to rewrite, relative to the directory the run starts in
  #[serde(default = "default_manifest")]
  pub manifest: PathBuf,

  /// Prefix removed from tags before use (`v1.2.3` -> `1.2.3`); empty disables
  #[serde(default = "default_strip_prefix")]
  pub strip_prefix: String,

  /// Reject tags that are not semantic versions instead of warning
  #[serde(default)]
  pub require_semver: bool,
}

fn default_manifest() -> PathBuf {
  PathBuf::from("Cargo.toml")
}

fn default_strip_prefix() -> String {
  "v".to_string()
}

impl Default for ReleaseSettings {
  fn default() -> Self {
    Self {
      manifest: default_manifest(),
      strip_prefix: default_strip_prefix(),
      require_semver: false,
    }
  }
}

/// External publish command settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishSettings {
  /// Program and leading arguments (default: `cargo publish`)
  #[serde(default = "default_command")]
  pub command: Vec<String>,

  /// Extra arguments appended after the built-in ones
  #[serde(default)]
  pub args: Vec<String>,

  /// Environment variable the token is read from
  #[serde(default = "default_token_env")]
  pub token_env: String,

  /// Override for CARGO_REGISTRIES_CRATES_IO_PROTOCOL; unset leaves the inherited value alone
  #[serde(default)]
  pub registry_protocol: Option<String>,

  /// Pass `--allow-dirty`; the rewritten manifest is never committed
  #[serde(default = "default_allow_dirty")]
  pub allow_dirty: bool,
}

fn default_command() -> Vec<String> {
  vec!["cargo".to_string(), "publish".to_string()]
}

fn default_token_env() -> String {
  DEFAULT_TOKEN_ENV.to_string()
}

fn default_allow_dirty() -> bool {
  true
}

impl Default for PublishSettings {
  fn default() -> Self {
    Self {
      command: default_command(),
      args: Vec::new(),
      token_env: default_token_env(),
      registry_protocol: None,
      allow_dirty: default_allow_dirty(),
    }
  }
}

impl PublishSettings {
  fn validate(&self) -> Result<(), String> {
    match self.command.first() {
      None => return Err("publish.command must name a program".to_string()),
      Some(program) if program.trim().is_empty() => {
        return Err("publish.command must name a program".to_string());
      }
      Some(_) => {}
    }

    if self.token_env.is_empty() || self.token_env.contains('=') || self.token_env.contains('\0') {
      return Err(format!("publish.token_env '{}' is not a valid variable name", self.token_env));
    }

    if let Some(ref protocol) = self.registry_protocol {
      match protocol.as_str() {
        "sparse" | "git" => {}
        _ => {
          return Err(format!(
            "Invalid registry_protocol '{}'. Must be 'sparse' or 'git'",
            protocol
          ));
        }
      }
    }

    Ok(())
  }
}

impl TagshipConfig {
  /// Find config file in search order: tagship.toml, .tagship.toml, .cargo/tagship.toml, .config/tagship.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("tagship.toml"),
      path.join(".tagship.toml"),
      path.join(".cargo").join("tagship.toml"),
      path.join(".config").join("tagship.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from the first search location, or defaults when none exists
  pub fn load_or_default(path: &Path) -> TagshipResult<(Self, Option<PathBuf>)> {
    match Self::find_config_path(path) {
      Some(config_path) => {
        let config = Self::load_from(&config_path)?;
        Ok((config, Some(config_path)))
      }
      None => Ok((Self::default(), None)),
    }
  }

  /// Load and validate a specific config file
  pub fn load_from(config_path: &Path) -> TagshipResult<Self> {
    let content = fs::read_to_string(config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: TagshipConfig = toml_edit::de::from_str(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config.publish.validate().map_err(|reason| ConfigError::Invalid {
      path: config_path.to_path_buf(),
      reason,
    })?;

    Ok(config)
  }
}
