//! Check trait abstraction for preflight checks
//!
//! All checks implement the `Check` trait, so `doctor` can run them as a batch
//! and report every problem at once instead of failing on the first.

use crate::core::config::TagshipConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Severity level for check results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
  /// Informational message (not an issue)
  Info,
  /// Warning (non-blocking, but should be addressed)
  Warning,
  /// Error (blocking, must be fixed)
  Error,
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Severity::Info => write!(f, "INFO"),
      Severity::Warning => write!(f, "WARN"),
      Severity::Error => write!(f, "ERROR"),
    }
  }
}

/// Result of running a check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
  /// Name of the check that ran
  pub check_name: String,
  /// Whether the check passed
  pub passed: bool,
  /// Severity level (if failed)
  pub severity: Severity,
  /// Human-readable message
  pub message: String,
  /// Optional suggested fix
  pub suggestion: Option<String>,
}

impl CheckResult {
  /// Create a passing check result
  pub fn pass(check_name: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      check_name: check_name.into(),
      passed: true,
      severity: Severity::Info,
      message: message.into(),
      suggestion: None,
    }
  }

  /// Create a failing check result with error severity
  pub fn error(
    check_name: impl Into<String>,
    message: impl Into<String>,
    suggestion: Option<impl Into<String>>,
  ) -> Self {
    Self {
      check_name: check_name.into(),
      passed: false,
      severity: Severity::Error,
      message: message.into(),
      suggestion: suggestion.map(|s| s.into()),
    }
  }

  /// Create a failing check result with warning severity
  pub fn warning(
    check_name: impl Into<String>,
    message: impl Into<String>,
    suggestion: Option<impl Into<String>>,
  ) -> Self {
    Self {
      check_name: check_name.into(),
      passed: false,
      severity: Severity::Warning,
      message: message.into(),
      suggestion: suggestion.map(|s| s.into()),
    }
  }
}

/// Context passed to checks
#[derive(Debug, Clone)]
pub struct CheckContext {
  /// Directory the release would run from
  pub root: PathBuf,
  /// Effective configuration
  pub config: TagshipConfig,
  /// File the configuration came from; `None` means defaults
  pub config_path: Option<PathBuf>,
  /// Error from loading tagship.toml, if it failed
  pub config_error: Option<String>,
  /// Whether a dry run is planned (token becomes optional)
  pub dry_run: bool,
}

impl CheckContext {
  /// Manifest path as the run would resolve it
  pub fn manifest_path(&self) -> PathBuf {
    crate::release::checkout::resolve_manifest(&self.root, &self.config.release.manifest)
  }
}

/// Preflight check
///
/// Each check implements this trait to provide validation logic.
/// Checks are run in batch via the CheckRunner.
pub trait Check: Send + Sync {
  /// Unique name for this check (kebab-case)
  fn name(&self) -> &str;

  /// Human-readable description of what this check validates
  fn description(&self) -> &str;

  /// Run the check and return a result
  fn run(&self, ctx: &CheckContext) -> anyhow::Result<CheckResult>;
}
