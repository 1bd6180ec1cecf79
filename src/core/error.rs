//! Error types for cargo-tagship with contextual messages and exit codes
//!
//! Every step of a release run has its own error category so the process exit
//! code tells the operator which step failed. Errors carry an optional help
//! line pointing at the usual fix.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for cargo-tagship
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing tag or token)
  User = 1,
  /// System error (I/O, serialization)
  System = 2,
  /// Source tree could not be acquired
  Checkout = 3,
  /// Manifest has no usable version line
  Manifest = 4,
  /// Publish command failed without an exit status of its own
  Publish = 5,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for cargo-tagship
#[derive(Debug)]
pub enum TagshipError {
  /// Configuration and input errors
  Config(ConfigError),

  /// Acquiring the source tree
  Checkout(CheckoutError),

  /// Rewriting the manifest version line
  ManifestFormat(ManifestFormatError),

  /// The external publish command
  Publish(PublishError),

  /// I/O errors
  Io {
    source: io::Error,
    context: Option<String>,
  },

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl TagshipError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    TagshipError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    TagshipError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      TagshipError::Message { message, context, help } => TagshipError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      TagshipError::Io { source, context } => TagshipError::Io {
        source,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
      },
      _ => self,
    }
  }

  /// Get the error category for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      TagshipError::Config(_) => ExitCode::User,
      TagshipError::Checkout(_) => ExitCode::Checkout,
      TagshipError::ManifestFormat(_) => ExitCode::Manifest,
      TagshipError::Publish(_) => ExitCode::Publish,
      TagshipError::Io { .. } => ExitCode::System,
      TagshipError::Message { .. } => ExitCode::User,
    }
  }

  /// Process status to exit with
  ///
  /// A failed publish propagates the publish command's own non-zero status.
  pub fn status_code(&self) -> i32 {
    match self {
      TagshipError::Publish(PublishError {
        status: Some(code), ..
      }) if *code != 0 => *code,
      _ => self.exit_code().as_i32(),
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      TagshipError::Config(e) => e.help_message(),
      TagshipError::Checkout(e) => e.help_message(),
      TagshipError::ManifestFormat(e) => e.help_message(),
      TagshipError::Publish(e) => e.help_message(),
      TagshipError::Message { help, .. } => help.clone(),
      TagshipError::Io { .. } => None,
    }
  }
}

impl fmt::Display for TagshipError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TagshipError::Config(e) => write!(f, "{}", e),
      TagshipError::Checkout(e) => write!(f, "{}", e),
      TagshipError::ManifestFormat(e) => write!(f, "{}", e),
      TagshipError::Publish(e) => write!(f, "{}", e),
      TagshipError::Io { source, context } => {
        write!(f, "I/O error: {}", source)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
      TagshipError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for TagshipError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      TagshipError::Io { source, .. } => Some(source),
      _ => None,
    }
  }
}

impl From<io::Error> for TagshipError {
  fn from(err: io::Error) -> Self {
    TagshipError::Io {
      source: err,
      context: None,
    }
  }
}

impl From<String> for TagshipError {
  fn from(msg: String) -> Self {
    TagshipError::message(msg)
  }
}

impl From<&str> for TagshipError {
  fn from(msg: &str) -> Self {
    TagshipError::message(msg)
  }
}

impl From<toml_edit::de::Error> for TagshipError {
  fn from(err: toml_edit::de::Error) -> Self {
    TagshipError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for TagshipError {
  fn from(err: serde_json::Error) -> Self {
    TagshipError::message(format!("JSON error: {}", err))
  }
}

impl From<ConfigError> for TagshipError {
  fn from(err: ConfigError) -> Self {
    TagshipError::Config(err)
  }
}

impl From<CheckoutError> for TagshipError {
  fn from(err: CheckoutError) -> Self {
    TagshipError::Checkout(err)
  }
}

impl From<ManifestFormatError> for TagshipError {
  fn from(err: ManifestFormatError) -> Self {
    TagshipError::ManifestFormat(err)
  }
}

impl From<PublishError> for TagshipError {
  fn from(err: PublishError) -> Self {
    TagshipError::Publish(err)
  }
}

/// Configuration and input errors
#[derive(Debug)]
pub enum ConfigError {
  /// tagship.toml failed validation
  Invalid { path: PathBuf, reason: String },

  /// No release tag on the command line or in the CI environment
  MissingTag,

  /// Tag rejected before any step ran
  InvalidTag { tag: String, reason: String },

  /// Registry token variable unset or empty
  MissingToken { env: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::Invalid { path, .. } => Some(format!("Fix the configuration in {}", path.display())),
      ConfigError::MissingTag => Some(
        "Pass --tag <version>, or run from a tag-triggered CI job that sets GITHUB_REF_NAME.".to_string(),
      ),
      ConfigError::InvalidTag { .. } => {
        Some("Use a semantic version tag such as 1.2.3 or v1.2.3, or set release.require_semver = false.".to_string())
      }
      ConfigError::MissingToken { env } => Some(format!(
        "Set {} to a registry API token (for example from a CI secret).",
        env
      )),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Invalid { path, reason } => {
        write!(f, "Invalid configuration in {}: {}", path.display(), reason)
      }
      ConfigError::MissingTag => write!(f, "No release tag given"),
      ConfigError::InvalidTag { tag, reason } => write!(f, "Invalid release tag '{}': {}", tag, reason),
      ConfigError::MissingToken { env } => {
        write!(f, "Registry token not found: environment variable {} is unset or empty", env)
      }
    }
  }
}

/// Errors acquiring the source tree
#[derive(Debug)]
pub enum CheckoutError {
  /// Working directory is not inside a git work tree
  NotARepository { path: PathBuf },

  /// Requested revision does not resolve to a commit
  RevisionNotFound { rev: String, stderr: String },

  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Manifest file is absent from the tree
  ManifestMissing { path: PathBuf },

  /// Manifest file cannot be written
  ManifestReadOnly { path: PathBuf },
}

impl CheckoutError {
  fn help_message(&self) -> Option<String> {
    match self {
      CheckoutError::NotARepository { path } => Some(format!(
        "Check out the source first, or run from inside the repository (looked in {}).",
        path.display()
      )),
      CheckoutError::RevisionNotFound { .. } => {
        Some("Fetch tags before running (for example `git fetch --tags`).".to_string())
      }
      CheckoutError::ManifestMissing { .. } => {
        Some("Point --manifest or release.manifest at the crate's Cargo.toml.".to_string())
      }
      CheckoutError::ManifestReadOnly { .. } => Some("The checkout must be writable.".to_string()),
      CheckoutError::CommandFailed { .. } => None,
    }
  }
}

impl fmt::Display for CheckoutError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CheckoutError::NotARepository { path } => {
        write!(f, "Source tree unavailable: {} is not a git work tree", path.display())
      }
      CheckoutError::RevisionNotFound { rev, stderr } => {
        write!(f, "Revision '{}' not found\n{}", rev, stderr.trim_end())
      }
      CheckoutError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr.trim_end())
      }
      CheckoutError::ManifestMissing { path } => {
        write!(f, "Manifest not found in source tree: {}", path.display())
      }
      CheckoutError::ManifestReadOnly { path } => {
        write!(f, "Manifest is read-only: {}", path.display())
      }
    }
  }
}

/// Errors rewriting the manifest version line
#[derive(Debug)]
pub enum ManifestFormatError {
  /// No line of the form `version = "..."`
  NoVersionLine { path: Option<PathBuf> },

  /// Tag cannot be written into a quoted TOML value
  UnwritableTag { tag: String },

  /// Manifest bytes are not UTF-8
  NotUtf8 { path: PathBuf },
}

impl ManifestFormatError {
  /// Attach the manifest path once it is known
  pub fn at(self, manifest: impl Into<PathBuf>) -> Self {
    match self {
      ManifestFormatError::NoVersionLine { path: None } => ManifestFormatError::NoVersionLine {
        path: Some(manifest.into()),
      },
      other => other,
    }
  }

  fn help_message(&self) -> Option<String> {
    match self {
      ManifestFormatError::NoVersionLine { .. } => {
        Some("Add a line like `version = \"0.0.0\"` to the manifest.".to_string())
      }
      ManifestFormatError::UnwritableTag { .. } => {
        Some("Release tags must not contain double quotes or line breaks.".to_string())
      }
      ManifestFormatError::NotUtf8 { .. } => None,
    }
  }
}

impl fmt::Display for ManifestFormatError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ManifestFormatError::NoVersionLine { path: Some(path) } => {
        write!(f, "No `version = \"...\"` line in {}", path.display())
      }
      ManifestFormatError::NoVersionLine { path: None } => write!(f, "No `version = \"...\"` line in manifest"),
      ManifestFormatError::UnwritableTag { tag } => {
        write!(f, "Tag {:?} cannot be written as a manifest version", tag)
      }
      ManifestFormatError::NotUtf8 { path } => write!(f, "Manifest is not valid UTF-8: {}", path.display()),
    }
  }
}

/// Publish command failure
#[derive(Debug)]
pub struct PublishError {
  /// Command line that was run (never contains the token)
  pub command: String,
  /// Exit status, `None` when the command could not start or was killed by a signal
  pub status: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl PublishError {
  fn help_message(&self) -> Option<String> {
    let stderr = self.stderr.to_lowercase();
    if self.status.is_none() && self.stdout.is_empty() && stderr.contains("no such file") {
      Some("The publish command was not found on PATH.".to_string())
    } else if stderr.contains("already uploaded") || stderr.contains("already exists") {
      Some("This version is already on the registry. Tag a new release.".to_string())
    } else if stderr.contains("401") || stderr.contains("403") || stderr.contains("token") {
      Some("Check that the registry token is valid and has publish scope.".to_string())
    } else {
      None
    }
  }
}

impl fmt::Display for PublishError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.status {
      Some(code) => write!(f, "Publish failed (exit code {}): {}", code, self.command)?,
      None => write!(f, "Publish failed: {}", self.command)?,
    }
    let stdout = self.stdout.trim_end();
    if !stdout.is_empty() {
      write!(f, "\n{}", stdout)?;
    }
    let stderr = self.stderr.trim_end();
    if !stderr.is_empty() {
      write!(f, "\n{}", stderr)?;
    }
    Ok(())
  }
}

/// Result type alias for cargo-tagship
pub type TagshipResult<T> = Result<T, TagshipError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> TagshipResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> TagshipResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<TagshipError>,
{
  fn context(self, ctx: impl Into<String>) -> TagshipResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> TagshipResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &TagshipError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

impl From<anyhow::Error> for TagshipError {
  fn from(err: anyhow::Error) -> Self {
    TagshipError::message(err.to_string())
  }
}
