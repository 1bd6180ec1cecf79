//! The release event: which tag to publish and with which credential
//!
//! A tag arrives either on the command line or through the CI environment of a
//! tag-triggered job. The token is read from an environment variable and lives
//! only in memory, wrapped in [`Secret`] so it cannot reach logs or reports.

use crate::core::config::ReleaseSettings;
use crate::core::error::{ConfigError, TagshipResult};
use std::fmt;

const TAG_REF_PREFIX: &str = "refs/tags/";

/// Opaque credential; `Debug` and `Display` never show the value
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
  pub fn new(value: impl Into<String>) -> Self {
    Self(value.into())
  }

  /// The raw value, for handing to the publish process only
  pub fn expose(&self) -> &str {
    &self.0
  }
}

impl fmt::Debug for Secret {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Secret(***)")
  }
}

impl fmt::Display for Secret {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("***")
  }
}

/// A single release request, consumed by one run
#[derive(Debug, Clone)]
pub struct ReleaseEvent {
  /// Version to write into the manifest
  pub tag: String,
  /// Registry credential; `None` only for dry runs
  pub token: Option<Secret>,
}

impl ReleaseEvent {
  /// Resolve the event from CLI input and an environment lookup
  ///
  /// `lookup` is `std::env::var(..).ok()` in production and a map in tests.
  pub fn resolve<F>(
    cli_tag: Option<&str>,
    token_env: &str,
    require_token: bool,
    settings: &ReleaseSettings,
    lookup: F,
  ) -> TagshipResult<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let raw = cli_tag
      .map(str::to_string)
      .or_else(|| tag_from_ci_env(&lookup))
      .ok_or(ConfigError::MissingTag)?;

    let tag = normalize_tag(&raw, &settings.strip_prefix);
    validate_tag(&tag, settings.require_semver)?;

    let token = lookup(token_env).filter(|value| !value.is_empty()).map(Secret::new);
    if require_token && token.is_none() {
      return Err(
        ConfigError::MissingToken {
          env: token_env.to_string(),
        }
        .into(),
      );
    }

    tracing::debug!(raw = %raw, tag = %tag, token_present = token.is_some(), "resolved release event");
    Ok(Self { tag, token })
  }
}

/// Tag from a tag-triggered CI job (GitHub Actions variables)
fn tag_from_ci_env<F>(lookup: &F) -> Option<String>
where
  F: Fn(&str) -> Option<String>,
{
  let is_tag_ref = lookup("GITHUB_REF_TYPE").is_none_or(|kind| kind == "tag");
  if is_tag_ref
    && let Some(name) = lookup("GITHUB_REF_NAME").filter(|n| !n.is_empty())
  {
    return Some(name);
  }

  lookup("GITHUB_REF").filter(|r| r.starts_with(TAG_REF_PREFIX))
}

/// Reduce a ref or tag name to the version string written to the manifest
///
/// `refs/tags/v1.2.3` and `v1.2.3` both become `1.2.3` with prefix `v`. The
/// prefix is only removed when a digit follows it.
pub fn normalize_tag(raw: &str, strip_prefix: &str) -> String {
  let tag = raw.trim();
  let tag = tag.strip_prefix(TAG_REF_PREFIX).unwrap_or(tag);

  if !strip_prefix.is_empty()
    && let Some(rest) = tag.strip_prefix(strip_prefix)
    && rest.starts_with(|c: char| c.is_ascii_digit())
  {
    return rest.to_string();
  }

  tag.to_string()
}

fn validate_tag(tag: &str, require_semver: bool) -> TagshipResult<()> {
  if tag.is_empty() {
    return Err(ConfigError::MissingTag.into());
  }

  if let Err(err) = semver::Version::parse(tag) {
    if require_semver {
      return Err(
        ConfigError::InvalidTag {
          tag: tag.to_string(),
          reason: err.to_string(),
        }
        .into(),
      );
    }
    tracing::warn!(tag = %tag, error = %err, "release tag is not a semantic version");
  }

  Ok(())
}
