//! Manifest version line check

use super::trait_def::{Check, CheckContext, CheckResult};
use crate::release::manifest::find_version_lines;
use anyhow::{Context, Result};
use std::fs;

/// Validates the manifest has a version line the rewrite can target
pub struct ManifestVersionCheck;

impl Check for ManifestVersionCheck {
  fn name(&self) -> &str {
    "manifest-version"
  }

  fn description(&self) -> &str {
    "Checks the manifest has a `version = \"...\"` line to rewrite"
  }

  fn run(&self, ctx: &CheckContext) -> Result<CheckResult> {
    let path = ctx.manifest_path();
    if !path.is_file() {
      return Ok(CheckResult::error(
        self.name(),
        format!("Manifest not found: {}", path.display()),
        Some("Set release.manifest in tagship.toml or pass --manifest"),
      ));
    }

    let content = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let lines = find_version_lines(&content);

    match lines.as_slice() {
      [] => Ok(CheckResult::error(
        self.name(),
        format!("No `version = \"...\"` line in {}", path.display()),
        Some("Add `version = \"0.0.0\"` under [package]; workspace-inherited versions cannot be rewritten"),
      )),
      [only] => Ok(CheckResult::pass(
        self.name(),
        format!("{}:{} version = \"{}\"", path.display(), only.line, only.value),
      )),
      [first, rest @ ..] => Ok(CheckResult::warning(
        self.name(),
        format!(
          "{} version lines in {}; only line {} (\"{}\") will be rewritten",
          rest.len() + 1,
          path.display(),
          first.line,
          first.value
        ),
        Some("Make sure the [package] version comes before any other `version = ` line"),
      )),
    }
  }
}
