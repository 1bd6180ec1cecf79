//! Configuration check

use super::trait_def::{Check, CheckContext, CheckResult};
use anyhow::Result;

/// Reports whether tagship.toml loaded cleanly
pub struct ConfigCheck;

impl Check for ConfigCheck {
  fn name(&self) -> &str {
    "config"
  }

  fn description(&self) -> &str {
    "Validates tagship.toml (defaults apply when absent)"
  }

  fn run(&self, ctx: &CheckContext) -> Result<CheckResult> {
    if let Some(ref err) = ctx.config_error {
      return Ok(CheckResult::error(
        self.name(),
        err.clone(),
        Some("Fix tagship.toml or remove it to use the defaults"),
      ));
    }

    let source = match ctx.config_path {
      Some(ref path) => path.display().to_string(),
      None => "defaults".to_string(),
    };

    Ok(CheckResult::pass(
      self.name(),
      format!(
        "{}: manifest = {}, publish = {}",
        source,
        ctx.config.release.manifest.display(),
        ctx.config.publish.command.join(" ")
      ),
    ))
  }
}
