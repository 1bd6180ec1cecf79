//! Registry token check

use super::trait_def::{Check, CheckContext, CheckResult};
use anyhow::Result;
use std::env;

/// Validates the token variable is set, without revealing it
pub struct TokenCheck;

impl Check for TokenCheck {
  fn name(&self) -> &str {
    "registry-token"
  }

  fn description(&self) -> &str {
    "Checks the registry token environment variable is set"
  }

  fn run(&self, ctx: &CheckContext) -> Result<CheckResult> {
    let var = &ctx.config.publish.token_env;
    let present = env::var(var).map(|v| !v.is_empty()).unwrap_or(false);

    if present {
      return Ok(CheckResult::pass(self.name(), format!("{} is set", var)));
    }

    let suggestion = Some(format!("Export {} from your CI secret store", var));
    if ctx.dry_run {
      Ok(CheckResult::warning(
        self.name(),
        format!("{} is not set (fine for --dry-run)", var),
        suggestion,
      ))
    } else {
      Ok(CheckResult::error(self.name(), format!("{} is not set", var), suggestion))
    }
  }
}
