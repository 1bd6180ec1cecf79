//! Publish command availability check

use super::trait_def::{Check, CheckContext, CheckResult};
use anyhow::Result;
use std::process::Command;

/// Validates the publish program can be started
pub struct PublishCommandCheck;

impl Check for PublishCommandCheck {
  fn name(&self) -> &str {
    "publish-command"
  }

  fn description(&self) -> &str {
    "Checks the publish program is on PATH"
  }

  fn run(&self, ctx: &CheckContext) -> Result<CheckResult> {
    let Some(program) = ctx.config.publish.command.first() else {
      return Ok(CheckResult::error(
        self.name(),
        "publish.command is empty",
        Some("Set publish.command in tagship.toml"),
      ));
    };

    match Command::new(program).arg("--version").output() {
      Ok(output) if output.status.success() => {
        let version = String::from_utf8_lossy(&output.stdout);
        let version = version.lines().next().unwrap_or(program).trim().to_string();
        Ok(CheckResult::pass(self.name(), version))
      }
      Ok(_) => Ok(CheckResult::warning(
        self.name(),
        format!("`{} --version` exited with an error", program),
        None::<String>,
      )),
      Err(err) => Ok(CheckResult::error(
        self.name(),
        format!("Cannot run '{}': {}", program, err),
        Some("Install the Rust toolchain or fix publish.command"),
      )),
    }
  }
}
