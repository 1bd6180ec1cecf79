//! Source tree check

use super::trait_def::{Check, CheckContext, CheckResult};
use crate::core::vcs::SystemGit;
use anyhow::Result;

/// Validates that the run starts inside a git work tree
pub struct RepositoryCheck;

impl Check for RepositoryCheck {
  fn name(&self) -> &str {
    "repository"
  }

  fn description(&self) -> &str {
    "Checks that the working directory is a git checkout"
  }

  fn run(&self, ctx: &CheckContext) -> Result<CheckResult> {
    let repo = match SystemGit::open(&ctx.root) {
      Ok(repo) => repo,
      Err(err) => {
        return Ok(CheckResult::error(self.name(), err.to_string(), err.help_message()));
      }
    };

    match repo.head_commit() {
      Ok(sha) => Ok(CheckResult::pass(
        self.name(),
        format!("{} at {}", repo.work_tree().display(), &sha[..12.min(sha.len())]),
      )),
      Err(err) => Ok(CheckResult::error(
        self.name(),
        err.to_string(),
        Some("The repository needs at least one commit"),
      )),
    }
  }
}
