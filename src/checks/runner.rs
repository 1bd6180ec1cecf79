//! Check runner for executing preflight checks

use super::trait_def::{Check, CheckContext, CheckResult};
use anyhow::Result;
use std::sync::Arc;

/// Check runner that executes multiple checks
pub struct CheckRunner {
  checks: Vec<Arc<dyn Check>>,
}

impl CheckRunner {
  /// Create a new check runner
  pub fn new() -> Self {
    Self { checks: Vec::new() }
  }

  /// Add a check to the runner
  pub fn add_check(&mut self, check: Arc<dyn Check>) {
    self.checks.push(check);
  }

  /// Run all checks and collect results
  pub fn run_all(&self, ctx: &CheckContext) -> Result<Vec<CheckResult>> {
    let mut results = Vec::new();

    for check in &self.checks {
      match check.run(ctx) {
        Ok(result) => results.push(result),
        Err(err) => {
          // If a check itself fails to run, create an error result
          results.push(CheckResult::error(
            check.name(),
            format!("Check failed to run: {:#}", err),
            Some("Re-run with TAGSHIP_LOG=debug for more details"),
          ));
        }
      }
    }

    Ok(results)
  }

  /// Get all registered checks
  pub fn checks(&self) -> &[Arc<dyn Check>] {
    &self.checks
  }
}

impl Default for CheckRunner {
  fn default() -> Self {
    Self::new()
  }
}

/// Create a runner with all built-in checks
pub fn create_default_runner() -> CheckRunner {
  let mut runner = CheckRunner::new();

  runner.add_check(Arc::new(super::config::ConfigCheck));
  runner.add_check(Arc::new(super::repository::RepositoryCheck));
  runner.add_check(Arc::new(super::manifest::ManifestVersionCheck));
  runner.add_check(Arc::new(super::toolchain::PublishCommandCheck));
  runner.add_check(Arc::new(super::credentials::TokenCheck));

  runner
}
