//! Preflight command for diagnosing a release setup
//!
//! The doctor command runs all checks and reports every issue found.

use crate::checks::{CheckContext, Severity, create_default_runner};
use crate::core::context::ReleaseContext;
use crate::core::error::{TagshipError, TagshipResult};

/// Run the doctor command
///
/// Returns Ok(()) if no check fails with error severity.
pub fn run_doctor(
  ctx: &ReleaseContext,
  config_error: Option<String>,
  dry_run: bool,
  json: bool,
) -> TagshipResult<()> {
  let check_ctx = CheckContext {
    root: ctx.root.clone(),
    config: ctx.config.clone(),
    config_path: ctx.config_path.clone(),
    config_error,
    dry_run,
  };

  let runner = create_default_runner();
  let results = runner.run_all(&check_ctx)?;
  let has_errors = results
    .iter()
    .any(|r| !r.passed && r.severity == Severity::Error);

  if json {
    // JSON output for CI/automation
    println!("{}", serde_json::to_string_pretty(&results)?);
  } else {
    println!("🏥 Running preflight checks...\n");

    println!("📋 Registered checks:");
    for check in runner.checks() {
      println!("   • {}: {}", check.name(), check.description());
    }
    println!();

    let mut has_warnings = false;
    for result in &results {
      let icon = match (result.passed, result.severity) {
        (true, _) => "✅",
        (false, Severity::Warning) => "⚠️ ",
        (false, _) => "❌",
      };
      println!("{} {}: {}", icon, result.check_name, result.message);

      if !result.passed {
        if let Some(ref suggestion) = result.suggestion {
          println!("   💡 Fix: {}", suggestion);
        }
        if result.severity == Severity::Warning {
          has_warnings = true;
        }
      }
      println!();
    }

    let passed_count = results.iter().filter(|r| r.passed).count();
    println!("{}", "━".repeat(46));
    println!("Summary: {}/{} checks passed", passed_count, results.len());

    if has_errors {
      println!("\n⚠️  Critical issues found. A release run would fail.");
    } else if has_warnings {
      println!("\n⚠️  Some warnings found. Consider addressing them.");
    } else {
      println!("\n✨ All checks passed! Ready to publish on the next tag.");
    }
  }

  if has_errors {
    return Err(TagshipError::with_help(
      "Preflight checks failed",
      "Fix the errors above, then re-run `cargo tagship doctor`.",
    ));
  }

  Ok(())
}
