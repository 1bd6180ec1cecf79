//! The release run state machine
//!
//! ```text
//! Start -> CheckedOut -> VersionRewritten -> Published -> Done
//!   \           \               \
//!    +-----------+---------------+--> Failed
//! ```
//!
//! Steps run strictly in order and are never retried or resumed; a rerun starts
//! from `Start`. A failed publish leaves the rewritten manifest in place.

use crate::core::error::{TagshipError, TagshipResult};
use crate::release::checkout::{Checkout, SourceTree};
use crate::release::event::ReleaseEvent;
use crate::release::manifest::{self, ManifestDigest, ManifestRewrite, RewriteOutcome};
use crate::release::publish::{PublishRequest, Publisher};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Position in the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
  Start,
  CheckedOut,
  VersionRewritten,
  Published,
  Done,
  Failed,
}

impl RunState {
  pub fn is_terminal(self) -> bool {
    matches!(self, RunState::Done | RunState::Failed)
  }
}

impl fmt::Display for RunState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      RunState::Start => "start",
      RunState::CheckedOut => "checked-out",
      RunState::VersionRewritten => "version-rewritten",
      RunState::Published => "published",
      RunState::Done => "done",
      RunState::Failed => "failed",
    };
    f.write_str(name)
  }
}

/// The three operations of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
  Checkout,
  Rewrite,
  Publish,
}

/// Knobs for a single run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
  /// Ask the publisher for a dry run (the manifest is still rewritten)
  pub dry_run: bool,
  /// Print a line per step to stdout
  pub progress: bool,
}

/// Everything that happened in a run; never holds the token
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub tag: String,
  pub state: RunState,
  pub transitions: Vec<RunState>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub failed_step: Option<Step>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub source_root: Option<PathBuf>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub manifest: Option<PathBuf>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub commit: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rewrite: Option<RewriteOutcome>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub manifest_digest: Option<ManifestDigest>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub publish_command: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub publish_status: Option<i32>,
  pub dry_run: bool,
  pub started_at: DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
  fn new(tag: &str, dry_run: bool) -> Self {
    Self {
      tag: tag.to_string(),
      state: RunState::Start,
      transitions: vec![RunState::Start],
      failed_step: None,
      error: None,
      source_root: None,
      manifest: None,
      commit: None,
      rewrite: None,
      manifest_digest: None,
      publish_command: None,
      publish_status: None,
      dry_run,
      started_at: Utc::now(),
      finished_at: None,
    }
  }

  pub fn succeeded(&self) -> bool {
    self.state == RunState::Done
  }
}

/// Report plus the error that stopped the run, if any
#[derive(Debug)]
pub struct RunOutcome {
  pub report: RunReport,
  pub result: TagshipResult<()>,
  /// Present once the rewrite step ran
  pub rewrite: Option<ManifestRewrite>,
}

/// Drives checkout, rewrite and publish for one release event
pub struct ReleasePipeline<'a, C: Checkout, P: Publisher> {
  checkout: &'a C,
  publisher: &'a P,
  options: RunOptions,
}

impl<'a, C: Checkout, P: Publisher> ReleasePipeline<'a, C, P> {
  pub fn new(checkout: &'a C, publisher: &'a P, options: RunOptions) -> Self {
    Self {
      checkout,
      publisher,
      options,
    }
  }

  /// Run every step once
  pub fn run(&self, event: &ReleaseEvent) -> RunOutcome {
    let mut report = RunReport::new(&event.tag, self.options.dry_run);
    tracing::info!(tag = %event.tag, dry_run = self.options.dry_run, "release run started");

    // checkout
    self.announce("📥", "Acquiring source tree");
    let tree = match self.checkout.acquire() {
      Ok(tree) => tree,
      Err(err) => return self.fail(report, Step::Checkout, err, None),
    };
    report.source_root = Some(tree.root.clone());
    report.manifest = Some(tree.manifest.clone());
    report.commit = tree.commit.clone();
    self.advance(&mut report, RunState::CheckedOut);
    self.detail(&source_summary(&tree));

    // rewrite
    self.announce("✏️ ", &format!("Rewriting version in {}", tree.manifest.display()));
    let rewrite = match manifest::rewrite_manifest_file(&tree.manifest, &event.tag, true) {
      Ok(rewrite) => rewrite,
      Err(err) => return self.fail(report, Step::Rewrite, err, None),
    };
    report.rewrite = Some(rewrite.outcome.clone());
    report.manifest_digest = Some(rewrite.digest());
    self.advance(&mut report, RunState::VersionRewritten);
    self.detail(&rewrite_summary(&rewrite.outcome));

    // publish
    let request = PublishRequest {
      source_root: &tree.root,
      manifest: &tree.manifest,
      token: event.token.as_ref(),
      dry_run: self.options.dry_run,
    };
    let command = self.publisher.describe(&request);
    report.publish_command = Some(command.clone());
    self.announce("🚀", &format!("Publishing: {}", command));

    match self.publisher.publish(&request) {
      Ok(output) => {
        report.publish_status = Some(output.status);
        // cargo reports upload progress on stderr
        for line in output.stderr.lines().chain(output.stdout.lines()).filter(|l| !l.trim().is_empty()) {
          self.detail(line.trim());
        }
      }
      Err(err) => {
        if let TagshipError::Publish(ref publish_err) = err {
          report.publish_status = publish_err.status;
        }
        return self.fail(report, Step::Publish, err, Some(rewrite));
      }
    }
    self.advance(&mut report, RunState::Published);

    self.advance(&mut report, RunState::Done);
    report.finished_at = Some(Utc::now());
    tracing::info!(tag = %report.tag, "release run finished");

    RunOutcome {
      report,
      result: Ok(()),
      rewrite: Some(rewrite),
    }
  }

  fn advance(&self, report: &mut RunReport, next: RunState) {
    tracing::info!(from = %report.state, to = %next, "state transition");
    report.state = next;
    report.transitions.push(next);
  }

  fn fail(
    &self,
    mut report: RunReport,
    step: Step,
    err: TagshipError,
    rewrite: Option<ManifestRewrite>,
  ) -> RunOutcome {
    tracing::error!(step = ?step, error = %err, "release run failed");
    self.advance(&mut report, RunState::Failed);
    report.failed_step = Some(step);
    report.error = Some(err.to_string());
    report.finished_at = Some(Utc::now());

    RunOutcome {
      report,
      result: Err(err),
      rewrite,
    }
  }

  fn announce(&self, icon: &str, message: &str) {
    if self.options.progress {
      println!("{} {}", icon, message);
    }
  }

  fn detail(&self, message: &str) {
    if self.options.progress {
      println!("   {}", message);
    }
  }
}

fn source_summary(tree: &SourceTree) -> String {
  match tree.commit {
    Some(ref sha) => format!("{} @ {}", tree.root.display(), &sha[..12.min(sha.len())]),
    None => tree.root.display().to_string(),
  }
}

fn rewrite_summary(outcome: &RewriteOutcome) -> String {
  if outcome.changed {
    format!("line {}: {} → {}", outcome.line, outcome.previous, outcome.version)
  } else {
    format!("line {}: already {}", outcome.line, outcome.version)
  }
}
