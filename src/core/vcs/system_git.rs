//! System git backend
//!
//! Uses git plumbing commands for the few operations a release run needs:
//! - locating the work tree
//! - resolving and detaching at a revision
//! - reading HEAD for the run report

use crate::core::error::{CheckoutError, TagshipResult};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Git backend using system git
#[derive(Debug)]
pub struct SystemGit {
  /// Repository working directory
  pub(crate) repo_path: PathBuf,

  /// Working tree root
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open a git repository
  ///
  /// This performs ONE subprocess call to get the repository metadata.
  pub fn open(path: &Path) -> TagshipResult<Self> {
    let output = isolated_git(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .map_err(|e| CheckoutError::CommandFailed {
        command: "git rev-parse --show-toplevel".to_string(),
        stderr: e.to_string(),
      })?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") || stderr.contains("cannot change to") {
        return Err(
          CheckoutError::NotARepository {
            path: path.to_path_buf(),
          }
          .into(),
        );
      }
      return Err(
        CheckoutError::CommandFailed {
          command: "git rev-parse --show-toplevel".to_string(),
          stderr: stderr.to_string(),
        }
        .into(),
      );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let work_tree = stdout.trim();

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree: PathBuf::from(work_tree),
    })
  }

  /// Root of the working tree
  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Get HEAD commit SHA
  pub fn head_commit(&self) -> TagshipResult<String> {
    let output = self.run(&["rev-parse", "HEAD"])?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(
        CheckoutError::CommandFailed {
          command: "git rev-parse HEAD".to_string(),
          stderr: stderr.to_string(),
        }
        .into(),
      );
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Resolve a revision (tag, branch, sha) to a commit SHA
  pub fn resolve_commit(&self, rev: &str) -> TagshipResult<String> {
    let spec = format!("{}^{{commit}}", rev);
    let output = self.run(&["rev-parse", "--verify", "--quiet", &spec])?;

    if !output.status.success() {
      return Err(
        CheckoutError::RevisionNotFound {
          rev: rev.to_string(),
          stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
        .into(),
      );
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Detach the work tree at `rev`
  ///
  /// Returns the commit SHA now checked out.
  pub fn checkout_detached(&self, rev: &str) -> TagshipResult<String> {
    let sha = self.resolve_commit(rev)?;
    let output = self.run(&["checkout", "--quiet", "--detach", &sha])?;

    if !output.status.success() {
      return Err(
        CheckoutError::CommandFailed {
          command: format!("git checkout --detach {}", rev),
          stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
        .into(),
      );
    }

    Ok(sha)
  }

  fn run(&self, args: &[&str]) -> TagshipResult<Output> {
    self.git_cmd().args(args).output().map_err(|e| {
      CheckoutError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: e.to_string(),
      }
      .into()
    })
  }

  /// Git command scoped to this repository with an isolated environment
  pub(crate) fn git_cmd(&self) -> Command {
    isolated_git(&self.repo_path)
  }
}

/// Create a safe git command with isolated environment
///
/// - Sets working directory to `dir`
/// - Clears environment variables (GIT_DIR, GIT_WORK_TREE and friends included)
/// - Whitelists only PATH and HOME, and forces the C locale
/// - Adds safe configuration overrides
fn isolated_git(dir: &Path) -> Command {
  let mut cmd = Command::new("git");

  cmd.arg("-C").arg(dir);

  // Isolated environment (don't trust global config)
  cmd.env_clear();
  if let Ok(path) = std::env::var("PATH") {
    cmd.env("PATH", path);
  }
  if let Ok(home) = std::env::var("HOME") {
    cmd.env("HOME", home);
  }
  cmd.env("LC_ALL", "C");

  cmd.arg("-c").arg("advice.detachedHead=false");
  cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII

  cmd
}
