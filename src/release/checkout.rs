//! Acquire the source tree for a release
//!
//! In CI the tree is usually checked out before the binary starts; this step
//! confirms it is a git work tree at the expected commit and that the manifest
//! can be rewritten. With `--ref` it also detaches the tree at that revision.

use crate::core::error::{CheckoutError, TagshipResult};
use crate::core::vcs::SystemGit;
use std::fs;
use std::path::{Path, PathBuf};

/// A writable source tree ready for the rewrite
#[derive(Debug, Clone)]
pub struct SourceTree {
  /// Root of the work tree
  pub root: PathBuf,
  /// Absolute path of the manifest to rewrite
  pub manifest: PathBuf,
  /// Commit checked out, when known
  pub commit: Option<String>,
}

/// Source of the release tree
pub trait Checkout {
  fn acquire(&self) -> TagshipResult<SourceTree>;
}

/// Uses the git work tree containing `path`
#[derive(Debug, Clone)]
pub struct GitCheckout {
  pub path: PathBuf,
  /// Manifest location relative to `path` (or absolute)
  pub manifest: PathBuf,
  /// Revision to detach at before the run
  pub git_ref: Option<String>,
}

impl Checkout for GitCheckout {
  fn acquire(&self) -> TagshipResult<SourceTree> {
    let repo = SystemGit::open(&self.path)?;

    let commit = match self.git_ref {
      Some(ref rev) => {
        let sha = repo.checkout_detached(rev)?;
        tracing::info!(rev = %rev, commit = %sha, "checked out release revision");
        sha
      }
      None => repo.head_commit()?,
    };

    let manifest = resolve_manifest(&self.path, &self.manifest);
    ensure_writable_manifest(&manifest)?;

    Ok(SourceTree {
      root: repo.work_tree().to_path_buf(),
      manifest,
      commit: Some(commit),
    })
  }
}

/// Manifest path relative to the starting directory unless already absolute
pub fn resolve_manifest(start: &Path, manifest: &Path) -> PathBuf {
  if manifest.is_absolute() {
    manifest.to_path_buf()
  } else {
    start.join(manifest)
  }
}

/// Manifest must exist as a file and be writable
pub fn ensure_writable_manifest(manifest: &Path) -> TagshipResult<()> {
  let metadata = match fs::metadata(manifest) {
    Ok(metadata) if metadata.is_file() => metadata,
    _ => {
      return Err(
        CheckoutError::ManifestMissing {
          path: manifest.to_path_buf(),
        }
        .into(),
      );
    }
  };

  if metadata.permissions().readonly() {
    return Err(
      CheckoutError::ManifestReadOnly {
        path: manifest.to_path_buf(),
      }
      .into(),
    );
  }

  Ok(())
}
