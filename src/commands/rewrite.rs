//! `cargo tagship rewrite`: the version rewrite on its own

use crate::core::context::ReleaseContext;
use crate::core::error::{CheckoutError, TagshipResult};
use crate::release::checkout::{ensure_writable_manifest, resolve_manifest};
use crate::release::manifest::{ManifestDigest, RewriteOutcome, rewrite_manifest_file};
use crate::release::ReleaseEvent;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct RewriteReport<'a> {
  manifest: &'a Path,
  written: bool,
  #[serde(flatten)]
  outcome: &'a RewriteOutcome,
  digest: ManifestDigest,
}

/// Rewrite (or with `check`, only preview) the manifest version line
pub fn run_rewrite(
  ctx: &ReleaseContext,
  tag: String,
  manifest: Option<PathBuf>,
  check: bool,
  diff: bool,
  json: bool,
) -> TagshipResult<()> {
  // Same tag normalization and validation as a full run; no token involved
  let event = ReleaseEvent::resolve(
    Some(tag.as_str()),
    &ctx.config.publish.token_env,
    false,
    &ctx.config.release,
    |_| None,
  )?;

  let path = resolve_manifest(&ctx.root, manifest.as_deref().unwrap_or(&ctx.config.release.manifest));
  if check {
    if !path.is_file() {
      return Err(CheckoutError::ManifestMissing { path }.into());
    }
  } else {
    ensure_writable_manifest(&path)?;
  }

  let rewrite = rewrite_manifest_file(&path, &event.tag, !check)?;
  let written = !check && rewrite.outcome.changed;

  if json {
    let report = RewriteReport {
      manifest: &path,
      written,
      outcome: &rewrite.outcome,
      digest: rewrite.digest(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    return Ok(());
  }

  let outcome = &rewrite.outcome;
  if !outcome.changed {
    println!("✅ {}:{} already at {}", path.display(), outcome.line, outcome.version);
  } else if check {
    println!(
      "🔍 {}:{} would change {} → {}",
      path.display(),
      outcome.line,
      outcome.previous,
      outcome.version
    );
  } else {
    println!(
      "✅ {}:{} {} → {}",
      path.display(),
      outcome.line,
      outcome.previous,
      outcome.version
    );
  }

  if outcome.matches > 1 {
    println!(
      "⚠️  {} other version line(s) left untouched",
      outcome.matches - 1
    );
  }

  if diff {
    print!("{}", rewrite.diff());
  }

  Ok(())
}
