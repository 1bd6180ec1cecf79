//! `cargo tagship run`: the full release

use crate::core::context::ReleaseContext;
use crate::core::error::TagshipResult;
use crate::release::{CargoPublisher, GitCheckout, ReleaseEvent, ReleasePipeline, RunOptions};
use std::env;
use std::path::PathBuf;

/// Flags for a release run; `None` falls back to tagship.toml
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
  pub tag: Option<String>,
  pub git_ref: Option<String>,
  pub manifest: Option<PathBuf>,
  pub token_env: Option<String>,
  pub dry_run: bool,
  pub diff: bool,
  pub json: bool,
}

/// Run checkout, rewrite and publish for one tag
pub fn run_release(ctx: &ReleaseContext, args: RunArgs) -> TagshipResult<()> {
  let release = &ctx.config.release;
  let token_env = args
    .token_env
    .clone()
    .unwrap_or_else(|| ctx.config.publish.token_env.clone());

  let event = ReleaseEvent::resolve(args.tag.as_deref(), &token_env, !args.dry_run, release, |key| {
    env::var(key).ok()
  })?;

  let checkout = GitCheckout {
    path: ctx.root.clone(),
    manifest: args.manifest.clone().unwrap_or_else(|| release.manifest.clone()),
    git_ref: args.git_ref.clone(),
  };
  let publisher = CargoPublisher::new(ctx.config.publish.clone());
  let options = RunOptions {
    dry_run: args.dry_run,
    progress: !args.json,
  };

  if !args.json {
    println!("📦 Releasing {}{}", event.tag, if args.dry_run { " (dry-run)" } else { "" });
    println!();
  }

  let outcome = ReleasePipeline::new(&checkout, &publisher, options).run(&event);
  debug_assert!(outcome.report.state.is_terminal());

  if args.diff
    && !args.json
    && let Some(ref rewrite) = outcome.rewrite
  {
    let diff = rewrite.diff();
    if !diff.is_empty() {
      println!();
      print!("{}", diff);
    }
  }

  if args.json {
    println!("{}", serde_json::to_string_pretty(&outcome.report)?);
  } else if outcome.report.succeeded() {
    println!();
    if args.dry_run {
      println!("✅ Dry-run of {} passed (nothing uploaded)", event.tag);
    } else {
      println!("🎉 Published {}", event.tag);
    }
    if let Some(ref digest) = outcome.report.manifest_digest {
      println!("   Manifest digest: {}", digest);
    }
  }

  outcome.result
}
