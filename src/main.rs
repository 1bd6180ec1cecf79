mod checks;
mod commands;
mod core;
mod release;

use clap::{Parser, Subcommand};
use crate::core::context::ReleaseContext;
use crate::core::error::{ExitCode, TagshipError, print_error};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Publish a crate from a release tag: rewrite the manifest version, then `cargo publish`
#[derive(Parser)]
#[command(name = "cargo")]
#[command(bin_name = "cargo")]
#[command(styles = get_styles())]
enum CargoCli {
  Tagship(TagshipCli),
}

#[derive(Parser)]
#[command(name = "tagship")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct TagshipCli {
  /// Config file to use instead of searching for tagship.toml
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Check out, rewrite the manifest version to the tag, and publish
  Run {
    /// Release tag (default: GITHUB_REF_NAME / GITHUB_REF of a tag-triggered job)
    #[arg(long)]
    tag: Option<String>,
    /// Detach the work tree at this revision before rewriting
    #[arg(long = "ref")]
    git_ref: Option<String>,
    /// Manifest to rewrite (default: release.manifest or Cargo.toml)
    #[arg(long)]
    manifest: Option<PathBuf>,
    /// Environment variable holding the registry token
    #[arg(long)]
    token_env: Option<String>,
    /// Rewrite the manifest and run the publish command with --dry-run
    #[arg(long)]
    dry_run: bool,
    /// Show a unified diff of the manifest rewrite
    #[arg(long)]
    diff: bool,
    /// Output the run report in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Rewrite the manifest version line only
  Rewrite {
    /// Version to write (a leading `v` is stripped by default)
    #[arg(long)]
    tag: String,
    /// Manifest to rewrite (default: release.manifest or Cargo.toml)
    #[arg(long)]
    manifest: Option<PathBuf>,
    /// Report what would change without writing
    #[arg(long)]
    check: bool,
    /// Show a unified diff of the rewrite
    #[arg(long)]
    diff: bool,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Run preflight checks (git, manifest, publish command, token)
  Doctor {
    /// Treat a missing token as a warning
    #[arg(long)]
    dry_run: bool,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// Diagnostics go to stderr; TAGSHIP_LOG takes an EnvFilter directive (default: warn)
fn init_tracing() {
  let filter = EnvFilter::try_from_env("TAGSHIP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

fn main() {
  init_tracing();
  let CargoCli::Tagship(cli) = CargoCli::parse();

  let root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => {
      eprintln!("Error: Failed to get current directory: {}", e);
      std::process::exit(ExitCode::System.as_i32());
    }
  };

  // doctor reports a broken config as a failed check instead of bailing out
  let (ctx, config_error) = match ReleaseContext::build(&root, cli.config.as_deref()) {
    Ok(ctx) => (ctx, None),
    Err(e) if matches!(cli.command, Commands::Doctor { .. }) => {
      (ReleaseContext::with_defaults(&root), Some(e.to_string()))
    }
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    Commands::Run {
      tag,
      git_ref,
      manifest,
      token_env,
      dry_run,
      diff,
      json,
    } => commands::run_release(
      &ctx,
      commands::RunArgs {
        tag,
        git_ref,
        manifest,
        token_env,
        dry_run,
        diff,
        json,
      },
    ),
    Commands::Rewrite {
      tag,
      manifest,
      check,
      diff,
      json,
    } => commands::run_rewrite(&ctx, tag, manifest, check, diff, json),
    Commands::Doctor { dry_run, json } => commands::run_doctor(&ctx, config_error, dry_run, json),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: TagshipError) -> ! {
  print_error(&err);
  std::process::exit(err.status_code());
}
