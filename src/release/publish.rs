//! Hand the rewritten tree to the registry's publish command

use crate::core::config::PublishSettings;
use crate::core::error::{PublishError, TagshipResult};
use crate::release::event::Secret;
use std::path::Path;
use std::process::Command;

/// Variable cargo reads the crates.io token from
const TOKEN_VAR: &str = "CARGO_REGISTRY_TOKEN";
/// Registry protocol selector consumed by cargo
const PROTOCOL_VAR: &str = "CARGO_REGISTRIES_CRATES_IO_PROTOCOL";

/// Everything a publisher needs for one call
#[derive(Debug, Clone, Copy)]
pub struct PublishRequest<'a> {
  /// Root of the (modified) source tree
  pub source_root: &'a Path,
  /// Manifest that was rewritten
  pub manifest: &'a Path,
  pub token: Option<&'a Secret>,
  pub dry_run: bool,
}

/// Captured output of a successful publish
#[derive(Debug, Clone, Default)]
pub struct PublishOutput {
  pub status: i32,
  pub stdout: String,
  pub stderr: String,
}

/// The external registry publish step
pub trait Publisher {
  /// Command line shown to the operator (never contains the token)
  fn describe(&self, request: &PublishRequest<'_>) -> String;

  /// Publish once; a non-zero exit is a [`PublishError`]
  fn publish(&self, request: &PublishRequest<'_>) -> TagshipResult<PublishOutput>;
}

/// Runs `cargo publish` (or the configured replacement) as a child process
#[derive(Debug, Clone)]
pub struct CargoPublisher {
  settings: PublishSettings,
}

impl CargoPublisher {
  pub fn new(settings: PublishSettings) -> Self {
    Self { settings }
  }

  fn arguments(&self, request: &PublishRequest<'_>) -> Vec<String> {
    let mut args: Vec<String> = self.settings.command.iter().skip(1).cloned().collect();
    if self.settings.allow_dirty {
      args.push("--allow-dirty".to_string());
    }
    args.push("--manifest-path".to_string());
    args.push(request.manifest.display().to_string());
    if request.dry_run {
      args.push("--dry-run".to_string());
    }
    args.extend(self.settings.args.iter().cloned());
    args
  }

  fn program(&self) -> &str {
    self.settings.command.first().map(String::as_str).unwrap_or("cargo")
  }
}

impl Publisher for CargoPublisher {
  fn describe(&self, request: &PublishRequest<'_>) -> String {
    let mut parts = vec![self.program().to_string()];
    parts.extend(self.arguments(request));
    parts.join(" ")
  }

  fn publish(&self, request: &PublishRequest<'_>) -> TagshipResult<PublishOutput> {
    let command_line = self.describe(request);
    let mut cmd = Command::new(self.program());
    cmd.args(self.arguments(request)).current_dir(request.source_root);

    if let Some(token) = request.token {
      cmd.env(TOKEN_VAR, token.expose());
    }
    if let Some(ref protocol) = self.settings.registry_protocol {
      cmd.env(PROTOCOL_VAR, protocol);
    }

    tracing::info!(command = %command_line, token = request.token.is_some(), "running publish command");

    let output = cmd.output().map_err(|e| PublishError {
      command: command_line.clone(),
      status: None,
      stdout: String::new(),
      stderr: e.to_string(),
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
      return Err(
        PublishError {
          command: command_line,
          status: output.status.code(),
          stdout,
          stderr,
        }
        .into(),
      );
    }

    tracing::debug!(stdout = %stdout.trim_end(), stderr = %stderr.trim_end(), "publish command output");

    Ok(PublishOutput {
      status: output.status.code().unwrap_or(0),
      stdout,
      stderr,
    })
  }
}
