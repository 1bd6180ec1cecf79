//! Rewriting the manifest's version line
//!
//! The manifest is treated as text, not parsed as TOML. The first line of the
//! form `version = "<value>"` gets its quoted value replaced by the tag; every
//! other byte, line endings included, is left as it was.
//!
//! # Match policy
//!
//! - no matching line: [`ManifestFormatError::NoVersionLine`], file untouched
//! - several matching lines: only the first is rewritten, the rest are reported
//! - value already equal to the tag: no write, `changed = false`

use crate::core::error::{ManifestFormatError, ResultExt, TagshipResult};
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use similar::TextDiff;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static VERSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"^(?:\x{FEFF})?\s*version\s*=\s*"(?P<value>[^"]*)""#).expect("regex for manifest version line")
});

/// What the rewrite did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteOutcome {
  /// 1-based line number of the rewritten line
  pub line: usize,
  /// Value found before the rewrite
  pub previous: String,
  /// Value written (the tag)
  pub version: String,
  /// Number of lines matching the version pattern
  pub matches: usize,
  /// False when the value already equalled the tag
  pub changed: bool,
}

/// A matching version line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionLine {
  pub line: usize,
  pub value: String,
}

/// All lines matching the version pattern, in file order
pub fn find_version_lines(content: &str) -> Vec<VersionLine> {
  content
    .split_inclusive('\n')
    .enumerate()
    .filter_map(|(idx, raw)| {
      let (body, _) = split_line_ending(raw);
      VERSION_LINE.captures(body).and_then(|caps| {
        caps.name("value").map(|value| VersionLine {
          line: idx + 1,
          value: value.as_str().to_string(),
        })
      })
    })
    .collect()
}

/// Replace the first version value in `content` with `tag`
pub fn rewrite_version(content: &str, tag: &str) -> Result<(String, RewriteOutcome), ManifestFormatError> {
  if tag.is_empty() || tag.contains(['"', '\\', '\n', '\r']) {
    return Err(ManifestFormatError::UnwritableTag { tag: tag.to_string() });
  }

  let mut rewritten = String::with_capacity(content.len() + tag.len());
  let mut first: Option<(usize, String)> = None;
  let mut matches = 0;

  for (idx, raw) in content.split_inclusive('\n').enumerate() {
    let (body, ending) = split_line_ending(raw);
    let value = VERSION_LINE.captures(body).and_then(|caps| caps.name("value"));

    match value {
      Some(value) => {
        matches += 1;
        if first.is_none() {
          first = Some((idx + 1, value.as_str().to_string()));
          rewritten.push_str(&body[..value.start()]);
          rewritten.push_str(tag);
          rewritten.push_str(&body[value.end()..]);
          rewritten.push_str(ending);
        } else {
          rewritten.push_str(raw);
        }
      }
      None => rewritten.push_str(raw),
    }
  }

  let (line, previous) = first.ok_or(ManifestFormatError::NoVersionLine { path: None })?;

  if matches > 1 {
    tracing::warn!(
      line,
      ignored = matches - 1,
      "manifest has several version lines; only the first was rewritten"
    );
  }

  let outcome = RewriteOutcome {
    line,
    changed: previous != tag,
    previous,
    version: tag.to_string(),
    matches,
  };

  Ok((rewritten, outcome))
}

/// Split a line into body and terminator (`\r\n`, `\n` or nothing)
fn split_line_ending(line: &str) -> (&str, &str) {
  if let Some(body) = line.strip_suffix("\r\n") {
    (body, "\r\n")
  } else if let Some(body) = line.strip_suffix('\n') {
    (body, "\n")
  } else {
    (line, "")
  }
}

/// Result of rewriting a manifest on disk
#[derive(Debug, Clone)]
pub struct ManifestRewrite {
  pub path: PathBuf,
  pub outcome: RewriteOutcome,
  pub original: String,
  pub rewritten: String,
}

impl ManifestRewrite {
  /// Unified diff of the rewrite, empty when nothing changed
  pub fn diff(&self) -> String {
    if !self.outcome.changed {
      return String::new();
    }
    let label = self.path.display().to_string();
    TextDiff::from_lines(&self.original, &self.rewritten)
      .unified_diff()
      .context_radius(1)
      .header(&label, &label)
      .to_string()
  }

  /// Digest of the manifest content handed to publish
  pub fn digest(&self) -> ManifestDigest {
    ManifestDigest::from_contents(self.rewritten.as_bytes())
  }
}

/// Rewrite the manifest at `path`; with `write = false` nothing touches the disk
pub fn rewrite_manifest_file(path: &Path, tag: &str, write: bool) -> TagshipResult<ManifestRewrite> {
  let bytes = fs::read(path).with_context(|| format!("Failed to read manifest {}", path.display()))?;
  let original = String::from_utf8(bytes).map_err(|_| ManifestFormatError::NotUtf8 {
    path: path.to_path_buf(),
  })?;

  let (rewritten, outcome) = rewrite_version(&original, tag).map_err(|e| e.at(path))?;

  if write && outcome.changed {
    fs::write(path, &rewritten).with_context(|| format!("Failed to write manifest {}", path.display()))?;
  }

  tracing::info!(
    manifest = %path.display(),
    line = outcome.line,
    previous = %outcome.previous,
    version = %outcome.version,
    written = write && outcome.changed,
    "rewrote version line"
  );

  Ok(ManifestRewrite {
    path: path.to_path_buf(),
    outcome,
    original,
    rewritten,
  })
}

/// SHA-256 of manifest contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestDigest(String);

impl ManifestDigest {
  pub fn from_contents(contents: &[u8]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    Self(format!("{:x}", hasher.finalize()))
  }

  /// First 12 hex characters
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }
}

impl fmt::Display for ManifestDigest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}
