//! End-to-end tests for `cargo tagship run`

use crate::helpers::*;
use anyhow::Result;
use tempfile::TempDir;

const TOKEN: &str = "cio-test-token-0123456789";

/// Records the token, protocol, arguments and manifest seen by the publish step
const RECORDING_PUBLISH: &str = r#"printf '%s' "$CARGO_REGISTRY_TOKEN" > published-token
printf '%s' "$CARGO_REGISTRIES_CRATES_IO_PROTOCOL" > published-protocol
printf '%s\n' "$@" > published-args
cp "$3" published-manifest"#;

#[test]
fn test_run_publishes_rewritten_manifest() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.fake_publish(RECORDING_PUBLISH)?;

  let output = run_tagship(
    &repo.path,
    &["run", "--tag", "1.2.3"],
    &[("CARGO_REGISTRY_TOKEN", TOKEN)],
  )?;

  let published = repo.read_file("published-manifest")?;
  assert!(published.contains("version = \"1.2.3\""));
  assert!(published.contains("name = \"demo\""));
  assert!(published.contains("serde = { version = \"1.0\", features = [\"derive\"] }"));

  assert_eq!(repo.read_file("published-token")?, TOKEN);
  assert_eq!(repo.read_file("published-protocol")?, "");

  let args = repo.read_file("published-args")?;
  assert!(args.lines().any(|l| l == "--allow-dirty"));
  assert!(!args.contains(TOKEN), "token must not be passed as an argument");

  let out = stdout(&output);
  assert!(out.contains("Published 1.2.3"));
  assert!(!out.contains(TOKEN));
  assert!(!stderr(&output).contains(TOKEN));

  Ok(())
}

#[test]
fn test_run_reads_tag_from_github_env() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.fake_publish("cp \"$3\" published-manifest")?;

  run_tagship(
    &repo.path,
    &["run"],
    &[
      ("CARGO_REGISTRY_TOKEN", TOKEN),
      ("GITHUB_REF_TYPE", "tag"),
      ("GITHUB_REF_NAME", "v2.0.0-rc.1"),
    ],
  )?;

  assert!(repo.read_file("published-manifest")?.contains("version = \"2.0.0-rc.1\""));
  assert!(repo.read_file("Cargo.toml")?.contains("version = \"2.0.0-rc.1\""));

  Ok(())
}

#[test]
fn test_run_ignores_branch_refs() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.fake_publish("exit 0")?;

  let output = tagship(
    &repo.path,
    &["run"],
    &[
      ("CARGO_REGISTRY_TOKEN", TOKEN),
      ("GITHUB_REF_TYPE", "branch"),
      ("GITHUB_REF_NAME", "main"),
    ],
  )?;

  assert_eq!(output.status.code(), Some(1));
  assert!(repo.read_file("Cargo.toml")?.contains("version = \"0.0.0\""));

  Ok(())
}

#[test]
fn test_run_propagates_publish_exit_code() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.fake_publish("echo 'error: crate version `1.2.3` is already uploaded' >&2; exit 7")?;

  let output = tagship(
    &repo.path,
    &["run", "--tag", "1.2.3"],
    &[("CARGO_REGISTRY_TOKEN", TOKEN)],
  )?;

  assert_eq!(output.status.code(), Some(7));
  assert!(stderr(&output).contains("already uploaded"));
  assert!(!stderr(&output).contains(TOKEN));

  let out = stdout(&output);
  assert!(!out.contains("Published"));
  assert!(!out.contains("🎉"));
  assert!(!out.contains("Dry-run of"));
  assert!(!out.contains("Manifest digest"));

  // no rollback: the rewrite stays in the tree
  assert!(repo.read_file("Cargo.toml")?.contains("version = \"1.2.3\""));

  Ok(())
}

#[test]
fn test_run_failed_dry_run_reports_no_success() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.fake_publish("echo 'error: failed to verify package tarball' >&2; exit 101")?;

  let output = tagship(&repo.path, &["run", "--tag", "1.2.3", "--dry-run"], &[])?;

  assert_eq!(output.status.code(), Some(101));
  assert!(stderr(&output).contains("failed to verify package tarball"));

  let out = stdout(&output);
  assert!(!out.contains("Dry-run of"));
  assert!(!out.contains("passed"));
  assert!(!out.contains("Published"));
  assert!(!out.contains("🎉"));

  Ok(())
}

#[test]
fn test_run_without_token_fails_before_rewrite() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.fake_publish("touch published")?;

  let output = tagship(&repo.path, &["run", "--tag", "1.2.3"], &[])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("CARGO_REGISTRY_TOKEN"));
  assert!(!repo.path.join("published").exists());
  assert!(repo.read_file("Cargo.toml")?.contains("version = \"0.0.0\""));

  Ok(())
}

#[test]
fn test_run_with_empty_token_fails() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.fake_publish("touch published")?;

  let output = tagship(
    &repo.path,
    &["run", "--tag", "1.2.3"],
    &[("CARGO_REGISTRY_TOKEN", "")],
  )?;

  assert_eq!(output.status.code(), Some(1));
  assert!(!repo.path.join("published").exists());

  Ok(())
}

#[test]
fn test_run_passes_inherited_registry_protocol() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.fake_publish(RECORDING_PUBLISH)?;

  run_tagship(
    &repo.path,
    &["run", "--tag", "1.2.3"],
    &[
      ("CARGO_REGISTRY_TOKEN", TOKEN),
      ("CARGO_REGISTRIES_CRATES_IO_PROTOCOL", "git"),
    ],
  )?;

  assert_eq!(repo.read_file("published-protocol")?, "git");

  Ok(())
}

#[test]
fn test_run_configured_registry_protocol_wins() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.fake_publish(RECORDING_PUBLISH)?;
  let config = repo.read_file("tagship.toml")?;
  repo.write_file("tagship.toml", &format!("{}registry_protocol = \"sparse\"\n", config))?;

  run_tagship(
    &repo.path,
    &["run", "--tag", "1.2.3"],
    &[
      ("CARGO_REGISTRY_TOKEN", TOKEN),
      ("CARGO_REGISTRIES_CRATES_IO_PROTOCOL", "git"),
    ],
  )?;

  assert_eq!(repo.read_file("published-protocol")?, "sparse");

  Ok(())
}

#[test]
fn test_run_custom_token_env() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.fake_publish("printf '%s' \"$CARGO_REGISTRY_TOKEN\" > published-token")?;

  run_tagship(
    &repo.path,
    &["run", "--tag", "1.2.3", "--token-env", "RELEASE_TOKEN"],
    &[("RELEASE_TOKEN", TOKEN)],
  )?;

  assert_eq!(repo.read_file("published-token")?, TOKEN);

  Ok(())
}

#[test]
fn test_run_without_version_line_is_a_manifest_error() -> Result<()> {
  let repo = TestRepo::with_manifest("[package]\nname = \"demo\"\nversion.workspace = true\n")?;
  repo.fake_publish("touch published")?;

  let output = tagship(
    &repo.path,
    &["run", "--tag", "1.2.3"],
    &[("CARGO_REGISTRY_TOKEN", TOKEN)],
  )?;

  assert_eq!(output.status.code(), Some(4));
  assert!(!repo.path.join("published").exists());
  assert_eq!(
    repo.read_file("Cargo.toml")?,
    "[package]\nname = \"demo\"\nversion.workspace = true\n"
  );

  Ok(())
}

#[test]
fn test_run_outside_git_is_a_checkout_error() -> Result<()> {
  let dir = TempDir::new()?;
  std::fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"demo\"\nversion = \"0.0.0\"\n")?;

  let output = tagship(
    dir.path(),
    &["run", "--tag", "1.2.3"],
    &[("CARGO_REGISTRY_TOKEN", TOKEN)],
  )?;

  assert_eq!(output.status.code(), Some(3));
  assert_eq!(
    std::fs::read_to_string(dir.path().join("Cargo.toml"))?,
    "[package]\nname = \"demo\"\nversion = \"0.0.0\"\n"
  );

  Ok(())
}

#[test]
fn test_run_unknown_ref_is_a_checkout_error() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.fake_publish("touch published")?;

  let output = tagship(
    &repo.path,
    &["run", "--tag", "1.2.3", "--ref", "does-not-exist"],
    &[("CARGO_REGISTRY_TOKEN", TOKEN)],
  )?;

  assert_eq!(output.status.code(), Some(3));
  assert!(!repo.path.join("published").exists());

  Ok(())
}

#[test]
fn test_run_checks_out_requested_ref() -> Result<()> {
  let repo = TestRepo::new()?;
  let release_commit = repo.head()?;

  repo.write_file("Cargo.toml", "[package]\nname = \"demo\"\nversion = \"9.9.9\"\nedition = \"2024\"\n")?;
  repo.commit("Later work")?;
  git(&repo.path, &["tag", "v1.0.0", &release_commit])?;

  repo.fake_publish("cp \"$3\" published-manifest")?;

  let output = run_tagship(
    &repo.path,
    &["run", "--tag", "v1.0.0", "--ref", "v1.0.0", "--json"],
    &[("CARGO_REGISTRY_TOKEN", TOKEN)],
  )?;

  let published = repo.read_file("published-manifest")?;
  assert!(published.contains("version = \"1.0.0\""));
  assert!(published.contains("serde"), "manifest should come from the tagged commit");

  let report: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(report["commit"], release_commit.as_str());
  assert_eq!(report["rewrite"]["previous"], "0.0.0");

  Ok(())
}

#[test]
fn test_run_ignores_inherited_git_dir() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.fake_publish("exit 0")?;

  let other = TestRepo::new()?;
  other.write_file("NOTES.md", "elsewhere\n")?;
  other.commit("Unrelated history")?;
  let other_git_dir = other.path.join(".git");

  let output = run_tagship(
    &repo.path,
    &["run", "--tag", "1.2.3", "--json"],
    &[
      ("CARGO_REGISTRY_TOKEN", TOKEN),
      ("GIT_DIR", other_git_dir.to_str().unwrap_or_default()),
      ("GIT_WORK_TREE", other.path.to_str().unwrap_or_default()),
    ],
  )?;

  let report: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(report["commit"], repo.head()?.as_str());
  assert!(repo.read_file("Cargo.toml")?.contains("version = \"1.2.3\""));
  assert!(other.read_file("Cargo.toml")?.contains("version = \"0.0.0\""));

  Ok(())
}

#[test]
fn test_run_json_report() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.fake_publish("exit 0")?;

  let output = run_tagship(
    &repo.path,
    &["run", "--tag", "v1.2.3", "--json"],
    &[("CARGO_REGISTRY_TOKEN", TOKEN)],
  )?;

  let out = stdout(&output);
  assert!(!out.contains(TOKEN));

  let report: serde_json::Value = serde_json::from_str(&out)?;
  assert_eq!(report["tag"], "1.2.3");
  assert_eq!(report["state"], "done");
  assert_eq!(
    report["transitions"],
    serde_json::json!(["start", "checked_out", "version_rewritten", "published", "done"])
  );
  assert_eq!(report["rewrite"]["previous"], "0.0.0");
  assert_eq!(report["rewrite"]["version"], "1.2.3");
  assert_eq!(report["rewrite"]["changed"], true);
  assert_eq!(report["publish_status"], 0);
  assert_eq!(report["dry_run"], false);
  assert!(report["manifest_digest"].as_str().is_some_and(|d| d.len() == 64));

  Ok(())
}

#[test]
fn test_run_json_report_on_failure() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.fake_publish("exit 101")?;

  let output = tagship(
    &repo.path,
    &["run", "--tag", "1.2.3", "--json"],
    &[("CARGO_REGISTRY_TOKEN", TOKEN)],
  )?;

  assert_eq!(output.status.code(), Some(101));

  let report: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(report["state"], "failed");
  assert_eq!(report["failed_step"], "publish");
  assert_eq!(report["publish_status"], 101);

  Ok(())
}

#[test]
fn test_run_dry_run_needs_no_token() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.fake_publish(RECORDING_PUBLISH)?;

  let output = run_tagship(&repo.path, &["run", "--tag", "1.2.3", "--dry-run"], &[])?;

  let args = repo.read_file("published-args")?;
  assert!(args.lines().any(|l| l == "--dry-run"));
  assert_eq!(repo.read_file("published-token")?, "");
  assert!(stdout(&output).contains("Dry-run of 1.2.3 passed"));

  Ok(())
}

#[test]
fn test_run_diff_output() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.fake_publish("exit 0")?;

  let output = run_tagship(
    &repo.path,
    &["run", "--tag", "1.2.3", "--diff"],
    &[("CARGO_REGISTRY_TOKEN", TOKEN)],
  )?;

  let out = stdout(&output);
  assert!(out.contains("-version = \"0.0.0\""));
  assert!(out.contains("+version = \"1.2.3\""));

  Ok(())
}

#[test]
fn test_run_rerun_with_same_tag_is_stable() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.fake_publish("exit 0")?;

  run_tagship(&repo.path, &["run", "--tag", "1.2.3"], &[("CARGO_REGISTRY_TOKEN", TOKEN)])?;
  let first = repo.read_file("Cargo.toml")?;

  let output = run_tagship(
    &repo.path,
    &["run", "--tag", "1.2.3", "--json"],
    &[("CARGO_REGISTRY_TOKEN", TOKEN)],
  )?;

  assert_eq!(repo.read_file("Cargo.toml")?, first);
  let report: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(report["rewrite"]["changed"], false);

  Ok(())
}

#[test]
fn test_run_rejects_invalid_config() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_file("tagship.toml", "[publish]\ncommand = []\n")?;

  let output = tagship(
    &repo.path,
    &["run", "--tag", "1.2.3"],
    &[("CARGO_REGISTRY_TOKEN", TOKEN)],
  )?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("publish.command"));

  Ok(())
}
