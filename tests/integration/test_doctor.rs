//! Tests for `cargo tagship doctor`

use crate::helpers::*;
use anyhow::Result;

fn check<'a>(results: &'a serde_json::Value, name: &str) -> &'a serde_json::Value {
  results
    .as_array()
    .and_then(|all| all.iter().find(|r| r["check_name"] == name))
    .unwrap_or_else(|| panic!("missing check {}", name))
}

#[test]
fn test_doctor_passes_with_token() -> Result<()> {
  let repo = TestRepo::new()?;

  let output = run_tagship(&repo.path, &["doctor", "--json"], &[("CARGO_REGISTRY_TOKEN", "secret-value")])?;

  let out = stdout(&output);
  assert!(!out.contains("secret-value"));

  let results: serde_json::Value = serde_json::from_str(&out)?;
  assert_eq!(check(&results, "repository")["passed"], true);
  assert_eq!(check(&results, "manifest-version")["passed"], true);
  assert_eq!(check(&results, "registry-token")["passed"], true);

  Ok(())
}

#[test]
fn test_doctor_missing_token_fails() -> Result<()> {
  let repo = TestRepo::new()?;

  let output = tagship(&repo.path, &["doctor", "--json"], &[])?;
  assert_eq!(output.status.code(), Some(1));

  let results: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  let token = check(&results, "registry-token");
  assert_eq!(token["passed"], false);
  assert_eq!(token["severity"], "Error");

  Ok(())
}

#[test]
fn test_doctor_dry_run_tolerates_missing_token() -> Result<()> {
  let repo = TestRepo::new()?;

  let output = run_tagship(&repo.path, &["doctor", "--dry-run", "--json"], &[])?;

  let results: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(check(&results, "registry-token")["severity"], "Warning");

  Ok(())
}

#[test]
fn test_doctor_reports_missing_version_line() -> Result<()> {
  let repo = TestRepo::with_manifest("[package]\nname = \"demo\"\nversion.workspace = true\n")?;

  let output = tagship(&repo.path, &["doctor", "--json"], &[("CARGO_REGISTRY_TOKEN", "t")])?;
  assert_eq!(output.status.code(), Some(1));

  let results: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(check(&results, "manifest-version")["passed"], false);

  Ok(())
}

#[test]
fn test_doctor_reports_broken_config() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_file("tagship.toml", "[publish\ncommand = ")?;

  let output = tagship(&repo.path, &["doctor", "--json"], &[("CARGO_REGISTRY_TOKEN", "t")])?;
  assert_eq!(output.status.code(), Some(1));

  let results: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  let config = check(&results, "config");
  assert_eq!(config["passed"], false);
  assert!(config["message"].as_str().is_some_and(|m| m.contains("tagship.toml")));

  Ok(())
}

#[test]
fn test_doctor_text_output() -> Result<()> {
  let repo = TestRepo::new()?;

  let output = run_tagship(&repo.path, &["doctor"], &[("CARGO_REGISTRY_TOKEN", "t")])?;

  let out = stdout(&output);
  assert!(out.contains("Running preflight checks"));
  assert!(out.contains("manifest-version"));
  assert!(out.contains("checks passed"));

  Ok(())
}
