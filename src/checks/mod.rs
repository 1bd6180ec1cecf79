//! Preflight checks run by `cargo tagship doctor`
//!
//! # Built-in Checks
//!
//! - **config**: tagship.toml parses and validates
//! - **repository**: the working directory is a git checkout with a HEAD
//! - **manifest-version**: the manifest has a version line to rewrite
//! - **publish-command**: the publish program starts
//! - **registry-token**: the token variable is set (value never shown)

mod config;
mod credentials;
mod manifest;
mod repository;
mod runner;
mod toolchain;
mod trait_def;

pub use runner::create_default_runner;
pub use trait_def::{CheckContext, CheckResult, Severity};
