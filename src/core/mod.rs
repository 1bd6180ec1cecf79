//! Core building blocks for cargo-tagship
//!
//! - **config**: tagship.toml parsing and validation
//! - **context**: per-invocation context shared by all commands
//! - **error**: error taxonomy with exit codes and help messages
//! - **vcs**: git operations (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod vcs;
