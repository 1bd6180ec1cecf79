//! CLI commands for cargo-tagship
//!
//! - **run**: checkout, rewrite and publish in one go (the CI entry point)
//! - **rewrite**: only rewrite the manifest version line
//! - **doctor**: preflight checks before the first tagged release
//!
//! All commands take `&ReleaseContext` so config is loaded once in main.

pub mod doctor;
pub mod rewrite;
pub mod run;

pub use doctor::run_doctor;
pub use rewrite::run_rewrite;
pub use run::{RunArgs, run_release};
