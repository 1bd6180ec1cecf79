//! Git access for the checkout step
//!
//! Everything goes through the system `git` binary with an isolated
//! environment; no git library is linked.

pub mod system_git;

pub use system_git::SystemGit;
