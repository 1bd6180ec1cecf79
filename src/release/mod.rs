//! Tag-triggered release: checkout, version rewrite, publish
//!
//! # Steps
//!
//! 1. **checkout**: acquire a writable source tree at the released commit
//! 2. **manifest**: rewrite the first `version = "..."` line to the tag
//! 3. **publish**: run the registry publish command with the token
//!
//! `pipeline` strings the steps together as a state machine and produces a
//! `RunReport`; `event` resolves the tag and token the run consumes.
//!
//! Nothing is committed or pushed. The rewritten manifest lives only in the
//! checkout the run was given, which is why publishing needs `--allow-dirty`.

pub mod checkout;
pub mod event;
pub mod manifest;
pub mod pipeline;
pub mod publish;

pub use checkout::{Checkout, GitCheckout};
pub use event::ReleaseEvent;
pub use pipeline::{ReleasePipeline, RunOptions};
pub use publish::CargoPublisher;
