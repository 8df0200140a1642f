//! upstream-sync core library.
//!
//! Merges an upstream release tag into a downstream fork on a disposable
//! sync branch, and classifies any conflicts against the fork's list of
//! branded files so an operator can finish the merge by hand.

pub mod branded;
pub mod config;
pub mod errors;
pub mod git;
pub mod report;
pub mod sync_engine;

// Re-exports for convenience.
pub use branded::BrandedFiles;
pub use config::SyncConfig;
pub use errors::{ConfigError, GitError, SyncError};
pub use git::GitCli;
pub use report::{ConflictReport, SyncContext};
pub use sync_engine::{SyncEngine, SyncOutcome, SyncReport};
