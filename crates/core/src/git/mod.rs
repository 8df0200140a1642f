//! Git operations for upstream-sync.

pub mod client;

pub use client::{GitCli, MergeAttempt};
