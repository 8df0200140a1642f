//! Error types for the upstream-sync core library.
//!
//! Each subsystem has its own error type derived with `thiserror`. Git
//! failures surface to callers wrapped in [`SyncError::Git`].

use thiserror::Error;

// ---------------------------------------------------------------------------
// Git errors
// ---------------------------------------------------------------------------

/// Errors from invoking the `git` binary.
#[derive(Debug, Error)]
pub enum GitError {
    /// The `git` binary was not found on `$PATH`.
    #[error("git binary not found: {0}")]
    BinaryNotFound(String),

    /// A `git` command exited with a non-zero status.
    #[error("git {command} failed (exit {exit_code}): {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// Generic I/O wrapper.
    #[error("git I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors loading or validating the sync configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Sync errors
// ---------------------------------------------------------------------------

/// Fatal outcomes of the sync procedure.
///
/// A merge that stops on conflicts is not an error; it is reported through
/// [`crate::sync_engine::SyncOutcome::Conflicted`].
#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing or malformed tag argument.
    #[error("usage error: {0}")]
    UsageError(String),

    /// The requested tag does not exist after fetching the upstream remote.
    #[error("tag '{tag}' not found on remote '{remote}'")]
    TagNotFound { tag: String, remote: String },

    /// The working tree has uncommitted changes.
    #[error("working tree has uncommitted changes ({} file(s)); commit or stash them first", .files.len())]
    DirtyWorkingTree { files: Vec<String> },

    /// The target directory is not inside a git work tree.
    #[error("not a git working tree: {0}")]
    NotARepository(String),

    /// The upstream remote is missing and no URL is configured to add it.
    #[error("remote '{remote}' does not exist and no upstream.url is configured")]
    RemoteUrlMissing { remote: String },

    /// `git merge` failed for a reason other than conflicts.
    #[error("merge of '{tag}' failed without conflicts: {detail}")]
    MergeFailed { tag: String, detail: String },

    /// An underlying git invocation failed.
    #[error(transparent)]
    Git(#[from] GitError),
}
