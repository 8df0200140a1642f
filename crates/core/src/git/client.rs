//! Asynchronous wrapper around the `git` binary.
//!
//! The binary is treated as an opaque oracle: only exit status and text
//! output are inspected. All commands run with `LC_ALL=C` so the few messages
//! we look at are not localized.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::errors::GitError;

/// Raw result of `git merge`.
#[derive(Debug, Clone)]
pub struct MergeAttempt {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl MergeAttempt {
    /// `true` when git reported there was nothing to merge.
    pub fn already_up_to_date(&self) -> bool {
        self.success
            && (self.stdout.contains("Already up to date")
                || self.stdout.contains("Already up-to-date"))
    }
}

/// Client that runs `git` inside a fixed working directory.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_path: PathBuf,
    program: String,
}

impl GitCli {
    /// Create a client for the repository at `repo_path`.
    pub fn new<P: AsRef<Path>>(repo_path: P) -> Self {
        let client = Self {
            repo_path: repo_path.as_ref().to_path_buf(),
            program: "git".into(),
        };
        debug!(path = %client.repo_path.display(), "created GitCli");
        client
    }

    /// Use a different git executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// `true` if the working directory is inside a git work tree.
    pub async fn is_work_tree(&self) -> Result<bool, GitError> {
        let output = self.output(&["rev-parse", "--is-inside-work-tree"]).await?;
        Ok(output.status.success() && stdout_of(&output).trim() == "true")
    }

    // -----------------------------------------------------------------------
    // Remotes
    // -----------------------------------------------------------------------

    /// URL of `remote`, or `None` if no such remote exists.
    pub async fn remote_url(&self, remote: &str) -> Result<Option<String>, GitError> {
        let output = self.output(&["remote", "get-url", remote]).await?;
        if output.status.success() {
            Ok(Some(stdout_of(&output).trim().to_string()))
        } else {
            Ok(None)
        }
    }

    #[instrument(skip(self))]
    pub async fn add_remote(&self, remote: &str, url: &str) -> Result<(), GitError> {
        self.run(&["remote", "add", remote, url]).await?;
        info!(remote, url, "added remote");
        Ok(())
    }

    /// Fetch refs and tags from `remote`.
    #[instrument(skip(self))]
    pub async fn fetch_with_tags(&self, remote: &str) -> Result<(), GitError> {
        info!(remote, "fetching");
        self.run(&["fetch", remote, "--tags"]).await?;
        debug!("fetch completed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Refs
    // -----------------------------------------------------------------------

    /// `true` if `refs/tags/<tag>` exists and peels to a commit.
    pub async fn tag_exists(&self, tag: &str) -> Result<bool, GitError> {
        let spec = format!("refs/tags/{}^{{commit}}", tag);
        self.probe(&["rev-parse", "--verify", "--quiet", &spec]).await
    }

    /// `true` if the local branch `name` exists.
    pub async fn branch_exists(&self, name: &str) -> Result<bool, GitError> {
        let refname = format!("refs/heads/{}", name);
        self.probe(&["show-ref", "--verify", "--quiet", &refname]).await
    }

    /// Name of the checked-out branch, or `None` when HEAD is detached.
    pub async fn current_branch(&self) -> Result<Option<String>, GitError> {
        let output = self.output(&["symbolic-ref", "--quiet", "--short", "HEAD"]).await?;
        if output.status.success() {
            Ok(Some(stdout_of(&output).trim().to_string()))
        } else {
            Ok(None)
        }
    }

    /// `true` if `name` is a syntactically valid branch name.
    pub async fn is_valid_branch_name(&self, name: &str) -> Result<bool, GitError> {
        self.probe(&["check-ref-format", "--branch", name]).await
    }

    // -----------------------------------------------------------------------
    // Working tree
    // -----------------------------------------------------------------------

    // Path listings use `-z` so git prints names verbatim instead of
    // C-quoting anything outside printable ASCII.

    /// Tracked files with uncommitted changes (staged or not).
    pub async fn dirty_files(&self) -> Result<Vec<String>, GitError> {
        let out = self
            .run(&["status", "--porcelain", "-z", "--untracked-files=no"])
            .await?;
        Ok(parse_porcelain_z(&out))
    }

    /// Paths git currently reports as unmerged.
    pub async fn conflicted_files(&self) -> Result<Vec<String>, GitError> {
        let out = self
            .run(&["diff", "--name-only", "-z", "--diff-filter=U"])
            .await?;
        Ok(split_nul(&out))
    }

    /// Paths staged in the index relative to HEAD.
    pub async fn staged_files(&self) -> Result<Vec<String>, GitError> {
        let out = self.run(&["diff", "--cached", "--name-only", "-z"]).await?;
        Ok(split_nul(&out))
    }

    // -----------------------------------------------------------------------
    // Branch operations
    // -----------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn checkout(&self, branch: &str) -> Result<(), GitError> {
        self.run(&["checkout", branch]).await?;
        info!(branch, "checked out branch");
        Ok(())
    }

    /// Force-delete a local branch.
    #[instrument(skip(self))]
    pub async fn delete_branch(&self, name: &str) -> Result<(), GitError> {
        self.run(&["branch", "-D", name]).await?;
        info!(name, "deleted branch");
        Ok(())
    }

    /// Create `name` at HEAD and check it out.
    #[instrument(skip(self))]
    pub async fn create_and_checkout_branch(&self, name: &str) -> Result<(), GitError> {
        self.run(&["checkout", "-b", name]).await?;
        info!(name, "created branch");
        Ok(())
    }

    /// `git merge --no-ff --no-commit <rev>`. A non-zero exit is returned in
    /// the [`MergeAttempt`], not as an error.
    #[instrument(skip(self))]
    pub async fn merge_no_commit(&self, rev: &str) -> Result<MergeAttempt, GitError> {
        let output = self
            .output(&["merge", "--no-ff", "--no-commit", rev])
            .await?;
        let attempt = MergeAttempt {
            success: output.status.success(),
            stdout: stdout_of(&output),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        if attempt.success {
            info!(rev, "merge staged without conflicts");
        } else {
            warn!(rev, "merge stopped");
        }
        Ok(attempt)
    }

    // -----------------------------------------------------------------------
    // Process plumbing
    // -----------------------------------------------------------------------

    /// Run git and return stdout, failing on a non-zero exit.
    pub async fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.output(args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let exit_code = output.status.code().unwrap_or(-1);
            warn!(exit_code, %stderr, "git command failed");
            return Err(GitError::CommandFailed {
                command: args.first().copied().unwrap_or_default().to_string(),
                exit_code,
                stderr,
            });
        }
        Ok(stdout_of(&output))
    }

    /// Run git and report only whether it exited successfully.
    async fn probe(&self, args: &[&str]) -> Result<bool, GitError> {
        Ok(self.output(args).await?.status.success())
    }

    async fn output(&self, args: &[&str]) -> Result<Output, GitError> {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(&self.repo_path)
            .args(args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(cmd = ?format!("git {}", args.join(" ")), "running git command");
        cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GitError::BinaryNotFound(self.program.clone())
            } else {
                GitError::IoError(e)
            }
        })
    }
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// NUL-terminated path list, as printed by `--name-only -z`.
fn split_nul(output: &str) -> Vec<String> {
    output
        .split('\0')
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extract paths from `git status --porcelain -z` (v1) output.
///
/// Each record is `XY path\0`. Renames and copies are followed by an extra
/// `origin\0` record, which is skipped so only the new path is reported.
fn parse_porcelain_z(output: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let mut records = output.split('\0').filter(|r| !r.is_empty());
    while let Some(record) = records.next() {
        let Some((status, path)) = record.get(..2).zip(record.get(3..)) else {
            continue;
        };
        paths.push(path.to_string());
        if status.contains('R') || status.contains('C') {
            records.next();
        }
    }
    paths
}
