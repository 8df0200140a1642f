//! The upstream sync procedure.
//!
//! [`SyncEngine::run`] performs one sync attempt, strictly in order:
//!
//! 1. Validate the tag and check we are inside a work tree.
//! 2. Ensure the upstream remote exists, adding it from config if absent.
//! 3. Fetch the remote with tags.
//! 4. Preconditions: the tag exists and the working tree is clean.
//! 5. Switch to the main line, then delete and recreate the sync branch.
//! 6. `git merge --no-ff --no-commit <tag>`.
//! 7. Classify the result.
//!
//! Nothing before step 5 touches branches, the index, or the working tree.
//! A conflicted merge is an outcome, not an error: the repository is left
//! mid-merge for the operator.

use tracing::{debug, info, instrument, warn};

use crate::branded::BrandedFiles;
use crate::config::SyncConfig;
use crate::errors::SyncError;
use crate::git::GitCli;
use crate::report::{classify, ConflictReport, SyncContext};

/// How a sync attempt that passed its preconditions ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Merge applied cleanly; changes are staged and uncommitted.
    Merged { staged: Vec<String> },
    /// The tag is already contained in the main line; nothing is staged.
    UpToDate,
    /// Merge stopped on conflicts.
    Conflicted(ConflictReport),
}

impl SyncOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Merged { .. } => "merged",
            Self::UpToDate => "up-to-date",
            Self::Conflicted(_) => "conflicted",
        }
    }
}

/// Result of [`SyncEngine::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub context: SyncContext,
    pub outcome: SyncOutcome,
}

/// Runs the sync procedure against one repository.
pub struct SyncEngine {
    git: GitCli,
    config: SyncConfig,
    branded: BrandedFiles,
}

impl SyncEngine {
    pub fn new(git: GitCli, config: SyncConfig) -> Self {
        let branded = BrandedFiles::from(&config.branded);
        Self {
            git,
            config,
            branded,
        }
    }

    pub fn branded(&self) -> &BrandedFiles {
        &self.branded
    }

    /// Run one sync attempt for `tag`.
    #[instrument(skip(self), fields(repo = %self.git.repo_path().display()))]
    pub async fn run(&self, tag: &str) -> Result<SyncReport, SyncError> {
        validate_tag(tag)?;

        if !self.git.is_work_tree().await? {
            return Err(SyncError::NotARepository(
                self.git.repo_path().display().to_string(),
            ));
        }

        let remote = self.config.upstream.remote.as_str();
        self.ensure_remote().await?;
        self.git.fetch_with_tags(remote).await?;

        self.check_preconditions(tag).await?;

        let context = SyncContext {
            tag: tag.to_string(),
            main_branch: self.config.branches.main.clone(),
            sync_branch: self.config.branches.sync_branch_for(tag),
        };
        if !self.git.is_valid_branch_name(&context.sync_branch).await? {
            return Err(SyncError::UsageError(format!(
                "'{}' is not a valid branch name",
                context.sync_branch
            )));
        }

        self.prepare_sync_branch(&context).await?;
        let outcome = self.merge(tag).await?;

        info!(outcome = outcome.label(), "sync attempt finished");
        Ok(SyncReport { context, outcome })
    }

    /// Make sure the upstream remote exists.
    ///
    /// An existing remote is kept even if its URL differs from config.
    pub async fn ensure_remote(&self) -> Result<(), SyncError> {
        let remote = &self.config.upstream.remote;
        match self.git.remote_url(remote).await? {
            Some(existing) => {
                if let Some(configured) = &self.config.upstream.url {
                    if configured != &existing {
                        warn!(
                            remote = remote.as_str(),
                            existing = existing.as_str(),
                            configured = configured.as_str(),
                            "remote URL differs from config; keeping existing remote"
                        );
                    }
                }
                debug!(remote = remote.as_str(), url = existing.as_str(), "remote present");
                Ok(())
            }
            None => {
                let url = self.config.upstream.url.as_deref().ok_or_else(|| {
                    SyncError::RemoteUrlMissing {
                        remote: remote.clone(),
                    }
                })?;
                self.git.add_remote(remote, url).await?;
                Ok(())
            }
        }
    }

    /// Tag must exist (after fetch) and the tree must be clean.
    pub async fn check_preconditions(&self, tag: &str) -> Result<(), SyncError> {
        if !self.git.tag_exists(tag).await? {
            return Err(SyncError::TagNotFound {
                tag: tag.to_string(),
                remote: self.config.upstream.remote.clone(),
            });
        }

        let dirty = self.git.dirty_files().await?;
        if !dirty.is_empty() {
            warn!(count = dirty.len(), "working tree is dirty");
            return Err(SyncError::DirtyWorkingTree { files: dirty });
        }
        Ok(())
    }

    /// Switch to the main line and recreate the sync branch from it.
    pub async fn prepare_sync_branch(&self, ctx: &SyncContext) -> Result<(), SyncError> {
        let current = self.git.current_branch().await?;
        if current.as_deref() != Some(ctx.main_branch.as_str()) {
            info!(from = ?current, to = ctx.main_branch.as_str(), "switching to main line");
            self.git.checkout(&ctx.main_branch).await?;
        }

        if self.git.branch_exists(&ctx.sync_branch).await? {
            info!(branch = ctx.sync_branch.as_str(), "removing previous sync branch");
            self.git.delete_branch(&ctx.sync_branch).await?;
        }
        self.git.create_and_checkout_branch(&ctx.sync_branch).await?;
        Ok(())
    }

    /// Attempt the merge and turn git's exit status plus the unmerged-path
    /// listing into a [`SyncOutcome`].
    pub async fn merge(&self, tag: &str) -> Result<SyncOutcome, SyncError> {
        let rev = format!("refs/tags/{}", tag);
        let attempt = self.git.merge_no_commit(&rev).await?;

        if attempt.success {
            if attempt.already_up_to_date() {
                return Ok(SyncOutcome::UpToDate);
            }
            let staged = self.git.staged_files().await?;
            return Ok(SyncOutcome::Merged { staged });
        }

        let conflicts = self.git.conflicted_files().await?;
        if conflicts.is_empty() {
            let detail = if attempt.stderr.trim().is_empty() {
                attempt.stdout.trim().to_string()
            } else {
                attempt.stderr.trim().to_string()
            };
            return Err(SyncError::MergeFailed {
                tag: tag.to_string(),
                detail,
            });
        }

        let report = classify(conflicts.as_slice(), &self.branded);
        info!(
            branded = report.branded.len(),
            manual = report.manual.len(),
            "merge conflicts classified"
        );
        Ok(SyncOutcome::Conflicted(report))
    }
}

/// Reject tag arguments git would misread or refuse.
pub fn validate_tag(tag: &str) -> Result<(), SyncError> {
    let reason = if tag.is_empty() {
        Some("tag must not be empty")
    } else if tag.starts_with('-') {
        Some("tag must not start with '-'")
    } else if tag.contains("..") {
        Some("tag must not contain '..'")
    } else if tag.ends_with('/') || tag.ends_with(".lock") || tag.ends_with('.') {
        Some("tag has an invalid suffix")
    } else if tag
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || "~^:?*[\\".contains(c))
    {
        Some("tag contains characters not allowed in a ref name")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(SyncError::UsageError(format!("{}: '{}'", reason, tag))),
        None => Ok(()),
    }
}
