//! Configuration for the upstream sync procedure.
//!
//! Every section has defaults, so a repository without a config file still
//! syncs against the `upstream` remote into `main` with the built-in branded
//! file list.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::branded::DEFAULT_BRANDED_FILES;
use crate::errors::ConfigError;

/// Name of the per-repository config file looked up when none is given.
pub const DEFAULT_CONFIG_FILE: &str = ".sync-upstream.toml";

/// Placeholder replaced by the tag name in the sync branch template.
pub const TAG_PLACEHOLDER: &str = "{tag}";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Upstream remote settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Main line and sync branch naming.
    #[serde(default)]
    pub branches: BranchesConfig,

    /// Files that keep the fork's version during a merge.
    #[serde(default)]
    pub branded: BrandedConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Upstream
// ---------------------------------------------------------------------------

/// The upstream remote the fork pulls release tags from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Remote name (default `upstream`).
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Repository URL, used only when the remote has to be added.
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            url: None,
        }
    }
}

fn default_remote() -> String {
    "upstream".into()
}

// ---------------------------------------------------------------------------
// Branches
// ---------------------------------------------------------------------------

/// Branch naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchesConfig {
    /// The fork's main line (default `main`).
    #[serde(default = "default_main")]
    pub main: String,

    /// Sync branch template. `{tag}` is replaced with the tag name.
    #[serde(default = "default_sync_branch")]
    pub sync_branch: String,
}

impl BranchesConfig {
    /// Render the sync branch name for `tag`.
    pub fn sync_branch_for(&self, tag: &str) -> String {
        self.sync_branch.replace(TAG_PLACEHOLDER, tag)
    }
}

impl Default for BranchesConfig {
    fn default() -> Self {
        Self {
            main: default_main(),
            sync_branch: default_sync_branch(),
        }
    }
}

fn default_main() -> String {
    "main".into()
}

fn default_sync_branch() -> String {
    "sync/upstream-{tag}".into()
}

// ---------------------------------------------------------------------------
// Branded files
// ---------------------------------------------------------------------------

/// Paths or glob patterns expected to conflict on every upstream merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandedConfig {
    #[serde(default = "default_branded_files")]
    pub files: Vec<String>,
}

impl Default for BrandedConfig {
    fn default() -> Self {
        Self {
            files: default_branded_files(),
        }
    }
}

fn default_branded_files() -> Vec<String> {
    DEFAULT_BRANDED_FILES.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".into()
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl SyncConfig {
    /// Load a [`SyncConfig`] from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading sync configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: SyncConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("sync configuration parsed successfully");
        Ok(config)
    }

    /// Load the file at `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_from_file(path)
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate that all fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let remote = &self.upstream.remote;
        if remote.is_empty() || remote.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidValue {
                field: "upstream.remote".into(),
                detail: "remote name must be non-empty and contain no whitespace".into(),
            });
        }
        // These values are passed to git as positional arguments.
        if remote.starts_with('-') {
            return Err(ConfigError::InvalidValue {
                field: "upstream.remote".into(),
                detail: "remote name must not start with '-'".into(),
            });
        }
        if let Some(url) = &self.upstream.url {
            if url.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "upstream.url".into(),
                    detail: "URL must not be empty when set".into(),
                });
            }
        }
        if self.branches.main.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "branches.main".into(),
                detail: "main branch must not be empty".into(),
            });
        }
        if self.branches.main.starts_with('-') {
            return Err(ConfigError::InvalidValue {
                field: "branches.main".into(),
                detail: "branch name must not start with '-'".into(),
            });
        }
        if self.branches.sync_branch.starts_with('-') {
            return Err(ConfigError::InvalidValue {
                field: "branches.sync_branch".into(),
                detail: "branch name must not start with '-'".into(),
            });
        }
        if !self.branches.sync_branch.contains(TAG_PLACEHOLDER) {
            return Err(ConfigError::InvalidValue {
                field: "branches.sync_branch".into(),
                detail: format!("template must contain {}", TAG_PLACEHOLDER),
            });
        }
        if self.branded.files.iter().any(|f| f.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "branded.files".into(),
                detail: "entries must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Default TOML config template.
    pub fn default_template() -> &'static str {
        r#"# sync-upstream configuration

[upstream]
remote = "upstream"
# Only used when the remote is not configured yet.
# url = "https://github.com/example/project.git"

[branches]
main = "main"
sync_branch = "sync/upstream-{tag}"

[branded]
# Exact paths or glob patterns. Conflicts on these keep the fork's version.
files = [
    "README.md",
    "LICENSE-BRANDING.md",
    "assets/branding/**",
    "public/favicon.ico",
    "public/logo.svg",
    "src/branding.rs",
]

[logging]
log_level = "warn"
"#
    }
}
