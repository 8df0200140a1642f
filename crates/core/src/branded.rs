//! Branded-file membership.
//!
//! [`BrandedFiles`] holds the paths the fork deliberately diverges from
//! upstream on. Each entry is either an exact repository-relative path or a
//! glob pattern; a conflicted path is branded if it matches any entry.

use tracing::debug;

/// Built-in list used when the config does not override `branded.files`.
pub const DEFAULT_BRANDED_FILES: &[&str] = &[
    "README.md",
    "LICENSE-BRANDING.md",
    "assets/branding/**",
    "public/favicon.ico",
    "public/logo.svg",
    "src/branding.rs",
];

/// A set of branded paths and patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandedFiles {
    entries: Vec<String>,
}

impl BrandedFiles {
    /// Build from config entries. Backslashes are normalized to `/`.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|e| normalize(e.as_ref()))
                .collect(),
        }
    }

    /// The first entry `rel_path` matches, if any.
    pub fn matching_entry(&self, rel_path: &str) -> Option<&str> {
        let path = normalize(rel_path);
        self.entries
            .iter()
            .find(|entry| matches_entry(&path, entry))
            .map(String::as_str)
    }

    /// `true` if `rel_path` is branded.
    pub fn contains(&self, rel_path: &str) -> bool {
        match self.matching_entry(rel_path) {
            Some(entry) => {
                debug!(path = rel_path, entry, "path is branded");
                true
            }
            None => false,
        }
    }
}

impl Default for BrandedFiles {
    fn default() -> Self {
        Self::new(DEFAULT_BRANDED_FILES.iter().copied())
    }
}

impl From<&crate::config::BrandedConfig> for BrandedFiles {
    fn from(cfg: &crate::config::BrandedConfig) -> Self {
        Self::new(&cfg.files)
    }
}

fn normalize(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    path.strip_prefix("./").map(str::to_string).unwrap_or(path)
}

/// Exact comparison first, then `glob-match` semantics (`*`, `**`, `?`, `{a,b}`).
fn matches_entry(path: &str, entry: &str) -> bool {
    path == entry || glob_match::glob_match(entry, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_path_matches() {
        let branded = BrandedFiles::new(["README.md", "public/logo.svg"]);
        assert!(branded.contains("README.md"));
        assert!(branded.contains("public/logo.svg"));
        assert!(!branded.contains("public/logo.png"));
        assert!(!branded.contains("docs/README.md"));
    }

    #[test]
    fn test_glob_double_star() {
        let branded = BrandedFiles::new(["assets/branding/**"]);
        assert!(branded.contains("assets/branding/icons/app.png"));
        assert!(!branded.contains("assets/other/app.png"));
    }

    #[test]
    fn test_glob_extension_and_braces() {
        let branded = BrandedFiles::new(["**/*.{svg,ico}"]);
        assert!(branded.contains("public/favicon.ico"));
        assert!(branded.contains("a/b/c/logo.svg"));
        assert!(!branded.contains("a/b/c/logo.png"));
    }

    #[test]
    fn test_paths_are_normalized() {
        let branded = BrandedFiles::new(["./src\\branding.rs"]);
        assert_eq!(branded.entries, vec!["src/branding.rs".to_string()]);
        assert!(branded.contains("src/branding.rs"));
        assert!(branded.contains("./src/branding.rs"));
    }

    #[test]
    fn test_matching_entry_reports_first_match() {
        let branded = BrandedFiles::new(["brand/**", "brand/logo.svg"]);
        assert_eq!(branded.matching_entry("brand/logo.svg"), Some("brand/**"));
        assert_eq!(branded.matching_entry("src/lib.rs"), None);
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let branded = BrandedFiles::new(Vec::<String>::new());
        assert!(branded.entries.is_empty());
        assert!(!branded.contains("README.md"));
    }

    #[test]
    fn test_default_list() {
        let branded = BrandedFiles::default();
        assert_eq!(branded.entries.len(), DEFAULT_BRANDED_FILES.len());
        assert!(branded.contains("README.md"));
    }

    #[test]
    fn test_from_config() {
        let cfg = crate::config::BrandedConfig {
            files: vec!["custom.txt".into()],
        };
        let branded = BrandedFiles::from(&cfg);
        assert!(branded.contains("custom.txt"));
        assert!(!branded.contains("README.md"));
    }
}
