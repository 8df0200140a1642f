//! Conflict classification and operator guidance.
//!
//! Nothing here touches the repository. The functions turn a sync result
//! into the lines the operator copies into a shell.

use crate::branded::BrandedFiles;

/// Names needed to render commands for one sync attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncContext {
    pub tag: String,
    pub main_branch: String,
    pub sync_branch: String,
}

/// Conflicted paths split by whether the fork owns them.
///
/// `branded` and `manual` are disjoint and together hold every conflicted
/// path exactly once, in the order git listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictReport {
    /// Branded files: expected conflicts, keep the fork's version.
    pub branded: Vec<String>,
    /// Everything else: needs manual review.
    pub manual: Vec<String>,
}

impl ConflictReport {
    pub fn total(&self) -> usize {
        self.branded.len() + self.manual.len()
    }
}

/// Split `conflicts` into branded and manual-review paths.
pub fn classify<S: AsRef<str>>(conflicts: &[S], branded: &BrandedFiles) -> ConflictReport {
    let mut report = ConflictReport::default();
    for path in conflicts {
        let path = path.as_ref();
        if report.branded.iter().chain(&report.manual).any(|p| p == path) {
            continue;
        }
        if branded.contains(path) {
            report.branded.push(path.to_string());
        } else {
            report.manual.push(path.to_string());
        }
    }
    report
}

/// Commands that finish a conflict-free sync.
pub fn success_steps(ctx: &SyncContext) -> Vec<String> {
    vec![
        "git diff --cached --stat".to_string(),
        format!(
            "git commit -m {}",
            shell_quote(&format!("Merge upstream {}", ctx.tag))
        ),
        format!("git checkout {}", shell_quote(&ctx.main_branch)),
        format!("git merge --ff-only {}", shell_quote(&ctx.sync_branch)),
        format!("git branch -d {}", shell_quote(&ctx.sync_branch)),
    ]
}

/// One keep-ours command per branded conflict.
pub fn branded_commands(report: &ConflictReport) -> Vec<String> {
    report
        .branded
        .iter()
        .map(|path| {
            let quoted = shell_quote(path);
            format!("git checkout --ours -- {quoted} && git add -- {quoted}")
        })
        .collect()
}

/// Comment lines naming each conflict that needs a human.
pub fn manual_lines(report: &ConflictReport) -> Vec<String> {
    report
        .manual
        .iter()
        .map(|path| format!("# needs manual review: {}", path))
        .collect()
}

/// Generic follow-up after a conflicted merge.
pub fn checklist(ctx: &SyncContext) -> Vec<String> {
    vec![
        "Resolve the remaining conflicts listed above in your editor".to_string(),
        "Stage each resolved file with: git add -- <file>".to_string(),
        "Check nothing is left unmerged: git diff --name-only --diff-filter=U".to_string(),
        "Build and run the test suite".to_string(),
        format!(
            "Commit the merge: git commit -m {}",
            shell_quote(&format!("Merge upstream {}", ctx.tag))
        ),
        format!(
            "Fold it into {}: git checkout {} && git merge --ff-only {}",
            ctx.main_branch,
            shell_quote(&ctx.main_branch),
            shell_quote(&ctx.sync_branch)
        ),
        "To give up instead: git merge --abort".to_string(),
    ]
}

/// Quote `s` for a POSIX shell if it contains anything outside a safe set.
pub fn shell_quote(s: &str) -> String {
    let safe = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./+:@%,=".contains(c));
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
