//! Terminal rendering of sync results and fatal errors.
//!
//! Guidance goes to stdout so it can be piped into a file; errors go to
//! stderr.

use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use upstream_sync_core::report::{self, ConflictReport, SyncContext};
use upstream_sync_core::{SyncError, SyncOutcome, SyncReport};

use crate::style;

/// Print the guidance for a finished sync attempt.
pub fn print_report(result: &SyncReport) {
    let ctx = &result.context;
    println!();
    match &result.outcome {
        SyncOutcome::Merged { staged } => print_merged(ctx, staged),
        SyncOutcome::UpToDate => print_up_to_date(ctx),
        SyncOutcome::Conflicted(conflicts) => print_conflicted(ctx, conflicts),
    }
    println!();
}

fn print_merged(ctx: &SyncContext, staged: &[String]) {
    println!(
        "{}",
        style::success(&format!(
            "Merged {} into {} without conflicts ({} file(s) staged, not committed)",
            ctx.tag,
            ctx.sync_branch,
            staged.len()
        ))
    );
    println!();
    println!("{}", style::header("Next steps:"));
    for step in report::success_steps(ctx) {
        println!("{}", style::command(&step));
    }
}

fn print_up_to_date(ctx: &SyncContext) {
    println!(
        "{}",
        style::success(&format!(
            "{} already contains {}; nothing to merge",
            ctx.main_branch, ctx.tag
        ))
    );
    println!();
    println!("{}", style::header("Clean up:"));
    println!("{}", style::command(&format!("git checkout {}", report::shell_quote(&ctx.main_branch))));
    println!("{}", style::command(&format!("git branch -d {}", report::shell_quote(&ctx.sync_branch))));
}

fn print_conflicted(ctx: &SyncContext, conflicts: &ConflictReport) {
    println!(
        "{}",
        style::warn(&format!(
            "Merging {} into {} stopped with {} conflict(s)",
            ctx.tag,
            ctx.sync_branch,
            conflicts.total()
        ))
    );
    println!();
    println!("{}", conflict_table(conflicts));

    if !conflicts.branded.is_empty() {
        println!();
        println!(
            "{}",
            style::header("Branded files (expected conflicts, keep our version):")
        );
        for cmd in report::branded_commands(conflicts) {
            println!("{}", style::command(&cmd));
        }
    }

    if !conflicts.manual.is_empty() {
        println!();
        println!("{}", style::header("Other conflicts (need manual review):"));
        for line in report::manual_lines(conflicts) {
            println!("  {}", style::dim(&line));
        }
    }

    println!();
    println!("{}", style::header("Then:"));
    for (i, item) in report::checklist(ctx).iter().enumerate() {
        println!("  {}. {}", i + 1, item);
    }
}

fn conflict_table(conflicts: &ConflictReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["File", "Category", "Action"]);

    for path in &conflicts.branded {
        table.add_row(vec![
            Cell::new(path),
            Cell::new("branded").fg(Color::Green),
            Cell::new("keep ours"),
        ]);
    }
    for path in &conflicts.manual {
        table.add_row(vec![
            Cell::new(path),
            Cell::new("other").fg(Color::Yellow),
            Cell::new("manual review"),
        ]);
    }
    table
}

/// Print a fatal error, with extra detail for the known sync failures.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{}", style::error(&format!("Error: {:#}", err)));

    match err.downcast_ref::<SyncError>() {
        Some(SyncError::DirtyWorkingTree { files }) => {
            eprintln!();
            eprintln!("Uncommitted changes:");
            for file in files {
                eprintln!("  {}", file);
            }
            eprintln!();
            eprintln!("{}", style::dim("Commit or stash them, then run again."));
        }
        Some(SyncError::TagNotFound { remote, .. }) => {
            eprintln!();
            eprintln!(
                "{}",
                style::dim(&format!(
                    "List available tags with: git ls-remote --tags {}",
                    remote
                ))
            );
        }
        Some(SyncError::RemoteUrlMissing { remote }) => {
            eprintln!();
            eprintln!(
                "{}",
                style::dim(&format!(
                    "Add it with: git remote add {} <url>, or set upstream.url in the config",
                    remote
                ))
            );
        }
        Some(SyncError::MergeFailed { .. }) => {
            eprintln!();
            eprintln!("{}", style::dim("Inspect with: git status"));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_table_has_a_row_per_file() {
        let conflicts = ConflictReport {
            branded: vec!["README.md".into()],
            manual: vec!["src/lib.rs".into(), "Cargo.toml".into()],
        };
        let table = conflict_table(&conflicts);
        assert_eq!(table.row_iter().count(), 3);
        let rendered = table.to_string();
        assert!(rendered.contains("README.md"));
        assert!(rendered.contains("keep ours"));
        assert!(rendered.contains("manual review"));
    }
}
