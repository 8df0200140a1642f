//! Black-box tests for the `sync-upstream` binary: exit codes and the
//! guidance printed to the operator.
//!
//! Repository scenarios need `git` on `$PATH` and skip gracefully without it.

use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn sync_upstream(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sync-upstream"))
        .current_dir(dir)
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run sync-upstream")
}

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .current_dir(dir)
        .args(["-c", "commit.gpgsign=false"])
        .args(args)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn commit(dir: &Path, rel: &str, content: &str, message: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-q", "-m", message]);
}

/// Upstream with `v1.0.0`, a fork cloned from it with a rebranded README,
/// and upstream `v1.1.0` changing README and `src/core.txt`.
fn conflicting_pair(tmp: &Path) -> std::path::PathBuf {
    let upstream = tmp.join("upstream");
    let fork = tmp.join("fork");
    std::fs::create_dir_all(&upstream).unwrap();

    git(&upstream, &["init", "-q"]);
    git(&upstream, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(&upstream, &["config", "user.name", "Upstream"]);
    git(&upstream, &["config", "user.email", "up@test.local"]);
    commit(&upstream, "README.md", "# Project\n", "init");
    commit(&upstream, "src/core.txt", "core 1\n", "core");
    git(&upstream, &["tag", "v1.0.0"]);

    git(
        tmp,
        &["clone", "-q", upstream.to_str().unwrap(), fork.to_str().unwrap()],
    );
    git(&fork, &["config", "user.name", "Fork"]);
    git(&fork, &["config", "user.email", "fork@test.local"]);
    commit(&fork, "README.md", "# ForkName\n", "rebrand");
    commit(&fork, "src/core.txt", "core 1 + fork patch\n", "patch");

    commit(&upstream, "README.md", "# Project v1.1\n", "readme");
    commit(&upstream, "src/core.txt", "core 1.1\n", "core 1.1");
    git(&upstream, &["tag", "v1.1.0"]);

    std::fs::write(
        fork.join(".sync-upstream.toml"),
        format!(
            "[upstream]\nurl = \"{}\"\n\n[branded]\nfiles = [\"README.md\"]\n",
            upstream.display()
        ),
    )
    .unwrap();
    // Keep the config file out of the dirty-tree check.
    git(&fork, &["add", ".sync-upstream.toml"]);
    git(&fork, &["commit", "-q", "-m", "sync config"]);
    fork
}

#[test]
fn no_arguments_prints_usage_and_fails() {
    let tmp = TempDir::new().unwrap();
    let output = sync_upstream(tmp.path(), &[]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "stderr: {stderr}");
}

#[test]
fn two_arguments_print_usage_and_fail() {
    let tmp = TempDir::new().unwrap();
    let output = sync_upstream(tmp.path(), &["v1.0.0", "v2.0.0"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn help_succeeds() {
    let tmp = TempDir::new().unwrap();
    let output = sync_upstream(tmp.path(), &["--help"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn init_config_writes_template() {
    let tmp = TempDir::new().unwrap();
    let output = sync_upstream(tmp.path(), &["--init-config", "sync.toml"]);
    assert_eq!(output.status.code(), Some(0));
    let written = std::fs::read_to_string(tmp.path().join("sync.toml")).unwrap();
    assert!(written.contains("[branded]"));

    let again = sync_upstream(tmp.path(), &["--init-config", "sync.toml"]);
    assert_eq!(again.status.code(), Some(1));
}

#[test]
fn option_like_remote_in_config_is_rejected() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join(".sync-upstream.toml"),
        "[upstream]\nremote = \"--upload-pack=true\"\n",
    )
    .unwrap();

    let output = sync_upstream(tmp.path(), &["v1.0.0"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("upstream.remote"), "stderr: {stderr}");
}

#[test]
fn outside_repository_fails() {
    if !git_available() {
        eprintln!("git not available; skipping");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let output = sync_upstream(tmp.path(), &["v1.0.0"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not a git working tree"));
}

#[test]
fn dirty_tree_fails_and_lists_files() {
    if !git_available() {
        eprintln!("git not available; skipping");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let fork = conflicting_pair(tmp.path());
    std::fs::write(fork.join("src/core.txt"), "uncommitted\n").unwrap();

    let output = sync_upstream(&fork, &["v1.1.0"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("uncommitted changes"), "stderr: {stderr}");
    assert!(stderr.contains("src/core.txt"));
}

#[test]
fn unknown_tag_fails() {
    if !git_available() {
        eprintln!("git not available; skipping");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let fork = conflicting_pair(tmp.path());

    let output = sync_upstream(&fork, &["v404"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("tag 'v404' not found"));
}

#[test]
fn conflicts_print_guidance_and_succeed() {
    if !git_available() {
        eprintln!("git not available; skipping");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let fork = conflicting_pair(tmp.path());

    let output = sync_upstream(&fork, &["v1.1.0"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(0), "stdout: {stdout}");
    assert!(stdout.contains("git checkout --ours -- README.md && git add -- README.md"));
    assert!(stdout.contains("# needs manual review: src/core.txt"));
    assert!(!stdout.contains("git checkout --ours -- src/core.txt"));
    assert!(stdout.contains("git merge --abort"));
}
