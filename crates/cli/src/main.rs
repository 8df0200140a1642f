//! `sync-upstream`: merge an upstream release tag into a branded fork.
//!
//! Fetches the upstream remote, recreates a disposable sync branch from the
//! main line and merges the tag without committing. Conflicts are not
//! resolved; the tool prints which ones are expected (branded files) and the
//! commands to finish the merge by hand.

mod output;
mod style;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use upstream_sync_core::config::{SyncConfig, DEFAULT_CONFIG_FILE};
use upstream_sync_core::{GitCli, SyncEngine};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Merge an upstream release tag into this fork on a fresh sync branch.
#[derive(Parser, Debug)]
#[command(name = "sync-upstream", version)]
struct Cli {
    /// Upstream tag to merge (e.g. v1.4.0).
    #[arg(required_unless_present = "init_config")]
    tag: Option<String>,

    /// Path to the TOML configuration file
    /// [default: <repo>/.sync-upstream.toml, built-in defaults if absent].
    #[arg(short, long)]
    config: Option<String>,

    /// Repository to operate on.
    #[arg(short = 'C', long, default_value = ".")]
    repo: PathBuf,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// Write a default configuration file to PATH and exit.
    #[arg(long, value_name = "PATH", conflicts_with = "tag")]
    init_config: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let status = parse_error_exit_status(e.kind());
            let _ = e.print();
            return ExitCode::from(status);
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&e);
            ExitCode::FAILURE
        }
    }
}

/// `--help` and `--version` succeed; every other parse error is a usage error.
fn parse_error_exit_status(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Some(path) = &cli.init_config {
        return cmd_init_config(path);
    }

    let config = load_config(&cli.repo, cli.config.as_deref())?;
    let spinner = ProgressBar::new_spinner();
    init_logging(cli.verbose, &config.logging.log_level, &spinner);

    let tag = cli
        .tag
        .as_deref()
        .context("missing upstream tag argument")?;
    cmd_sync(&cli.repo, config, tag, spinner).await
}

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

/// `RUST_LOG` wins, then `--verbose`, then the configured level.
///
/// Log lines go to stderr with `spinner` suspended.
fn init_logging(verbose: bool, configured: &str, spinner: &ProgressBar) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::try_new(configured).unwrap_or_else(|_| EnvFilter::new("warn"))
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(SpinnerAwareStderr::maker(spinner))
        .init();
}

/// Stderr writer that clears the spinner line before each write.
struct SpinnerAwareStderr(ProgressBar);

impl SpinnerAwareStderr {
    fn maker(spinner: &ProgressBar) -> impl Fn() -> Self + Send + Sync + 'static {
        let spinner = spinner.clone();
        move || SpinnerAwareStderr(spinner.clone())
    }
}

impl Write for SpinnerAwareStderr {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.suspend(|| std::io::stderr().write(buf))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.suspend(|| std::io::stderr().flush())
    }
}

/// An explicit `--config` must exist; the per-repository default is optional.
fn load_config(repo: &Path, explicit: Option<&str>) -> Result<SyncConfig> {
    let config = match explicit {
        Some(path) => {
            let path = expand_tilde(path);
            SyncConfig::load_from_file(&path)
                .with_context(|| format!("failed to load configuration {}", path))?
        }
        None => SyncConfig::load_or_default(repo.join(DEFAULT_CONFIG_FILE))
            .context("failed to load configuration")?,
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Expand `~` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_init_config(output: &Path) -> Result<()> {
    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, SyncConfig::default_template())
        .context("failed to write config file")?;

    println!(
        "{}",
        style::success(&format!(
            "Default configuration written to {}",
            output.display()
        ))
    );
    println!();
    println!("Next steps:");
    println!("  1. Set upstream.url and list your branded files");
    println!(
        "  2. Save it as {} in the repository root, or pass --config {}",
        DEFAULT_CONFIG_FILE,
        output.display()
    );
    println!("  3. Run: sync-upstream <tag>");
    Ok(())
}

async fn cmd_sync(
    repo: &Path,
    config: SyncConfig,
    tag: &str,
    spinner: ProgressBar,
) -> Result<()> {
    debug!(repo = %repo.display(), tag, "starting sync");
    let engine = SyncEngine::new(GitCli::new(repo), config);

    if let Ok(spinner_style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        spinner.set_style(
            spinner_style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
    }
    spinner.set_message(format!("Syncing with upstream {}...", tag));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = engine.run(tag).await;
    spinner.finish_and_clear();

    let report = result?;
    output::print_report(&report);
    Ok(())
}
