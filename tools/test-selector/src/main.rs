//! Binary entrypoint: select tests for the current changes, print them one per line.
//!
//! Logs go to stderr (`RUST_LOG` honoured), selected ids to stdout. Exit code is 0
//! unless an explicitly requested side effect fails, or `--run` is given and the
//! runner exits non-zero, in which case its code is passed through.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use test_selector::{runner, Config, DiskTree, GitCli, HistoryStore, Selector};

/// Predictive test selection for changed source files.
///
/// Scores changed files by path keywords, extension and commit recency, maps
/// them to tests by naming convention and keeps the riskiest 20% of the suite.
#[derive(Parser, Debug)]
#[command(name = "test-selector")]
#[command(version)]
#[command(about, long_about = None)]
struct Cli {
  /// Project root directory
  #[arg(short, long, default_value = ".")]
  project: PathBuf,

  /// Write the selected tests to this file as a JSON array
  #[arg(short, long)]
  output: Option<PathBuf>,

  /// Run the selected tests with the configured runner
  #[arg(long)]
  run: bool,

  /// JSON file overriding the default configuration
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Record a `{test: result}` JSON file into the history
  #[arg(long, value_name = "FILE")]
  record: Option<PathBuf>,

  /// Debug logging
  #[arg(short, long)]
  verbose: bool,
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let code = run(&cli)?;
  if code != 0 {
    std::process::exit(code);
  }
  Ok(())
}

fn init_logging(verbose: bool) {
  let default = if verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
    .with_writer(io::stderr)
    .init();
}

fn run(cli: &Cli) -> Result<i32> {
  let config = match &cli.config {
    Some(path) => Config::from_file(path)
      .with_context(|| format!("failed to load config {}", path.display()))?,
    None => Config::default(),
  };

  let history_path = cli.project.join(&config.history.path);
  let history = HistoryStore::load_or_quarantine(&history_path, config.history.max_runs);

  if let Some(path) = &cli.record {
    // Recording rewrites the whole file, so an unreadable history is fatal here.
    let mut history = history.context("cannot record into unreadable history")?;
    let results = runner::read_results(path)
      .with_context(|| format!("failed to read results {}", path.display()))?;
    history
      .record_results(results)
      .context("failed to record results")?;
    info!(runs = history.runs().len(), path = %history.path().display(), "history updated");
  } else if let Err(e) = history {
    warn!(error = %e, "ignoring unreadable history");
  }

  let runner_config = config.runner.clone();
  let vcs = GitCli::new(config.git_binary.clone(), &cli.project);
  let tree = DiskTree::new(&cli.project);
  let selector = Selector::new(config, vcs, tree).context("invalid configuration")?;
  let selection = selector.select();

  let stdout = io::stdout();
  let mut out = io::BufWriter::new(stdout.lock());
  for test in &selection.tests {
    writeln!(out, "{}", test)?;
  }
  out.flush()?;

  if let Some(path) = &cli.output {
    runner::write_selection(path, &selection.tests)
      .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "selected tests written");
  }

  if cli.run {
    let code = runner::run_tests(&runner_config, &cli.project, &selection.tests)?;
    return Ok(code);
  }
  Ok(0)
}
