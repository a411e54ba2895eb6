//! Hand-off to the outside world: selection files, recorded results, external test runner.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::Command;

use tracing::info;

use crate::config::RunnerConfig;
use crate::error::SelectorError;
use crate::types::TestId;

/// Write the selection as a pretty JSON array of ids.
pub fn write_selection(path: &Path, tests: &[TestId]) -> Result<(), SelectorError> {
  let mut json = serde_json::to_string_pretty(tests)?;
  json.push('\n');
  fs::write(path, json)?;
  Ok(())
}

/// Read a `{testId: result}` object produced by the runner side.
pub fn read_results(path: &Path) -> Result<BTreeMap<TestId, serde_json::Value>, SelectorError> {
  let raw = fs::read_to_string(path)?;
  Ok(serde_json::from_str(&raw)?)
}

/// The runner command line: configured program and args, then all ids joined by spaces.
pub fn runner_command(config: &RunnerConfig, project: &Path, tests: &[TestId]) -> Command {
  let filter = tests
    .iter()
    .map(TestId::as_str)
    .collect::<Vec<_>>()
    .join(" ");
  let mut cmd = Command::new(&config.program);
  cmd.args(&config.args).arg(filter).current_dir(project);
  cmd
}

/// Run the external runner and return its exit code (1 if it died without one).
pub fn run_tests(
  config: &RunnerConfig,
  project: &Path,
  tests: &[TestId],
) -> Result<i32, SelectorError> {
  info!(program = config.program.as_str(), count = tests.len(), "running selected tests");
  let status = runner_command(config, project, tests)
    .status()
    .map_err(|source| SelectorError::Runner {
      program: config.program.clone(),
      source,
    })?;
  Ok(status.code().unwrap_or(1))
}
