//! Change source: changed-file and commit-time queries against the VCS.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::Command;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::error::SelectorError;

/// Which side of the working tree a diff query looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffScope {
  /// Changes added to the index.
  Staged,
  /// Unstaged modifications in the working tree.
  WorkingTree,
}

/// VCS capability consumed by the selector.
pub trait Vcs {
  /// Added/copied/modified paths (repository-relative) for one diff scope.
  fn diff_names(&self, scope: DiffScope) -> Result<Vec<String>, SelectorError>;

  /// Time of the most recent commit touching `path`, `None` if it has no history.
  fn last_commit_time(&self, path: &str) -> Result<Option<DateTime<Utc>>, SelectorError>;
}

/// Union of staged and working-tree changes, de-duplicated.
///
/// Any VCS failure yields an empty set and a warning; it is never fatal.
pub fn changed_files(vcs: &dyn Vcs) -> BTreeSet<String> {
  let mut files = BTreeSet::new();
  for scope in [DiffScope::Staged, DiffScope::WorkingTree] {
    match vcs.diff_names(scope) {
      Ok(names) => files.extend(names),
      Err(e) => {
        warn!(error = %e, "could not get changed files");
        return BTreeSet::new();
      }
    }
  }
  debug!(count = files.len(), "collected changed files");
  files
}

// ---------------------------------------------------------------------------
// git backend
// ---------------------------------------------------------------------------

/// Shells out to `git -C <root>`; every call is blocking and attempted once.
///
/// Diff queries pass `--relative`, so when `root` is a subdirectory of the
/// repository, paths come back relative to `root` and changes outside it are
/// left out. That keeps them consistent with a `DiskTree` rooted at the same place.
#[derive(Debug, Clone)]
pub struct GitCli {
  binary: String,
  root: PathBuf,
}

impl GitCli {
  pub fn new(binary: impl Into<String>, root: impl Into<PathBuf>) -> Self {
    Self {
      binary: binary.into(),
      root: root.into(),
    }
  }

  fn run(&self, args: &[&str]) -> Result<String, SelectorError> {
    let output = Command::new(&self.binary)
      .arg("-C")
      .arg(&self.root)
      .args(args)
      .output()
      .map_err(|e| SelectorError::vcs(format!("failed to spawn {}: {}", self.binary, e)))?;
    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(SelectorError::vcs(format!(
        "{} {} failed ({}): {}",
        self.binary,
        args.join(" "),
        output.status,
        stderr.trim()
      )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
  }
}

impl Vcs for GitCli {
  fn diff_names(&self, scope: DiffScope) -> Result<Vec<String>, SelectorError> {
    let args: &[&str] = match scope {
      DiffScope::Staged => &["diff", "--cached", "--relative", "--name-only", "--diff-filter=ACM"],
      DiffScope::WorkingTree => &["diff", "--relative", "--name-only", "--diff-filter=ACM"],
    };
    let stdout = self.run(args)?;
    Ok(parse_name_list(&stdout))
  }

  fn last_commit_time(&self, path: &str) -> Result<Option<DateTime<Utc>>, SelectorError> {
    let stdout = self.run(&["log", "-1", "--format=%aI", "--", path])?;
    Ok(parse_commit_time(&stdout))
  }
}

/// Newline-separated paths; blank lines dropped.
pub fn parse_name_list(stdout: &str) -> Vec<String> {
  stdout
    .lines()
    .map(str::trim)
    .filter(|l| !l.is_empty())
    .map(str::to_string)
    .collect()
}

/// Accepts strict ISO 8601 (`%aI`) or anything starting with a `YYYY-MM-DD` date (`%ai`).
pub fn parse_commit_time(stdout: &str) -> Option<DateTime<Utc>> {
  let line = stdout.lines().map(str::trim).find(|l| !l.is_empty())?;
  if let Ok(ts) = DateTime::parse_from_rfc3339(line) {
    return Some(ts.with_timezone(&Utc));
  }
  let date = line.split_whitespace().next()?;
  let day = NaiveDate::parse_from_str(date.get(..10)?, "%Y-%m-%d").ok()?;
  Some(day.and_hms_opt(0, 0, 0)?.and_utc())
}
