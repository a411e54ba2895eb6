//! In-memory VCS and source tree for unit tests.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use crate::error::SelectorError;
use crate::tree::SourceTree;
use crate::vcs::{DiffScope, Vcs};

#[derive(Debug, Clone, Default)]
pub struct FakeVcs {
  /// `None` makes every query fail.
  diffs: Option<(Vec<String>, Vec<String>)>,
  commits: HashMap<String, DateTime<Utc>>,
}

impl FakeVcs {
  pub fn new(staged: &[&str], working: &[&str]) -> Self {
    let own = |v: &[&str]| v.iter().map(|s| s.to_string()).collect();
    Self {
      diffs: Some((own(staged), own(working))),
      commits: HashMap::new(),
    }
  }

  /// A repository with no pending changes.
  pub fn clean() -> Self {
    Self::new(&[], &[])
  }

  pub fn failing() -> Self {
    Self::default()
  }

  pub fn with_commit(mut self, path: &str, ts: DateTime<Utc>) -> Self {
    self.commits.insert(path.to_string(), ts);
    self
  }
}

impl Vcs for FakeVcs {
  fn diff_names(&self, scope: DiffScope) -> Result<Vec<String>, SelectorError> {
    let (staged, working) = self
      .diffs
      .as_ref()
      .ok_or_else(|| SelectorError::vcs("not a git repository"))?;
    Ok(match scope {
      DiffScope::Staged => staged.clone(),
      DiffScope::WorkingTree => working.clone(),
    })
  }

  fn last_commit_time(&self, path: &str) -> Result<Option<DateTime<Utc>>, SelectorError> {
    if self.diffs.is_none() {
      return Err(SelectorError::vcs("not a git repository"));
    }
    Ok(self.commits.get(path).copied())
  }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
  files: BTreeSet<String>,
}

impl MemoryTree {
  pub fn new(files: &[&str]) -> Self {
    Self {
      files: files.iter().map(|s| s.to_string()).collect(),
    }
  }
}

impl SourceTree for MemoryTree {
  fn exists(&self, path: &str) -> bool {
    self.files.contains(path)
  }

  fn list_files(&self, dir: &str) -> Vec<String> {
    let prefix = format!("{}/", dir.trim_end_matches('/'));
    self
      .files
      .iter()
      .filter(|f| f.starts_with(&prefix))
      .cloned()
      .collect()
  }
}
