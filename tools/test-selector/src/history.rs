//! Rolling JSON history of recorded test outcomes.
//!
//! Loaded once, mutated only through `record_results`, rewritten in full on
//! every mutation. There is no locking: concurrent writers race and the last
//! one wins.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::SelectorError;
use crate::types::{HistoryLog, HistoryRun, TestId};

/// History file plus its in-memory contents.
#[derive(Debug, Clone)]
pub struct HistoryStore {
  path: PathBuf,
  max_runs: usize,
  log: HistoryLog,
}

impl HistoryStore {
  /// Read the store at `path`. A missing file is an empty store.
  pub fn load(path: impl Into<PathBuf>, max_runs: usize) -> Result<Self, SelectorError> {
    let path = path.into();
    let log = match fs::read_to_string(&path) {
      Ok(raw) => serde_json::from_str(&raw)
        .map_err(|e| SelectorError::history(&path, SelectorError::Json(e)))?,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "no history yet");
        HistoryLog::default()
      }
      Err(e) => return Err(SelectorError::history(&path, SelectorError::Io(e))),
    };
    Ok(Self {
      path,
      max_runs: max_runs.max(1),
      log,
    })
  }

  /// Like [`HistoryStore::load`], but a file that does not parse is renamed to
  /// `<name>.corrupt` and replaced by an empty store, so a later save cannot
  /// overwrite it. Read errors other than a missing file are still returned.
  pub fn load_or_quarantine(path: impl Into<PathBuf>, max_runs: usize) -> Result<Self, SelectorError> {
    let path = path.into();
    match Self::load(&path, max_runs) {
      Err(SelectorError::History { source, .. }) if matches!(*source, SelectorError::Json(_)) => {
        let quarantined = corrupt_path(&path);
        fs::rename(&path, &quarantined)
          .map_err(|e| SelectorError::history(&path, SelectorError::Io(e)))?;
        warn!(
          error = %source,
          moved_to = %quarantined.display(),
          "malformed history set aside, starting fresh"
        );
        Ok(Self::empty(path, max_runs))
      }
      other => other,
    }
  }

  /// Empty store that will be written to `path` on the first save.
  pub fn empty(path: impl Into<PathBuf>, max_runs: usize) -> Self {
    Self {
      path: path.into(),
      max_runs: max_runs.max(1),
      log: HistoryLog::default(),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Runs, oldest first.
  pub fn runs(&self) -> &[HistoryRun] {
    &self.log.runs
  }

  pub fn log(&self) -> &HistoryLog {
    &self.log
  }

  /// Overwrite the file with the full store (temp file + rename). Parent dirs are created.
  pub fn save(&self) -> Result<(), SelectorError> {
    self
      .write()
      .map_err(|e| SelectorError::history(&self.path, e))
  }

  fn write(&self) -> Result<(), SelectorError> {
    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent)?;
    }
    let tmp = self.path.with_extension("json.tmp");
    let written = self
      .write_to(&tmp)
      .and_then(|()| fs::rename(&tmp, &self.path).map_err(SelectorError::from));
    if written.is_err() {
      let _ = fs::remove_file(&tmp);
    }
    written
  }

  fn write_to(&self, tmp: &Path) -> Result<(), SelectorError> {
    let mut f = fs::File::create(tmp)?;
    serde_json::to_writer_pretty(&mut f, &self.log)?;
    f.write_all(b"\n")?;
    f.sync_all()?;
    Ok(())
  }

  /// Append a run stamped `now`, evict the oldest runs beyond the window, persist.
  pub fn record_results_at(
    &mut self,
    results: BTreeMap<TestId, serde_json::Value>,
    now: DateTime<Utc>,
  ) -> Result<(), SelectorError> {
    self.log.runs.push(HistoryRun {
      timestamp: now.to_rfc3339(),
      tests: results,
    });
    let excess = self.log.runs.len().saturating_sub(self.max_runs);
    if excess > 0 {
      self.log.runs.drain(..excess);
    }
    debug!(runs = self.log.runs.len(), "recorded results");
    self.save()
  }

  pub fn record_results(
    &mut self,
    results: BTreeMap<TestId, serde_json::Value>,
  ) -> Result<(), SelectorError> {
    self.record_results_at(results, Utc::now())
  }

  /// Most recent payload recorded for `test`, searching newest run first.
  ///
  /// Inspection only; risk scoring does not read history.
  pub fn last_result(&self, test: &TestId) -> Option<&serde_json::Value> {
    self.log.runs.iter().rev().find_map(|run| run.tests.get(test))
  }
}

fn corrupt_path(path: &Path) -> PathBuf {
  let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
  name.push(".corrupt");
  path.with_file_name(name)
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{Duration, TimeZone};
  use serde_json::json;

  fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap()
  }

  fn results(test: &str, outcome: &str) -> BTreeMap<TestId, serde_json::Value> {
    let mut m = BTreeMap::new();
    m.insert(TestId::from(test), json!(outcome));
    m
  }

  #[test]
  fn missing_file_is_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::load(dir.path().join("nope.json"), 100).unwrap();
    assert!(store.runs().is_empty());
  }

  #[test]
  fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("build/cache/predictive/test_history.json");
    let mut store = HistoryStore::empty(&path, 100);
    store.record_results_at(results("a/FooTest.java", "passed"), t0()).unwrap();
    store
      .record_results_at(results("a/BarTest.java", "failed"), t0() + Duration::minutes(5))
      .unwrap();

    let loaded = HistoryStore::load(&path, 100).unwrap();
    assert_eq!(loaded.log(), store.log());
    assert_eq!(loaded.runs()[0].timestamp, "2025-01-15T10:00:00+00:00");
  }

  #[test]
  fn window_keeps_most_recent_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    let mut store = HistoryStore::empty(&path, 100);
    for i in 0..130 {
      store
        .record_results_at(results("a/FooTest.java", &format!("run-{}", i)), t0() + Duration::seconds(i))
        .unwrap();
    }
    assert_eq!(store.runs().len(), 100);
    assert_eq!(
      store.runs()[0].tests.get(&TestId::from("a/FooTest.java")),
      Some(&json!("run-30"))
    );

    let loaded = HistoryStore::load(&path, 100).unwrap();
    assert_eq!(loaded.runs().len(), 100);
  }

  #[test]
  fn last_result_prefers_newest_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = HistoryStore::empty(dir.path().join("h.json"), 10);
    store.record_results_at(results("a/FooTest.java", "failed"), t0()).unwrap();
    store.record_results_at(results("a/BarTest.java", "passed"), t0()).unwrap();
    store.record_results_at(results("a/FooTest.java", "passed"), t0()).unwrap();

    assert_eq!(store.last_result(&TestId::from("a/FooTest.java")), Some(&json!("passed")));
    assert_eq!(store.last_result(&TestId::from("a/BarTest.java")), Some(&json!("passed")));
    assert_eq!(store.last_result(&TestId::from("a/BazTest.java")), None);
  }

  #[test]
  fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("h.json");
    fs::write(&path, "{not json").unwrap();
    let err = HistoryStore::load(&path, 100).unwrap_err();
    assert!(err.to_string().starts_with("history:"));
  }

  #[test]
  fn malformed_file_is_set_aside_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test_history.json");
    fs::write(&path, "{not json").unwrap();

    let mut store = HistoryStore::load_or_quarantine(&path, 100).unwrap();
    assert!(store.runs().is_empty());
    let corrupt = dir.path().join("test_history.json.corrupt");
    assert_eq!(fs::read_to_string(&corrupt).unwrap(), "{not json");
    assert!(!path.exists());

    store.record_results_at(results("a/FooTest.java", "passed"), t0()).unwrap();
    assert_eq!(fs::read_to_string(&corrupt).unwrap(), "{not json");
    assert_eq!(HistoryStore::load(&path, 100).unwrap().runs().len(), 1);
  }

  #[test]
  fn quarantine_leaves_valid_and_missing_files_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("h.json");
    assert!(HistoryStore::load_or_quarantine(&path, 100).unwrap().runs().is_empty());

    let mut store = HistoryStore::empty(&path, 100);
    store.record_results_at(results("a/FooTest.java", "passed"), t0()).unwrap();
    let loaded = HistoryStore::load_or_quarantine(&path, 100).unwrap();
    assert_eq!(loaded.log(), store.log());
    assert!(!dir.path().join("h.json.corrupt").exists());
  }

  #[test]
  fn failed_save_removes_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    // A non-empty directory where the history file should go makes the rename fail.
    let path = dir.path().join("h.json");
    fs::create_dir_all(path.join("occupied")).unwrap();

    let mut store = HistoryStore::empty(&path, 100);
    let err = store
      .record_results_at(results("a/FooTest.java", "passed"), t0())
      .unwrap_err();
    assert!(err.to_string().starts_with("history:"));
    assert!(!dir.path().join("h.json.tmp").exists());
    assert!(path.join("occupied").is_dir());
  }

  #[test]
  fn file_shape_matches_contract() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("h.json");
    let mut store = HistoryStore::empty(&path, 100);
    store.record_results_at(results("a/FooTest.java", "passed"), t0()).unwrap();

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
      raw,
      json!({"runs": [{"timestamp": "2025-01-15T10:00:00+00:00", "tests": {"a/FooTest.java": "passed"}}]})
    );
  }
}
