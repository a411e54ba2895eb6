//! Core types for the test selector (JSON contracts + internal models).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Repository-relative path of a test file, e.g. `src/test/java/com/example/FooTest.java`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestId(String);

impl TestId {
  pub fn new(path: impl Into<String>) -> Self {
    Self(path.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for TestId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for TestId {
  fn from(s: &str) -> Self {
    Self(s.to_string())
  }
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

/// Heuristic risk of a changed file, always within [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct RiskScore(f64);

impl RiskScore {
  pub const ZERO: RiskScore = RiskScore(0.0);

  /// Clamp a raw sum into range. NaN collapses to zero.
  pub fn new(raw: f64) -> Self {
    if raw.is_nan() {
      return Self::ZERO;
    }
    Self(raw.clamp(0.0, 1.0))
  }

  pub fn value(self) -> f64 {
    self.0
  }

  pub fn is_positive(self) -> bool {
    self.0 > 0.0
  }
}

/// A candidate test reached from one changed file, carrying that file's risk.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTest {
  pub test: TestId,
  pub risk: RiskScore,
  /// Changed file the test was reached from.
  pub source: String,
}

// ---------------------------------------------------------------------------
// Selection output
// ---------------------------------------------------------------------------

/// Which path of the orchestrator produced a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
  /// No changes detected; the whole universe is returned.
  All,
  /// Direct mapping ranked by risk.
  Risk,
  /// Package-proximity fallback.
  Package,
}

impl fmt::Display for Strategy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Strategy::All => "all",
      Strategy::Risk => "risk",
      Strategy::Package => "package",
    };
    f.write_str(s)
  }
}

/// Ordered, bounded list of tests to execute. Owned by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
  pub tests: Vec<TestId>,
  pub strategy: Strategy,
  pub changed_files: usize,
}

impl Selection {
  pub fn len(&self) -> usize {
    self.tests.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tests.is_empty()
  }

  /// First `n` ids, for progress reporting.
  pub fn head(&self, n: usize) -> &[TestId] {
    &self.tests[..n.min(self.tests.len())]
  }
}

// ---------------------------------------------------------------------------
// History (persisted JSON contract)
// ---------------------------------------------------------------------------

/// One recorded outcome set. Payloads are opaque to the selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRun {
  pub timestamp: String,
  #[serde(default)]
  pub tests: BTreeMap<TestId, serde_json::Value>,
}

/// On-disk shape: `{"runs": [...]}`, oldest first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryLog {
  #[serde(default)]
  pub runs: Vec<HistoryRun>,
}
