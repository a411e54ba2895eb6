//! Selector configuration with sane defaults (Maven/Gradle Java layout).
//!
//! Every section deserializes with `#[serde(default)]`, so a partial JSON file
//! only overrides the keys it names.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SelectorError;

/// Top-level tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub risk: RiskConfig,
  pub layout: LayoutConfig,
  pub selection: SelectionConfig,
  pub history: HistoryConfig,
  pub runner: RunnerConfig,
  /// VCS executable used by the default git backend.
  pub git_binary: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      risk: RiskConfig::default(),
      layout: LayoutConfig::default(),
      selection: SelectionConfig::default(),
      history: HistoryConfig::default(),
      runner: RunnerConfig::default(),
      git_binary: "git".into(),
    }
  }
}

/// Weights for the heuristic risk model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
  /// Case-insensitive path substrings that mark a file as risky. Matches are additive.
  pub keywords: Vec<String>,
  /// Increment per matched keyword.
  pub keyword_weight: f64,
  /// Extension of compiled source units (including the dot).
  pub source_extension: String,
  /// Increment when the file has `source_extension`.
  pub extension_weight: f64,
  /// A last commit younger than this many days counts as recent.
  pub recency_days: i64,
  /// Increment for a recent last commit.
  pub recency_weight: f64,
}

impl Default for RiskConfig {
  fn default() -> Self {
    Self {
      keywords: [
        "controller",
        "service",
        "repository",
        "security",
        "auth",
        "payment",
        "transaction",
        "workflow",
      ]
      .iter()
      .map(|k| k.to_string())
      .collect(),
      keyword_weight: 0.2,
      source_extension: ".java".into(),
      extension_weight: 0.1,
      recency_days: 7,
      recency_weight: 0.1,
    }
  }
}

/// One source-to-test naming convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConvention {
  /// Path segment marking production sources, e.g. `/main/`.
  pub source_segment: String,
  /// Replacement segment for test sources, e.g. `/test/`.
  pub test_segment: String,
  /// Prefix after which the path spells the package, e.g. `/main/java/`.
  pub package_root: String,
  /// Source file extension, including the dot.
  pub extension: String,
  /// Test class suffixes, probed in order.
  pub suffixes: Vec<String>,
}

impl Default for TestConvention {
  fn default() -> Self {
    Self {
      source_segment: "/main/".into(),
      test_segment: "/test/".into(),
      package_root: "/main/java/".into(),
      extension: ".java".into(),
      suffixes: vec!["Test".into(), "Tests".into(), "IT".into()],
    }
  }
}

/// Where tests live and how they are named.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
  /// Root of the test universe, relative to the project root.
  pub test_root: String,
  /// File-name glob for discoverable tests.
  pub test_glob: String,
  pub conventions: Vec<TestConvention>,
}

impl Default for LayoutConfig {
  fn default() -> Self {
    Self {
      test_root: "src/test/java".into(),
      test_glob: "*Test.java".into(),
      conventions: vec![TestConvention::default()],
    }
  }
}

/// Selection bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
  /// Fraction of the test universe that risk-based selection may return.
  pub cap_ratio: f64,
  /// Hard limit for the package-proximity fallback.
  pub package_limit: usize,
}

impl Default for SelectionConfig {
  fn default() -> Self {
    Self {
      cap_ratio: 0.2,
      package_limit: 20,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
  /// History file, relative to the project root.
  pub path: PathBuf,
  /// Sliding window size; oldest runs are evicted first.
  pub max_runs: usize,
}

impl Default for HistoryConfig {
  fn default() -> Self {
    Self {
      path: PathBuf::from("build/cache/predictive/test_history.json"),
      max_runs: 100,
    }
  }
}

/// External test runner invocation. Selected ids are appended as one space-joined argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
  pub program: String,
  pub args: Vec<String>,
}

impl Default for RunnerConfig {
  fn default() -> Self {
    Self {
      program: "./gradlew".into(),
      args: vec!["test".into(), "--tests".into()],
    }
  }
}

impl Config {
  /// Read a JSON config file and validate it.
  pub fn from_file(path: &Path) -> Result<Self, SelectorError> {
    let raw = fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&raw)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), SelectorError> {
    let weights = [
      ("risk.keyword_weight", self.risk.keyword_weight),
      ("risk.extension_weight", self.risk.extension_weight),
      ("risk.recency_weight", self.risk.recency_weight),
    ];
    for (field, w) in weights {
      if !w.is_finite() || w < 0.0 {
        return Err(SelectorError::config(field, "must be a finite, non-negative number"));
      }
    }
    if self.risk.recency_days < 0 {
      return Err(SelectorError::config("risk.recency_days", "must not be negative"));
    }
    let ratio = self.selection.cap_ratio;
    if !(ratio > 0.0 && ratio <= 1.0) {
      return Err(SelectorError::config("selection.cap_ratio", "must be in (0, 1]"));
    }
    if self.selection.package_limit == 0 {
      return Err(SelectorError::config("selection.package_limit", "must be at least 1"));
    }
    if self.history.max_runs == 0 {
      return Err(SelectorError::config("history.max_runs", "must be at least 1"));
    }
    if self.layout.conventions.is_empty() {
      return Err(SelectorError::config("layout.conventions", "need at least one convention"));
    }
    for c in &self.layout.conventions {
      if c.source_segment.is_empty() || c.test_segment.is_empty() || c.suffixes.is_empty() {
        return Err(SelectorError::config(
          "layout.conventions",
          "source_segment, test_segment and suffixes must be set",
        ));
      }
    }
    if self.runner.program.is_empty() {
      return Err(SelectorError::config("runner.program", "must not be empty"));
    }
    Ok(())
  }
}
