//! Risk score derived from file path patterns, extension, and commit recency.
//!
//! The score is a clamped sum over an ordered rule list; every rule that
//! applies adds its weight, independently of the others.

use chrono::{DateTime, Utc};

use crate::config::RiskConfig;
use crate::types::RiskScore;

/// What a rule looks at.
#[derive(Debug, Clone, PartialEq)]
pub enum RiskSignal {
  /// Case-insensitive substring of the path. Stored lowercase.
  PathKeyword(String),
  /// Path ends with this extension (dot included).
  Extension(String),
  /// Last commit is younger than `days`.
  RecentCommit { days: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskRule {
  pub signal: RiskSignal,
  pub weight: f64,
}

impl RiskRule {
  pub fn keyword(keyword: &str, weight: f64) -> Self {
    Self {
      signal: RiskSignal::PathKeyword(keyword.to_lowercase()),
      weight,
    }
  }

  pub fn extension(ext: &str, weight: f64) -> Self {
    Self {
      signal: RiskSignal::Extension(ext.to_string()),
      weight,
    }
  }

  pub fn recent_commit(days: i64, weight: f64) -> Self {
    Self {
      signal: RiskSignal::RecentCommit { days },
      weight,
    }
  }

  fn applies(&self, facts: &FileFacts<'_>, path_lower: &str) -> bool {
    match &self.signal {
      RiskSignal::PathKeyword(k) => path_lower.contains(k.as_str()),
      RiskSignal::Extension(ext) => facts.path.ends_with(ext.as_str()),
      RiskSignal::RecentCommit { days } => match facts.last_commit {
        Some(ts) => (facts.now - ts).num_days() < *days,
        None => false,
      },
    }
  }
}

/// Everything the model needs to know about one changed file.
#[derive(Debug, Clone, Copy)]
pub struct FileFacts<'a> {
  pub path: &'a str,
  /// `None` when the file has no history or the lookup failed.
  pub last_commit: Option<DateTime<Utc>>,
  pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskModel {
  rules: Vec<RiskRule>,
}

impl RiskModel {
  pub fn new(rules: Vec<RiskRule>) -> Self {
    Self { rules }
  }

  /// Keyword rules (in config order), then extension, then recency.
  pub fn from_config(config: &RiskConfig) -> Self {
    let mut rules: Vec<RiskRule> = config
      .keywords
      .iter()
      .map(|k| RiskRule::keyword(k, config.keyword_weight))
      .collect();
    rules.push(RiskRule::extension(
      &config.source_extension,
      config.extension_weight,
    ));
    rules.push(RiskRule::recent_commit(
      config.recency_days,
      config.recency_weight,
    ));
    Self { rules }
  }

  pub fn rules(&self) -> &[RiskRule] {
    &self.rules
  }

  /// Whether scoring needs the file's last commit time at all.
  pub fn uses_recency(&self) -> bool {
    self
      .rules
      .iter()
      .any(|r| matches!(r.signal, RiskSignal::RecentCommit { .. }))
  }

  pub fn score(&self, facts: &FileFacts<'_>) -> RiskScore {
    let path_lower = facts.path.to_lowercase();
    let raw = self
      .rules
      .iter()
      .filter(|r| r.applies(facts, &path_lower))
      .fold(0.0, |acc, r| acc + r.weight);
    RiskScore::new(raw)
  }
}
