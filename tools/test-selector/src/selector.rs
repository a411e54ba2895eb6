//! Core selector: scores changed files, maps them to tests, ranks and bounds the result.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use globset::{Glob, GlobMatcher};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::SelectorError;
use crate::mapping::{self, TestMapper};
use crate::risk::{FileFacts, RiskModel};
use crate::tree::SourceTree;
use crate::types::*;
use crate::vcs::{self, Vcs};

/// Number of ids echoed in the progress log.
const PREVIEW_LEN: usize = 5;

/// Predictive test selector over injected VCS and filesystem capabilities.
///
/// Holds no state between calls besides its configuration; every call re-queries
/// the collaborators.
pub struct Selector<V, T> {
  config: Config,
  vcs: V,
  tree: T,
  model: RiskModel,
  mapper: TestMapper,
  test_matcher: GlobMatcher,
  now: DateTime<Utc>,
}

impl<V, T> Selector<V, T>
where
  V: Vcs,
  T: SourceTree,
{
  pub fn new(config: Config, vcs: V, tree: T) -> Result<Self, SelectorError> {
    config.validate()?;
    let test_matcher = Glob::new(&config.layout.test_glob)?.compile_matcher();
    Ok(Self {
      model: RiskModel::from_config(&config.risk),
      mapper: TestMapper::new(config.layout.conventions.clone()),
      test_matcher,
      config,
      vcs,
      tree,
      now: Utc::now(),
    })
  }

  /// Evaluate recency against a fixed instant instead of the construction time.
  pub fn at(mut self, now: DateTime<Utc>) -> Self {
    self.now = now;
    self
  }

  /// Replace the config-derived risk rules.
  pub fn with_model(mut self, model: RiskModel) -> Self {
    self.model = model;
    self
  }

  /// Changed files from the VCS; empty on any VCS failure.
  pub fn changed_files(&self) -> Vec<String> {
    vcs::changed_files(&self.vcs).into_iter().collect()
  }

  /// The test universe: files under the test root whose name matches the test glob.
  pub fn all_tests(&self) -> Vec<TestId> {
    self
      .tree
      .list_files(&self.config.layout.test_root)
      .into_iter()
      .filter(|path| {
        let name = path.rsplit('/').next().unwrap_or(path);
        self.test_matcher.is_match(name)
      })
      .map(TestId::new)
      .collect()
  }

  /// `max(1, floor(cap_ratio * universe))`.
  pub fn selection_cap(&self, universe: usize) -> usize {
    ((universe as f64 * self.config.selection.cap_ratio).floor() as usize).max(1)
  }

  /// Risk of one file. A failed commit-time lookup just drops the recency bonus.
  pub fn risk(&self, file: &str) -> RiskScore {
    let last_commit = if self.model.uses_recency() {
      match self.vcs.last_commit_time(file) {
        Ok(ts) => ts,
        Err(e) => {
          debug!(file, error = %e, "no commit time, skipping recency");
          None
        }
      }
    } else {
      None
    };
    self.model.score(&FileFacts {
      path: file,
      last_commit,
      now: self.now,
    })
  }

  /// Every (test, risk) pair reachable from the changed files, highest risk first.
  ///
  /// Pairs are not merged across files; equal risks keep collection order.
  pub fn ranked_candidates(&self, changed: &[String]) -> Vec<ScoredTest> {
    let mut pairs = Vec::new();
    for file in changed {
      let related = self.mapper.related_tests(file, &self.tree);
      if related.is_empty() {
        continue;
      }
      let risk = self.risk(file);
      debug!(file = file.as_str(), risk = risk.value(), tests = related.len(), "scored file");
      pairs.extend(related.into_iter().map(|test| ScoredTest {
        test,
        risk,
        source: file.clone(),
      }));
    }
    pairs.sort_by(|a, b| b.risk.partial_cmp(&a.risk).unwrap_or(Ordering::Equal));
    pairs
  }

  /// Risk-ranked selection, bounded by the selection cap. Zero-risk tests are never picked.
  pub fn select_tests(&self, changed: &[String]) -> Selection {
    let ranked = self.ranked_candidates(changed);
    let cap = self.selection_cap(self.all_tests().len());

    let mut tests: Vec<TestId> = Vec::new();
    for pair in ranked {
      if tests.len() >= cap {
        break;
      }
      if pair.risk.is_positive() && !tests.contains(&pair.test) {
        tests.push(pair.test);
      }
    }

    Selection {
      tests,
      strategy: Strategy::Risk,
      changed_files: changed.len(),
    }
  }

  /// Package-proximity fallback: first-found order, at most `package_limit` tests.
  pub fn select_by_package(&self, changed: &[String]) -> Selection {
    let universe = self.all_tests();
    let limit = self.config.selection.package_limit;
    let mut tests: Vec<TestId> = Vec::new();

    for file in changed {
      let Some(package) = self.mapper.package_of(file) else {
        continue;
      };
      for test in &universe {
        if mapping::matches_package(test.as_str(), &package) && !tests.contains(test) {
          tests.push(test.clone());
        }
      }
    }
    tests.truncate(limit);

    Selection {
      tests,
      strategy: Strategy::Package,
      changed_files: changed.len(),
    }
  }

  /// Full pipeline: no changes → everything; else risk selection; else package fallback.
  pub fn select(&self) -> Selection {
    info!("analyzing changes");
    let changed = self.changed_files();
    info!(count = changed.len(), "changed files");

    let selection = if changed.is_empty() {
      info!("no changes detected, running all tests");
      Selection {
        tests: self.all_tests(),
        strategy: Strategy::All,
        changed_files: 0,
      }
    } else {
      let direct = self.select_tests(&changed);
      if direct.is_empty() {
        info!("no direct test matches, using package-based selection");
        self.select_by_package(&changed)
      } else {
        direct
      }
    };

    info!(
      count = selection.len(),
      strategy = %selection.strategy,
      "selected tests for execution"
    );
    if !selection.is_empty() {
      let preview: Vec<&str> = selection.head(PREVIEW_LEN).iter().map(TestId::as_str).collect();
      info!(first = ?preview, "selection preview");
    }
    selection
  }
}
