//! Predictive test selector: deterministic, rule-based (no ML).
//!
//! Collects changed files from the VCS, scores each with path/extension/recency
//! heuristics, maps them to tests by naming convention (falling back to package
//! proximity), and returns a risk-ranked selection capped at a fraction of the
//! test universe. A rolling JSON history keeps recorded outcomes for inspection.
//!
//! git and the filesystem sit behind the `Vcs` and `SourceTree` traits.

pub mod config;
pub mod error;
pub mod history;
pub mod mapping;
pub mod risk;
pub mod runner;
pub mod selector;
pub mod tree;
pub mod types;
pub mod vcs;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use error::SelectorError;
pub use history::HistoryStore;
pub use risk::{RiskModel, RiskRule, RiskSignal};
pub use selector::Selector;
pub use tree::{DiskTree, SourceTree};
pub use types::{RiskScore, Selection, Strategy, TestId};
pub use vcs::{DiffScope, GitCli, Vcs};
