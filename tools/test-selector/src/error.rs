//! Structured error types for the test selector.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SelectorError {
  #[error("io: {0}")]
  Io(#[from] std::io::Error),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("glob: {0}")]
  Glob(#[from] globset::Error),

  #[error("vcs: {0}")]
  Vcs(String),

  #[error("config: {field}: {reason}")]
  Config { field: String, reason: String },

  #[error("runner: {program}: {source}")]
  Runner {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("history: {path}: {source}")]
  History {
    path: PathBuf,
    #[source]
    source: Box<SelectorError>,
  },
}

impl SelectorError {
  pub fn vcs(msg: impl Into<String>) -> Self {
    Self::Vcs(msg.into())
  }

  pub fn config(field: &str, reason: &str) -> Self {
    Self::Config {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn history(path: impl Into<PathBuf>, source: SelectorError) -> Self {
    Self::History {
      path: path.into(),
      source: Box::new(source),
    }
  }
}
