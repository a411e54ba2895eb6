//! Filesystem capability: existence checks and recursive listing of the source tree.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::debug;

/// Filesystem capability consumed by the selector. Paths are repository-relative with `/` separators.
pub trait SourceTree {
  fn exists(&self, path: &str) -> bool;

  /// Every file below `dir`, sorted. A missing directory yields an empty list.
  fn list_files(&self, dir: &str) -> Vec<String>;
}

/// The project checkout on disk.
#[derive(Debug, Clone)]
pub struct DiskTree {
  root: PathBuf,
}

impl DiskTree {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  fn relative(&self, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(&self.root).ok()?;
    let parts: Vec<&str> = rel
      .components()
      .map(|c| c.as_os_str().to_str())
      .collect::<Option<_>>()?;
    Some(parts.join("/"))
  }
}

impl SourceTree for DiskTree {
  fn exists(&self, path: &str) -> bool {
    self.root.join(path).exists()
  }

  fn list_files(&self, dir: &str) -> Vec<String> {
    let base = self.root.join(dir);
    if !base.is_dir() {
      return Vec::new();
    }

    // Single-threaded walk over everything: tests may live in hidden or ignored dirs.
    let walker = WalkBuilder::new(&base)
      .standard_filters(false)
      .follow_links(false)
      .build();

    let mut files = Vec::new();
    for entry in walker {
      let entry = match entry {
        Ok(e) => e,
        Err(e) => {
          debug!(error = %e, "skipping unreadable entry");
          continue;
        }
      };
      if !entry.file_type().is_some_and(|t| t.is_file()) {
        continue;
      }
      if let Some(rel) = self.relative(entry.path()) {
        files.push(rel);
      }
    }
    files.sort();
    files
  }
}
