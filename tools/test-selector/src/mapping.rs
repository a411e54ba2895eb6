//! Source-to-test mapping by naming convention, plus package derivation for the fallback.

use crate::config::TestConvention;
use crate::tree::SourceTree;
use crate::types::TestId;

/// Ordered list of conventions; the first one that applies to a path wins.
#[derive(Debug, Clone)]
pub struct TestMapper {
  conventions: Vec<TestConvention>,
}

impl TestMapper {
  pub fn new(conventions: Vec<TestConvention>) -> Self {
    Self { conventions }
  }

  /// Convention whose source segment and extension both fit the path.
  fn convention_for(&self, path: &str) -> Option<&TestConvention> {
    self.conventions.iter().find(|c| {
      path.contains(c.source_segment.as_str()) && path.ends_with(c.extension.as_str())
    })
  }

  /// Package derivation only needs the source segment.
  fn package_convention_for(&self, path: &str) -> Option<&TestConvention> {
    self
      .conventions
      .iter()
      .find(|c| path.contains(c.source_segment.as_str()))
  }

  /// Candidate test paths for a source file, in probe order. Not checked against disk.
  ///
  /// `src/main/java/a/Foo.java` → `src/test/java/a/FooTest.java`, `...FooTests.java`, `...FooIT.java`.
  pub fn candidates(&self, path: &str) -> Vec<String> {
    let Some(conv) = self.convention_for(path) else {
      return Vec::new();
    };
    let Some(stem) = path.strip_suffix(conv.extension.as_str()) else {
      return Vec::new();
    };
    let test_stem = stem.replace(conv.source_segment.as_str(), conv.test_segment.as_str());
    conv
      .suffixes
      .iter()
      .map(|suffix| format!("{}{}{}", test_stem, suffix, conv.extension))
      .collect()
  }

  /// Candidates that exist in the tree. Missing ones are skipped silently.
  pub fn related_tests(&self, path: &str, tree: &dyn SourceTree) -> Vec<TestId> {
    self
      .candidates(path)
      .into_iter()
      .filter(|c| tree.exists(c))
      .map(TestId::new)
      .collect()
  }

  /// Dotted package-and-class name of a main source, e.g. `com.example.PaymentService`.
  ///
  /// Paths outside every convention have no package. When the package root is
  /// absent the whole path is dotted.
  pub fn package_of(&self, path: &str) -> Option<String> {
    let conv = self.package_convention_for(path)?;
    let tail = match path.rsplit_once(conv.package_root.as_str()) {
      Some((_, tail)) => tail,
      None => path,
    };
    let tail = tail.strip_suffix(conv.extension.as_str()).unwrap_or(tail);
    Some(tail.replace('/', "."))
  }
}

/// Loose proximity: the test path contains the whole package, or any one of its segments.
pub fn matches_package(test: &str, package: &str) -> bool {
  if package.is_empty() {
    return false;
  }
  test.contains(package)
    || package
      .split('.')
      .filter(|seg| !seg.is_empty())
      .any(|seg| test.contains(seg))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::MemoryTree;

  fn mapper() -> TestMapper {
    TestMapper::new(vec![TestConvention::default()])
  }

  #[test]
  fn candidates_follow_suffix_order() {
    assert_eq!(
      mapper().candidates("src/main/java/com/example/Foo.java"),
      vec![
        "src/test/java/com/example/FooTest.java",
        "src/test/java/com/example/FooTests.java",
        "src/test/java/com/example/FooIT.java",
      ]
    );
  }

  #[test]
  fn files_outside_main_sources_have_no_candidates() {
    let m = mapper();
    assert!(m.candidates("scripts/deploy.java").is_empty());
    assert!(m.candidates("src/main/resources/app.yml").is_empty());
  }

  #[test]
  fn later_conventions_apply_to_their_extension() {
    let kotlin = TestConvention {
      package_root: "/main/kotlin/".into(),
      extension: ".kt".into(),
      suffixes: vec!["Test".into()],
      ..TestConvention::default()
    };
    let m = TestMapper::new(vec![TestConvention::default(), kotlin]);
    assert_eq!(
      m.candidates("src/main/kotlin/a/Repo.kt"),
      vec!["src/test/kotlin/a/RepoTest.kt"]
    );
  }

  #[test]
  fn only_existing_candidates_are_returned() {
    let tree = MemoryTree::new(&[
      "src/test/java/com/example/FooIT.java",
      "src/test/java/com/example/FooTest.java",
    ]);
    let tests = mapper().related_tests("src/main/java/com/example/Foo.java", &tree);
    assert_eq!(
      tests,
      vec![
        TestId::from("src/test/java/com/example/FooTest.java"),
        TestId::from("src/test/java/com/example/FooIT.java"),
      ]
    );
  }

  #[test]
  fn package_is_dotted_path_after_root() {
    let m = mapper();
    assert_eq!(
      m.package_of("src/main/java/com/example/PaymentService.java").as_deref(),
      Some("com.example.PaymentService")
    );
    assert_eq!(m.package_of("lib/Other.java"), None);
  }

  #[test]
  fn package_without_root_dots_whole_path() {
    assert_eq!(
      mapper().package_of("src/main/kotlin/a/B.kt").as_deref(),
      Some("src.main.kotlin.a.B.kt")
    );
  }

  #[test]
  fn package_match_is_loose() {
    let pkg = "com.example.billing.Invoice";
    assert!(matches_package("src/test/java/com/example/billing/InvoiceTest.java", pkg));
    assert!(matches_package("src/test/java/org/other/InvoiceTest.java", pkg));
    assert!(!matches_package("src/test/java/org/other/LedgerTest.java", pkg));
    assert!(!matches_package("src/test/java/AnyTest.java", ""));
  }
}
