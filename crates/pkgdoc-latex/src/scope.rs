use indexmap::IndexMap;

/// Characters replaced by `-` when building a scope id.
pub const SCOPE_SEPARATORS: &[char] = &[' ', '_', '.', '/', '\\'];

/// Characters replaced by `-` when turning an import path into an anchor
/// prefix.
pub const ANCHOR_PREFIX_SEPARATORS: &[char] = &['_', '.', ':', ' '];

/// Build a scope id from its parts.
///
/// Parts are joined with `-`, every separator character becomes a single
/// `-` and the result is lowercased. Empty parts are skipped so optional
/// scope levels (such as a missing sub-path) leave no trace.
///
/// ```
/// use pkgdoc_latex::scope_format;
///
/// assert_eq!(
///   scope_format(&["my_pkg", "sub/dir", "Helper", "run"]),
///   "my-pkg-sub-dir-helper-run"
/// );
/// ```
#[must_use]
pub fn scope_format<S: AsRef<str>>(parts: &[S]) -> String {
  parts
    .iter()
    .map(AsRef::as_ref)
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join("-")
    .replace(SCOPE_SEPARATORS, "-")
    .to_lowercase()
}

/// Normalize an import path (`pkg.sub.module`) into an anchor prefix.
#[must_use]
pub fn anchor_prefix(import_path: &str) -> String {
  import_path
    .replace(ANCHOR_PREFIX_SEPARATORS, "-")
    .to_lowercase()
}

/// Scope ids handed out during one build, with the headline each one was
/// created for.
///
/// Registering an id twice with different headlines means two declarations
/// would share a section identifier; this is reported but not fatal.
#[derive(Debug, Clone, Default)]
pub struct ScopeRegistry {
  scopes: IndexMap<String, String>,
}

impl ScopeRegistry {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Record `scope` for `headline`. Returns `false` when the scope id was
  /// already registered.
  pub fn register(
    &mut self,
    scope: impl Into<String>,
    headline: impl Into<String>,
  ) -> bool {
    let (scope, headline) = (scope.into(), headline.into());

    if let Some(existing) = self.scopes.get(&scope) {
      if *existing == headline {
        log::debug!("scope `{scope}` registered again for `{headline}`");
      } else {
        log::warn!(
          "scope id collision: `{scope}` is used by `{existing}` and \
           `{headline}`"
        );
      }
      return false;
    }

    self.scopes.insert(scope, headline);
    true
  }

  #[must_use]
  pub fn headline(&self, scope: &str) -> Option<&str> {
    self.scopes.get(scope).map(String::as_str)
  }

  #[must_use]
  pub fn contains(&self, scope: &str) -> bool {
    self.scopes.contains_key(scope)
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.scopes.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.scopes.is_empty()
  }

  /// Scope ids and headlines in registration order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .scopes
      .iter()
      .map(|(scope, headline)| (scope.as_str(), headline.as_str()))
  }

  /// Forget everything; called at the start of a build.
  pub fn clear(&mut self) {
    self.scopes.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_scope_format_normalizes_separators() {
    assert_eq!(
      scope_format(&["Root Folder", "sub_dir/inner", "file.name"]),
      "root-folder-sub-dir-inner-file-name"
    );
    assert_eq!(scope_format(&[r"a\b"]), "a-b");
  }

  #[test]
  fn test_scope_format_skips_empty_parts() {
    assert_eq!(scope_format(&["pkg", "", "mod"]), "pkg-mod");
    assert_eq!(scope_format::<&str>(&[]), "");
  }

  #[test]
  fn test_scope_format_is_idempotent() {
    let once = scope_format(&["My_Pkg", "a.b", "Class Name", "__init__"]);
    let twice = scope_format(&[once.as_str()]);
    assert_eq!(once, twice);
    assert_eq!(once.matches('-').count(), twice.matches('-').count());
  }

  #[test]
  fn test_scope_format_keeps_dunder_structure() {
    assert_eq!(
      scope_format(&["pkg-mod", "C", "__init__"]),
      "pkg-mod-c---init--"
    );
  }

  #[test]
  fn test_distinct_files_distinct_scopes() {
    let a = scope_format(&["pkg", "a", "Helper", "Run"]);
    let b = scope_format(&["pkg", "b", "Helper", "Run"]);
    assert_eq!(a, "pkg-a-helper-run");
    assert_eq!(b, "pkg-b-helper-run");
    assert_ne!(a, b);
  }

  #[test]
  fn test_anchor_prefix() {
    assert_eq!(anchor_prefix("My_Pkg.sub.module"), "my-pkg-sub-module");
    assert_eq!(anchor_prefix("a:b c"), "a-b-c");
    assert_eq!(anchor_prefix("keep/slash"), "keep/slash");
  }

  #[test]
  fn test_registry_tracks_collisions() {
    let mut registry = ScopeRegistry::new();
    assert!(registry.register("pkg-a-f", "Function: f"));
    assert!(!registry.register("pkg-a-f", "Function: F"));
    assert!(registry.register("pkg-b-f", "Function: f"));

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.headline("pkg-a-f"), Some("Function: f"));
    let scopes: Vec<_> = registry.iter().map(|(scope, _)| scope).collect();
    assert_eq!(scopes, vec!["pkg-a-f", "pkg-b-f"]);

    registry.clear();
    assert!(registry.is_empty());
  }
}
