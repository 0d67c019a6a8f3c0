use std::{
  ffi::OsStr,
  path::{Component, Path, PathBuf},
};

use walkdir::{DirEntry, WalkDir};

use crate::{
  error::PySourceError,
  extract_from_file,
  types::{ExtractOptions, SourceFile},
};

/// Folders that never contain modules worth documenting.
const SKIPPED_DIRS: &[&str] = &[".git", "__pycache__"];

fn is_skipped_dir(entry: &DirEntry) -> bool {
  entry.depth() > 0
    && entry.file_type().is_dir()
    && entry
      .file_name()
      .to_str()
      .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn is_python_file(path: &Path) -> bool {
  path
    .extension()
    .and_then(OsStr::to_str)
    .is_some_and(|ext| ext.eq_ignore_ascii_case("py"))
}

/// Find every Python module below `root`, in a stable depth-first order
/// sorted by file name.
///
/// # Errors
///
/// Returns [`PySourceError::ReadFile`] if `root` itself cannot be read.
/// Unreadable entries below it are logged and skipped.
pub fn discover_modules(
  root: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, PySourceError> {
  let root = root.as_ref();

  let mut iter = WalkDir::new(root)
    .follow_links(true)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|entry| !is_skipped_dir(entry))
    .peekable();

  if matches!(iter.peek(), Some(Err(_))) {
    if let Some(Err(e)) = iter.next() {
      return Err(PySourceError::ReadFile {
        path:   root.to_path_buf(),
        source: e.into(),
      });
    }
  }

  let mut modules = Vec::new();
  for result in iter {
    let dent = match result {
      Ok(d) => d,
      Err(e) => {
        log::warn!("skipping unreadable directory entry: {e}");
        continue;
      },
    };

    if dent.file_type().is_file() && is_python_file(dent.path()) {
      modules.push(dent.into_path());
    }
  }

  log::debug!(
    "discovered {} Python module(s) below {}",
    modules.len(),
    root.display()
  );
  Ok(modules)
}

fn os_to_string(s: &OsStr) -> String {
  s.to_string_lossy().into_owned()
}

/// Name of the root folder, resolving `.` and friends through the
/// filesystem when the path itself has no final component.
fn root_name(root: &Path) -> String {
  root
    .file_name()
    .map(os_to_string)
    .or_else(|| {
      std::fs::canonicalize(root)
        .ok()
        .and_then(|p| p.file_name().map(os_to_string))
    })
    .unwrap_or_default()
}

impl SourceFile {
  /// Read and extract the module at `path`, which must live below `root`.
  ///
  /// Returns `Ok(None)` when the module has nothing relevant to document
  /// under `options`.
  ///
  /// # Errors
  ///
  /// Returns [`PySourceError::OutsideRoot`] if `path` is not below `root`,
  /// and any error [`extract_from_file`] reports.
  pub fn load(
    root: impl AsRef<Path>,
    path: impl AsRef<Path>,
    options: ExtractOptions,
  ) -> Result<Option<Self>, PySourceError> {
    let (root, path) = (root.as_ref(), path.as_ref());

    let relative = path.strip_prefix(root).map_err(|_| {
      PySourceError::OutsideRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
      }
    })?;

    let Some(module) = extract_from_file(path, options)? else {
      return Ok(None);
    };

    let folders: Vec<String> = relative
      .parent()
      .map(|parent| {
        parent
          .components()
          .filter_map(|c| {
            match c {
              Component::Normal(name) => Some(os_to_string(name)),
              _ => None,
            }
          })
          .collect()
      })
      .unwrap_or_default();

    let root_name = root_name(root);
    let file_stem = path.file_stem().map(os_to_string).unwrap_or_default();
    let file_name = path.file_name().map(os_to_string).unwrap_or_default();

    let import_path = std::iter::once(root_name.as_str())
      .chain(folders.iter().map(String::as_str))
      .chain(std::iter::once(file_stem.as_str()))
      .filter(|segment| !segment.is_empty())
      .collect::<Vec<_>>()
      .join(".");

    Ok(Some(Self {
      path: path.to_path_buf(),
      sub_path: (!folders.is_empty()).then(|| folders.join("/")),
      root_name,
      file_name,
      file_stem,
      import_path,
      module,
    }))
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use std::fs;

  use tempfile::tempdir;

  use super::*;

  fn touch(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    fs::write(path, content).expect("write file");
  }

  #[test]
  fn test_discover_is_sorted_and_skips_caches() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path().join("pkg");
    touch(&root.join("b.py"), "");
    touch(&root.join("a.py"), "");
    touch(&root.join("sub/c.PY"), "");
    touch(&root.join("notes.txt"), "");
    touch(&root.join("__pycache__/a.py"), "");
    touch(&root.join(".git/hooks/x.py"), "");

    let found: Vec<_> = discover_modules(&root)
      .expect("discover")
      .into_iter()
      .map(|p| {
        p.strip_prefix(&root)
          .expect("below root")
          .to_string_lossy()
          .replace('\\', "/")
      })
      .collect();

    assert_eq!(found, vec!["a.py", "b.py", "sub/c.PY"]);
  }

  #[test]
  fn test_discover_missing_root() {
    let dir = tempdir().expect("tempdir");
    let result = discover_modules(dir.path().join("missing"));
    assert!(matches!(result, Err(PySourceError::ReadFile { .. })));
  }

  #[test]
  fn test_load_computes_import_path() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path().join("mypkg");
    let file = root.join("util/helpers.py");
    touch(&file, "class Helper:\n    '''Helps.'''\n");

    let source = SourceFile::load(&root, &file, ExtractOptions::default())
      .expect("load")
      .expect("relevant");

    assert_eq!(source.root_name, "mypkg");
    assert_eq!(source.sub_path.as_deref(), Some("util"));
    assert_eq!(source.file_name, "helpers.py");
    assert_eq!(source.file_stem, "helpers");
    assert_eq!(source.import_path, "mypkg.util.helpers");
  }

  #[test]
  fn test_load_irrelevant_module() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path().join("mypkg");
    let file = root.join("empty.py");
    touch(&file, "import os\nX = 1\n");

    let source = SourceFile::load(&root, &file, ExtractOptions::default())
      .expect("load");
    assert!(source.is_none());
  }

  #[test]
  fn test_load_outside_root() {
    let dir = tempdir().expect("tempdir");
    let result = SourceFile::load(
      dir.path().join("a"),
      dir.path().join("b/x.py"),
      ExtractOptions::default(),
    );
    assert!(matches!(result, Err(PySourceError::OutsideRoot { .. })));
  }
}
