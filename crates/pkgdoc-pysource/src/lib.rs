//! `pkgdoc-pysource`.
//!
//! This crate parses Python modules with `tree-sitter`, finds the module
//! docstring, the top-level functions and the top-level classes with their
//! methods, and applies the private/undocumented inclusion policy.
//!
//! # Example
//!
//! ```no_run
//! use pkgdoc_pysource::{ExtractOptions, extract_from_file};
//!
//! let module = extract_from_file("mypkg/helpers.py", ExtractOptions::default())
//!   .unwrap();
//! if let Some(module) = module {
//!   for class in module.classes() {
//!     println!("{}: {} method(s)", class.name, class.methods.len());
//!   }
//! }
//! ```

mod discover;
pub mod error;
mod extractor;
mod literal;
mod types;

use std::path::Path;

pub use discover::discover_modules;
pub use error::PySourceError;
pub use literal::clean_docstring;
pub use types::{
  ClassDoc,
  Declaration,
  ExtractOptions,
  FunctionDoc,
  KEYWORD_DECORATOR,
  MethodDoc,
  ModuleDoc,
  PRIVATE_PREFIX,
  SourceFile,
  is_private,
};

/// Extract the documented declarations of a Python module held in memory.
///
/// Returns `Ok(None)` when, after applying `options`, the module has no
/// description, no functions and no classes.
///
/// # Errors
///
/// Returns [`PySourceError::Parse`] if `src` is not valid Python.
pub fn extract(
  src: &str,
  options: ExtractOptions,
) -> Result<Option<ModuleDoc>, PySourceError> {
  extract_source(src, Path::new("<memory>"), options)
}

/// Same as [`extract`], with `path` used in error messages.
///
/// # Errors
///
/// Returns [`PySourceError::Parse`] if `src` is not valid Python.
pub fn extract_source(
  src: &str,
  path: &Path,
  options: ExtractOptions,
) -> Result<Option<ModuleDoc>, PySourceError> {
  let tree = extractor::parse_python(src, path)?;
  let module = extractor::collect_module(src, &tree);
  log::debug!(
    "{}: {} declaration(s) before filtering",
    path.display(),
    module.declarations.len()
  );
  Ok(module.filtered(options))
}

/// Read a Python file and extract its documented declarations.
///
/// # Errors
///
/// Returns [`PySourceError::ReadFile`] if the file cannot be read and
/// [`PySourceError::Parse`] if it is not valid Python.
pub fn extract_from_file(
  path: impl AsRef<Path>,
  options: ExtractOptions,
) -> Result<Option<ModuleDoc>, PySourceError> {
  let path = path.as_ref();
  let src = std::fs::read_to_string(path).map_err(|source| {
    PySourceError::ReadFile {
      path: path.to_path_buf(),
      source,
    }
  })?;

  extract_source(&src, path, options)
}
