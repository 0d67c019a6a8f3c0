use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when extracting declarations from Python sources.
#[derive(Debug, Error)]
pub enum PySourceError {
  /// The Python file or source directory could not be read from disk.
  #[error("failed to read `{path}`: {source}")]
  ReadFile {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The Python source is not syntactically valid.
  ///
  /// `tree-sitter` is error-tolerant and always produces a tree, so this is
  /// raised when that tree contains an `ERROR` or `MISSING` node. Extraction
  /// has no partial-success mode.
  #[error("failed to parse `{path}` as Python (line {line}): {message}")]
  Parse {
    path:    PathBuf,
    line:    usize,
    message: String,
  },

  /// A discovered module does not live below the root it was discovered in.
  #[error("`{path}` is not located below the source root `{root}`")]
  OutsideRoot { path: PathBuf, root: PathBuf },

  /// The bundled Python grammar could not be loaded into the parser.
  #[error("failed to load the Python grammar: {0}")]
  Language(String),
}
