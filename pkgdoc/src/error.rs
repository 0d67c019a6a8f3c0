use std::{io, path::PathBuf};

use pkgdoc_config::ConfigError;
use pkgdoc_latex::LatexError;
use pkgdoc_pysource::PySourceError;
use thiserror::Error;

/// Errors that stop a build.
///
/// A build halts at the first of these. Fragment files written before the
/// failure are left in place.
#[derive(Debug, Error)]
pub enum BuildError {
  /// Missing or invalid settings, raised before any file is processed.
  #[error("Configuration error: {0}")]
  Config(String),

  /// A Python module is not valid Python.
  #[error(transparent)]
  Parse(PySourceError),

  /// Reading, writing or copying a file failed.
  #[error("I/O error while {action} `{path}`: {source}")]
  Io {
    action: &'static str,
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  /// The LaTeX compiler failed or did not produce the expected output.
  #[error("`{tool}` failed: {message}")]
  ExternalTool { tool: String, message: String },

  /// Converting one chapter to LaTeX failed.
  #[error("Conversion of `{path}` failed: {source}")]
  Latex {
    path:   PathBuf,
    #[source]
    source: LatexError,
  },
}

impl BuildError {
  /// Adapter for `map_err` on I/O results.
  pub(crate) fn io(
    action: &'static str,
    path: impl Into<PathBuf>,
  ) -> impl FnOnce(io::Error) -> Self {
    let path = path.into();
    move |source| {
      Self::Io {
        action,
        path,
        source,
      }
    }
  }

  /// Adapter for `map_err` on `fs_extra` results.
  pub(crate) fn copy(
    path: impl Into<PathBuf>,
  ) -> impl FnOnce(fs_extra::error::Error) -> Self {
    let path = path.into();
    move |e| {
      Self::Io {
        action: "copying",
        path,
        source: io::Error::other(e.to_string()),
      }
    }
  }
}

impl From<ConfigError> for BuildError {
  fn from(e: ConfigError) -> Self {
    Self::Config(e.to_string())
  }
}

impl From<PySourceError> for BuildError {
  fn from(e: PySourceError) -> Self {
    match e {
      PySourceError::ReadFile { path, source } => {
        Self::Io {
          action: "reading",
          path,
          source,
        }
      },
      other => Self::Parse(other),
    }
  }
}
