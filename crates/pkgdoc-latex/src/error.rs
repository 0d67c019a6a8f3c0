use thiserror::Error;

/// Errors raised while turning markup into LaTeX.
#[derive(Debug, Error)]
pub enum LatexError {
  /// The converter ran but rejected the markup or produced unusable output.
  #[error("`{tool}` failed to convert the markup: {message}")]
  Convert { tool: String, message: String },

  /// The converter process could not be started or talked to.
  #[error("I/O error while running `{tool}`: {source}")]
  Io {
    tool:   String,
    #[source]
    source: std::io::Error,
  },
}
