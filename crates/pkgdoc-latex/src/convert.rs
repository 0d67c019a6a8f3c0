use std::{
  io::Write,
  path::{Path, PathBuf},
  process::{Command, Stdio},
};

use crate::{
  anchors::{AnchorCounter, Disambiguator},
  error::LatexError,
  extensions,
};

/// Arguments pandoc is called with unless configured otherwise.
pub const DEFAULT_PANDOC_ARGS: &[&str] =
  &["--from=rst", "--to=latex", "--wrap=preserve", "--no-highlight"];

/// Turns reStructuredText into LaTeX.
pub trait Converter {
  /// Name used in log and error messages.
  fn name(&self) -> &str;

  /// Convert one complete chapter.
  ///
  /// # Errors
  ///
  /// Returns [`LatexError`] if the conversion cannot be carried out.
  fn convert(&self, markup: &str) -> Result<String, LatexError>;
}

/// Converter running an external `pandoc` binary, feeding markup on stdin.
#[derive(Debug, Clone)]
pub struct PandocConverter {
  program:   PathBuf,
  arguments: Vec<String>,
}

impl Default for PandocConverter {
  fn default() -> Self {
    Self::new(
      "pandoc",
      DEFAULT_PANDOC_ARGS.iter().map(ToString::to_string).collect(),
    )
  }
}

impl PandocConverter {
  pub fn new(program: impl Into<PathBuf>, arguments: Vec<String>) -> Self {
    Self {
      program: program.into(),
      arguments,
    }
  }

  #[must_use]
  pub fn program(&self) -> &Path {
    &self.program
  }

  #[must_use]
  pub fn arguments(&self) -> &[String] {
    &self.arguments
  }

  fn io_error(&self, source: std::io::Error) -> LatexError {
    LatexError::Io {
      tool: self.program.display().to_string(),
      source,
    }
  }
}

impl Converter for PandocConverter {
  fn name(&self) -> &str {
    self.program.to_str().unwrap_or("pandoc")
  }

  fn convert(&self, markup: &str) -> Result<String, LatexError> {
    let mut child = Command::new(&self.program)
      .args(&self.arguments)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .spawn()
      .map_err(|e| self.io_error(e))?;

    let mut stdin = child.stdin.take().ok_or_else(|| {
      self.io_error(std::io::Error::other("stdin of the converter is closed"))
    })?;

    // Feed stdin from a separate thread; pandoc may start writing before it
    // has read all of its input.
    let input = markup.to_string();
    let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

    let output = child.wait_with_output().map_err(|e| self.io_error(e))?;
    let written = writer.join().map_err(|_| {
      self.io_error(std::io::Error::other("stdin writer thread panicked"))
    })?;

    if !output.status.success() {
      return Err(LatexError::Convert {
        tool:    self.name().to_string(),
        message: format!(
          "exited with {}: {}",
          output.status,
          String::from_utf8_lossy(&output.stderr).trim()
        ),
      });
    }

    written.map_err(|e| self.io_error(e))?;

    String::from_utf8(output.stdout).map_err(|e| {
      LatexError::Convert {
        tool:    self.name().to_string(),
        message: format!("output is not valid UTF-8: {e}"),
      }
    })
  }
}

/// Converter returning its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityConverter;

impl Converter for IdentityConverter {
  fn name(&self) -> &str {
    "identity"
  }

  fn convert(&self, markup: &str) -> Result<String, LatexError> {
    Ok(markup.to_string())
  }
}

/// Full conversion of one chapter: mask the syntax extensions, convert,
/// unmask them into LaTeX commands and make all anchors unique.
///
/// `first_prefix` and `second_prefix` are passed on to
/// [`Disambiguator::rewrite_anchors`].
///
/// # Errors
///
/// Returns the converter's error unchanged.
pub fn render_fragment<C: AnchorCounter>(
  converter: &dyn Converter,
  disambiguator: &mut Disambiguator<C>,
  markup: &str,
  first_prefix: &str,
  second_prefix: &str,
) -> Result<String, LatexError> {
  let encoded = extensions::encode(markup);
  let converted = converter.convert(&encoded)?;

  let normalized = converted.lines().collect::<Vec<_>>().join("\n");
  let decoded = extensions::decode(&normalized);

  Ok(disambiguator.rewrite_anchors(&decoded, first_prefix, second_prefix))
}
