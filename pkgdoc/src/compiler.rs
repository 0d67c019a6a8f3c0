//! Running the LaTeX compiler.
use std::{
  io,
  path::{Path, PathBuf},
  process::{Command, Output, Stdio},
};

use crate::error::BuildError;

/// Number of compiler runs. The second run picks up the table of contents
/// and cross references written by the first.
pub const PASSES: usize = 2;

/// Lines of compiler output quoted in error messages.
const OUTPUT_TAIL_LINES: usize = 20;

#[derive(Debug, Clone)]
pub struct Compiler {
  program:   PathBuf,
  arguments: Vec<String>,
}

impl Compiler {
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

  fn name(&self) -> String {
    self.program.display().to_string()
  }

  fn failure(&self, message: impl Into<String>) -> BuildError {
    BuildError::ExternalTool {
      tool:    self.name(),
      message: message.into(),
    }
  }

  fn spawn_error(&self, e: &io::Error) -> BuildError {
    if e.kind() == io::ErrorKind::NotFound {
      self.failure("LaTeX compiler not found")
    } else {
      self.failure(format!("cannot be started: {e}"))
    }
  }

  fn pass(&self, workdir: &Path, main_tex: &str) -> Result<Output, BuildError> {
    Command::new(&self.program)
      .args(&self.arguments)
      .arg(main_tex)
      .current_dir(workdir)
      .stdin(Stdio::null())
      .output()
      .map_err(|e| self.spawn_error(&e))
  }

  /// Compile `main_tex` inside `workdir`.
  ///
  /// All [`PASSES`] always run; only the exit status of the last one
  /// decides success.
  ///
  /// # Errors
  ///
  /// Returns [`BuildError::ExternalTool`] if the compiler cannot be started
  /// or its last pass fails.
  pub fn run(&self, workdir: &Path, main_tex: &str) -> Result<(), BuildError> {
    let mut outputs = Vec::with_capacity(PASSES);
    for pass in 1..=PASSES {
      log::info!("Running {} on {main_tex} (pass {pass}/{PASSES})", self.name());
      let output = self.pass(workdir, main_tex)?;
      log::debug!("{} returned {}", self.name(), output.status);
      outputs.push(output);
    }

    let Some((last, earlier)) = outputs.split_last() else {
      return Ok(());
    };

    if last.status.success() {
      if earlier.iter().any(|output| !output.status.success()) {
        log::warn!(
          "{} reported errors in an earlier pass but the last pass succeeded",
          self.name()
        );
      }
      return Ok(());
    }

    Err(self.failure(format!(
      "exited with {}:\n{}",
      last.status,
      output_tail(&last.stdout, OUTPUT_TAIL_LINES)
    )))
  }
}

/// Last `lines` lines of a process output.
fn output_tail(output: &[u8], lines: usize) -> String {
  let text = String::from_utf8_lossy(output);
  let all: Vec<&str> = text.lines().collect();
  all[all.len().saturating_sub(lines)..].join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_output_tail() {
    assert_eq!(output_tail(b"a\nb\nc\n", 2), "b\nc");
    assert_eq!(output_tail(b"a\n", 5), "a");
    assert_eq!(output_tail(b"", 5), "");
  }

  #[test]
  fn test_missing_compiler() {
    let dir = std::env::temp_dir();
    let compiler = Compiler::new("/nonexistent/pkgdoc-test-pdflatex", Vec::new());
    let err = compiler.run(&dir, "main.tex");
    assert!(matches!(
      err,
      Err(BuildError::ExternalTool { ref message, .. }) if message == "LaTeX compiler not found"
    ));
  }
}
