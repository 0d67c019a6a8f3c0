use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

/// Command line interface for pkgdoc
#[derive(Parser, Debug)]
#[command(
  author,
  version,
  about = "pkgdoc: PDF reference documentation from Python docstrings"
)]
pub struct Cli {
  /// Subcommand to execute (see [`Commands`]). Without one, a build runs.
  #[command(subcommand)]
  pub command: Option<Commands>,

  /// Enable verbose debug logging
  #[arg(short, long)]
  pub verbose: bool,

  /// Path to configuration file(s) (TOML or JSON, can be specified multiple
  /// times) Multiple files are merged in order, with later files overriding
  /// earlier ones
  #[arg(short = 'c', long = "config-file", action = clap::ArgAction::Append)]
  pub config_files: Vec<PathBuf>,

  /// Override configuration values (KEY=VALUE format, can be used multiple
  /// times)
  #[arg(long = "config", action = clap::ArgAction::Append)]
  pub config_overrides: Vec<String>,

  /// Output folder for the generated sources and the PDF.
  #[arg(short, long)]
  pub output: Option<PathBuf>,

  /// Folder the finished PDF is copied to.
  #[arg(long = "pdfdest")]
  pub pdf_dest: Option<PathBuf>,

  /// Whether a missing or failing LaTeX compiler aborts the build.
  #[arg(long, value_name = "true|false")]
  pub strict: Option<bool>,

  /// Write the LaTeX sources without compiling them.
  #[arg(long)]
  pub simulate: bool,
}

/// All supported subcommands for the pkgdoc CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Initialize a new pkgdoc configuration file
  Init {
    /// Path to create the configuration file at
    #[arg(short, long, default_value = "pkgdoc.toml")]
    output: PathBuf,

    /// Format of the configuration file.
    #[arg(short = 'F', long, default_value = "toml", value_parser = ["toml", "json"])]
    format: String,

    /// Force overwrite if file already exists
    #[arg(short, long)]
    force: bool,
  },

  /// Export the embedded LaTeX styles to a folder for customization.
  ExportStyles {
    /// Output folder for the style files.
    #[arg(short, long, default_value = "styles")]
    output_dir: PathBuf,

    /// Whether to overwrite existing files.
    #[arg(long)]
    force: bool,
  },
}

impl Cli {
  /// Parse command line arguments
  #[must_use]
  pub fn parse_args() -> Self {
    Self::parse()
  }

  /// Turn the build flags into `KEY=VALUE` overrides, placed after the
  /// explicit `--config` overrides so the dedicated flags win.
  ///
  /// Folder flags are relative to the working directory `cwd`, unlike paths
  /// inside config files.
  #[must_use]
  pub fn build_overrides(&self, cwd: &Path) -> Vec<String> {
    let mut overrides = self.config_overrides.clone();

    if let Some(ref output) = self.output {
      overrides.push(format!("output_dir={}", cwd.join(output).display()));
    }
    if let Some(ref pdf_dest) = self.pdf_dest {
      overrides.push(format!("pdf_dest={}", cwd.join(pdf_dest).display()));
    }
    if let Some(strict) = self.strict {
      overrides.push(format!("control.strict={strict}"));
    }
    if self.simulate {
      overrides.push("simulate_only=true".to_string());
    }

    overrides
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, reason = "Fine in tests")]
  use super::*;

  #[test]
  fn test_build_flags_become_overrides() {
    let cli = Cli::try_parse_from([
      "pkgdoc",
      "--config",
      "package_name=demo",
      "--output",
      "out",
      "--pdfdest",
      "/srv/docs",
      "--strict",
      "false",
      "--simulate",
    ])
    .unwrap();

    assert_eq!(cli.build_overrides(Path::new("/work")), vec![
      "package_name=demo".to_string(),
      "output_dir=/work/out".to_string(),
      "pdf_dest=/srv/docs".to_string(),
      "control.strict=false".to_string(),
      "simulate_only=true".to_string(),
    ]);
  }

  #[test]
  fn test_subcommands() {
    let cli =
      Cli::try_parse_from(["pkgdoc", "init", "-F", "json", "-f"]).unwrap();
    assert!(matches!(
      cli.command,
      Some(Commands::Init { ref format, force: true, .. }) if format == "json"
    ));

    let cli = Cli::try_parse_from(["pkgdoc", "export-styles", "-o", "tex"])
      .unwrap();
    assert!(matches!(
      cli.command,
      Some(Commands::ExportStyles { ref output_dir, force: false }) if output_dir == Path::new("tex")
    ));
  }

  #[test]
  fn test_strict_requires_boolean() {
    assert!(Cli::try_parse_from(["pkgdoc", "--strict", "maybe"]).is_err());
  }
}
