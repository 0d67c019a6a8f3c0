use std::{
  fs,
  path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Command, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate_to};
use clap_mangen::Man;

const BIN_NAME: &str = "pkgdoc";

const SHELLS: [Shell; 4] =
  [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell];

#[derive(Parser)]
#[command(author, version, about)]
struct Xtask {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Generate shell completions and the man page for the pkgdoc CLI
  Dist {
    /// Output directory for generated files.
    #[arg(short, long, default_value = "dist")]
    output_dir: PathBuf,

    /// Only generate shell completions.
    #[arg(long, conflicts_with = "manpage_only")]
    completions_only: bool,

    /// Only generate the man page.
    #[arg(long, conflicts_with = "completions_only")]
    manpage_only: bool,
  },
}

fn main() -> Result<()> {
  let Commands::Dist {
    output_dir,
    completions_only,
    manpage_only,
  } = Xtask::parse().command;

  let cmd = pkgdoc::cli::Cli::command().name(BIN_NAME);

  if !manpage_only {
    completions(cmd.clone(), &output_dir.join("completions"))?;
  }
  if !completions_only {
    manpage(cmd, &output_dir.join("man"))?;
  }

  Ok(())
}

fn completions(mut cmd: Command, dir: &Path) -> Result<()> {
  fs::create_dir_all(dir)
    .with_context(|| format!("Failed to create {}", dir.display()))?;

  for shell in SHELLS {
    let path = generate_to(shell, &mut cmd, BIN_NAME, dir)
      .with_context(|| format!("Failed to generate {shell} completions"))?;
    println!("Wrote {}", path.display());
  }
  Ok(())
}

fn manpage(cmd: Command, dir: &Path) -> Result<()> {
  fs::create_dir_all(dir)
    .with_context(|| format!("Failed to create {}", dir.display()))?;

  let path = dir.join(format!("{BIN_NAME}.1"));
  let mut file = fs::File::create(&path)
    .with_context(|| format!("Failed to create {}", path.display()))?;
  Man::new(cmd)
    .render(&mut file)
    .context("Failed to render man page")?;

  println!("Wrote {}", path.display());
  Ok(())
}
