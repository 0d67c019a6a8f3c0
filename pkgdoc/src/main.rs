use std::fs;

use color_eyre::eyre::{Context, Result, bail};
use log::{LevelFilter, info};
use pkgdoc::{
  cli::{Cli, Commands},
  driver,
};
use pkgdoc_config::Config;

fn main() -> Result<()> {
  color_eyre::install()?;

  let cli = Cli::parse_args();

  // Initialize logging first so we can log during command handling
  env_logger::Builder::new()
    .filter_level(if cli.verbose {
      LevelFilter::Debug
    } else {
      LevelFilter::Info
    })
    .write_style(env_logger::WriteStyle::Always)
    .init();

  if let Some(command) = &cli.command {
    match command {
      Commands::Init {
        output,
        format,
        force,
      } => {
        if output.exists() && !force {
          bail!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            output.display()
          );
        }

        if let Some(parent) = output.parent() {
          if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).wrap_err_with(|| {
              format!("Failed to create directory: {}", parent.display())
            })?;
            info!("Created directory: {}", parent.display());
          }
        }

        Config::generate_default_config(format, output).wrap_err_with(
          || {
            format!(
              "Failed to generate configuration file: {}",
              output.display()
            )
          },
        )?;

        info!(
          "Configuration file created successfully. Edit it to describe your \
           package and document parts."
        );
        return Ok(());
      },

      Commands::ExportStyles { output_dir, force } => {
        Config::export_styles(output_dir, *force).wrap_err_with(|| {
          format!("Failed to export styles to {}", output_dir.display())
        })?;
        return Ok(());
      },
    }
  }

  let cwd = std::env::current_dir().wrap_err("Cannot read working directory")?;
  let config = Config::load(&cli.config_files, &cli.build_overrides(&cwd))
    .wrap_err("Failed to load configuration")?;

  let converter = driver::pandoc_converter(&config);
  let report = driver::build(&config, &converter).wrap_err_with(|| {
    format!("Documentation build for {} failed", config.package_name)
  })?;

  info!("{}", report.message);
  Ok(())
}
