//! Configuration snapshots written next to the generated sources.
use std::{
  fs,
  path::{Path, PathBuf},
};

use pkgdoc_config::Config;
use pkgdoc_latex::ChapterRecord;
use serde::Serialize;

use crate::{error::BuildError, placeholders::Variables};

/// Everything a build was run with.
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
  pub config:    &'a Config,
  pub variables: &'a Variables,
  pub chapters:  &'a [ChapterRecord],
}

/// File names of the text and JSON snapshot for `package`.
#[must_use]
pub fn snapshot_file_names(package: &str) -> [String; 2] {
  [format!("_CONFIG_{package}.txt"), format!("_CONFIG_{package}.json")]
}

/// Write `_CONFIG_<package>.txt` (pretty debug output) and
/// `_CONFIG_<package>.json` into `output_dir`, and copy both to `dest` if
/// given. Returns the paths of the files written to `output_dir`.
///
/// # Errors
///
/// Returns [`BuildError::Io`] if a file cannot be written or copied.
pub fn dump_config(
  snapshot: &Snapshot<'_>,
  output_dir: &Path,
  dest: Option<&Path>,
) -> Result<Vec<PathBuf>, BuildError> {
  let [txt_name, json_name] = snapshot_file_names(&snapshot.config.package_name);

  let json = serde_json::to_string_pretty(snapshot).map_err(|e| {
    BuildError::Io {
      action: "serializing",
      path:   output_dir.join(&json_name),
      source: e.into(),
    }
  })?;

  let files = [
    (output_dir.join(&txt_name), format!("{snapshot:#?}\n")),
    (output_dir.join(&json_name), json),
  ];

  for (path, content) in &files {
    fs::write(path, content).map_err(BuildError::io("writing", path))?;
    log::debug!("Wrote {}", path.display());
  }

  if let Some(dest) = dest {
    fs::create_dir_all(dest).map_err(BuildError::io("creating", dest))?;
    for ((path, _), name) in files.iter().zip([&txt_name, &json_name]) {
      let target = dest.join(name);
      fs::copy(path, &target).map_err(BuildError::io("copying", &target))?;
      log::info!("Copied {} to {}", path.display(), target.display());
    }
  }

  Ok(files.into_iter().map(|(path, _)| path).collect())
}
