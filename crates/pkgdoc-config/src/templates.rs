use std::fmt;

/// Error type for template operations.
#[derive(Debug)]
pub enum TemplateError {
  /// The requested configuration format is not supported. Contains the name
  /// of the unsupported format.
  UnsupportedFormat(String),
}

impl fmt::Display for TemplateError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::UnsupportedFormat(format) => {
        write!(f, "Unsupported config format: {format}")
      },
    }
  }
}

impl std::error::Error for TemplateError {}

/// Default configuration in TOML, commented so that a fresh `pkgdoc init`
/// explains itself.
pub const DEFAULT_TOML_TEMPLATE: &str = r####"# pkgdoc configuration file
#
# Relative paths are resolved against the folder containing this file.
# Values in part paths and in the [document] and [params] tables may use
# ###KEY### placeholders. Available keys: PACKAGENAME, REPOSITORYNAME, NOW,
# every [params] entry and the upper-cased [document] fields.

# Name of the documented package, used for file names and the \pkg command
package_name = "mypackage"

# Name of the repository, used for the \repo command
repository_name = "mypackage"

# Folder receiving all generated files. It is deleted and recreated on
# every build.
output_dir = "build"

# Name of the master LaTeX file (defaults to "<package_name>.tex")
# main_tex_file = "mypackage.tex"

# Folder copied into the output folder, for images referenced by the docs
# pictures_dir = "pictures"

# Folder with LaTeX styles replacing the embedded preamble
# styles_dir = "styles"

# Folder the final PDF is copied to
# pdf_dest = "../mypackage"

# Folder the configuration snapshots are copied to
# config_dest = "build/config"

# Stop after the LaTeX sources are written; do not run the LaTeX compiler
simulate_only = false

# Document parts in table of contents order. A folder is scanned for Python
# modules (one chapter per module), a .rst file is converted, a .tex file is
# included verbatim.
[[parts]]
name = "Description"
path = "additional_docs/description.rst"

[[parts]]
name = "Interface"
path = "../###PACKAGENAME###"

[document]
title   = "###PACKAGENAME###"
version = "0.1.0"
author  = "Jane Doe"
date    = "###NOW###"

[control]
# Document names starting with an underscore
include_private = false

# Document functions and methods without a docstring
include_undocumented = true

# A missing LaTeX compiler or a failed compilation aborts the build
strict = true

[tex]
# LaTeX compiler per platform
linux   = "pdflatex"
windows = "pdflatex.exe"
macos   = "pdflatex"
# arguments = ["-interaction=nonstopmode", "-halt-on-error"]

[converter]
# pandoc = "/usr/bin/pandoc"
# arguments = ["--from=rst", "--to=latex", "--wrap=preserve", "--no-highlight"]

[anchors]
# Append a build-wide counter to every \hypertarget and \label
append_counter = true

# Extra prefix for every rewritten anchor
# prefix = "api"

# Runtime variables usable as ###KEY### placeholders
[params]
# COMPANY = "Example Corp."
"####;

/// Default configuration in JSON.
pub const DEFAULT_JSON_TEMPLATE: &str = r####"{
  "package_name": "mypackage",
  "repository_name": "mypackage",
  "output_dir": "build",
  "simulate_only": false,
  "parts": [
    {
      "name": "Description",
      "path": "additional_docs/description.rst"
    },
    {
      "name": "Interface",
      "path": "../###PACKAGENAME###"
    }
  ],
  "document": {
    "title": "###PACKAGENAME###",
    "version": "0.1.0",
    "author": "Jane Doe",
    "date": "###NOW###"
  },
  "control": {
    "include_private": false,
    "include_undocumented": true,
    "strict": true
  },
  "tex": {
    "linux": "pdflatex",
    "windows": "pdflatex.exe",
    "macos": "pdflatex"
  },
  "anchors": {
    "append_counter": true
  },
  "params": {}
}
"####;

/// Get the correct configuration template based on the requested format.
///
/// # Errors
///
/// Returns an error if the requested format is not supported.
pub fn get_template(format: &str) -> Result<&'static str, TemplateError> {
  match format.to_lowercase().as_str() {
    "toml" => Ok(DEFAULT_TOML_TEMPLATE),
    "json" => Ok(DEFAULT_JSON_TEMPLATE),
    _ => Err(TemplateError::UnsupportedFormat(format.to_string())),
  }
}
