use std::{
  fs,
  path::{Path, PathBuf},
  sync::OnceLock,
};

use indexmap::IndexMap;
use pkgdoc_macros::Configurable;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for the pkgdoc documentation generator.
///
/// [`Config`] holds everything a build needs: the document parts in table of
/// contents order, output locations, inclusion policy, the external tools and
/// the runtime variables used for `###KEY###` placeholders. Fields are loaded
/// from one or more TOML or JSON files and can be adjusted afterwards with
/// `--config KEY=VALUE` overrides.
#[derive(Debug, Clone, Serialize, Deserialize, Configurable)]
#[serde(default)]
pub struct Config {
  /// Name of the documented package.
  #[config(key = "package_name")]
  pub package_name: String,

  /// Name of the repository the package lives in.
  #[config(key = "repository_name")]
  pub repository_name: String,

  /// Folder receiving all generated files. Deleted on every build.
  #[config(key = "output_dir")]
  pub output_dir: PathBuf,

  /// Name of the master LaTeX file inside the output folder.
  #[config(key = "main_tex_file", allow_empty)]
  pub main_tex_file: Option<String>,

  /// Folder copied into the output folder before conversion.
  #[config(key = "pictures_dir", allow_empty)]
  pub pictures_dir: Option<PathBuf>,

  /// Folder with LaTeX styles replacing the embedded ones.
  #[config(key = "styles_dir", allow_empty)]
  pub styles_dir: Option<PathBuf>,

  /// Folder the final PDF is copied to.
  #[config(key = "pdf_dest", allow_empty)]
  pub pdf_dest: Option<PathBuf>,

  /// Folder the configuration snapshots are copied to.
  #[config(key = "config_dest", allow_empty)]
  pub config_dest: Option<PathBuf>,

  /// Write the LaTeX sources but do not run the compiler.
  #[config(key = "simulate_only")]
  pub simulate_only: bool,

  /// Document parts in table of contents order.
  pub parts: Vec<DocumentPart>,

  /// Runtime variables for `###KEY###` placeholders.
  pub params: IndexMap<String, serde_json::Value>,

  /// Title page metadata.
  #[config(nested)]
  pub document: Option<DocumentConfig>,

  /// Inclusion policy and failure handling.
  #[config(nested)]
  pub control: Option<ControlConfig>,

  /// LaTeX compiler location per platform.
  #[config(nested)]
  pub tex: Option<TexConfig>,

  /// Markup converter settings.
  #[config(nested)]
  pub converter: Option<ConverterConfig>,

  /// Anchor rewriting settings.
  #[config(nested)]
  pub anchors: Option<AnchorsConfig>,

  /// Folder relative paths are resolved against. Set by [`Config::load`] to
  /// the folder of the first config file.
  #[serde(skip)]
  #[config(skip)]
  pub base_dir: Option<PathBuf>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      package_name:    String::new(),
      repository_name: String::new(),
      output_dir:      PathBuf::from("build"),
      main_tex_file:   None,
      pictures_dir:    None,
      styles_dir:      None,
      pdf_dest:        None,
      config_dest:     None,
      simulate_only:   false,
      parts:           Vec::new(),
      params:          IndexMap::new(),
      document:        None,
      control:         None,
      tex:             None,
      converter:       None,
      anchors:         None,
      base_dir:        None,
    }
  }
}

/// One named entry of the table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPart {
  pub name: String,
  pub path: PathBuf,
}

/// What a document part turns into, derived from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
  /// A folder scanned for Python modules, one chapter per module.
  Interface,

  /// A reStructuredText file converted into one chapter.
  Markup,

  /// A LaTeX file included verbatim as one chapter.
  Typeset,
}

impl PartKind {
  /// Classify an (already resolved) part path. Returns `None` for paths that
  /// are neither an existing folder nor an existing `.rst`/`.tex` file.
  #[must_use]
  pub fn of(path: &Path) -> Option<Self> {
    if path.is_dir() {
      return Some(Self::Interface);
    }
    if !path.is_file() {
      return None;
    }

    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
      "rst" => Some(Self::Markup),
      "tex" => Some(Self::Typeset),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Configurable)]
#[serde(default)]
pub struct DocumentConfig {
  #[config(key = "title")]
  pub title: String,

  #[config(key = "version")]
  pub version: String,

  #[config(key = "author")]
  pub author: String,

  #[config(key = "date")]
  pub date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Configurable)]
#[serde(default)]
pub struct ControlConfig {
  /// Document declarations whose name starts with an underscore.
  #[config(key = "include_private")]
  pub include_private: bool,

  /// Document functions and methods without a docstring.
  #[config(key = "include_undocumented")]
  pub include_undocumented: bool,

  /// Treat a missing or failing LaTeX compiler as fatal.
  #[config(key = "strict")]
  pub strict: bool,
}

impl Default for ControlConfig {
  fn default() -> Self {
    Self {
      include_private:      false,
      include_undocumented: true,
      strict:               true,
    }
  }
}

/// Arguments the LaTeX compiler is called with unless configured otherwise.
pub const DEFAULT_TEX_ARGS: &[&str] =
  &["-interaction=nonstopmode", "-halt-on-error"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Configurable)]
#[serde(default)]
pub struct TexConfig {
  #[config(key = "linux", allow_empty)]
  pub linux: Option<PathBuf>,

  #[config(key = "windows", allow_empty)]
  pub windows: Option<PathBuf>,

  #[config(key = "macos", allow_empty)]
  pub macos: Option<PathBuf>,

  #[config(skip)]
  pub arguments: Option<Vec<String>>,
}

impl Default for TexConfig {
  fn default() -> Self {
    Self {
      linux:     Some(PathBuf::from("pdflatex")),
      windows:   Some(PathBuf::from("pdflatex.exe")),
      macos:     Some(PathBuf::from("pdflatex")),
      arguments: None,
    }
  }
}

impl TexConfig {
  /// Compiler configured for the platform named by `os`
  /// (as in [`std::env::consts::OS`]).
  #[must_use]
  pub fn for_platform(&self, os: &str) -> Option<&Path> {
    match os {
      "linux" => self.linux.as_deref(),
      "windows" => self.windows.as_deref(),
      "macos" => self.macos.as_deref(),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Configurable)]
#[serde(default)]
pub struct ConverterConfig {
  /// Path or name of the pandoc binary.
  #[config(key = "pandoc", allow_empty)]
  pub pandoc: Option<PathBuf>,

  /// Replaces the default pandoc arguments when set.
  #[config(skip)]
  pub arguments: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Configurable)]
#[serde(default)]
pub struct AnchorsConfig {
  /// Append the build-wide counter to rewritten anchors.
  #[config(key = "append_counter")]
  pub append_counter: bool,

  /// Second prefix placed after the module prefix.
  #[config(key = "prefix", allow_empty)]
  pub prefix: Option<String>,
}

impl Default for AnchorsConfig {
  fn default() -> Self {
    Self {
      append_counter: true,
      prefix:         None,
    }
  }
}

impl Config {
  /// Load configuration from a file (TOML or JSON).
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read or parsed, or if the format is
  /// unsupported.
  #[allow(
    clippy::option_if_let_else,
    reason = "Clearer with explicit match on extension"
  )]
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
      ConfigError::Config(format!(
        "Failed to read config file: {}: {}",
        path.display(),
        e
      ))
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
      Some(ext) => {
        match ext.to_lowercase().as_str() {
          "json" => {
            serde_json::from_str(&content).map_err(|e| {
              ConfigError::Config(format!(
                "Failed to parse JSON config from {}: {}",
                path.display(),
                e
              ))
            })
          },
          "toml" => {
            toml::from_str(&content).map_err(|e| {
              ConfigError::Config(format!(
                "Failed to parse TOML config from {}: {}",
                path.display(),
                e
              ))
            })
          },
          _ => {
            Err(ConfigError::Config(format!(
              "Unsupported config file format: {}",
              path.display()
            )))
          },
        }
      },
      None => {
        Err(ConfigError::Config(format!(
          "Config file has no extension: {}",
          path.display()
        )))
      },
    }
  }

  /// Load and merge the given config files (or a discovered one), then apply
  /// `KEY=VALUE` overrides.
  ///
  /// Relative paths are later resolved against the folder of the first
  /// config file, or the working directory when no file was found.
  ///
  /// # Errors
  ///
  /// Returns an error if a file cannot be loaded or an override is invalid.
  pub fn load(
    config_files: &[PathBuf],
    config_overrides: &[String],
  ) -> Result<Self, ConfigError> {
    let (mut config, first_file) = if let Some((first, rest)) =
      config_files.split_first()
    {
      let mut merged_config = Self::from_file(first)?;

      for config_path in rest {
        merged_config.merge(Self::from_file(config_path)?);
      }

      if config_files.len() > 1 {
        log::info!("Loaded and merged {} config files", config_files.len());
      }

      (merged_config, Some(first.clone()))
    } else if let Some(discovered_config) = Self::find_config_file() {
      log::info!(
        "Using discovered config file: {}",
        discovered_config.display()
      );
      (Self::from_file(&discovered_config)?, Some(discovered_config))
    } else {
      log::warn!("No config file given or found, using defaults");
      (Self::default(), None)
    };

    config.base_dir = match first_file {
      Some(file) => {
        let parent = file
          .parent()
          .map(Path::to_path_buf)
          .unwrap_or_default();
        Some(absolute(&parent))
      },
      None => std::env::current_dir().ok(),
    };

    if !config_overrides.is_empty() {
      config.apply_overrides(config_overrides)?;
    }

    Ok(config)
  }

  /// Apply configuration overrides from `KEY=VALUE` strings.
  ///
  /// Nested sections use dotted keys (`control.strict=false`), runtime
  /// variables are set with `params.NAME=value`.
  ///
  /// # Errors
  ///
  /// Returns an error if a string is not in `KEY=VALUE` format, a key is not
  /// recognized, or a value cannot be parsed as the expected type.
  pub fn apply_overrides(
    &mut self,
    overrides: &[String],
  ) -> Result<(), ConfigError> {
    for override_str in overrides {
      let (key, value) = override_str.split_once('=').ok_or_else(|| {
        ConfigError::Config(format!(
          "Invalid config override format: '{override_str}'. Expected \
           KEY=VALUE"
        ))
      })?;

      self.apply_override(key.trim(), value.trim())?;
    }

    Ok(())
  }

  /// Merge another config into this one, with the other config's values taking
  /// precedence.
  ///
  /// # Merge Rules
  ///
  /// - [`Option<T>`] fields: Other's [`Some`] value replaces this config's
  ///   value
  /// - Nested sections present in both configs are merged field by field
  /// - `parts` is appended, `params` entries are inserted or replaced
  /// - Plain fields (String, bool, etc.): Other's value always replaces
  pub fn merge(&mut self, other: Self) {
    self.merge_fields(other);
  }

  /// Search for config files in the working directory.
  #[must_use]
  pub fn find_config_file() -> Option<PathBuf> {
    static RESULT: OnceLock<Option<PathBuf>> = OnceLock::new();
    RESULT
      .get_or_init(|| {
        let config_filenames = [
          "pkgdoc.toml",
          "pkgdoc.json",
          ".pkgdoc.toml",
          ".pkgdoc.json",
          ".config/pkgdoc.toml",
          ".config/pkgdoc.json",
        ];

        let current_dir = std::env::current_dir().ok()?;
        config_filenames
          .iter()
          .map(|filename| current_dir.join(filename))
          .find(|path| path.is_file())
      })
      .clone()
  }

  /// Resolve `path` against [`Config::base_dir`] unless it is absolute.
  #[must_use]
  pub fn resolve_path(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      return path.to_path_buf();
    }
    match self.base_dir {
      Some(ref base) => base.join(path),
      None => path.to_path_buf(),
    }
  }

  /// Name of the master LaTeX file.
  #[must_use]
  pub fn main_tex_file_name(&self) -> String {
    self
      .main_tex_file
      .clone()
      .unwrap_or_else(|| format!("{}.tex", self.package_name))
  }

  #[must_use]
  pub fn output_path(&self) -> PathBuf {
    self.resolve_path(&self.output_dir)
  }

  #[must_use]
  pub fn document_meta(&self) -> DocumentConfig {
    self.document.clone().unwrap_or_default()
  }

  #[must_use]
  pub fn control_flags(&self) -> ControlConfig {
    self.control.unwrap_or_default()
  }

  #[must_use]
  pub fn anchor_settings(&self) -> AnchorsConfig {
    self.anchors.clone().unwrap_or_default()
  }

  /// Whether a missing or failing compiler aborts the build.
  #[must_use]
  pub fn is_strict(&self) -> bool {
    self.control_flags().strict
  }

  /// LaTeX compiler for the running platform. Values containing a path
  /// separator are resolved like any other configured path; bare program
  /// names are looked up on `PATH` when the compiler is spawned.
  #[must_use]
  pub fn compiler_program(&self) -> Option<PathBuf> {
    let tex = self.tex.clone().unwrap_or_default();
    let program = tex.for_platform(std::env::consts::OS)?;
    if program.as_os_str().is_empty() {
      return None;
    }
    Some(self.resolve_program(program))
  }

  #[must_use]
  pub fn compiler_arguments(&self) -> Vec<String> {
    self
      .tex
      .as_ref()
      .and_then(|tex| tex.arguments.clone())
      .unwrap_or_else(|| {
        DEFAULT_TEX_ARGS.iter().map(ToString::to_string).collect()
      })
  }

  /// Configured pandoc binary, or `pandoc` from `PATH`.
  #[must_use]
  pub fn pandoc_program(&self) -> PathBuf {
    self
      .converter
      .as_ref()
      .and_then(|converter| converter.pandoc.as_deref())
      .map_or_else(|| PathBuf::from("pandoc"), |p| self.resolve_program(p))
  }

  /// Configured pandoc arguments; `None` keeps the converter defaults.
  #[must_use]
  pub fn pandoc_arguments(&self) -> Option<Vec<String>> {
    self
      .converter
      .as_ref()
      .and_then(|converter| converter.arguments.clone())
  }

  fn resolve_program(&self, program: &Path) -> PathBuf {
    if program.components().count() > 1 {
      self.resolve_path(program)
    } else {
      program.to_path_buf()
    }
  }

  /// Validate the configuration. All problems are collected and reported
  /// together.
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::Config`] listing every problem found.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if self.package_name.trim().is_empty() {
      errors.push("package_name must not be empty".to_string());
    }

    if self.output_dir.as_os_str().is_empty() {
      errors.push("output_dir must not be empty".to_string());
    }

    let main_tex_file = self.main_tex_file_name();
    let main_path = Path::new(&main_tex_file);
    if !main_tex_file.ends_with(".tex") {
      errors.push(format!(
        "main_tex_file must end with '.tex': {main_tex_file}"
      ));
    } else if main_path.components().count() != 1 {
      errors.push(format!(
        "main_tex_file must be a plain file name: {main_tex_file}"
      ));
    }

    if self.parts.is_empty() {
      errors.push("At least one document part must be configured".to_string());
    }

    for (index, part) in self.parts.iter().enumerate() {
      if part.name.trim().is_empty() {
        errors.push(format!("Document part {} has no name", index + 1));
      }
      if part.path.as_os_str().is_empty() {
        errors.push(format!(
          "Document part {} ('{}') has no path",
          index + 1,
          part.name
        ));
      }
    }

    if let Some(ref pictures_dir) = self.pictures_dir {
      let resolved = self.resolve_path(pictures_dir);
      if !resolved.is_dir() {
        errors.push(format!(
          "Pictures folder does not exist: {}",
          resolved.display()
        ));
      }
    }

    if let Some(ref styles_dir) = self.styles_dir {
      let resolved = self.resolve_path(styles_dir);
      if !resolved.is_dir() {
        errors.push(format!(
          "Styles folder does not exist: {}",
          resolved.display()
        ));
      }
    }

    if !errors.is_empty() {
      let error_message = errors.join("\n");
      return Err(ConfigError::Config(format!(
        "Configuration validation errors:\n{error_message}"
      )));
    }

    Ok(())
  }

  /// Generate a default configuration file with commented explanations.
  ///
  /// # Errors
  ///
  /// Returns an error if the format is not supported or the file cannot be
  /// written.
  pub fn generate_default_config(
    format: &str,
    path: &Path,
  ) -> Result<(), ConfigError> {
    let config_content = crate::templates::get_template(format)
      .map_err(|e| ConfigError::Template(e.to_string()))?;

    fs::write(path, config_content).map_err(|e| {
      ConfigError::Config(format!(
        "Failed to write default config to {}: {}",
        path.display(),
        e
      ))
    })?;

    log::info!("Created default configuration file: {}", path.display());
    Ok(())
  }

  /// Export the embedded LaTeX styles to a folder for customization. The
  /// folder can then be used as `styles_dir`.
  ///
  /// # Errors
  ///
  /// Returns an error if the folder cannot be created or a file cannot be
  /// written.
  pub fn export_styles(output_dir: &Path, force: bool) -> Result<(), ConfigError> {
    fs::create_dir_all(output_dir).map_err(|e| {
      ConfigError::Config(format!(
        "Failed to create styles directory: {}: {}",
        output_dir.display(),
        e
      ))
    })?;

    let mut styles: Vec<_> = pkgdoc_templates::style_files().into_iter().collect();
    styles.sort_unstable_by_key(|(name, _)| *name);

    for (filename, content) in styles {
      let file_path = output_dir.join(filename);

      if file_path.exists() && !force {
        log::warn!(
          "File {} already exists. Use --force to overwrite.",
          file_path.display()
        );
        continue;
      }

      fs::write(&file_path, content).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to write style file: {}: {}",
          file_path.display(),
          e
        ))
      })?;
      log::info!("Exported style: {}", file_path.display());
    }

    Ok(())
  }
}

fn absolute(path: &Path) -> PathBuf {
  if path.is_absolute() {
    return path.to_path_buf();
  }
  std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
}
