//! The build pipeline: from configured document parts to the PDF.
//!
//! A build runs these stages in order and halts at the first fatal error:
//!
//! 1. clean the output folder
//! 2. copy the pictures folder
//! 3. resolve every document part
//! 4. turn every part into one or more LaTeX fragments
//! 5. write the LaTeX styles
//! 6. compose the master document
//! 7. dump configuration snapshots
//! 8. compile the PDF (unless simulating)
use std::{
  fs,
  path::{Path, PathBuf},
};

use fs_extra::dir::CopyOptions;
use jiff::Zoned;
use pkgdoc_config::{Config, PartKind};
use pkgdoc_latex::{
  AnchorStyle,
  ChapterRecord,
  Converter,
  DEFAULT_PANDOC_ARGS,
  Disambiguator,
  DocumentMeta,
  PandocConverter,
  ScopeRegistry,
  Trailer,
  anchor_prefix,
  autodefined_sty,
  compose_main_document,
  fragment_header,
  render_fragment,
  scope_format,
};
use pkgdoc_pysource::{ExtractOptions, SourceFile, discover_modules};
use pkgdoc_templates::{AUTODEFINED_STY, STYLES_DIR, style_files};
use serde::Serialize;

use crate::{
  assemble::{assemble, module_scope},
  compiler::Compiler,
  dump::{Snapshot, dump_config},
  error::BuildError,
  placeholders::{Variables, resolve_placeholders, runtime_variables, variable},
};

/// Format of the build timestamp (`NOW`), e.g. `05.03.2025 - 14:07:59`.
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y - %H:%M:%S";

/// Current local time in [`TIMESTAMP_FORMAT`].
#[must_use]
pub fn timestamp() -> String {
  Zoned::now().strftime(TIMESTAMP_FORMAT).to_string()
}

/// Outcome of a successful build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
  /// Chapters of the master document, in order.
  pub chapters: Vec<ChapterRecord>,
  pub main_tex: PathBuf,
  /// The compiled PDF inside the output folder, if one was produced.
  pub pdf:      Option<PathBuf>,
  pub message:  String,
}

/// The pandoc converter described by `config`.
#[must_use]
pub fn pandoc_converter(config: &Config) -> PandocConverter {
  let arguments = config.pandoc_arguments().unwrap_or_else(|| {
    DEFAULT_PANDOC_ARGS.iter().map(ToString::to_string).collect()
  });
  PandocConverter::new(config.pandoc_program(), arguments)
}

/// Run a complete build with the current time as `NOW`.
///
/// # Errors
///
/// Returns the first fatal [`BuildError`]; see [`build_at`].
pub fn build(
  config: &Config,
  converter: &dyn Converter,
) -> Result<BuildReport, BuildError> {
  build_at(config, converter, &timestamp())
}

/// Run a complete build with `now` as the build timestamp.
///
/// # Errors
///
/// Returns [`BuildError::Config`] for invalid settings or document parts,
/// [`BuildError::Parse`] for a module that is not valid Python,
/// [`BuildError::Latex`] when a chapter cannot be converted,
/// [`BuildError::Io`] when a file operation fails, and
/// [`BuildError::ExternalTool`] when compilation fails in strict mode.
pub fn build_at(
  config: &Config,
  converter: &dyn Converter,
  now: &str,
) -> Result<BuildReport, BuildError> {
  config.validate()?;
  Builder::new(config, converter, now).run()
}

#[derive(Debug)]
struct ResolvedPart {
  name: String,
  path: PathBuf,
  kind: PartKind,
}

fn stem_of(path: &Path) -> String {
  path
    .file_stem()
    .map(|stem| stem.to_string_lossy().into_owned())
    .unwrap_or_default()
}

struct Builder<'a> {
  config:        &'a Config,
  converter:     &'a dyn Converter,
  now:           &'a str,
  output:        PathBuf,
  main_tex:      String,
  variables:     Variables,
  registry:      ScopeRegistry,
  disambiguator: Disambiguator,
  options:       ExtractOptions,
  second_prefix: String,
  chapters:      Vec<ChapterRecord>,
}

impl<'a> Builder<'a> {
  fn new(config: &'a Config, converter: &'a dyn Converter, now: &'a str) -> Self {
    let control = config.control_flags();
    let anchors = config.anchor_settings();

    Self {
      config,
      converter,
      now,
      output: config.output_path(),
      main_tex: config.main_tex_file_name(),
      variables: runtime_variables(config, now),
      registry: ScopeRegistry::new(),
      disambiguator: Disambiguator::new(AnchorStyle {
        append_counter: anchors.append_counter,
      }),
      options: ExtractOptions::new(
        control.include_private,
        control.include_undocumented,
      ),
      second_prefix: anchors.prefix.unwrap_or_default(),
      chapters: Vec::new(),
    }
  }

  fn run(mut self) -> Result<BuildReport, BuildError> {
    log::info!(
      "Building documentation for {} into {}",
      self.config.package_name,
      self.output.display()
    );

    self.clean_output()?;
    self.copy_pictures()?;

    for part in self.resolve_parts()? {
      log::info!("Processing part '{}' ({})", part.name, part.path.display());
      match part.kind {
        PartKind::Interface => self.interface(&part)?,
        PartKind::Markup => self.markup(&part)?,
        PartKind::Typeset => self.typeset(&part)?,
      }
    }

    self.write_styles()?;
    let main_tex = self.write_main_document()?;

    let snapshot = Snapshot {
      config:    self.config,
      variables: &self.variables,
      chapters:  &self.chapters,
    };
    let config_dest = self
      .config
      .config_dest
      .as_deref()
      .map(|dest| self.config.resolve_path(dest));
    dump_config(&snapshot, &self.output, config_dest.as_deref())?;

    let pdf = self.compile()?;

    let message = match (&pdf, self.config.simulate_only) {
      (Some(pdf), _) => {
        format!(
          "Documentation with {} chapter(s) written to {}",
          self.chapters.len(),
          pdf.display()
        )
      },
      (None, true) => {
        format!(
          "LaTeX sources with {} chapter(s) written to {} (simulation only)",
          self.chapters.len(),
          self.output.display()
        )
      },
      (None, false) => {
        format!(
          "LaTeX sources with {} chapter(s) written to {}, no PDF was produced",
          self.chapters.len(),
          self.output.display()
        )
      },
    };

    Ok(BuildReport {
      chapters: self.chapters,
      main_tex,
      pdf,
      message,
    })
  }

  fn clean_output(&self) -> Result<(), BuildError> {
    if let Some(ref base) = self.config.base_dir {
      if base.starts_with(&self.output) {
        return Err(BuildError::Config(format!(
          "Refusing to clean output folder {} because it contains the \
           configuration folder {}",
          self.output.display(),
          base.display()
        )));
      }
    }

    if self.output.exists() {
      log::debug!("Removing {}", self.output.display());
      fs::remove_dir_all(&self.output)
        .map_err(BuildError::io("removing", &self.output))?;
    }
    fs::create_dir_all(&self.output)
      .map_err(BuildError::io("creating", &self.output))
  }

  fn copy_pictures(&self) -> Result<(), BuildError> {
    let Some(ref pictures) = self.config.pictures_dir else {
      return Ok(());
    };

    let source = self.config.resolve_path(pictures);
    if !source.is_dir() {
      return Err(BuildError::Config(format!(
        "Pictures folder does not exist: {}",
        source.display()
      )));
    }

    log::info!("Copying pictures from {}", source.display());
    let options = CopyOptions::new().overwrite(true);
    fs_extra::dir::copy(&source, &self.output, &options)
      .map_err(BuildError::copy(&source))?;
    Ok(())
  }

  /// Resolve placeholders and relative paths of every part and classify it.
  /// All invalid parts are reported together.
  fn resolve_parts(&self) -> Result<Vec<ResolvedPart>, BuildError> {
    let mut parts = Vec::with_capacity(self.config.parts.len());
    let mut errors = Vec::new();

    for part in &self.config.parts {
      let raw = part.path.to_string_lossy();
      let resolved = resolve_placeholders(&raw, &self.variables);
      let path = self.config.resolve_path(Path::new(&resolved));

      match PartKind::of(&path) {
        Some(kind) => {
          log::debug!("Part '{}' is {kind:?}: {}", part.name, path.display());
          parts.push(ResolvedPart {
            name: part.name.clone(),
            path,
            kind,
          });
        },
        None if path.exists() => {
          errors.push(format!(
            "Document part '{}' is neither a folder nor a .rst or .tex file: {}",
            part.name,
            path.display()
          ));
        },
        None => {
          errors.push(format!(
            "Document part '{}' does not exist: {}",
            part.name,
            path.display()
          ));
        },
      }
    }

    if errors.is_empty() {
      Ok(parts)
    } else {
      Err(BuildError::Config(errors.join("\n")))
    }
  }

  fn interface(&mut self, part: &ResolvedPart) -> Result<(), BuildError> {
    let modules = discover_modules(&part.path)?;
    if modules.is_empty() {
      log::warn!("No Python modules found in {}", part.path.display());
    }

    for path in modules {
      match SourceFile::load(&part.path, &path, self.options)? {
        Some(source) => self.module(&source)?,
        None => log::info!("Skipping {}: nothing to document", path.display()),
      }
    }
    Ok(())
  }

  fn module(&mut self, source: &SourceFile) -> Result<(), BuildError> {
    log::info!("Documenting {}", source.import_path);

    let scope = module_scope(source);
    self.claim(&scope, &source.import_path)?;

    let assembled = assemble(source, &mut self.registry);
    let markup = resolve_placeholders(&assembled.markup, &self.variables);

    let debug_copy = self.output.join(format!("{scope}.py.rst"));
    fs::write(&debug_copy, &markup)
      .map_err(BuildError::io("writing", &debug_copy))?;

    let tex =
      self.render(&markup, &anchor_prefix(&source.import_path), &source.path)?;
    let file_name = format!("{scope}.tex");
    self.write_fragment(&file_name, &tex)?;

    self.chapters.push(ChapterRecord {
      headline: source.file_name.clone(),
      file_name,
      label: Some(scope),
    });
    Ok(())
  }

  fn markup(&mut self, part: &ResolvedPart) -> Result<(), BuildError> {
    let text = fs::read_to_string(&part.path)
      .map_err(BuildError::io("reading", &part.path))?;

    let stem = stem_of(&part.path);
    let file_stem = stem.replace(' ', "_");
    let label = scope_format(&[file_stem.as_str()]);
    self.claim(&label, &part.path.display().to_string())?;

    let markup = resolve_placeholders(&text, &self.variables);
    let tex = self.render(&markup, &label, &part.path)?;
    let file_name = format!("{file_stem}.tex");
    self.write_fragment(&file_name, &tex)?;

    self.chapters.push(ChapterRecord {
      headline: stem,
      file_name,
      label: Some(label),
    });
    Ok(())
  }

  fn typeset(&mut self, part: &ResolvedPart) -> Result<(), BuildError> {
    let stem = stem_of(&part.path);
    let file_stem = stem.replace(' ', "_");
    let label = scope_format(&[file_stem.as_str()]);
    self.claim(&label, &part.path.display().to_string())?;

    let file_name = format!("{file_stem}.tex");
    let target = self.fragment_path(&file_name)?;
    fs::copy(&part.path, &target).map_err(BuildError::io("copying", &part.path))?;
    log::debug!("Copied {} to {}", part.path.display(), target.display());

    self.chapters.push(ChapterRecord {
      headline: stem,
      file_name,
      label: Some(label),
    });
    Ok(())
  }

  /// Register the chapter id `scope` for `owner`. Two chapters sharing an
  /// id would also share a fragment file, so a clash is fatal.
  fn claim(&mut self, scope: &str, owner: &str) -> Result<(), BuildError> {
    if let Some(existing) = self.registry.headline(scope) {
      return Err(BuildError::Config(format!(
        "`{existing}` and `{owner}` both map to the chapter id `{scope}`; \
         rename one of them"
      )));
    }
    self.registry.register(scope, owner);
    Ok(())
  }

  fn render(
    &mut self,
    markup: &str,
    first_prefix: &str,
    path: &Path,
  ) -> Result<String, BuildError> {
    log::debug!(
      "Converting {} with {}",
      path.display(),
      self.converter.name()
    );
    let body = render_fragment(
      self.converter,
      &mut self.disambiguator,
      markup,
      first_prefix,
      &self.second_prefix,
    )
    .map_err(|source| {
      BuildError::Latex {
        path: path.to_path_buf(),
        source,
      }
    })?;

    Ok(format!(
      "{}{body}\n",
      fragment_header(self.now, &self.config.package_name)
    ))
  }

  /// Target path of a fragment inside the output folder.
  fn fragment_path(&self, file_name: &str) -> Result<PathBuf, BuildError> {
    if file_name == self.main_tex {
      return Err(BuildError::Config(format!(
        "Fragment {file_name} would overwrite the main document"
      )));
    }

    let path = self.output.join(file_name);
    if path.exists() {
      return Err(BuildError::Config(format!(
        "Fragment {} was already written by another chapter",
        path.display()
      )));
    }
    Ok(path)
  }

  fn write_fragment(
    &self,
    file_name: &str,
    content: &str,
  ) -> Result<(), BuildError> {
    let path = self.fragment_path(file_name)?;
    fs::write(&path, content).map_err(BuildError::io("writing", &path))?;
    log::debug!("Wrote {}", path.display());
    Ok(())
  }

  fn write_styles(&self) -> Result<(), BuildError> {
    let styles = self.output.join(STYLES_DIR);
    fs::create_dir_all(&styles).map_err(BuildError::io("creating", &styles))?;

    if let Some(ref dir) = self.config.styles_dir {
      let source = self.config.resolve_path(dir);
      log::info!("Copying LaTeX styles from {}", source.display());
      let options = CopyOptions::new().overwrite(true).content_only(true);
      fs_extra::dir::copy(&source, &styles, &options)
        .map_err(BuildError::copy(&source))?;
    } else {
      for (name, content) in style_files() {
        let path = styles.join(name);
        fs::write(&path, content).map_err(BuildError::io("writing", &path))?;
      }
    }

    let path = styles.join(AUTODEFINED_STY);
    let content = autodefined_sty(
      &self.config.repository_name,
      &self.config.package_name,
      self.now,
    );
    fs::write(&path, content).map_err(BuildError::io("writing", &path))
  }

  fn pdf_file_name(&self) -> String {
    Path::new(&self.main_tex)
      .with_extension("pdf")
      .to_string_lossy()
      .into_owned()
  }

  fn write_main_document(&self) -> Result<PathBuf, BuildError> {
    let title = match variable(&self.variables, "TITLE") {
      "" => self.config.package_name.clone(),
      title => title.to_string(),
    };
    let meta = DocumentMeta {
      title,
      version: variable(&self.variables, "VERSION").to_string(),
      author: variable(&self.variables, "AUTHOR").to_string(),
      date: variable(&self.variables, "DATE").to_string(),
    };
    let trailer = Trailer {
      pdf_file_name:     self.pdf_file_name(),
      now:               self.now.to_string(),
      generator_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let path = self.output.join(&self.main_tex);
    let document = compose_main_document(&meta, &self.chapters, &trailer);
    fs::write(&path, document).map_err(BuildError::io("writing", &path))?;
    log::info!("Wrote {}", path.display());
    Ok(path)
  }

  /// Fatal in strict mode, a warning otherwise.
  fn tolerate(&self, error: BuildError) -> Result<Option<PathBuf>, BuildError> {
    if self.config.is_strict() {
      Err(error)
    } else {
      log::warn!("{error}");
      log::warn!("Continuing without a PDF because strict mode is off");
      Ok(None)
    }
  }

  fn compile(&self) -> Result<Option<PathBuf>, BuildError> {
    if self.config.simulate_only {
      log::info!("Simulation only, skipping LaTeX compilation");
      return Ok(None);
    }

    let Some(program) = self.config.compiler_program() else {
      return self.tolerate(BuildError::Config(format!(
        "No LaTeX compiler configured for {}",
        std::env::consts::OS
      )));
    };

    let compiler = Compiler::new(program, self.config.compiler_arguments());
    if let Err(e) = compiler.run(&self.output, &self.main_tex) {
      return self.tolerate(e);
    }

    let pdf = self.output.join(self.pdf_file_name());
    if !pdf.is_file() {
      return self.tolerate(BuildError::ExternalTool {
        tool:    compiler.program().display().to_string(),
        message: format!("expected output {} was not produced", pdf.display()),
      });
    }

    if let Some(ref dest) = self.config.pdf_dest {
      let dest = self.config.resolve_path(dest);
      fs::create_dir_all(&dest).map_err(BuildError::io("creating", &dest))?;
      let target = dest.join(self.pdf_file_name());
      fs::copy(&pdf, &target).map_err(BuildError::io("copying", &target))?;
      log::info!("Copied PDF to {}", target.display());
    }

    Ok(Some(pdf))
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, reason = "Fine in tests")]
  use pkgdoc_config::{ControlConfig, DocumentPart, TexConfig};
  use pkgdoc_latex::IdentityConverter;

  use super::*;

  fn config_in(dir: &Path) -> Config {
    Config {
      package_name: "pkg".to_string(),
      repository_name: "repo".to_string(),
      output_dir: PathBuf::from("out"),
      base_dir: Some(dir.to_path_buf()),
      ..Default::default()
    }
  }

  #[test]
  fn test_timestamp_format() {
    let now = timestamp();
    // dd.mm.yyyy - hh:mm:ss
    assert_eq!(now.len(), 21);
    assert_eq!(&now[10..13], " - ");
  }

  #[test]
  fn test_pandoc_converter_from_config() {
    let config = Config::default();
    let converter = pandoc_converter(&config);
    assert_eq!(converter.program(), Path::new("pandoc"));
    assert_eq!(converter.arguments().len(), DEFAULT_PANDOC_ARGS.len());
  }

  #[test]
  fn test_typeset_part_copied_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Extra Notes.tex"), "\\section{X}\n").unwrap();

    let mut config = config_in(dir.path());
    config.simulate_only = true;
    config.parts.push(DocumentPart {
      name: "Notes".to_string(),
      path: PathBuf::from("Extra Notes.tex"),
    });

    let report = build_at(&config, &IdentityConverter, "now").unwrap();
    assert_eq!(report.chapters, vec![ChapterRecord {
      headline:  "Extra Notes".to_string(),
      file_name: "Extra_Notes.tex".to_string(),
      label:     Some("extra-notes".to_string()),
    }]);
    assert_eq!(
      fs::read_to_string(dir.path().join("out/Extra_Notes.tex")).unwrap(),
      "\\section{X}\n"
    );
    assert!(report.pdf.is_none());
  }

  #[test]
  fn test_refuses_to_clean_config_folder() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.rst"), "Text\n").unwrap();

    let mut config = config_in(dir.path());
    config.output_dir = PathBuf::from(".");
    config.parts.push(DocumentPart {
      name: "A".to_string(),
      path: PathBuf::from("a.rst"),
    });

    let err = build_at(&config, &IdentityConverter, "now").unwrap_err();
    assert!(matches!(err, BuildError::Config(_)));
    assert!(dir.path().join("a.rst").is_file());
  }

  #[test]
  fn test_missing_compiler_strict_and_lenient() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.rst"), "Text\n").unwrap();

    let mut config = config_in(dir.path());
    config.parts.push(DocumentPart {
      name: "A".to_string(),
      path: PathBuf::from("a.rst"),
    });
    let missing = Some(PathBuf::from("/nonexistent/pkgdoc-test-latex"));
    config.tex = Some(TexConfig {
      linux:     missing.clone(),
      windows:   missing.clone(),
      macos:     missing,
      arguments: None,
    });

    let err = build_at(&config, &IdentityConverter, "now").unwrap_err();
    assert!(matches!(err, BuildError::ExternalTool { .. }));

    config.control = Some(ControlConfig {
      strict: false,
      ..Default::default()
    });
    let report = build_at(&config, &IdentityConverter, "now").unwrap();
    assert!(report.pdf.is_none());
    assert!(report.message.contains("no PDF was produced"));
    assert!(dir.path().join("out/pkg.tex").is_file());
  }
}
