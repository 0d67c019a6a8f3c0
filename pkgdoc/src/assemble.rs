//! reStructuredText for one Python module.
//!
//! The module description comes first, then one `=` section per function,
//! then one `=` section per class with its import line and one `-`
//! subsection per method. Visible headlines keep the original names; every
//! section also gets a scope id that is recorded in the [`ScopeRegistry`].
use std::fmt::Write;

use pkgdoc_latex::{ScopeRegistry, escape_rst, scope_format};
use pkgdoc_pysource::{ClassDoc, FunctionDoc, MethodDoc, SourceFile};

/// Body of a section whose declaration has no docstring.
pub const NOT_AVAILABLE: &str = "*not available*";

const FUNCTION_UNDERLINE: char = '=';
const CLASS_UNDERLINE: char = '=';
const METHOD_UNDERLINE: char = '-';

/// Scope id of one section together with its visible headline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeEntry {
  pub scope:    String,
  pub headline: String,
}

/// Result of [`assemble`].
#[derive(Debug, Clone)]
pub struct AssembledModule {
  pub markup:       String,
  /// Scope id of the module itself, also used as chapter label and fragment
  /// file stem.
  pub module_scope: String,
  /// Sections in document order.
  pub entries:      Vec<ScopeEntry>,
}

/// Scope id of a module: root folder, sub path and file stem.
#[must_use]
pub fn module_scope(source: &SourceFile) -> String {
  scope_format(&[
    source.root_name.as_str(),
    source.sub_path.as_deref().unwrap_or_default(),
    source.file_stem.as_str(),
  ])
}

/// Headline prefix of a method section.
#[must_use]
pub const fn method_kind(method: &MethodDoc) -> &'static str {
  if method.is_keyword { "Keyword" } else { "Method" }
}

struct Assembler<'a> {
  module_scope: String,
  markup:       String,
  entries:      Vec<ScopeEntry>,
  registry:     &'a mut ScopeRegistry,
}

impl Assembler<'_> {
  fn section(&mut self, scope_parts: &[&str], headline: String, underline: char) {
    let scope = scope_format(scope_parts);
    self.registry.register(scope.clone(), headline.clone());

    let title = escape_rst(&headline);
    let rule: String =
      std::iter::repeat_n(underline, title.chars().count()).collect();
    // Writing into a String never fails.
    let _ = write!(self.markup, "{title}\n{rule}\n\n");

    self.entries.push(ScopeEntry { scope, headline });
  }

  fn body(&mut self, doc: Option<&str>) {
    self.markup.push_str(doc.unwrap_or(NOT_AVAILABLE));
    self.markup.push_str("\n\n");
  }

  fn function(&mut self, function: &FunctionDoc) {
    log::debug!("  function `{}`", function.name);
    let module_scope = self.module_scope.clone();
    self.section(
      &[module_scope.as_str(), function.name.as_str()],
      format!("Function: {}", function.name),
      FUNCTION_UNDERLINE,
    );
    self.body(function.doc.as_deref());
  }

  fn class(&mut self, class: &ClassDoc, import_path: &str) {
    log::debug!("  class `{}`", class.name);
    let module_scope = self.module_scope.clone();
    self.section(
      &[module_scope.as_str(), class.name.as_str()],
      format!("Class: {}", class.name),
      CLASS_UNDERLINE,
    );

    let _ = write!(
      self.markup,
      "*Imported by*:\n\n.. code:: python\n\n   from {import_path} import {}\n\n",
      class.name
    );
    self.body(class.doc.as_deref());

    for method in &class.methods {
      let kind = method_kind(method);
      log::debug!("    {} `{}`", kind.to_lowercase(), method.name);
      self.section(
        &[module_scope.as_str(), class.name.as_str(), method.name.as_str()],
        format!("{kind}: {}", method.name),
        METHOD_UNDERLINE,
      );
      self.body(method.doc.as_deref());
    }
  }
}

/// Build the markup of one module and register the scope id of every
/// section in `registry`.
#[must_use]
pub fn assemble(
  source: &SourceFile,
  registry: &mut ScopeRegistry,
) -> AssembledModule {
  let module_scope = module_scope(source);
  let mut assembler = Assembler {
    module_scope: module_scope.clone(),
    markup: String::new(),
    entries: Vec::new(),
    registry,
  };

  if let Some(ref description) = source.module.description {
    log::debug!("  file description found");
    assembler.markup.push_str(description);
    assembler.markup.push_str("\n\n");
  }

  for function in source.module.functions() {
    assembler.function(function);
  }

  for class in source.module.classes() {
    assembler.class(class, &source.import_path);
  }

  let mut markup = assembler.markup;
  let trimmed = markup.trim_end().len();
  markup.truncate(trimmed);
  markup.push('\n');

  AssembledModule {
    markup,
    module_scope,
    entries: assembler.entries,
  }
}
