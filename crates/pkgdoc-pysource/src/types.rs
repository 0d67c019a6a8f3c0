use std::path::PathBuf;

use serde::Serialize;

/// Name prefix marking a declaration as private.
pub const PRIVATE_PREFIX: char = '_';

/// Bare decorator identifier that marks a method as a keyword.
pub const KEYWORD_DECORATOR: &str = "keyword";

/// Inclusion policy applied after a module has been parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractOptions {
  /// Keep functions, classes and methods whose name starts with `_`.
  pub include_private:      bool,
  /// Keep functions and methods without a docstring. Classes are always kept.
  pub include_undocumented: bool,
}

impl ExtractOptions {
  #[must_use]
  pub const fn new(include_private: bool, include_undocumented: bool) -> Self {
    Self {
      include_private,
      include_undocumented,
    }
  }

  const fn keeps_name(self, name: &str) -> bool {
    self.include_private || !is_private(name)
  }

  const fn keeps_doc(self, doc: Option<&String>) -> bool {
    self.include_undocumented || doc.is_some()
  }
}

/// Return `true` when `name` follows the private naming convention.
#[must_use]
pub const fn is_private(name: &str) -> bool {
  matches!(name.as_bytes().first(), Some(&b) if b == PRIVATE_PREFIX as u8)
}

/// A module-level function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDoc {
  pub name: String,
  pub doc:  Option<String>,
}

/// A function defined directly in a class body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDoc {
  pub name:       String,
  pub doc:        Option<String>,
  /// Decorated with the bare [`KEYWORD_DECORATOR`] identifier.
  pub is_keyword: bool,
}

impl MethodDoc {
  #[must_use]
  pub const fn is_private(&self) -> bool {
    is_private(self.name.as_str())
  }
}

/// A module-level class and its methods, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDoc {
  pub name:    String,
  pub doc:     Option<String>,
  pub methods: Vec<MethodDoc>,
}

/// A top-level declaration of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Declaration {
  Function(FunctionDoc),
  Class(ClassDoc),
}

impl Declaration {
  #[must_use]
  pub fn name(&self) -> &str {
    match self {
      Self::Function(f) => &f.name,
      Self::Class(c) => &c.name,
    }
  }

  #[must_use]
  pub fn doc(&self) -> Option<&str> {
    match self {
      Self::Function(f) => f.doc.as_deref(),
      Self::Class(c) => c.doc.as_deref(),
    }
  }
}

/// Everything relevant found in a single Python module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleDoc {
  /// Module docstring (a bare string literal as first statement).
  pub description:  Option<String>,
  /// Functions and classes in source order.
  pub declarations: Vec<Declaration>,
}

impl ModuleDoc {
  pub fn functions(&self) -> impl Iterator<Item = &FunctionDoc> {
    self.declarations.iter().filter_map(|d| {
      match d {
        Declaration::Function(f) => Some(f),
        Declaration::Class(_) => None,
      }
    })
  }

  pub fn classes(&self) -> impl Iterator<Item = &ClassDoc> {
    self.declarations.iter().filter_map(|d| {
      match d {
        Declaration::Class(c) => Some(c),
        Declaration::Function(_) => None,
      }
    })
  }

  /// No description, no functions and no classes.
  #[must_use]
  pub const fn is_empty(&self) -> bool {
    self.description.is_none() && self.declarations.is_empty()
  }

  /// Apply the inclusion policy, returning `None` when nothing relevant is
  /// left. The module description alone keeps a module relevant.
  #[must_use]
  pub fn filtered(self, options: ExtractOptions) -> Option<Self> {
    let declarations = self
      .declarations
      .into_iter()
      .filter_map(|declaration| {
        match declaration {
          Declaration::Function(f) => {
            (options.keeps_name(&f.name) && options.keeps_doc(f.doc.as_ref()))
              .then_some(Declaration::Function(f))
          },
          Declaration::Class(mut c) => {
            if !options.keeps_name(&c.name) {
              return None;
            }
            c.methods.retain(|m| {
              options.keeps_name(&m.name) && options.keeps_doc(m.doc.as_ref())
            });
            Some(Declaration::Class(c))
          },
        }
      })
      .collect();

    let module = Self {
      description: self.description,
      declarations,
    };

    (!module.is_empty()).then_some(module)
  }
}

/// A discovered Python module together with its position in the package.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFile {
  /// Path of the module on disk.
  pub path:        PathBuf,
  /// Name of the root folder the module was discovered in (the package).
  pub root_name:   String,
  /// Folders between the root and the module, `/`-separated.
  pub sub_path:    Option<String>,
  /// File name including the extension (e.g. `helpers.py`).
  pub file_name:   String,
  /// File name without the extension (e.g. `helpers`).
  pub file_stem:   String,
  /// Dotted import path (e.g. `package.sub.helpers`).
  pub import_path: String,
  pub module:      ModuleDoc,
}
