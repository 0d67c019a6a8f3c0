//! `pkgdoc-latex`.
//!
//! Everything between assembled reStructuredText and the LaTeX files on disk:
//! scope ids for section identifiers, the line-level syntax extensions, the
//! converter boundary, anchor disambiguation after conversion and the master
//! document composition.

pub mod anchors;
pub mod compose;
pub mod convert;
pub mod error;
pub mod escape;
pub mod extensions;
pub mod scope;

pub use anchors::{AnchorCounter, AnchorStyle, BuildCounter, Disambiguator};
pub use compose::{
  ChapterRecord,
  DocumentMeta,
  GENERATOR,
  Trailer,
  autodefined_sty,
  compose_main_document,
  fill_template,
  fragment_header,
};
pub use convert::{
  Converter,
  DEFAULT_PANDOC_ARGS,
  IdentityConverter,
  PandocConverter,
  render_fragment,
};
pub use error::LatexError;
pub use escape::{escape_latex, escape_rst};
pub use scope::{ScopeRegistry, anchor_prefix, scope_format};
