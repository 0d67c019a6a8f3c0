//! Generates PDF reference documentation for a Python package.
//!
//! Every module of the package becomes one chapter: its docstrings are
//! assembled into reStructuredText, converted to LaTeX with pandoc and
//! included by a master document that is compiled with a LaTeX engine.
//! Additional `.rst` and `.tex` documents can be placed between the module
//! chapters.
//!
//! The library exposes the pipeline for integration tests and for embedding;
//! the `pkgdoc` binary is a thin command line wrapper around
//! [`driver::build`].
pub mod assemble;
pub mod cli;
pub mod compiler;
pub mod driver;
pub mod dump;
pub mod error;
pub mod placeholders;

pub use driver::{BuildReport, build, build_at};
pub use error::BuildError;
