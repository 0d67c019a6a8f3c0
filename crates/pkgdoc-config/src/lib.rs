pub mod config;
pub mod error;
pub mod templates;

pub use config::{
  AnchorsConfig,
  Config,
  ControlConfig,
  ConverterConfig,
  DocumentConfig,
  DocumentPart,
  PartKind,
  TexConfig,
};
pub use error::ConfigError;
