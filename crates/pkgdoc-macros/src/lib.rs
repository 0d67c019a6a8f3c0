//! Proc-macros for the pkgdoc configuration system.
//!
//! `#[derive(Configurable)]` generates two inherent methods:
//!
//! - `apply_override(&mut self, key, value)` for `--config KEY=VALUE` flags,
//!   including dotted keys into nested sections and map entries;
//! - `merge_fields(&mut self, other)` used when several config files are
//!   loaded on top of each other.

use proc_macro::TokenStream;
use quote::{ToTokens, quote};
use syn::{Attribute, Data, DeriveInput, Fields, Type, parse_macro_input};

/// Attribute configuration for a field.
#[derive(Default)]
struct FieldConfig {
  /// The config key name (defaults to field name).
  key: Option<String>,

  /// Whether this field is a nested `Configurable` section.
  nested: bool,

  /// Allow empty values (set to None).
  allow_empty: bool,

  /// Field is never touched by overrides.
  skip: bool,
}

impl FieldConfig {
  fn from_attrs(attrs: &[Attribute]) -> Self {
    let mut config = Self::default();

    for attr in attrs {
      if !attr.path().is_ident("config") {
        continue;
      }

      let _ = attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("key") {
          let value = meta.value()?;
          let lit: syn::LitStr = value.parse()?;
          config.key = Some(lit.value());
        } else if meta.path.is_ident("allow_empty") {
          config.allow_empty = true;
        } else if meta.path.is_ident("nested") {
          config.nested = true;
        } else if meta.path.is_ident("skip") {
          config.skip = true;
        }
        Ok(())
      });
    }

    config
  }
}

/// How a field is overridden and merged, derived from its attributes and
/// the spelling of its type.
#[derive(Clone, Copy, PartialEq, Eq)]
enum FieldKind {
  Nested { optional: bool },
  Map,
  List,
  Optional { allow_empty: bool },
  Path,
  Text,
  Flag,
  Parsed,
}

impl FieldKind {
  fn classify(ty: &Type, config: &FieldConfig) -> Self {
    let spelled: String = ty
      .to_token_stream()
      .to_string()
      .chars()
      .filter(|c| !c.is_whitespace())
      .collect();
    let optional = spelled.starts_with("Option<");

    if config.nested {
      return Self::Nested { optional };
    }
    if optional {
      return Self::Optional {
        allow_empty: config.allow_empty,
      };
    }
    if ["IndexMap<", "HashMap<", "BTreeMap<"]
      .iter()
      .any(|map| spelled.starts_with(map))
    {
      return Self::Map;
    }

    match spelled.as_str() {
      s if s.starts_with("Vec<") => Self::List,
      s if s == "PathBuf" || s.ends_with("::PathBuf") => Self::Path,
      "String" => Self::Text,
      "bool" => Self::Flag,
      _ => Self::Parsed,
    }
  }
}

/// Derive macro for configuration structs.
#[proc_macro_derive(Configurable, attributes(config))]
pub fn derive_configurable(input: TokenStream) -> TokenStream {
  let input = parse_macro_input!(input as DeriveInput);
  let name = &input.ident;
  let (impl_generics, ty_generics, where_clause) =
    input.generics.split_for_impl();

  let fields = match &input.data {
    Data::Struct(data) => &data.fields,
    _ => {
      return syn::Error::new_spanned(
        input,
        "Configurable can only be derived for structs",
      )
      .to_compile_error()
      .into();
    },
  };

  if fields.iter().any(|field| field.ident.is_none()) {
    return syn::Error::new_spanned(
      &input,
      "Configurable requires a struct with named fields",
    )
    .to_compile_error()
    .into();
  }

  let field_handlers = generate_field_handlers(fields);
  let merge_handlers = generate_merge_handlers(fields);

  let expanded = quote! {
    impl #impl_generics #name #ty_generics #where_clause {
      /// Apply a configuration override by key.
      ///
      /// # Errors
      ///
      /// Returns an error for unknown keys and values that do not parse.
      pub fn apply_override(
        &mut self,
        key: &str,
        value: &str,
      ) -> std::result::Result<(), crate::error::ConfigError> {
        use crate::error::ConfigError;

        #(#field_handlers)*

        Err(ConfigError::Config(format!(
          "Unknown configuration key: '{key}'. See documentation for supported keys.",
        )))
      }

      /// Merge another config into this one.
      pub fn merge_fields(&mut self, other: Self) {
        #(#merge_handlers)*
      }
    }
  };

  TokenStream::from(expanded)
}

fn generate_field_handlers(fields: &Fields) -> Vec<proc_macro2::TokenStream> {
  fields
    .iter()
    .filter_map(|field| {
      let config = FieldConfig::from_attrs(&field.attrs);
      if config.skip {
        return None;
      }
      let name = field.ident.as_ref()?;
      let key = config.key.clone().unwrap_or_else(|| name.to_string());

      Some(override_handler(
        name,
        &key,
        FieldKind::classify(&field.ty, &config),
      ))
    })
    .collect()
}

fn invalid_value(name: &syn::Ident, hint: &str) -> proc_macro2::TokenStream {
  quote! {
    ConfigError::Config(format!(
      "Invalid value for '{}': '{}'{}",
      stringify!(#name), value, #hint
    ))
  }
}

fn override_handler(
  name: &syn::Ident,
  key: &str,
  kind: FieldKind,
) -> proc_macro2::TokenStream {
  let prefix = format!("{key}.");

  let assignment = match kind {
    // Sub-keys such as `control.strict` go to the nested section.
    FieldKind::Nested { optional: true } => {
      return quote! {
        if let Some(subkey) = key.strip_prefix(#prefix) {
          return self
            .#name
            .get_or_insert_with(Default::default)
            .apply_override(subkey, value);
        }
      };
    },
    FieldKind::Nested { optional: false } => {
      return quote! {
        if let Some(subkey) = key.strip_prefix(#prefix) {
          return self.#name.apply_override(subkey, value);
        }
      };
    },
    // `params.AUTHOR=value` inserts a single entry.
    FieldKind::Map => {
      return quote! {
        if let Some(entry) = key.strip_prefix(#prefix) {
          if entry.is_empty() {
            return Err(ConfigError::Config(format!(
              "Missing entry name in configuration key: '{key}'"
            )));
          }
          self.#name.insert(entry.to_string(), value.into());
          return Ok(());
        }
      };
    },
    // Lists are only set from config files.
    FieldKind::List => return quote! {},
    FieldKind::Optional { allow_empty } => {
      let error = invalid_value(name, "");
      let parsed = quote! { value.parse().map_err(|_| #error)? };
      if allow_empty {
        quote! {
          self.#name = if value.is_empty() { None } else { Some(#parsed) };
        }
      } else {
        quote! { self.#name = Some(#parsed); }
      }
    },
    FieldKind::Path => quote! { self.#name = std::path::PathBuf::from(value); },
    FieldKind::Text => quote! { self.#name = value.to_string(); },
    FieldKind::Flag => {
      let error =
        invalid_value(name, ". Expected true/false, yes/no, or 1/0");
      quote! {
        self.#name = match value.to_lowercase().as_str() {
          "true" | "yes" | "1" => true,
          "false" | "no" | "0" => false,
          _ => return Err(#error),
        };
      }
    },
    FieldKind::Parsed => {
      let error = invalid_value(name, "");
      quote! { self.#name = value.parse().map_err(|_| #error)?; }
    },
  };

  quote! {
    if key == #key {
      #assignment
      return Ok(());
    }
  }
}

fn generate_merge_handlers(fields: &Fields) -> Vec<proc_macro2::TokenStream> {
  fields
    .iter()
    .filter_map(|field| {
      let config = FieldConfig::from_attrs(&field.attrs);
      let name = field.ident.as_ref()?;

      let handler = match FieldKind::classify(&field.ty, &config) {
        // Sections present on both sides are merged field by field.
        FieldKind::Nested { optional: true } => {
          quote! {
            match (self.#name.as_mut(), other.#name) {
              (Some(inner), Some(other_inner)) => inner.merge_fields(other_inner),
              (None, Some(other_inner)) => self.#name = Some(other_inner),
              _ => {},
            }
          }
        },
        FieldKind::Nested { optional: false } => {
          quote! { self.#name.merge_fields(other.#name); }
        },
        FieldKind::Optional { .. } => {
          quote! {
            if other.#name.is_some() {
              self.#name = other.#name;
            }
          }
        },
        FieldKind::List | FieldKind::Map => {
          quote! { self.#name.extend(other.#name); }
        },
        FieldKind::Path
        | FieldKind::Text
        | FieldKind::Flag
        | FieldKind::Parsed => quote! { self.#name = other.#name; },
      };

      Some(handler)
    })
    .collect()
}
