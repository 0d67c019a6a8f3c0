//! `###KEY###` placeholders and the runtime variables they resolve to.
use std::sync::LazyLock;

use indexmap::IndexMap;
use pkgdoc_config::Config;
use regex::{Captures, Regex};
use serde_json::Value;

/// Runtime variables by name, in definition order.
pub type Variables = IndexMap<String, Value>;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"###([A-Za-z0-9_]+)###").unwrap_or_else(|e| {
    log::error!("Failed to compile PLACEHOLDER regex: {e}");
    #[allow(
      clippy::expect_used,
      reason = "This pattern is guaranteed to be valid"
    )]
    Regex::new(r"[^\s\S]")
      .expect("regex pattern [^\\s\\S] should always compile")
  })
});

/// Replace every `###KEY###` whose variable holds a string. Unknown keys and
/// non-string values stay in the text as they are.
#[must_use]
pub fn resolve_placeholders(text: &str, variables: &Variables) -> String {
  PLACEHOLDER
    .replace_all(text, |caps: &Captures| {
      match variables.get(&caps[1]) {
        Some(Value::String(value)) => value.clone(),
        _ => caps[0].to_string(),
      }
    })
    .into_owned()
}

/// Variables available to placeholders during one build.
///
/// Order of definition: `PACKAGENAME`, `REPOSITORYNAME` and `NOW`, then every
/// `params` entry, then the document fields as `TITLE`, `VERSION`, `AUTHOR`
/// and `DATE`. String values may refer to variables defined before them.
#[must_use]
pub fn runtime_variables(config: &Config, now: &str) -> Variables {
  let mut variables = Variables::new();
  variables.insert(
    "PACKAGENAME".to_string(),
    Value::String(config.package_name.clone()),
  );
  variables.insert(
    "REPOSITORYNAME".to_string(),
    Value::String(config.repository_name.clone()),
  );
  variables.insert("NOW".to_string(), Value::String(now.to_string()));

  for (key, value) in &config.params {
    let value = match value {
      Value::String(text) => {
        Value::String(resolve_placeholders(text, &variables))
      },
      other => other.clone(),
    };
    variables.insert(key.clone(), value);
  }

  let document = config.document_meta();
  for (key, value) in [
    ("TITLE", document.title),
    ("VERSION", document.version),
    ("AUTHOR", document.author),
    ("DATE", document.date),
  ] {
    let resolved = resolve_placeholders(&value, &variables);
    variables.insert(key.to_string(), Value::String(resolved));
  }

  variables
}

/// Look up a string variable, falling back to an empty string.
#[must_use]
pub fn variable<'a>(variables: &'a Variables, key: &str) -> &'a str {
  variables.get(key).and_then(Value::as_str).unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use pkgdoc_config::DocumentConfig;

  use super::*;

  fn variables() -> Variables {
    let mut variables = Variables::new();
    variables.insert("NAME".to_string(), Value::String("pkg".to_string()));
    variables.insert("COUNT".to_string(), Value::from(3));
    variables
  }

  #[test]
  fn test_resolve_string_values() {
    assert_eq!(
      resolve_placeholders("Package ###NAME### (###NAME###)", &variables()),
      "Package pkg (pkg)"
    );
  }

  #[test]
  fn test_unknown_and_non_string_values_stay() {
    assert_eq!(
      resolve_placeholders("###COUNT### ###MISSING### ## #NAME#", &variables()),
      "###COUNT### ###MISSING### ## #NAME#"
    );
  }

  #[test]
  fn test_runtime_variables_order_and_resolution() {
    let mut config = Config {
      package_name: "my_pkg".to_string(),
      repository_name: "my_repo".to_string(),
      document: Some(DocumentConfig {
        title:   "###PACKAGENAME### reference".to_string(),
        version: "1.0".to_string(),
        author:  "###COMPANY###".to_string(),
        date:    "###NOW###".to_string(),
      }),
      ..Default::default()
    };
    config
      .params
      .insert("COMPANY".to_string(), Value::from("###REPOSITORYNAME### team"));
    config.params.insert("LEVEL".to_string(), Value::from(2));

    let variables = runtime_variables(&config, "01.02.2025 - 10:00:00");

    let keys: Vec<&str> = variables.keys().map(String::as_str).collect();
    assert_eq!(keys, vec![
      "PACKAGENAME",
      "REPOSITORYNAME",
      "NOW",
      "COMPANY",
      "LEVEL",
      "TITLE",
      "VERSION",
      "AUTHOR",
      "DATE"
    ]);
    assert_eq!(variable(&variables, "COMPANY"), "my_repo team");
    assert_eq!(variable(&variables, "TITLE"), "my_pkg reference");
    assert_eq!(variable(&variables, "AUTHOR"), "my_repo team");
    assert_eq!(variable(&variables, "DATE"), "01.02.2025 - 10:00:00");
    assert_eq!(variable(&variables, "LEVEL"), "");
    assert_eq!(variables["LEVEL"], Value::from(2));
  }
}
