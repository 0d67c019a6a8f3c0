#![allow(clippy::expect_used, reason = "Expect is acceptable in tests")]
use pkgdoc_latex::{
  AnchorCounter,
  AnchorStyle,
  Converter,
  Disambiguator,
  IdentityConverter,
  LatexError,
  anchor_prefix,
  render_fragment,
};

/// Stand-in for pandoc: turns `Title` + `=====` pairs into labelled sections
/// the way pandoc does.
struct FakePandoc;

impl Converter for FakePandoc {
  fn name(&self) -> &str {
    "fake-pandoc"
  }

  fn convert(&self, markup: &str) -> Result<String, LatexError> {
    let lines: Vec<&str> = markup.lines().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < lines.len() {
      let line = lines[i];
      let underlined = lines
        .get(i + 1)
        .is_some_and(|next| !next.is_empty() && next.chars().all(|c| c == '='));
      if underlined && !line.is_empty() {
        let label = line.to_lowercase().replace([':', ' '], "-").replace("--", "-");
        out.push(format!(
          "\\hypertarget{{{label}}}{{%\n\\section{{{line}}}\\label{{{label}}}}}"
        ));
        i += 2;
      } else {
        out.push(line.to_string());
        i += 1;
      }
    }
    Ok(out.join("\n"))
  }
}

struct FailingConverter;

impl Converter for FailingConverter {
  fn name(&self) -> &str {
    "failing"
  }

  fn convert(&self, _markup: &str) -> Result<String, LatexError> {
    Err(LatexError::Convert {
      tool:    self.name().to_string(),
      message: "unexpected section title".to_string(),
    })
  }
}

#[test]
fn same_headline_in_two_modules_is_unique_after_rewrite() {
  let markup = "Class: Helper\n=============\n\nDoes things.\n";
  let mut disambiguator = Disambiguator::new(AnchorStyle::default());

  let a = render_fragment(
    &FakePandoc,
    &mut disambiguator,
    markup,
    &anchor_prefix("pkg.a"),
    "",
  )
  .expect("conversion");
  let b = render_fragment(
    &FakePandoc,
    &mut disambiguator,
    markup,
    &anchor_prefix("pkg.b"),
    "",
  )
  .expect("conversion");

  assert!(a.contains(r"\hypertarget{pkg-a-class-helper-1}"));
  assert!(a.contains(r"\label{pkg-a-class-helper-1}"));
  assert!(b.contains(r"\hypertarget{pkg-b-class-helper-2}"));
  assert!(b.contains(r"\label{pkg-b-class-helper-2}"));
  assert_eq!(disambiguator.counter().hypertarget_count(), 2);
  assert_eq!(disambiguator.counter().label_count(), 2);
}

#[test]
fn counter_values_strictly_increase_for_repeated_names() {
  let mut disambiguator = Disambiguator::new(AnchorStyle::default());
  let mut seen = Vec::new();
  for _ in 0..3 {
    let out = render_fragment(
      &IdentityConverter,
      &mut disambiguator,
      r"\label{method-run}",
      "",
      "",
    )
    .expect("conversion");
    seen.push(out);
  }
  assert_eq!(seen, vec![
    r"\label{method-run-1}",
    r"\label{method-run-2}",
    r"\label{method-run-3}",
  ]);
}

#[test]
fn syntax_extensions_survive_conversion() {
  let markup = "First line/\nSecond line\n/\nAfter space\n//\nNew page";
  let mut disambiguator = Disambiguator::new(AnchorStyle::default());
  let out =
    render_fragment(&FakePandoc, &mut disambiguator, markup, "", "")
      .expect("conversion");

  assert_eq!(
    out,
    "First line\\newline\nSecond line\n\\vspace{1ex}\nAfter space\n\\newpage\nNew page"
  );
}

#[test]
fn converter_errors_are_propagated() {
  let mut disambiguator = Disambiguator::new(AnchorStyle::default());
  let result =
    render_fragment(&FailingConverter, &mut disambiguator, "text", "", "");
  assert!(matches!(result, Err(LatexError::Convert { .. })));
  assert_eq!(disambiguator.counter().label_count(), 0);
}
