/// LaTeX special characters and their text-mode replacements.
pub const LATEX_ESCAPES: &[(char, &str)] = &[
  ('\\', r"\textbackslash{}"),
  ('{', r"\{"),
  ('}', r"\}"),
  ('$', r"\$"),
  ('&', r"\&"),
  ('#', r"\#"),
  ('%', r"\%"),
  ('_', r"\_"),
  ('~', r"\textasciitilde{}"),
  ('^', r"\textasciicircum{}"),
];

/// Characters with inline meaning in reStructuredText.
pub const RST_SPECIALS: &[char] = &['\\', '*', '`', '_', '|'];

/// Escape `text` for use in LaTeX text mode (chapter titles, file names).
#[must_use]
pub fn escape_latex(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match LATEX_ESCAPES.iter().find(|(special, _)| *special == c) {
      Some((_, replacement)) => out.push_str(replacement),
      None => out.push(c),
    }
  }
  out
}

/// Backslash-escape inline markup characters so `text` is rendered literally
/// in a reStructuredText section title.
#[must_use]
pub fn escape_rst(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    if RST_SPECIALS.contains(&c) {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_escape_latex_underscore() {
    assert_eq!(escape_latex("my_module.py"), r"my\_module.py");
  }

  #[test]
  fn test_escape_latex_specials() {
    assert_eq!(escape_latex("100% & $x$"), r"100\% \& \$x\$");
    assert_eq!(escape_latex(r"a\b"), r"a\textbackslash{}b");
    assert_eq!(escape_latex("{#}"), r"\{\#\}");
  }

  #[test]
  fn test_escape_latex_plain_text_untouched() {
    assert_eq!(escape_latex("Plain Title 1.0"), "Plain Title 1.0");
  }

  #[test]
  fn test_escape_rst() {
    assert_eq!(escape_rst("Method: __init__"), r"Method: \_\_init\_\_");
    assert_eq!(escape_rst("a*b|c`d"), r"a\*b\|c\`d");
    assert_eq!(escape_rst("Class: Helper"), "Class: Helper");
  }
}
