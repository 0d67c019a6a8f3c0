//! Evaluation of Python string literals and docstring cleanup.
//!
//! The syntax tree only gives us the literal as written in the source
//! (`r"""..."""`, `'\tfoo'`, ...). Docstrings need the *value* of that
//! literal, with the same indentation cleanup `inspect.cleandoc` performs.

const TAB_WIDTH: usize = 8;

/// Evaluate the source text of a single Python string literal.
///
/// Returns `None` for bytes, f-strings and template strings, none of which
/// qualify as documentation strings, and for text that is not a well-formed
/// literal.
pub fn evaluate_literal(raw: &str) -> Option<String> {
  let prefix_len = raw
    .find(|c: char| c == '"' || c == '\'')
    .filter(|&idx| raw[..idx].chars().all(|c| c.is_ascii_alphabetic()))?;
  let prefix = raw[..prefix_len].to_ascii_lowercase();

  if prefix.chars().any(|c| matches!(c, 'b' | 'f' | 't')) {
    return None;
  }
  if prefix.chars().any(|c| !matches!(c, 'r' | 'u')) {
    return None;
  }

  let quoted = &raw[prefix_len..];
  let quote = ["\"\"\"", "'''", "\"", "'"]
    .into_iter()
    .find(|q| quoted.starts_with(q))?;

  if quoted.len() < quote.len() * 2 || !quoted.ends_with(quote) {
    return None;
  }
  let body = &quoted[quote.len()..quoted.len() - quote.len()];

  if prefix.contains('r') {
    Some(body.to_string())
  } else {
    Some(unescape(body))
  }
}

/// Decode the escape sequences of a non-raw string body.
///
/// Unknown escapes and `\N{...}` are kept verbatim.
fn unescape(body: &str) -> String {
  let mut out = String::with_capacity(body.len());
  let mut chars = body.chars().peekable();

  while let Some(c) = chars.next() {
    if c != '\\' {
      out.push(c);
      continue;
    }

    let Some(next) = chars.next() else {
      out.push('\\');
      break;
    };

    match next {
      '\n' => {},
      '\r' => {
        if chars.peek() == Some(&'\n') {
          chars.next();
        }
      },
      '\\' => out.push('\\'),
      '\'' => out.push('\''),
      '"' => out.push('"'),
      'a' => out.push('\u{07}'),
      'b' => out.push('\u{08}'),
      'f' => out.push('\u{0c}'),
      'n' => out.push('\n'),
      'r' => out.push('\r'),
      't' => out.push('\t'),
      'v' => out.push('\u{0b}'),
      '0'..='7' => {
        let mut value = next.to_digit(8).unwrap_or_default();
        for _ in 0..2 {
          match chars.peek().and_then(|d| d.to_digit(8)) {
            Some(digit) => {
              value = value * 8 + digit;
              chars.next();
            },
            None => break,
          }
        }
        out.push(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
      },
      'x' | 'u' | 'U' => {
        let width = match next {
          'x' => 2,
          'u' => 4,
          _ => 8,
        };
        let digits: String = chars.clone().take(width).collect();
        let decoded = (digits.len() == width
          && digits.chars().all(|d| d.is_ascii_hexdigit()))
        .then(|| u32::from_str_radix(&digits, 16).ok())
        .flatten()
        .and_then(char::from_u32);

        if let Some(decoded) = decoded {
          out.push(decoded);
          for _ in 0..width {
            chars.next();
          }
        } else {
          out.push('\\');
          out.push(next);
        }
      },
      other => {
        out.push('\\');
        out.push(other);
      },
    }
  }

  out
}

/// Expand tabs to the next multiple of eight columns, per line.
fn expand_tabs(line: &str) -> String {
  let mut out = String::with_capacity(line.len());
  let mut column = 0;
  for c in line.chars() {
    if c == '\t' {
      let pad = TAB_WIDTH - column % TAB_WIDTH;
      out.extend(std::iter::repeat_n(' ', pad));
      column += pad;
    } else {
      out.push(c);
      column += 1;
    }
  }
  out
}

fn leading_whitespace(line: &str) -> usize {
  line.chars().take_while(|c| c.is_whitespace()).count()
}

fn skip_chars(line: &str, count: usize) -> &str {
  line
    .char_indices()
    .nth(count)
    .map_or("", |(idx, _)| &line[idx..])
}

/// Clean a docstring the way `inspect.cleandoc` does.
///
/// Leading whitespace of the first line is removed, the common indentation
/// of all following non-blank lines is stripped, and blank lines at the
/// start and end are dropped.
pub fn clean_docstring(doc: &str) -> String {
  let mut lines: Vec<String> = doc.split('\n').map(expand_tabs).collect();

  let margin = lines
    .iter()
    .skip(1)
    .filter(|line| !line.trim_start().is_empty())
    .map(|line| leading_whitespace(line))
    .min();

  if let Some(first) = lines.first_mut() {
    *first = first.trim_start().to_string();
  }
  if let Some(margin) = margin {
    for line in lines.iter_mut().skip(1) {
      *line = skip_chars(line, margin).to_string();
    }
  }

  while lines.last().is_some_and(String::is_empty) {
    lines.pop();
  }
  let leading_blank = lines.iter().take_while(|line| line.is_empty()).count();

  lines[leading_blank..].join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_plain_literals() {
    assert_eq!(evaluate_literal("'abc'").as_deref(), Some("abc"));
    assert_eq!(evaluate_literal("\"abc\"").as_deref(), Some("abc"));
    assert_eq!(
      evaluate_literal("\"\"\"multi\nline\"\"\"").as_deref(),
      Some("multi\nline")
    );
    assert_eq!(evaluate_literal("''''''").as_deref(), Some(""));
  }

  #[test]
  fn test_prefixes() {
    assert_eq!(evaluate_literal(r"r'\n'").as_deref(), Some(r"\n"));
    assert_eq!(evaluate_literal(r"R'\n'").as_deref(), Some(r"\n"));
    assert_eq!(evaluate_literal(r"u'\n'").as_deref(), Some("\n"));
    assert_eq!(evaluate_literal("b'bytes'"), None);
    assert_eq!(evaluate_literal("rb'bytes'"), None);
    assert_eq!(evaluate_literal("f'{x}'"), None);
    assert_eq!(evaluate_literal("x'nope'"), None);
  }

  #[test]
  fn test_escapes() {
    assert_eq!(
      evaluate_literal(r"'a\tb\\c\'d'").as_deref(),
      Some("a\tb\\c'd")
    );
    assert_eq!(evaluate_literal(r"'\x41\101é'").as_deref(), Some("AAé"));
    assert_eq!(evaluate_literal(r"'\U0001F600'").as_deref(), Some("😀"));
    assert_eq!(evaluate_literal("'one \\\ntwo'").as_deref(), Some("one two"));
  }

  #[test]
  fn test_unknown_and_invalid_escapes_are_kept() {
    assert_eq!(evaluate_literal(r"'\d+'").as_deref(), Some(r"\d+"));
    assert_eq!(evaluate_literal(r"'\xZZ'").as_deref(), Some(r"\xZZ"));
    assert_eq!(
      evaluate_literal(r"'\N{BULLET}'").as_deref(),
      Some(r"\N{BULLET}")
    );
  }

  #[test]
  fn test_clean_docstring_removes_common_indent() {
    let doc = "Summary line.\n\n    Details here.\n      Indented more.\n    ";
    assert_eq!(
      clean_docstring(doc),
      "Summary line.\n\nDetails here.\n  Indented more."
    );
  }

  #[test]
  fn test_clean_docstring_strips_blank_edges() {
    let doc = "\n    First.\n    Second.\n\n";
    assert_eq!(clean_docstring(doc), "First.\nSecond.");
  }

  #[test]
  fn test_clean_docstring_expands_tabs() {
    let doc = "Head.\n\tBody.\n\t  More.";
    assert_eq!(clean_docstring(doc), "Head.\nBody.\n  More.");
  }

  #[test]
  fn test_clean_docstring_single_line() {
    assert_eq!(clean_docstring("   Just one.   "), "Just one.   ");
  }
}
