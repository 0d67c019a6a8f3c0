//! Line-level syntax extensions on top of reStructuredText.
//!
//! Three directives are not expressible in reStructuredText itself:
//!
//! - a line consisting of `/` inserts vertical space,
//! - a line consisting of `//` starts a new page,
//! - any other line ending in a single `/` forces a line break there.
//!
//! Before conversion each directive is masked by a placeholder made of
//! characters that neither reStructuredText nor LaTeX treat specially, so it
//! reaches the converter output unchanged. After conversion the placeholders
//! are replaced by the matching LaTeX commands.
use std::borrow::Cow;

pub const NEWLINE_PLACEHOLDER: &str = "!N!E!W!L!I!N!E!";
pub const NEWPAGE_PLACEHOLDER: &str = "!N!E!W!P!A!G!E!";
pub const VSPACE_PLACEHOLDER: &str = "!V!S!P!A!C!E!";

/// A syntax extension directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
  VerticalSpace,
  PageBreak,
  LineBreak,
}

impl Directive {
  pub const ALL: [Self; 3] = [Self::VerticalSpace, Self::PageBreak, Self::LineBreak];

  #[must_use]
  pub const fn placeholder(self) -> &'static str {
    match self {
      Self::VerticalSpace => VSPACE_PLACEHOLDER,
      Self::PageBreak => NEWPAGE_PLACEHOLDER,
      Self::LineBreak => NEWLINE_PLACEHOLDER,
    }
  }

  #[must_use]
  pub const fn latex(self) -> &'static str {
    match self {
      Self::VerticalSpace => r"\vspace{1ex}",
      Self::PageBreak => r"\newpage",
      Self::LineBreak => r"\newline",
    }
  }
}

/// Mask the directive on a single line, if any.
#[must_use]
pub fn encode_line(line: &str) -> Cow<'_, str> {
  match line {
    "/" => Cow::Borrowed(VSPACE_PLACEHOLDER),
    "//" => Cow::Borrowed(NEWPAGE_PLACEHOLDER),
    _ if line.len() > 1 && line.ends_with('/') && !line.ends_with("//") => {
      Cow::Owned(format!("{}{NEWLINE_PLACEHOLDER}", &line[..line.len() - 1]))
    },
    _ => Cow::Borrowed(line),
  }
}

pub fn encode_lines<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
  lines
    .iter()
    .map(|line| encode_line(line.as_ref()).into_owned())
    .collect()
}

/// Mask all directives in a block of markup. Line endings are normalized to
/// `\n`.
#[must_use]
pub fn encode(text: &str) -> String {
  text
    .split('\n')
    .map(|line| encode_line(line.strip_suffix('\r').unwrap_or(line)))
    .collect::<Vec<_>>()
    .join("\n")
}

/// Replace every placeholder with its LaTeX command.
#[must_use]
pub fn decode(text: &str) -> String {
  Directive::ALL
    .iter()
    .fold(text.to_string(), |acc, directive| {
      acc.replace(directive.placeholder(), directive.latex())
    })
}

pub fn decode_lines<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
  lines.iter().map(|line| decode(line.as_ref())).collect()
}
