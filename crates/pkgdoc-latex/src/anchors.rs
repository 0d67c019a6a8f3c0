//! Rewriting of hyperlink anchors and cross-reference labels.
//!
//! The converter derives anchors from section titles. Titles such as
//! `Method: run` repeat across classes and modules, so once all fragments are
//! included in one master document LaTeX reports multiply-defined labels. The
//! [`Disambiguator`] prefixes every anchor with the module it belongs to and
//! appends a build-wide counter value, which makes each one unique.
use std::{collections::HashMap, sync::LazyLock};

use regex::{Captures, Regex};

/// `\hypertarget{ARG}` and `\label{ARG}` commands.
static ANCHOR_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\\(hypertarget|label)\{([^}]*)\}").unwrap_or_else(|e| {
    log::error!("Failed to compile ANCHOR_COMMAND regex: {e}");
    #[allow(
      clippy::expect_used,
      reason = "This pattern is guaranteed to be valid"
    )]
    Regex::new(r"[^\s\S]")
      .expect("regex pattern [^\\s\\S] should always compile")
  })
});

/// Source of build-order counter values for anchors and labels.
///
/// Both sequences increase monotonically and are independent of each other.
/// A fresh counter is created (or [`reset`](AnchorCounter::reset)) for every
/// build.
pub trait AnchorCounter {
  /// Next value for a `\hypertarget`.
  fn next_hypertarget(&mut self) -> u64;

  /// Next value for a `\label`.
  fn next_label(&mut self) -> u64;

  /// Number of hypertarget values handed out so far.
  fn hypertarget_count(&self) -> u64;

  /// Number of label values handed out so far.
  fn label_count(&self) -> u64;

  fn reset(&mut self);
}

/// In-memory counter pair, starting at 1 for each sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildCounter {
  hypertargets: u64,
  labels:       u64,
}

impl BuildCounter {
  #[must_use]
  pub const fn new() -> Self {
    Self {
      hypertargets: 0,
      labels:       0,
    }
  }
}

impl AnchorCounter for BuildCounter {
  fn next_hypertarget(&mut self) -> u64 {
    self.hypertargets += 1;
    self.hypertargets
  }

  fn next_label(&mut self) -> u64 {
    self.labels += 1;
    self.labels
  }

  fn hypertarget_count(&self) -> u64 {
    self.hypertargets
  }

  fn label_count(&self) -> u64 {
    self.labels
  }

  fn reset(&mut self) {
    *self = Self::new();
  }
}

/// How rewritten anchors are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorStyle {
  /// Append the next counter value to every rewritten anchor.
  pub append_counter: bool,
}

impl Default for AnchorStyle {
  fn default() -> Self {
    Self {
      append_counter: true,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnchorKind {
  Hypertarget,
  Label,
}

impl AnchorKind {
  fn from_command(command: &str) -> Option<Self> {
    match command {
      "hypertarget" => Some(Self::Hypertarget),
      "label" => Some(Self::Label),
      _ => None,
    }
  }

  const fn command(self) -> &'static str {
    match self {
      Self::Hypertarget => "hypertarget",
      Self::Label => "label",
    }
  }
}

fn is_well_formed(argument: &str) -> bool {
  !argument.trim().is_empty()
    && !argument.contains(['{', '}', '\\'])
}

/// Post-conversion anchor rewriting for one build.
#[derive(Debug, Clone, Default)]
pub struct Disambiguator<C: AnchorCounter = BuildCounter> {
  counter: C,
  style:   AnchorStyle,
}

impl Disambiguator<BuildCounter> {
  #[must_use]
  pub const fn new(style: AnchorStyle) -> Self {
    Self {
      counter: BuildCounter::new(),
      style,
    }
  }
}

impl<C: AnchorCounter> Disambiguator<C> {
  pub const fn with_counter(counter: C, style: AnchorStyle) -> Self {
    Self { counter, style }
  }

  pub const fn counter(&self) -> &C {
    &self.counter
  }

  pub const fn style(&self) -> AnchorStyle {
    self.style
  }

  /// Restart both counter sequences.
  pub fn reset(&mut self) {
    self.counter.reset();
  }

  /// Rewrite all `\hypertarget{...}` and `\label{...}` commands in `tex`.
  ///
  /// The new argument joins `first_prefix`, `second_prefix`, the original
  /// argument and (if enabled) the next counter value with `-`, skipping
  /// empty parts. Textually identical commands within one call receive the
  /// same replacement. Commands whose argument is empty or contains braces or
  /// backslashes are left as they are.
  pub fn rewrite_anchors(
    &mut self,
    tex: &str,
    first_prefix: &str,
    second_prefix: &str,
  ) -> String {
    let mut rewritten: HashMap<String, String> = HashMap::new();

    ANCHOR_COMMAND
      .replace_all(tex, |caps: &Captures<'_>| {
        let original = caps[0].to_string();

        if let Some(replacement) = rewritten.get(&original) {
          return replacement.clone();
        }

        let (Some(kind), Some(argument)) = (
          caps.get(1).and_then(|m| AnchorKind::from_command(m.as_str())),
          caps.get(2).map(|m| m.as_str()),
        ) else {
          log::warn!("could not isolate the anchor argument in `{original}`");
          return original;
        };

        if !is_well_formed(argument) {
          log::warn!("leaving malformed anchor `{original}` untouched");
          return original;
        }

        let replacement = format!(
          "\\{}{{{}}}",
          kind.command(),
          self.new_argument(kind, argument, first_prefix, second_prefix)
        );
        log::trace!("{original} -> {replacement}");
        rewritten.insert(original, replacement.clone());
        replacement
      })
      .into_owned()
  }

  fn new_argument(
    &mut self,
    kind: AnchorKind,
    argument: &str,
    first_prefix: &str,
    second_prefix: &str,
  ) -> String {
    let counter = self.style.append_counter.then(|| {
      let value = match kind {
        AnchorKind::Hypertarget => self.counter.next_hypertarget(),
        AnchorKind::Label => self.counter.next_label(),
      };
      value.to_string()
    });

    [first_prefix, second_prefix, argument]
      .into_iter()
      .chain(counter.as_deref())
      .filter(|part| !part.is_empty())
      .collect::<Vec<_>>()
      .join("-")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const PANDOC_SECTION: &str = "\\hypertarget{method-run}{%\n\\subsection{Method: \
                                run}\\label{method-run}}\n";

  #[test]
  fn test_counter_sequences_are_independent() {
    let mut counter = BuildCounter::new();
    assert_eq!(counter.next_hypertarget(), 1);
    assert_eq!(counter.next_hypertarget(), 2);
    assert_eq!(counter.next_label(), 1);
    assert_eq!(counter.hypertarget_count(), 2);
    assert_eq!(counter.label_count(), 1);

    counter.reset();
    assert_eq!(counter.hypertarget_count(), 0);
    assert_eq!(counter.next_label(), 1);
  }

  #[test]
  fn test_rewrite_with_prefix_and_counter() {
    let mut disambiguator = Disambiguator::new(AnchorStyle::default());
    let out = disambiguator.rewrite_anchors(PANDOC_SECTION, "pkg-a", "");
    assert_eq!(
      out,
      "\\hypertarget{pkg-a-method-run-1}{%\n\\subsection{Method: \
       run}\\label{pkg-a-method-run-1}}\n"
    );
  }

  #[test]
  fn test_same_name_in_two_fragments_gets_distinct_values() {
    let mut disambiguator = Disambiguator::new(AnchorStyle::default());
    let first = disambiguator.rewrite_anchors(r"\label{method-run}", "", "");
    let second = disambiguator.rewrite_anchors(r"\label{method-run}", "", "");
    assert_eq!(first, r"\label{method-run-1}");
    assert_eq!(second, r"\label{method-run-2}");
    assert_eq!(disambiguator.counter().label_count(), 2);
  }

  #[test]
  fn test_identical_commands_share_one_value() {
    let mut disambiguator = Disambiguator::new(AnchorStyle::default());
    let out = disambiguator
      .rewrite_anchors(r"\label{x} \label{y} \label{x}", "", "");
    assert_eq!(out, r"\label{x-1} \label{y-2} \label{x-1}");
  }

  #[test]
  fn test_without_counter() {
    let mut disambiguator = Disambiguator::new(AnchorStyle {
      append_counter: false,
    });
    let out = disambiguator.rewrite_anchors(r"\label{intro}", "pkg", "part");
    assert_eq!(out, r"\label{pkg-part-intro}");
    assert_eq!(disambiguator.counter().label_count(), 0);
  }

  #[test]
  fn test_malformed_anchor_left_untouched() {
    let mut disambiguator = Disambiguator::new(AnchorStyle::default());
    let tex = r"\label{} \label{a\b} \label{ok}";
    let out = disambiguator.rewrite_anchors(tex, "p", "");
    assert_eq!(out, r"\label{} \label{a\b} \label{p-ok-1}");
  }

  #[test]
  fn test_other_commands_untouched() {
    let mut disambiguator = Disambiguator::new(AnchorStyle::default());
    let tex = r"\ref{method-run} \section{Label: x} \hyperref[a]{b}";
    assert_eq!(disambiguator.rewrite_anchors(tex, "p", ""), tex);
  }

  #[derive(Default)]
  struct RecordingCounter {
    issued: Vec<&'static str>,
  }

  impl AnchorCounter for RecordingCounter {
    fn next_hypertarget(&mut self) -> u64 {
      self.issued.push("hypertarget");
      100
    }

    fn next_label(&mut self) -> u64 {
      self.issued.push("label");
      200
    }

    fn hypertarget_count(&self) -> u64 {
      self.issued.iter().filter(|k| **k == "hypertarget").count() as u64
    }

    fn label_count(&self) -> u64 {
      self.issued.iter().filter(|k| **k == "label").count() as u64
    }

    fn reset(&mut self) {
      self.issued.clear();
    }
  }

  #[test]
  fn test_injected_counter() {
    let mut disambiguator = Disambiguator::with_counter(
      RecordingCounter::default(),
      AnchorStyle::default(),
    );
    let out = disambiguator.rewrite_anchors(PANDOC_SECTION, "m", "");
    assert!(out.contains(r"\hypertarget{m-method-run-100}"));
    assert!(out.contains(r"\label{m-method-run-200}"));
    assert_eq!(disambiguator.counter().issued, vec!["hypertarget", "label"]);

    disambiguator.reset();
    assert_eq!(disambiguator.counter().label_count(), 0);
  }
}
