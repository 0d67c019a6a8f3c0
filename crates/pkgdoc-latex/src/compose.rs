//! Assembly of the master LaTeX document.
use std::fmt::Write;

use pkgdoc_templates::{
  AUTODEFINED_HEADER,
  CHAPTER_TEMPLATE,
  FOOTER_TEMPLATE,
  HEADER_TEMPLATE,
  TRAILER_TEMPLATE,
};
use serde::Serialize;

use crate::escape::escape_latex;

/// Name written into generated files.
pub const GENERATOR: &str = "pkgdoc";

/// Title page metadata.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentMeta {
  pub title:   String,
  pub version: String,
  pub author:  String,
  pub date:    String,
}

/// One entry of the table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterRecord {
  /// Visible chapter title (module file name or document stem).
  pub headline:  String,
  /// Fragment file name, relative to the build folder.
  pub file_name: String,
  pub label:     Option<String>,
}

/// Generation metadata printed at the end of the document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Trailer {
  pub pdf_file_name:     String,
  pub now:               String,
  pub generator_version: String,
}

/// Replace `###KEY###` markers in `template`.
#[must_use]
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
  values.iter().fold(template.to_string(), |acc, (key, value)| {
    acc.replace(&format!("###{key}###"), value)
  })
}

/// Comment block every generated fragment starts with.
#[must_use]
pub fn fragment_header(timestamp: &str, package: &str) -> String {
  format!("%\n% Generated at {timestamp} by {package}\n%\n\n")
}

fn chapter(record: &ChapterRecord) -> String {
  let template = match record.label {
    Some(_) => CHAPTER_TEMPLATE.to_string(),
    None => CHAPTER_TEMPLATE.replace(r"\label{###LABEL###}", ""),
  };

  fill_template(&template, &[
    ("HEADLINE", escape_latex(&record.headline).as_str()),
    ("LABEL", record.label.as_deref().unwrap_or_default()),
    ("DOCUMENTNAME", record.file_name.as_str()),
  ])
}

/// Build the master document: title page, table of contents, one chapter
/// per record (in order), the generation trailer and the document end.
#[must_use]
pub fn compose_main_document(
  meta: &DocumentMeta,
  chapters: &[ChapterRecord],
  trailer: &Trailer,
) -> String {
  let mut document = fill_template(HEADER_TEMPLATE, &[
    ("TITLE", escape_latex(&meta.title).as_str()),
    ("VERSION", meta.version.as_str()),
    ("AUTHOR", meta.author.as_str()),
    ("DATE", meta.date.as_str()),
  ]);

  for record in chapters {
    document.push_str(&chapter(record));
  }

  document.push_str(&fill_template(TRAILER_TEMPLATE, &[
    ("PDFFILENAME", escape_latex(&trailer.pdf_file_name).as_str()),
    ("NOW", trailer.now.as_str()),
    ("GENERATOR", GENERATOR),
    ("GENERATORVERSION", trailer.generator_version.as_str()),
  ]));
  document.push_str(FOOTER_TEMPLATE);
  document
}

/// Content of `styles/autodefined.sty`, defining `\repo` and `\pkg`.
#[must_use]
pub fn autodefined_sty(
  repository: &str,
  package: &str,
  timestamp: &str,
) -> String {
  let mut sty = fill_template(AUTODEFINED_HEADER, &[
    ("GENERATOR", GENERATOR),
    ("TIMESTAMP", timestamp),
  ]);

  // Writing into a String never fails.
  let _ = writeln!(
    sty,
    "\\newcommand{{\\repo}}{{\\textbf{{{}}}}}",
    escape_latex(repository)
  );
  let _ = writeln!(
    sty,
    "\\newcommand{{\\pkg}}{{\\textbf{{{}}}}}",
    escape_latex(package)
  );
  sty
}

#[cfg(test)]
mod tests {
  use super::*;

  fn meta() -> DocumentMeta {
    DocumentMeta {
      title:   "my_package".to_string(),
      version: "1.2.0".to_string(),
      author:  "Jane Doe".to_string(),
      date:    "01.02.2025".to_string(),
    }
  }

  fn trailer() -> Trailer {
    Trailer {
      pdf_file_name:     "my_package.pdf".to_string(),
      now:               "01.02.2025 - 10:00:00".to_string(),
      generator_version: "0.9.0".to_string(),
    }
  }

  #[test]
  fn test_fill_template() {
    let out = fill_template("###A### and ###B### and ###C###", &[
      ("A", "x"),
      ("B", "y"),
    ]);
    assert_eq!(out, "x and y and ###C###");
  }

  #[test]
  fn test_fragment_header() {
    assert_eq!(
      fragment_header("01.02.2025 - 10:00:00", "mypkg"),
      "%\n% Generated at 01.02.2025 - 10:00:00 by mypkg\n%\n\n"
    );
  }

  #[test]
  fn test_main_document_structure() {
    let chapters = vec![
      ChapterRecord {
        headline:  "helpers.py".to_string(),
        file_name: "mypkg-helpers.tex".to_string(),
        label:     Some("mypkg-helpers".to_string()),
      },
      ChapterRecord {
        headline:  "read_me".to_string(),
        file_name: "read_me.tex".to_string(),
        label:     None,
      },
    ];

    let doc = compose_main_document(&meta(), &chapters, &trailer());

    assert!(doc.starts_with(r"\documentclass[a4paper,10pt]{report}"));
    assert!(doc.contains(r"\textbf{my\_package}"));
    assert!(doc.contains(r"\textbf{v. 1.2.0}"));
    assert!(doc.contains(r"\author{Jane Doe}"));

    let anchors_off = doc.find(r"\hypersetup{pageanchor=false}").unwrap_or(0);
    let title = doc.find(r"\maketitle").unwrap_or(0);
    let toc = doc.find(r"\tableofcontents").unwrap_or(0);
    let anchors_on = doc.find(r"\hypersetup{pageanchor=true}").unwrap_or(0);
    assert!(anchors_off < title && title < toc && toc < anchors_on);

    assert!(doc.contains(
      "\\chapter{helpers.py}\\label{mypkg-helpers}\n\\input{./mypkg-helpers.tex}"
    ));
    assert!(doc.contains("\\chapter{read\\_me}\n\\input{./read_me.tex}"));
    let first = doc.find("helpers.py").unwrap_or(0);
    let second = doc.find("read\\_me").unwrap_or(0);
    assert!(first < second);

    assert!(doc.contains(r"\textbf{my\_package.pdf}"));
    assert!(doc.contains("Created at 01.02.2025 - 10:00:00"));
    assert!(doc.contains("by pkgdoc v. 0.9.0"));
    assert!(doc.trim_end().ends_with(r"\end{document}"));
    assert!(!doc.contains("###"));
  }

  #[test]
  fn test_autodefined_sty() {
    let sty = autodefined_sty("my_repo", "my_pkg", "01.02.2025 - 10:00:00");
    assert!(sty.contains("Generated by pkgdoc at 01.02.2025 - 10:00:00"));
    assert!(sty.contains(r"\newcommand{\repo}{\textbf{my\_repo}}"));
    assert!(sty.contains(r"\newcommand{\pkg}{\textbf{my\_pkg}}"));
  }
}
