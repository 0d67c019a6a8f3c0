//! Python syntax tree walking for top-level declarations.
//!
//! The tree is produced by `tree-sitter-python`. Only the module level and
//! one level of class bodies are inspected: nested classes and functions
//! defined inside functions are never reported.
use std::path::Path;

use tree_sitter::{Node, Parser, Tree};

use crate::{
  error::PySourceError,
  literal::{clean_docstring, evaluate_literal},
  types::{
    ClassDoc,
    Declaration,
    FunctionDoc,
    KEYWORD_DECORATOR,
    MethodDoc,
    ModuleDoc,
  },
};

/// Parse `src` and reject any tree containing syntax errors.
pub fn parse_python(src: &str, path: &Path) -> Result<Tree, PySourceError> {
  let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
  let mut parser = Parser::new();
  parser
    .set_language(&language)
    .map_err(|e| PySourceError::Language(e.to_string()))?;

  let tree = parser.parse(src, None).ok_or_else(|| {
    PySourceError::Parse {
      path:    path.to_path_buf(),
      line:    1,
      message: "parser did not produce a syntax tree".to_string(),
    }
  })?;

  if let Some(node) = first_syntax_error(tree.root_node()) {
    let message = if node.is_missing() {
      format!("missing `{}`", node.kind())
    } else {
      let snippet = node
        .utf8_text(src.as_bytes())
        .unwrap_or_default()
        .lines()
        .next()
        .unwrap_or_default()
        .trim();
      if snippet.is_empty() {
        "invalid syntax".to_string()
      } else {
        format!("invalid syntax near `{snippet}`")
      }
    };

    return Err(PySourceError::Parse {
      path: path.to_path_buf(),
      line: node.start_position().row + 1,
      message,
    });
  }

  if let Some(node) = first_python2_construct(tree.root_node()) {
    return Err(PySourceError::Parse {
      path:    path.to_path_buf(),
      line:    node.start_position().row + 1,
      message: format!("Python 2 syntax (`{}`) is not supported", node.kind()),
    });
  }

  Ok(tree)
}

/// Grammar rules kept in `tree-sitter-python` for Python 2 sources, which
/// Python 3 rejects.
const PYTHON2_CONSTRUCTS: &[&str] = &["print_statement", "exec_statement"];

fn first_python2_construct(node: Node<'_>) -> Option<Node<'_>> {
  if PYTHON2_CONSTRUCTS.contains(&node.kind()) {
    return Some(node);
  }

  let mut cursor = node.walk();
  let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
  children.into_iter().find_map(first_python2_construct)
}

/// Depth-first search for the first `ERROR` or `MISSING` node.
fn first_syntax_error(node: Node<'_>) -> Option<Node<'_>> {
  if node.is_error() || node.is_missing() {
    return Some(node);
  }
  if !node.has_error() {
    return None;
  }

  let mut cursor = node.walk();
  let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
  children.into_iter().find_map(first_syntax_error)
}

/// Collect the unfiltered module description and declarations.
pub fn collect_module(src: &str, tree: &Tree) -> ModuleDoc {
  let statements = statements(tree.root_node());

  let description = statements
    .first()
    .and_then(|first| docstring_of(*first, src));

  let mut declarations = Vec::new();
  for statement in statements {
    let Some((definition, _)) = unwrap_definition(statement) else {
      continue;
    };

    match definition.kind() {
      "function_definition" => {
        if let Some(name) = name_of(definition, src) {
          log::trace!("found function `{name}`");
          declarations.push(Declaration::Function(FunctionDoc {
            name,
            doc: body_docstring(definition, src),
          }));
        }
      },
      "class_definition" => {
        if let Some(name) = name_of(definition, src) {
          log::trace!("found class `{name}`");
          declarations.push(Declaration::Class(ClassDoc {
            doc: body_docstring(definition, src),
            methods: collect_methods(definition, src),
            name,
          }));
        }
      },
      _ => {},
    }
  }

  ModuleDoc {
    description,
    declarations,
  }
}

fn collect_methods(class: Node<'_>, src: &str) -> Vec<MethodDoc> {
  let Some(body) = class.child_by_field_name("body") else {
    return Vec::new();
  };

  statements(body)
    .into_iter()
    .filter_map(unwrap_definition)
    .filter(|(definition, _)| definition.kind() == "function_definition")
    .filter_map(|(definition, decorators)| {
      let name = name_of(definition, src)?;
      Some(MethodDoc {
        doc: body_docstring(definition, src),
        is_keyword: decorators.iter().any(|d| is_keyword_decorator(*d, src)),
        name,
      })
    })
    .collect()
}

/// Named children of a block or module, without comments.
fn statements(node: Node<'_>) -> Vec<Node<'_>> {
  let mut cursor = node.walk();
  node
    .named_children(&mut cursor)
    .filter(|child| child.kind() != "comment")
    .collect()
}

/// Split a (possibly decorated) definition into the definition node and its
/// decorators.
fn unwrap_definition(node: Node<'_>) -> Option<(Node<'_>, Vec<Node<'_>>)> {
  match node.kind() {
    "function_definition" | "class_definition" => Some((node, Vec::new())),
    "decorated_definition" => {
      let definition = node.child_by_field_name("definition")?;
      let mut cursor = node.walk();
      let decorators = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "decorator")
        .collect();
      Some((definition, decorators))
    },
    _ => None,
  }
}

fn name_of(definition: Node<'_>, src: &str) -> Option<String> {
  definition
    .child_by_field_name("name")?
    .utf8_text(src.as_bytes())
    .ok()
    .map(str::to_string)
}

/// `@keyword` exactly: calls such as `@keyword("name")` and attribute
/// access such as `@robot.keyword` do not count.
fn is_keyword_decorator(decorator: Node<'_>, src: &str) -> bool {
  let mut cursor = decorator.walk();
  let expressions: Vec<Node<'_>> = decorator
    .named_children(&mut cursor)
    .filter(|child| child.kind() != "comment")
    .collect();

  matches!(
    expressions.as_slice(),
    [expr] if expr.kind() == "identifier"
      && expr.utf8_text(src.as_bytes()).ok() == Some(KEYWORD_DECORATOR)
  )
}

fn body_docstring(definition: Node<'_>, src: &str) -> Option<String> {
  let body = definition.child_by_field_name("body")?;
  statements(body)
    .first()
    .and_then(|first| docstring_of(*first, src))
}

/// The docstring carried by `statement`, if it is a bare string expression.
///
/// An empty string literal still counts as a docstring.
fn docstring_of(statement: Node<'_>, src: &str) -> Option<String> {
  if statement.kind() != "expression_statement" {
    return None;
  }

  let expressions = statements(statement);
  let [expr] = expressions.as_slice() else {
    return None;
  };

  Some(clean_docstring(&string_value(*expr, src)?))
}

/// Value of a string expression, following implicit concatenation and
/// redundant parentheses.
fn string_value(expr: Node<'_>, src: &str) -> Option<String> {
  match expr.kind() {
    "string" => evaluate_literal(expr.utf8_text(src.as_bytes()).ok()?),
    "concatenated_string" => {
      statements(expr)
        .into_iter()
        .map(|part| string_value(part, src))
        .collect()
    },
    "parenthesized_expression" => {
      match statements(expr).as_slice() {
        [inner] => string_value(*inner, src),
        _ => None,
      }
    },
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, reason = "Fine in tests")]
  use std::path::Path;

  use super::*;

  fn collect(src: &str) -> ModuleDoc {
    let tree = parse_python(src, Path::new("test.py")).unwrap();
    collect_module(src, &tree)
  }

  fn names(module: &ModuleDoc) -> Vec<&str> {
    module.declarations.iter().map(Declaration::name).collect()
  }

  #[test]
  fn test_module_description() {
    let module = collect("\"\"\"About.\"\"\"\n\ndef f():\n    pass\n");
    assert_eq!(module.description.as_deref(), Some("About."));
  }

  #[test]
  fn test_module_description_after_comment() {
    let module = collect("# -*- coding: utf-8 -*-\n'''About.'''\n");
    assert_eq!(module.description.as_deref(), Some("About."));
  }

  #[test]
  fn test_only_first_statement_is_description() {
    let module = collect("import os\n\"\"\"Not a description.\"\"\"\n");
    assert_eq!(module.description, None);

    let module = collect("'''First.'''\n'''Second.'''\n");
    assert_eq!(module.description.as_deref(), Some("First."));
  }

  #[test]
  fn test_source_order_is_preserved() {
    let src = "\
def b():
    pass

class A:
    pass

def a():
    pass
";
    assert_eq!(names(&collect(src)), vec!["b", "A", "a"]);
  }

  #[test]
  fn test_function_docstring() {
    let src = "\
def documented(x):
    \"\"\"Do the thing.

    With details.
    \"\"\"
    return x

def undocumented():
    x = 'not a docstring'
";
    let module = collect(src);
    let functions: Vec<_> = module.functions().collect();
    assert_eq!(functions[0].doc.as_deref(), Some("Do the thing.\n\nWith details."));
    assert_eq!(functions[1].doc, None);
  }

  #[test]
  fn test_class_methods_and_keywords() {
    let src = "\
class Library:
    '''A keyword library.'''

    @keyword
    def open_browser(self):
        '''Opens it.'''

    @keyword('Custom Name')
    def named(self):
        pass

    @staticmethod
    async def fetch():
        pass

    class Nested:
        def hidden(self):
            pass
";
    let module = collect(src);
    let class = module.classes().next().unwrap();
    assert_eq!(class.doc.as_deref(), Some("A keyword library."));

    let methods: Vec<_> = class
      .methods
      .iter()
      .map(|m| (m.name.as_str(), m.is_keyword))
      .collect();
    assert_eq!(
      methods,
      vec![("open_browser", true), ("named", false), ("fetch", false)]
    );
  }

  #[test]
  fn test_decorated_top_level_definitions() {
    let src = "\
@dataclass
class Point:
    '''A point.'''
    x: int

@cache
def compute():
    pass
";
    assert_eq!(names(&collect(src)), vec!["Point", "compute"]);
  }

  #[test]
  fn test_nested_functions_are_ignored() {
    let src = "\
def outer():
    def inner():
        pass
    return inner
";
    assert_eq!(names(&collect(src)), vec!["outer"]);
  }

  #[test]
  fn test_bytes_and_fstrings_are_not_docstrings() {
    let module = collect("def f():\n    b'raw'\n\ndef g():\n    f'{1}'\n");
    assert!(module.functions().all(|f| f.doc.is_none()));
  }

  #[test]
  fn test_concatenated_docstring() {
    let module = collect("def f():\n    ('Part one, '\n     'part two.')\n");
    let function = module.functions().next().unwrap();
    assert_eq!(function.doc.as_deref(), Some("Part one, part two."));
  }

  #[test]
  fn test_syntax_error_reports_line() {
    let src = "def ok():\n    pass\n\ndef broken(:\n    pass\n";
    let err = parse_python(src, Path::new("broken.py")).unwrap_err();
    assert!(
      matches!(&err, PySourceError::Parse { line: 4, path, .. } if path == Path::new("broken.py")),
      "unexpected error: {err}"
    );
  }

  #[test]
  fn test_python2_statements_are_rejected() {
    for src in [
      "x = 1\nprint \"hello\"\n",
      "exec \"x = 1\"\n",
      "def f():\n    print 'oops', 1\n",
    ] {
      let err = parse_python(src, Path::new("old.py")).unwrap_err();
      assert!(
        matches!(&err, PySourceError::Parse { message, .. } if message.contains("Python 2")),
        "unexpected error for {src:?}: {err}"
      );
    }

    let err = parse_python("x = 1\nprint \"hello\"\n", Path::new("old.py"))
      .unwrap_err();
    assert!(matches!(err, PySourceError::Parse { line: 2, .. }));
  }

  #[test]
  fn test_print_call_is_python3() {
    let module = collect("print('hello')\nexec('x = 1')\n\ndef f():\n    pass\n");
    assert_eq!(names(&module), vec!["f"]);
  }
}
