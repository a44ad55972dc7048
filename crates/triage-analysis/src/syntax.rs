//! Tree-sitter Python parsing

use std::cell::RefCell;
use tree_sitter::{Node, Parser, Tree};
use triage_core::{Result, TriageError};

thread_local! {
    static PYTHON_PARSER: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        // A language mismatch surfaces as a failed parse below
        let _ = p.set_language(&tree_sitter_python::LANGUAGE.into());
        p
    });
}

/// Parse Python source, keeping error nodes in the tree
pub fn parse_tolerant(source: &str) -> Option<Tree> {
    PYTHON_PARSER.with(|p| p.borrow_mut().parse(source, None))
}

/// Parse Python source, rejecting anything with syntax errors
pub fn parse_python(source: &str) -> Result<Tree> {
    let tree = parse_tolerant(source)
        .ok_or_else(|| TriageError::Syntax("parser produced no tree".to_string()))?;

    let root = tree.root_node();
    if root.has_error() {
        let line = first_error(root)
            .map(|n| n.start_position().row + 1)
            .unwrap_or(1);
        return Err(TriageError::Syntax(format!("invalid syntax (line {})", line)));
    }

    Ok(tree)
}

fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut found = None;
    walk(root, |node| {
        if found.is_none() && (node.is_error() || node.is_missing()) {
            found = Some(node);
        }
    });
    found
}

/// Visit every node in document order
pub fn walk<'t, F>(root: Node<'t>, mut visit: F)
where
    F: FnMut(Node<'t>),
{
    let mut cursor = root.walk();

    loop {
        visit(cursor.node());

        if cursor.goto_first_child() {
            continue;
        }

        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Source text covered by a node
pub fn node_text<'s>(node: &Node<'_>, source: &'s str) -> &'s str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// Node text with runs of whitespace collapsed to single spaces
pub fn one_line(node: &Node<'_>, source: &str) -> String {
    node_text(node, source)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Names of the top-level functions, in definition order
pub fn top_level_functions(source: &str) -> Vec<String> {
    let Some(tree) = parse_tolerant(source) else {
        return Vec::new();
    };
    let root = tree.root_node();
    let mut cursor = root.walk();

    let names: Vec<String> = root
        .named_children(&mut cursor)
        .filter_map(|node| match node.kind() {
            "function_definition" => Some(node),
            "decorated_definition" => node
                .child_by_field_name("definition")
                .filter(|d| d.kind() == "function_definition"),
            _ => None,
        })
        .filter_map(|f| f.child_by_field_name("name"))
        .map(|name| node_text(&name, source).to_string())
        .collect();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_source() {
        let tree = parse_python("def f(x):\n    return x\n").unwrap();
        assert_eq!(tree.root_node().kind(), "module");
    }

    #[test]
    fn test_parse_reports_error_line() {
        let err = parse_python("x = 1\ndef broken(:\n").unwrap_err();
        assert!(matches!(err, TriageError::Syntax(_)));
        assert!(err.to_string().contains("invalid syntax"));
    }

    #[test]
    fn test_top_level_functions_skip_nested_and_methods() {
        let source = "\
import math

class Shape:
    def area(self):
        return 0

@cache
def first(x):
    def inner(y):
        return y
    return inner(x)

def second():
    pass
";
        assert_eq!(top_level_functions(source), vec!["first", "second"]);
    }

    #[test]
    fn test_one_line_collapses_whitespace() {
        let source = "foo(\n    a,\n    b)";
        let tree = parse_python(source).unwrap();
        let root = tree.root_node();
        assert_eq!(one_line(&root, source), "foo( a, b)");
    }
}
