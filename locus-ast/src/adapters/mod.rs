//! Language adapters for locus-ast
//!
//! An adapter supplies the tree-sitter grammar for one language of the C
//! family. The cursor arena itself is grammar-agnostic enough that C and C++
//! share one builder; the adapter only decides which grammar parses the
//! translation unit.

pub mod c_family;

use crate::ir::LanguageId;

pub use c_family::{CTreeSitterAdapter, CppTreeSitterAdapter};

/// Trait for language-specific adapters
pub trait LanguageAdapter: Send + Sync {
    /// The language this adapter handles
    fn language(&self) -> LanguageId;

    /// Get the Tree-sitter language
    fn tree_sitter_language(&self) -> tree_sitter::Language;

    /// Create a parser configured for this language
    fn parser(&self) -> crate::error::Result<tree_sitter::Parser> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.tree_sitter_language())
            .map_err(|e| crate::error::AstError::TreeSitter(e.to_string()))?;
        Ok(parser)
    }
}

/// Get the text content of a Tree-sitter node
pub fn node_text<'a>(node: &tree_sitter::Node, source: &'a str) -> &'a str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// Find a child node by its kind
pub fn find_child_by_kind<'tree>(
    node: &tree_sitter::Node<'tree>,
    kind: &str,
) -> Option<tree_sitter::Node<'tree>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|child| child.kind() == kind);
    found
}

/// Find all children of a specific kind
pub fn find_children_by_kind<'tree>(
    node: &tree_sitter::Node<'tree>,
    kind: &str,
) -> Vec<tree_sitter::Node<'tree>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|child| child.kind() == kind)
        .collect()
}

/// Whether `child` is the node stored under `field` of `parent`
pub fn is_field(parent: &tree_sitter::Node, field: &str, child: &tree_sitter::Node) -> bool {
    parent
        .child_by_field_name(field)
        .is_some_and(|n| n.id() == child.id())
}

/// Whether any direct child of `node` is the keyword or token `text`
pub fn has_token(node: &tree_sitter::Node, source: &str, text: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| node_text(&child, source) == text);
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_cpp(source: &str) -> tree_sitter::Tree {
        let mut parser = CppTreeSitterAdapter::new().parser().unwrap();
        parser.parse(source, None).unwrap()
    }

    // =========================================================================
    // Helper Tests
    // =========================================================================

    #[test]
    fn test_node_text() {
        let source = "int x = 1;";
        let tree = parse_cpp(source);
        let root = tree.root_node();
        assert_eq!(node_text(&root, source), source);
    }

    #[test]
    fn test_find_child_by_kind() {
        let source = "namespace ns { int x; }";
        let tree = parse_cpp(source);
        let root = tree.root_node();

        let ns = find_child_by_kind(&root, "namespace_definition").unwrap();
        let name = ns.child_by_field_name("name").unwrap();
        assert_eq!(node_text(&name, source), "ns");
        assert!(find_child_by_kind(&root, "class_specifier").is_none());
    }

    #[test]
    fn test_find_children_by_kind() {
        let source = "int a; int b; void f();";
        let tree = parse_cpp(source);
        let root = tree.root_node();
        assert_eq!(find_children_by_kind(&root, "declaration").len(), 3);
    }

    #[test]
    fn test_is_field() {
        let source = "namespace ns {}";
        let tree = parse_cpp(source);
        let ns = tree.root_node().child(0).unwrap();
        let name = ns.child_by_field_name("name").unwrap();
        assert!(is_field(&ns, "name", &name));
        assert!(!is_field(&ns, "body", &name));
    }

    #[test]
    fn test_has_token() {
        let source = "struct S { virtual void f(); };";
        let tree = parse_cpp(source);
        let root = tree.root_node();
        let decl = find_child_by_kind(&root, "struct_specifier").unwrap();
        assert!(has_token(&decl, source, "struct"));
        assert!(!has_token(&decl, source, "class"));
    }
}
