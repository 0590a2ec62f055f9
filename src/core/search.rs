//! Upward search over semantic parents
//!
//! A search tests the start cursor first, then each semantic parent in turn,
//! and stops at the first invalid cursor above the translation unit. The walk
//! is also capped at the unit's node count, so a parent relation that loops
//! still terminates.

use locus_ast::{Cursor, CursorKind};

/// Structural properties a search can look for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// Functions, methods, constructors, destructors, conversions,
    /// function templates and lambdas
    FunctionLike,
    /// Like `FunctionLike` without lambdas
    NamedFunction,
    /// Classes, structs, unions, class templates and partial specializations
    ClassLike,
    Namespace,
    Expression,
    Statement,
    Definition,
    Any,
}

impl Predicate {
    pub fn matches(&self, cursor: &Cursor<'_>) -> bool {
        let kind = cursor.kind();
        match self {
            Predicate::FunctionLike => kind.is_function() || kind == CursorKind::LambdaExpr,
            Predicate::NamedFunction => kind.is_function(),
            Predicate::ClassLike => kind.is_class(),
            Predicate::Namespace => kind == CursorKind::Namespace,
            Predicate::Expression => kind.is_expression(),
            Predicate::Statement => kind.is_statement(),
            Predicate::Definition => cursor.flags().is_definition,
            Predicate::Any => true,
        }
    }
}

/// Nearest cursor at or above `start` that satisfies `predicate`
pub fn search_upward<'tu>(start: Cursor<'tu>, predicate: Predicate) -> Option<Cursor<'tu>> {
    let budget = start.unit().node_count() + 1;
    let mut cursor = start;
    for step in 0..budget {
        if cursor.is_invalid() {
            tracing::trace!(steps = step, ?predicate, "search reached the root");
            return None;
        }
        if predicate.matches(&cursor) {
            tracing::trace!(steps = step, ?predicate, kind = %cursor.kind(), "search matched");
            return Some(cursor);
        }
        cursor = cursor.semantic_parent();
    }
    tracing::debug!(?predicate, "search exhausted its step budget");
    None
}

/// Breadcrumb chain from `start` toward the root
///
/// `start` is always first. The walk then begins again at `start` and keeps
/// classes, functions and namespaces, plus only the first expression and the
/// first statement it passes.
pub fn ancestor_chain<'tu>(start: Cursor<'tu>) -> Vec<Cursor<'tu>> {
    let mut chain = vec![start];
    let budget = start.unit().node_count() + 1;
    let mut seen_expression = false;
    let mut seen_statement = false;

    let mut cursor = start;
    for _ in 0..budget {
        if cursor.is_invalid() {
            break;
        }
        let kind = cursor.kind();
        let keep = kind.is_class()
            || kind.is_function()
            || kind == CursorKind::Namespace
            || (!seen_expression && kind.is_expression())
            || (!seen_statement && kind.is_statement());
        if keep {
            chain.push(cursor);
        }
        seen_expression |= kind.is_expression();
        seen_statement |= kind.is_statement();
        cursor = cursor.semantic_parent();
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use locus_ast::{ParseRequest, SyntaxBackend, TranslationUnit, TreeSitterBackend, UnsavedFile};
    use std::path::Path;

    const SOURCE: &str = "\
namespace ns {
class C {
  int foo(int a) {
    return [a]() { return a + 1; }();
  }
};
}
";

    fn parse(source: &str) -> Box<dyn TranslationUnit> {
        let request = ParseRequest::new("s.cpp").with_unsaved(vec![UnsavedFile::new("s.cpp", source)]);
        TreeSitterBackend::new().parse(&request).unwrap()
    }

    fn at(unit: &dyn TranslationUnit, line: u32, column: u32) -> Cursor<'_> {
        Cursor::new(unit, unit.cursor_at(Path::new("s.cpp"), line, column).unwrap())
    }

    // =========================================================================
    // search_upward Tests
    // =========================================================================

    #[test]
    fn test_start_cursor_is_tested_first() {
        let unit = parse(SOURCE);
        let start = at(unit.as_ref(), 3, 7);
        assert_eq!(start.kind(), CursorKind::CXXMethod);
        assert_eq!(search_upward(start, Predicate::NamedFunction), Some(start));
    }

    #[test]
    fn test_function_like_stops_at_lambda() {
        let unit = parse(SOURCE);
        let start = at(unit.as_ref(), 4, 29);
        let found = search_upward(start, Predicate::FunctionLike).unwrap();
        assert_eq!(found.kind(), CursorKind::LambdaExpr);
    }

    #[test]
    fn test_named_function_skips_lambda() {
        let unit = parse(SOURCE);
        let start = at(unit.as_ref(), 4, 29);
        let found = search_upward(start, Predicate::NamedFunction).unwrap();
        assert_eq!(found.kind(), CursorKind::CXXMethod);
        assert_eq!(found.spelling(), "foo");
    }

    #[test]
    fn test_class_and_namespace() {
        let unit = parse(SOURCE);
        let start = at(unit.as_ref(), 4, 29);
        assert_eq!(search_upward(start, Predicate::ClassLike).unwrap().spelling(), "C");
        assert_eq!(search_upward(start, Predicate::Namespace).unwrap().spelling(), "ns");
    }

    #[test]
    fn test_no_match_returns_none() {
        let unit = parse("int x = 1;\n");
        let start = at(unit.as_ref(), 1, 9);
        assert!(search_upward(start, Predicate::ClassLike).is_none());
        assert!(search_upward(start, Predicate::FunctionLike).is_none());
    }

    #[test]
    fn test_null_start() {
        let unit = parse("int x;\n");
        assert!(search_upward(Cursor::null(unit.as_ref()), Predicate::Any).is_none());
    }

    #[test]
    fn test_definition_predicate() {
        let unit = parse("void f() {\n  int y = 0;\n}\n");
        let start = at(unit.as_ref(), 2, 11);
        let found = search_upward(start, Predicate::Definition).unwrap();
        assert_eq!(found.kind(), CursorKind::VarDecl);
    }

    // =========================================================================
    // ancestor_chain Tests
    // =========================================================================

    #[test]
    fn test_chain_starts_with_start_twice() {
        let unit = parse(SOURCE);
        let start = at(unit.as_ref(), 3, 7);
        let chain = ancestor_chain(start);
        assert_eq!(chain[0], start);
        assert_eq!(chain[1], start);
    }

    #[test]
    fn test_chain_keeps_one_expression_and_one_statement() {
        let unit = parse(SOURCE);
        let start = at(unit.as_ref(), 4, 29);
        let chain = ancestor_chain(start);

        let rest = &chain[1..];
        let expressions = rest.iter().filter(|c| c.kind().is_expression()).count();
        let statements = rest.iter().filter(|c| c.kind().is_statement()).count();
        assert_eq!(expressions, 1);
        assert_eq!(statements, 1);

        let kinds: Vec<CursorKind> = rest.iter().map(|c| c.kind()).collect();
        assert!(kinds.contains(&CursorKind::CXXMethod));
        assert!(kinds.contains(&CursorKind::ClassDecl));
        assert!(kinds.contains(&CursorKind::Namespace));
        assert!(!kinds.contains(&CursorKind::TranslationUnit));
    }

    #[test]
    fn test_chain_of_null_cursor() {
        let unit = parse("int x;\n");
        let chain = ancestor_chain(Cursor::null(unit.as_ref()));
        assert_eq!(chain.len(), 1);
    }
}
