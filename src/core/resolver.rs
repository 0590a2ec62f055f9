//! Location resolution
//!
//! Turns a `LocationQuery` into a parsed translation unit plus the most
//! specific cursor at the requested position. The unit lives exactly as long
//! as the returned `Resolved`; every exit path drops it.

use crate::core::location::LocationQuery;
use locus_ast::{Cursor, NodeId, SyntaxBackend, TranslationUnit};
use std::path::PathBuf;

/// A parsed unit and the cursor a query starts from
pub struct Resolved {
    unit: Box<dyn TranslationUnit>,
    start: NodeId,
    file: PathBuf,
}

impl Resolved {
    pub fn unit(&self) -> &dyn TranslationUnit {
        self.unit.as_ref()
    }

    /// The starting cursor, borrowed from the unit
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self.unit.as_ref(), self.start)
    }

    pub fn file(&self) -> &std::path::Path {
        &self.file
    }
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolved")
            .field("file", &self.file)
            .field("start", &self.cursor())
            .finish()
    }
}

/// Parse around the query position
///
/// `None` when the main file cannot be read or parsed, or when the position
/// does not exist in it. Failures are logged and otherwise indistinguishable.
pub fn resolve(backend: &dyn SyntaxBackend, query: &LocationQuery) -> Option<Resolved> {
    let unit = match backend.parse(&query.request) {
        Ok(unit) => unit,
        Err(err) => {
            tracing::debug!(
                backend = backend.name(),
                file = %query.file().display(),
                error = %err,
                "resolution failed"
            );
            return None;
        }
    };

    let Some(start) = unit.cursor_at(query.file(), query.line, query.column) else {
        tracing::debug!(
            file = %query.file().display(),
            line = query.line,
            column = query.column,
            "position outside file"
        );
        return None;
    };

    tracing::debug!(
        file = %query.file().display(),
        line = query.line,
        column = query.column,
        kind = %unit.kind(start),
        nodes = unit.node_count(),
        "resolved start cursor"
    );
    Some(Resolved {
        unit,
        start,
        file: query.file().to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use locus_ast::{CursorKind, TreeSitterBackend, UnsavedFile};

    fn query(source: &str, line: u32, column: u32) -> LocationQuery {
        LocationQuery::new("r.cpp", line, column).with_unsaved(vec![UnsavedFile::new("r.cpp", source)])
    }

    #[test]
    fn test_resolve_most_specific_cursor() {
        let backend = TreeSitterBackend::new();
        let resolved = resolve(&backend, &query("int main() { return 42; }\n", 1, 22)).unwrap();
        assert_eq!(resolved.cursor().kind(), CursorKind::IntegerLiteral);
    }

    #[test]
    fn test_resolve_recovers_from_syntax_errors() {
        let backend = TreeSitterBackend::new();
        let source = "void f() {\n  int x = ;\n  x + \n";
        let resolved = resolve(&backend, &query(source, 2, 7)).unwrap();
        assert_eq!(resolved.cursor().kind(), CursorKind::VarDecl);
        let function = resolved.cursor().semantic_parent();
        assert_eq!(function.kind(), CursorKind::FunctionDecl);
        assert_eq!(function.spelling(), "f");
        assert_eq!(backend.live_units(), 1);
        drop(resolved);
        assert_eq!(backend.live_units(), 0);
    }

    #[test]
    fn test_resolve_missing_file() {
        let backend = TreeSitterBackend::new();
        assert!(resolve(&backend, &LocationQuery::new("/no/such/file.cpp", 1, 1)).is_none());
        assert_eq!(backend.live_units(), 0);
    }

    #[test]
    fn test_resolve_line_zero() {
        let backend = TreeSitterBackend::new();
        assert!(resolve(&backend, &query("int x;\n", 0, 0)).is_none());
        assert_eq!(backend.live_units(), 0);
    }

    #[test]
    fn test_resolved_owns_unit() {
        let backend = TreeSitterBackend::new();
        let resolved = resolve(&backend, &query("int x;\n", 1, 5)).unwrap();
        assert_eq!(backend.live_units(), 1);
        assert_eq!(resolved.file(), std::path::Path::new("r.cpp"));
        drop(resolved);
        assert_eq!(backend.live_units(), 0);
    }
}
