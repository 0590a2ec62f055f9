//! Query dispatch
//!
//! Every query follows the same path: resolve the location once, optionally
//! search upward, project the result through `stringize`, and return an owned
//! string. The translation unit is dropped before the string is returned, and
//! any failure, miss or panic along the way renders the empty form.
//!
//! Three shapes cover most queries:
//!
//! - **extent of ancestor**: nearest cursor matching a `Predicate`, rendered
//!   as `{'start':{..},'end':{..}}`
//! - **related node**: a `Jump` away from the start cursor, rendered as a
//!   full node record
//! - **type projection**: the start cursor's type through a `TypeTransform`
//!
//! plus the breadcrumb chain and a handful of named queries with their own
//! record layouts.

use crate::config::QueryConfig;
use crate::core::location::LocationQuery;
use crate::core::resolver::resolve;
use crate::core::search::{self, Predicate};
use crate::core::stringize;
use crate::formats::{quote, record, VimsonWriter, EMPTY_LIST, EMPTY_RECORD};
use locus_ast::{Cursor, CxType, SyntaxBackend, TranslationUnit, TreeSitterBackend};
use std::panic::{self, AssertUnwindSafe};

/// Where a related-node query moves from the start cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jump {
    Identity,
    Referenced,
    /// The canonical (first) declaration
    Declaration,
    Definition,
}

impl Jump {
    pub fn apply<'tu>(&self, cursor: Cursor<'tu>) -> Cursor<'tu> {
        match self {
            Jump::Identity => cursor,
            Jump::Referenced => cursor.referenced(),
            Jump::Declaration => cursor.canonical(),
            Jump::Definition => cursor.definition(),
        }
    }
}

/// How a type query transforms the start cursor's type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTransform {
    Identity,
    Canonical,
    Result,
    Pointee,
}

impl TypeTransform {
    pub fn apply(&self, unit: &dyn TranslationUnit, ty: CxType) -> CxType {
        match self {
            TypeTransform::Identity => ty,
            TypeTransform::Canonical => unit.canonical_type(&ty),
            TypeTransform::Result => unit.result_type(&ty),
            TypeTransform::Pointee => unit.pointee_type(&ty),
        }
    }
}

/// Progress of one query, traced as it moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Init,
    Resolved,
    Matched,
    Empty,
}

fn advance(state: &mut DispatchState, next: DispatchState, query: &LocationQuery) {
    tracing::trace!(
        from = ?*state,
        to = ?next,
        file = %query.file().display(),
        line = query.line,
        column = query.column,
        "dispatch"
    );
    *state = next;
}

macro_rules! queries {
    ($( $variant:ident => $name:literal ),* $(,)?) => {
        /// Every named query
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Query {
            $( $variant, )*
        }

        impl Query {
            pub const ALL: &'static [Query] = &[ $( Query::$variant, )* ];

            pub fn name(&self) -> &'static str {
                match self {
                    $( Query::$variant => $name, )*
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $name => Some(Query::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

queries! {
    LocationInfo => "location_info",
    ExtentAt => "extent_at",
    CurrentFunctionExtent => "current_function_extent",
    CurrentClassExtent => "current_class_extent",
    NamespaceExtent => "namespace_extent",
    ExpressionExtent => "expression_extent",
    StatementExtent => "statement_extent",
    DefinitionExtent => "definition_extent",
    AllExtents => "all_extents",
    TypeAt => "type_at",
    CanonicalTypeAt => "canonical_type_at",
    ResultTypeAt => "result_type_at",
    PointeeTypeAt => "pointee_type_at",
    ReferencedAt => "referenced_at",
    DeclarationAt => "declaration_at",
    DefinitionAt => "definition_at",
    CurrentFunctionAt => "current_function_at",
    DeducedDeclarationAt => "deduced_declaration_at",
    IncludeAt => "include_at",
    CommentAt => "comment_at",
}

impl Query {
    /// The empty form this query answers with
    pub fn empty(&self) -> &'static str {
        match self {
            Query::AllExtents => EMPTY_LIST,
            _ => EMPTY_RECORD,
        }
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Stateless query front end over a syntax backend
pub struct QueryEngine<B: SyntaxBackend = TreeSitterBackend> {
    backend: B,
    config: QueryConfig,
}

impl Default for QueryEngine<TreeSitterBackend> {
    fn default() -> Self {
        Self::new(TreeSitterBackend::new())
    }
}

impl<B: SyntaxBackend> QueryEngine<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, QueryConfig::default())
    }

    pub fn with_config(backend: B, config: QueryConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Resolve, render, and fall back to `empty` on a miss or a panic
    fn at<F>(&self, query: &LocationQuery, empty: &'static str, render: F) -> String
    where
        F: FnOnce(Cursor<'_>) -> Option<String>,
    {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut state = DispatchState::Init;
            let Some(resolved) = resolve(&self.backend, query) else {
                advance(&mut state, DispatchState::Empty, query);
                return None;
            };
            advance(&mut state, DispatchState::Resolved, query);

            let rendered = render(resolved.cursor());
            let next = if rendered.is_some() {
                DispatchState::Matched
            } else {
                DispatchState::Empty
            };
            advance(&mut state, next, query);
            rendered
        }));

        match outcome {
            Ok(Some(text)) => text,
            Ok(None) => empty.to_string(),
            Err(_) => {
                tracing::debug!(file = %query.file().display(), "query panicked");
                empty.to_string()
            }
        }
    }

    // ------------------------------------------------------------------------
    // Query shapes
    // ------------------------------------------------------------------------

    /// `{'start':{..},'end':{..}}` of the nearest cursor matching `predicate`
    pub fn extent_of_ancestor(&self, query: &LocationQuery, predicate: Predicate) -> String {
        self.at(query, EMPTY_RECORD, |cursor| {
            search::search_upward(cursor, predicate).map(|found| record(&stringize::extent(&found)))
        })
    }

    /// Node record of the cursor `jump` leads to
    pub fn related_node(&self, query: &LocationQuery, jump: Jump) -> String {
        self.at(query, EMPTY_RECORD, |cursor| {
            let target = jump.apply(cursor);
            if target.is_invalid() {
                return None;
            }
            Some(record(&stringize::cursor(&target, &target.semantic_parent())))
        })
    }

    /// Type record of the start cursor's type after `transform`
    pub fn type_projection(&self, query: &LocationQuery, transform: TypeTransform) -> String {
        self.at(query, EMPTY_RECORD, |cursor| {
            let ty = transform.apply(cursor.unit(), cursor.cursor_type());
            ty.is_valid().then(|| record(&stringize::type_fragment(&ty)))
        })
    }

    /// `[{'kind':'..','start':{..},'end':{..}},..,]` for the breadcrumb chain
    pub fn ancestor_chain(&self, query: &LocationQuery) -> String {
        self.at(query, EMPTY_LIST, |cursor| {
            let mut w = VimsonWriter::new();
            w.open_list();
            for node in search::ancestor_chain(cursor) {
                w.open_record()
                    .string("kind", node.kind().spelling())
                    .raw(&stringize::extent(&node))
                    .close_record()
                    .comma();
            }
            w.close_list();
            Some(w.finish())
        })
    }

    // ------------------------------------------------------------------------
    // Named queries with their own layouts
    // ------------------------------------------------------------------------

    /// `{'name':'ns::C::foo'}` for the enclosing named function
    pub fn current_function(&self, query: &LocationQuery) -> String {
        self.at(query, EMPTY_RECORD, |cursor| {
            let function = search::search_upward(cursor, Predicate::NamedFunction)?;
            Some(format!("{{'name':{}}}", quote(&qualified_name(function))))
        })
    }

    /// `{'file':'..','line':'N','col':'N',}` of the referenced entity's
    /// first declaration
    pub fn deduced_declaration(&self, query: &LocationQuery) -> String {
        self.at(query, EMPTY_RECORD, |cursor| {
            let referenced = cursor.referenced();
            if referenced.is_invalid() {
                return None;
            }
            let canonical = referenced.canonical();
            let declaration = if canonical.is_invalid() {
                referenced
            } else {
                canonical
            };
            let location = declaration.location()?;
            let mut w = VimsonWriter::new();
            w.open_record()
                .string("file", &location.file.to_string_lossy())
                .string("line", &location.line.to_string())
                .string("col", &location.column.to_string())
                .close_record();
            Some(w.finish())
        })
    }

    /// `{'file':'..'}` of the header an inclusion directive names
    pub fn include_target(&self, query: &LocationQuery) -> String {
        self.at(query, EMPTY_RECORD, |cursor| {
            let path = cursor.included_file()?;
            Some(format!("{{'file':{}}}", quote(&path.to_string_lossy())))
        })
    }

    /// `{'brief':'..'}` from the referenced declaration's doc comment
    pub fn brief_comment(&self, query: &LocationQuery) -> String {
        self.at(query, EMPTY_RECORD, |cursor| {
            let brief = cursor.referenced().brief_comment()?;
            Some(format!("{{'brief':{}}}", quote(&brief)))
        })
    }

    // ------------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------------

    pub fn run(&self, query: Query, location: &LocationQuery) -> String {
        tracing::debug!(%query, file = %location.file().display(), "running query");
        match query {
            Query::LocationInfo => self.related_node(location, Jump::Identity),
            Query::ExtentAt => self.extent_of_ancestor(location, Predicate::Any),
            Query::CurrentFunctionExtent => self.extent_of_ancestor(location, Predicate::FunctionLike),
            Query::CurrentClassExtent => self.extent_of_ancestor(location, Predicate::ClassLike),
            Query::NamespaceExtent => self.extent_of_ancestor(location, Predicate::Namespace),
            Query::ExpressionExtent => self.extent_of_ancestor(location, Predicate::Expression),
            Query::StatementExtent => self.extent_of_ancestor(location, Predicate::Statement),
            Query::DefinitionExtent => self.extent_of_ancestor(location, Predicate::Definition),
            Query::AllExtents => self.ancestor_chain(location),
            Query::TypeAt => self.type_projection(location, TypeTransform::Identity),
            Query::CanonicalTypeAt => self.type_projection(location, TypeTransform::Canonical),
            Query::ResultTypeAt => self.type_projection(location, TypeTransform::Result),
            Query::PointeeTypeAt => self.type_projection(location, TypeTransform::Pointee),
            Query::ReferencedAt => self.related_node(location, Jump::Referenced),
            Query::DeclarationAt => self.related_node(location, Jump::Declaration),
            Query::DefinitionAt => self.related_node(location, Jump::Definition),
            Query::CurrentFunctionAt => self.current_function(location),
            Query::DeducedDeclarationAt => self.deduced_declaration(location),
            Query::IncludeAt => self.include_target(location),
            Query::CommentAt => self.brief_comment(location),
        }
    }

    /// Run a query addressed by a `path[#unsaved]:flags:line:col` string
    pub fn run_spec(&self, query: Query, spec: &str) -> String {
        match LocationQuery::parse(spec, &self.config) {
            Ok(location) => self.run(query, &location),
            Err(err) => {
                tracing::debug!(%query, spec, error = %err, "bad location");
                query.empty().to_string()
            }
        }
    }
}

/// Spelling qualified through semantic parents up to the translation unit;
/// anonymous scopes contribute nothing
pub fn qualified_name(cursor: Cursor<'_>) -> String {
    let budget = cursor.unit().node_count() + 1;
    let mut parts = Vec::new();
    let mut current = cursor;
    for _ in 0..budget {
        if current.is_invalid() || current.kind() == locus_ast::CursorKind::TranslationUnit {
            break;
        }
        let spelling = current.spelling();
        if !spelling.is_empty() {
            parts.push(spelling);
        }
        current = current.semantic_parent();
    }
    parts.reverse();
    parts.join("::")
}

#[cfg(test)]
mod tests {
    use super::*;
    use locus_ast::{AstError, ParseRequest, UnsavedFile};

    mockall::mock! {
        pub Backend {}
        impl SyntaxBackend for Backend {
            fn name(&self) -> &'static str;
            fn parse(&self, request: &ParseRequest) -> locus_ast::error::Result<Box<dyn TranslationUnit>>;
        }
    }

    const SOURCE: &str = "\
namespace ns {
class C {
public:
  int foo(int a);
};
int C::foo(int a) {
  int *p = &a;
  return *p + 1;
}
}
";

    fn located(line: u32, column: u32) -> LocationQuery {
        LocationQuery::new("d.cpp", line, column).with_unsaved(vec![UnsavedFile::new("d.cpp", SOURCE)])
    }

    // =========================================================================
    // Query Table Tests
    // =========================================================================

    #[test]
    fn test_query_names_round_trip() {
        for query in Query::ALL {
            assert_eq!(Query::from_name(query.name()), Some(*query));
        }
        assert_eq!(Query::from_name("completion_at"), None);
    }

    #[test]
    fn test_empty_forms() {
        assert_eq!(Query::AllExtents.empty(), "[]");
        assert_eq!(Query::TypeAt.empty(), "{}");
    }

    // =========================================================================
    // Shape Tests
    // =========================================================================

    #[test]
    fn test_current_function_out_of_line() {
        let engine: QueryEngine = QueryEngine::default();
        assert_eq!(engine.current_function(&located(8, 10)), "{'name':'ns::C::foo'}");
    }

    #[test]
    fn test_current_function_outside_any_function() {
        let engine: QueryEngine = QueryEngine::default();
        assert_eq!(engine.current_function(&located(2, 7)), "{}");
    }

    #[test]
    fn test_extent_of_function() {
        let engine: QueryEngine = QueryEngine::default();
        let text = engine.extent_of_ancestor(&located(8, 10), Predicate::FunctionLike);
        assert!(text.starts_with("{'start':{'line':6,'column':1,"));
        assert!(text.contains("'end':{'line':9,'column':2,"));
        assert!(text.ends_with("}}"));
    }

    #[test]
    fn test_type_projection_pointee() {
        let engine: QueryEngine = QueryEngine::default();
        let location = located(7, 8);
        assert_eq!(
            engine.type_projection(&location, TypeTransform::Identity),
            "{'type':'int *','type_kind':'Pointer','is_POD_type':1,}"
        );
        assert_eq!(
            engine.type_projection(&location, TypeTransform::Pointee),
            "{'type':'int','type_kind':'Int','is_POD_type':1,}"
        );
    }

    #[test]
    fn test_type_projection_result() {
        let engine: QueryEngine = QueryEngine::default();
        let text = engine.type_projection(&located(4, 7), TypeTransform::Result);
        assert_eq!(text, "{'type':'int','type_kind':'Int','is_POD_type':1,}");
        assert_eq!(engine.type_projection(&located(7, 8), TypeTransform::Result), "{}");
    }

    #[test]
    fn test_related_node_declaration() {
        let engine: QueryEngine = QueryEngine::default();
        let text = engine.related_node(&located(6, 9), Jump::Declaration);
        assert!(text.starts_with("{'spell':'foo','type':'int (int)',"));
        assert!(text.contains("'line':4,"));
        assert!(text.contains("'parent':'C','semantic_parent':'C','lexical_parent':'C',"));
    }

    #[test]
    fn test_related_node_definition() {
        let engine: QueryEngine = QueryEngine::default();
        let text = engine.related_node(&located(4, 7), Jump::Definition);
        assert!(text.contains("'lexical_parent':'ns',"));
        assert!(text.contains("'is_definition':1,"));
    }

    #[test]
    fn test_ancestor_chain_shape() {
        let engine: QueryEngine = QueryEngine::default();
        let text = engine.ancestor_chain(&located(8, 10));
        assert!(text.starts_with("[{'kind':"));
        assert!(text.ends_with("},]"));
        assert!(text.contains("{'kind':'CXXMethod','start':{'line':6,"));
        assert!(text.contains("{'kind':'Namespace','start':{'line':1,"));
    }

    #[test]
    fn test_unclosed_function_keeps_its_scope() {
        let engine: QueryEngine = QueryEngine::default();
        let source = "void f() {\n  int x = ;\n  x +\n";
        let location = LocationQuery::new("e.cpp", 2, 7).with_unsaved(vec![UnsavedFile::new("e.cpp", source)]);
        assert_eq!(engine.current_function(&location), "{'name':'f'}");
        let chain = engine.ancestor_chain(&location);
        assert!(chain.starts_with("[{'kind':'VarDecl',"));
        assert!(chain.contains("{'kind':'FunctionDecl','start':{'line':1,'column':1,"));
    }

    #[test]
    fn test_deduced_declaration() {
        let engine: QueryEngine = QueryEngine::default();
        assert_eq!(
            engine.deduced_declaration(&located(8, 11)),
            "{'file':'d.cpp','line':'7','col':'8',}"
        );
    }

    // =========================================================================
    // Failure Tests
    // =========================================================================

    #[test]
    fn test_missing_file_is_empty() {
        let engine: QueryEngine = QueryEngine::default();
        let location = LocationQuery::new("/no/such/file.cpp", 1, 1);
        for query in Query::ALL {
            assert_eq!(engine.run(*query, &location), query.empty());
        }
        assert_eq!(engine.backend().live_units(), 0);
    }

    #[test]
    fn test_backend_failure_is_empty() {
        let mut backend = MockBackend::new();
        backend.expect_name().return_const("mock");
        backend
            .expect_parse()
            .returning(|_| Err(AstError::parse_error("no tree")));

        let engine = QueryEngine::new(backend);
        let location = LocationQuery::new("a.cpp", 1, 1);
        assert_eq!(engine.run(Query::LocationInfo, &location), "{}");
        assert_eq!(engine.run(Query::AllExtents, &location), "[]");
    }

    #[test]
    fn test_backend_panic_is_empty() {
        let mut backend = MockBackend::new();
        backend.expect_name().return_const("mock");
        backend.expect_parse().returning(|_| panic!("backend bug"));

        let engine = QueryEngine::new(backend);
        let location = LocationQuery::new("a.cpp", 1, 1);
        assert_eq!(engine.run(Query::TypeAt, &location), "{}");
    }

    #[test]
    fn test_run_spec_bad_location() {
        let engine: QueryEngine = QueryEngine::default();
        assert_eq!(engine.run_spec(Query::AllExtents, ""), "[]");
        assert_eq!(engine.run_spec(Query::IncludeAt, "a.cpp#/no/such:x:1:1"), "{}");
    }

    #[test]
    fn test_idempotent_output() {
        let engine: QueryEngine = QueryEngine::default();
        let location = located(8, 10);
        for query in Query::ALL {
            assert_eq!(engine.run(*query, &location), engine.run(*query, &location));
        }
        assert_eq!(engine.backend().live_units(), 0);
    }
}
