//! C ABI for editor plugins that load the library directly
//!
//! Each `locus_<query>` function takes a NUL-terminated
//! `path[#unsaved]:flags:line:col` string and returns a NUL-terminated
//! vimson string.
//!
//! # Safety
//!
//! All entry points share one output buffer behind a mutex. The returned
//! pointer stays valid until the next call to any `locus_*` function, from
//! any thread; callers that need the text longer must copy it first. A null
//! input yields the query's empty form.

use crate::config::QueryConfig;
use crate::core::dispatch::{Query, QueryEngine};
use lazy_static::lazy_static;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;

lazy_static! {
    static ref ENGINE: QueryEngine = {
        let config = QueryConfig::load(None).unwrap_or_else(|err| {
            tracing::debug!(error = %err, "config unreadable, using defaults");
            QueryConfig::default()
        });
        QueryEngine::with_config(locus_ast::TreeSitterBackend::new(), config)
    };
    static ref OUTPUT: Mutex<CString> = Mutex::new(CString::default());
}

/// Run one query and park its answer in the shared buffer
fn answer(query: Query, input: *const c_char) -> *const c_char {
    let text = panic::catch_unwind(AssertUnwindSafe(|| {
        if input.is_null() {
            return query.empty().to_string();
        }
        // SAFETY: the caller passes a NUL-terminated string that outlives the call
        let spec = unsafe { CStr::from_ptr(input) }.to_string_lossy();
        ENGINE.run_spec(query, &spec)
    }))
    .unwrap_or_else(|_| query.empty().to_string());

    let text = CString::new(text).unwrap_or_else(|_| CString::new(query.empty()).unwrap_or_default());
    let mut output = OUTPUT.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    *output = text;
    output.as_ptr()
}

macro_rules! entry_points {
    ($( $function:ident => $query:ident ),* $(,)?) => {
        $(
            /// See the module docs for the lifetime of the returned pointer.
            ///
            /// # Safety
            ///
            /// `location` must be null or point to a NUL-terminated string.
            #[no_mangle]
            pub unsafe extern "C" fn $function(location: *const c_char) -> *const c_char {
                answer(Query::$query, location)
            }
        )*
    };
}

entry_points! {
    locus_location_info => LocationInfo,
    locus_extent_at => ExtentAt,
    locus_current_function_extent => CurrentFunctionExtent,
    locus_current_class_extent => CurrentClassExtent,
    locus_namespace_extent => NamespaceExtent,
    locus_expression_extent => ExpressionExtent,
    locus_statement_extent => StatementExtent,
    locus_definition_extent => DefinitionExtent,
    locus_all_extents => AllExtents,
    locus_type_at => TypeAt,
    locus_canonical_type_at => CanonicalTypeAt,
    locus_result_type_at => ResultTypeAt,
    locus_pointee_type_at => PointeeTypeAt,
    locus_referenced_at => ReferencedAt,
    locus_declaration_at => DeclarationAt,
    locus_definition_at => DefinitionAt,
    locus_current_function_at => CurrentFunctionAt,
    locus_deduced_declaration_at => DeducedDeclarationAt,
    locus_include_at => IncludeAt,
    locus_comment_at => CommentAt,
}
