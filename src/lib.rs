//! locus - cursor-position queries over C and C++ sources
//!
//! Given a file, a line and column, compiler flags and optionally an unsaved
//! buffer, locus answers questions about the syntax tree around that point:
//! the enclosing function, the declaration a name refers to, the extents of
//! the surrounding scopes, the type under the cursor. Each answer is a single
//! vimson string an editor plugin can evaluate as-is.
//!
//! # Architecture
//!
//! This crate follows the "Library-First" pattern:
//! - **core**: location boundary, resolver, upward search, serialization and
//!   query dispatch
//! - **ffi**: the C ABI (`locus_*` functions) for plugins loading the
//!   library directly
//! - **bin/locus.rs**: thin CLI wrapper
//!
//! Parsing lives in the `locus-ast` crate behind the `SyntaxBackend` trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use locus::{LocationQuery, Query, QueryEngine};
//!
//! let engine = QueryEngine::default();
//! let query = LocationQuery::new("src/main.cpp", 13, 1).with_args(["-std=c++17"]);
//! println!("{}", engine.run(Query::CurrentFunctionAt, &query));
//! ```

pub mod config;
pub mod core;
pub mod ffi;
pub mod formats;
pub mod logging;

pub use crate::config::QueryConfig;
pub use crate::core::{
    DispatchState, Jump, LocationQuery, LocationSpec, Predicate, Query, QueryEngine, QueryError,
    Resolved, TypeTransform,
};
pub use locus_ast::{SyntaxBackend, TranslationUnit, TreeSitterBackend, UnsavedFile};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run one query addressed by a location string with default settings
pub fn query(query: Query, location: &str) -> String {
    QueryEngine::<TreeSitterBackend>::default().run_spec(query, location)
}
