//! locus-ast: libclang-style cursors over tree-sitter parses
//!
//! This crate is the syntax layer underneath `locus`. It parses a C or C++
//! translation unit with tree-sitter, expands its `#include`s, and exposes
//! the result through a small libclang-shaped API: cursors with kinds,
//! spellings, locations and extents, semantic and lexical parents, types,
//! linkage, cross-references and brief comments.
//!
//! # Design
//!
//! - A syntax backend is a trait object, so the query layer above it never
//!   names tree-sitter
//! - Cursors are `NodeId`s into an arena owned by the translation unit; the
//!   `Cursor` view borrows the unit, so no cursor outlives it
//! - Syntax errors are recovered; a unit is always produced for a readable
//!   main file
//!
//! # Example
//!
//! ```rust,ignore
//! use locus_ast::{ParseRequest, SyntaxBackend, TreeSitterBackend, Cursor};
//! use std::path::Path;
//!
//! let backend = TreeSitterBackend::new();
//! let unit = backend.parse(&ParseRequest::new("main.cpp").with_args(["-std=c++17"]))?;
//! let id = unit.cursor_at(Path::new("main.cpp"), 3, 7).unwrap_or(unit.root());
//! let cursor = Cursor::new(unit.as_ref(), id);
//! println!("{} {}", cursor.kind(), cursor.spelling());
//! ```

pub mod adapters;
mod backend;
pub mod error;
pub mod ir;
pub mod provider;
mod registry;
mod unit;

pub use ir::{
    // Cursors
    AccessSpecifier,
    CursorFlags,
    CursorKind,
    KindClass,
    // Language
    LanguageId,
    Linkage,
    NodeId,
    // Locations
    SourceLocation,
    SourceRange,
    Token,
    TokenKind,
    // Types
    CxType,
    RefQualifier,
    TypeKind,
};

pub use adapters::LanguageAdapter;
pub use backend::TreeSitterBackend;
pub use error::AstError;
pub use provider::{Cursor, ParseRequest, SyntaxBackend, TranslationUnit, UnsavedFile, DEFAULT_INCLUDE_DEPTH};
pub use registry::AdapterRegistry;
pub use unit::sources::{CompileFlags, SourceLoader};
pub use unit::CppTranslationUnit;
