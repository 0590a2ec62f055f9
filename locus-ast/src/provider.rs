//! Backend traits and the borrowed cursor view
//!
//! - `SyntaxBackend` turns a `ParseRequest` into an owned translation unit
//! - `TranslationUnit` answers per-node questions by `NodeId`
//! - `Cursor` pairs a unit with a node so callers can chain queries; it
//!   borrows the unit, so no cursor survives the unit's disposal

use crate::error::Result;
use crate::ir::{
    AccessSpecifier, CursorFlags, CursorKind, CxType, Linkage, NodeId, SourceLocation,
    SourceRange, Token, TypeKind,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Requests
// ============================================================================

/// In-memory content substituted for `path` during a parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsavedFile {
    pub path: PathBuf,
    pub contents: String,
}

impl UnsavedFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Everything a backend needs to build one translation unit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseRequest {
    pub file: PathBuf,
    pub args: Vec<String>,
    pub unsaved: Vec<UnsavedFile>,
    /// Nested `#include` depth limit; 0 disables include expansion
    pub max_include_depth: usize,
}

impl ParseRequest {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            args: Vec::new(),
            unsaved: Vec::new(),
            max_include_depth: DEFAULT_INCLUDE_DEPTH,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_unsaved(mut self, unsaved: Vec<UnsavedFile>) -> Self {
        self.unsaved = unsaved;
        self
    }
}

pub const DEFAULT_INCLUDE_DEPTH: usize = 32;

// ============================================================================
// Traits
// ============================================================================

/// Produces translation units
pub trait SyntaxBackend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Parse the request's main file; syntax errors are recovered, only a
    /// missing main file or a grammar failure is an error
    fn parse(&self, request: &ParseRequest) -> Result<Box<dyn TranslationUnit>>;
}

/// One parsed translation unit
///
/// Every method accepts `NodeId::NULL` and answers with the neutral value
/// (invalid kind, empty spelling, `None`, `NodeId::NULL`).
pub trait TranslationUnit {
    fn root(&self) -> NodeId;

    /// Most specific cursor at a 1-based (line, column) in `file`
    fn cursor_at(&self, file: &Path, line: u32, column: u32) -> Option<NodeId>;

    fn kind(&self, node: NodeId) -> CursorKind;
    fn spelling(&self, node: NodeId) -> String;
    fn semantic_parent(&self, node: NodeId) -> NodeId;
    fn lexical_parent(&self, node: NodeId) -> NodeId;
    fn location(&self, node: NodeId) -> Option<SourceLocation>;
    fn extent(&self, node: NodeId) -> Option<SourceRange>;
    fn tokenize(&self, range: &SourceRange) -> Vec<Token>;

    fn cursor_type(&self, node: NodeId) -> CxType;
    fn linkage(&self, node: NodeId) -> Linkage;
    fn access(&self, node: NodeId) -> AccessSpecifier;
    fn flags(&self, node: NodeId) -> CursorFlags;

    fn referenced(&self, node: NodeId) -> NodeId;
    fn canonical(&self, node: NodeId) -> NodeId;
    fn definition(&self, node: NodeId) -> NodeId;
    fn included_file(&self, node: NodeId) -> Option<PathBuf>;
    fn brief_comment(&self, node: NodeId) -> Option<String>;

    /// Desugared type: typedefs and `auto` resolved, qualifiers kept
    fn canonical_type(&self, ty: &CxType) -> CxType;

    fn result_type(&self, ty: &CxType) -> CxType {
        ty.result.as_deref().cloned().unwrap_or_default()
    }

    fn pointee_type(&self, ty: &CxType) -> CxType {
        if ty.kind == TypeKind::Pointer || ty.kind.is_reference() {
            ty.element.as_deref().cloned().unwrap_or_default()
        } else {
            CxType::invalid()
        }
    }

    fn node_count(&self) -> usize;
}

// ============================================================================
// Cursor
// ============================================================================

/// A node viewed through the unit that owns it
#[derive(Clone, Copy)]
pub struct Cursor<'tu> {
    unit: &'tu dyn TranslationUnit,
    id: NodeId,
}

impl<'tu> Cursor<'tu> {
    pub fn new(unit: &'tu dyn TranslationUnit, id: NodeId) -> Self {
        Self { unit, id }
    }

    pub fn null(unit: &'tu dyn TranslationUnit) -> Self {
        Self::new(unit, NodeId::NULL)
    }

    pub fn unit(&self) -> &'tu dyn TranslationUnit {
        self.unit
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn is_null(&self) -> bool {
        self.id.is_null()
    }

    pub fn kind(&self) -> CursorKind {
        self.unit.kind(self.id)
    }

    /// Null cursors and the "no declaration" kinds
    pub fn is_invalid(&self) -> bool {
        self.is_null() || self.kind().is_invalid()
    }

    pub fn spelling(&self) -> String {
        self.unit.spelling(self.id)
    }

    fn with(&self, id: NodeId) -> Cursor<'tu> {
        Cursor::new(self.unit, id)
    }

    pub fn semantic_parent(&self) -> Cursor<'tu> {
        self.with(self.unit.semantic_parent(self.id))
    }

    pub fn lexical_parent(&self) -> Cursor<'tu> {
        self.with(self.unit.lexical_parent(self.id))
    }

    pub fn location(&self) -> Option<SourceLocation> {
        self.unit.location(self.id)
    }

    pub fn extent(&self) -> Option<SourceRange> {
        self.unit.extent(self.id)
    }

    pub fn cursor_type(&self) -> CxType {
        self.unit.cursor_type(self.id)
    }

    pub fn linkage(&self) -> Linkage {
        self.unit.linkage(self.id)
    }

    pub fn access(&self) -> AccessSpecifier {
        self.unit.access(self.id)
    }

    pub fn flags(&self) -> CursorFlags {
        self.unit.flags(self.id)
    }

    pub fn referenced(&self) -> Cursor<'tu> {
        self.with(self.unit.referenced(self.id))
    }

    pub fn canonical(&self) -> Cursor<'tu> {
        self.with(self.unit.canonical(self.id))
    }

    pub fn definition(&self) -> Cursor<'tu> {
        self.with(self.unit.definition(self.id))
    }

    pub fn included_file(&self) -> Option<PathBuf> {
        self.unit.included_file(self.id)
    }

    pub fn brief_comment(&self) -> Option<String> {
        self.unit.brief_comment(self.id)
    }

    /// Spellings of the tokens covering this cursor's extent
    pub fn tokens(&self) -> Vec<Token> {
        self.extent()
            .map(|range| self.unit.tokenize(&range))
            .unwrap_or_default()
    }
}

impl PartialEq for Cursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("spelling", &self.spelling())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_builder() {
        let request = ParseRequest::new("a.cpp")
            .with_args(["-std=c++14", "-Iinclude"])
            .with_unsaved(vec![UnsavedFile::new("a.cpp", "int x;")]);

        assert_eq!(request.file, PathBuf::from("a.cpp"));
        assert_eq!(request.args, vec!["-std=c++14", "-Iinclude"]);
        assert_eq!(request.unsaved.len(), 1);
        assert_eq!(request.max_include_depth, DEFAULT_INCLUDE_DEPTH);
    }

    #[test]
    fn test_unsaved_file_new() {
        let unsaved = UnsavedFile::new("x.hpp", "int y;");
        assert_eq!(unsaved.path, PathBuf::from("x.hpp"));
        assert_eq!(unsaved.contents, "int y;");
    }
}
