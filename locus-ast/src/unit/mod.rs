//! Tree-sitter backed translation unit
//!
//! A `CppTranslationUnit` is an arena of cursors built in source order by the
//! `Builder`, followed by one semantic pass (`lookup::resolve_scopes`) that
//! fills in semantic/lexical parents and the scope index. Types, references,
//! linkage and comments are computed lazily from the retained parse trees.

mod builder;
mod comments;
mod lookup;
pub mod sources;
mod types;

pub(crate) use builder::Builder;

use crate::adapters::node_text;
use crate::ir::{
    AccessSpecifier, CursorFlags, CursorKind, CxType, LanguageId, Linkage, NodeId,
    SourceLocation, SourceRange, Token, TokenKind,
};
use crate::provider::TranslationUnit;
use lookup::ScopeIndex;
use sources::normalize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tree_sitter::{Node, Tree};

/// Leaf-like node kinds that tokenize as a single token
const ATOMIC_TOKENS: &[&str] = &[
    "string_literal",
    "raw_string_literal",
    "char_literal",
    "number_literal",
    "system_lib_string",
];

// ============================================================================
// Sources
// ============================================================================

/// One parsed file of the translation unit (the main file or a header)
pub(crate) struct SourceFile {
    /// Logical path: as requested, or as resolved from the include search
    pub path: PathBuf,
    pub text: String,
    pub tree: Tree,
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(path: PathBuf, text: String, tree: Tree) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            path,
            text,
            tree,
            line_starts,
        }
    }

    /// 1-based line and byte column of an offset
    pub fn position(&self, offset: usize) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let start = self.line_starts.get(line).copied().unwrap_or(0);
        (line as u32 + 1, (offset.saturating_sub(start) + 1) as u32)
    }

    /// Offset of a 1-based position; columns past the line end clamp to it
    pub fn offset_of(&self, line: u32, column: u32) -> Option<usize> {
        if line == 0 || column == 0 {
            return None;
        }
        let start = *self.line_starts.get(line as usize - 1)?;
        let end = self
            .line_starts
            .get(line as usize)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        Some((start + column as usize - 1).min(end))
    }

    /// Re-find the tree-sitter node a cursor was built from
    pub fn node(&self, syntax: SyntaxRef) -> Option<Node<'_>> {
        let mut node = self
            .tree
            .root_node()
            .descendant_for_byte_range(syntax.start, syntax.end)?;
        loop {
            if node.start_byte() == syntax.start
                && node.end_byte() == syntax.end
                && node.kind() == syntax.kind
            {
                return Some(node);
            }
            node = node.parent()?;
            if node.start_byte() < syntax.start || node.end_byte() > syntax.end {
                return None;
            }
        }
    }

    pub fn text_of(&self, node: &Node) -> &str {
        node_text(node, &self.text)
    }
}

/// Position and kind of a tree-sitter node, stable for the tree's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SyntaxRef {
    pub start: usize,
    pub end: usize,
    pub kind: &'static str,
}

impl SyntaxRef {
    pub fn of(node: &Node) -> Self {
        Self {
            start: node.start_byte(),
            end: node.end_byte(),
            kind: node.kind(),
        }
    }
}

// ============================================================================
// Arena
// ============================================================================

/// Storage and function specifiers written on a declaration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Specifiers {
    pub is_static: bool,
    pub is_extern: bool,
    pub is_inline: bool,
    pub is_virtual: bool,
    pub is_constexpr: bool,
    pub is_const: bool,
    pub is_scoped_enum: bool,
}

pub(crate) struct NodeData {
    pub kind: CursorKind,
    pub file: usize,
    pub extent: (usize, usize),
    /// Offset reported as the cursor's location (the declared name when
    /// there is one)
    pub anchor: usize,
    pub spelling: String,
    pub syntax: SyntaxRef,
    /// The node carrying the declaration specifiers, when it differs from
    /// or contains `syntax`
    pub decl: Option<SyntaxRef>,
    pub parent: NodeId,
    pub children: Vec<NodeId>,
    pub semantic_parent: NodeId,
    pub lexical_parent: NodeId,
    /// Written scope of an out-of-line name (`C` in `void C::f()`)
    pub qualifier: Vec<String>,
    pub access: AccessSpecifier,
    pub flags: CursorFlags,
    pub specifiers: Specifiers,
    pub included: Option<PathBuf>,
}

impl NodeData {
    pub fn new(kind: CursorKind, file: usize, syntax: SyntaxRef, parent: NodeId) -> Self {
        Self {
            kind,
            file,
            extent: (syntax.start, syntax.end),
            anchor: syntax.start,
            spelling: String::new(),
            syntax,
            decl: None,
            parent,
            children: Vec::new(),
            semantic_parent: NodeId::NULL,
            lexical_parent: NodeId::NULL,
            qualifier: Vec::new(),
            access: AccessSpecifier::Invalid,
            flags: CursorFlags::default(),
            specifiers: Specifiers::default(),
            included: None,
        }
    }
}

/// Decrements the owning backend's live-unit count when the unit drops
pub(crate) struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    pub fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Translation unit built from tree-sitter parses of the main file and every
/// header reachable through `#include`
pub struct CppTranslationUnit {
    pub(crate) language: LanguageId,
    pub(crate) files: Vec<SourceFile>,
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) index: ScopeIndex,
    _guard: Option<LiveGuard>,
}

impl CppTranslationUnit {
    pub(crate) fn assemble(language: LanguageId, files: Vec<SourceFile>, nodes: Vec<NodeData>) -> Self {
        let mut unit = Self {
            language,
            files,
            nodes,
            index: ScopeIndex::default(),
            _guard: None,
        };
        unit.resolve_scopes();
        unit
    }

    pub(crate) fn with_guard(mut self, guard: LiveGuard) -> Self {
        self._guard = Some(guard);
        self
    }

    pub fn language(&self) -> LanguageId {
        self.language
    }

    /// Paths of every file that contributed cursors, main file first
    pub fn files(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.index())
    }

    pub(crate) fn kind_of(&self, id: NodeId) -> CursorKind {
        self.node(id).map_or(CursorKind::InvalidFile, |n| n.kind)
    }

    pub(crate) fn source(&self, id: NodeId) -> Option<&SourceFile> {
        self.node(id).and_then(|n| self.files.get(n.file))
    }

    /// The tree-sitter node a cursor was built from
    pub(crate) fn syntax(&self, id: NodeId) -> Option<Node<'_>> {
        let data = self.node(id)?;
        self.files.get(data.file)?.node(data.syntax)
    }

    /// The tree-sitter node holding the cursor's declaration specifiers
    pub(crate) fn decl_syntax(&self, id: NodeId) -> Option<Node<'_>> {
        let data = self.node(id)?;
        self.files.get(data.file)?.node(data.decl?)
    }

    pub(crate) fn file_index(&self, path: &Path) -> Option<usize> {
        let wanted = normalize(path);
        self.files
            .iter()
            .position(|f| f.path == path || normalize(&f.path) == wanted)
    }

    pub(crate) fn location_at(&self, file: usize, offset: usize) -> Option<SourceLocation> {
        let source = self.files.get(file)?;
        let (line, column) = source.position(offset);
        Some(SourceLocation {
            file: source.path.clone(),
            line,
            column,
            offset: offset as u32,
        })
    }

    fn collect_tokens(&self, file: usize, node: Node, start: usize, end: usize, out: &mut Vec<Token>) {
        let source = &self.files[file];
        if node.end_byte() <= start || node.start_byte() >= end {
            return;
        }
        if node.child_count() == 0 || ATOMIC_TOKENS.contains(&node.kind()) {
            let spelling = source.text_of(&node);
            if node.start_byte() < start || node.end_byte() > end || spelling.is_empty() {
                return;
            }
            let kind = match node.kind() {
                "comment" => TokenKind::Comment,
                k if ATOMIC_TOKENS.contains(&k) => TokenKind::Literal,
                "identifier" | "field_identifier" | "type_identifier" | "namespace_identifier"
                | "statement_identifier" => TokenKind::Identifier,
                "primitive_type" => TokenKind::Keyword,
                _ if !node.is_named() && spelling.chars().all(|c| c.is_alphanumeric() || c == '_') => {
                    TokenKind::Keyword
                }
                _ => TokenKind::Punctuation,
            };
            if let (Some(from), Some(to)) = (
                self.location_at(file, node.start_byte()),
                self.location_at(file, node.end_byte()),
            ) {
                out.push(Token {
                    kind,
                    spelling: spelling.to_string(),
                    range: SourceRange { start: from, end: to },
                });
            }
            return;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect_tokens(file, child, start, end, out);
        }
    }
}

impl TranslationUnit for CppTranslationUnit {
    fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    fn cursor_at(&self, file: &Path, line: u32, column: u32) -> Option<NodeId> {
        let index = self.file_index(file)?;
        let offset = self.files[index].offset_of(line, column)?;

        let mut best: Option<(usize, NodeId)> = None;
        for (i, data) in self.nodes.iter().enumerate().skip(1) {
            if data.file != index || offset < data.extent.0 || offset >= data.extent.1 {
                continue;
            }
            let width = data.extent.1 - data.extent.0;
            if best.map_or(true, |(w, _)| width <= w) {
                best = Some((width, NodeId::new(i)));
            }
        }
        Some(best.map_or(self.root(), |(_, id)| id))
    }

    fn kind(&self, node: NodeId) -> CursorKind {
        self.kind_of(node)
    }

    fn spelling(&self, node: NodeId) -> String {
        let Some(data) = self.node(node) else {
            return String::new();
        };
        match data.kind {
            CursorKind::TypeRef => {
                let target = self.referenced_of(node);
                if self.kind_of(target).is_type_declaration()
                    && self.kind_of(target) != CursorKind::TemplateTypeParameter
                {
                    self.qualified_name(target)
                } else {
                    data.spelling.clone()
                }
            }
            _ => data.spelling.clone(),
        }
    }

    fn semantic_parent(&self, node: NodeId) -> NodeId {
        self.node(node).map_or(NodeId::NULL, |n| n.semantic_parent)
    }

    fn lexical_parent(&self, node: NodeId) -> NodeId {
        self.node(node).map_or(NodeId::NULL, |n| n.lexical_parent)
    }

    fn location(&self, node: NodeId) -> Option<SourceLocation> {
        let data = self.node(node)?;
        if data.kind == CursorKind::TranslationUnit {
            return None;
        }
        self.location_at(data.file, data.anchor)
    }

    fn extent(&self, node: NodeId) -> Option<SourceRange> {
        let data = self.node(node)?;
        Some(SourceRange {
            start: self.location_at(data.file, data.extent.0)?,
            end: self.location_at(data.file, data.extent.1)?,
        })
    }

    fn tokenize(&self, range: &SourceRange) -> Vec<Token> {
        let Some(index) = self.file_index(&range.start.file) else {
            return Vec::new();
        };
        let mut tokens = Vec::new();
        self.collect_tokens(
            index,
            self.files[index].tree.root_node(),
            range.start.offset as usize,
            range.end.offset as usize,
            &mut tokens,
        );
        tokens
    }

    fn cursor_type(&self, node: NodeId) -> CxType {
        self.type_of(node)
    }

    fn linkage(&self, node: NodeId) -> Linkage {
        self.linkage_of(node)
    }

    fn access(&self, node: NodeId) -> AccessSpecifier {
        self.node(node).map_or(AccessSpecifier::Invalid, |n| n.access)
    }

    fn flags(&self, node: NodeId) -> CursorFlags {
        self.flags_of(node)
    }

    fn referenced(&self, node: NodeId) -> NodeId {
        self.referenced_of(node)
    }

    fn canonical(&self, node: NodeId) -> NodeId {
        self.canonical_of(node)
    }

    fn definition(&self, node: NodeId) -> NodeId {
        self.definition_of(node)
    }

    fn included_file(&self, node: NodeId) -> Option<PathBuf> {
        self.node(node).and_then(|n| n.included.clone())
    }

    fn brief_comment(&self, node: NodeId) -> Option<String> {
        self.brief_of(node)
    }

    fn canonical_type(&self, ty: &CxType) -> CxType {
        ty.canonical()
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::adapters::{CppTreeSitterAdapter, LanguageAdapter};
    use crate::provider::UnsavedFile;
    use sources::SourceLoader;

    /// Build a C++ unit from in-memory files; the first file is the main one
    pub(crate) fn unit_from(files: &[(&str, &str)], args: &[&str]) -> CppTranslationUnit {
        let unsaved: Vec<UnsavedFile> = files
            .iter()
            .map(|(path, text)| UnsavedFile::new(*path, *text))
            .collect();
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let loader = SourceLoader::new(&unsaved, &args);
        let parser = CppTreeSitterAdapter::new().parser().unwrap();
        Builder::new(&loader, parser, LanguageId::Cpp, 8)
            .build(Path::new(files[0].0))
            .unwrap()
    }

    pub(crate) fn unit(source: &str) -> CppTranslationUnit {
        unit_from(&[("main.cpp", source)], &[])
    }

    /// Cursor at the first occurrence of `needle` (1-based column of its
    /// first byte), searched in the main file
    pub(crate) fn at(unit: &CppTranslationUnit, needle: &str) -> NodeId {
        let text = &unit.files[0].text;
        let offset = text.find(needle).unwrap();
        let (line, column) = unit.files[0].position(offset);
        unit.cursor_at(&unit.files[0].path.clone(), line, column).unwrap()
    }

    // =========================================================================
    // SourceFile Tests
    // =========================================================================

    #[test]
    fn test_positions() {
        let u = unit("int a;\nint bb;\n");
        let file = &u.files[0];
        assert_eq!(file.position(0), (1, 1));
        assert_eq!(file.position(11), (2, 5));
        assert_eq!(file.offset_of(2, 5), Some(11));
        assert_eq!(file.offset_of(1, 99), Some(6));
        assert_eq!(file.offset_of(0, 1), None);
        assert_eq!(file.offset_of(9, 1), None);
    }

    // =========================================================================
    // Cursor Tests
    // =========================================================================

    #[test]
    fn test_root_cursor() {
        let u = unit("int x;");
        let root = u.root();
        assert_eq!(u.kind(root), CursorKind::TranslationUnit);
        assert_eq!(u.spelling(root), "main.cpp");
        assert!(u.location(root).is_none());
        assert!(u.semantic_parent(root).is_null());
    }

    #[test]
    fn test_cursor_at_prefers_smallest() {
        let u = unit("namespace ns {\nclass C {\n  void foo(int x);\n};\n}\n");
        let foo = at(&u, "foo");
        assert_eq!(u.kind(foo), CursorKind::CXXMethod);
        assert_eq!(u.spelling(foo), "foo");

        let x = at(&u, "x)");
        assert_eq!(u.kind(x), CursorKind::ParmDecl);
    }

    #[test]
    fn test_cursor_outside_any_node_is_root() {
        let u = unit("int x;\n\n\n");
        let root = u.cursor_at(Path::new("main.cpp"), 3, 1).unwrap();
        assert_eq!(root, u.root());
        assert!(u.cursor_at(Path::new("other.cpp"), 1, 1).is_none());
        assert!(u.cursor_at(Path::new("main.cpp"), 1, 0).is_none());
    }

    #[test]
    fn test_location_and_extent() {
        let u = unit("int  value = 3;");
        let var = at(&u, "value");
        let loc = u.location(var).unwrap();
        assert_eq!((loc.line, loc.column, loc.offset), (1, 6, 5));
        let extent = u.extent(var).unwrap();
        assert_eq!(extent.start.column, 1);
        assert_eq!(extent.end.column, 15);
    }

    #[test]
    fn test_tokenize_literal_first() {
        let u = unit("int a = 42;\nconst char *s = \"hi there\";");
        let lit = at(&u, "42");
        assert_eq!(u.kind(lit), CursorKind::IntegerLiteral);
        let tokens = u.tokenize(&u.extent(lit).unwrap());
        assert_eq!(tokens[0].spelling, "42");
        assert_eq!(tokens[0].kind, TokenKind::Literal);

        let s = at(&u, "\"hi");
        let tokens = u.tokenize(&u.extent(s).unwrap());
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].spelling, "\"hi there\"");
    }

    #[test]
    fn test_live_guard_counts() {
        let counter = Arc::new(AtomicUsize::new(0));
        let guard = LiveGuard::new(counter.clone());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        drop(guard);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
