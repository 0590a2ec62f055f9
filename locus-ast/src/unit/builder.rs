//! Cursor arena construction
//!
//! Walks the tree-sitter parse of the main file, inlining every reachable
//! `#include` at its directive, and records one `NodeData` per libclang-style
//! cursor. Tree-sitter nodes with no cursor counterpart (ERROR nodes,
//! punctuation, expression statements, linkage blocks) are transparent: their
//! children attach to the nearest enclosing cursor. The one exception is an
//! ERROR node holding the head of an unclosed function definition.

use super::sources::{normalize, SourceLoader};
use super::{CppTranslationUnit, NodeData, SourceFile, Specifiers, SyntaxRef};
use crate::adapters::{find_child_by_kind, has_token, is_field, node_text};
use crate::error::{AstError, Result};
use crate::ir::{AccessSpecifier, CursorKind, LanguageId, NodeId};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

const TYPE_PARAMETER_KINDS: &[&str] = &[
    "type_parameter_declaration",
    "optional_type_parameter_declaration",
    "variadic_type_parameter_declaration",
    "template_template_parameter_declaration",
];

const CAST_NAMES: &[&str] = &["static_cast", "dynamic_cast", "reinterpret_cast", "const_cast"];

/// Per-file state while walking one parse tree
struct FileCtx<'s> {
    index: usize,
    text: &'s str,
    depth: usize,
}

/// Name of a declarator-based declaration
struct DeclName {
    anchor: Option<usize>,
    spelling: String,
    qualifier: Vec<String>,
    kind: CursorKind,
}

pub(crate) struct Builder<'a> {
    loader: &'a SourceLoader<'a>,
    parser: Parser,
    language: LanguageId,
    max_depth: usize,
    files: Vec<SourceFile>,
    nodes: Vec<NodeData>,
    seen: HashSet<PathBuf>,
    access: Vec<AccessSpecifier>,
}

impl<'a> Builder<'a> {
    pub fn new(
        loader: &'a SourceLoader<'a>,
        parser: Parser,
        language: LanguageId,
        max_depth: usize,
    ) -> Self {
        Self {
            loader,
            parser,
            language,
            max_depth,
            files: Vec::new(),
            nodes: Vec::new(),
            seen: HashSet::new(),
            access: Vec::new(),
        }
    }

    pub fn build(mut self, main: &Path) -> Result<CppTranslationUnit> {
        let text = self.loader.read(main)?;
        let tree = self.parse_text(&text)?;
        let len = text.len();
        self.seen.insert(normalize(main));
        self.files
            .push(SourceFile::new(main.to_path_buf(), text, tree));

        let mut root = NodeData::new(
            CursorKind::TranslationUnit,
            0,
            SyntaxRef {
                start: 0,
                end: len,
                kind: "translation_unit",
            },
            NodeId::NULL,
        );
        root.spelling = main.display().to_string();
        self.nodes.push(root);

        self.build_file(0, NodeId::new(0), 0);
        tracing::debug!(
            file = %main.display(),
            files = self.files.len(),
            cursors = self.nodes.len(),
            "built translation unit"
        );
        Ok(CppTranslationUnit::assemble(
            self.language,
            self.files,
            self.nodes,
        ))
    }

    fn parse_text(&mut self, text: &str) -> Result<Tree> {
        self.parser
            .parse(text, None)
            .ok_or_else(|| AstError::parse_error("tree-sitter produced no tree"))
    }

    fn build_file(&mut self, index: usize, parent: NodeId, depth: usize) {
        let tree = self.files[index].tree.clone();
        let text = self.files[index].text.clone();
        let ctx = FileCtx {
            index,
            text: &text,
            depth,
        };
        self.visit_children(&ctx, tree.root_node(), parent);
    }

    // ========================================================================
    // Arena helpers
    // ========================================================================

    fn add(&mut self, ctx: &FileCtx, kind: CursorKind, node: Node, parent: NodeId) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        let mut data = NodeData::new(kind, ctx.index, SyntaxRef::of(&node), parent);
        if let Some(owner) = self.nodes.get_mut(parent.index()) {
            owner.children.push(id);
            if kind.is_declaration() && owner.kind.is_class() {
                data.access = self.access.last().copied().unwrap_or_default();
            }
        }
        self.nodes.push(data);
        id
    }

    fn data(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    fn is_block(&self, parent: NodeId) -> bool {
        self.nodes.get(parent.index()).is_some_and(|n| {
            n.kind.is_statement() || n.kind.is_function() || n.kind == CursorKind::LambdaExpr
        })
    }

    fn visit_children(&mut self, ctx: &FileCtx, node: Node, parent: NodeId) {
        for child in children(&node) {
            self.visit(ctx, child, parent);
        }
    }

    fn visit_children_except(&mut self, ctx: &FileCtx, node: Node, parent: NodeId, skip: &[usize]) {
        for child in children(&node) {
            if !skip.contains(&child.id()) {
                self.visit(ctx, child, parent);
            }
        }
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    fn visit(&mut self, ctx: &FileCtx, node: Node, parent: NodeId) {
        match node.kind() {
            "comment" | "attribute_declaration" | "attribute_specifier" | "preproc_call"
            | "preproc_undef" | "concept_definition" => {}
            "preproc_include" => self.include(ctx, node, parent),
            "preproc_def" | "preproc_function_def" => self.macro_definition(ctx, node, parent),
            "preproc_if" | "preproc_elif" => {
                let skip: Vec<usize> = node.child_by_field_name("condition").map(|c| c.id()).into_iter().collect();
                self.visit_children_except(ctx, node, parent, &skip);
            }
            "namespace_definition" => self.namespace(ctx, node, parent),
            "namespace_alias_definition" => self.namespace_alias(ctx, node, parent),
            "using_declaration" => self.using(ctx, node, parent),
            "alias_declaration" => self.alias(ctx, node, parent, None),
            "class_specifier" | "struct_specifier" | "union_specifier" => {
                self.record(ctx, node, parent, None)
            }
            "enum_specifier" => self.enumeration(ctx, node, parent),
            "enumerator" => self.enumerator(ctx, node, parent),
            "template_declaration" => self.template(ctx, node, parent),
            "function_definition" => self.function_definition(ctx, node, parent, None),
            "ERROR" => self.recover_function(ctx, node, parent),
            "declaration" | "field_declaration" | "type_definition" => {
                self.declaration(ctx, node, parent, None)
            }
            "field_declaration_list" => {
                let default = match node.parent().map(|p| p.kind()) {
                    Some("class_specifier") => AccessSpecifier::Private,
                    _ => AccessSpecifier::Public,
                };
                self.access.push(default);
                self.visit_children(ctx, node, parent);
                self.access.pop();
            }
            "access_specifier" => self.access_specifier(ctx, node, parent),
            "base_class_clause" => self.base_classes(ctx, node, parent),
            "friend_declaration" => {
                let id = self.add(ctx, CursorKind::FriendDecl, node, parent);
                self.data(id).extent.1 = trim_semicolon(&node);
                self.visit_children(ctx, node, id);
            }
            "static_assert_declaration" => {
                let id = self.add(ctx, CursorKind::StaticAssert, node, parent);
                self.data(id).extent.1 = trim_semicolon(&node);
                self.visit_children(ctx, node, id);
            }
            "parameter_declaration"
            | "optional_parameter_declaration"
            | "variadic_parameter_declaration" => self.parameter(ctx, node, parent),
            k if TYPE_PARAMETER_KINDS.contains(&k) => self.type_parameter(ctx, node, parent),
            "type_identifier" => self.type_reference(ctx, node, parent),
            "namespace_identifier" => self.namespace_reference(ctx, node, parent),
            "field_identifier" => {
                if node.parent().is_some_and(|p| p.kind() == "field_initializer") {
                    let id = self.add(ctx, CursorKind::MemberRef, node, parent);
                    self.data(id).spelling = node_text(&node, ctx.text).to_string();
                }
            }
            "identifier" | "qualified_identifier" | "template_function" => {
                if is_expression_position(&node) {
                    self.decl_ref(ctx, node, parent);
                } else {
                    self.visit_children(ctx, node, parent);
                }
            }
            "virtual_specifier" => {
                let kind = if node_text(&node, ctx.text) == "final" {
                    CursorKind::CXXFinalAttr
                } else {
                    CursorKind::CXXOverrideAttr
                };
                self.add(ctx, kind, node, parent);
            }
            "lambda_expression" => {
                let id = self.add(ctx, CursorKind::LambdaExpr, node, parent);
                self.visit_children(ctx, node, id);
            }
            "call_expression" => self.call(ctx, node, parent),
            "field_expression" => {
                let id = self.add(ctx, CursorKind::MemberRefExpr, node, parent);
                if let Some(field) = node.child_by_field_name("field") {
                    let data = self.data(id);
                    data.spelling = last_component(&field, ctx.text);
                    data.anchor = field.start_byte();
                }
                let skip: Vec<usize> = node.child_by_field_name("field").map(|f| f.id()).into_iter().collect();
                self.visit_children_except(ctx, node, id, &skip);
            }
            "for_range_loop" => self.range_for(ctx, node, parent),
            "expression_statement" => {
                if node.named_child_count() == 0 {
                    self.add(ctx, CursorKind::NullStmt, node, parent);
                } else {
                    self.visit_children(ctx, node, parent);
                }
            }
            "parenthesized_expression" => {
                let in_condition = node.parent().is_some_and(|p| {
                    matches!(
                        p.kind(),
                        "if_statement" | "while_statement" | "switch_statement" | "do_statement"
                    )
                });
                if in_condition {
                    self.visit_children(ctx, node, parent);
                } else {
                    let id = self.add(ctx, CursorKind::ParenExpr, node, parent);
                    self.visit_children(ctx, node, id);
                }
            }
            "number_literal" | "string_literal" | "raw_string_literal" | "concatenated_string"
            | "char_literal" | "true" | "false" | "null" | "nullptr" | "this" => {
                let kind = literal_kind(node.kind(), node_text(&node, ctx.text));
                self.add(ctx, kind, node, parent);
            }
            kind => {
                if let Some(cursor) = statement_kind(kind, &node, ctx.text) {
                    let id = self.add(ctx, cursor, node, parent);
                    if matches!(
                        cursor,
                        CursorKind::ReturnStmt
                            | CursorKind::BreakStmt
                            | CursorKind::ContinueStmt
                            | CursorKind::GotoStmt
                            | CursorKind::DoStmt
                            | CursorKind::CXXThrowExpr
                    ) {
                        self.data(id).extent.1 = trim_semicolon(&node);
                    }
                    if cursor == CursorKind::LabelStmt {
                        if let Some(label) = node.child_by_field_name("label") {
                            self.data(id).spelling = node_text(&label, ctx.text).to_string();
                            self.data(id).anchor = label.start_byte();
                        }
                    }
                    self.visit_children(ctx, node, id);
                } else if let Some(cursor) = expression_kind(kind, &node, ctx.text) {
                    let id = self.add(ctx, cursor, node, parent);
                    if let Some(op) = node.child_by_field_name("operator") {
                        self.data(id).anchor = op.start_byte();
                    }
                    self.visit_children(ctx, node, id);
                } else {
                    self.visit_children(ctx, node, parent);
                }
            }
        }
    }

    // ========================================================================
    // Preprocessor
    // ========================================================================

    fn include(&mut self, ctx: &FileCtx, node: Node, parent: NodeId) {
        let id = self.add(ctx, CursorKind::InclusionDirective, node, parent);
        let Some(path) = node.child_by_field_name("path") else {
            return;
        };
        let raw = node_text(&path, ctx.text);
        let angled = path.kind() == "system_lib_string";
        let spelled = raw
            .trim()
            .trim_start_matches(['"', '<'])
            .trim_end_matches(['"', '>'])
            .to_string();
        {
            let data = self.data(id);
            data.extent.1 = path.end_byte();
            data.spelling = spelled.clone();
        }
        if path.kind() != "string_literal" && !angled {
            return;
        }

        let includer = self.files[ctx.index].path.clone();
        let Some(resolved) = self.loader.resolve_include(&spelled, angled, &includer) else {
            tracing::debug!(include = %spelled, "include not found");
            return;
        };
        self.data(id).included = Some(resolved.clone());

        if ctx.depth >= self.max_depth || !self.seen.insert(normalize(&resolved)) {
            return;
        }
        let text = match self.loader.read(&resolved) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(include = %resolved.display(), error = %e, "skipping unreadable include");
                return;
            }
        };
        let Ok(tree) = self.parse_text(&text) else {
            return;
        };
        self.files.push(SourceFile::new(resolved, text, tree));
        let index = self.files.len() - 1;
        self.build_file(index, parent, ctx.depth + 1);
    }

    fn macro_definition(&mut self, ctx: &FileCtx, node: Node, parent: NodeId) {
        let id = self.add(ctx, CursorKind::MacroDefinition, node, parent);
        let end = node.start_byte() + node_text(&node, ctx.text).trim_end().len();
        let data = self.data(id);
        data.extent.1 = end;
        if let Some(name) = node.child_by_field_name("name") {
            data.spelling = node_text(&name, ctx.text).to_string();
            data.anchor = name.start_byte();
        }
    }

    // ========================================================================
    // Scopes and types
    // ========================================================================

    fn namespace(&mut self, ctx: &FileCtx, node: Node, parent: NodeId) {
        let id = self.add(ctx, CursorKind::Namespace, node, parent);
        if let Some(name) = node.child_by_field_name("name") {
            let data = self.data(id);
            data.spelling = node_text(&name, ctx.text).to_string();
            data.anchor = name.start_byte();
        }
        self.data(id).specifiers.is_inline = has_token(&node, ctx.text, "inline");
        self.data(id).flags.is_definition = true;
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_children(ctx, body, id);
        }
    }

    fn namespace_alias(&mut self, ctx: &FileCtx, node: Node, parent: NodeId) {
        let id = self.add(ctx, CursorKind::NamespaceAlias, node, parent);
        let name = node.child_by_field_name("name");
        if let Some(name) = name {
            let data = self.data(id);
            data.spelling = node_text(&name, ctx.text).to_string();
            data.anchor = name.start_byte();
        }
        let data = self.data(id);
        data.extent.1 = trim_semicolon(&node);
        data.flags.is_definition = true;
        let target = named_children(&node)
            .into_iter()
            .filter(|c| name.map_or(true, |n| n.id() != c.id()))
            .last();
        if let Some(target) = target {
            self.namespace_target(ctx, target, id);
        }
    }

    /// `NamespaceRef` for the namespace named by a directive or alias
    fn namespace_target(&mut self, ctx: &FileCtx, target: Node, parent: NodeId) {
        let id = self.add(ctx, CursorKind::NamespaceRef, target, parent);
        let last = final_name(&target);
        let data = self.data(id);
        data.spelling = node_text(&last, ctx.text).to_string();
        data.anchor = last.start_byte();
    }

    fn using(&mut self, ctx: &FileCtx, node: Node, parent: NodeId) {
        let directive = has_token(&node, ctx.text, "namespace");
        let kind = if directive {
            CursorKind::UsingDirective
        } else {
            CursorKind::UsingDeclaration
        };
        let id = self.add(ctx, kind, node, parent);
        self.data(id).extent.1 = trim_semicolon(&node);
        let Some(target) = named_children(&node).into_iter().last() else {
            return;
        };
        if directive {
            self.data(id).anchor = target.start_byte();
            self.namespace_target(ctx, target, id);
        } else {
            let last = final_name(&target);
            let data = self.data(id);
            data.spelling = node_text(&last, ctx.text).to_string();
            data.anchor = last.start_byte();
            self.visit_children(ctx, target, id);
        }
    }

    fn alias(&mut self, ctx: &FileCtx, node: Node, parent: NodeId, template: Option<Node>) {
        let kind = if template.is_some() {
            CursorKind::TypeAliasTemplateDecl
        } else {
            CursorKind::TypeAliasDecl
        };
        let id = self.add(ctx, kind, node, parent);
        let name = node.child_by_field_name("name");
        {
            let data = self.data(id);
            data.extent.1 = trim_semicolon(&node);
            data.flags.is_definition = true;
            data.decl = Some(SyntaxRef::of(&node));
            if let Some(name) = name {
                data.spelling = node_text(&name, ctx.text).to_string();
                data.anchor = name.start_byte();
            }
            if let Some(t) = template {
                data.extent.0 = t.start_byte();
            }
        }
        if let Some(t) = template {
            self.template_parameters(ctx, t, id);
        }
        let skip: Vec<usize> = name.map(|n| n.id()).into_iter().collect();
        self.visit_children_except(ctx, node, id, &skip);
    }

    fn record(&mut self, ctx: &FileCtx, node: Node, parent: NodeId, template: Option<Node>) {
        if !is_tag_declaration(&node) {
            self.visit_children(ctx, node, parent);
            return;
        }
        let name = node.child_by_field_name("name");
        let mut kind = match node.kind() {
            "class_specifier" => CursorKind::ClassDecl,
            "union_specifier" => CursorKind::UnionDecl,
            _ => CursorKind::StructDecl,
        };
        if let Some(t) = template {
            if has_template_parameters(&t) {
                kind = if name.is_some_and(|n| n.kind() == "template_type") {
                    CursorKind::ClassTemplatePartialSpecialization
                } else {
                    CursorKind::ClassTemplate
                };
            }
        }

        let id = self.add(ctx, kind, node, parent);
        {
            let has_body = node.child_by_field_name("body").is_some();
            let data = self.data(id);
            data.flags.is_definition = has_body;
            if let Some(t) = template {
                data.extent.0 = t.start_byte();
            }
        }
        if let Some(name) = name {
            let mut path = Vec::new();
            flatten_name(&name, ctx.text, &mut path);
            let last = final_name(&name);
            let data = self.data(id);
            data.spelling = path.pop().unwrap_or_default();
            data.qualifier = path;
            data.anchor = last.start_byte();
        }
        if let Some(t) = template {
            self.template_parameters(ctx, t, id);
        }
        let skip: Vec<usize> = match name {
            Some(n) if n.kind() == "template_type" => {
                // keep the specialization arguments, drop the name itself
                if let Some(args) = n.child_by_field_name("arguments") {
                    self.visit_children(ctx, args, id);
                }
                vec![n.id()]
            }
            Some(n) => vec![n.id()],
            None => Vec::new(),
        };
        self.visit_children_except(ctx, node, id, &skip);
    }

    fn enumeration(&mut self, ctx: &FileCtx, node: Node, parent: NodeId) {
        if !is_tag_declaration(&node) {
            self.visit_children(ctx, node, parent);
            return;
        }
        let id = self.add(ctx, CursorKind::EnumDecl, node, parent);
        let name = node.child_by_field_name("name");
        {
            let scoped = has_token(&node, ctx.text, "class") || has_token(&node, ctx.text, "struct");
            let has_body = node.child_by_field_name("body").is_some();
            let data = self.data(id);
            data.specifiers.is_scoped_enum = scoped;
            data.flags.is_definition = has_body;
            if let Some(name) = name {
                data.spelling = node_text(&name, ctx.text).to_string();
                data.anchor = name.start_byte();
            }
        }
        let skip: Vec<usize> = name.map(|n| n.id()).into_iter().collect();
        self.visit_children_except(ctx, node, id, &skip);
    }

    fn enumerator(&mut self, ctx: &FileCtx, node: Node, parent: NodeId) {
        let id = self.add(ctx, CursorKind::EnumConstantDecl, node, parent);
        let name = node.child_by_field_name("name");
        {
            let data = self.data(id);
            data.flags.is_definition = true;
            if let Some(name) = name {
                data.spelling = node_text(&name, ctx.text).to_string();
                data.anchor = name.start_byte();
            }
        }
        if let Some(value) = node.child_by_field_name("value") {
            self.visit(ctx, value, id);
        }
    }

    fn access_specifier(&mut self, ctx: &FileCtx, node: Node, parent: NodeId) {
        if node.parent().is_some_and(|p| p.kind() == "base_class_clause") {
            return;
        }
        let access = AccessSpecifier::from_keyword(node_text(&node, ctx.text));
        if let Some(top) = self.access.last_mut() {
            *top = access;
        }
        let id = self.add(ctx, CursorKind::CXXAccessSpecifier, node, parent);
        let colon = node
            .next_sibling()
            .filter(|s| node_text(s, ctx.text) == ":")
            .map(|s| s.end_byte());
        let data = self.data(id);
        data.access = access;
        if let Some(end) = colon {
            data.extent.1 = end;
        }
    }

    fn base_classes(&mut self, ctx: &FileCtx, node: Node, parent: NodeId) {
        let default = match self.nodes.get(parent.index()).map(|n| n.kind) {
            Some(CursorKind::StructDecl) | Some(CursorKind::UnionDecl) => AccessSpecifier::Public,
            _ => AccessSpecifier::Private,
        };
        let mut access = default;
        for child in children(&node) {
            match child.kind() {
                "access_specifier" => access = AccessSpecifier::from_keyword(node_text(&child, ctx.text)),
                "type_identifier" | "qualified_identifier" | "template_type" => {
                    let id = self.add(ctx, CursorKind::CXXBaseSpecifier, child, parent);
                    let data = self.data(id);
                    data.spelling = collapse_whitespace(node_text(&child, ctx.text));
                    data.access = access;
                    self.visit(ctx, child, id);
                    access = default;
                }
                _ => {}
            }
        }
    }

    // ========================================================================
    // Templates
    // ========================================================================

    fn template(&mut self, ctx: &FileCtx, node: Node, parent: NodeId) {
        let inner = named_children(&node)
            .into_iter()
            .find(|c| c.kind() != "template_parameter_list" && c.kind() != "comment");
        let Some(inner) = inner else {
            return;
        };
        match inner.kind() {
            "class_specifier" | "struct_specifier" | "union_specifier" => {
                self.record(ctx, inner, parent, Some(node))
            }
            "function_definition" => self.function_definition(ctx, inner, parent, Some(node)),
            "declaration" | "field_declaration" => self.declaration(ctx, inner, parent, Some(node)),
            "alias_declaration" => self.alias(ctx, inner, parent, Some(node)),
            _ => self.visit_children(ctx, node, parent),
        }
    }

    fn template_parameters(&mut self, ctx: &FileCtx, template: Node, owner: NodeId) {
        if let Some(params) = template.child_by_field_name("parameters") {
            self.visit_children(ctx, params, owner);
        }
    }

    fn type_parameter(&mut self, ctx: &FileCtx, node: Node, parent: NodeId) {
        let id = self.add(ctx, CursorKind::TemplateTypeParameter, node, parent);
        let name = node
            .child_by_field_name("name")
            .or_else(|| find_child_by_kind(&node, "type_identifier"));
        {
            let data = self.data(id);
            data.flags.is_definition = true;
            if let Some(name) = name {
                data.spelling = node_text(&name, ctx.text).to_string();
                data.anchor = name.start_byte();
            }
        }
        let skip: Vec<usize> = name.map(|n| n.id()).into_iter().collect();
        self.visit_children_except(ctx, node, id, &skip);
    }

    // ========================================================================
    // Functions
    // ========================================================================

    fn function_name(&self, ctx: &FileCtx, declarator: Node, parent: NodeId) -> DeclName {
        let in_class = self
            .nodes
            .get(parent.index())
            .filter(|n| n.kind.is_class());

        if declarator.kind() == "operator_cast" {
            return DeclName {
                anchor: Some(declarator.start_byte()),
                spelling: conversion_spelling(&declarator, ctx.text),
                qualifier: Vec::new(),
                kind: CursorKind::ConversionFunction,
            };
        }

        let Some(name) = declarator.child_by_field_name("declarator") else {
            return DeclName {
                anchor: None,
                spelling: String::new(),
                qualifier: Vec::new(),
                kind: CursorKind::FunctionDecl,
            };
        };
        let mut path = Vec::new();
        flatten_name(&name, ctx.text, &mut path);
        let last = final_name(&name);
        let mut spelling = path.pop().unwrap_or_default();
        let qualifier = path;

        let kind = match last.kind() {
            "destructor_name" => {
                spelling.retain(|c| !c.is_whitespace());
                CursorKind::Destructor
            }
            "operator_cast" => {
                spelling = conversion_spelling(&last, ctx.text);
                CursorKind::ConversionFunction
            }
            "operator_name" => {
                spelling = operator_spelling(&spelling);
                if in_class.is_some() {
                    CursorKind::CXXMethod
                } else {
                    CursorKind::FunctionDecl
                }
            }
            _ => {
                if qualifier.last().is_some_and(|scope| *scope == spelling) {
                    CursorKind::Constructor
                } else if let Some(class) = in_class {
                    if class.spelling == spelling {
                        CursorKind::Constructor
                    } else {
                        CursorKind::CXXMethod
                    }
                } else {
                    CursorKind::FunctionDecl
                }
            }
        };

        DeclName {
            anchor: Some(last.start_byte()),
            spelling,
            qualifier,
            kind,
        }
    }

    fn function_definition(&mut self, ctx: &FileCtx, node: Node, parent: NodeId, template: Option<Node>) {
        let declarator = node.child_by_field_name("declarator");
        let fdecl = declarator.and_then(|d| {
            if d.kind() == "operator_cast" {
                Some(d)
            } else {
                function_declarator_of(d)
            }
        });
        let Some(fdecl) = fdecl else {
            self.visit_children(ctx, node, parent);
            return;
        };

        let name = self.function_name(ctx, fdecl, parent);
        let kind = match template {
            Some(t) if has_template_parameters(&t) => CursorKind::FunctionTemplate,
            _ => name.kind,
        };
        let specifiers = Specifiers::read(&node, ctx.text);
        let id = self.add(ctx, kind, node, parent);
        {
            let data = self.data(id);
            data.spelling = name.spelling;
            data.qualifier = name.qualifier;
            data.anchor = name.anchor.unwrap_or(node.start_byte());
            data.decl = Some(SyntaxRef::of(&node));
            data.specifiers = specifiers;
            data.flags.is_definition = true;
            data.flags.is_variadic = is_variadic(&fdecl, ctx.text);
            data.flags.is_virtual = specifiers.is_virtual || has_virtual_specifier(&fdecl);
            data.flags.is_static_method = specifiers.is_static && name.kind == CursorKind::CXXMethod;
            if let Some(t) = template {
                data.extent.0 = t.start_byte();
            }
        }
        if let Some(t) = template {
            self.template_parameters(ctx, t, id);
        }
        self.visit_children(ctx, node, id);
    }

    /// An ERROR node that still reads `specifiers declarator {` is a function
    /// whose body never closed. The function is rebuilt over the rest of the
    /// ERROR node so the statements after the brace keep it as their scope.
    fn recover_function(&mut self, ctx: &FileCtx, node: Node, parent: NodeId) {
        let all = children(&node);
        let head = all.iter().enumerate().find_map(|(i, child)| {
            let fdecl = function_declarator_of(*child)?;
            (i > 0 && all.get(i + 1)?.kind() == "{").then_some((i, fdecl))
        });
        let Some((at, fdecl)) = head else {
            self.visit_children(ctx, node, parent);
            return;
        };
        let first = (0..at)
            .rev()
            .take_while(|&i| is_specifier_kind(all[i].kind()))
            .last();
        let Some(first) = first else {
            self.visit_children(ctx, node, parent);
            return;
        };

        for child in &all[..first] {
            self.visit(ctx, *child, parent);
        }
        let declarator = all[at];
        let name = self.function_name(ctx, fdecl, parent);
        let id = self.add(ctx, name.kind, declarator, parent);
        {
            let data = self.data(id);
            data.spelling = name.spelling;
            data.qualifier = name.qualifier;
            data.anchor = name.anchor.unwrap_or(declarator.start_byte());
            data.extent = (all[first].start_byte(), node.end_byte());
            data.decl = Some(SyntaxRef::of(&node));
            data.flags.is_definition = true;
            data.flags.is_variadic = is_variadic(&fdecl, ctx.text);
        }
        tracing::trace!(function = %self.nodes[id.index()].spelling, "recovered function from ERROR node");
        for child in &all[first..] {
            self.visit(ctx, *child, id);
        }
    }

    // ========================================================================
    // Declarations with declarators
    // ========================================================================

    fn declaration(&mut self, ctx: &FileCtx, node: Node, parent: NodeId, template: Option<Node>) {
        let declarators = children_by_field(&node, "declarator");
        let type_node = node.child_by_field_name("type");

        if declarators.is_empty() {
            match (template, type_node) {
                (Some(t), Some(ty)) if is_record_kind(ty.kind()) => {
                    self.record(ctx, ty, parent, Some(t))
                }
                _ => self.visit_children(ctx, node, parent),
            }
            return;
        }

        let owner = if node.kind() == "declaration" && self.is_block(parent) {
            self.add(ctx, CursorKind::DeclStmt, node, parent)
        } else {
            parent
        };
        let type_defines = type_node.is_some_and(|t| is_tag_declaration(&t));
        if let (true, Some(ty)) = (type_defines, type_node) {
            self.visit(ctx, ty, owner);
        }

        let specifiers = Specifiers::read(&node, ctx.text);
        let in_class = node.kind() == "field_declaration";
        let count = declarators.len();
        for (i, d) in declarators.into_iter().enumerate() {
            let (id, visit_target) = if node.kind() == "type_definition" {
                (self.typedef_decl(ctx, node, d, owner), d)
            } else if let Some(f) = function_declarator_of(d) {
                (self.function_decl(ctx, node, d, f, owner, template, specifiers), f)
            } else {
                let last = i + 1 == count;
                (self.variable_decl(ctx, node, d, owner, in_class, specifiers, last), d)
            };
            let attach = if id.is_null() { owner } else { id };

            if i == 0 {
                if let Some(t) = template {
                    self.template_parameters(ctx, t, attach);
                }
                if let (false, Some(ty)) = (type_defines, type_node) {
                    self.visit(ctx, ty, attach);
                }
            }
            // parameters, bounds and initialisers; the declared name itself
            // is never in expression position
            if !id.is_null() {
                self.visit_children(ctx, visit_target, id);
            }
        }
    }

    fn typedef_decl(&mut self, ctx: &FileCtx, node: Node, d: Node, owner: NodeId) -> NodeId {
        let id = self.add(ctx, CursorKind::TypedefDecl, d, owner);
        let name = declarator_name(&d);
        let data = self.data(id);
        data.extent = (node.start_byte(), d.end_byte());
        data.decl = Some(SyntaxRef::of(&node));
        data.flags.is_definition = true;
        if let Some(name) = name {
            data.spelling = node_text(&name, ctx.text).to_string();
            data.anchor = name.start_byte();
        }
        id
    }

    #[allow(clippy::too_many_arguments)]
    fn function_decl(
        &mut self,
        ctx: &FileCtx,
        node: Node,
        d: Node,
        fdecl: Node,
        owner: NodeId,
        template: Option<Node>,
        specifiers: Specifiers,
    ) -> NodeId {
        let name = self.function_name(ctx, fdecl, owner);
        let kind = match template {
            Some(t) if has_template_parameters(&t) => CursorKind::FunctionTemplate,
            _ => name.kind,
        };
        let tail: String = ctx
            .text
            .get(d.end_byte()..node.end_byte())
            .unwrap_or("")
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let id = self.add(ctx, kind, d, owner);
        let data = self.data(id);
        data.spelling = name.spelling;
        data.qualifier = name.qualifier;
        data.anchor = name.anchor.unwrap_or(d.start_byte());
        data.extent = (template.map_or(node.start_byte(), |t| t.start_byte()), d.end_byte());
        data.decl = Some(SyntaxRef::of(&node));
        data.specifiers = specifiers;
        data.flags.is_variadic = is_variadic(&fdecl, ctx.text);
        data.flags.is_pure_virtual = tail.starts_with("=0");
        data.flags.is_virtual =
            specifiers.is_virtual || has_virtual_specifier(&fdecl) || data.flags.is_pure_virtual;
        data.flags.is_static_method = specifiers.is_static && name.kind == CursorKind::CXXMethod;
        data.flags.is_definition = tail.starts_with("=default") || tail.starts_with("=delete");
        id
    }

    #[allow(clippy::too_many_arguments)]
    fn variable_decl(
        &mut self,
        ctx: &FileCtx,
        node: Node,
        d: Node,
        owner: NodeId,
        in_class: bool,
        specifiers: Specifiers,
        last: bool,
    ) -> NodeId {
        let Some(name) = declarator_name(&d) else {
            self.visit_children(ctx, d, owner);
            return NodeId::NULL;
        };
        let kind = if in_class && !specifiers.is_static {
            CursorKind::FieldDecl
        } else {
            CursorKind::VarDecl
        };
        let default_value = if in_class && last {
            node.child_by_field_name("default_value")
                .or_else(|| find_child_by_kind(&node, "bitfield_clause"))
        } else {
            None
        };

        let mut path = Vec::new();
        flatten_name(&name, ctx.text, &mut path);
        let anchor = final_name(&name).start_byte();
        let id = self.add(ctx, kind, d, owner);
        {
            let data = self.data(id);
            data.spelling = path.pop().unwrap_or_default();
            data.qualifier = path;
            data.anchor = anchor;
            data.extent = (
                node.start_byte(),
                default_value.map_or(d.end_byte(), |v| v.end_byte()),
            );
            data.decl = Some(SyntaxRef::of(&node));
            data.specifiers = specifiers;
            let initialised = d.kind() == "init_declarator" || default_value.is_some();
            data.flags.is_definition = match kind {
                CursorKind::FieldDecl => true,
                _ if in_class => initialised || specifiers.is_inline || specifiers.is_constexpr,
                _ => !(specifiers.is_extern && !initialised),
            };
        }
        if let Some(value) = default_value {
            self.visit(ctx, value, id);
        }
        id
    }

    fn parameter(&mut self, ctx: &FileCtx, node: Node, parent: NodeId) {
        let declarator = node.child_by_field_name("declarator");
        if declarator.is_none()
            && node
                .child_by_field_name("type")
                .is_some_and(|t| node_text(&t, ctx.text) == "void")
        {
            return;
        }
        let grandparent = node.parent().and_then(|p| p.parent());
        let kind = if node.parent().is_some_and(|p| p.kind() == "template_parameter_list") {
            CursorKind::NonTypeTemplateParameter
        } else if grandparent.is_some_and(|g| g.kind() == "catch_clause") {
            CursorKind::VarDecl
        } else {
            CursorKind::ParmDecl
        };
        let id = self.add(ctx, kind, node, parent);
        let name = declarator.and_then(|d| declarator_name(&d));
        {
            let data = self.data(id);
            data.decl = Some(SyntaxRef::of(&node));
            data.flags.is_definition = true;
            data.specifiers = Specifiers::read(&node, ctx.text);
            if let Some(name) = name {
                data.spelling = node_text(&name, ctx.text).to_string();
                data.anchor = name.start_byte();
            }
        }
        self.visit_children(ctx, node, id);
    }

    fn range_for(&mut self, ctx: &FileCtx, node: Node, parent: NodeId) {
        let id = self.add(ctx, CursorKind::CXXForRangeStmt, node, parent);
        let declarator = node.child_by_field_name("declarator");
        let type_node = node.child_by_field_name("type");
        let mut skip = Vec::new();
        if let Some(d) = declarator {
            skip.push(d.id());
            if let Some(name) = declarator_name(&d) {
                let var = self.add(ctx, CursorKind::VarDecl, d, id);
                let data = self.data(var);
                data.spelling = node_text(&name, ctx.text).to_string();
                data.anchor = name.start_byte();
                data.extent = (type_node.map_or(d.start_byte(), |t| t.start_byte()), d.end_byte());
                data.decl = Some(SyntaxRef::of(&node));
                data.flags.is_definition = true;
                if let Some(ty) = type_node {
                    skip.push(ty.id());
                    self.visit(ctx, ty, var);
                }
                self.visit_children(ctx, d, var);
            }
        }
        self.visit_children_except(ctx, node, id, &skip);
    }

    // ========================================================================
    // References and expressions
    // ========================================================================

    fn type_reference(&mut self, ctx: &FileCtx, node: Node, parent: NodeId) {
        let Some(p) = node.parent() else {
            return;
        };
        let declares = match p.kind() {
            "class_specifier" | "struct_specifier" | "union_specifier" | "enum_specifier" => {
                is_field(&p, "name", &node) && is_tag_declaration(&p)
            }
            "alias_declaration" => is_field(&p, "name", &node),
            "destructor_name" => true,
            k if TYPE_PARAMETER_KINDS.contains(&k) => !is_field(&p, "default_type", &node),
            _ => is_field(&p, "declarator", &node),
        };
        if declares {
            return;
        }
        let kind = if p.kind() == "template_type" && is_field(&p, "name", &node) {
            CursorKind::TemplateRef
        } else {
            CursorKind::TypeRef
        };
        let id = self.add(ctx, kind, node, parent);
        self.data(id).spelling = node_text(&node, ctx.text).to_string();
    }

    fn namespace_reference(&mut self, ctx: &FileCtx, node: Node, parent: NodeId) {
        let declares = node.parent().is_some_and(|p| {
            matches!(p.kind(), "namespace_definition" | "nested_namespace_specifier")
                || (p.kind() == "namespace_alias_definition" && is_field(&p, "name", &node))
        });
        if declares {
            return;
        }
        let id = self.add(ctx, CursorKind::NamespaceRef, node, parent);
        self.data(id).spelling = node_text(&node, ctx.text).to_string();
    }

    fn decl_ref(&mut self, ctx: &FileCtx, node: Node, parent: NodeId) {
        let id = self.add(ctx, CursorKind::DeclRefExpr, node, parent);
        let last = final_name(&node);
        {
            let data = self.data(id);
            data.spelling = last_component(&node, ctx.text);
            data.anchor = last.start_byte();
        }
        match node.kind() {
            "qualified_identifier" => {
                let skip = vec![last.id()];
                self.visit_qualified_scopes(ctx, node, id, &skip);
            }
            "template_function" => {
                if let Some(args) = node.child_by_field_name("arguments") {
                    self.visit_children(ctx, args, id);
                }
            }
            _ => {}
        }
    }

    fn visit_qualified_scopes(&mut self, ctx: &FileCtx, node: Node, parent: NodeId, skip: &[usize]) {
        for child in children(&node) {
            if skip.contains(&child.id()) {
                continue;
            }
            match child.kind() {
                "qualified_identifier" => self.visit_qualified_scopes(ctx, child, parent, skip),
                "template_function" => {
                    if let Some(args) = child.child_by_field_name("arguments") {
                        self.visit_children(ctx, args, parent);
                    }
                }
                _ => self.visit(ctx, child, parent),
            }
        }
    }

    fn call(&mut self, ctx: &FileCtx, node: Node, parent: NodeId) {
        let function = node.child_by_field_name("function");
        let cast = function.filter(|f| {
            f.kind() == "template_function"
                && f.child_by_field_name("name")
                    .is_some_and(|n| CAST_NAMES.contains(&node_text(&n, ctx.text)))
        });
        if let Some(f) = cast {
            let kind = match f.child_by_field_name("name").map(|n| node_text(&n, ctx.text)) {
                Some("static_cast") => CursorKind::CXXStaticCastExpr,
                _ => CursorKind::UnexposedExpr,
            };
            let id = self.add(ctx, kind, node, parent);
            if let Some(args) = f.child_by_field_name("arguments") {
                self.visit_children(ctx, args, id);
            }
            if let Some(args) = node.child_by_field_name("arguments") {
                self.visit_children(ctx, args, id);
            }
            return;
        }

        let id = self.add(ctx, CursorKind::CallExpr, node, parent);
        if let Some(f) = function {
            let spelling = match f.kind() {
                "identifier" | "qualified_identifier" | "template_function" => {
                    last_component(&f, ctx.text)
                }
                "field_expression" => f
                    .child_by_field_name("field")
                    .map(|field| last_component(&field, ctx.text))
                    .unwrap_or_default(),
                _ => String::new(),
            };
            self.data(id).spelling = spelling;
        }
        self.visit_children(ctx, node, id);
    }
}

// ============================================================================
// Tree-sitter helpers
// ============================================================================

fn children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect()
}

fn children_by_field<'t>(node: &Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// End of a node with its trailing `;` dropped
fn trim_semicolon(node: &Node) -> usize {
    let count = node.child_count();
    match (count.checked_sub(1).and_then(|i| node.child(i)), count.checked_sub(2).and_then(|i| node.child(i))) {
        (Some(last), Some(before)) if last.kind() == ";" => before.end_byte(),
        _ => node.end_byte(),
    }
}

/// Children that can open a declaration before its declarator
fn is_specifier_kind(kind: &str) -> bool {
    matches!(
        kind,
        "primitive_type"
            | "sized_type_specifier"
            | "type_identifier"
            | "qualified_identifier"
            | "template_type"
            | "placeholder_type_specifier"
            | "storage_class_specifier"
            | "type_qualifier"
            | "virtual"
            | "struct_specifier"
            | "class_specifier"
            | "enum_specifier"
            | "union_specifier"
    )
}

fn is_record_kind(kind: &str) -> bool {
    matches!(kind, "class_specifier" | "struct_specifier" | "union_specifier")
}

/// A class/struct/union/enum specifier that declares the tag, as opposed to
/// an elaborated reference like `struct S s;`
pub(crate) fn is_tag_declaration(node: &Node) -> bool {
    if !is_record_kind(node.kind()) && node.kind() != "enum_specifier" {
        return false;
    }
    if node.child_by_field_name("body").is_some() {
        return true;
    }
    node.parent().is_some_and(|p| match p.kind() {
        "declaration" | "field_declaration" => p.child_by_field_name("declarator").is_none(),
        "template_declaration" => true,
        _ => false,
    })
}

fn has_template_parameters(template: &Node) -> bool {
    template
        .child_by_field_name("parameters")
        .is_some_and(|p| p.named_child_count() > 0)
}

/// The node a declarator ultimately names
pub(crate) fn inner_declarator<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    if let Some(inner) = node.child_by_field_name("declarator") {
        return Some(inner);
    }
    named_children(node)
        .into_iter()
        .rev()
        .find(|c| c.kind().ends_with("declarator") || is_name_kind(c.kind()))
}

fn is_name_kind(kind: &str) -> bool {
    matches!(
        kind,
        "identifier"
            | "field_identifier"
            | "type_identifier"
            | "qualified_identifier"
            | "operator_name"
            | "destructor_name"
            | "template_function"
            | "operator_cast"
    )
}

/// The identifier declared by a (possibly nested) declarator
pub(crate) fn declarator_name<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    let mut current = *node;
    for _ in 0..32 {
        if is_name_kind(current.kind()) {
            return Some(current);
        }
        current = inner_declarator(&current)?;
    }
    None
}

/// The function declarator of a declaration that declares a function, not a
/// variable of function-pointer type
pub(crate) fn function_declarator_of<'t>(node: Node<'t>) -> Option<Node<'t>> {
    let mut current = node;
    for _ in 0..32 {
        match current.kind() {
            "function_declarator" => {
                let mut inner = current.child_by_field_name("declarator")?;
                while inner.kind() == "parenthesized_declarator" {
                    inner = inner_declarator(&inner)?;
                }
                return is_name_kind(inner.kind()).then_some(current);
            }
            "pointer_declarator" | "reference_declarator" | "attributed_declarator" => {
                current = inner_declarator(&current)?;
            }
            _ => return None,
        }
    }
    None
}

fn is_variadic(fdecl: &Node, text: &str) -> bool {
    fdecl
        .child_by_field_name("parameters")
        .is_some_and(|params| has_token(&params, text, "..."))
}

fn has_virtual_specifier(fdecl: &Node) -> bool {
    find_child_by_kind(fdecl, "virtual_specifier").is_some()
}

/// Split a possibly qualified name into its components
pub(crate) fn flatten_name(node: &Node, text: &str, out: &mut Vec<String>) {
    match node.kind() {
        "qualified_identifier" | "nested_namespace_specifier" => {
            match node.child_by_field_name("scope") {
                Some(scope) => flatten_name(&scope, text, out),
                None if node_text(node, text).trim_start().starts_with("::") => {
                    out.push(String::new())
                }
                None => {}
            }
            if let Some(name) = node.child_by_field_name("name") {
                flatten_name(&name, text, out);
            }
        }
        "template_type" | "template_function" | "template_method" => {
            if let Some(name) = node.child_by_field_name("name") {
                flatten_name(&name, text, out);
            }
        }
        _ => out.push(collapse_whitespace(node_text(node, text))),
    }
}

/// Innermost name node of a qualified or templated name
pub(crate) fn final_name<'t>(node: &Node<'t>) -> Node<'t> {
    let mut current = *node;
    for _ in 0..32 {
        match current.kind() {
            "qualified_identifier" | "template_type" | "template_function" | "template_method" => {
                match current.child_by_field_name("name") {
                    Some(name) => current = name,
                    None => break,
                }
            }
            _ => break,
        }
    }
    current
}

fn last_component(node: &Node, text: &str) -> String {
    let mut path = Vec::new();
    flatten_name(node, text, &mut path);
    path.pop().unwrap_or_default()
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn operator_spelling(text: &str) -> String {
    let rest = text.trim().trim_start_matches("operator").trim();
    if rest.starts_with(|c: char| c.is_alphabetic()) {
        format!("operator {}", collapse_whitespace(rest))
    } else {
        format!("operator{}", rest.replace(char::is_whitespace, ""))
    }
}

fn conversion_spelling(node: &Node, text: &str) -> String {
    let body = node_text(node, text);
    let body = body.split('(').next().unwrap_or(body);
    let target = body
        .rsplit("operator")
        .next()
        .map(collapse_whitespace)
        .unwrap_or_default();
    format!("operator {}", target)
}

/// Whether an identifier-like node sits where an expression is expected
pub(crate) fn is_expression_position(node: &Node) -> bool {
    let Some(p) = node.parent() else {
        return false;
    };
    match p.kind() {
        "argument_list"
        | "binary_expression"
        | "unary_expression"
        | "pointer_expression"
        | "update_expression"
        | "assignment_expression"
        | "conditional_expression"
        | "parenthesized_expression"
        | "subscript_expression"
        | "subscript_argument_list"
        | "return_statement"
        | "expression_statement"
        | "initializer_list"
        | "condition_clause"
        | "comma_expression"
        | "sizeof_expression"
        | "alignof_expression"
        | "delete_expression"
        | "throw_statement"
        | "lambda_capture_specifier"
        | "static_assert_declaration"
        | "template_argument_list"
        | "while_statement"
        | "do_statement"
        | "if_statement"
        | "switch_statement"
        | "bitfield_clause"
        | "for_statement"
        | "co_return_statement"
        | "co_await_expression"
        | "parameter_pack_expansion"
        | "fold_expression" => true,
        "field_expression" => is_field(&p, "argument", node),
        "call_expression" => is_field(&p, "function", node),
        "cast_expression" => is_field(&p, "value", node),
        "init_declarator" => !is_field(&p, "declarator", node),
        "optional_parameter_declaration" | "field_declaration" => {
            is_field(&p, "default_value", node)
        }
        "array_declarator" => is_field(&p, "size", node),
        "enumerator" | "initializer_pair" | "case_statement" => is_field(&p, "value", node),
        "for_range_loop" => is_field(&p, "right", node),
        _ => false,
    }
}

fn literal_kind(kind: &str, text: &str) -> CursorKind {
    match kind {
        "number_literal" => {
            let lower = text.to_ascii_lowercase();
            let hex = lower.starts_with("0x");
            if hex {
                if lower.contains('p') {
                    CursorKind::FloatingLiteral
                } else {
                    CursorKind::IntegerLiteral
                }
            } else if lower.ends_with('i') {
                CursorKind::ImaginaryLiteral
            } else if lower.ends_with('k') || lower.ends_with('r') {
                CursorKind::FixedPointLiteral
            } else if lower.contains('.') || lower.contains('e') || lower.ends_with('f') {
                CursorKind::FloatingLiteral
            } else {
                CursorKind::IntegerLiteral
            }
        }
        "string_literal" | "raw_string_literal" | "concatenated_string" => CursorKind::StringLiteral,
        "char_literal" => CursorKind::CharacterLiteral,
        "true" | "false" => CursorKind::CXXBoolLiteralExpr,
        "this" => CursorKind::CXXThisExpr,
        _ if text == "nullptr" => CursorKind::CXXNullPtrLiteralExpr,
        _ => CursorKind::UnexposedExpr,
    }
}

fn statement_kind(kind: &str, node: &Node, text: &str) -> Option<CursorKind> {
    Some(match kind {
        "compound_statement" => CursorKind::CompoundStmt,
        "if_statement" => CursorKind::IfStmt,
        "switch_statement" => CursorKind::SwitchStmt,
        "while_statement" => CursorKind::WhileStmt,
        "do_statement" => CursorKind::DoStmt,
        "for_statement" => CursorKind::ForStmt,
        "return_statement" => CursorKind::ReturnStmt,
        "break_statement" => CursorKind::BreakStmt,
        "continue_statement" => CursorKind::ContinueStmt,
        "goto_statement" => CursorKind::GotoStmt,
        "labeled_statement" => CursorKind::LabelStmt,
        "try_statement" => CursorKind::CXXTryStmt,
        "catch_clause" => CursorKind::CXXCatchStmt,
        "throw_statement" => CursorKind::CXXThrowExpr,
        "case_statement" => {
            if node_text(node, text).trim_start().starts_with("default") {
                CursorKind::DefaultStmt
            } else {
                CursorKind::CaseStmt
            }
        }
        _ => return None,
    })
}

fn expression_kind(kind: &str, node: &Node, text: &str) -> Option<CursorKind> {
    Some(match kind {
        "binary_expression" | "comma_expression" => CursorKind::BinaryOperator,
        "assignment_expression" => {
            let op = node
                .child_by_field_name("operator")
                .map(|o| node_text(&o, text))
                .unwrap_or("=");
            if op == "=" {
                CursorKind::BinaryOperator
            } else {
                CursorKind::CompoundAssignOperator
            }
        }
        "unary_expression" | "pointer_expression" | "update_expression" => CursorKind::UnaryOperator,
        "conditional_expression" => CursorKind::ConditionalOperator,
        "cast_expression" => CursorKind::CStyleCastExpr,
        "subscript_expression" => CursorKind::ArraySubscriptExpr,
        "sizeof_expression" | "alignof_expression" => CursorKind::UnaryExpr,
        "new_expression" => CursorKind::CXXNewExpr,
        "delete_expression" => CursorKind::CXXDeleteExpr,
        "initializer_list" => CursorKind::InitListExpr,
        _ => return None,
    })
}

impl Specifiers {
    /// Storage and function specifiers written directly on a declaration
    pub(crate) fn read(node: &Node, text: &str) -> Self {
        let mut specifiers = Specifiers::default();
        for child in children(node) {
            match (child.kind(), node_text(&child, text)) {
                ("storage_class_specifier", "static") => specifiers.is_static = true,
                ("storage_class_specifier", "extern") => specifiers.is_extern = true,
                ("storage_class_specifier", "inline") => specifiers.is_inline = true,
                ("virtual", _) | (_, "virtual") => specifiers.is_virtual = true,
                ("type_qualifier", "constexpr") => specifiers.is_constexpr = true,
                ("type_qualifier", "const") => specifiers.is_const = true,
                _ => {}
            }
        }
        specifiers
    }
}
