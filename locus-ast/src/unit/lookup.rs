//! Scope resolution and name lookup
//!
//! `resolve_scopes` runs once after the arena is built. It assigns semantic
//! and lexical parents, moves out-of-line definitions into the class or
//! namespace their qualifier names, and indexes declarations by the scope
//! they are visible in. Everything else here is computed on demand.
//!
//! Lookup is deliberately simple: unqualified names search enclosing scopes
//! outward (block scopes only see earlier declarations, class scopes see all
//! members and their bases), qualified names walk scope by scope from the
//! first component. Overloads are told apart by argument count only.

use super::builder::flatten_name;
use super::CppTranslationUnit;
use crate::adapters::is_field;
use crate::ir::{CursorFlags, CursorKind, LanguageId, Linkage, NodeId, TypeKind};
use std::collections::HashMap;
use tree_sitter::Node;

const MAX_DEPTH: usize = 16;

#[derive(Default)]
pub(crate) struct ScopeIndex {
    /// Declarations keyed by the scope they are visible in
    members: HashMap<NodeId, Vec<NodeId>>,
    namespace_keys: HashMap<NodeId, String>,
    /// Every block of a (re)opened namespace, keyed by qualified name
    namespaces: HashMap<String, Vec<NodeId>>,
    /// Redeclarations of one entity, in source order
    entities: HashMap<String, Vec<NodeId>>,
    entity_of: HashMap<NodeId, String>,
    by_syntax: HashMap<(usize, usize, usize), Vec<NodeId>>,
}

/// What a name lookup is allowed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Want {
    Any,
    Type,
    Namespace,
    /// Something a `::` can follow: namespaces, classes, enums, typedefs
    Scope,
}

fn is_decl_context(kind: CursorKind) -> bool {
    kind == CursorKind::TranslationUnit
        || kind == CursorKind::Namespace
        || kind == CursorKind::EnumDecl
        || kind == CursorKind::LambdaExpr
        || kind.is_class()
        || kind.is_function()
}

fn is_scope(kind: CursorKind) -> bool {
    is_decl_context(kind)
        || kind == CursorKind::TypeAliasTemplateDecl
        || matches!(
            kind,
            CursorKind::CompoundStmt
                | CursorKind::ForStmt
                | CursorKind::CXXForRangeStmt
                | CursorKind::IfStmt
                | CursorKind::WhileStmt
                | CursorKind::SwitchStmt
                | CursorKind::DoStmt
                | CursorKind::CXXCatchStmt
        )
}

impl CppTranslationUnit {
    // ========================================================================
    // Semantic pass
    // ========================================================================

    pub(super) fn resolve_scopes(&mut self) {
        for (i, data) in self.nodes.iter().enumerate() {
            self.index
                .by_syntax
                .entry((data.file, data.syntax.start, data.syntax.end))
                .or_default()
                .push(NodeId::new(i));
        }

        for i in 1..self.nodes.len() {
            let id = NodeId::new(i);
            let (kind, parent) = (self.nodes[i].kind, self.nodes[i].parent);
            if !kind.is_declaration() {
                self.nodes[i].semantic_parent = parent;
                continue;
            }

            let context = self.decl_context(parent);
            let qualifier = self.nodes[i].qualifier.clone();
            let semantic = if qualifier.is_empty() {
                context
            } else {
                self.lookup_path(id, &qualifier, Want::Scope, 0)
                    .first()
                    .copied()
                    .unwrap_or(context)
            };
            self.nodes[i].lexical_parent = context;
            self.nodes[i].semantic_parent = semantic;
            if semantic != context {
                self.adopt_out_of_line(id);
            }

            let scope = self.visibility_scope(id);
            self.index.members.entry(scope).or_default().push(id);
            if self.nodes[i].kind == CursorKind::Namespace {
                let key = self.qualified_name(id);
                self.index.namespace_keys.insert(id, key.clone());
                self.index.namespaces.entry(key).or_default().push(id);
            }
            if let Some(key) = self.entity_key(id) {
                self.index.entities.entry(key.clone()).or_default().push(id);
                self.index.entity_of.insert(id, key);
            }
        }

        // tree-sitter spells every `X::` scope as a namespace name
        for i in 1..self.nodes.len() {
            let id = NodeId::new(i);
            if self.nodes[i].kind != CursorKind::NamespaceRef {
                continue;
            }
            let target = self.reference_lookup(id, Want::Scope, 0);
            let target_kind = self.kind_of(target);
            if target_kind.is_class() || target_kind == CursorKind::EnumDecl
                || matches!(target_kind, CursorKind::TypedefDecl | CursorKind::TypeAliasDecl)
            {
                self.nodes[i].kind = CursorKind::TypeRef;
            }
        }
    }

    fn decl_context(&self, mut id: NodeId) -> NodeId {
        while let Some(data) = self.node(id) {
            if is_decl_context(data.kind) {
                return id;
            }
            id = data.parent;
        }
        NodeId::NULL
    }

    pub(crate) fn enclosing_scope(&self, id: NodeId) -> NodeId {
        let mut current = self.node(id).map_or(NodeId::NULL, |n| n.parent);
        while let Some(data) = self.node(current) {
            if is_scope(data.kind) {
                return current;
            }
            current = data.parent;
        }
        NodeId::NULL
    }

    /// Scope whose lookups see this declaration
    fn visibility_scope(&self, id: NodeId) -> NodeId {
        let Some(data) = self.node(id) else {
            return NodeId::NULL;
        };
        if matches!(
            data.kind,
            CursorKind::TemplateTypeParameter | CursorKind::NonTypeTemplateParameter
        ) {
            return data.parent;
        }
        let semantic = self.kind_of(data.semantic_parent);
        if semantic == CursorKind::TranslationUnit
            || semantic == CursorKind::Namespace
            || semantic == CursorKind::EnumDecl
            || semantic.is_class()
        {
            data.semantic_parent
        } else {
            self.enclosing_scope(id)
        }
    }

    /// An out-of-line member definition takes its kind and member facts
    /// from the in-class declaration
    fn adopt_out_of_line(&mut self, id: NodeId) {
        let class = self.nodes[id.index()].semantic_parent;
        let class_kind = self.kind_of(class);
        if !class_kind.is_class() {
            return;
        }
        let class_name = self.kind_spelling(class);
        {
            let data = &mut self.nodes[id.index()];
            if data.kind == CursorKind::FunctionDecl {
                data.kind = if data.spelling == class_name {
                    CursorKind::Constructor
                } else {
                    CursorKind::CXXMethod
                };
            }
        }

        let (kind, spelling) = {
            let data = &self.nodes[id.index()];
            (data.kind, data.spelling.clone())
        };
        let arity = self.param_count(id);
        let declaration = self
            .index
            .members
            .get(&class)
            .into_iter()
            .flatten()
            .copied()
            .find(|&m| {
                m != id && self.node(m).is_some_and(|d| {
                    d.spelling == spelling
                        && (d.kind == kind || (kind.is_function() && d.kind.is_function()))
                        && (!kind.is_function() || self.param_count(m) == arity)
                })
            });
        if let Some(declaration) = declaration {
            let (access, flags, specifiers) = {
                let d = &self.nodes[declaration.index()];
                (d.access, d.flags, d.specifiers)
            };
            let data = &mut self.nodes[id.index()];
            data.access = access;
            data.flags.is_virtual |= flags.is_virtual;
            data.flags.is_static_method |= flags.is_static_method;
            data.specifiers.is_static |= specifiers.is_static;
        }
    }

    fn kind_spelling(&self, id: NodeId) -> String {
        self.node(id).map(|n| n.spelling.clone()).unwrap_or_default()
    }

    pub(crate) fn param_count(&self, id: NodeId) -> usize {
        self.node(id).map_or(0, |n| {
            n.children
                .iter()
                .filter(|c| self.kind_of(**c) == CursorKind::ParmDecl)
                .count()
        })
    }

    fn default_count(&self, id: NodeId) -> usize {
        self.node(id).map_or(0, |n| {
            n.children
                .iter()
                .filter_map(|c| self.node(*c))
                .filter(|c| c.kind == CursorKind::ParmDecl && c.syntax.kind == "optional_parameter_declaration")
                .count()
        })
    }

    fn takes_pack(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| {
            n.flags.is_variadic
                || n.children.iter().filter_map(|c| self.node(*c)).any(|c| {
                    c.kind == CursorKind::ParmDecl && c.syntax.kind == "variadic_parameter_declaration"
                })
        })
    }

    /// Fully qualified name, `(anonymous namespace)` for unnamed namespaces;
    /// stops at function scope
    pub(crate) fn qualified_name(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        let mut current = id;
        for _ in 0..64 {
            let Some(data) = self.node(current) else {
                break;
            };
            if data.kind == CursorKind::TranslationUnit || !data.kind.is_declaration() {
                break;
            }
            if current != id && (data.kind.is_function() || data.kind == CursorKind::LambdaExpr) {
                break;
            }
            if data.kind == CursorKind::Namespace && data.spelling.is_empty() {
                parts.push("(anonymous namespace)".to_string());
            } else if !data.spelling.is_empty() {
                parts.push(data.spelling.clone());
            }
            current = data.semantic_parent;
        }
        parts.reverse();
        parts.join("::")
    }

    fn in_local_context(&self, id: NodeId) -> bool {
        let mut current = self.node(id).map_or(NodeId::NULL, |n| n.semantic_parent);
        while let Some(data) = self.node(current) {
            if data.kind.is_function() || data.kind == CursorKind::LambdaExpr {
                return true;
            }
            current = data.semantic_parent;
        }
        false
    }

    fn in_anonymous_namespace(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(data) = self.node(current) {
            if data.kind == CursorKind::Namespace && data.spelling.is_empty() {
                return true;
            }
            current = data.semantic_parent;
        }
        false
    }

    fn entity_key(&self, id: NodeId) -> Option<String> {
        let data = self.node(id)?;
        let family = match data.kind {
            k if k.is_class() => "record",
            CursorKind::EnumDecl => "enum",
            CursorKind::FunctionTemplate => "function-template",
            k if k.is_function() => "function",
            CursorKind::VarDecl => "var",
            CursorKind::FieldDecl => "field",
            CursorKind::TypedefDecl | CursorKind::TypeAliasDecl | CursorKind::TypeAliasTemplateDecl => {
                "typedef"
            }
            CursorKind::EnumConstantDecl => "enumerator",
            CursorKind::Namespace => "namespace",
            _ => return None,
        };
        if data.spelling.is_empty() || self.in_local_context(id) {
            return None;
        }
        let arity = if data.kind.is_function() {
            self.param_count(id)
        } else {
            0
        };
        Some(format!("{}:{}:{}", family, self.qualified_name(id), arity))
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Path components of a (possibly qualified) name node, including the
    /// scopes written to its left when it is itself part of a qualified name
    pub(crate) fn name_path(&self, file: usize, node: Node) -> Vec<String> {
        let Some(source) = self.files.get(file) else {
            return Vec::new();
        };
        let text = source.text.as_str();
        let mut path = Vec::new();
        flatten_name(&node, text, &mut path);

        let mut current = node;
        while let Some(parent) = current.parent() {
            match parent.kind() {
                "qualified_identifier" if is_field(&parent, "name", &current) => {
                    let mut prefix = Vec::new();
                    match parent.child_by_field_name("scope") {
                        Some(scope) => flatten_name(&scope, text, &mut prefix),
                        None => prefix.push(String::new()),
                    }
                    prefix.append(&mut path);
                    path = prefix;
                }
                "qualified_identifier" => {}
                "template_type" | "template_function" if is_field(&parent, "name", &current) => {}
                _ => break,
            }
            current = parent;
        }
        path
    }

    /// Cursors built from exactly this tree-sitter node
    pub(crate) fn nodes_for(&self, file: usize, node: &Node) -> &[NodeId] {
        self.index
            .by_syntax
            .get(&(file, node.start_byte(), node.end_byte()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The expression cursor for a tree-sitter expression node
    pub(crate) fn expression_for(&self, file: usize, node: &Node) -> NodeId {
        self.nodes_for(file, node)
            .iter()
            .copied()
            .find(|id| self.kind_of(*id).is_expression())
            .unwrap_or(NodeId::NULL)
    }

    fn accepts(&self, id: NodeId, want: Want) -> bool {
        let kind = self.kind_of(id);
        match want {
            Want::Any => {
                kind.is_declaration()
                    && !matches!(
                        kind,
                        CursorKind::UsingDirective
                            | CursorKind::CXXAccessSpecifier
                            | CursorKind::StaticAssert
                            | CursorKind::FriendDecl
                            | CursorKind::Constructor
                            | CursorKind::Destructor
                    )
            }
            Want::Type => kind.is_type_declaration() || kind == CursorKind::UsingDeclaration,
            Want::Namespace => kind.is_namespace(),
            Want::Scope => {
                kind.is_namespace()
                    || kind.is_class()
                    || matches!(
                        kind,
                        CursorKind::EnumDecl
                            | CursorKind::TypedefDecl
                            | CursorKind::TypeAliasDecl
                            | CursorKind::UsingDeclaration
                    )
            }
        }
    }

    /// Members of a scope, reopened namespace blocks merged; unnamed and
    /// inline namespaces and unscoped enums are looked through
    pub(crate) fn scope_members(&self, scope: NodeId) -> Vec<NodeId> {
        let blocks = self
            .index
            .namespace_keys
            .get(&scope)
            .and_then(|key| self.index.namespaces.get(key))
            .cloned()
            .unwrap_or_else(|| vec![scope]);
        let mut out = Vec::new();
        for block in blocks {
            self.collect_members(block, &mut out, 0);
        }
        out.sort();
        out.dedup();
        out
    }

    fn collect_members(&self, scope: NodeId, out: &mut Vec<NodeId>, depth: usize) {
        if depth > MAX_DEPTH {
            return;
        }
        for &member in self.index.members.get(&scope).into_iter().flatten() {
            out.push(member);
            let Some(data) = self.node(member) else {
                continue;
            };
            let transparent = (data.kind == CursorKind::Namespace
                && (data.spelling.is_empty() || data.specifiers.is_inline))
                || (data.kind == CursorKind::EnumDecl && !data.specifiers.is_scoped_enum);
            if transparent {
                let blocks = self
                    .index
                    .namespace_keys
                    .get(&member)
                    .and_then(|key| self.index.namespaces.get(key))
                    .cloned()
                    .unwrap_or_else(|| vec![member]);
                for block in blocks {
                    self.collect_members(block, out, depth + 1);
                }
            }
        }
    }

    /// The defining declaration of a class, or the class itself
    pub(crate) fn class_definition(&self, class: NodeId) -> NodeId {
        if self.node(class).is_some_and(|n| n.flags.is_definition) {
            return class;
        }
        match self.definition_of(class) {
            def if def.is_null() => class,
            def => def,
        }
    }

    pub(crate) fn bases(&self, class: NodeId, depth: usize) -> Vec<NodeId> {
        let class = self.class_definition(class);
        let Some(data) = self.node(class) else {
            return Vec::new();
        };
        data.children
            .iter()
            .filter(|c| self.kind_of(**c) == CursorKind::CXXBaseSpecifier)
            .map(|c| self.reference_lookup(*c, Want::Type, depth + 1))
            .filter(|b| self.kind_of(*b).is_class())
            .collect()
    }

    fn find_in_scope(&self, scope: NodeId, name: &str, want: Want, limit: Option<usize>, depth: usize) -> Vec<NodeId> {
        if depth > MAX_DEPTH {
            return Vec::new();
        }
        let is_class = self.kind_of(scope).is_class();
        let scope = if is_class {
            self.class_definition(scope)
        } else {
            scope
        };
        let found: Vec<NodeId> = self
            .scope_members(scope)
            .into_iter()
            .filter(|m| limit.map_or(true, |l| m.index() < l))
            .filter(|m| self.node(*m).is_some_and(|d| d.spelling == name))
            .filter(|m| self.accepts(*m, want))
            .collect();
        if !found.is_empty() || !is_class {
            return found;
        }
        for base in self.bases(scope, depth) {
            let inherited = self.find_in_scope(base, name, want, None, depth + 1);
            if !inherited.is_empty() {
                return inherited;
            }
        }
        Vec::new()
    }

    fn next_scope(&self, scope: NodeId) -> NodeId {
        let kind = self.kind_of(scope);
        if kind.is_declaration() {
            self.node(scope).map_or(NodeId::NULL, |n| n.semantic_parent)
        } else {
            self.enclosing_scope(scope)
        }
    }

    fn is_ancestor(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        while let Some(data) = self.node(id) {
            if id == ancestor {
                return true;
            }
            id = data.parent;
        }
        false
    }

    fn lookup_unqualified(&self, from: NodeId, name: &str, want: Want, depth: usize) -> Vec<NodeId> {
        if depth > MAX_DEPTH {
            return Vec::new();
        }
        let limit = from.index();
        let mut scope = self.enclosing_scope(from);
        for _ in 0..64 {
            if scope.is_null() {
                break;
            }
            let bounded = !self.kind_of(scope).is_class();
            let found = self.find_in_scope(scope, name, want, bounded.then_some(limit), depth);
            if !found.is_empty() {
                return found;
            }

            let directives: Vec<NodeId> = self
                .scope_members(scope)
                .into_iter()
                .filter(|m| m.index() < limit && self.kind_of(*m) == CursorKind::UsingDirective)
                .filter(|m| !self.is_ancestor(*m, from))
                .collect();
            for directive in directives {
                let namespace = self.target_of(directive, depth + 1);
                if namespace.is_null() {
                    continue;
                }
                let found = self.find_in_scope(namespace, name, want, None, depth + 1);
                if !found.is_empty() {
                    return found;
                }
            }
            scope = self.next_scope(scope);
        }
        Vec::new()
    }

    pub(crate) fn lookup_path(&self, from: NodeId, path: &[String], want: Want, depth: usize) -> Vec<NodeId> {
        let Some((last, scopes)) = path.split_last() else {
            return Vec::new();
        };
        let found = if scopes.is_empty() {
            self.lookup_unqualified(from, last, want, depth)
        } else {
            let mut scope = NodeId::NULL;
            for (i, component) in scopes.iter().enumerate() {
                scope = if i == 0 && component.is_empty() {
                    NodeId::new(0)
                } else if i == 0 {
                    self.lookup_unqualified(from, component, Want::Scope, depth)
                        .first()
                        .map_or(NodeId::NULL, |s| self.resolve(*s, Want::Scope, depth))
                } else {
                    self.find_in_scope(scope, component, Want::Scope, None, depth)
                        .first()
                        .map_or(NodeId::NULL, |s| self.resolve(*s, Want::Scope, depth))
                };
                if scope.is_null() {
                    return Vec::new();
                }
            }
            self.find_in_scope(scope, last, want, None, depth)
        };
        found
            .into_iter()
            .map(|m| self.resolve(m, want, depth))
            .filter(|m| !m.is_null())
            .collect()
    }

    /// Follow using-declarations, namespace aliases and (for scopes)
    /// typedefs to what they name
    fn resolve(&self, id: NodeId, want: Want, depth: usize) -> NodeId {
        if depth > MAX_DEPTH {
            return id;
        }
        match self.kind_of(id) {
            CursorKind::UsingDeclaration => {
                let Some(target) = self
                    .syntax(id)
                    .and_then(|s| {
                        let mut cursor = s.walk();
                        let last = s.named_children(&mut cursor).filter(|c| c.kind() != "comment").last();
                        last
                    })
                else {
                    return id;
                };
                let file = self.node(id).map_or(0, |n| n.file);
                let path = self.name_path(file, target);
                self.lookup_path(id, &path, want, depth + 1)
                    .into_iter()
                    .find(|t| *t != id)
                    .unwrap_or(id)
            }
            CursorKind::NamespaceAlias if matches!(want, Want::Namespace | Want::Scope) => {
                match self.target_of(id, depth + 1) {
                    target if target.is_null() || target == id => id,
                    target => target,
                }
            }
            CursorKind::TypedefDecl | CursorKind::TypeAliasDecl if want == Want::Scope => self
                .type_of(id)
                .canonical()
                .declaration
                .filter(|d| self.kind_of(*d).is_class())
                .unwrap_or(id),
            _ => id,
        }
    }

    fn call_arity(&self, id: NodeId) -> Option<usize> {
        let data = self.node(id)?;
        if self.kind_of(data.parent) != CursorKind::CallExpr {
            return None;
        }
        let call = self.syntax(data.parent)?;
        let callee = call.child_by_field_name("function")?;
        if callee.start_byte() != data.syntax.start || callee.end_byte() != data.syntax.end {
            return None;
        }
        let args = call.child_by_field_name("arguments")?;
        let mut cursor = args.walk();
        let count = args
            .named_children(&mut cursor)
            .filter(|c| c.kind() != "comment")
            .count();
        Some(count)
    }

    fn pick_overload(&self, candidates: Vec<NodeId>, arity: Option<usize>) -> NodeId {
        if let Some(n) = arity {
            let matching = candidates.iter().copied().find(|c| {
                if !self.kind_of(*c).is_function() {
                    return false;
                }
                let total = self.param_count(*c);
                let required = total - self.default_count(*c).min(total);
                if self.takes_pack(*c) {
                    n >= required.saturating_sub(1)
                } else {
                    n >= required && n <= total
                }
            });
            if let Some(found) = matching {
                return found;
            }
        }
        candidates.first().copied().unwrap_or(NodeId::NULL)
    }

    /// Look up the name a reference-like cursor was built from
    fn reference_lookup(&self, id: NodeId, want: Want, depth: usize) -> NodeId {
        let Some(data) = self.node(id) else {
            return NodeId::NULL;
        };
        let Some(syntax) = self.syntax(id) else {
            return NodeId::NULL;
        };
        let path = self.name_path(data.file, syntax);
        self.lookup_path(id, &path, want, depth)
            .first()
            .copied()
            .unwrap_or(NodeId::NULL)
    }

    // ========================================================================
    // Cross-references
    // ========================================================================

    pub(crate) fn referenced_of(&self, id: NodeId) -> NodeId {
        self.target_of(id, 0)
    }

    fn target_of(&self, id: NodeId, depth: usize) -> NodeId {
        let Some(data) = self.node(id) else {
            return NodeId::NULL;
        };
        if depth > MAX_DEPTH {
            return NodeId::NULL;
        }
        match data.kind {
            CursorKind::UsingDirective | CursorKind::NamespaceAlias => data
                .children
                .iter()
                .copied()
                .find(|c| self.kind_of(*c) == CursorKind::NamespaceRef)
                .map_or(NodeId::NULL, |c| self.target_of(c, depth + 1)),
            CursorKind::TranslationUnit => NodeId::NULL,
            k if k.is_declaration() => id,
            CursorKind::DeclRefExpr => {
                let Some(syntax) = self.syntax(id) else {
                    return NodeId::NULL;
                };
                let path = self.name_path(data.file, syntax);
                let candidates = self.lookup_path(id, &path, Want::Any, depth);
                self.pick_overload(candidates, self.call_arity(id))
            }
            CursorKind::MemberRefExpr => self.member_target(id, depth),
            CursorKind::CallExpr => self.call_target(id, depth),
            CursorKind::TypeRef | CursorKind::TemplateRef | CursorKind::CXXBaseSpecifier => {
                self.reference_lookup(id, Want::Type, depth)
            }
            CursorKind::NamespaceRef => self.reference_lookup(id, Want::Namespace, depth),
            CursorKind::MemberRef => {
                let mut owner = data.parent;
                while let Some(n) = self.node(owner) {
                    if n.kind.is_function() {
                        break;
                    }
                    owner = n.parent;
                }
                let class = self.node(owner).map_or(NodeId::NULL, |n| n.semantic_parent);
                self.find_in_scope(class, &data.spelling, Want::Any, None, depth)
                    .first()
                    .copied()
                    .unwrap_or(NodeId::NULL)
            }
            _ => NodeId::NULL,
        }
    }

    fn callee(&self, call: NodeId) -> NodeId {
        let Some(data) = self.node(call) else {
            return NodeId::NULL;
        };
        self.syntax(call)
            .and_then(|s| s.child_by_field_name("function"))
            .map_or(NodeId::NULL, |f| self.expression_for(data.file, &f))
    }

    fn call_target(&self, id: NodeId, depth: usize) -> NodeId {
        let callee = self.callee(id);
        let target = self.target_of(callee, depth + 1);
        if !self.kind_of(target).is_class() {
            return target;
        }
        let constructors: Vec<NodeId> = self
            .scope_members(self.class_definition(target))
            .into_iter()
            .filter(|m| self.kind_of(*m) == CursorKind::Constructor)
            .collect();
        let arity = self.syntax(id).and_then(|s| s.child_by_field_name("arguments")).map(|args| {
            let mut cursor = args.walk();
            let count = args.named_children(&mut cursor).filter(|c| c.kind() != "comment").count();
            count
        });
        match self.pick_overload(constructors, arity) {
            ctor if ctor.is_null() => target,
            ctor => ctor,
        }
    }

    /// The cursor for a member access's object expression
    fn member_base(&self, id: NodeId) -> NodeId {
        let Some(data) = self.node(id) else {
            return NodeId::NULL;
        };
        self.syntax(id)
            .and_then(|s| s.child_by_field_name("argument"))
            .map_or(NodeId::NULL, |arg| self.expression_for(data.file, &arg))
    }

    fn member_target(&self, id: NodeId, depth: usize) -> NodeId {
        let Some(data) = self.node(id) else {
            return NodeId::NULL;
        };
        let base = self.member_base(id);
        if base.is_null() {
            return NodeId::NULL;
        }
        let ty = self.type_of(base).non_reference();
        let ty = match ty.kind {
            TypeKind::Pointer => ty.pointee().cloned().unwrap_or_default().non_reference(),
            _ => ty,
        };
        let Some(record) = ty.canonical().declaration else {
            return NodeId::NULL;
        };
        let candidates = self.find_in_scope(record, &data.spelling, Want::Any, None, depth + 1);
        self.pick_overload(candidates, self.call_arity(id))
    }

    pub(crate) fn canonical_of(&self, id: NodeId) -> NodeId {
        self.index
            .entity_of
            .get(&id)
            .and_then(|key| self.index.entities.get(key))
            .and_then(|list| list.first().copied())
            .unwrap_or(id)
    }

    pub(crate) fn definition_of(&self, id: NodeId) -> NodeId {
        let Some(data) = self.node(id) else {
            return NodeId::NULL;
        };
        if !data.kind.is_declaration() {
            let target = self.referenced_of(id);
            return if target.is_null() || target == id {
                NodeId::NULL
            } else {
                self.definition_of(target)
            };
        }
        if data.flags.is_definition {
            return id;
        }
        self.index
            .entity_of
            .get(&id)
            .and_then(|key| self.index.entities.get(key))
            .and_then(|list| {
                list.iter()
                    .copied()
                    .find(|d| self.node(*d).is_some_and(|n| n.flags.is_definition))
            })
            .unwrap_or(NodeId::NULL)
    }

    // ========================================================================
    // Linkage and flags
    // ========================================================================

    pub(crate) fn linkage_of(&self, id: NodeId) -> Linkage {
        let Some(data) = self.node(id) else {
            return Linkage::Invalid;
        };
        match data.kind {
            k if !k.is_declaration() => return Linkage::Invalid,
            CursorKind::CXXAccessSpecifier
            | CursorKind::StaticAssert
            | CursorKind::FriendDecl
            | CursorKind::UsingDirective
            | CursorKind::UsingDeclaration => return Linkage::Invalid,
            CursorKind::ParmDecl
            | CursorKind::TemplateTypeParameter
            | CursorKind::NonTypeTemplateParameter
            | CursorKind::TypedefDecl
            | CursorKind::TypeAliasDecl
            | CursorKind::TypeAliasTemplateDecl
            | CursorKind::NamespaceAlias => return Linkage::NoLinkage,
            _ => {}
        }
        if self.in_local_context(id) {
            return Linkage::NoLinkage;
        }
        if self.in_anonymous_namespace(id) {
            return Linkage::Internal;
        }
        let parent = data.semantic_parent;
        let parent_kind = self.kind_of(parent);
        if parent_kind.is_class() || parent_kind == CursorKind::EnumDecl {
            return self.linkage_of(parent);
        }
        if matches!(
            data.kind,
            CursorKind::VarDecl | CursorKind::FunctionDecl | CursorKind::FunctionTemplate
        ) {
            if data.specifiers.is_static {
                return Linkage::Internal;
            }
            if data.kind == CursorKind::VarDecl
                && self.language == LanguageId::Cpp
                && !data.specifiers.is_extern
                && !data.specifiers.is_inline
                && (data.specifiers.is_constexpr || self.type_of(id).is_const)
            {
                return Linkage::Internal;
            }
            if self.mentions_anonymous_type(id) {
                return Linkage::UniqueExternal;
            }
        }
        Linkage::External
    }

    fn mentions_anonymous_type(&self, id: NodeId) -> bool {
        let mut ty = self.type_of(id).canonical();
        for _ in 0..MAX_DEPTH {
            if let Some(decl) = ty.declaration {
                return self.in_anonymous_namespace(decl);
            }
            match ty.element.or(ty.result) {
                Some(next) => ty = *next,
                None => return false,
            }
        }
        false
    }

    pub(crate) fn flags_of(&self, id: NodeId) -> CursorFlags {
        let Some(data) = self.node(id) else {
            return CursorFlags::default();
        };
        let mut flags = data.flags;
        match data.kind {
            CursorKind::CallExpr | CursorKind::MemberRefExpr => {
                flags.is_dynamic_call = self.is_dynamic_call(id);
            }
            CursorKind::CXXMethod | CursorKind::Destructor if !flags.is_virtual => {
                flags.is_virtual = self.overrides_virtual(id);
            }
            _ => {}
        }
        flags
    }

    fn is_virtual_method(&self, id: NodeId) -> bool {
        matches!(self.kind_of(id), CursorKind::CXXMethod | CursorKind::Destructor)
            && self.flags_of(id).is_virtual
    }

    /// A method that overrides a virtual one from a base is virtual too
    fn overrides_virtual(&self, id: NodeId) -> bool {
        let Some(data) = self.node(id) else {
            return false;
        };
        let arity = self.param_count(id);
        let mut pending = self.bases(data.semantic_parent, 0);
        let mut visited = 0;
        while let Some(base) = pending.pop() {
            visited += 1;
            if visited > MAX_DEPTH {
                break;
            }
            let base = self.class_definition(base);
            let overridden = self.scope_members(base).into_iter().any(|m| {
                self.node(m).is_some_and(|d| {
                    let same = if data.kind == CursorKind::Destructor {
                        d.kind == CursorKind::Destructor
                    } else {
                        d.kind == CursorKind::CXXMethod
                            && d.spelling == data.spelling
                            && self.param_count(m) == arity
                    };
                    same && d.flags.is_virtual
                })
            });
            if overridden {
                return true;
            }
            pending.extend(self.bases(base, 0));
        }
        false
    }

    fn is_dynamic_call(&self, id: NodeId) -> bool {
        match self.kind_of(id) {
            CursorKind::CallExpr => {
                let callee = self.callee(id);
                match self.kind_of(callee) {
                    CursorKind::MemberRefExpr => self.is_dynamic_call(callee),
                    CursorKind::DeclRefExpr => {
                        let unqualified = self
                            .syntax(callee)
                            .is_some_and(|s| s.kind() == "identifier");
                        unqualified && self.is_virtual_method(self.referenced_of(callee))
                    }
                    _ => false,
                }
            }
            CursorKind::MemberRefExpr => {
                if !self.is_virtual_method(self.referenced_of(id)) {
                    return false;
                }
                let Some(syntax) = self.syntax(id) else {
                    return false;
                };
                if syntax
                    .child_by_field_name("field")
                    .is_some_and(|f| f.kind() == "qualified_field_identifier")
                {
                    return false;
                }
                let source = self.source(id);
                let arrow = syntax
                    .child_by_field_name("operator")
                    .zip(source)
                    .is_some_and(|(op, src)| src.text_of(&op) == "->");
                if arrow {
                    return true;
                }
                let base = self.member_base(id);
                let base_type = if self.kind_of(base) == CursorKind::DeclRefExpr {
                    self.type_of(self.referenced_of(base))
                } else {
                    self.type_of(base)
                };
                base_type.kind.is_reference()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{at, unit, unit_from};
    use super::*;
    use crate::provider::TranslationUnit;

    // =========================================================================
    // Semantic Parent Tests
    // =========================================================================

    #[test]
    fn test_out_of_line_method_parent() {
        let u = unit(
            "namespace ns {\nclass C {\npublic:\n  void foo(int);\n};\n}\nvoid ns::C::foo(int x) {}\n",
        );
        let def = at(&u, "foo(int x)");
        assert_eq!(u.kind(def), CursorKind::CXXMethod);
        let class = u.semantic_parent(def);
        assert_eq!(u.kind(class), CursorKind::ClassDecl);
        assert_eq!(u.spelling(class), "C");
        assert_eq!(u.kind(u.lexical_parent(def)), CursorKind::TranslationUnit);
        assert_eq!(u.access(def), crate::ir::AccessSpecifier::Public);
        assert_eq!(u.qualified_name(def), "ns::C::foo");
    }

    #[test]
    fn test_out_of_line_constructor_and_destructor() {
        let u = unit("struct D {\n  D();\n  ~D();\n};\nD::D() {}\nD::~D() {}\n");
        let ctor = at(&u, "D() {}");
        assert_eq!(u.kind(ctor), CursorKind::Constructor);
        let dtor = at(&u, "~D() {}");
        assert_eq!(u.kind(dtor), CursorKind::Destructor);
        assert_eq!(u.spelling(dtor), "~D");
    }

    #[test]
    fn test_non_declarations_use_syntactic_parent() {
        let u = unit("int f() {\n  return 1;\n}\n");
        let ret = at(&u, "return");
        let body = u.semantic_parent(ret);
        assert_eq!(u.kind(body), CursorKind::CompoundStmt);
        assert!(u.lexical_parent(ret).is_null());
    }

    // =========================================================================
    // Reference Tests
    // =========================================================================

    #[test]
    fn test_decl_ref_resolves_local() {
        let u = unit("int f() {\n  int value = 1;\n  return value;\n}\n");
        let use_site = at(&u, "value;");
        assert_eq!(u.kind(use_site), CursorKind::DeclRefExpr);
        let target = u.referenced(use_site);
        assert_eq!(u.kind(target), CursorKind::VarDecl);
        assert_eq!(u.location(target).unwrap().line, 2);
    }

    #[test]
    fn test_later_local_is_not_visible() {
        let u = unit("int value;\nint f() {\n  int a = value;\n  int value = 2;\n  return a;\n}\n");
        let use_site = at(&u, "value;\n  int");
        let target = u.referenced(use_site);
        assert_eq!(u.location(target).unwrap().line, 1);
    }

    #[test]
    fn test_member_call_and_canonical() {
        let u = unit(
            "struct S {\n  int get() const;\n};\nint S::get() const { return 0; }\nint use(S s) {\n  return s.get();\n}\n",
        );
        let member = at(&u, ".get()");
        assert_eq!(u.kind(member), CursorKind::MemberRefExpr);
        let target = u.referenced(member);
        assert_eq!(u.kind(target), CursorKind::CXXMethod);
        assert_eq!(u.location(u.canonical(target)).unwrap().line, 2);
        assert_eq!(u.location(u.definition(target)).unwrap().line, 4);
    }

    #[test]
    fn test_overload_by_arity() {
        let u = unit("int f(int);\nint f(int, int);\nint g() { return f(1, 2); }\n");
        let call = at(&u, "(1, 2)");
        assert_eq!(u.kind(call), CursorKind::CallExpr);
        let target = u.referenced(call);
        assert_eq!(u.location(target).unwrap().line, 2);
    }

    #[test]
    fn test_type_ref_through_namespace() {
        let u = unit("namespace ns { struct T {}; }\nns::T value;\n");
        let type_ref = at(&u, "T value");
        assert_eq!(u.kind(type_ref), CursorKind::TypeRef);
        assert_eq!(u.spelling(type_ref), "ns::T");
        let ns_ref = at(&u, "ns::T value");
        assert_eq!(u.kind(ns_ref), CursorKind::NamespaceRef);
    }

    #[test]
    fn test_scope_name_retagged_as_type_ref() {
        let u = unit("struct C { void f(); };\nvoid C::f() {}\n");
        let scope = at(&u, "C::f");
        assert_eq!(u.kind(scope), CursorKind::TypeRef);
    }

    #[test]
    fn test_using_directive_lookup() {
        let u = unit("namespace a { int n; }\nusing namespace a;\nint m = n;\n");
        let use_site = at(&u, "n;\n");
        let target = u.referenced(use_site);
        assert_eq!(u.kind(target), CursorKind::VarDecl);
        assert_eq!(u.qualified_name(target), "a::n");
    }

    #[test]
    fn test_reopened_namespace_members() {
        let u = unit("namespace a { int x; }\nnamespace a { int y = x ; }\n");
        let use_site = at(&u, "x ;");
        assert_eq!(u.location(u.referenced(use_site)).unwrap().line, 1);
    }

    #[test]
    fn test_declarations_in_header() {
        let u = unit_from(
            &[
                ("main.cpp", "#include \"lib.hpp\"\nint main() { return twice(2); }\n"),
                ("lib.hpp", "int twice(int x);\n"),
            ],
            &[],
        );
        let call = at(&u, "twice(2)");
        let target = u.referenced(call);
        assert_eq!(u.kind(target), CursorKind::FunctionDecl);
        assert!(u.location(target).unwrap().file.ends_with("lib.hpp"));
    }

    // =========================================================================
    // Linkage Tests
    // =========================================================================

    #[test]
    fn test_linkage_kinds() {
        let u = unit(
            "int global;\nstatic int hidden;\nconst int limit = 3;\nnamespace {\nstruct A {};\nint in_anon;\n}\nA uses_anon;\nvoid f(int param) {\n  int local;\n}\n",
        );
        assert_eq!(u.linkage(at(&u, "global")), Linkage::External);
        assert_eq!(u.linkage(at(&u, "hidden")), Linkage::Internal);
        assert_eq!(u.linkage(at(&u, "limit")), Linkage::Internal);
        assert_eq!(u.linkage(at(&u, "in_anon")), Linkage::Internal);
        assert_eq!(u.linkage(at(&u, "uses_anon")), Linkage::UniqueExternal);
        assert_eq!(u.linkage(at(&u, "param")), Linkage::NoLinkage);
        assert_eq!(u.linkage(at(&u, "local")), Linkage::NoLinkage);
        assert_eq!(u.linkage(u.root()), Linkage::Invalid);
    }

    // =========================================================================
    // Flag Tests
    // =========================================================================

    #[test]
    fn test_virtual_flags() {
        let u = unit(
            "struct B {\n  virtual void f();\n  virtual void g() = 0;\n  static void s();\n};\nstruct D : B {\n  void f();\n};\n",
        );
        assert!(u.flags(at(&u, "f();\n  virtual")).is_virtual);
        let pure = u.flags(at(&u, "g()"));
        assert!(pure.is_virtual && pure.is_pure_virtual);
        assert!(u.flags(at(&u, "s()")).is_static_method);
        let overriding = at(&u, "f();\n};\n");
        assert!(u.flags(overriding).is_virtual);
    }

    #[test]
    fn test_dynamic_call_through_pointer() {
        let u = unit(
            "struct B {\n  virtual int f();\n  int g();\n};\nint use(B *b, B v) {\n  return b->f() + b->g() + v.f();\n}\n",
        );
        assert!(u.flags(at(&u, "->f()")).is_dynamic_call);
        assert!(!u.flags(at(&u, "->g()")).is_dynamic_call);
        assert!(!u.flags(at(&u, ".f()")).is_dynamic_call);
    }

    #[test]
    fn test_definition_flags() {
        let u = unit("extern int e;\nint d = 1;\nvoid proto();\nvoid body() {}\n");
        assert!(!u.flags(at(&u, "e;")).is_definition);
        assert!(u.flags(at(&u, "d = 1")).is_definition);
        assert!(!u.flags(at(&u, "proto")).is_definition);
        assert!(u.flags(at(&u, "body")).is_definition);
    }
}
