//! Cursor types
//!
//! Declared types are rebuilt from the declaration's specifiers and
//! declarator chain, applied outermost first the way clang reads them.
//! Expression types follow the usual arithmetic conversions closely enough
//! for display; anything exotic is `Unexposed`.

use super::builder::{collapse_whitespace, inner_declarator, is_tag_declaration};
use super::lookup::Want;
use super::CppTranslationUnit;
use crate::adapters::{find_child_by_kind, has_token, node_text};
use crate::ir::{CursorKind, CxType, LanguageId, NodeId, RefQualifier, TypeKind};
use tree_sitter::Node;

const MAX_TYPE_DEPTH: usize = 12;

/// Fixed-width and size typedefs that resolve without their headers
fn well_known(name: &str) -> Option<CxType> {
    let (kind, under) = match name {
        "size_t" | "uintptr_t" | "uint64_t" => (TypeKind::ULong, "unsigned long"),
        "ssize_t" | "ptrdiff_t" | "intptr_t" | "int64_t" => (TypeKind::Long, "long"),
        "int32_t" => (TypeKind::Int, "int"),
        "uint32_t" => (TypeKind::UInt, "unsigned int"),
        "int16_t" => (TypeKind::Short, "short"),
        "uint16_t" => (TypeKind::UShort, "unsigned short"),
        "int8_t" => (TypeKind::SChar, "signed char"),
        "uint8_t" => (TypeKind::UChar, "unsigned char"),
        _ => return None,
    };
    let mut ty = CxType::named(TypeKind::Typedef, name);
    ty.underlying = Some(Box::new(CxType::builtin(kind, under)));
    ty.is_pod = true;
    Some(ty)
}

/// Builtin type named by a sequence of type keywords
/// Embedded-C fixed-point literal type from its suffix (`hk`, `uk`, `lr`, ...)
fn fixed_point_type(text: &str) -> CxType {
    let suffix: String = text
        .to_ascii_lowercase()
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    let unsigned = suffix.contains('u');
    let size = if suffix.contains('h') {
        "short "
    } else if suffix.contains('l') {
        "long "
    } else {
        ""
    };
    let sign = if unsigned { "unsigned " } else { "" };
    if suffix.starts_with('r') {
        let mut ty = CxType::named(TypeKind::Unexposed, format!("{}{}_Fract", sign, size));
        ty.is_pod = true;
        return ty;
    }
    let kind = match (unsigned, size) {
        (false, "short ") => TypeKind::ShortAccum,
        (false, "long ") => TypeKind::LongAccum,
        (false, _) => TypeKind::Accum,
        (true, "short ") => TypeKind::UShortAccum,
        (true, "long ") => TypeKind::ULongAccum,
        (true, _) => TypeKind::UAccum,
    };
    CxType::builtin(kind, format!("{}{}_Accum", sign, size))
}

fn builtin_from_words(text: &str) -> Option<CxType> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let has = |w: &str| words.contains(&w);
    let unsigned = has("unsigned");
    let longs = words.iter().filter(|w| **w == "long").count();

    let (kind, name) = if has("void") {
        (TypeKind::Void, "void")
    } else if has("bool") || has("_Bool") {
        (TypeKind::Bool, "bool")
    } else if has("char") {
        if unsigned {
            (TypeKind::UChar, "unsigned char")
        } else if has("signed") {
            (TypeKind::SChar, "signed char")
        } else {
            (TypeKind::CharS, "char")
        }
    } else if has("wchar_t") {
        (TypeKind::WChar, "wchar_t")
    } else if has("char16_t") {
        (TypeKind::Char16, "char16_t")
    } else if has("char32_t") {
        (TypeKind::Char32, "char32_t")
    } else if has("float") {
        (TypeKind::Float, "float")
    } else if has("double") {
        if longs > 0 {
            (TypeKind::LongDouble, "long double")
        } else {
            (TypeKind::Double, "double")
        }
    } else if has("short") {
        if unsigned {
            (TypeKind::UShort, "unsigned short")
        } else {
            (TypeKind::Short, "short")
        }
    } else if longs >= 2 {
        if unsigned {
            (TypeKind::ULongLong, "unsigned long long")
        } else {
            (TypeKind::LongLong, "long long")
        }
    } else if longs == 1 {
        if unsigned {
            (TypeKind::ULong, "unsigned long")
        } else {
            (TypeKind::Long, "long")
        }
    } else if has("int") || unsigned || has("signed") {
        if unsigned {
            (TypeKind::UInt, "unsigned int")
        } else {
            (TypeKind::Int, "int")
        }
    } else {
        return None;
    };
    Some(CxType::builtin(kind, name))
}

fn qualifiers(node: &Node, text: &str) -> (bool, bool, bool) {
    let mut cursor = node.walk();
    let mut cv = (false, false, false);
    for child in node.children(&mut cursor) {
        if child.kind() != "type_qualifier" {
            continue;
        }
        match node_text(&child, text) {
            "const" => cv.0 = true,
            "volatile" => cv.1 = true,
            "restrict" | "__restrict" | "__restrict__" => cv.2 = true,
            _ => {}
        }
    }
    cv
}

fn decay(ty: CxType) -> CxType {
    match ty.kind {
        k if k.is_array() => CxType::pointer_to(ty.element.map(|e| *e).unwrap_or_default()),
        k if k.is_function() => CxType::pointer_to(ty),
        _ => ty,
    }
}

fn unqualified(mut ty: CxType) -> CxType {
    ty.is_const = false;
    ty.is_volatile = false;
    ty.is_restrict = false;
    ty.respell();
    ty
}

/// Conversion rank for the usual arithmetic conversions; small types
/// promote to `int`
fn arithmetic_rank(kind: TypeKind) -> u8 {
    match kind {
        TypeKind::LongDouble => 9,
        TypeKind::Double => 8,
        TypeKind::Float => 7,
        TypeKind::ULongLong => 6,
        TypeKind::LongLong => 5,
        TypeKind::ULong => 4,
        TypeKind::Long => 3,
        TypeKind::UInt => 2,
        _ => 1,
    }
}

/// Number of code units in a string literal's array, terminator included
fn string_length(literal: &str) -> usize {
    let body = literal.trim_start_matches(|c: char| c.is_ascii_alphanumeric() && c != 'R');
    if let Some(raw) = body.strip_prefix('R') {
        let raw = raw.trim_matches('"');
        let delimiter_end = raw.find('(').unwrap_or(0);
        let close = raw.rfind(')').unwrap_or(raw.len());
        return raw
            .get(delimiter_end + 1..close)
            .map_or(0, |s| s.len())
            + 1;
    }
    let inner = body
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(body);
    let mut count = 0;
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        count += if c == '\\' {
            match chars.next() {
                Some('x') => {
                    while chars.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                        chars.next();
                    }
                }
                Some(d) if d.is_digit(8) => {
                    for _ in 0..2 {
                        if chars.peek().is_some_and(|c| c.is_digit(8)) {
                            chars.next();
                        }
                    }
                }
                _ => {}
            }
            1
        } else {
            c.len_utf8()
        };
    }
    count + 1
}

impl CppTranslationUnit {
    // ========================================================================
    // Cursor types
    // ========================================================================

    pub(crate) fn type_of(&self, id: NodeId) -> CxType {
        self.type_at_depth(id, 0)
    }

    fn type_at_depth(&self, id: NodeId, depth: usize) -> CxType {
        if depth > MAX_TYPE_DEPTH {
            return CxType::invalid();
        }
        let Some(data) = self.node(id) else {
            return CxType::invalid();
        };
        match data.kind {
            CursorKind::ClassTemplate => CxType::invalid(),
            k if k.is_class() => self.record_type(id, depth),
            CursorKind::EnumDecl => self.enum_type(id),
            CursorKind::EnumConstantDecl => match self.language {
                LanguageId::C => CxType::builtin(TypeKind::Int, "int"),
                _ => self.enum_type(data.parent),
            },
            CursorKind::TypedefDecl | CursorKind::TypeAliasDecl => self.typedef_type(id, depth),
            CursorKind::TemplateTypeParameter => CxType::named(TypeKind::Unexposed, data.spelling.clone()),
            k if k.is_function() => self.declared_type(id, depth),
            CursorKind::VarDecl
            | CursorKind::FieldDecl
            | CursorKind::ParmDecl
            | CursorKind::NonTypeTemplateParameter => self.declared_type(id, depth),
            CursorKind::TypeRef
            | CursorKind::TemplateRef
            | CursorKind::CXXBaseSpecifier
            | CursorKind::MemberRef => {
                let target = self.referenced_of(id);
                if target.is_null() || target == id {
                    CxType::invalid()
                } else {
                    self.type_at_depth(target, depth + 1)
                }
            }
            k if k.is_expression() => self.expression_type(id, depth),
            _ => CxType::invalid(),
        }
    }

    pub(crate) fn record_type(&self, id: NodeId, depth: usize) -> CxType {
        let Some(data) = self.node(id) else {
            return CxType::invalid();
        };
        let name = if data.spelling.is_empty() {
            let word = match data.kind {
                CursorKind::UnionDecl => "union",
                CursorKind::ClassDecl => "class",
                _ => "struct",
            };
            let at = self
                .location_at(data.file, data.anchor)
                .map(|l| format!("{}:{}:{}", l.file.display(), l.line, l.column))
                .unwrap_or_default();
            format!("{} (unnamed {} at {})", word, word, at)
        } else {
            self.qualified_name(id)
        };
        let mut ty = CxType::named(TypeKind::Record, name);
        ty.declaration = Some(id);
        ty.is_pod = self.record_is_pod(id, depth);
        ty
    }

    /// Plain-old-data approximation: no user-declared special members, no
    /// virtual functions, one access level, POD bases and fields
    fn record_is_pod(&self, id: NodeId, depth: usize) -> bool {
        if depth > MAX_TYPE_DEPTH {
            return false;
        }
        let class = self.class_definition(id);
        let Some(data) = self.node(class) else {
            return false;
        };
        if !data.flags.is_definition {
            return false;
        }
        let mut field_access = None;
        for &child in &data.children {
            let Some(member) = self.node(child) else {
                continue;
            };
            match member.kind {
                CursorKind::Constructor | CursorKind::Destructor => return false,
                CursorKind::CXXMethod if member.flags.is_virtual => return false,
                CursorKind::CXXBaseSpecifier => {
                    let base = self.referenced_of(child);
                    if !self.kind_of(base).is_class() || !self.record_is_pod(base, depth + 1) {
                        return false;
                    }
                }
                CursorKind::FieldDecl => {
                    if field_access.is_some_and(|a| a != member.access) {
                        return false;
                    }
                    field_access = Some(member.access);
                    if !self.type_at_depth(child, depth + 1).canonical().is_pod {
                        return false;
                    }
                }
                _ => {}
            }
        }
        true
    }

    fn enum_type(&self, id: NodeId) -> CxType {
        if self.kind_of(id) != CursorKind::EnumDecl {
            return CxType::invalid();
        }
        let mut ty = CxType::named(TypeKind::Enum, self.qualified_name(id));
        ty.declaration = Some(id);
        ty
    }

    fn typedef_type(&self, id: NodeId, depth: usize) -> CxType {
        let under = self.declared_type(id, depth + 1);
        let mut ty = CxType::named(TypeKind::Typedef, self.qualified_name(id));
        ty.is_pod = under.canonical().is_pod;
        ty.underlying = Some(Box::new(under));
        ty.declaration = Some(id);
        ty
    }

    // ========================================================================
    // Declared types
    // ========================================================================

    /// Type of a declarator-based declaration
    fn declared_type(&self, id: NodeId, depth: usize) -> CxType {
        let Some(data) = self.node(id) else {
            return CxType::invalid();
        };
        let Some(decl) = self.decl_syntax(id) else {
            return CxType::invalid();
        };
        let file = data.file;
        let text = self.files[file].text.as_str();

        if matches!(data.kind, CursorKind::TypeAliasDecl) || decl.kind() == "alias_declaration" {
            return decl
                .child_by_field_name("type")
                .map_or_else(CxType::invalid, |t| self.descriptor_type(id, file, t, depth));
        }

        let declarator = if data.decl == Some(data.syntax) {
            decl.child_by_field_name("declarator")
        } else {
            self.syntax(id)
        };
        let is_function = data.kind.is_function();

        let mut base = match data.kind {
            CursorKind::Constructor | CursorKind::Destructor => CxType::builtin(TypeKind::Void, "void"),
            _ => self.specifier_type(id, file, decl, depth),
        };
        if data.specifiers.is_constexpr && !is_function {
            base = base.with_qualifiers(true, false, false);
        }
        if base.kind == TypeKind::Auto && !is_function {
            base = self.deduce(id, file, decl, declarator, base, depth);
        }

        let mut ty = match declarator {
            Some(d) => self.apply_declarator(id, file, d, base, depth),
            None => base,
        };
        if data.kind == CursorKind::ParmDecl {
            ty = decay(ty);
        }
        if is_function && !ty.kind.is_function() {
            // a declarator tree-sitter could not split into name and parameters
            tracing::trace!(name = %data.spelling, text = %node_text(&decl, text), "function without declarator");
        }
        ty
    }

    /// Base type named by a declaration's specifiers, with its cv-qualifiers
    fn specifier_type(&self, from: NodeId, file: usize, holder: Node, depth: usize) -> CxType {
        let text = self.files[file].text.as_str();
        let ty = match holder.child_by_field_name("type") {
            Some(t) => self.type_specifier(from, file, t, depth),
            None => CxType::builtin(TypeKind::Int, "int"),
        };
        let (c, v, r) = qualifiers(&holder, text);
        if c || v || r {
            ty.with_qualifiers(c, v, r)
        } else {
            ty
        }
    }

    fn type_specifier(&self, from: NodeId, file: usize, node: Node, depth: usize) -> CxType {
        let text = self.files[file].text.as_str();
        let spelled = collapse_whitespace(node_text(&node, text));
        match node.kind() {
            "primitive_type" | "sized_type_specifier" => builtin_from_words(&spelled)
                .or_else(|| well_known(&spelled))
                .unwrap_or_else(|| CxType::named(TypeKind::Unexposed, spelled)),
            "type_identifier" | "qualified_identifier" | "template_type" => {
                self.named_type(from, file, node, depth)
            }
            "struct_specifier" | "class_specifier" | "union_specifier" | "enum_specifier" => {
                self.tag_type(from, file, node, depth)
            }
            "placeholder_type_specifier" | "auto" => CxType::named(TypeKind::Auto, "auto"),
            "type_descriptor" => self.descriptor_type(from, file, node, depth),
            _ => CxType::named(TypeKind::Unexposed, spelled),
        }
    }

    fn tag_type(&self, from: NodeId, file: usize, node: Node, depth: usize) -> CxType {
        if is_tag_declaration(&node) {
            let declared = self
                .nodes_for(file, &node)
                .iter()
                .copied()
                .find(|id| self.kind_of(*id).is_class() || self.kind_of(*id) == CursorKind::EnumDecl);
            if let Some(decl) = declared {
                return self.type_at_depth(decl, depth + 1);
            }
        }
        match node.child_by_field_name("name") {
            Some(name) => self.named_type(from, file, name, depth),
            None => CxType::named(TypeKind::Unexposed, collapse_whitespace(node_text(&node, self.files[file].text.as_str()))),
        }
    }

    /// Type named by an identifier, resolved through name lookup
    fn named_type(&self, from: NodeId, file: usize, node: Node, depth: usize) -> CxType {
        let text = self.files[file].text.as_str();
        let spelled = collapse_whitespace(node_text(&node, text));
        let path = self.name_path(file, node);
        let found = self
            .lookup_path(from, &path, Want::Type, depth)
            .first()
            .copied()
            .unwrap_or(NodeId::NULL);

        let kind = self.kind_of(found);
        match kind {
            _ if found.is_null() => path
                .last()
                .and_then(|last| well_known(last))
                .unwrap_or_else(|| CxType::named(TypeKind::Unexposed, spelled)),
            k if k.is_class() && node.kind() == "template_type" => {
                let args = node
                    .child_by_field_name("arguments")
                    .map(|a| collapse_whitespace(node_text(&a, text)))
                    .unwrap_or_default();
                let mut ty = CxType::named(TypeKind::Unexposed, format!("{}{}", self.qualified_name(found), args));
                ty.declaration = Some(found);
                ty
            }
            CursorKind::ClassTemplate => {
                let mut ty = CxType::named(TypeKind::Unexposed, self.qualified_name(found));
                ty.declaration = Some(found);
                ty
            }
            k if k.is_class() => self.record_type(found, depth + 1),
            CursorKind::EnumDecl => self.enum_type(found),
            CursorKind::TypedefDecl | CursorKind::TypeAliasDecl => self.typedef_type(found, depth + 1),
            _ => CxType::named(TypeKind::Unexposed, spelled),
        }
    }

    /// Type written as a type-id (`const int *`, `void (*)(int)`)
    fn descriptor_type(&self, from: NodeId, file: usize, descriptor: Node, depth: usize) -> CxType {
        let base = self.specifier_type(from, file, descriptor, depth);
        match descriptor.child_by_field_name("declarator") {
            Some(d) => self.apply_declarator(from, file, d, base, depth),
            None => base,
        }
    }

    fn apply_declarator(&self, from: NodeId, file: usize, d: Node, base: CxType, depth: usize) -> CxType {
        let text = self.files[file].text.as_str();
        let (ty, inner) = match d.kind() {
            "init_declarator" => (base, d.child_by_field_name("declarator")),
            "pointer_declarator" | "abstract_pointer_declarator" => {
                let (c, v, r) = qualifiers(&d, text);
                let ty = CxType::pointer_to(base).with_qualifiers(c, v, r);
                (ty, d.child_by_field_name("declarator"))
            }
            "reference_declarator" | "abstract_reference_declarator" => {
                let rvalue = d.child(0).is_some_and(|op| node_text(&op, text) == "&&");
                (CxType::reference_to(base, rvalue), inner_declarator(&d))
            }
            "array_declarator" | "abstract_array_declarator" => {
                let bound = d
                    .child_by_field_name("size")
                    .map(|s| collapse_whitespace(node_text(&s, text)));
                (CxType::array_of(base, bound), d.child_by_field_name("declarator"))
            }
            "function_declarator" | "abstract_function_declarator" => (
                self.function_type(from, file, d, base, depth),
                d.child_by_field_name("declarator"),
            ),
            "parenthesized_declarator" | "abstract_parenthesized_declarator" | "attributed_declarator" => {
                (base, inner_declarator(&d))
            }
            _ => (base, None),
        };
        match inner {
            Some(inner) if inner.id() != d.id() => self.apply_declarator(from, file, inner, ty, depth),
            _ => ty,
        }
    }

    fn function_type(&self, from: NodeId, file: usize, fdecl: Node, result: CxType, depth: usize) -> CxType {
        let text = self.files[file].text.as_str();
        let mut params = Vec::new();
        let mut is_variadic = false;
        let mut written = false;
        if let Some(list) = fdecl.child_by_field_name("parameters") {
            is_variadic = has_token(&list, text, "...");
            let mut cursor = list.walk();
            for p in list.named_children(&mut cursor) {
                match p.kind() {
                    "parameter_declaration" | "optional_parameter_declaration" | "variadic_parameter_declaration" => {
                        written = true;
                        let declarator = p.child_by_field_name("declarator");
                        let base = self.specifier_type(from, file, p, depth);
                        if declarator.is_none() && base.kind == TypeKind::Void {
                            continue;
                        }
                        let ty = match declarator {
                            Some(d) => self.apply_declarator(from, file, d, base, depth),
                            None => base,
                        };
                        params.push(decay(ty));
                    }
                    _ => {}
                }
            }
        }

        let result = match find_child_by_kind(&fdecl, "trailing_return_type") {
            Some(trailing) if result.kind == TypeKind::Auto => find_child_by_kind(&trailing, "type_descriptor")
                .map_or(result, |t| self.descriptor_type(from, file, t, depth)),
            _ => result,
        };
        let prototyped = self.language != LanguageId::C || written || is_variadic;
        let (c, v, r) = qualifiers(&fdecl, text);
        let mut ty = CxType::function(result, params, is_variadic, prototyped);
        ty.ref_qualifier = match find_child_by_kind(&fdecl, "ref_qualifier").map(|q| node_text(&q, text)) {
            Some("&") => RefQualifier::LValue,
            Some("&&") => RefQualifier::RValue,
            _ => RefQualifier::None,
        };
        ty.with_qualifiers(c, v, r)
    }

    /// Deduce `auto` from the initializer; the declarator's own pointer and
    /// reference layers are peeled off the initializer's type first
    fn deduce(&self, id: NodeId, file: usize, decl: Node, declarator: Option<Node>, auto: CxType, depth: usize) -> CxType {
        let init = if decl.kind() == "for_range_loop" {
            decl.child_by_field_name("right")
                .map(|r| self.expression_for(file, &r))
                .map(|e| {
                    let range = self.type_at_depth(e, depth + 1).non_reference().canonical();
                    range.element.map(|el| *el).unwrap_or_default()
                })
        } else {
            declarator
                .filter(|d| d.kind() == "init_declarator")
                .and_then(|d| d.child_by_field_name("value"))
                .map(|v| self.expression_for(file, &v))
                .filter(|e| !e.is_null() && *e != id)
                .map(|e| self.type_at_depth(e, depth + 1))
        };
        let Some(init) = init.filter(CxType::is_valid) else {
            return auto;
        };

        let mut deduced = decay(init.non_reference());
        let mut layer = declarator.and_then(|d| match d.kind() {
            "init_declarator" => d.child_by_field_name("declarator"),
            _ => Some(d),
        });
        while let Some(d) = layer {
            match d.kind() {
                "pointer_declarator" => {
                    deduced = deduced.pointee().cloned().unwrap_or(deduced);
                    layer = d.child_by_field_name("declarator");
                }
                "reference_declarator" => layer = inner_declarator(&d),
                _ => break,
            }
        }
        let deduced = unqualified(deduced);

        let mut ty = CxType::named(TypeKind::Auto, deduced.spelling.clone());
        ty.is_pod = deduced.is_pod;
        ty.declaration = deduced.declaration;
        ty.underlying = Some(Box::new(deduced));
        ty.with_qualifiers(auto.is_const, auto.is_volatile, auto.is_restrict)
    }

    // ========================================================================
    // Expression types
    // ========================================================================

    fn operands(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).map_or_else(Vec::new, |n| {
            n.children
                .iter()
                .copied()
                .filter(|c| self.kind_of(*c).is_expression())
                .collect()
        })
    }

    fn operand_type(&self, id: NodeId, index: usize, depth: usize) -> CxType {
        self.operands(id)
            .get(index)
            .map_or_else(CxType::invalid, |op| self.type_at_depth(*op, depth + 1))
    }

    fn truth_type(&self) -> CxType {
        match self.language {
            LanguageId::C => CxType::builtin(TypeKind::Int, "int"),
            _ => CxType::builtin(TypeKind::Bool, "bool"),
        }
    }

    fn promote(ty: CxType) -> CxType {
        let canonical = ty.canonical();
        if arithmetic_rank(canonical.kind) > 1 || canonical.kind == TypeKind::Int {
            unqualified(canonical)
        } else if canonical.kind.is_builtin() || canonical.kind == TypeKind::Enum {
            CxType::builtin(TypeKind::Int, "int")
        } else {
            ty
        }
    }

    fn operator_text(&self, id: NodeId) -> String {
        let (Some(syntax), Some(source)) = (self.syntax(id), self.source(id)) else {
            return String::new();
        };
        syntax
            .child_by_field_name("operator")
            .map(|op| source.text_of(&op).to_string())
            .unwrap_or_default()
    }

    fn expression_type(&self, id: NodeId, depth: usize) -> CxType {
        let Some(data) = self.node(id) else {
            return CxType::invalid();
        };
        let Some(source) = self.source(id) else {
            return CxType::invalid();
        };
        let syntax = self.syntax(id);
        let text = syntax.map(|s| source.text_of(&s).to_string()).unwrap_or_default();

        match data.kind {
            CursorKind::IntegerLiteral => {
                let suffix: String = text
                    .trim_start_matches(|c: char| c.is_ascii_hexdigit() || c == 'x' || c == 'X' || c == '\'')
                    .to_ascii_lowercase();
                let unsigned = suffix.contains('u');
                let longs = suffix.matches('l').count();
                let words = match (unsigned, longs) {
                    (true, 0) => "unsigned int",
                    (false, 0) => "int",
                    (true, 1) => "unsigned long",
                    (false, 1) => "long",
                    (true, _) => "unsigned long long",
                    (false, _) => "long long",
                };
                builtin_from_words(words).unwrap_or_default()
            }
            CursorKind::FloatingLiteral | CursorKind::ImaginaryLiteral => {
                let lower = text.to_ascii_lowercase();
                let hex = lower.starts_with("0x");
                if lower.ends_with('f') && !hex {
                    CxType::builtin(TypeKind::Float, "float")
                } else if lower.ends_with('l') {
                    CxType::builtin(TypeKind::LongDouble, "long double")
                } else {
                    CxType::builtin(TypeKind::Double, "double")
                }
            }
            CursorKind::FixedPointLiteral => fixed_point_type(&text),
            CursorKind::CharacterLiteral => match text.split('\'').next().unwrap_or("") {
                "L" => CxType::builtin(TypeKind::WChar, "wchar_t"),
                "u" => CxType::builtin(TypeKind::Char16, "char16_t"),
                "U" => CxType::builtin(TypeKind::Char32, "char32_t"),
                _ if self.language == LanguageId::C => CxType::builtin(TypeKind::Int, "int"),
                _ => CxType::builtin(TypeKind::CharS, "char"),
            },
            CursorKind::StringLiteral => {
                let pieces: Vec<&str> = match syntax {
                    Some(s) if s.kind() == "concatenated_string" => {
                        let mut cursor = s.walk();
                        let pieces: Vec<&str> = s
                            .named_children(&mut cursor)
                            .filter(|c| c.kind().ends_with("string_literal"))
                            .map(|c| source.text_of(&c))
                            .collect();
                        pieces
                    }
                    _ => vec![text.as_str()],
                };
                let length: usize = pieces.iter().map(|p| string_length(p) - 1).sum::<usize>() + 1;
                let element = match text.split('"').next().unwrap_or("").trim_end_matches('R') {
                    "L" => CxType::builtin(TypeKind::WChar, "wchar_t"),
                    "u" => CxType::builtin(TypeKind::Char16, "char16_t"),
                    "U" => CxType::builtin(TypeKind::Char32, "char32_t"),
                    _ => CxType::builtin(TypeKind::CharS, "char"),
                };
                let element = element.with_qualifiers(self.language != LanguageId::C, false, false);
                CxType::array_of(element, Some(length.to_string()))
            }
            CursorKind::CXXBoolLiteralExpr => CxType::builtin(TypeKind::Bool, "bool"),
            CursorKind::CXXNullPtrLiteralExpr => CxType::builtin(TypeKind::NullPtr, "std::nullptr_t"),
            CursorKind::CXXThisExpr => {
                let mut owner = data.parent;
                while let Some(n) = self.node(owner) {
                    if n.kind.is_function() {
                        break;
                    }
                    owner = n.parent;
                }
                let class = self.node(owner).map_or(NodeId::NULL, |n| n.semantic_parent);
                if !self.kind_of(class).is_class() {
                    return CxType::invalid();
                }
                let is_const = self.type_at_depth(owner, depth + 1).is_const;
                CxType::pointer_to(self.record_type(class, depth + 1).with_qualifiers(is_const, false, false))
            }
            CursorKind::ParenExpr => self.operand_type(id, 0, depth),
            CursorKind::UnaryOperator => {
                let operand = self.operand_type(id, 0, depth);
                let op = self.operator_text(id);
                match op.as_str() {
                    "&" => CxType::pointer_to(operand),
                    "*" => operand
                        .canonical()
                        .pointee()
                        .cloned()
                        .unwrap_or_else(CxType::invalid),
                    "!" => self.truth_type(),
                    "++" | "--" => operand,
                    _ => Self::promote(operand),
                }
            }
            CursorKind::BinaryOperator => {
                let op = self.operator_text(id);
                let lhs = self.operand_type(id, 0, depth);
                let rhs = self.operand_type(id, 1, depth);
                match op.as_str() {
                    "==" | "!=" | "<" | ">" | "<=" | ">=" | "&&" | "||" | "and" | "or" => self.truth_type(),
                    "=" => lhs,
                    "<<" | ">>" => Self::promote(lhs),
                    "," | "" => rhs,
                    _ => {
                        let (l, r) = (lhs.canonical(), rhs.canonical());
                        match (l.kind, r.kind) {
                            (TypeKind::Pointer, TypeKind::Pointer) => CxType::builtin(TypeKind::Long, "long"),
                            (TypeKind::Pointer, _) => lhs,
                            (_, TypeKind::Pointer) => rhs,
                            _ if l.kind.is_array() => decay(l),
                            _ if arithmetic_rank(l.kind) >= arithmetic_rank(r.kind) => Self::promote(lhs),
                            _ => Self::promote(rhs),
                        }
                    }
                }
            }
            CursorKind::CompoundAssignOperator => self.operand_type(id, 0, depth),
            CursorKind::ConditionalOperator => self.operand_type(id, 1, depth),
            CursorKind::CStyleCastExpr | CursorKind::CXXStaticCastExpr | CursorKind::UnexposedExpr => {
                let descriptor = syntax.and_then(|s| {
                    s.child_by_field_name("type").or_else(|| {
                        s.child_by_field_name("function")
                            .and_then(|f| f.child_by_field_name("arguments"))
                            .and_then(|a| find_child_by_kind(&a, "type_descriptor"))
                    })
                });
                descriptor.map_or_else(CxType::invalid, |d| self.descriptor_type(id, data.file, d, depth))
            }
            CursorKind::ArraySubscriptExpr => {
                let base = self.operand_type(id, 0, depth).canonical();
                base.element.map(|e| *e).unwrap_or_else(CxType::invalid)
            }
            CursorKind::UnaryExpr => CxType::builtin(TypeKind::ULong, "unsigned long"),
            CursorKind::CXXNewExpr => {
                let Some(s) = syntax else {
                    return CxType::invalid();
                };
                let base = s
                    .child_by_field_name("type")
                    .map_or_else(CxType::invalid, |t| self.type_specifier(id, data.file, t, depth));
                let ty = match s.child_by_field_name("declarator") {
                    Some(d) => self.apply_declarator(id, data.file, d, base, depth),
                    None => base,
                };
                match ty.kind {
                    k if k.is_array() => decay(ty),
                    _ => CxType::pointer_to(ty),
                }
            }
            CursorKind::CXXDeleteExpr | CursorKind::CXXThrowExpr => CxType::builtin(TypeKind::Void, "void"),
            CursorKind::CallExpr => {
                let target = self.referenced_of(id);
                match self.kind_of(target) {
                    CursorKind::Constructor => {
                        let class = self.node(target).map_or(NodeId::NULL, |n| n.semantic_parent);
                        self.record_type(class, depth + 1)
                    }
                    k if k.is_class() => self.record_type(target, depth + 1),
                    k if k.is_function() => self
                        .type_at_depth(target, depth + 1)
                        .result
                        .map(|r| *r)
                        .unwrap_or_else(CxType::invalid),
                    _ => {
                        let callee = self.operand_type(id, 0, depth).canonical();
                        let callee = callee.pointee().cloned().unwrap_or(callee);
                        callee.result.map(|r| *r).unwrap_or_else(CxType::invalid)
                    }
                }
            }
            CursorKind::DeclRefExpr | CursorKind::MemberRefExpr => {
                let target = self.referenced_of(id);
                if target.is_null() || target == id {
                    return CxType::invalid();
                }
                self.type_at_depth(target, depth + 1).non_reference()
            }
            CursorKind::LambdaExpr => {
                let at = self
                    .location_at(data.file, data.anchor)
                    .map(|l| format!("{}:{}:{}", l.file.display(), l.line, l.column))
                    .unwrap_or_default();
                CxType::named(TypeKind::Record, format!("(lambda at {})", at))
            }
            _ => CxType::invalid(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{at, unit};
    use super::*;
    use crate::provider::TranslationUnit;

    fn spelled(source: &str, needle: &str) -> String {
        let u = unit(source);
        u.cursor_type(at(&u, needle)).spelling
    }

    // =========================================================================
    // Helper Tests
    // =========================================================================

    #[test]
    fn test_builtin_words() {
        assert_eq!(builtin_from_words("unsigned").unwrap().kind, TypeKind::UInt);
        assert_eq!(builtin_from_words("long long int").unwrap().spelling, "long long");
        assert_eq!(builtin_from_words("unsigned char").unwrap().kind, TypeKind::UChar);
        assert_eq!(builtin_from_words("long double").unwrap().kind, TypeKind::LongDouble);
        assert!(builtin_from_words("size_t").is_none());
    }

    #[test]
    fn test_fixed_point_suffixes() {
        assert_eq!(fixed_point_type("0.5k").kind, TypeKind::Accum);
        assert_eq!(fixed_point_type("0.5hk").spelling, "short _Accum");
        assert_eq!(fixed_point_type("0.5ulk").kind, TypeKind::ULongAccum);
        let fract = fixed_point_type("0.25uhr");
        assert_eq!(fract.spelling, "unsigned short _Fract");
        assert!(fract.is_pod);
    }

    #[test]
    fn test_string_length() {
        assert_eq!(string_length("\"hi\""), 3);
        assert_eq!(string_length("\"a\\nb\""), 4);
        assert_eq!(string_length("\"\\x41\\0\""), 3);
        assert_eq!(string_length("R\"(ab)\""), 3);
    }

    // =========================================================================
    // Declared Type Tests
    // =========================================================================

    #[test]
    fn test_variable_types() {
        assert_eq!(spelled("int *p;", "p;"), "int *");
        assert_eq!(spelled("const char *s;", "s;"), "const char *");
        assert_eq!(spelled("int a[3];", "a["), "int [3]");
        assert_eq!(spelled("int (*fp)(int, char);", "fp"), "int (*)(int, char)");
        assert_eq!(spelled("unsigned long n;", "n;"), "unsigned long");
        assert_eq!(spelled("constexpr int k = 1;", "k ="), "const int");
    }

    #[test]
    fn test_function_types() {
        assert_eq!(spelled("int f(int x, char c);", "f("), "int (int, char)");
        assert_eq!(spelled("void g(int a[]);", "g("), "void (int *)");
        assert_eq!(spelled("int printf(const char *, ...);", "printf"), "int (const char *, ...)");
        assert_eq!(
            spelled("struct S { int get() const; };", "get"),
            "int () const"
        );
        assert_eq!(spelled("auto h() -> long;", "h("), "long ()");
    }

    #[test]
    fn test_constructor_type() {
        assert_eq!(spelled("struct D { D(int); };", "D(int"), "void (int)");
    }

    #[test]
    fn test_record_and_typedef_types() {
        let u = unit("namespace ns { struct T { int a; }; }\ntypedef ns::T Alias;\nAlias value;\n");
        let value = u.cursor_type(at(&u, "value"));
        assert_eq!(value.kind, TypeKind::Typedef);
        assert_eq!(value.spelling, "Alias");
        let canonical = u.canonical_type(&value);
        assert_eq!(canonical.kind, TypeKind::Record);
        assert_eq!(canonical.spelling, "ns::T");
        assert!(canonical.is_pod);
    }

    #[test]
    fn test_non_pod_record() {
        let u = unit("struct V { virtual void f(); };\nV v;\n");
        assert!(!u.cursor_type(at(&u, "v;")).is_pod);
    }

    #[test]
    fn test_well_known_typedef() {
        let u = unit("size_t n;");
        let ty = u.cursor_type(at(&u, "n;"));
        assert_eq!(ty.spelling, "size_t");
        assert_eq!(u.canonical_type(&ty).spelling, "unsigned long");
    }

    #[test]
    fn test_auto_deduction() {
        let u = unit("int x = 1;\nauto a = x;\nconst auto &r = x;\nauto *p = &x;\n");
        assert_eq!(u.cursor_type(at(&u, "a =")).spelling, "int");
        assert_eq!(u.cursor_type(at(&u, "r =")).spelling, "const int &");
        assert_eq!(u.cursor_type(at(&u, "p =")).spelling, "int *");
    }

    #[test]
    fn test_enum_constant_type() {
        let u = unit("enum Color { Red, Green };");
        let red = u.cursor_type(at(&u, "Red"));
        assert_eq!(red.kind, TypeKind::Enum);
        assert_eq!(red.spelling, "Color");
    }

    // =========================================================================
    // Expression Type Tests
    // =========================================================================

    #[test]
    fn test_literal_types() {
        let u = unit("auto a = 42u;\nauto b = 1.5f;\nauto c = \"abc\";\nauto d = 'x';\nauto e = true;\n");
        assert_eq!(u.cursor_type(at(&u, "42u")).spelling, "unsigned int");
        assert_eq!(u.cursor_type(at(&u, "1.5f")).spelling, "float");
        assert_eq!(u.cursor_type(at(&u, "\"abc\"")).spelling, "const char [4]");
        assert_eq!(u.cursor_type(at(&u, "'x'")).spelling, "char");
        assert_eq!(u.cursor_type(at(&u, "true")).spelling, "bool");
        assert_eq!(u.cursor_type(at(&u, "c =")).spelling, "const char *");
    }

    #[test]
    fn test_operator_types() {
        let u = unit("int f(long l, int i, int *p) {\n  return (l + i) > 0 && p[i] == *p;\n}\n");
        assert_eq!(u.cursor_type(at(&u, "+ i")).spelling, "long");
        assert_eq!(u.cursor_type(at(&u, "> 0")).spelling, "bool");
        assert_eq!(u.cursor_type(at(&u, "[i]")).spelling, "int");
    }

    #[test]
    fn test_call_and_member_types() {
        let u = unit(
            "struct S { double d; double get(); };\nS make();\nvoid use() {\n  make().get();\n}\n",
        );
        assert_eq!(u.cursor_type(at(&u, "().get")).spelling, "S");
        assert_eq!(u.cursor_type(at(&u, "();\n}")).spelling, "double");
    }

    #[test]
    fn test_this_type() {
        let u = unit("struct S {\n  int n;\n  int get() const { return this->n; }\n};\n");
        assert_eq!(u.cursor_type(at(&u, "this")).spelling, "const S *");
    }
}
