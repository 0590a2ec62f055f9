//! Record fragments for cursors, types, locations and ranges
//!
//! Each function renders one fragment in a fixed key order. Fragments end in
//! a trailing comma unless noted, so they concatenate into a record body.
//! Facts that do not apply are left out entirely.

use crate::formats::VimsonWriter;
use locus_ast::{Cursor, CursorKind, CxType, KindClass, RefQualifier, SourceLocation, SourceRange};

/// `'line':L,'column':C,'offset':O,'file':'path',`
///
/// A missing location renders as zeros with an empty file, the way a null
/// location reads back.
pub fn location(loc: Option<&SourceLocation>) -> String {
    let mut w = VimsonWriter::new();
    match loc {
        Some(loc) => w
            .integer("line", loc.line)
            .integer("column", loc.column)
            .integer("offset", loc.offset)
            .string("file", &loc.file.to_string_lossy()),
        None => w
            .integer("line", 0)
            .integer("column", 0)
            .integer("offset", 0)
            .string("file", ""),
    };
    w.finish()
}

fn start_end(range: &SourceRange) -> String {
    let mut w = VimsonWriter::new();
    w.open_key("start")
        .raw(&location(Some(&range.start)))
        .close_record()
        .comma()
        .open_key("end")
        .raw(&location(Some(&range.end)))
        .close_record();
    w.finish()
}

/// `'range':{'start':{..},'end':{..}},`, or nothing for a null range
pub fn range(range: Option<&SourceRange>) -> String {
    let Some(range) = range else {
        return String::new();
    };
    let mut w = VimsonWriter::new();
    w.open_key("range").raw(&start_end(range)).close_record().comma();
    w.finish()
}

/// `'start':{..},'end':{..}` without a trailing comma
pub fn extent(cursor: &Cursor<'_>) -> String {
    cursor.extent().map(|r| start_end(&r)).unwrap_or_default()
}

/// The extent inside a node record, with its trailing comma
fn extent_field(cursor: &Cursor<'_>) -> String {
    cursor
        .extent()
        .map(|r| format!("{},", start_end(&r)))
        .unwrap_or_default()
}

/// Qualifier flags that hold for a type
fn type_flags(ty: &CxType, w: &mut VimsonWriter) {
    w.flag("is_const_qualified", ty.is_const)
        .flag("is_volatile_qualified", ty.is_volatile)
        .flag("is_restrict_qualified", ty.is_restrict)
        .flag("is_POD_type", ty.is_pod);
    match ty.ref_qualifier {
        RefQualifier::LValue => {
            w.integer("is_lvalue", 1);
        }
        RefQualifier::RValue => {
            w.integer("is_rvalue", 1);
        }
        RefQualifier::None => {}
    }
}

/// `'type':'spelling','type_kind':'Kind',` plus the qualifier flags
pub fn type_fragment(ty: &CxType) -> String {
    let mut w = VimsonWriter::new();
    w.string("type", &ty.spelling).string("type_kind", ty.kind.spelling());
    type_flags(ty, &mut w);
    w.finish()
}

pub fn spell(cursor: &Cursor<'_>) -> String {
    let mut w = VimsonWriter::new();
    w.string("spell", &cursor.spelling());
    w.finish()
}

pub fn linkage(cursor: &Cursor<'_>) -> String {
    let mut w = VimsonWriter::new();
    w.string("linkage", cursor.linkage().spelling());
    w.finish()
}

/// The caller's notion of parent, then the semantic and lexical parents
pub fn parent(cursor: &Cursor<'_>, parent: &Cursor<'_>) -> String {
    let mut w = VimsonWriter::new();
    w.string("parent", &parent.spelling())
        .string("semantic_parent", &cursor.semantic_parent().spelling())
        .string("lexical_parent", &cursor.lexical_parent().spelling());
    w.finish()
}

/// Name of a kind's coarse class; empty for invalid kinds
pub fn kind_type(kind: CursorKind) -> &'static str {
    match kind.class() {
        KindClass::Invalid => "",
        class => class.name(),
    }
}

/// `'value': '<token>',` for literals: the first non-empty token spelling
fn literal_value(cursor: &Cursor<'_>) -> String {
    cursor
        .tokens()
        .into_iter()
        .find(|t| !t.spelling.is_empty())
        .map(|t| format!("'value': {},", crate::formats::quote(&t.spelling)))
        .unwrap_or_default()
}

/// Definition and member-function flags, then the access specifier
fn extra_info(cursor: &Cursor<'_>, w: &mut VimsonWriter) {
    let flags = cursor.flags();
    w.flag("is_definition", flags.is_definition)
        .flag("is_dynamic_call", flags.is_dynamic_call)
        .flag("is_variadic", flags.is_variadic)
        .flag("is_virtual_member_function", flags.is_virtual)
        .flag("is_pure_virtual_member_function", flags.is_pure_virtual)
        .flag("is_static_member_function", flags.is_static_method);
    if let Some(access) = cursor.access().spelling() {
        w.string("access_specifier", access);
    }
}

pub fn kind_info(cursor: &Cursor<'_>) -> String {
    let kind = cursor.kind();
    let mut w = VimsonWriter::new();
    w.string("kind", kind.spelling());
    if kind.is_literal() {
        w.raw(&literal_value(cursor));
    }
    let class = kind_type(kind);
    if !class.is_empty() {
        w.string("kind_type", class);
    }
    extra_info(cursor, &mut w);
    w.finish()
}

/// `'included_file':'path',` for inclusion directives that resolved
pub fn included_file(cursor: &Cursor<'_>) -> String {
    let Some(path) = cursor.included_file() else {
        return String::new();
    };
    let mut w = VimsonWriter::new();
    w.string("included_file", &path.to_string_lossy());
    w.finish()
}

/// Full node record body
pub fn cursor(cursor: &Cursor<'_>, parent_cursor: &Cursor<'_>) -> String {
    let mut w = VimsonWriter::new();
    w.raw(&spell(cursor))
        .raw(&type_fragment(&cursor.cursor_type()))
        .raw(&linkage(cursor))
        .raw(&parent(cursor, parent_cursor))
        .raw(&location(cursor.location().as_ref()))
        .raw(&kind_info(cursor))
        .raw(&extent_field(cursor))
        .raw(&included_file(cursor));
    w.finish()
}
