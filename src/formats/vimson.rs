//! Vimson writer
//!
//! Vimson is the dictionary/list literal syntax Vim script evaluates
//! directly: single-quoted strings with `'` doubled, bare integers, and
//! `'key':value,` pairs whose trailing comma Vim tolerates. Records are built
//! incrementally; the caller decides key order, the writer only owns quoting
//! and punctuation.

use std::fmt::Write;

/// The empty record
pub const EMPTY_RECORD: &str = "{}";
/// The empty list
pub const EMPTY_LIST: &str = "[]";

/// Quote a string the way Vim's single-quoted literals expect
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// Incremental builder for one vimson value
#[derive(Debug, Default, Clone)]
pub struct VimsonWriter {
    buf: String,
}

impl VimsonWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `'key':'value',`
    pub fn string(&mut self, key: &str, value: &str) -> &mut Self {
        // Writing into a String cannot fail
        let _ = write!(self.buf, "'{}':{},", key, quote(value));
        self
    }

    /// `'key':N,`
    pub fn integer(&mut self, key: &str, value: impl std::fmt::Display) -> &mut Self {
        let _ = write!(self.buf, "'{}':{},", key, value);
        self
    }

    /// `'key':1,` when `set`, nothing otherwise
    pub fn flag(&mut self, key: &str, set: bool) -> &mut Self {
        if set {
            self.integer(key, 1);
        }
        self
    }

    /// `'key':` followed by an opening brace; pair with `close_record`
    pub fn open_key(&mut self, key: &str) -> &mut Self {
        let _ = write!(self.buf, "'{}':{{", key);
        self
    }

    pub fn open_record(&mut self) -> &mut Self {
        self.buf.push('{');
        self
    }

    pub fn close_record(&mut self) -> &mut Self {
        self.buf.push('}');
        self
    }

    pub fn open_list(&mut self) -> &mut Self {
        self.buf.push('[');
        self
    }

    pub fn close_list(&mut self) -> &mut Self {
        self.buf.push(']');
        self
    }

    /// Separator between nested values
    pub fn comma(&mut self) -> &mut Self {
        self.buf.push(',');
        self
    }

    /// Append an already rendered fragment
    pub fn raw(&mut self, fragment: &str) -> &mut Self {
        self.buf.push_str(fragment);
        self
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

/// Wrap a fragment in braces
pub fn record(fragment: &str) -> String {
    format!("{{{}}}", fragment)
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Quoting Tests
    // =========================================================================

    #[test]
    fn test_quote_plain() {
        assert_eq!(quote("ns::C::foo"), "'ns::C::foo'");
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn test_quote_doubles_single_quotes() {
        assert_eq!(quote("'a'"), "'''a'''");
        assert_eq!(quote("it's"), "'it''s'");
    }

    #[test]
    fn test_quote_leaves_other_characters() {
        assert_eq!(quote("a\"b\\c"), "'a\"b\\c'");
    }

    // =========================================================================
    // Writer Tests
    // =========================================================================

    #[test]
    fn test_pairs_keep_insertion_order() {
        let mut w = VimsonWriter::new();
        w.integer("line", 3).integer("column", 9).string("file", "a.cpp");
        assert_eq!(w.as_str(), "'line':3,'column':9,'file':'a.cpp',");
    }

    #[test]
    fn test_flags_only_when_set() {
        let mut w = VimsonWriter::new();
        w.flag("is_definition", true).flag("is_variadic", false);
        assert_eq!(w.finish(), "'is_definition':1,");
    }

    #[test]
    fn test_nested_record() {
        let mut w = VimsonWriter::new();
        w.open_key("start").integer("line", 1).close_record().comma();
        assert_eq!(w.finish(), "'start':{'line':1,},");
    }

    #[test]
    fn test_list_of_records() {
        let mut w = VimsonWriter::new();
        w.open_list();
        for kind in ["a", "b"] {
            w.open_record().string("kind", kind).close_record().comma();
        }
        w.close_list();
        assert_eq!(w.finish(), "[{'kind':'a',},{'kind':'b',},]");
    }

    #[test]
    fn test_record_helper() {
        assert_eq!(record(""), EMPTY_RECORD);
        assert_eq!(record("'name':'f'"), "{'name':'f'}");
    }
}
