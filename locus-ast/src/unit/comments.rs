//! Documentation comments attached to declarations

use super::CppTranslationUnit;
use crate::ir::NodeId;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BRIEF_COMMAND: Regex = Regex::new(r"[\\@]brief\b\s*").unwrap();
    static ref BLOCK_LINE_PREFIX: Regex = Regex::new(r"^\s*\*+\s?").unwrap();
}

fn is_doc_comment(text: &str) -> bool {
    (text.starts_with("///") && !text.starts_with("////"))
        || text.starts_with("//!")
        || (text.starts_with("/**") && !text.starts_with("/**/") && !text.starts_with("/***"))
        || text.starts_with("/*!")
}

/// Comment body lines with the comment markers removed
fn strip_markers(comment: &str) -> Vec<String> {
    if let Some(body) = comment.strip_prefix("/**").or_else(|| comment.strip_prefix("/*!")) {
        let body = body.strip_suffix("*/").unwrap_or(body);
        return body
            .lines()
            .map(|line| BLOCK_LINE_PREFIX.replace(line, "").into_owned())
            .collect();
    }
    comment
        .lines()
        .map(|line| {
            let line = line.trim_start();
            line.strip_prefix("///")
                .or_else(|| line.strip_prefix("//!"))
                .unwrap_or(line)
                .trim_start_matches('<')
                .to_string()
        })
        .collect()
}

/// First paragraph of a doc comment, or the `\brief` paragraph when there is
/// one, with whitespace collapsed
fn brief_text(comments: &[&str]) -> Option<String> {
    let joined = comments
        .iter()
        .flat_map(|c| strip_markers(c))
        .collect::<Vec<_>>()
        .join("\n");
    let text = match BRIEF_COMMAND.find(&joined) {
        Some(m) => &joined[m.end()..],
        None => joined.as_str(),
    };
    let paragraph: Vec<&str> = text
        .lines()
        .map(str::trim)
        .skip_while(|l| l.is_empty())
        .take_while(|l| !l.is_empty() && !l.starts_with('@') && !l.starts_with('\\'))
        .collect();
    let brief = paragraph.join(" ").split_whitespace().collect::<Vec<_>>().join(" ");
    (!brief.is_empty()).then_some(brief)
}

impl CppTranslationUnit {
    /// Brief comment of a declaration; falls back to the first declaration
    /// and then the definition when the cursor itself has none
    pub(crate) fn brief_of(&self, id: NodeId) -> Option<String> {
        if !self.kind_of(id).is_declaration() {
            return None;
        }
        self.attached_comment(id)
            .or_else(|| {
                let canonical = self.canonical_of(id);
                (canonical != id).then(|| self.attached_comment(canonical)).flatten()
            })
            .or_else(|| {
                let definition = self.definition_of(id);
                (!definition.is_null() && definition != id)
                    .then(|| self.attached_comment(definition))
                    .flatten()
            })
    }

    /// Doc comments directly above the declaration, at most one line break
    /// away; runs of line comments are merged
    fn attached_comment(&self, id: NodeId) -> Option<String> {
        let data = self.node(id)?;
        let source = self.files.get(data.file)?;
        let start = data.extent.0;
        let root = source.tree.root_node();

        let mut current = root.descendant_for_byte_range(start, start)?;
        while let Some(parent) = current.parent() {
            if parent.start_byte() != start || parent.id() == root.id() {
                break;
            }
            current = parent;
        }

        let mut comments = Vec::new();
        let mut boundary = start;
        let mut sibling = current.prev_sibling();
        while let Some(node) = sibling {
            if node.kind() != "comment" {
                break;
            }
            let gap = source.text.get(node.end_byte()..boundary).unwrap_or("");
            if !gap.trim().is_empty() || gap.matches('\n').count() > 1 {
                break;
            }
            let text = source.text_of(&node);
            if !is_doc_comment(text) {
                break;
            }
            comments.push(text);
            if text.starts_with("/*") {
                break;
            }
            boundary = node.start_byte();
            sibling = node.prev_sibling();
        }
        comments.reverse();
        if comments.is_empty() {
            return None;
        }
        brief_text(&comments)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{at, unit};
    use super::*;
    use crate::provider::TranslationUnit;

    #[test]
    fn test_doc_comment_markers() {
        assert!(is_doc_comment("/// text"));
        assert!(is_doc_comment("//! text"));
        assert!(is_doc_comment("/** text */"));
        assert!(is_doc_comment("/*! text */"));
        assert!(!is_doc_comment("// text"));
        assert!(!is_doc_comment("/* text */"));
        assert!(!is_doc_comment("//// banner"));
        assert!(!is_doc_comment("/**/"));
    }

    #[test]
    fn test_brief_text() {
        assert_eq!(brief_text(&["/// This is foo."]).unwrap(), "This is foo.");
        assert_eq!(
            brief_text(&["/**\n * First line\n * continues.\n *\n * Details.\n */"]).unwrap(),
            "First line continues."
        );
        assert_eq!(
            brief_text(&["/// Summary", "/// \\brief Short one.", "/// @param x ignored"]).unwrap(),
            "Short one."
        );
        assert!(brief_text(&["///"]).is_none());
    }

    #[test]
    fn test_brief_comment_on_declaration() {
        let u = unit("/// This is foo.\nvoid foo();\n\n// plain\nvoid bar();\n");
        assert_eq!(u.brief_comment(at(&u, "foo();")).as_deref(), Some("This is foo."));
        assert_eq!(u.brief_comment(at(&u, "bar();")), None);
    }

    #[test]
    fn test_brief_comment_detached_by_blank_line() {
        let u = unit("/// Far away.\n\n\nint x;\n");
        assert_eq!(u.brief_comment(at(&u, "x;")), None);
    }

    #[test]
    fn test_brief_comment_from_declaration_for_definition() {
        let u = unit("struct S {\n  /// Gets it.\n  int get();\n};\nint S::get() { return 0; }\n");
        let def = at(&u, "get() {");
        assert_eq!(u.brief_comment(def).as_deref(), Some("Gets it."));
    }

    #[test]
    fn test_no_brief_for_expressions() {
        let u = unit("/// Value.\nint x = 1;\n");
        assert_eq!(u.brief_comment(at(&u, "1;")), None);
    }
}
