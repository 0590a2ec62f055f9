//! C and C++ grammars

use super::LanguageAdapter;
use crate::ir::LanguageId;

/// C++ adapter (also used for headers of unknown flavour)
pub struct CppTreeSitterAdapter;

impl CppTreeSitterAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CppTreeSitterAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAdapter for CppTreeSitterAdapter {
    fn language(&self) -> LanguageId {
        LanguageId::Cpp
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_cpp::LANGUAGE.into()
    }
}

/// C adapter
pub struct CTreeSitterAdapter;

impl CTreeSitterAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CTreeSitterAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAdapter for CTreeSitterAdapter {
    fn language(&self) -> LanguageId {
        LanguageId::C
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_c::LANGUAGE.into()
    }
}
