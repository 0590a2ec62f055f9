//! Adapter Registry
//!
//! Maps languages to grammar adapters and decides which language a parse
//! request is in.

use crate::adapters::{CTreeSitterAdapter, CppTreeSitterAdapter, LanguageAdapter};
use crate::ir::LanguageId;
use std::collections::BTreeMap;
use std::path::Path;

/// Registry of language adapters
pub struct AdapterRegistry {
    adapters: BTreeMap<LanguageId, Box<dyn LanguageAdapter>>,
}

impl AdapterRegistry {
    /// Create a new registry with the C and C++ adapters
    pub fn new() -> Self {
        let mut registry = Self {
            adapters: BTreeMap::new(),
        };
        registry.register(Box::new(CppTreeSitterAdapter::new()));
        registry.register(Box::new(CTreeSitterAdapter::new()));
        registry
    }

    /// Register a language adapter
    pub fn register(&mut self, adapter: Box<dyn LanguageAdapter>) {
        self.adapters.insert(adapter.language(), adapter);
    }

    /// Get an adapter for a language
    pub fn get(&self, language: LanguageId) -> Option<&dyn LanguageAdapter> {
        self.adapters.get(&language).map(|a| a.as_ref())
    }

    /// Get supported languages
    pub fn supported_languages(&self) -> Vec<LanguageId> {
        self.adapters.keys().copied().collect()
    }

    /// Check if a language is supported
    pub fn supports(&self, language: LanguageId) -> bool {
        self.adapters.contains_key(&language)
    }

    /// Language of a translation unit: the last `-x` flag wins, then the
    /// main file's extension; anything unrecognised is parsed as C++
    pub fn detect(&self, file: &Path, args: &[String]) -> LanguageId {
        let mut forced = None;
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if arg == "-x" {
                forced = iter.next().map(|v| LanguageId::from_flag(v));
            } else if let Some(value) = arg.strip_prefix("-x") {
                forced = Some(LanguageId::from_flag(value));
            }
        }
        if let Some(language) = forced {
            return language;
        }
        match LanguageId::from_path(file) {
            LanguageId::Unknown => LanguageId::Cpp,
            language => language,
        }
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
