//! Tree-sitter syntax backend

use crate::error::{AstError, Result};
use crate::provider::{ParseRequest, SyntaxBackend, TranslationUnit};
use crate::registry::AdapterRegistry;
use crate::unit::sources::SourceLoader;
use crate::unit::{Builder, LiveGuard};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Builds translation units from tree-sitter parses of C and C++ sources
pub struct TreeSitterBackend {
    registry: AdapterRegistry,
    live: Arc<AtomicUsize>,
}

impl TreeSitterBackend {
    pub fn new() -> Self {
        Self {
            registry: AdapterRegistry::new(),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of units produced by this backend that have not been dropped
    pub fn live_units(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }
}

impl Default for TreeSitterBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxBackend for TreeSitterBackend {
    fn name(&self) -> &'static str {
        "tree-sitter"
    }

    fn parse(&self, request: &ParseRequest) -> Result<Box<dyn TranslationUnit>> {
        let language = self.registry.detect(&request.file, &request.args);
        let adapter = self
            .registry
            .get(language)
            .ok_or(AstError::UnsupportedLanguage(language))?;

        let loader = SourceLoader::new(&request.unsaved, &request.args);
        let unit = Builder::new(&loader, adapter.parser()?, language, request.max_include_depth)
            .build(&request.file)?
            .with_guard(LiveGuard::new(self.live.clone()));

        tracing::debug!(
            backend = self.name(),
            file = %request.file.display(),
            language = %language,
            live = self.live_units(),
            "parsed translation unit"
        );
        Ok(Box::new(unit))
    }
}
