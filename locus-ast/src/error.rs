//! Error types for locus-ast
//!
//! Syntax errors in the parsed program are not errors here: tree-sitter
//! recovers and the cursor arena is built from whatever structure survives.
//! These variants cover the cases where no translation unit can be built.

use crate::ir::LanguageId;
use thiserror::Error;

/// Errors from parsing and translation-unit construction
#[derive(Error, Debug, Clone)]
pub enum AstError {
    /// Main file has neither unsaved content nor a readable file on disk
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// I/O error while reading a source file
    #[error("I/O error: {0}")]
    Io(String),

    /// No grammar registered for the language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(LanguageId),

    /// Tree-sitter rejected the grammar
    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),

    /// Tree-sitter returned no tree at all
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A (line, column) pair that does not exist in the file
    #[error("Invalid location {file}:{line}:{column}")]
    InvalidLocation {
        file: String,
        line: u32,
        column: u32,
    },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AstError {
    pub fn file_not_found(path: impl AsRef<std::path::Path>) -> Self {
        AstError::FileNotFound(path.as_ref().display().to_string())
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        AstError::ParseError(message.into())
    }
}

impl From<std::io::Error> for AstError {
    fn from(err: std::io::Error) -> Self {
        AstError::Io(err.to_string())
    }
}

/// Result type alias for AstError
pub type Result<T> = std::result::Result<T, AstError>;
