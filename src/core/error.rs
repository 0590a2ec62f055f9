//! Error types for locus
//!
//! Query entry points never surface these: a failed query renders the empty
//! form. They travel between the boundary adapter, configuration loading and
//! the resolver, and get logged before being dropped.

use locus_ast::AstError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for query operations
pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Error, Debug)]
pub enum QueryError {
    /// The `path[#unsaved]:flags:line:col` string could not be split
    #[error("Invalid location '{spec}': {message}")]
    InvalidLocationSpec { spec: String, message: String },

    /// Unsaved source named after `#` could not be read
    #[error("Unsaved source not readable: {path}")]
    UnsavedSource { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse failed: {0}")]
    Ast(#[from] AstError),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<QueryError>,
    },
}

impl QueryError {
    /// Wrap an error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        QueryError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    pub fn invalid_location(spec: impl Into<String>, message: impl Into<String>) -> Self {
        QueryError::InvalidLocationSpec {
            spec: spec.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        QueryError::Config {
            message: message.into(),
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    fn context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_location_display() {
        let err = QueryError::invalid_location("a.cpp:x", "line is not a number");
        let text = err.to_string();
        assert!(text.contains("a.cpp:x"));
        assert!(text.contains("line is not a number"));
    }

    #[test]
    fn test_error_with_context() {
        let err = QueryError::config("bad value").with_context("loading config");
        assert!(err.to_string().starts_with("loading config: "));
    }

    #[test]
    fn test_ast_error_conversion() {
        let err: QueryError = AstError::file_not_found("missing.cpp").into();
        assert!(matches!(err, QueryError::Ast(_)));
        assert!(err.to_string().contains("missing.cpp"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err: serde_json::Error = serde_json::from_str::<i32>("not json").unwrap_err();
        let err: QueryError = json_err.into();
        assert!(matches!(err, QueryError::Json(_)));
    }

    #[test]
    fn test_result_ext_context() {
        let result: Result<()> = Err(QueryError::config("test"));
        let err = result.context("during parse").unwrap_err();
        assert!(err.to_string().contains("during parse"));
    }
}
