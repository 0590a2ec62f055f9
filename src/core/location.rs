//! Location strings and the queries built from them
//!
//! The editor plugin addresses a query as `path[#unsaved]:flags:line:col`.
//! `#unsaved` names a file whose contents stand in for `path`; flags are
//! whitespace separated and may contain `:`, so `line` and `col` are taken
//! from the right. A string without a trailing `line:col` pair addresses
//! line 0, which no query can resolve.

use crate::config::QueryConfig;
use crate::core::error::{QueryError, Result};
use locus_ast::{ParseRequest, UnsavedFile};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A location string split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSpec {
    pub file: PathBuf,
    /// File whose contents overlay `file`
    pub unsaved_source: Option<PathBuf>,
    pub flags: Vec<String>,
    pub line: u32,
    pub column: u32,
}

/// Split off a trailing `:line:col` when both parts are numbers
fn split_position(spec: &str) -> (&str, u32, u32) {
    let mut parts = spec.rsplitn(3, ':');
    let column = parts.next().and_then(|s| s.trim().parse::<u32>().ok());
    let line = parts.next().and_then(|s| s.trim().parse::<u32>().ok());
    match (parts.next(), line, column) {
        (Some(head), Some(line), Some(column)) => (head, line, column),
        _ => (spec, 0, 0),
    }
}

impl FromStr for LocationSpec {
    type Err = QueryError;

    fn from_str(spec: &str) -> Result<Self> {
        let (head, line, column) = split_position(spec);
        let (target, flags) = head.split_once(':').unwrap_or((head, ""));
        let (file, unsaved_source) = match target.split_once('#') {
            Some((file, source)) if !source.is_empty() => (file, Some(PathBuf::from(source))),
            Some((file, _)) => (file, None),
            None => (target, None),
        };
        if file.is_empty() {
            return Err(QueryError::invalid_location(spec, "missing file path"));
        }
        Ok(Self {
            file: PathBuf::from(file),
            unsaved_source,
            flags: flags.split_whitespace().map(str::to_string).collect(),
            line,
            column,
        })
    }
}

impl LocationSpec {
    /// Read the overlay source and merge the configured flags
    pub fn into_query(self, config: &QueryConfig) -> Result<LocationQuery> {
        let mut unsaved = Vec::new();
        if let Some(source) = &self.unsaved_source {
            let contents = std::fs::read_to_string(source).map_err(|e| {
                tracing::debug!(path = %source.display(), error = %e, "unsaved source unreadable");
                QueryError::UnsavedSource {
                    path: source.clone(),
                }
            })?;
            unsaved.push(UnsavedFile::new(&self.file, contents));
        }

        let mut request = ParseRequest::new(self.file)
            .with_args(config.apply(&self.flags))
            .with_unsaved(unsaved);
        request.max_include_depth = config.max_include_depth;

        Ok(LocationQuery {
            request,
            line: self.line,
            column: self.column,
        })
    }
}

/// One position to query, with everything needed to parse around it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery {
    pub request: ParseRequest,
    pub line: u32,
    pub column: u32,
}

impl LocationQuery {
    pub fn new(file: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Self {
            request: ParseRequest::new(file),
            line,
            column,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request = self.request.with_args(args);
        self
    }

    pub fn with_unsaved(mut self, unsaved: Vec<UnsavedFile>) -> Self {
        self.request = self.request.with_unsaved(unsaved);
        self
    }

    pub fn file(&self) -> &Path {
        &self.request.file
    }

    /// Parse a location string and build the query in one step
    pub fn parse(spec: &str, config: &QueryConfig) -> Result<Self> {
        spec.parse::<LocationSpec>()?.into_query(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // =========================================================================
    // LocationSpec Tests
    // =========================================================================

    #[test]
    fn test_full_spec() {
        let spec: LocationSpec = "qa/data/declaration.cpp:-std=c++1y:17:8".parse().unwrap();
        assert_eq!(spec.file, PathBuf::from("qa/data/declaration.cpp"));
        assert_eq!(spec.unsaved_source, None);
        assert_eq!(spec.flags, vec!["-std=c++1y"]);
        assert_eq!((spec.line, spec.column), (17, 8));
    }

    #[test]
    fn test_unsaved_source() {
        let spec: LocationSpec = "declaration.cpp#declaration-unsaved.cpp:-std=c++1y:5:4"
            .parse()
            .unwrap();
        assert_eq!(spec.file, PathBuf::from("declaration.cpp"));
        assert_eq!(spec.unsaved_source, Some(PathBuf::from("declaration-unsaved.cpp")));
        assert_eq!((spec.line, spec.column), (5, 4));
    }

    #[test]
    fn test_flags_with_spaces_and_colons() {
        let spec: LocationSpec = "a.cpp:-std=c++1y -I/opt/x:y -DZ:1:2".parse().unwrap();
        assert_eq!(spec.flags, vec!["-std=c++1y", "-I/opt/x:y", "-DZ"]);
        assert_eq!((spec.line, spec.column), (1, 2));
    }

    #[test]
    fn test_no_flags() {
        let spec: LocationSpec = "a.cpp::3:4".parse().unwrap();
        assert!(spec.flags.is_empty());
        let spec: LocationSpec = "a.cpp:3:4".parse().unwrap();
        assert_eq!(spec.file, PathBuf::from("a.cpp"));
        assert!(spec.flags.is_empty());
        assert_eq!((spec.line, spec.column), (3, 4));
    }

    #[test]
    fn test_missing_position() {
        let spec: LocationSpec = "diagnostics.cpp:-Wunused-variable".parse().unwrap();
        assert_eq!(spec.flags, vec!["-Wunused-variable"]);
        assert_eq!((spec.line, spec.column), (0, 0));

        let spec: LocationSpec = "a.cpp:-std=c++1y:13".parse().unwrap();
        assert_eq!(spec.line, 0);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!("".parse::<LocationSpec>().is_err());
        assert!("#x.cpp:-std=c++1y:1:1".parse::<LocationSpec>().is_err());
    }

    // =========================================================================
    // LocationQuery Tests
    // =========================================================================

    #[test]
    fn test_into_query_reads_overlay() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("edit.cpp");
        std::fs::write(&source, "int edited;").unwrap();

        let spec = LocationSpec {
            file: PathBuf::from("main.cpp"),
            unsaved_source: Some(source),
            flags: vec!["-DX".to_string()],
            line: 1,
            column: 5,
        };
        let query = spec.into_query(&QueryConfig::default()).unwrap();
        assert_eq!(query.file(), Path::new("main.cpp"));
        assert_eq!(query.request.unsaved, vec![UnsavedFile::new("main.cpp", "int edited;")]);
        assert_eq!(query.request.args, vec!["-DX"]);
    }

    #[test]
    fn test_into_query_missing_overlay() {
        let spec: LocationSpec = "a.cpp#/no/such/edit.cpp::1:1".parse().unwrap();
        let err = spec.into_query(&QueryConfig::default()).unwrap_err();
        assert!(matches!(err, QueryError::UnsavedSource { .. }));
    }

    #[test]
    fn test_into_query_applies_config() {
        let config = QueryConfig {
            default_flags: vec!["-std=c++17".to_string()],
            include_dirs: vec![PathBuf::from("inc")],
            max_include_depth: 3,
        };
        let query = LocationQuery::parse("a.cpp:-DX:1:1", &config).unwrap();
        assert_eq!(query.request.args, vec!["-std=c++17", "-DX", "-Iinc"]);
        assert_eq!(query.request.max_include_depth, 3);
    }
}
