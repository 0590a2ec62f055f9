//! Query configuration
//!
//! Loaded from `--config FILE`, else `./.locus_config.json`, else
//! `<config_dir>/locus/config.json`. A missing default file is not an error;
//! a named file that is missing or malformed is.

use crate::core::error::{QueryError, Result, ResultExt};
use locus_ast::DEFAULT_INCLUDE_DEPTH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory
pub const LOCAL_CONFIG: &str = ".locus_config.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct QueryConfig {
    /// Flags placed before the flags of every query
    #[serde(default)]
    pub default_flags: Vec<String>,
    /// Directories appended to every query as `-I`
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,
    /// Nested `#include` depth; 0 parses the main file alone
    #[serde(default = "default_max_include_depth")]
    pub max_include_depth: usize,
}

fn default_max_include_depth() -> usize {
    DEFAULT_INCLUDE_DEPTH
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_flags: Vec::new(),
            include_dirs: Vec::new(),
            max_include_depth: DEFAULT_INCLUDE_DEPTH,
        }
    }
}

impl QueryConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(QueryError::from)
            .context(format!("reading {}", path.display()))?;
        serde_json::from_str(&text)
            .map_err(QueryError::from)
            .context(format!("parsing {}", path.display()))
    }

    /// Candidate locations, most specific first
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("locus").join("config.json"));
        }
        paths
    }

    /// The explicit file when given, else the first default file that exists,
    /// else built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        for path in Self::default_paths() {
            if path.is_file() {
                tracing::debug!(path = %path.display(), "loading config");
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    /// Final argument vector: defaults, query flags, then include dirs
    pub fn apply(&self, flags: &[String]) -> Vec<String> {
        let mut args = self.default_flags.clone();
        args.extend(flags.iter().cloned());
        args.extend(
            self.include_dirs
                .iter()
                .map(|dir| format!("-I{}", dir.display())),
        );
        args
    }
}
