//! Source loading: unsaved overlays, compiler flags, include search

use crate::error::{AstError, Result};
use crate::provider::UnsavedFile;
use std::path::{Component, Path, PathBuf};

/// Include search configuration extracted from the argument vector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileFlags {
    pub quote_dirs: Vec<PathBuf>,
    pub include_dirs: Vec<PathBuf>,
    pub system_dirs: Vec<PathBuf>,
}

impl CompileFlags {
    /// Pick out `-I`, `-iquote` and `-isystem`; every other flag is ignored
    pub fn parse(args: &[String]) -> Self {
        let mut flags = CompileFlags::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let (list, rest) = if let Some(rest) = arg.strip_prefix("-iquote") {
                (&mut flags.quote_dirs, rest)
            } else if let Some(rest) = arg.strip_prefix("-isystem") {
                (&mut flags.system_dirs, rest)
            } else if let Some(rest) = arg.strip_prefix("-I") {
                (&mut flags.include_dirs, rest)
            } else {
                continue;
            };
            let dir = if rest.is_empty() {
                iter.next().cloned()
            } else {
                Some(rest.to_string())
            };
            if let Some(dir) = dir {
                list.push(PathBuf::from(dir));
            }
        }
        flags
    }
}

/// Lexically normalise a path: drop `.` components and fold `dir/..`
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if can_pop {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Reads sources with unsaved buffers taking precedence over the disk
pub struct SourceLoader<'r> {
    unsaved: &'r [UnsavedFile],
    flags: CompileFlags,
}

impl<'r> SourceLoader<'r> {
    pub fn new(unsaved: &'r [UnsavedFile], args: &[String]) -> Self {
        Self {
            unsaved,
            flags: CompileFlags::parse(args),
        }
    }

    pub fn flags(&self) -> &CompileFlags {
        &self.flags
    }

    fn overlay(&self, path: &Path) -> Option<&'r str> {
        let wanted = normalize(path);
        self.unsaved
            .iter()
            .find(|u| u.path == path || normalize(&u.path) == wanted)
            .map(|u| u.contents.as_str())
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.overlay(path).is_some() || path.is_file()
    }

    pub fn read(&self, path: &Path) -> Result<String> {
        if let Some(contents) = self.overlay(path) {
            return Ok(contents.to_string());
        }
        match std::fs::read(path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AstError::file_not_found(path))
            }
            Err(e) => Err(AstError::Io(format!("{}: {}", path.display(), e))),
        }
    }

    /// Resolve an `#include` target
    ///
    /// Quoted includes search the includer's directory, then `-iquote`, then
    /// `-I`; angled includes search `-I`, then `-isystem`. The includer's
    /// directory is taken from its logical path, `.` when it has none.
    pub fn resolve_include(&self, spelled: &str, angled: bool, includer: &Path) -> Option<PathBuf> {
        let target = Path::new(spelled);
        if target.is_absolute() {
            return self.exists(target).then(|| target.to_path_buf());
        }

        let mut dirs: Vec<PathBuf> = Vec::new();
        if !angled {
            let dir = match includer.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            dirs.push(dir);
            dirs.extend(self.flags.quote_dirs.iter().cloned());
        }
        dirs.extend(self.flags.include_dirs.iter().cloned());
        if angled {
            dirs.extend(self.flags.system_dirs.iter().cloned());
        }

        dirs.into_iter()
            .map(|dir| dir.join(target))
            .find(|candidate| self.exists(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    // =========================================================================
    // CompileFlags Tests
    // =========================================================================

    #[test]
    fn test_flags_joined_and_split() {
        let flags = CompileFlags::parse(&args(&[
            "-std=c++1y",
            "-Iinc",
            "-I",
            "other",
            "-iquote",
            "q",
            "-isystem/usr/include",
            "-DNDEBUG",
        ]));
        assert_eq!(flags.include_dirs, vec![PathBuf::from("inc"), PathBuf::from("other")]);
        assert_eq!(flags.quote_dirs, vec![PathBuf::from("q")]);
        assert_eq!(flags.system_dirs, vec![PathBuf::from("/usr/include")]);
    }

    #[test]
    fn test_flags_dangling_dir() {
        let flags = CompileFlags::parse(&args(&["-I"]));
        assert!(flags.include_dirs.is_empty());
    }

    // =========================================================================
    // normalize Tests
    // =========================================================================

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("./a/./b.hpp")), PathBuf::from("a/b.hpp"));
        assert_eq!(normalize(Path::new("a/../b.hpp")), PathBuf::from("b.hpp"));
        assert_eq!(normalize(Path::new("../x.cpp")), PathBuf::from("../x.cpp"));
    }

    // =========================================================================
    // SourceLoader Tests
    // =========================================================================

    #[test]
    fn test_overlay_takes_precedence() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.cpp");
        std::fs::write(&path, "int disk;").unwrap();

        let unsaved = vec![UnsavedFile::new(&path, "int memory;")];
        let loader = SourceLoader::new(&unsaved, &[]);
        assert_eq!(loader.read(&path).unwrap(), "int memory;");
    }

    #[test]
    fn test_overlay_matches_normalized_path() {
        let unsaved = vec![UnsavedFile::new("./declaration.hpp", "int f();")];
        let loader = SourceLoader::new(&unsaved, &[]);
        assert!(loader.exists(Path::new("declaration.hpp")));
        assert_eq!(loader.read(Path::new("declaration.hpp")).unwrap(), "int f();");
    }

    #[test]
    fn test_read_missing_file() {
        let loader = SourceLoader::new(&[], &[]);
        let err = loader.read(Path::new("/no/such/file.cpp")).unwrap_err();
        assert!(matches!(err, AstError::FileNotFound(_)));
    }

    #[test]
    fn test_quoted_include_relative_to_includer() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("x.hpp"), "").unwrap();
        let loader = SourceLoader::new(&[], &[]);

        let includer = temp.path().join("main.cpp");
        let found = loader.resolve_include("x.hpp", false, &includer).unwrap();
        assert_eq!(found, temp.path().join("x.hpp"));
    }

    #[test]
    fn test_quoted_include_without_directory() {
        let unsaved = vec![UnsavedFile::new("include.hpp", "")];
        let loader = SourceLoader::new(&unsaved, &[]);
        let found = loader
            .resolve_include("include.hpp", false, Path::new("include.cpp"))
            .unwrap();
        assert_eq!(found, PathBuf::from("./include.hpp"));
    }

    #[test]
    fn test_angled_include_uses_search_path() {
        let temp = TempDir::new().unwrap();
        let inc = temp.path().join("inc");
        std::fs::create_dir(&inc).unwrap();
        std::fs::write(inc.join("test.hpp"), "").unwrap();

        let flags = args(&[&format!("-I{}", inc.display())]);
        let loader = SourceLoader::new(&[], &flags);
        let includer = temp.path().join("main.cpp");

        assert_eq!(
            loader.resolve_include("test.hpp", true, &includer),
            Some(inc.join("test.hpp"))
        );
        assert_eq!(loader.resolve_include("missing.hpp", true, &includer), None);
    }

    #[test]
    fn test_angled_include_skips_includer_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("local.hpp"), "").unwrap();
        let loader = SourceLoader::new(&[], &[]);
        let includer = temp.path().join("main.cpp");
        assert_eq!(loader.resolve_include("local.hpp", true, &includer), None);
    }
}
