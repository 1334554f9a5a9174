//! The served folder and path resolution against it.
//!
//! A [`FolderRoot`] is fixed at startup. Paths coming from clients are joined
//! onto it component by component, so an absolute-looking request such as
//! `/notes.txt` still lands inside the folder, and `..` is either folded
//! lexically or rejected depending on the confinement policy.

use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Errors raised while building or resolving against a root.
#[derive(Debug, Error)]
pub enum RootError {
    /// The configured folder could not be made absolute.
    #[error("failed to resolve folder {path}: {source}")]
    Absolute {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A relative path climbs above the root.
    #[error("path escapes the served folder: {0}")]
    Escape(String),
}

/// Absolute, lexically cleaned folder that bounds all listing and retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRoot {
    path: PathBuf,
}

impl FolderRoot {
    /// Make `path` absolute against the current directory and clean it.
    ///
    /// Symlinks are not resolved, so reported paths keep the spelling the
    /// operator configured.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, RootError> {
        let path = path.as_ref();
        let absolute = std::path::absolute(path).map_err(|source| RootError::Absolute {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            path: clean(&absolute),
        })
    }

    /// The absolute root path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Join a client supplied relative path onto the root.
    ///
    /// Root and prefix components of `relative` are ignored and `.` is
    /// skipped. A `..` that would climb above the root is an error when
    /// `confine` is set; otherwise it is folded lexically like any other.
    pub fn resolve(&self, relative: &str, confine: bool) -> Result<PathBuf, RootError> {
        let mut resolved = self.path.clone();
        let mut depth = 0usize;

        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::ParentDir if depth > 0 => {
                    resolved.pop();
                    depth -= 1;
                }
                Component::ParentDir => {
                    if confine {
                        return Err(RootError::Escape(relative.to_string()));
                    }
                    resolved.pop();
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }

        Ok(resolved)
    }

    /// Path of `path` relative to the root, `/`-separated and without a
    /// leading separator.
    ///
    /// Returns `None` when `path` does not live under the root.
    pub fn short_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.path).ok()?;
        let parts: Vec<_> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect();
        Some(parts.join("/"))
    }
}

/// Lexically normalize an absolute path: drop `.`, fold `..`.
fn clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping at the filesystem root is a no-op, as it should be.
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cleans_path() {
        let root = FolderRoot::new("/data/./sub/../files").unwrap();
        assert_eq!(root.path(), Path::new("/data/files"));
    }

    #[test]
    fn test_new_makes_relative_absolute() {
        let root = FolderRoot::new("shared").unwrap();
        assert!(root.path().is_absolute());
        assert!(root.path().ends_with("shared"));
    }

    #[test]
    fn test_parent_of_filesystem_root() {
        let root = FolderRoot::new("/..").unwrap();
        assert_eq!(root.path(), Path::new("/"));
    }

    #[test]
    fn test_resolve_plain() {
        let root = FolderRoot::new("/data").unwrap();
        assert_eq!(
            root.resolve("sub/b.txt", true).unwrap(),
            PathBuf::from("/data/sub/b.txt")
        );
    }

    #[test]
    fn test_resolve_leading_separator_stays_inside() {
        let root = FolderRoot::new("/data").unwrap();
        assert_eq!(
            root.resolve("/a.txt", true).unwrap(),
            PathBuf::from("/data/a.txt")
        );
    }

    #[test]
    fn test_resolve_inner_parent_is_folded() {
        let root = FolderRoot::new("/data").unwrap();
        assert_eq!(
            root.resolve("sub/../a.txt", true).unwrap(),
            PathBuf::from("/data/a.txt")
        );
    }

    #[test]
    fn test_resolve_escape_rejected_when_confined() {
        let root = FolderRoot::new("/data").unwrap();
        let result = root.resolve("../etc/passwd", true);
        assert!(matches!(result, Err(RootError::Escape(_))));

        let result = root.resolve("sub/../../etc/passwd", true);
        assert!(matches!(result, Err(RootError::Escape(_))));
    }

    #[test]
    fn test_resolve_escape_folded_when_unconfined() {
        let root = FolderRoot::new("/data").unwrap();
        assert_eq!(
            root.resolve("../etc/passwd", false).unwrap(),
            PathBuf::from("/etc/passwd")
        );
    }

    #[test]
    fn test_resolve_empty_is_root() {
        let root = FolderRoot::new("/data").unwrap();
        assert_eq!(root.resolve("", true).unwrap(), PathBuf::from("/data"));
    }

    #[test]
    fn test_short_path() {
        let root = FolderRoot::new("/data").unwrap();
        assert_eq!(
            root.short_path(Path::new("/data/sub/b.txt")).as_deref(),
            Some("sub/b.txt")
        );
        assert_eq!(
            root.short_path(Path::new("/data/a.txt")).as_deref(),
            Some("a.txt")
        );
        assert_eq!(root.short_path(Path::new("/elsewhere/a.txt")), None);
    }

    #[test]
    fn test_short_path_from_filesystem_root() {
        let root = FolderRoot::new("/").unwrap();
        assert_eq!(
            root.short_path(Path::new("/etc/hosts")).as_deref(),
            Some("etc/hosts")
        );
    }
}
