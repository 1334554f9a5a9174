//! Recursive folder inventory.
//!
//! The indexer walks the served folder depth first, in file name order per
//! directory, and turns every non-directory entry into a [`FileRecord`].
//! Anything reached through a hidden (dot-prefixed) segment below the root is
//! left out.

use std::path::{Component, Path, PathBuf};

use protocol::FileRecord;
use thiserror::Error;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use super::root::FolderRoot;

/// Errors that can occur while building an inventory.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A directory could not be read or an entry could not be stat'ed.
    #[error("failed to index {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl IndexError {
    fn from_walk(root: &Path, source: walkdir::Error) -> Self {
        let path = source
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.to_path_buf());
        IndexError::Walk { path, source }
    }
}

/// Builds the flat file inventory of a folder.
///
/// Every call walks the folder from scratch; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct FolderIndexer {
    root: FolderRoot,
}

impl FolderIndexer {
    /// Create an indexer over the given root.
    pub fn new(root: FolderRoot) -> Self {
        Self { root }
    }

    /// The folder this indexer walks.
    pub fn root(&self) -> &FolderRoot {
        &self.root
    }

    /// List every non-hidden file under the root.
    ///
    /// Directories never become records and the root itself is not listed,
    /// so a root that is a plain file yields an empty inventory.
    /// The first unreadable directory or entry aborts the whole call.
    pub fn list(&self) -> Result<Vec<FileRecord>, IndexError> {
        let root = self.root.path();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden_entry(root, entry));

        let mut records = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| IndexError::from_walk(root, e))?;

            // The root is walked, never listed, even when it is a file.
            if entry.depth() == 0 || entry.file_type().is_dir() {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| IndexError::from_walk(root, e))?;
            let Some(short_path) = self.root.short_path(entry.path()) else {
                continue;
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            let size = metadata.len();
            records.push(FileRecord {
                id: FileRecord::derive_id(&name, size),
                path: entry.path().to_string_lossy().into_owned(),
                short_path,
                name,
                size,
            });
        }

        debug!(root = %root.display(), files = records.len(), "Indexed folder");
        Ok(records)
    }
}

/// Whether a path relative to the root has a segment starting with `.`.
pub fn has_hidden_segment(relative: &Path) -> bool {
    relative.components().any(|component| match component {
        Component::Normal(part) => part.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

fn is_hidden_entry(root: &Path, entry: &DirEntry) -> bool {
    // Only the part below the root counts; dots in the root's own ancestry
    // never hide anything.
    entry
        .path()
        .strip_prefix(root)
        .map(has_hidden_segment)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// The tree from the folder indexing scenario:
    /// `a.txt` (5 bytes), `.git/config` (10 bytes), `sub/b.txt` (empty).
    fn create_scenario_tree(dir: &Path) {
        fs::create_dir_all(dir.join(".git")).unwrap();
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::write(dir.join("a.txt"), "Hello").unwrap();
        fs::write(dir.join(".git/config"), "0123456789").unwrap();
        fs::write(dir.join("sub/b.txt"), "").unwrap();
    }

    fn indexer_for(dir: &Path) -> FolderIndexer {
        FolderIndexer::new(FolderRoot::new(dir).unwrap())
    }

    #[test]
    fn test_scenario_listing() {
        let temp_dir = TempDir::new().unwrap();
        create_scenario_tree(temp_dir.path());

        let records = indexer_for(temp_dir.path()).list().unwrap();

        assert_eq!(records.len(), 2);

        assert_eq!(records[0].name, "a.txt");
        assert_eq!(records[0].short_path, "a.txt");
        assert_eq!(records[0].size, 5);
        assert_eq!(records[0].id, "a.txt-5");

        assert_eq!(records[1].name, "b.txt");
        assert_eq!(records[1].short_path, "sub/b.txt");
        assert_eq!(records[1].size, 0);
        assert_eq!(records[1].id, "b.txt-0");
    }

    #[test]
    fn test_hidden_files_and_directories_excluded() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("visible/.cache/deep")).unwrap();
        fs::write(temp_dir.path().join(".env"), "SECRET=1").unwrap();
        fs::write(temp_dir.path().join("visible/.hidden"), "x").unwrap();
        fs::write(temp_dir.path().join("visible/.cache/deep/blob"), "x").unwrap();
        fs::write(temp_dir.path().join("visible/shown.txt"), "x").unwrap();

        let records = indexer_for(temp_dir.path()).list().unwrap();

        let short_paths: Vec<&str> = records.iter().map(|r| r.short_path.as_str()).collect();
        assert_eq!(short_paths, vec!["visible/shown.txt"]);
    }

    #[test]
    fn test_paths_are_absolute_and_short_paths_relative() {
        let temp_dir = TempDir::new().unwrap();
        create_scenario_tree(temp_dir.path());

        let indexer = indexer_for(temp_dir.path());
        let root = indexer.root().path().to_string_lossy().into_owned();

        for record in indexer.list().unwrap() {
            assert!(Path::new(&record.path).is_absolute());
            assert!(!record.short_path.starts_with('/'));
            let stripped = record.path.strip_prefix(&root).unwrap();
            assert_eq!(stripped.trim_start_matches('/'), record.short_path);
        }
    }

    #[test]
    fn test_traversal_order_is_depth_first_by_name() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("b_dir")).unwrap();
        fs::write(temp_dir.path().join("c.txt"), "c").unwrap();
        fs::write(temp_dir.path().join("a.txt"), "a").unwrap();
        fs::write(temp_dir.path().join("b_dir/z.txt"), "z").unwrap();
        fs::write(temp_dir.path().join("b_dir/y.txt"), "y").unwrap();

        let records = indexer_for(temp_dir.path()).list().unwrap();

        let short_paths: Vec<&str> = records.iter().map(|r| r.short_path.as_str()).collect();
        assert_eq!(
            short_paths,
            vec!["a.txt", "b_dir/y.txt", "b_dir/z.txt", "c.txt"]
        );
    }

    #[test]
    fn test_empty_directories_produce_nothing() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("empty/nested/deeper")).unwrap();

        let records = indexer_for(temp_dir.path()).list().unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_repeated_listing_is_stable() {
        let temp_dir = TempDir::new().unwrap();
        create_scenario_tree(temp_dir.path());

        let indexer = indexer_for(temp_dir.path());
        assert_eq!(indexer.list().unwrap(), indexer.list().unwrap());
    }

    #[test]
    fn test_listing_reflects_changes_between_calls() {
        let temp_dir = TempDir::new().unwrap();
        create_scenario_tree(temp_dir.path());

        let indexer = indexer_for(temp_dir.path());
        assert_eq!(indexer.list().unwrap().len(), 2);

        fs::write(temp_dir.path().join("new.txt"), "new").unwrap();
        assert_eq!(indexer.list().unwrap().len(), 3);
    }

    #[test]
    fn test_root_with_dotted_ancestor_is_listed() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join(".config/share");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("visible.txt"), "data").unwrap();

        let records = indexer_for(&root).list().unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].short_path, "visible.txt");
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = indexer_for(&temp_dir.path().join("nonexistent")).list();
        assert!(matches!(result, Err(IndexError::Walk { .. })));
    }

    #[test]
    fn test_file_root_is_not_listed() {
        let temp_dir = TempDir::new().unwrap();
        let lonely = temp_dir.path().join("lonely.txt");
        fs::write(&lonely, "abc").unwrap();

        let records = indexer_for(&lonely).list().unwrap();
        assert!(records.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_discards_partial_listing() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "Hello").unwrap();
        let locked = temp_dir.path().join("b_locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("inner.txt"), "x").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not bind root.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = indexer_for(temp_dir.path()).list();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        match result {
            Err(IndexError::Walk { path, .. }) => assert!(path.ends_with("b_locked")),
            Ok(records) => panic!("expected walk error, got {} records", records.len()),
        }
    }

    #[test]
    fn test_duplicate_name_and_size_share_id() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("one")).unwrap();
        fs::create_dir_all(temp_dir.path().join("two")).unwrap();
        fs::write(temp_dir.path().join("one/same.txt"), "abc").unwrap();
        fs::write(temp_dir.path().join("two/same.txt"), "xyz").unwrap();

        let records = indexer_for(temp_dir.path()).list().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, records[1].id);
        assert_ne!(records[0].short_path, records[1].short_path);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_listed_not_followed() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let other_dir = TempDir::new().unwrap();
        fs::create_dir_all(other_dir.path().join("outside")).unwrap();
        fs::write(other_dir.path().join("outside/secret.txt"), "secret").unwrap();
        symlink(other_dir.path().join("outside"), temp_dir.path().join("link")).unwrap();

        let records = indexer_for(temp_dir.path()).list().unwrap();

        let short_paths: Vec<&str> = records.iter().map(|r| r.short_path.as_str()).collect();
        assert_eq!(short_paths, vec!["link"]);
    }

    #[test]
    fn test_has_hidden_segment() {
        assert!(has_hidden_segment(Path::new(".git/config")));
        assert!(has_hidden_segment(Path::new("sub/.hidden")));
        assert!(has_hidden_segment(Path::new("a/.b/c.txt")));
        assert!(!has_hidden_segment(Path::new("sub/b.txt")));
        assert!(!has_hidden_segment(Path::new("file.with.dots")));
    }
}
