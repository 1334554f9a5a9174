//! Opening files below the served folder for streaming.
//!
//! [`FileRetriever::open`] resolves a client path against the root, opens
//! the file and reads a short header used to sniff its content type. The
//! returned [`OpenFile`] owns the OS handle; dropping it closes the file.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::root::{FolderRoot, RootError};
use super::sniff::detect_content_type;

/// Number of leading bytes read for content type sniffing.
pub const HEADER_SNIFF_LEN: usize = 512;

/// Errors that can occur while opening a file.
#[derive(Debug, Error)]
pub enum RetrieveError {
    /// The resolved path does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The requested path resolves outside the served folder.
    #[error("path is outside the served folder: {0}")]
    OutsideRoot(String),

    /// The resolved path is a directory, not a file.
    #[error("path is a directory: {}", .0.display())]
    NotAFile(PathBuf),

    /// Open, read or stat failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<RootError> for RetrieveError {
    fn from(err: RootError) -> Self {
        match err {
            RootError::Escape(requested) => RetrieveError::OutsideRoot(requested),
            RootError::Absolute { source, .. } => RetrieveError::Io(source),
        }
    }
}

/// An open file ready for streaming.
///
/// The read cursor sits after the header on return from
/// [`FileRetriever::open`]; call [`OpenFile::rewind`] before streaming the
/// full content.
#[derive(Debug)]
pub struct OpenFile {
    /// The open handle.
    pub file: File,
    /// Leading bytes of the file, at most [`HEADER_SNIFF_LEN`].
    pub header: Vec<u8>,
    /// Total size in bytes.
    pub size: u64,
    /// Resolved absolute path.
    pub path: PathBuf,
}

impl OpenFile {
    /// Seek back to the start of the file.
    pub fn rewind(&mut self) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    /// MIME type sniffed from the header bytes.
    pub fn content_type(&self) -> String {
        detect_content_type(&self.header)
    }

    /// Give up the handle, rewound to offset 0.
    pub fn into_rewound(mut self) -> io::Result<File> {
        self.rewind()?;
        Ok(self.file)
    }
}

/// Opens files below a root.
#[derive(Debug, Clone)]
pub struct FileRetriever {
    root: FolderRoot,
    /// Reject paths that resolve outside the root.
    confine_to_root: bool,
}

impl FileRetriever {
    /// Create a retriever that keeps every resolved path inside the root.
    pub fn new(root: FolderRoot) -> Self {
        Self {
            root,
            confine_to_root: true,
        }
    }

    /// Set whether resolved paths must stay inside the root.
    ///
    /// When disabled, `..` segments are folded lexically and symlinks are
    /// opened wherever they point.
    pub fn confine_to_root(mut self, confine: bool) -> Self {
        self.confine_to_root = confine;
        self
    }

    /// The folder this retriever resolves against.
    pub fn root(&self) -> &FolderRoot {
        &self.root
    }

    /// Open `relative` for reading.
    ///
    /// Files shorter than [`HEADER_SNIFF_LEN`] are fine: the header holds
    /// exactly the bytes that were read.
    pub fn open(&self, relative: &str) -> Result<OpenFile, RetrieveError> {
        let path = self.root.resolve(relative, self.confine_to_root)?;

        let metadata = fs::metadata(&path).map_err(|e| not_found_or_io(&path, e))?;
        if metadata.is_dir() {
            return Err(RetrieveError::NotAFile(path));
        }

        if self.confine_to_root {
            self.ensure_inside_root(relative, &path)?;
        }

        let mut file = File::open(&path).map_err(|e| not_found_or_io(&path, e))?;
        let header = read_header(&mut file)?;
        let size = file.metadata()?.len();

        debug!(path = %path.display(), size, header = header.len(), "Opened file");

        Ok(OpenFile {
            file,
            header,
            size,
            path,
        })
    }

    /// Reject paths whose canonical form leaves the canonical root, which
    /// happens through symlinks.
    fn ensure_inside_root(&self, relative: &str, path: &Path) -> Result<(), RetrieveError> {
        let canonical_root = fs::canonicalize(self.root.path())?;
        let canonical = fs::canonicalize(path).map_err(|e| not_found_or_io(path, e))?;

        if canonical.starts_with(&canonical_root) {
            Ok(())
        } else {
            Err(RetrieveError::OutsideRoot(relative.to_string()))
        }
    }
}

fn not_found_or_io(path: &Path, err: io::Error) -> RetrieveError {
    if err.kind() == io::ErrorKind::NotFound {
        RetrieveError::NotFound(path.to_path_buf())
    } else {
        RetrieveError::Io(err)
    }
}

/// Read up to [`HEADER_SNIFF_LEN`] bytes, stopping early only at end of file.
fn read_header(file: &mut File) -> io::Result<Vec<u8>> {
    let mut header = Vec::with_capacity(HEADER_SNIFF_LEN);
    file.by_ref()
        .take(HEADER_SNIFF_LEN as u64)
        .read_to_end(&mut header)?;
    Ok(header)
}
