//! Folder indexing and file retrieval.
//!
//! This module provides the two operations the HTTP layer is built on:
//! - Listing every non-hidden file below the served folder
//! - Opening one file for streaming, with a sniffed content type
//!
//! # Security
//!
//! Client paths are joined onto the root component by component. By default
//! `..` may not climb above the root and symlinks may not lead out of it.

pub mod indexer;
pub mod retriever;
pub mod root;
pub mod sniff;

pub use indexer::{has_hidden_segment, FolderIndexer, IndexError};
pub use retriever::{FileRetriever, OpenFile, RetrieveError, HEADER_SNIFF_LEN};
pub use root::{FolderRoot, RootError};
pub use sniff::detect_content_type;
