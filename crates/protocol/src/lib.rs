//! # Synctool Protocol Library
//!
//! Wire types shared by the synctool file server and its clients.
//!
//! ## Overview
//!
//! The server exposes two routes under [`API_PREFIX`]:
//!
//! - [`FILES_ROUTE`]: the inventory of every non-hidden file below the served
//!   folder, returned as `{"data": [FileRecord, ...]}`
//! - [`FILE_ROUTE`]: the bytes of one file, selected with the
//!   [`FILEPATH_PARAM`] query parameter
//!
//! Failures on either route carry `{"message": "..."}`.
//!
//! ## Example Usage
//!
//! ```rust
//! use protocol::{decode_file_list, encode_file_list, FileRecord};
//!
//! let record = FileRecord {
//!     id: FileRecord::derive_id("a.txt", 5),
//!     path: "/data/a.txt".to_string(),
//!     short_path: "a.txt".to_string(),
//!     name: "a.txt".to_string(),
//!     size: 5,
//! };
//!
//! let body = encode_file_list(vec![record.clone()]).unwrap();
//! assert_eq!(decode_file_list(&body).unwrap(), vec![record]);
//! ```
//!
//! ## Modules
//!
//! - [`messages`]: Records, envelopes, routes
//! - [`error`]: Error types

pub mod error;
pub mod messages;

pub use error::{ProtocolError, Result};
pub use messages::{
    decode_error, decode_file_list, encode_file_list, DataResponse, DownloadQuery, ErrorResponse,
    FileListResponse, FileRecord, API_PREFIX, FILEPATH_PARAM, FILES_ROUTE, FILE_ROUTE,
};
