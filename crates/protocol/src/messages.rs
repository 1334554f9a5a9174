//! Message definitions for the synctool HTTP API.
//!
//! Every response body is a JSON object with exactly one key: `data` on
//! success, `message` on failure.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Version prefix shared by every route.
pub const API_PREFIX: &str = "/api/v1";

/// Route listing every non-hidden file below the served folder.
pub const FILES_ROUTE: &str = "/api/v1/files";

/// Route streaming the bytes of a single file.
pub const FILE_ROUTE: &str = "/api/v1/file";

/// Query parameter naming the file to download, relative to the folder.
pub const FILEPATH_PARAM: &str = "filepath";

/// A single file in a folder inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Identifier derived from name and size. Not unique across files that
    /// share both.
    pub id: String,
    /// Absolute path on the serving host.
    pub path: String,
    /// Path relative to the served folder, without a leading separator.
    pub short_path: String,
    /// Base name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
}

impl FileRecord {
    /// Build the identifier used for a file with the given name and size.
    pub fn derive_id(name: &str, size: u64) -> String {
        format!("{name}-{size}")
    }
}

/// Successful response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Response body of the files route.
pub type FileListResponse = DataResponse<Vec<FileRecord>>;

/// Failure response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Query string accepted by the download route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadQuery {
    /// Requested file, relative to the served folder.
    #[serde(default)]
    pub filepath: String,
}

/// Serialize a file listing the way the files route does.
pub fn encode_file_list(records: Vec<FileRecord>) -> Result<String> {
    Ok(serde_json::to_string(&DataResponse::new(records))?)
}

/// Parse a files route response body.
pub fn decode_file_list(body: &str) -> Result<Vec<FileRecord>> {
    let response: FileListResponse = serde_json::from_str(body)?;
    Ok(response.data)
}

/// Parse an error response body.
pub fn decode_error(body: &str) -> Result<ErrorResponse> {
    Ok(serde_json::from_str(body)?)
}
