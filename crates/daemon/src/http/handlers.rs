//! Route handlers for listing and downloading files.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::Response;
use axum::Json;
use protocol::{DataResponse, DownloadQuery, FileListResponse, FILEPATH_PARAM};
use tokio_util::io::ReaderStream;
use tracing::debug;

use super::error::ApiError;
use super::AppState;
use crate::files::RetrieveError;

/// Cache directives sent with every download.
pub const NO_CACHE: &str = "private, no-transform, no-store, must-revalidate";

const CONTENT_TRANSFER_ENCODING: HeaderName = HeaderName::from_static("content-transfer-encoding");

/// GET /api/v1/files
///
/// Lists every non-hidden file below the served folder.
pub(crate) async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FileListResponse>, ApiError> {
    let indexer = state.indexer.clone();
    let records = tokio::task::spawn_blocking(move || indexer.list()).await??;

    debug!(files = records.len(), "Listed files");
    Ok(Json(DataResponse::new(records)))
}

/// GET /api/v1/file?filepath=<relative path>
///
/// Streams one file as an attachment. The open handle moves into the body
/// stream and is closed when the stream ends or the client goes away.
pub(crate) async fn download_file(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    if query.filepath.is_empty() {
        return Err(ApiError::bad_request(format!(
            "missing {FILEPATH_PARAM} query parameter"
        )));
    }

    let retriever = state.retriever.clone();
    let requested = query.filepath.clone();
    let opened = tokio::task::spawn_blocking(move || retriever.open(&requested)).await??;

    let content_type = opened.content_type();
    let size = opened.size;
    let file = opened.into_rewound().map_err(RetrieveError::Io)?;

    debug!(filepath = %query.filepath, size, content_type = %content_type, "Streaming file");

    let stream = ReaderStream::new(tokio::fs::File::from_std(file));
    Response::builder()
        .status(StatusCode::OK)
        .header(header::EXPIRES, "0")
        .header(CONTENT_TRANSFER_ENCODING, "binary")
        .header(header::CACHE_CONTROL, NO_CACHE)
        .header(header::CONTENT_DISPOSITION, content_disposition(&query.filepath))
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, size)
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::internal(e.to_string()))
}

/// `Content-Disposition` value naming the requested path as the filename.
///
/// Paths that are not plain printable ASCII use the RFC 5987 `filename*`
/// form so the header stays valid.
pub fn content_disposition(filepath: &str) -> String {
    let plain = filepath
        .bytes()
        .all(|b| (0x20..0x7f).contains(&b) && b != b'"' && b != b'\\');

    if plain {
        format!("attachment; filename=\"{filepath}\"")
    } else {
        format!(
            "attachment; filename*=UTF-8''{}",
            urlencoding::encode(filepath)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_plain() {
        assert_eq!(
            content_disposition("sub/b.txt"),
            "attachment; filename=\"sub/b.txt\""
        );
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        assert_eq!(
            content_disposition("résumé.pdf"),
            "attachment; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"
        );
    }

    #[test]
    fn test_content_disposition_quotes() {
        assert_eq!(
            content_disposition("say \"hi\".txt"),
            "attachment; filename*=UTF-8''say%20%22hi%22.txt"
        );
    }
}
