//! Attachment and archive download handlers.

use std::sync::Arc;

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use rimborsi_core::EntryId;
use rimborsi_store::ExportOutcome;
use serde::Deserialize;

use crate::auth::Authorized;
use crate::error::ApiError;
use crate::handlers::entries::{parse_year, resolve_person};
use crate::handlers::run_blocking;
use crate::state::AppState;

/// First bucket index in the slice.
pub const X_DOWNLOAD_FROM: &str = "x-download-from";
/// Resume offset: first bucket index not in the slice.
pub const X_DOWNLOAD_TO: &str = "x-download-to";
/// Bucket length.
pub const X_DOWNLOAD_MAX: &str = "x-download-max";
/// Decoded bytes packed into the slice.
pub const X_DOWNLOAD_BYTES: &str = "x-download-bytes";

/// Archive slice query.
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    /// Bucket index to start from (default 0).
    #[serde(default)]
    pub first: usize,
}

/// Download one entry's attachment with its stored content type and file name.
pub async fn download_attachment(
    State(state): State<Arc<AppState>>,
    _auth: Authorized,
    path: Result<Path<(String, String, String)>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path((name, year, entry_id)) = path?;
    let year = parse_year(&year)?;
    let entry_id: EntryId = entry_id.parse()?;

    let (entry, data) = run_blocking("attachment", move || {
        let person = resolve_person(&state, &name)?;
        let entry = state
            .entries
            .get_entry(person.id, year, &entry_id)
            .map_err(|e| ApiError::from(e).into_not_found())?;
        let data = state
            .entries
            .content()
            .get(person.id, &entry_id)
            .map_err(|e| ApiError::from(e).into_not_found())?;
        Ok((entry, data))
    })
    .await?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, header_value(&entry.content_file_type)?);
    headers.insert(CONTENT_DISPOSITION, attachment_disposition(&entry.file_name())?);

    Ok((StatusCode::OK, headers, data).into_response())
}

/// Download a zip slice of a bucket starting at `?first=`.
///
/// Responds 204 when `first` is past the end of the bucket. A slice that
/// cannot make progress because the next attachment exceeds the archive
/// budget on its own is reported as `PayloadTooLarge`, naming the entry so it
/// can be fetched individually.
pub async fn download_archive(
    State(state): State<Arc<AppState>>,
    _auth: Authorized,
    path: Result<Path<(String, String)>, PathRejection>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Path((name, year)) = path?;
    let Query(query) = query?;
    let year = parse_year(&year)?;
    let first = query.first;
    let outcome = {
        let state = state.clone();
        let name = name.clone();
        run_blocking("export", move || {
            let person = resolve_person(&state, &name)?;
            Ok(state.exporter.export(person.id, year, first)?)
        })
        .await?
    };

    let slice = match outcome {
        ExportOutcome::NoMoreData { total } => {
            let mut headers = HeaderMap::new();
            insert_count(&mut headers, X_DOWNLOAD_FROM, query.first);
            insert_count(&mut headers, X_DOWNLOAD_MAX, total);
            return Ok((StatusCode::NO_CONTENT, headers).into_response());
        }
        ExportOutcome::Slice(slice) => slice,
    };

    if slice.is_stalled() {
        let blocker = slice
            .blocked_by
            .as_ref()
            .map_or_else(|| "unknown".to_string(), ToString::to_string);
        return Err(ApiError::PayloadTooLarge(format!(
            "entry {blocker} exceeds the archive budget of {} bytes; download it individually",
            state.exporter.limits().max_bytes
        )));
    }

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/zip"));
    headers.insert(
        CONTENT_DISPOSITION,
        attachment_disposition(&format!(
            "{name}-{year}-{}-{}.zip",
            slice.start_index, slice.end_index
        ))?,
    );
    insert_count(&mut headers, X_DOWNLOAD_FROM, slice.start_index);
    insert_count(&mut headers, X_DOWNLOAD_TO, slice.end_index);
    insert_count(&mut headers, X_DOWNLOAD_MAX, slice.total);
    insert_count(&mut headers, X_DOWNLOAD_BYTES, slice.packed_bytes);

    Ok((StatusCode::OK, headers, slice.bytes).into_response())
}

fn insert_count(headers: &mut HeaderMap, name: &'static str, value: impl Into<HeaderValue>) {
    headers.insert(HeaderName::from_static(name), value.into());
}

fn header_value(value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value).map_err(|e| ApiError::Internal(format!("bad header: {e}")))
}

fn attachment_disposition(file_name: &str) -> Result<HeaderValue, ApiError> {
    let escaped = file_name.replace('"', "\\\"");
    header_value(&format!("attachment; filename=\"{escaped}\""))
}
