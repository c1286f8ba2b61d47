//! Entry handlers.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use rimborsi_core::{Entry, EntryId, NewEntry, Person, Year};
use serde::Deserialize;

use crate::auth::Authorized;
use crate::error::ApiError;
use crate::handlers::{run_blocking, ApiResponse};
use crate::state::AppState;

/// Create entry request.
#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    /// Name of the person the entry belongs to.
    #[serde(default)]
    pub user: String,
    /// Bucket year.
    pub year: Year,
    /// Entry fields and attachment.
    #[serde(flatten)]
    pub fields: NewEntry,
}

/// Delete entry request.
#[derive(Debug, Deserialize)]
pub struct DeleteEntryRequest {
    /// Name of the person the entry belongs to.
    #[serde(default)]
    pub user: String,
    /// Bucket year.
    pub year: Year,
    /// Entry id.
    pub id: EntryId,
}

/// Query form of the list endpoint: `/entries?person=..&year=..`.
#[derive(Debug, Deserialize)]
pub struct ListEntriesQuery {
    /// Person name.
    pub person: String,
    /// Bucket year.
    pub year: String,
}

/// Resolve a person by name, rejecting blank names as missing input.
pub(crate) fn resolve_person(state: &AppState, name: &str) -> Result<Person, ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::InvalidInput("missing field: user".into()));
    }
    Ok(state.people.find_by_name(name)?)
}

/// Parse a year taken from the path or query string.
pub(crate) fn parse_year(raw: &str) -> Result<Year, ApiError> {
    raw.parse::<Year>().map_err(ApiError::from)
}

/// Create an entry with its attachment.
pub async fn create_entry(
    State(state): State<Arc<AppState>>,
    _auth: Authorized,
    payload: Result<Json<CreateEntryRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Entry>>, ApiError> {
    let Json(body) = payload?;

    let entry = run_blocking("create", move || {
        let person = resolve_person(&state, &body.user)?;
        Ok(state.entries.create_entry(person.id, body.year, body.fields)?)
    })
    .await?;

    Ok(Json(ApiResponse::new(
        format!("Entry saved with id {}", entry.id),
        entry,
    )))
}

/// Delete an entry and its attachment.
pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    _auth: Authorized,
    payload: Result<Json<DeleteEntryRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Entry>>, ApiError> {
    let Json(body) = payload?;

    let removed = run_blocking("delete", move || {
        let person = resolve_person(&state, &body.user)?;
        Ok(state.entries.delete_entry(person.id, body.year, &body.id)?)
    })
    .await?;

    Ok(Json(ApiResponse::new(
        format!("Entry with id {} deleted", removed.id),
        removed,
    )))
}

/// List one person's entries for a year.
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    _auth: Authorized,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<Json<ApiResponse<Vec<Entry>>>, ApiError> {
    let Path((name, year)) = path?;
    run_blocking("list", move || list(&state, &name, &year)).await
}

/// List entries addressed through query parameters.
pub async fn list_entries_by_query(
    State(state): State<Arc<AppState>>,
    _auth: Authorized,
    query: Result<Query<ListEntriesQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Entry>>>, ApiError> {
    let Query(query) = query?;
    run_blocking("list", move || list(&state, &query.person, &query.year)).await
}

fn list(state: &AppState, name: &str, year: &str) -> Result<Json<ApiResponse<Vec<Entry>>>, ApiError> {
    let year = parse_year(year)?;
    let person = resolve_person(state, name)?;

    let entries = state.entries.list_entries(person.id, year)?;

    Ok(Json(ApiResponse::new(
        format!("Found {} entries for {name} year {year}", entries.len()),
        entries,
    )))
}
