//! People roster handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use rimborsi_core::Person;
use serde::Deserialize;

use crate::auth::Authorized;
use crate::error::ApiError;
use crate::handlers::{run_blocking, ApiResponse};
use crate::state::AppState;

/// Replace roster request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacePeopleRequest {
    /// The complete new roster.
    pub people: Vec<Person>,
    /// Administrative secret.
    #[serde(default)]
    pub admin_token: String,
}

/// List the people roster.
pub async fn list_people(
    State(state): State<Arc<AppState>>,
    _auth: Authorized,
) -> Result<Json<ApiResponse<Vec<Person>>>, ApiError> {
    let people = run_blocking("list people", move || Ok(state.people.list()?)).await?;

    Ok(Json(ApiResponse::new(
        format!("Found {} people", people.len()),
        people,
    )))
}

/// Replace the whole roster. Requires the admin token in the body.
pub async fn replace_people(
    State(state): State<Arc<AppState>>,
    _auth: Authorized,
    payload: Result<Json<ReplacePeopleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<Person>>>), ApiError> {
    let Json(body) = payload?;

    let people = body.people.clone();
    run_blocking("replace people", move || {
        Ok(state.people.replace(body.people, &body.admin_token)?)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(format!("Saved {} people", people.len()), people)),
    ))
}
