//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderName;
use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::download::{
    X_DOWNLOAD_BYTES, X_DOWNLOAD_FROM, X_DOWNLOAD_MAX, X_DOWNLOAD_TO,
};
use crate::handlers::{download, entries, health, people};
use crate::state::AppState;

/// Maximum concurrent requests for API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /` - Health check
/// - `GET /health` - Health check
///
/// ## API (bearer token, rate-limited)
/// - `GET /people` - List the roster
/// - `POST /people` - Replace the roster (admin token in body)
/// - `POST /entry` - Create an entry
/// - `DELETE /entry` - Delete an entry
/// - `GET /entries?person=&year=` - List entries
/// - `GET /entries/{person}/{year}` - List entries
/// - `GET /entries/{person}/{year}/download?first=` - Zip slice of a bucket
/// - `GET /entries/{person}/{year}/download/{entry_id}` - One attachment
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        .route(
            "/people",
            get(people::list_people).post(people::replace_people),
        )
        .route(
            "/entry",
            post(entries::create_entry).delete(entries::delete_entry),
        )
        .route("/entries", get(entries::list_entries_by_query))
        .route("/entries/:person/:year", get(entries::list_entries))
        .route(
            "/entries/:person/:year/download",
            get(download::download_archive),
        )
        .route(
            "/entries/:person/:year/download/:entry_id",
            get(download::download_attachment),
        )
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/", get(health::health))
        .route("/health", get(health::health))
        .merge(api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let exposed = [X_DOWNLOAD_FROM, X_DOWNLOAD_TO, X_DOWNLOAD_MAX, X_DOWNLOAD_BYTES]
        .map(HeaderName::from_static);

    let cors = if origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    cors.allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(exposed)
}
