//! Rimborsi HTTP API Service.
//!
//! This crate exposes the expense-reimbursement ledger over HTTP:
//!
//! - People roster listing and replacement
//! - Entry creation, deletion and listing per person and year
//! - Single attachment download
//! - Paginated zip export of a person's year
//!
//! # Authentication
//!
//! Every API request carries a shared bearer token, checked by the
//! [`auth::AuthGate`] after a per-caller rate limit. Replacing the roster
//! additionally requires the admin token in the request body.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Axum handlers must be async

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use auth::{AuthGate, Authorized};
pub use config::ServiceConfig;
pub use error::ApiError;
pub use rate_limit::{FixedWindowLimiter, RateLimiter};
pub use routes::create_router;
pub use state::AppState;
