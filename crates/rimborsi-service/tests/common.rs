//! Common test utilities for rimborsi integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderValue;
use axum::Router;
use axum_test::{TestRequest, TestServer};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};

use rimborsi_service::{create_router, AppState, ServiceConfig};
use rimborsi_store::MemoryStore;

/// Bearer token accepted by the test service.
pub const AUTH_TOKEN: &str = "test-token";

/// Admin token accepted by the test service.
pub const ADMIN_TOKEN: &str = "test-admin";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The backing store, for inspecting raw keys.
    pub store: Arc<MemoryStore>,
}

impl TestHarness {
    /// Create a new test harness with a fresh in-memory store.
    pub fn new() -> Self {
        Self::with_config(Self::config())
    }

    /// Create a harness with a custom configuration.
    pub fn with_config(config: ServiceConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self { server, store }
    }

    /// Configuration used by [`TestHarness::new`]: known tokens and rate
    /// limits high enough not to interfere.
    pub fn config() -> ServiceConfig {
        ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            auth_token: AUTH_TOKEN.into(),
            admin_token: ADMIN_TOKEN.into(),
            rate_limit_requests: 10_000,
            strict_rate_limit_requests: 10_000,
            ..ServiceConfig::default()
        }
    }

    /// Authorization header for the test token.
    pub fn auth_header() -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {AUTH_TOKEN}")).unwrap()
    }

    /// Authenticated GET.
    pub fn get(&self, path: &str) -> TestRequest {
        self.server
            .get(path)
            .add_header(AUTHORIZATION, Self::auth_header())
    }

    /// Authenticated POST.
    pub fn post(&self, path: &str) -> TestRequest {
        self.server
            .post(path)
            .add_header(AUTHORIZATION, Self::auth_header())
    }

    /// Authenticated DELETE.
    pub fn delete(&self, path: &str) -> TestRequest {
        self.server
            .delete(path)
            .add_header(AUTHORIZATION, Self::auth_header())
    }

    /// Store a roster of Anna (1) and Bruno (2).
    pub async fn seed_people(&self) {
        self.post("/people")
            .json(&json!({
                "people": [{"id": 1, "name": "Anna"}, {"id": 2, "name": "Bruno"}],
                "adminToken": ADMIN_TOKEN
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
    }

    /// Create an entry and return the stored entry JSON.
    pub async fn create_entry(
        &self,
        user: &str,
        year: u16,
        body: &[u8],
        file_name: Option<&str>,
    ) -> Value {
        let mut payload = json!({
            "user": user,
            "year": year,
            "date": "2024-03-01",
            "importo": 12.5,
            "content": STANDARD.encode(body),
            "contentFileType": "application/pdf",
        });
        if let Some(name) = file_name {
            payload["contentFileName"] = json!(name);
        }

        let response = self.post("/entry").json(&payload).await;
        response.assert_status_ok();
        response.json::<Value>()["data"].clone()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
