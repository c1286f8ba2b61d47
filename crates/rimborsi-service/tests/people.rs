//! People roster integration tests.

mod common;

use axum::http::StatusCode;
use common::{TestHarness, ADMIN_TOKEN};
use serde_json::{json, Value};

use rimborsi_store::KvStore;

#[tokio::test]
async fn list_before_initialization_is_not_ready() {
    let harness = TestHarness::new();

    let response = harness.get("/people").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "not_ready");
}

#[tokio::test]
async fn replace_then_list_returns_roster() {
    let harness = TestHarness::new();
    harness.seed_people().await;

    let response = harness.get("/people").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        body["data"],
        json!([{"id": 1, "name": "Anna"}, {"id": 2, "name": "Bruno"}])
    );
    assert_eq!(body["message"], "Found 2 people");
}

#[tokio::test]
async fn replace_with_wrong_admin_token_is_forbidden() {
    let harness = TestHarness::new();

    let response = harness
        .post("/people")
        .json(&json!({
            "people": [{"id": 1, "name": "Anna"}],
            "adminToken": "wrong"
        }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert!(harness.store.get("people").unwrap().is_none());
}

#[tokio::test]
async fn replace_without_admin_token_is_forbidden() {
    let harness = TestHarness::new();

    let response = harness
        .post("/people")
        .json(&json!({"people": [{"id": 1, "name": "Anna"}]}))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn colliding_roster_is_rejected_and_previous_kept() {
    let harness = TestHarness::new();
    harness.seed_people().await;

    for people in [
        json!([{"id": 1, "name": "Anna"}, {"id": 2, "name": "Anna"}]),
        json!([{"id": 1, "name": "Anna"}, {"id": 1, "name": "Bruno"}]),
        json!([]),
    ] {
        let response = harness
            .post("/people")
            .json(&json!({"people": people, "adminToken": ADMIN_TOKEN}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    let body: Value = harness.get("/people").await.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_payload_is_bad_request() {
    let harness = TestHarness::new();

    let response = harness
        .post("/people")
        .json(&json!({"people": "everyone", "adminToken": ADMIN_TOKEN}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "invalid_input");
}
