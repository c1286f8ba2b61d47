//! Authentication and rate limiting integration tests.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use common::{TestHarness, AUTH_TOKEN};
use serde_json::Value;

use rimborsi_service::ServiceConfig;

fn forwarded_for(ip: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-forwarded-for"),
        HeaderValue::from_static(ip),
    )
}

#[tokio::test]
async fn missing_token_is_forbidden() {
    let harness = TestHarness::new();

    let response = harness.server.get("/people").await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "unauthorized");
    assert_eq!(body["error"]["message"], "Not authorized");
}

#[tokio::test]
async fn wrong_token_is_forbidden() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/people")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer nope"))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn bare_token_is_accepted() {
    let harness = TestHarness::new();
    harness.seed_people().await;

    harness
        .server
        .get("/people")
        .add_header(AUTHORIZATION, HeaderValue::from_static(AUTH_TOKEN))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn normal_tier_limits_each_caller() {
    let harness = TestHarness::with_config(ServiceConfig {
        rate_limit_requests: 2,
        ..TestHarness::config()
    });
    harness.seed_people().await;

    let (name, value) = forwarded_for("203.0.113.7");
    for _ in 0..2 {
        harness
            .get("/people")
            .add_header(name.clone(), value.clone())
            .await
            .assert_status_ok();
    }
    harness
        .get("/people")
        .add_header(name.clone(), value.clone())
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    let (other_name, other_value) = forwarded_for("198.51.100.1");
    harness
        .get("/people")
        .add_header(other_name, other_value)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn failed_callers_share_strict_tier() {
    let harness = TestHarness::with_config(ServiceConfig {
        strict_rate_limit_requests: 1,
        ..TestHarness::config()
    });
    harness.seed_people().await;

    for ip in ["203.0.113.7", "198.51.100.1"] {
        let (name, value) = forwarded_for(ip);
        harness
            .server
            .get("/people")
            .add_header(name, value)
            .add_header(AUTHORIZATION, HeaderValue::from_static("wrong"))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    // The first failed caller takes the only strict slot and recovers.
    let (name, value) = forwarded_for("203.0.113.7");
    harness
        .get("/people")
        .add_header(name, value)
        .await
        .assert_status_ok();

    // The second is throttled before its token is even looked at.
    let (name, value) = forwarded_for("198.51.100.1");
    harness
        .get("/people")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_escape_strict_tier() {
    let harness = TestHarness::with_config(ServiceConfig {
        strict_rate_limit_requests: 1,
        ..TestHarness::config()
    });
    harness.seed_people().await;

    let mut statuses = Vec::new();
    for i in 0..5 {
        let response = harness
            .server
            .get("/people")
            .add_header(
                HeaderName::from_static("x-forwarded-for"),
                HeaderValue::from_str(&format!("10.0.0.{i}, 203.0.113.7")).unwrap(),
            )
            .add_header(AUTHORIZATION, HeaderValue::from_static("wrong"))
            .await;
        statuses.push(response.status_code());
    }

    assert_eq!(
        statuses,
        vec![
            StatusCode::FORBIDDEN,
            StatusCode::FORBIDDEN,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
        ]
    );
}

#[tokio::test]
async fn health_is_not_rate_limited() {
    let harness = TestHarness::with_config(ServiceConfig {
        rate_limit_requests: 0,
        ..TestHarness::config()
    });

    harness.server.get("/health").await.assert_status_ok();
    harness
        .get("/people")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}
