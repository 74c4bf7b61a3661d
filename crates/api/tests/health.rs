mod common;

use std::sync::Arc;

use axum::http::StatusCode;

use common::{body_json, build_test_app, get, InMemoryGroups};

#[tokio::test]
async fn health_reports_degraded_without_database() {
    let app = build_test_app(Arc::new(InMemoryGroups::default()), false);

    let response = get(app, "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["db_healthy"], false);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = build_test_app(Arc::new(InMemoryGroups::default()), false);

    let response = get(app, "/health", None).await;

    assert!(response.headers().contains_key("x-request-id"));
}
