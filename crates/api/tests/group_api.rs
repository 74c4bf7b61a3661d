//! HTTP tests for `/api/v2/authorizations/groups/{uuid}`.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use common::{
    admin_token, body_bytes, body_json, build_test_app, delete, get, group_path, patch,
    user_token, InMemoryGroups, GROUP_UUID,
};

fn seeded() -> Arc<InMemoryGroups> {
    Arc::new(InMemoryGroups::with_group(
        GROUP_UUID,
        "name",
        Some("description"),
    ))
}

// ---------------------------------------------------------------------------
// GET
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_group_returns_representation() {
    let app = build_test_app(seeded(), false);

    let response = get(app, &group_path(GROUP_UUID), Some(&admin_token())).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"id": "1234", "name": "name", "description": "description"})
    );
}

#[tokio::test]
async fn fetch_group_without_token_is_unauthorized() {
    let app = build_test_app(seeded(), false);

    let response = get(app, &group_path(GROUP_UUID), None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn fetch_group_requires_admin() {
    let app = build_test_app(seeded(), false);

    let response = get(app, &group_path(GROUP_UUID), Some(&user_token())).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["message"], "Insufficient privileges");
}

#[tokio::test]
async fn fetch_unknown_group_is_not_found() {
    let app = build_test_app(Arc::new(InMemoryGroups::default()), false);

    let response = get(app, &group_path(GROUP_UUID), Some(&admin_token())).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Group '1234' not found");
}

#[tokio::test]
async fn fetch_is_allowed_on_managed_instance() {
    let app = build_test_app(seeded(), true);

    let response = get(app, &group_path(GROUP_UUID), Some(&admin_token())).await;

    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// PATCH
// ---------------------------------------------------------------------------

#[tokio::test]
async fn patch_updates_name_and_description() {
    let groups = seeded();
    let app = build_test_app(Arc::clone(&groups), false);

    let response = patch(
        app,
        &group_path(GROUP_UUID),
        &admin_token(),
        json!({"name": "newName", "description": "newDescription"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"id": "1234", "name": "newName", "description": "newDescription"})
    );
    let stored = groups.get(GROUP_UUID).unwrap();
    assert_eq!(stored.name, "newName");
    assert_eq!(stored.description.as_deref(), Some("newDescription"));
}

#[tokio::test]
async fn patch_keeps_absent_fields() {
    let groups = seeded();
    let app = build_test_app(Arc::clone(&groups), false);

    let body = json!({"name": "renamed"});
    let response = patch(app, &group_path(GROUP_UUID), &admin_token(), body).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"id": "1234", "name": "renamed", "description": "description"})
    );
}

#[tokio::test]
async fn patch_with_null_description_clears_it() {
    let groups = seeded();
    let app = build_test_app(Arc::clone(&groups), false);

    let body = json!({"description": null});
    let response = patch(app, &group_path(GROUP_UUID), &admin_token(), body).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["description"], serde_json::Value::Null);
    assert_eq!(groups.get(GROUP_UUID).unwrap().description, None);
}

#[tokio::test]
async fn patch_with_null_name_is_rejected() {
    let groups = seeded();
    let app = build_test_app(Arc::clone(&groups), false);

    let response = patch(app, &group_path(GROUP_UUID), &admin_token(), json!({"name": null})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(groups.update_count(), 0);
}

#[tokio::test]
async fn patch_is_idempotent() {
    let groups = seeded();
    let body = json!({"name": "newName", "description": null});

    let first = patch(
        build_test_app(Arc::clone(&groups), false),
        &group_path(GROUP_UUID),
        &admin_token(),
        body.clone(),
    )
    .await;
    let second = patch(
        build_test_app(Arc::clone(&groups), false),
        &group_path(GROUP_UUID),
        &admin_token(),
        body,
    )
    .await;

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(body_json(first).await, body_json(second).await);
    assert_eq!(groups.update_count(), 1);
}

#[tokio::test]
async fn patch_requires_admin_even_on_managed_instance() {
    let app = build_test_app(seeded(), true);

    let response = patch(app, &group_path(GROUP_UUID), &user_token(), json!({"name": "x"})).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["message"], "Insufficient privileges");
}

#[tokio::test]
async fn patch_on_managed_instance_is_refused() {
    let groups = seeded();
    let app = build_test_app(Arc::clone(&groups), true);

    let response = patch(app, &group_path(GROUP_UUID), &admin_token(), json!({"name": "x"})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "the instance is managed");
    assert_eq!(groups.get(GROUP_UUID).unwrap().name, "name");
}

#[tokio::test]
async fn managed_check_precedes_existence_check() {
    let app = build_test_app(Arc::new(InMemoryGroups::default()), true);

    let response = patch(app, &group_path(GROUP_UUID), &admin_token(), json!({"name": "x"})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "the instance is managed");
}

#[tokio::test]
async fn patch_unknown_group_is_not_found() {
    let app = build_test_app(Arc::new(InMemoryGroups::default()), false);

    let response = patch(app, &group_path(GROUP_UUID), &admin_token(), json!({"name": "x"})).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Group '1234' not found");
}

#[tokio::test]
async fn patch_with_overlong_description_is_rejected() {
    let groups = seeded();
    let app = build_test_app(Arc::clone(&groups), false);

    let response = patch(
        app,
        &group_path(GROUP_UUID),
        &admin_token(),
        json!({"description": "d".repeat(201)}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(groups.update_count(), 0);
}

#[tokio::test]
async fn patch_with_plain_json_content_type_is_unsupported() {
    let app = build_test_app(seeded(), false);
    let request = axum::http::Request::builder()
        .method(axum::http::Method::PATCH)
        .uri(group_path(GROUP_UUID))
        .header(axum::http::header::AUTHORIZATION, format!("Bearer {}", admin_token()))
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(r#"{"name":"x"}"#))
        .unwrap();

    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

// ---------------------------------------------------------------------------
// DELETE
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_group_returns_no_content() {
    let groups = seeded();
    let app = build_test_app(Arc::clone(&groups), false);

    let response = delete(app, &group_path(GROUP_UUID), &admin_token()).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(response).await.is_empty());
    assert!(groups.get(GROUP_UUID).is_none());
    assert_eq!(groups.delete_count(), 1);
}

#[tokio::test]
async fn delete_requires_admin() {
    let groups = seeded();
    let app = build_test_app(Arc::clone(&groups), false);

    let response = delete(app, &group_path(GROUP_UUID), &user_token()).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["message"], "Insufficient privileges");
    assert!(groups.get(GROUP_UUID).is_some());
}

#[tokio::test]
async fn delete_on_managed_instance_is_refused() {
    let groups = seeded();
    let app = build_test_app(Arc::clone(&groups), true);

    let response = delete(app, &group_path(GROUP_UUID), &admin_token()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "the instance is managed");
    assert_eq!(groups.delete_count(), 0);
}

#[tokio::test]
async fn delete_unknown_group_is_not_found() {
    let app = build_test_app(Arc::new(InMemoryGroups::default()), false);

    let response = delete(app, &group_path(GROUP_UUID), &admin_token()).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Group '1234' not found");
}
