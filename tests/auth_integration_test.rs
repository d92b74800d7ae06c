//! Registration, login and token handling over HTTP.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp, PASSWORD};
use pcx_api::entities::user;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

#[tokio::test]
async fn register_customer_returns_created() {
    let app = TestApp::new().await;

    let response = app.register("alice", "customer").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    assert!(body["user_id"].is_string());
    assert!(body["customer_id"].is_string());
    assert!(body.get("vendor_id").is_none());
}

#[tokio::test]
async fn duplicate_username_is_rejected_and_stores_one_identity() {
    let app = TestApp::new().await;

    assert_eq!(
        app.register("alice", "customer").await.status(),
        StatusCode::CREATED
    );
    let second = app.register("alice", "vendor").await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);

    let count = user::Entity::find()
        .filter(user::Column::Username.eq("alice"))
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn register_without_password_is_a_validation_error() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/register",
            Some(json!({ "username": "carol", "registration_type": "customer" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_reports_role_and_tokens() {
    let app = TestApp::new().await;
    app.register("bob", "vendor").await;

    let body = app.login("bob", PASSWORD).await;
    assert_eq!(body["bool"], true);
    assert_eq!(body["user"], "bob");
    assert_eq!(body["user_type"], "vendor");
    assert!(body["vendor_id"].is_string());
    assert!(body["access"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["refresh"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn failed_login_is_still_http_ok() {
    let app = TestApp::new().await;
    app.register("alice", "customer").await;

    let wrong_password = app.login("alice", "not-the-password").await;
    assert_eq!(wrong_password["bool"], false);
    assert!(wrong_password["msg"].is_string());

    let unknown_user = app.login("nobody", PASSWORD).await;
    assert_eq!(unknown_user["bool"], false);
}

#[tokio::test]
async fn malformed_login_body_is_still_http_ok() {
    let app = TestApp::new().await;

    let response = app
        .request_raw(Method::POST, "/login", "application/json", "{not json")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["bool"], false);
    assert!(body["msg"].as_str().is_some_and(|m| !m.is_empty()));

    let response = app
        .request_raw(Method::POST, "/login", "text/plain", "username=alice")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["bool"], false);
}

#[tokio::test]
async fn login_accepts_form_encoded_credentials() {
    let app = TestApp::new().await;
    app.register("alice", "customer").await;

    let response = app
        .request_raw(
            Method::POST,
            "/login",
            "application/x-www-form-urlencoded",
            &format!("username=alice&password={PASSWORD}"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["bool"], true);
    assert_eq!(body["user_type"], "customer");

    let response = app
        .request_raw(
            Method::POST,
            "/login",
            "application/x-www-form-urlencoded",
            "username=alice&password=wrong",
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["bool"], false);
}

#[tokio::test]
async fn refresh_exchanges_refresh_token_for_new_pair() {
    let app = TestApp::new().await;
    app.register("alice", "customer").await;
    let login = app.login("alice", PASSWORD).await;

    let response = app
        .request(
            Method::POST,
            "/token/refresh",
            Some(json!({ "refresh": login["refresh"] })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["access_token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = TestApp::new().await;

    let anonymous = app.request(Method::GET, "/orders", None, None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let forged = app
        .request(Method::GET, "/orders", None, Some("not-a-jwt"))
        .await;
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/status", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}
