#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use pcx_api::{config::AppConfig, db, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "correct-horse-battery";

/// Application wired to a private in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

/// Identity and tokens of a logged-in test account
pub struct Session {
    pub user_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            3600,
            86_400,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );

        let pool = db::connect_in_memory()
            .await
            .expect("in-memory database with schema");
        let state = AppState::new(Arc::new(pool), cfg);
        let router = pcx_api::app(state.clone());

        Self { router, state }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }

    /// Sends `body` verbatim with the given content type.
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        content_type: &str,
        body: &str,
    ) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .expect("valid request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }

    pub async fn register(&self, username: &str, kind: &str) -> Response {
        self.request(
            Method::POST,
            "/register",
            Some(json!({
                "username": username,
                "password": PASSWORD,
                "registration_type": kind,
                "email": format!("{username}@example.com"),
            })),
            None,
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> Value {
        let response = self
            .request(
                Method::POST,
                "/login",
                Some(json!({ "username": username, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        response_json(response).await
    }

    /// Registers `username` as `kind` and logs in.
    pub async fn sign_up(&self, username: &str, kind: &str) -> Session {
        let response = self.register(username, kind).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = self.login(username, PASSWORD).await;
        assert_eq!(body["bool"], true, "login failed: {body}");
        session_from(&body)
    }

    pub async fn staff(&self, username: &str) -> Session {
        self.state
            .services
            .accounts
            .create_staff(username, PASSWORD)
            .await
            .expect("staff user");
        let body = self.login(username, PASSWORD).await;
        session_from(&body)
    }

    pub async fn create_product(&self, vendor: &Session, title: &str, price: &str) -> Value {
        let response = self
            .request(
                Method::POST,
                "/product",
                Some(json!({
                    "title": title,
                    "detail": format!("{title} detail"),
                    "price": price,
                    "thumbnail": format!("https://cdn.example.com/{title}.png"),
                })),
                Some(&vendor.token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        response_json(response).await
    }
}

fn session_from(body: &Value) -> Session {
    let uuid = |key: &str| body[key].as_str().and_then(|s| Uuid::parse_str(s).ok());
    Session {
        user_id: uuid("uid").expect("uid in login body"),
        customer_id: uuid("customer_id"),
        vendor_id: uuid("vendor_id"),
        token: body["access"].as_str().expect("access token").to_string(),
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
