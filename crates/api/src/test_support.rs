//! Router harness for route tests.
//!
//! Each call builds a fresh in-memory `SQLite` database behind the real router, so
//! tests go through the auth middleware and error mapping exactly as clients do.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, header},
};
use http_body_util::BodyExt;
use quarry_core::payment::CustodyPolicy;
use quarry_db::schema::create_tables;
use quarry_shared::{JwtConfig, JwtService, TracingAuditSink};
use rust_decimal_macros::dec;
use sea_orm::{ConnectOptions, Database};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{AppState, create_router};

/// Router and state over a fresh database.
pub async fn test_app() -> (Router, AppState) {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    create_tables(&db).await.unwrap();

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(JwtService::new(JwtConfig::default())),
        audit: Arc::new(TracingAuditSink),
        custody: Arc::new(CustodyPolicy::new(["Karim", "Samir"])),
        vat_rate: dec!(0.19),
    };
    (create_router(state.clone()), state)
}

/// Bearer token for an admin.
pub fn admin_token(state: &AppState) -> String {
    state
        .jwt_service
        .generate_access_token(Uuid::now_v7(), "admin@quarry.dz", "admin")
        .unwrap()
}

/// Bearer token for a non-admin clerk.
pub fn clerk_token(state: &AppState) -> String {
    state
        .jwt_service
        .generate_access_token(Uuid::now_v7(), "clerk@quarry.dz", "clerk")
        .unwrap()
}

/// Sends one request through a clone of the router.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

/// Collects a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Creates a record through the API and returns its id.
pub async fn create_id(app: &Router, token: &str, uri: &str, body: Value) -> String {
    let response = send(app, Method::POST, uri, Some(token), Some(body)).await;
    assert_eq!(response.status(), 201, "POST {uri} failed");
    body_json(response).await["id"]
        .as_str()
        .unwrap()
        .to_string()
}
