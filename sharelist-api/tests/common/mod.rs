//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - An in-memory application per test
//! - Request helpers that speak JSON and the identity header
//! - Shortcuts for registering users and creating lists

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use sharelist_api::app::{build_router, AppState};
use sharelist_api::config::{Config, StorageBackend};
use sharelist_shared::auth::access::ReadPolicy;
use sharelist_shared::auth::identity::IDENTITY_HEADER;
use tower::ServiceExt;

/// Test context containing the application under test
pub struct TestContext {
    pub app: axum::Router,
    pub state: AppState,
}

/// Decoded response
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestContext {
    /// Fresh in-memory application with the default (open) read policy
    pub fn new() -> Self {
        Self::with_policy(ReadPolicy::Open)
    }

    pub fn with_policy(read_policy: ReadPolicy) -> Self {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Memory;
        config.access.read_policy = read_policy;

        let state = AppState::in_memory(config);
        let app = build_router(state.clone());

        Self { app, state }
    }

    /// Sends a request; `identity` goes into the identity header
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        identity: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(identity) = identity {
            builder = builder.header(IDENTITY_HEADER, identity);
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, identity: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, identity, None).await
    }

    pub async fn post(&self, uri: &str, identity: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, uri, identity, Some(body)).await
    }

    pub async fn put(&self, uri: &str, identity: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, identity, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, identity: Option<&str>) -> TestResponse {
        self.send(Method::DELETE, uri, identity, None).await
    }

    /// Registers an account and returns its id (the identity token)
    pub async fn register(&self, username: &str, password: &str) -> String {
        let response = self
            .post(
                "/api/auth/register",
                None,
                serde_json::json!({ "username": username, "password": password }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

        response.body["id"].as_str().unwrap().to_string()
    }

    /// Creates a list as `identity` and returns its id
    pub async fn create_list(&self, identity: &str, title: &str) -> String {
        let response = self
            .post("/api/todos", Some(identity), serde_json::json!({ "title": title }))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

        response.body["id"].as_str().unwrap().to_string()
    }

    /// Joins a list as `identity` under `username`
    pub async fn join(&self, list_id: &str, identity: &str, username: &str) -> TestResponse {
        self.post(
            &format!("/api/todos/{}/users", list_id),
            Some(identity),
            serde_json::json!({ "username": username }),
        )
        .await
    }
}

/// Id of the task at `index` in a list body
pub fn task_id(list: &Value, index: usize) -> String {
    list["tasks"][index]["id"].as_str().unwrap().to_string()
}
