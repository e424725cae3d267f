//! Common test utilities and helpers
//!
//! This module provides shared utilities for the integration tests:
//! - An application router over the in-memory store
//! - Bearer tokens for test principals
//! - A JSON request helper driving the router with `oneshot`

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use notecollab::backend::auth::{MemoryDirectory, UserDirectory};
use notecollab::backend::collab::CollabState;
use notecollab::backend::routes::router::create_router;
use notecollab::backend::server::AppState;
use notecollab::backend::store::MemoryStore;
use notecollab::shared::config::AppConfig;
use notecollab::shared::principal::Principal;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Router plus handles on its in-memory tables
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: MemoryStore,
    pub directory: MemoryDirectory,
}

pub fn test_app() -> TestApp {
    let (collab, store, directory) = CollabState::memory();
    let config = AppConfig::builder()
        .jwt_secret(TEST_SECRET)
        .build()
        .expect("test config is valid");
    let state = AppState::new(collab, config);
    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        directory,
    }
}

pub fn principal(email: &str) -> Principal {
    Principal::new(Uuid::new_v4(), email)
}

impl TestApp {
    pub fn token(&self, principal: &Principal) -> String {
        self.state
            .sessions
            .create_token(principal)
            .expect("token should be created")
    }

    /// A principal already present in the user directory
    pub async fn registered(&self, email: &str) -> Principal {
        let principal = principal(email);
        self.directory
            .register(&principal)
            .await
            .expect("memory directory never fails");
        principal
    }

    pub fn collab(&self) -> &CollabState {
        &self.state.collab
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty)
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }
}

/// Assert an error response carries the expected status and code
pub fn assert_error(response: &(StatusCode, Value), status: StatusCode, code: &str) {
    assert_eq!(response.0, status, "unexpected status, body: {}", response.1);
    assert_eq!(response.1["code"], code, "unexpected code, body: {}", response.1);
}
