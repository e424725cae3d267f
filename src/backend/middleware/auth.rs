/**
 * Authentication Middleware
 *
 * Verifies bearer tokens and attaches the resulting [`Principal`] to the
 * request extensions. Requests without an `Authorization` header pass
 * through untouched so that public endpoints (note view, anonymous note
 * creation) share the same router; handlers that need a principal use the
 * [`AuthUser`] extractor, which rejects with 401 when none was attached.
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::backend::auth::SessionKeys;
use crate::backend::error::BackendError;
use crate::shared::principal::Principal;

/// Authentication middleware
///
/// 1. Reads the `Authorization: Bearer <token>` header, if any
/// 2. Verifies the token
/// 3. Attaches the principal to request extensions
///
/// A present but malformed or invalid token is rejected with 401.
pub async fn auth_middleware(
    State(keys): State<SessionKeys>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = match request.headers().get(AUTHORIZATION) {
        Some(header) => header,
        None => return next.run(request).await,
    };

    let token = match header.to_str().ok().and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token.trim(),
        None => {
            tracing::warn!("[Auth] Invalid Authorization header format");
            return unauthorized("Invalid Authorization header");
        }
    };

    match keys.principal_from_token(token) {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!("[Auth] Invalid token: {}", e);
            unauthorized("Invalid or expired session")
        }
    }
}

fn unauthorized(message: &str) -> Response {
    BackendError::handler(StatusCode::UNAUTHORIZED, message).into_response()
}

/// Axum extractor for the authenticated principal
#[derive(Clone, Debug)]
pub struct AuthUser(pub Principal);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| BackendError::handler(StatusCode::UNAUTHORIZED, "Login required"))
    }
}

/// Extractor for endpoints where authentication is optional
#[derive(Clone, Debug)]
pub struct MaybeAuthUser(pub Option<Principal>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(parts.extensions.get::<Principal>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request as HttpRequest, middleware, routing::get, Router};
    use std::time::Duration;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app(keys: SessionKeys) -> Router {
        Router::new()
            .route(
                "/who",
                get(|MaybeAuthUser(principal): MaybeAuthUser| async move {
                    principal.map(|p| p.email).unwrap_or_else(|| "anonymous".to_string())
                }),
            )
            .route("/private", get(|AuthUser(p): AuthUser| async move { p.email }))
            .layer(middleware::from_fn_with_state(keys, auth_middleware))
    }

    fn keys() -> SessionKeys {
        SessionKeys::new("middleware-secret", Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_missing_header_passes_through() {
        let response = app(keys())
            .oneshot(HttpRequest::get("/who").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_private_route_requires_principal() {
        let response = app(keys())
            .oneshot(HttpRequest::get("/private").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_attaches_principal() {
        let keys = keys();
        let token = keys
            .create_token(&Principal::new(Uuid::new_v4(), "a@example.com"))
            .unwrap();
        let response = app(keys)
            .oneshot(
                HttpRequest::get("/private")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bad_token_is_rejected() {
        let response = app(keys())
            .oneshot(
                HttpRequest::get("/who")
                    .header(AUTHORIZATION, "Bearer nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
