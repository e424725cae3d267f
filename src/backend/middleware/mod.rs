//! Middleware Module
//!
//! This module contains all HTTP middleware for the backend server.
//!
//! - **`auth`** - Bearer token verification and principal extractors
//!
//! # Example
//!
//! ```rust,no_run
//! use notecollab::backend::middleware::auth_middleware;
//!
//! // let app = router.layer(axum::middleware::from_fn_with_state(keys, auth_middleware));
//! ```

pub mod auth;

pub use auth::{auth_middleware, AuthUser, MaybeAuthUser};
