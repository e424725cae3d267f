/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * 1. Health check
 * 2. Realtime routes (SSE subscription, broadcast, presence)
 * 3. API routes (auth, notes, invites)
 * 4. Fallback handler (404)
 *
 * # Layers
 *
 * Every route runs behind the bearer-token middleware, which attaches the
 * principal when a valid token is present, and `TraceLayer` for request
 * logging.
 */

use axum::{
    http::StatusCode,
    middleware,
    response::Response,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::backend::error::rejection;
use crate::backend::middleware::auth_middleware;
use crate::backend::realtime::{
    handle_content_broadcast, handle_note_subscription, handle_presence_update,
};
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// ## Realtime Routes
///
/// - `GET  /api/notes/{id}/realtime` - Note channel subscription (SSE)
/// - `POST /api/notes/{id}/realtime/{connection_id}/broadcast` - Content changed
/// - `POST /api/notes/{id}/realtime/{connection_id}/presence` - Cursor offset
///
/// ## API Routes
///
/// See [`configure_api_routes`].
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new()
        .route("/health", get(health))
        .route("/api/notes/{id}/realtime", get(handle_note_subscription))
        .route(
            "/api/notes/{id}/realtime/{connection_id}/broadcast",
            post(handle_content_broadcast),
        )
        .route(
            "/api/notes/{id}/realtime/{connection_id}/presence",
            post(handle_presence_update),
        );

    // Add API routes
    let router = configure_api_routes(router);

    // Fallback handler for 404
    let router = router.fallback(not_found);

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(
                    app_state.sessions.clone(),
                    auth_middleware,
                )),
        )
        .with_state(app_state)
}

async fn health() -> &'static str {
    "ok"
}

async fn not_found() -> Response {
    rejection(StatusCode::NOT_FOUND, "Not found")
}
