/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including storage selection, state creation and route configuration.
 *
 * # Initialization Process
 *
 * 1. Load storage (PostgreSQL or in-memory)
 * 2. Build the collaborative services over it
 * 3. Create the channel hub and session keys
 * 4. Create and configure the router
 */

use axum::Router;

use crate::backend::collab::CollabState;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::load_store;
use crate::backend::server::state::AppState;
use crate::shared::AppConfig;

/// Create and configure the Axum application
///
/// # Errors
///
/// Fails when a database is configured but cannot be reached or migrated.
pub async fn create_app(config: AppConfig) -> Result<Router<()>, sqlx::Error> {
    tracing::info!("Initializing notecollab backend server");

    let (store, directory) = load_store(&config).await?;
    let app_state = AppState::new(CollabState::new(store, directory), config);

    tracing::info!(
        "Router configured (save debounce {}ms, cursor throttle {}ms)",
        app_state.config.save_debounce_ms,
        app_state.config.cursor_throttle_ms
    );

    Ok(create_router(app_state))
}
