/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container for the
 * application, holding:
 * - Collaborative notes state (store, directory, services)
 * - The per-note realtime channel hub
 * - Session keys for bearer tokens
 * - The loaded configuration
 *
 * # State Extraction
 *
 * The `FromRef` implementations allow Axum handlers to extract specific
 * parts of the state without needing the entire `AppState`.
 *
 * # Example
 *
 * ```rust
 * use notecollab::backend::collab::CollabState;
 * use axum::extract::State;
 *
 * async fn handler(State(collab): State<CollabState>) {
 *     let _notes = &collab.notes;
 * }
 * ```
 */

use axum::extract::FromRef;
use std::sync::Arc;

use crate::backend::auth::SessionKeys;
use crate::backend::collab::CollabState;
use crate::backend::realtime::ChannelHub;
use crate::shared::AppConfig;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Note store, user directory and the services over them
    pub collab: CollabState,

    /// Per-note realtime channels and presence
    pub hub: ChannelHub,

    /// Bearer token signing and verification
    pub sessions: SessionKeys,

    /// Configuration the server was started with
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(collab: CollabState, config: AppConfig) -> Self {
        Self {
            collab,
            hub: ChannelHub::new(config.channel_capacity),
            sessions: SessionKeys::from_config(&config),
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for CollabState {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.collab.clone()
    }
}

impl FromRef<AppState> for ChannelHub {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.hub.clone()
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}
