//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! - **`router`** - Main router creation, realtime routes and layers
//! - **`api_routes`** - JSON API endpoints (auth, notes, invites)
//!
//! # Example
//!
//! ```rust,no_run
//! use notecollab::backend::collab::CollabState;
//! use notecollab::backend::routes::create_router;
//! use notecollab::backend::server::AppState;
//! use notecollab::shared::AppConfig;
//!
//! let (collab, _store, _directory) = CollabState::memory();
//! let router = create_router(AppState::new(collab, AppConfig::default()));
//! ```

/// Main router creation
pub mod router;

/// API endpoint handlers
pub mod api_routes;

pub use router::create_router;
