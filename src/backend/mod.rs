//! Backend Module
//!
//! This module contains all server-side code for collaborative notes. It
//! provides an Axum HTTP server with bearer-token auth, access control,
//! invites, note persistence and per-note realtime channels.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Server initialization, application state, storage selection
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`store`** - Persistence gateway (`NoteStore`, memory and PostgreSQL)
//! - **`collab`** - Access evaluation, invites and the note service
//! - **`realtime`** - Per-note broadcast channels and presence over SSE
//! - **`auth`** - JWT sessions and the user directory
//! - **`middleware`** - Request processing middleware
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── store/          - Persistence gateway
//! ├── collab/         - Access, invites, notes
//! ├── realtime/       - Channels and presence
//! ├── auth/           - Authentication
//! ├── middleware/     - Request middleware
//! └── error/          - Error types
//! ```
//!
//! # State Management
//!
//! `AppState` holds the collaborative services, the channel hub, session
//! keys and configuration. Durable state lives behind the `NoteStore` trait;
//! presence is ephemeral and lives only in the hub.

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Persistence gateway
pub mod store;

/// Collaborative notes core
pub mod collab;

/// Real-time channels and presence
pub mod realtime;

/// Backend error types
pub mod error;

/// Authentication and user directory
pub mod auth;

/// Middleware for request processing
pub mod middleware;

pub use collab::CollabState;
pub use error::BackendError;
pub use realtime::ChannelHub;
pub use server::{create_app, AppState};
