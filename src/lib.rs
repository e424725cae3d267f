//! Notecollab - Main Library
//!
//! Collaborative note editing with presence: several principals edit one
//! note at a time, saves are debounced and last-writer-wins, and every
//! participant sees the others' cursors.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared between client and server
//!   - Notes, collaborators, invites, presence entries, channel events
//!   - Cursor layout math
//!   - Error types and configuration
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum HTTP server, bearer-token auth
//!   - Access evaluation, invites, note service
//!   - Persistence gateway (memory or PostgreSQL)
//!   - Per-note realtime channels over Server-Sent Events
//!
//! - **`client`** - Collaboration session controller
//!   - Debounced save, remote refetch, cursor throttle
//!   - HTTP/SSE adapters (plus in-process adapters with `ssr`)
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - enables the backend and the in-process client
//!   adapters
//!
//! # Consistency
//!
//! There is no merge. A save overwrites the note; other sessions refetch on
//! the `content_updated` broadcast. Concurrent writers race and the last one
//! wins.
//!
//! # Error Handling
//!
//! - `shared::CollabError` for every core failure, with a stable code
//! - `backend::BackendError` maps it to HTTP responses

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;

/// Collaboration session controller
pub mod client;
