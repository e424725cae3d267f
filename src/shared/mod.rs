//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the server and the collaboration client. These types are used for
//! serialization over the HTTP API and the realtime channel.
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types that can be used
//! in both server and client code, plus the pure presence/cursor math the
//! client renders from.

/// Note records and request/response shapes
pub mod note;

/// Invite flow types and email normalization
pub mod invite;

/// Authenticated identity
pub mod principal;

/// Presence entries and cursor placement
pub mod presence;

/// Realtime channel events
pub mod event;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::CollabError;
pub use event::ChannelEvent;
pub use invite::{InviteOutcome, PendingInvite};
pub use note::{Collaborator, Invite, Note, NoteView, Role};
pub use presence::{PresenceEntry, RemoteCursor, TextLayout};
pub use principal::Principal;
