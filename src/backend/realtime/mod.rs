//! Real-time Module
//!
//! Per-note realtime channels: content-change broadcasts and presence.
//!
//! # Architecture
//!
//! - **`broadcast`** - Event broadcasting utilities and type definitions
//! - **`hub`** - Per-note channels, presence maps and memberships
//! - **`subscription`** - Server-Sent Events stream and publish handlers
//!
//! # Real-time System
//!
//! Subscribers receive events over Server-Sent Events and publish through
//! plain POST requests addressed by the connection id they got in the
//! `joined` event. A participant never receives its own `content_updated`.

/// Event broadcasting utilities
pub mod broadcast;

/// Per-note channel hub
pub mod hub;

/// Server-Sent Events subscription handler
pub mod subscription;

pub use broadcast::{broadcast_event, NoteBroadcast};
pub use hub::{ChannelHub, ChannelMembership};
pub use subscription::{handle_content_broadcast, handle_note_subscription, handle_presence_update};
