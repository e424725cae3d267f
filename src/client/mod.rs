//! Client Module
//!
//! The collaboration session controller and the adapters it runs on.
//!
//! - **`session`** - [`CollabSession`]: load, debounced save, remote refetch,
//!   cursor presence
//! - **`gateway`** - [`NoteGateway`] over HTTP (or in-process)
//! - **`channel`** - [`RealtimeConnector`] over SSE (or the in-process hub)
//! - **`debounce`** - Debounce and throttle timers
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use notecollab::client::{CollabSession, HttpGateway, SessionOptions, SseConnector};
//!
//! # async fn example(note_id: uuid::Uuid) -> Result<(), notecollab::shared::CollabError> {
//! let gateway = Arc::new(HttpGateway::new("http://localhost:3000", "token"));
//! let connector = SseConnector::new("http://localhost:3000", "token");
//! let session = CollabSession::open(note_id, gateway, &connector, SessionOptions::default()).await?;
//! session.on_remote_update(|content| println!("remote: {}", content));
//! session.set_content("hello");
//! session.track_cursor(5);
//! # Ok(())
//! # }
//! ```

/// Debounce and throttle primitives
pub mod debounce;

/// Persistence gateway adapters
pub mod gateway;

/// Realtime channel adapters
pub mod channel;

/// Collaboration session controller
pub mod session;

pub use channel::{ChannelPublisher, ChannelSubscription, RealtimeConnector, SseConnector};
#[cfg(feature = "ssr")]
pub use channel::HubConnector;
#[cfg(feature = "ssr")]
pub use gateway::DirectGateway;
pub use gateway::{HttpGateway, NoteGateway};
pub use session::{CollabSession, SaveStatus, SessionOptions};
