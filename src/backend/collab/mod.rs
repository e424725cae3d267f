//! Collaborative Notes Module
//!
//! Server-side core of collaborative note editing:
//!
//! - **`access`** - Read/edit access evaluation for collaborative notes
//! - **`invites`** - Email invitations and their acceptance
//! - **`notes`** - Note lifecycle: create, open, save, delete, list, view
//! - **`state`** - Shared state bundling the services
//! - **`handlers`** - HTTP handlers for `/api/notes`
//!
//! # Example
//!
//! ```rust,no_run
//! use notecollab::backend::collab::CollabState;
//! use notecollab::shared::note::CreateNoteRequest;
//! use notecollab::shared::Principal;
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), notecollab::shared::CollabError> {
//! let (state, _store, _directory) = CollabState::memory();
//! let owner = Principal::new(Uuid::new_v4(), "owner@example.com");
//! let expires_at = chrono::Utc::now() + chrono::Duration::hours(2);
//! let created = state
//!     .notes
//!     .create_note(Some(&owner), CreateNoteRequest::collaborative(expires_at))
//!     .await?;
//! let view = state.notes.open_for_edit(created.id, &owner).await?;
//! # Ok(())
//! # }
//! ```

/// Access control evaluation
pub mod access;

/// Invite management
pub mod invites;

/// Note lifecycle operations
pub mod notes;

/// Shared collaborative state
pub mod state;

/// HTTP handlers
pub mod handlers;

pub use access::{Access, AccessEvaluator};
pub use invites::InviteManager;
pub use notes::NoteService;
pub use state::CollabState;
