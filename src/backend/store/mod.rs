//! Persistence Gateway
//!
//! Durable storage for notes, collaborator rows and invite rows behind the
//! [`NoteStore`] trait. Two implementations ship with the crate:
//!
//! - [`MemoryStore`] - process-local tables, used when no database is configured
//!   and by the test suite
//! - [`PgStore`] - PostgreSQL via `sqlx`
//!
//! Both enforce the same uniqueness rules: one collaborator row per
//! `(note_id, user_id)` and one invite per `(note_id, email)`. Inserts that hit
//! those rules report [`InsertOutcome::AlreadyExists`] instead of failing,
//! which is what makes invite acceptance safe to run twice.
//!
//! Every failure of the underlying store surfaces as
//! [`CollabError::TransientIo`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::shared::error::CollabError;
use crate::shared::note::{Collaborator, Invite, Note};

/// In-memory store
pub mod memory;

/// PostgreSQL store
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Result type for store operations
pub type StoreResult<T> = Result<T, CollabError>;

/// Result of an insert guarded by a uniqueness constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// Storage operations consumed by the collaborative core
///
/// Each operation is atomic on its own; callers never rely on a transaction
/// spanning two calls.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Insert a note together with its owner collaborator row, if any
    async fn create_note(&self, note: &Note, owner: Option<&Collaborator>) -> StoreResult<()>;

    async fn get_note(&self, id: Uuid) -> StoreResult<Option<Note>>;

    /// Replace content and bump `updated_at`; false when the note is gone
    async fn update_note_content(
        &self,
        id: Uuid,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Delete a note with its collaborators and invites; false when absent
    async fn delete_note(&self, id: Uuid) -> StoreResult<bool>;

    async fn insert_collaborator(&self, collaborator: &Collaborator) -> StoreResult<InsertOutcome>;

    async fn find_collaborator(&self, note_id: Uuid, user_id: Uuid) -> StoreResult<Option<Collaborator>>;

    async fn list_collaborators(&self, note_id: Uuid) -> StoreResult<Vec<Collaborator>>;

    async fn insert_invite(&self, invite: &Invite) -> StoreResult<InsertOutcome>;

    /// Look up the invite for a normalized email
    async fn find_invite(&self, note_id: Uuid, email: &str) -> StoreResult<Option<Invite>>;

    async fn delete_invite(&self, id: Uuid) -> StoreResult<()>;

    /// Pending invites for a note, newest first
    async fn list_invites(&self, note_id: Uuid) -> StoreResult<Vec<Invite>>;

    /// Collaborative notes owned by `user_id`
    async fn list_owned_notes(&self, user_id: Uuid) -> StoreResult<Vec<Note>>;

    /// Notes where `user_id` has a collaborator row
    async fn list_shared_notes(&self, user_id: Uuid) -> StoreResult<Vec<Note>>;

    /// Collaborative notes with a pending invite for `email`
    async fn list_invited_notes(&self, email: &str) -> StoreResult<Vec<Note>>;
}
