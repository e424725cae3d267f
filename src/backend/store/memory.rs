/**
 * In-Memory Note Store
 *
 * All three tables live behind one `RwLock`, so `create_note` and the
 * cascading `delete_note` are atomic just like their PostgreSQL
 * counterparts. Uniqueness keys mirror the database constraints:
 *
 * - collaborators: `(note_id, user_id)`
 * - invites: `(note_id, email)`
 */
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{InsertOutcome, NoteStore, StoreResult};
use crate::shared::note::{Collaborator, Invite, Note, Role};

#[derive(Debug, Default)]
struct Tables {
    notes: HashMap<Uuid, Note>,
    collaborators: HashMap<(Uuid, Uuid), Collaborator>,
    invites: HashMap<(Uuid, String), Invite>,
}

/// Process-local store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of collaborator rows for a note
    pub async fn collaborator_count(&self, note_id: Uuid) -> usize {
        let tables = self.tables.read().await;
        tables
            .collaborators
            .keys()
            .filter(|(id, _)| *id == note_id)
            .count()
    }

    /// Number of invite rows for a note
    pub async fn invite_count(&self, note_id: Uuid) -> usize {
        let tables = self.tables.read().await;
        tables.invites.keys().filter(|(id, _)| *id == note_id).count()
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn create_note(&self, note: &Note, owner: Option<&Collaborator>) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.notes.insert(note.id, note.clone());
        if let Some(owner) = owner {
            tables
                .collaborators
                .insert((owner.note_id, owner.user_id), owner.clone());
        }
        Ok(())
    }

    async fn get_note(&self, id: Uuid) -> StoreResult<Option<Note>> {
        Ok(self.tables.read().await.notes.get(&id).cloned())
    }

    async fn update_note_content(
        &self,
        id: Uuid,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.notes.get_mut(&id) {
            Some(note) => {
                note.content = content.to_string();
                note.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_note(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        tables.collaborators.retain(|(note_id, _), _| *note_id != id);
        tables.invites.retain(|(note_id, _), _| *note_id != id);
        Ok(tables.notes.remove(&id).is_some())
    }

    async fn insert_collaborator(&self, collaborator: &Collaborator) -> StoreResult<InsertOutcome> {
        let mut tables = self.tables.write().await;
        let key = (collaborator.note_id, collaborator.user_id);
        if tables.collaborators.contains_key(&key) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        tables.collaborators.insert(key, collaborator.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn find_collaborator(&self, note_id: Uuid, user_id: Uuid) -> StoreResult<Option<Collaborator>> {
        let tables = self.tables.read().await;
        Ok(tables.collaborators.get(&(note_id, user_id)).cloned())
    }

    async fn list_collaborators(&self, note_id: Uuid) -> StoreResult<Vec<Collaborator>> {
        let tables = self.tables.read().await;
        let mut collaborators: Vec<Collaborator> = tables
            .collaborators
            .values()
            .filter(|c| c.note_id == note_id)
            .cloned()
            .collect();
        // owner first, then stable by user id
        collaborators.sort_by_key(|c| (c.role != Role::Owner, c.user_id));
        Ok(collaborators)
    }

    async fn insert_invite(&self, invite: &Invite) -> StoreResult<InsertOutcome> {
        let mut tables = self.tables.write().await;
        let key = (invite.note_id, invite.email.clone());
        if tables.invites.contains_key(&key) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        tables.invites.insert(key, invite.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn find_invite(&self, note_id: Uuid, email: &str) -> StoreResult<Option<Invite>> {
        let tables = self.tables.read().await;
        Ok(tables.invites.get(&(note_id, email.to_string())).cloned())
    }

    async fn delete_invite(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.invites.retain(|_, invite| invite.id != id);
        Ok(())
    }

    async fn list_invites(&self, note_id: Uuid) -> StoreResult<Vec<Invite>> {
        let tables = self.tables.read().await;
        let mut invites: Vec<Invite> = tables
            .invites
            .values()
            .filter(|invite| invite.note_id == note_id)
            .cloned()
            .collect();
        invites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invites)
    }

    async fn list_owned_notes(&self, user_id: Uuid) -> StoreResult<Vec<Note>> {
        let tables = self.tables.read().await;
        Ok(tables
            .notes
            .values()
            .filter(|note| note.is_collaborative && note.is_owned_by(user_id))
            .cloned()
            .collect())
    }

    async fn list_shared_notes(&self, user_id: Uuid) -> StoreResult<Vec<Note>> {
        let tables = self.tables.read().await;
        Ok(tables
            .collaborators
            .values()
            .filter(|c| c.user_id == user_id)
            .filter_map(|c| tables.notes.get(&c.note_id))
            .cloned()
            .collect())
    }

    async fn list_invited_notes(&self, email: &str) -> StoreResult<Vec<Note>> {
        let tables = self.tables.read().await;
        Ok(tables
            .invites
            .values()
            .filter(|invite| invite.email == email)
            .filter_map(|invite| tables.notes.get(&invite.note_id))
            .filter(|note| note.is_collaborative)
            .cloned()
            .collect())
    }
}
