/**
 * Note Service
 *
 * Note-level operations served over HTTP. Everything touching a
 * collaborative note's content goes through the [`AccessEvaluator`], so an
 * invited principal gains access on whichever call comes first.
 *
 * Content saves are last-writer-wins: no version check, no lock. The latest
 * `update_content` call simply replaces the stored text.
 */
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::access::AccessEvaluator;
use crate::backend::store::NoteStore;
use crate::shared::error::CollabError;
use crate::shared::note::{
    Collaborator, CollaboratorView, CreateNoteRequest, CreateNoteResponse, ListingRole, Note,
    NoteSummary, NoteView, Role, UpdateContentResponse, ViewNoteResponse,
};
use crate::shared::principal::Principal;

/// bcrypt cost for note passwords
pub const PASSWORD_HASH_COST: u32 = 10;

#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn NoteStore>,
    access: AccessEvaluator,
}

impl NoteService {
    pub fn new(store: Arc<dyn NoteStore>, access: AccessEvaluator) -> Self {
        Self { store, access }
    }

    /// Create a note; collaborative notes require a principal
    pub async fn create_note(
        &self,
        principal: Option<&Principal>,
        request: CreateNoteRequest,
    ) -> Result<CreateNoteResponse, CollabError> {
        self.create_note_at(principal, request, Utc::now()).await
    }

    /// Create a note as if the current time were `now`
    pub async fn create_note_at(
        &self,
        principal: Option<&Principal>,
        request: CreateNoteRequest,
        now: DateTime<Utc>,
    ) -> Result<CreateNoteResponse, CollabError> {
        if request.is_collaborative && principal.is_none() {
            return Err(CollabError::Unauthenticated);
        }
        request.validate(now)?;

        let password_hash = match request.effective_password() {
            Some(password) => Some(hash_password(password.to_string()).await?),
            None => None,
        };

        let note = Note {
            id: Uuid::new_v4(),
            content: request.content.unwrap_or_default(),
            owner_id: principal.map(|p| p.user_id),
            is_collaborative: request.is_collaborative,
            password_hash,
            expires_at: request.expires_at,
            created_at: now,
            updated_at: now,
        };

        let owner_row = match (note.is_collaborative, principal) {
            (true, Some(owner)) => Some(Collaborator {
                note_id: note.id,
                user_id: owner.user_id,
                role: Role::Owner,
            }),
            _ => None,
        };

        self.store.create_note(&note, owner_row.as_ref()).await?;
        tracing::info!(
            "[Collab] Created {} note {}",
            if note.is_collaborative { "collaborative" } else { "anonymous" },
            note.id
        );
        Ok(CreateNoteResponse { id: note.id })
    }

    /// Open a collaborative note for editing, accepting any pending invite
    pub async fn open_for_edit(
        &self,
        note_id: Uuid,
        principal: &Principal,
    ) -> Result<NoteView, CollabError> {
        let access = self.access.can_read(note_id, principal).await?;
        let collaborators = self.store.list_collaborators(note_id).await?;
        Ok(NoteView {
            id: access.note.id,
            content: access.note.content,
            created_at: access.note.created_at,
            updated_at: access.note.updated_at,
            role: access.role,
            collaborators: collaborators.into_iter().map(CollaboratorView::from).collect(),
        })
    }

    /// Replace a collaborative note's content
    pub async fn update_content(
        &self,
        note_id: Uuid,
        principal: &Principal,
        content: &str,
    ) -> Result<UpdateContentResponse, CollabError> {
        self.access.can_edit(note_id, principal).await?;

        let updated_at = Utc::now();
        if !self.store.update_note_content(note_id, content, updated_at).await? {
            return Err(CollabError::NotFound);
        }
        tracing::debug!(
            "[Collab] Saved note {} ({} chars) for {}",
            note_id,
            content.chars().count(),
            principal.user_id
        );
        Ok(UpdateContentResponse {
            ok: true,
            updated_at,
        })
    }

    /// Delete a collaborative note with its collaborators and invites
    pub async fn delete_note(&self, note_id: Uuid, principal: &Principal) -> Result<(), CollabError> {
        let note = self
            .store
            .get_note(note_id)
            .await?
            .ok_or(CollabError::NotFound)?;
        if !note.is_collaborative {
            return Err(CollabError::NotCollaborative);
        }
        if !note.is_owned_by(principal.user_id) {
            return Err(CollabError::forbidden("Only the owner can delete this note"));
        }

        self.store.delete_note(note_id).await?;
        tracing::info!("[Collab] Deleted note {}", note_id);
        Ok(())
    }

    /// Collaborative notes the principal owns, edits or is invited to
    ///
    /// Each note appears once, under the strongest relation, newest update
    /// first.
    pub async fn list_notes(&self, principal: &Principal) -> Result<Vec<NoteSummary>, CollabError> {
        let owned = self.store.list_owned_notes(principal.user_id).await?;
        let shared = self.store.list_shared_notes(principal.user_id).await?;
        let invited = self
            .store
            .list_invited_notes(&principal.normalized_email())
            .await?;

        let mut seen = HashSet::new();
        let mut summaries = Vec::new();
        let tagged = owned
            .into_iter()
            .map(|note| (note, ListingRole::Owner))
            .chain(shared.into_iter().map(|note| (note, ListingRole::Editor)))
            .chain(invited.into_iter().map(|note| (note, ListingRole::Invited)));

        for (note, role) in tagged {
            if seen.insert(note.id) {
                summaries.push(NoteSummary::from_note(note, role));
            }
        }

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    /// Public read of any note, honoring expiry and password
    pub async fn view_note(
        &self,
        note_id: Uuid,
        password: Option<&str>,
    ) -> Result<ViewNoteResponse, CollabError> {
        self.view_note_at(note_id, password, Utc::now()).await
    }

    pub async fn view_note_at(
        &self,
        note_id: Uuid,
        password: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ViewNoteResponse, CollabError> {
        let note = self
            .store
            .get_note(note_id)
            .await?
            .ok_or(CollabError::NotFound)?;

        if note.is_expired_at(now) {
            return Err(CollabError::Expired);
        }

        if let Some(hash) = &note.password_hash {
            let password = password
                .filter(|p| !p.is_empty())
                .ok_or(CollabError::PasswordRequired)?;
            if !verify_password(password.to_string(), hash.clone()).await? {
                return Err(CollabError::InvalidPassword);
            }
        }

        Ok(ViewNoteResponse {
            content: note.content,
            created_at: note.created_at,
        })
    }
}

async fn hash_password(password: String) -> Result<String, CollabError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, PASSWORD_HASH_COST))
        .await
        .map_err(|e| CollabError::transient(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| CollabError::transient(format!("Password hashing failed: {}", e)))
}

async fn verify_password(password: String, hash: String) -> Result<bool, CollabError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| CollabError::transient(format!("Password check task failed: {}", e)))?
        .map_err(|e| CollabError::transient(format!("Password check failed: {}", e)))
}
