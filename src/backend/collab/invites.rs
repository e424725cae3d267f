/**
 * Invite Manager
 *
 * Creates, lists and consumes email-addressed invitations to a collaborative
 * note.
 *
 * # Invite lifecycle
 *
 * 1. The owner invites an email. Unregistered emails get an informational
 *    outcome and nothing is stored; registered ones get an invite row.
 * 2. The invited principal opens the note. Access evaluation calls
 *    [`InviteManager::accept_if_matching`], which turns the invite into an
 *    editor collaborator row and deletes the invite.
 *
 * Acceptance is two single-row steps (insert collaborator, delete invite).
 * The collaborator uniqueness constraint makes a repeated or concurrent
 * acceptance a no-op, and a crash between the steps only leaves a stale
 * invite that the next acceptance consumes.
 */
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::backend::auth::UserDirectory;
use crate::backend::store::{InsertOutcome, NoteStore};
use crate::shared::error::CollabError;
use crate::shared::invite::{validate_email, InviteOutcome, PendingInvite};
use crate::shared::note::{Collaborator, Invite, Note, Role};
use crate::shared::principal::Principal;

/// Invite operations over a store and a user directory
#[derive(Clone)]
pub struct InviteManager {
    store: Arc<dyn NoteStore>,
    directory: Arc<dyn UserDirectory>,
}

impl InviteManager {
    pub fn new(store: Arc<dyn NoteStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { store, directory }
    }

    /// Invite `email` to edit a note owned by `inviter`
    pub async fn invite(
        &self,
        note_id: Uuid,
        inviter: &Principal,
        email: &str,
    ) -> Result<InviteOutcome, CollabError> {
        let email = validate_email(email)?;
        self.owned_collaborative_note(note_id, inviter, "Only the note owner can invite others")
            .await?;

        if !self.directory.is_registered(&email).await? {
            tracing::info!("[Invite] {} is not registered, nothing stored for note {}", email, note_id);
            return Ok(InviteOutcome::not_registered());
        }

        let invite = Invite {
            id: Uuid::new_v4(),
            note_id,
            email,
            invited_by: inviter.user_id,
            created_at: Utc::now(),
        };

        match self.store.insert_invite(&invite).await? {
            InsertOutcome::Inserted => {
                tracing::info!("[Invite] Invited {} to note {}", invite.email, note_id);
                Ok(InviteOutcome::saved())
            }
            InsertOutcome::AlreadyExists => {
                tracing::debug!("[Invite] {} already invited to note {}", invite.email, note_id);
                Ok(InviteOutcome::already_invited())
            }
        }
    }

    /// Pending invites for a note, newest first; owner only
    pub async fn list_invites(
        &self,
        note_id: Uuid,
        requester: &Principal,
    ) -> Result<Vec<PendingInvite>, CollabError> {
        self.owned_collaborative_note(note_id, requester, "Only the note owner can view invites")
            .await?;
        let invites = self.store.list_invites(note_id).await?;
        Ok(invites.into_iter().map(PendingInvite::from).collect())
    }

    /// Convert a pending invite for the principal's email into editor access
    ///
    /// Returns true when an invite was found and consumed.
    pub async fn accept_if_matching(
        &self,
        note_id: Uuid,
        principal: &Principal,
    ) -> Result<bool, CollabError> {
        let email = principal.normalized_email();
        if email.is_empty() {
            return Ok(false);
        }

        let invite = match self.store.find_invite(note_id, &email).await? {
            Some(invite) => invite,
            None => return Ok(false),
        };

        let collaborator = Collaborator {
            note_id,
            user_id: principal.user_id,
            role: Role::Editor,
        };
        let outcome = self.store.insert_collaborator(&collaborator).await?;
        self.store.delete_invite(invite.id).await?;

        tracing::info!(
            "[Invite] {} accepted invite to note {} ({:?})",
            email,
            note_id,
            outcome
        );
        Ok(true)
    }

    async fn owned_collaborative_note(
        &self,
        note_id: Uuid,
        principal: &Principal,
        forbidden_message: &str,
    ) -> Result<Note, CollabError> {
        let note = self
            .store
            .get_note(note_id)
            .await?
            .ok_or(CollabError::NotFound)?;
        if !note.is_collaborative {
            return Err(CollabError::NotCollaborative);
        }
        if !note.is_owned_by(principal.user_id) {
            return Err(CollabError::forbidden(forbidden_message));
        }
        Ok(note)
    }
}
