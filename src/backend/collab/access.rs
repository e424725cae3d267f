/**
 * Access Control Evaluator
 *
 * Decides whether a principal may read or edit a collaborative note.
 * Evaluation order:
 *
 * 1. unknown note id → `NotFound`
 * 2. non-collaborative note → `NotCollaborative`, whoever asks
 * 3. a pending invite for the principal's email is accepted
 * 4. owner or collaborator row → granted; anything else → `Forbidden`
 *
 * Step 3 runs before the membership check so a freshly invited principal is
 * granted access by the same request that discovers the invite. Read access
 * and edit access are the same thing here.
 */
use std::sync::Arc;

use uuid::Uuid;

use super::invites::InviteManager;
use crate::backend::store::NoteStore;
use crate::shared::error::CollabError;
use crate::shared::note::{Note, Role};
use crate::shared::principal::Principal;

/// Granted access: the note plus the principal's role on it
#[derive(Debug, Clone)]
pub struct Access {
    pub note: Note,
    pub role: Role,
}

#[derive(Clone)]
pub struct AccessEvaluator {
    store: Arc<dyn NoteStore>,
    invites: InviteManager,
}

impl AccessEvaluator {
    pub fn new(store: Arc<dyn NoteStore>, invites: InviteManager) -> Self {
        Self { store, invites }
    }

    pub async fn can_read(&self, note_id: Uuid, principal: &Principal) -> Result<Access, CollabError> {
        self.evaluate(note_id, principal).await
    }

    pub async fn can_edit(&self, note_id: Uuid, principal: &Principal) -> Result<Access, CollabError> {
        self.evaluate(note_id, principal).await
    }

    async fn evaluate(&self, note_id: Uuid, principal: &Principal) -> Result<Access, CollabError> {
        let note = self
            .store
            .get_note(note_id)
            .await?
            .ok_or(CollabError::NotFound)?;

        if !note.is_collaborative {
            return Err(CollabError::NotCollaborative);
        }

        self.invites.accept_if_matching(note_id, principal).await?;

        if note.is_owned_by(principal.user_id) {
            return Ok(Access {
                note,
                role: Role::Owner,
            });
        }

        match self.store.find_collaborator(note_id, principal.user_id).await? {
            Some(_) => Ok(Access {
                note,
                role: Role::Editor,
            }),
            None => {
                tracing::debug!("[Collab] {} denied on note {}", principal.user_id, note_id);
                Err(CollabError::forbidden("You do not have access to this note"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::auth::{MemoryDirectory, UserDirectory};
    use crate::backend::store::MemoryStore;
    use crate::shared::note::{Collaborator, Invite};
    use chrono::{Duration, Utc};

    fn evaluator(store: &MemoryStore) -> AccessEvaluator {
        let store: Arc<dyn NoteStore> = Arc::new(store.clone());
        let invites = InviteManager::new(store.clone(), Arc::new(MemoryDirectory::new()));
        AccessEvaluator::new(store, invites)
    }

    async fn seed(store: &MemoryStore, owner: Uuid, is_collaborative: bool) -> Note {
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            content: "hello".to_string(),
            owner_id: Some(owner),
            is_collaborative,
            password_hash: None,
            expires_at: Some(now + Duration::hours(2)),
            created_at: now,
            updated_at: now,
        };
        store.create_note(&note, None).await.unwrap();
        note
    }

    #[tokio::test]
    async fn test_missing_note_is_not_found() {
        let store = MemoryStore::new();
        let principal = Principal::new(Uuid::new_v4(), "a@example.com");
        let error = evaluator(&store)
            .can_edit(Uuid::new_v4(), &principal)
            .await
            .unwrap_err();
        assert_eq!(error, CollabError::NotFound);
    }

    #[tokio::test]
    async fn test_non_collaborative_rejected_even_for_owner() {
        let store = MemoryStore::new();
        let owner = Principal::new(Uuid::new_v4(), "owner@example.com");
        let note = seed(&store, owner.user_id, false).await;

        let evaluator = evaluator(&store);
        assert_eq!(
            evaluator.can_read(note.id, &owner).await.unwrap_err(),
            CollabError::NotCollaborative
        );
        assert_eq!(
            evaluator.can_edit(note.id, &owner).await.unwrap_err(),
            CollabError::NotCollaborative
        );
    }

    #[tokio::test]
    async fn test_owner_and_collaborator_granted() {
        let store = MemoryStore::new();
        let owner = Principal::new(Uuid::new_v4(), "owner@example.com");
        let editor = Principal::new(Uuid::new_v4(), "editor@example.com");
        let note = seed(&store, owner.user_id, true).await;
        store
            .insert_collaborator(&Collaborator {
                note_id: note.id,
                user_id: editor.user_id,
                role: Role::Editor,
            })
            .await
            .unwrap();

        let evaluator = evaluator(&store);
        assert_eq!(evaluator.can_edit(note.id, &owner).await.unwrap().role, Role::Owner);
        assert_eq!(evaluator.can_read(note.id, &editor).await.unwrap().role, Role::Editor);
    }

    #[tokio::test]
    async fn test_stranger_is_forbidden() {
        let store = MemoryStore::new();
        let note = seed(&store, Uuid::new_v4(), true).await;
        let stranger = Principal::new(Uuid::new_v4(), "stranger@example.com");

        let error = evaluator(&store).can_edit(note.id, &stranger).await.unwrap_err();
        assert!(matches!(error, CollabError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_pending_invite_grants_access_on_first_try() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let note = seed(&store, owner, true).await;
        store
            .insert_invite(&Invite {
                id: Uuid::new_v4(),
                note_id: note.id,
                email: "invited@example.com".to_string(),
                invited_by: owner,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let invited = Principal::new(Uuid::new_v4(), "Invited@Example.com");
        let access = evaluator(&store).can_edit(note.id, &invited).await.unwrap();
        assert_eq!(access.role, Role::Editor);
        assert_eq!(store.invite_count(note.id).await, 0);
    }

    #[tokio::test]
    async fn test_directory_is_not_consulted_for_access() {
        let store = MemoryStore::new();
        let directory = MemoryDirectory::new();
        let note = seed(&store, Uuid::new_v4(), true).await;
        let registered = Principal::new(Uuid::new_v4(), "registered@example.com");
        directory.register(&registered).await.unwrap();

        let error = evaluator(&store).can_edit(note.id, &registered).await.unwrap_err();
        assert!(matches!(error, CollabError::Forbidden { .. }));
    }
}
