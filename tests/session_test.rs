//! Collaboration session tests
//!
//! Sessions run against the in-process gateway and hub with tokio's clock
//! paused, so debounce and throttle windows are exact.

#[cfg(feature = "ssr")]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use tokio::time::sleep;
    use uuid::Uuid;

    use notecollab::backend::auth::{MemoryDirectory, UserDirectory};
    use notecollab::backend::collab::CollabState;
    use notecollab::backend::realtime::ChannelHub;
    use notecollab::backend::store::MemoryStore;
    use notecollab::client::{
        CollabSession, DirectGateway, HubConnector, NoteGateway, SaveStatus, SessionOptions,
    };
    use notecollab::shared::error::CollabError;
    use notecollab::shared::invite::{InviteOutcome, PendingInvite};
    use notecollab::shared::note::{CreateNoteRequest, NoteView, Role, UpdateContentResponse};
    use notecollab::shared::presence::TextLayout;
    use notecollab::shared::principal::Principal;

    const INITIAL: &str = "hello world";

    /// Gateway wrapper that records saves and can be told to fail them
    struct RecordingGateway {
        inner: DirectGateway,
        saves: AtomicUsize,
        saved: Mutex<Vec<String>>,
        fail_saves: AtomicBool,
    }

    impl RecordingGateway {
        fn new(inner: DirectGateway) -> Self {
            Self {
                inner,
                saves: AtomicUsize::new(0),
                saved: Mutex::new(Vec::new()),
                fail_saves: AtomicBool::new(false),
            }
        }

        fn save_count(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }

        fn saved(&self) -> Vec<String> {
            self.saved.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NoteGateway for RecordingGateway {
        async fn principal(&self) -> Result<Principal, CollabError> {
            self.inner.principal().await
        }

        async fn open_note(&self, note_id: Uuid) -> Result<NoteView, CollabError> {
            self.inner.open_note(note_id).await
        }

        async fn save_content(
            &self,
            note_id: Uuid,
            content: &str,
        ) -> Result<UpdateContentResponse, CollabError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(CollabError::transient("store unavailable"));
            }
            self.saved.lock().unwrap().push(content.to_string());
            self.inner.save_content(note_id, content).await
        }

        async fn invite(&self, note_id: Uuid, email: &str) -> Result<InviteOutcome, CollabError> {
            self.inner.invite(note_id, email).await
        }

        async fn list_invites(&self, note_id: Uuid) -> Result<Vec<PendingInvite>, CollabError> {
            self.inner.list_invites(note_id).await
        }
    }

    struct Fixture {
        collab: CollabState,
        store: MemoryStore,
        directory: MemoryDirectory,
        hub: ChannelHub,
        owner: Principal,
        note_id: Uuid,
    }

    impl Fixture {
        async fn new() -> Self {
            let (collab, store, directory) = CollabState::memory();
            let owner = Principal::new(Uuid::new_v4(), "owner@example.com");
            directory.register(&owner).await.unwrap();

            let request = CreateNoteRequest {
                content: Some(INITIAL.to_string()),
                ..CreateNoteRequest::collaborative(Utc::now() + chrono::Duration::hours(2))
            };
            let note_id = collab
                .notes
                .create_note(Some(&owner), request)
                .await
                .unwrap()
                .id;

            Self {
                collab,
                store,
                directory,
                hub: ChannelHub::default(),
                owner,
                note_id,
            }
        }

        /// A registered principal with a pending invite to the note
        async fn invited(&self, email: &str) -> Principal {
            let principal = Principal::new(Uuid::new_v4(), email);
            self.directory.register(&principal).await.unwrap();
            let outcome = self
                .collab
                .invites
                .invite(self.note_id, &self.owner, email)
                .await
                .unwrap();
            assert!(outcome.accepted);
            principal
        }

        fn gateway(&self, principal: &Principal) -> Arc<RecordingGateway> {
            Arc::new(RecordingGateway::new(DirectGateway::new(
                self.collab.clone(),
                principal.clone(),
            )))
        }

        async fn open_with(
            &self,
            principal: &Principal,
            gateway: Arc<RecordingGateway>,
        ) -> Result<CollabSession, CollabError> {
            let connector =
                HubConnector::new(self.hub.clone(), self.collab.access.clone(), principal.clone());
            CollabSession::open(self.note_id, gateway, &connector, SessionOptions::default()).await
        }

        async fn open(&self, principal: &Principal) -> CollabSession {
            self.open_with(principal, self.gateway(principal))
                .await
                .unwrap()
        }

        async fn stored_content(&self) -> String {
            self.collab
                .notes
                .open_for_edit(self.note_id, &self.owner)
                .await
                .unwrap()
                .content
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_loads_content_and_role() {
        let fixture = Fixture::new().await;
        let session = fixture.open(&fixture.owner).await;

        assert_eq!(session.content(), INITIAL);
        assert_eq!(session.role(), Role::Owner);
        assert_eq!(session.collaborators().len(), 1);
        assert_eq!(session.status(), SaveStatus::Idle);
        assert!(!session.has_unsaved_changes());
        assert_eq!(fixture.hub.presence(fixture.note_id).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_accepts_pending_invite() {
        let fixture = Fixture::new().await;
        let editor = fixture.invited("editor@example.com").await;

        let session = fixture.open(&editor).await;
        assert_eq!(session.role(), Role::Editor);
        assert_eq!(session.collaborators().len(), 2);
        assert_eq!(fixture.store.invite_count(fixture.note_id).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_denied() {
        let fixture = Fixture::new().await;
        let stranger = Principal::new(Uuid::new_v4(), "stranger@example.com");

        let result = fixture.open_with(&stranger, fixture.gateway(&stranger)).await;
        assert_matches!(result.err(), Some(CollabError::Forbidden { .. }));
        assert!(fixture.hub.presence(fixture.note_id).is_empty());

        let anonymous = fixture
            .collab
            .notes
            .create_note(None, CreateNoteRequest::anonymous("plain"))
            .await
            .unwrap();
        let gateway = Arc::new(DirectGateway::new(fixture.collab.clone(), fixture.owner.clone()));
        let connector = HubConnector::new(
            fixture.hub.clone(),
            fixture.collab.access.clone(),
            fixture.owner.clone(),
        );
        let result =
            CollabSession::open(anonymous.id, gateway, &connector, SessionOptions::default()).await;
        assert_matches!(result.err(), Some(CollabError::NotCollaborative));
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_within_debounce_collapse_into_one_save() {
        let fixture = Fixture::new().await;
        let gateway = fixture.gateway(&fixture.owner);
        let session = fixture
            .open_with(&fixture.owner, gateway.clone())
            .await
            .unwrap();

        session.set_content("h");
        sleep(Duration::from_millis(500)).await;
        session.set_content("he");
        sleep(Duration::from_millis(500)).await;
        session.set_content("hey");
        assert_eq!(session.status(), SaveStatus::Unsaved);
        assert!(session.has_unsaved_changes());

        sleep(Duration::from_millis(1400)).await;
        assert_eq!(gateway.save_count(), 0);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(gateway.saved(), vec!["hey".to_string()]);
        assert_eq!(session.status(), SaveStatus::Saved);
        assert!(!session.has_unsaved_changes());
        assert_eq!(fixture.stored_content().await, "hey");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_content_is_not_saved() {
        let fixture = Fixture::new().await;
        let gateway = fixture.gateway(&fixture.owner);
        let session = fixture
            .open_with(&fixture.owner, gateway.clone())
            .await
            .unwrap();

        session.set_content("edited");
        session.set_content(INITIAL);
        sleep(Duration::from_millis(2000)).await;
        assert_eq!(gateway.save_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_waits_for_next_edit() {
        let fixture = Fixture::new().await;
        let gateway = fixture.gateway(&fixture.owner);
        let session = fixture
            .open_with(&fixture.owner, gateway.clone())
            .await
            .unwrap();
        let mut status = session.subscribe_status();

        gateway.fail_saves.store(true, Ordering::SeqCst);
        session.set_content("offline edit");
        sleep(Duration::from_millis(1600)).await;
        assert_eq!(session.status(), SaveStatus::SaveFailed);
        assert_eq!(*status.borrow_and_update(), SaveStatus::SaveFailed);
        assert!(session.has_unsaved_changes());

        // No retry without a new edit
        sleep(Duration::from_millis(5000)).await;
        assert_eq!(gateway.save_count(), 1);

        gateway.fail_saves.store(false, Ordering::SeqCst);
        session.set_content("offline edit, retried");
        sleep(Duration::from_millis(1600)).await;
        assert_eq!(session.status(), SaveStatus::Saved);
        assert_eq!(fixture.stored_content().await, "offline edit, retried");
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_save_triggers_refetch() {
        let fixture = Fixture::new().await;
        let editor = fixture.invited("editor@example.com").await;
        let owner_session = fixture.open(&fixture.owner).await;
        let editor_session = fixture.open(&editor).await;

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        editor_session.on_remote_update(move |content| sink.lock().unwrap().push(content.to_string()));

        owner_session.set_content("from the owner");
        sleep(Duration::from_millis(1600)).await;

        assert_eq!(editor_session.content(), "from the owner");
        assert_eq!(editor_session.status(), SaveStatus::Updated);
        assert_eq!(*received.lock().unwrap(), vec!["from the owner".to_string()]);
        // The saver does not refetch its own broadcast
        assert_eq!(owner_session.status(), SaveStatus::Saved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listener_may_register_listeners() {
        let fixture = Fixture::new().await;
        let editor = fixture.invited("editor@example.com").await;
        let owner_session = fixture.open(&fixture.owner).await;
        let editor_session = Arc::new(fixture.open(&editor).await);

        let late_calls = Arc::new(AtomicUsize::new(0));
        let session = Arc::downgrade(&editor_session);
        let counter = late_calls.clone();
        editor_session.on_remote_update(move |_| {
            if let Some(session) = session.upgrade() {
                let counter = counter.clone();
                session.on_remote_update(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        owner_session.set_content("one");
        sleep(Duration::from_millis(1600)).await;
        assert_eq!(editor_session.content(), "one");
        // registered during the callback, so not part of this delivery
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);

        owner_session.set_content("two");
        sleep(Duration::from_millis(1600)).await;
        assert_eq!(editor_session.content(), "two");
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_save_wins() {
        let fixture = Fixture::new().await;
        let editor = fixture.invited("editor@example.com").await;
        let owner_session = fixture.open(&fixture.owner).await;
        let editor_session = fixture.open(&editor).await;

        owner_session.set_content("first");
        sleep(Duration::from_millis(2000)).await;
        assert_eq!(editor_session.content(), "first");

        editor_session.set_content("second");
        sleep(Duration::from_millis(1600)).await;

        assert_eq!(fixture.stored_content().await, "second");
        assert_eq!(owner_session.content(), "second");
        assert_eq!(owner_session.status(), SaveStatus::Updated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetch_replaces_unsaved_local_edits() {
        let fixture = Fixture::new().await;
        let editor = fixture.invited("editor@example.com").await;
        let editor_gateway = fixture.gateway(&editor);
        let owner_session = fixture.open(&fixture.owner).await;
        let editor_session = fixture
            .open_with(&editor, editor_gateway.clone())
            .await
            .unwrap();

        owner_session.set_content("alpha");
        sleep(Duration::from_millis(100)).await;
        editor_session.set_content("beta");

        sleep(Duration::from_millis(3000)).await;
        assert_eq!(editor_session.content(), "alpha");
        assert!(!editor_session.has_unsaved_changes());
        assert_eq!(editor_gateway.save_count(), 0);
        assert_eq!(fixture.stored_content().await, "alpha");
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_discards_pending_save() {
        let fixture = Fixture::new().await;
        let gateway = fixture.gateway(&fixture.owner);
        let mut session = fixture
            .open_with(&fixture.owner, gateway.clone())
            .await
            .unwrap();

        session.set_content("never saved");
        sleep(Duration::from_millis(500)).await;
        session.close();
        session.close();
        assert!(session.is_closed());

        session.set_content("after close");
        sleep(Duration::from_millis(3000)).await;
        assert_eq!(gateway.save_count(), 0);
        assert_eq!(fixture.stored_content().await, INITIAL);
        assert!(fixture.hub.presence(fixture.note_id).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_presence_tracks_and_clamps_cursors() {
        let fixture = Fixture::new().await;
        let editor = fixture.invited("editor@example.com").await;
        let owner_session = fixture.open(&fixture.owner).await;
        let mut editor_session = fixture.open(&editor).await;

        let latest = Arc::new(Mutex::new(Vec::new()));
        let sink = latest.clone();
        owner_session.on_presence_change(move |cursors| {
            *sink.lock().unwrap() = cursors.iter().map(|c| c.cursor_offset).collect::<Vec<_>>();
        });

        // Only the latest offset inside the window is published
        editor_session.track_cursor(2);
        editor_session.track_cursor(5);
        sleep(Duration::from_millis(200)).await;

        let cursors = owner_session.remote_cursors();
        assert_eq!(cursors.len(), 1);
        assert_eq!(cursors[0].user_id, editor.user_id);
        assert_eq!(cursors[0].cursor_offset, 5);
        assert_eq!(cursors[0].label(), "editor@example.com");
        assert_eq!(*latest.lock().unwrap(), vec![5]);
        assert!(editor_session.remote_cursors().iter().all(|c| c.user_id != editor.user_id));

        // Offsets past the end are clamped before publishing
        editor_session.track_cursor(999);
        sleep(Duration::from_millis(200)).await;
        assert_eq!(owner_session.remote_cursors()[0].cursor_offset, INITIAL.chars().count());

        // A stale offset is clamped again against the viewer's content
        owner_session.set_content("hi");
        let placed = owner_session.cursor_positions(&TextLayout::default());
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].position.offset, 2);
        assert_eq!(placed[0].position.line, 0);
        assert_eq!(placed[0].position.column, 2);

        editor_session.close();
        sleep(Duration::from_millis(10)).await;
        assert!(owner_session.remote_cursors().is_empty());
        assert_eq!(fixture.hub.presence(fixture.note_id).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invites_through_session() {
        let fixture = Fixture::new().await;
        let session = fixture.open(&fixture.owner).await;

        let outcome = session.invite("nobody@example.com").await.unwrap();
        assert!(!outcome.accepted);
        assert!(session.pending_invites().await.unwrap().is_empty());

        let invitee = Principal::new(Uuid::new_v4(), "invitee@example.com");
        fixture.directory.register(&invitee).await.unwrap();
        let outcome = session.invite("Invitee@Example.com").await.unwrap();
        assert!(outcome.accepted);
        assert_eq!(
            session.pending_invites().await.unwrap(),
            vec!["invitee@example.com".to_string()]
        );

        let editor_session = fixture.open(&invitee).await;
        assert_matches!(
            editor_session.invite("other@example.com").await,
            Err(CollabError::Forbidden { .. })
        );
        assert!(session.pending_invites().await.unwrap().is_empty());
    }
}
