/**
 * Collaboration Session
 *
 * One client's editing session on one collaborative note.
 *
 * # Lifecycle
 *
 * 1. **Loading**: [`CollabSession::open`] loads the note through the
 *    gateway, which evaluates access server-side and accepts any pending
 *    invite. A failure is returned as the error (the session never exists).
 * 2. **Active**: [`set_content`](CollabSession::set_content) updates the
 *    local buffer and re-arms the save debounce. When it fires the buffer is
 *    saved only if it differs from the last persisted value; a successful
 *    save broadcasts `content_updated`, a failed one sets
 *    [`SaveStatus::SaveFailed`] and waits for the next edit.
 * 3. **Remote update**: a `content_updated` from another connection
 *    triggers a refetch that overwrites the buffer. Last writer wins.
 * 4. **Closed**: [`close`](CollabSession::close) (or drop) leaves the
 *    channel and cancels the timers. A save still waiting on its debounce is
 *    discarded.
 *
 * Cursor offsets go through a trailing-edge throttle before they are
 * published as presence.
 */

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::channel::{ChannelPublisher, ChannelSubscription, ReaderGuard, RealtimeConnector};
use super::debounce::{Debouncer, Throttle};
use super::gateway::NoteGateway;
use crate::shared::config::{AppConfig, DEFAULT_CURSOR_THROTTLE_MS, DEFAULT_SAVE_DEBOUNCE_MS};
use crate::shared::error::CollabError;
use crate::shared::event::ChannelEvent;
use crate::shared::invite::InviteOutcome;
use crate::shared::note::{CollaboratorView, Role};
use crate::shared::presence::{
    clamp_offset, place_cursors, remote_cursors, PlacedCursor, RemoteCursor, TextLayout,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Timing knobs for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub save_debounce: Duration,
    pub cursor_throttle: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            save_debounce: Duration::from_millis(DEFAULT_SAVE_DEBOUNCE_MS),
            cursor_throttle: Duration::from_millis(DEFAULT_CURSOR_THROTTLE_MS),
        }
    }
}

impl From<&AppConfig> for SessionOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            save_debounce: config.save_debounce(),
            cursor_throttle: config.cursor_throttle(),
        }
    }
}

/// Save indicator shown next to the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// Nothing happened yet
    Idle,
    /// Local edits waiting for the debounce
    Unsaved,
    Saving,
    Saved,
    SaveFailed,
    /// Content was replaced by a remote save
    Updated,
}

impl SaveStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SaveStatus::Idle => "",
            SaveStatus::Unsaved => "Unsaved",
            SaveStatus::Saving => "Saving…",
            SaveStatus::Saved => "Saved",
            SaveStatus::SaveFailed => "Save failed",
            SaveStatus::Updated => "Updated",
        }
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

type RemoteListener = Arc<dyn Fn(&str) + Send + Sync>;
type PresenceListener = Arc<dyn Fn(&[RemoteCursor]) + Send + Sync>;

struct Buffer {
    content: String,
    persisted: String,
}

/// State shared between the session handle, its pump task and timers
struct SessionCore {
    note_id: Uuid,
    user_id: Uuid,
    connection_id: Uuid,
    gateway: Arc<dyn NoteGateway>,
    publisher: Arc<dyn ChannelPublisher>,
    buffer: Mutex<Buffer>,
    cursors: Mutex<Vec<RemoteCursor>>,
    status: watch::Sender<SaveStatus>,
    remote_listeners: Mutex<Vec<RemoteListener>>,
    presence_listeners: Mutex<Vec<PresenceListener>>,
}

impl SessionCore {
    fn set_status(&self, status: SaveStatus) {
        self.status.send_replace(status);
    }

    async fn save(&self) {
        let content = {
            let buffer = lock(&self.buffer);
            if buffer.content == buffer.persisted {
                return;
            }
            buffer.content.clone()
        };

        self.set_status(SaveStatus::Saving);
        match self.gateway.save_content(self.note_id, &content).await {
            Ok(_) => {
                lock(&self.buffer).persisted = content;
                self.set_status(SaveStatus::Saved);
                if let Err(e) = self.publisher.broadcast_content_updated().await {
                    tracing::warn!("[Session] Broadcast after save failed on note {}: {}", self.note_id, e);
                }
            }
            Err(e) => {
                tracing::warn!("[Session] Save failed on note {}: {}", self.note_id, e);
                self.set_status(SaveStatus::SaveFailed);
            }
        }
    }

    async fn handle_event(&self, event: ChannelEvent) {
        match event {
            ChannelEvent::Joined { .. } => {}
            ChannelEvent::ContentUpdated { origin } if origin == self.connection_id => {}
            ChannelEvent::ContentUpdated { origin } => self.refetch(origin).await,
            ChannelEvent::PresenceSync { entries } => {
                let cursors = remote_cursors(&entries, self.user_id);
                *lock(&self.cursors) = cursors.clone();
                // listeners run unlocked so they may call back into the session
                let listeners = lock(&self.presence_listeners).clone();
                for listener in &listeners {
                    listener(cursors.as_slice());
                }
            }
        }
    }

    async fn refetch(&self, origin: Uuid) {
        let view = match self.gateway.open_note(self.note_id).await {
            Ok(view) => view,
            Err(e) => {
                tracing::warn!("[Session] Refetch of note {} failed: {}", self.note_id, e);
                return;
            }
        };

        let changed = {
            let mut buffer = lock(&self.buffer);
            let changed = buffer.content != view.content;
            buffer.content = view.content.clone();
            buffer.persisted = view.content.clone();
            changed
        };
        tracing::debug!(
            "[Session] Note {} refetched after save by {} (changed: {})",
            self.note_id,
            origin,
            changed
        );

        if changed {
            self.set_status(SaveStatus::Updated);
        }
        let listeners = lock(&self.remote_listeners).clone();
        for listener in &listeners {
            listener(view.content.as_str());
        }
    }
}

/// An open editing session
pub struct CollabSession {
    core: Arc<SessionCore>,
    role: Role,
    collaborators: Vec<CollaboratorView>,
    debouncer: Debouncer,
    throttle: Throttle<usize>,
    pump: Option<JoinHandle<()>>,
    reader: Option<ReaderGuard>,
    closed: AtomicBool,
}

impl CollabSession {
    /// Load a note and join its channel
    ///
    /// # Errors
    ///
    /// Whatever the gateway or connector reports: `NotFound`,
    /// `NotCollaborative`, `Forbidden`, `Unauthenticated`, `TransientIo`.
    pub async fn open(
        note_id: Uuid,
        gateway: Arc<dyn NoteGateway>,
        connector: &dyn RealtimeConnector,
        options: SessionOptions,
    ) -> Result<Self, CollabError> {
        let principal = gateway.principal().await?;
        let view = gateway.open_note(note_id).await.map_err(|e| {
            tracing::info!("[Session] Open of note {} denied: {}", note_id, e);
            e
        })?;

        let ChannelSubscription {
            connection_id,
            publisher,
            events,
            guard,
        } = connector.join(note_id).await?;

        let (status, _) = watch::channel(SaveStatus::Idle);
        let core = Arc::new(SessionCore {
            note_id,
            user_id: principal.user_id,
            connection_id,
            gateway,
            publisher: publisher.clone(),
            buffer: Mutex::new(Buffer {
                content: view.content.clone(),
                persisted: view.content,
            }),
            cursors: Mutex::new(Vec::new()),
            status,
            remote_listeners: Mutex::new(Vec::new()),
            presence_listeners: Mutex::new(Vec::new()),
        });

        let pump = tokio::spawn(pump_events(core.clone(), events));
        let throttle = Throttle::new(options.cursor_throttle, move |offset: usize| {
            let publisher = publisher.clone();
            async move {
                if let Err(e) = publisher.track(offset).await {
                    tracing::debug!("[Session] Cursor publish failed: {}", e);
                }
            }
        });

        tracing::info!(
            "[Session] Opened note {} as {:?} (connection {})",
            note_id,
            view.role,
            connection_id
        );

        Ok(Self {
            core,
            role: view.role,
            collaborators: view.collaborators,
            debouncer: Debouncer::new(options.save_debounce),
            throttle,
            pump: Some(pump),
            reader: Some(guard),
            closed: AtomicBool::new(false),
        })
    }

    pub fn note_id(&self) -> Uuid {
        self.core.note_id
    }

    pub fn connection_id(&self) -> Uuid {
        self.core.connection_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Collaborators as of opening
    pub fn collaborators(&self) -> &[CollaboratorView] {
        &self.collaborators
    }

    /// Current local buffer
    pub fn content(&self) -> String {
        lock(&self.core.buffer).content.clone()
    }

    /// Whether the buffer differs from the last persisted value
    pub fn has_unsaved_changes(&self) -> bool {
        let buffer = lock(&self.core.buffer);
        buffer.content != buffer.persisted
    }

    pub fn status(&self) -> SaveStatus {
        *self.core.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SaveStatus> {
        self.core.status.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Replace the local buffer and re-arm the save debounce
    pub fn set_content(&self, content: impl Into<String>) {
        if self.is_closed() {
            return;
        }
        lock(&self.core.buffer).content = content.into();
        self.core.set_status(SaveStatus::Unsaved);

        let core = self.core.clone();
        self.debouncer.schedule(move || async move { core.save().await });
    }

    /// Publish the local cursor offset, throttled
    pub fn track_cursor(&self, offset: usize) {
        if self.is_closed() {
            return;
        }
        let offset = clamp_offset(offset, &lock(&self.core.buffer).content);
        self.throttle.push(offset);
    }

    /// Register a listener for content replaced by a remote save
    pub fn on_remote_update<F>(&self, listener: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        lock(&self.core.remote_listeners).push(Arc::new(listener));
    }

    /// Register a listener for presence snapshots of other participants
    pub fn on_presence_change<F>(&self, listener: F)
    where
        F: Fn(&[RemoteCursor]) + Send + Sync + 'static,
    {
        lock(&self.core.presence_listeners).push(Arc::new(listener));
    }

    /// Other participants' cursors, in snapshot order
    pub fn remote_cursors(&self) -> Vec<RemoteCursor> {
        lock(&self.core.cursors).clone()
    }

    /// Remote cursors mapped into the current buffer's layout
    pub fn cursor_positions(&self, layout: &TextLayout) -> Vec<PlacedCursor> {
        let cursors = self.remote_cursors();
        let content = self.content();
        place_cursors(&cursors, &content, layout)
    }

    /// Invite an email to this note (owner only)
    pub async fn invite(&self, email: &str) -> Result<InviteOutcome, CollabError> {
        self.core.gateway.invite(self.core.note_id, email).await
    }

    /// Emails with a pending invite, newest first (owner only)
    pub async fn pending_invites(&self) -> Result<Vec<String>, CollabError> {
        let invites = self.core.gateway.list_invites(self.core.note_id).await?;
        Ok(invites.into_iter().map(|invite| invite.email).collect())
    }

    /// Leave the channel and stop all timers
    ///
    /// Edits still waiting on the save debounce are discarded. Calling
    /// `close` again has no effect.
    pub fn close(&mut self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        if self.debouncer.cancel() {
            tracing::info!("[Session] Discarding unsaved edits on note {}", self.core.note_id);
        }
        self.throttle.cancel();
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        self.reader.take();
        lock(&self.core.remote_listeners).clear();
        lock(&self.core.presence_listeners).clear();

        tracing::info!("[Session] Closed note {}", self.core.note_id);
    }
}

impl Drop for CollabSession {
    fn drop(&mut self) {
        self.close();
    }
}

async fn pump_events(core: Arc<SessionCore>, mut events: mpsc::Receiver<ChannelEvent>) {
    while let Some(event) = events.recv().await {
        core.handle_event(event).await;
    }
    tracing::debug!("[Session] Event stream for note {} ended", core.note_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(SaveStatus::Saving.to_string(), "Saving…");
        assert_eq!(SaveStatus::SaveFailed.to_string(), "Save failed");
        assert_eq!(SaveStatus::Updated.label(), "Updated");
        assert_eq!(SaveStatus::Idle.label(), "");
    }

    #[test]
    fn test_options_follow_config() {
        let config = AppConfig::builder()
            .save_debounce(Duration::from_millis(500))
            .cursor_throttle(Duration::from_millis(50))
            .build()
            .unwrap();
        let options = SessionOptions::from(&config);
        assert_eq!(options.save_debounce, Duration::from_millis(500));
        assert_eq!(options.cursor_throttle, Duration::from_millis(50));
        assert_eq!(SessionOptions::default().save_debounce, Duration::from_millis(1500));
    }
}
