/**
 * Note Channel Hub
 *
 * Per-note publish/subscribe plus presence. Each note with at least one
 * subscriber has a broadcast sender and a presence map keyed by connection
 * id. A [`ChannelMembership`] is the subscription handle: dropping it
 * removes the connection's presence entry and publishes a fresh
 * `presence_sync`, so presence vanishes the moment a connection goes away
 * without any cooperation from the client.
 *
 * Presence snapshots are ordered by join time. Events for one note are sent
 * under the hub lock, so every subscriber sees presence snapshots in the
 * same order.
 */
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use super::broadcast::{broadcast_event, NoteBroadcast};
use crate::shared::config::DEFAULT_CHANNEL_CAPACITY;
use crate::shared::error::CollabError;
use crate::shared::event::ChannelEvent;
use crate::shared::presence::PresenceEntry;
use crate::shared::principal::Principal;

struct NoteChannel {
    sender: NoteBroadcast,
    presence: Vec<PresenceEntry>,
}

impl NoteChannel {
    fn sync(&self) {
        broadcast_event(
            &self.sender,
            ChannelEvent::PresenceSync {
                entries: self.presence.clone(),
            },
        );
    }
}

/// Realtime channels for every open note
#[derive(Clone)]
pub struct ChannelHub {
    channels: Arc<Mutex<HashMap<Uuid, NoteChannel>>>,
    capacity: usize,
}

impl Default for ChannelHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl ChannelHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, NoteChannel>> {
        self.channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Subscribe a principal to a note's channel
    ///
    /// The caller is responsible for checking access first. The new
    /// connection is tracked at offset 0 and everyone, the new subscriber
    /// included, receives the updated presence snapshot.
    pub fn join(&self, note_id: Uuid, principal: &Principal) -> ChannelMembership {
        let connection_id = Uuid::new_v4();
        let mut channels = self.lock();
        let channel = channels.entry(note_id).or_insert_with(|| NoteChannel {
            sender: broadcast::channel(self.capacity).0,
            presence: Vec::new(),
        });

        let receiver = channel.sender.subscribe();
        channel.presence.push(PresenceEntry {
            connection_id,
            user_id: principal.user_id,
            email: Some(principal.email.clone()).filter(|e| !e.is_empty()),
            cursor_offset: 0,
            online_at: Utc::now(),
        });
        channel.sync();

        tracing::info!(
            "[Realtime] {} joined note {} as {} ({} connected)",
            principal.user_id,
            note_id,
            connection_id,
            channel.presence.len()
        );

        ChannelMembership {
            hub: self.clone(),
            note_id,
            connection_id,
            user_id: principal.user_id,
            receiver,
        }
    }

    /// Tell every other connection on the note that content was saved
    pub fn broadcast_content_updated(
        &self,
        note_id: Uuid,
        connection_id: Uuid,
        user_id: Uuid,
    ) -> Result<usize, CollabError> {
        let channels = self.lock();
        let channel = channels.get(&note_id).ok_or(CollabError::NotFound)?;
        check_connection(channel, connection_id, user_id)?;
        Ok(broadcast_event(
            &channel.sender,
            ChannelEvent::ContentUpdated {
                origin: connection_id,
            },
        ))
    }

    /// Update a connection's cursor offset and publish the snapshot
    pub fn track(
        &self,
        note_id: Uuid,
        connection_id: Uuid,
        user_id: Uuid,
        cursor_offset: usize,
    ) -> Result<(), CollabError> {
        let mut channels = self.lock();
        let channel = channels.get_mut(&note_id).ok_or(CollabError::NotFound)?;
        check_connection(channel, connection_id, user_id)?;

        if let Some(entry) = channel
            .presence
            .iter_mut()
            .find(|entry| entry.connection_id == connection_id)
        {
            entry.cursor_offset = cursor_offset;
            entry.online_at = Utc::now();
        }
        channel.sync();
        Ok(())
    }

    /// Remove a connection; the note's channel goes away with its last one
    pub fn leave(&self, note_id: Uuid, connection_id: Uuid) {
        let mut channels = self.lock();
        let Some(channel) = channels.get_mut(&note_id) else {
            return;
        };

        let before = channel.presence.len();
        channel
            .presence
            .retain(|entry| entry.connection_id != connection_id);
        if channel.presence.len() == before {
            return;
        }

        tracing::info!(
            "[Realtime] {} left note {} ({} connected)",
            connection_id,
            note_id,
            channel.presence.len()
        );

        if channel.presence.is_empty() {
            channels.remove(&note_id);
        } else {
            channel.sync();
        }
    }

    /// Current presence snapshot for a note
    pub fn presence(&self, note_id: Uuid) -> Vec<PresenceEntry> {
        self.lock()
            .get(&note_id)
            .map(|channel| channel.presence.clone())
            .unwrap_or_default()
    }

    /// Number of notes with at least one connection
    pub fn active_channels(&self) -> usize {
        self.lock().len()
    }
}

fn check_connection(channel: &NoteChannel, connection_id: Uuid, user_id: Uuid) -> Result<(), CollabError> {
    match channel
        .presence
        .iter()
        .find(|entry| entry.connection_id == connection_id)
    {
        Some(entry) if entry.user_id == user_id => Ok(()),
        Some(_) => Err(CollabError::forbidden("Connection belongs to another user")),
        None => Err(CollabError::NotFound),
    }
}

/// A live subscription to one note's channel
///
/// Dropping the membership leaves the channel.
pub struct ChannelMembership {
    hub: ChannelHub,
    note_id: Uuid,
    connection_id: Uuid,
    user_id: Uuid,
    receiver: broadcast::Receiver<ChannelEvent>,
}

impl ChannelMembership {
    pub fn note_id(&self) -> Uuid {
        self.note_id
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn hub(&self) -> &ChannelHub {
        &self.hub
    }

    /// Next event for this connection
    ///
    /// The connection's own `content_updated` broadcasts are skipped. When the
    /// receiver lagged, the skipped events may have included a save, so a
    /// `content_updated` with a nil origin is returned in their place and the
    /// subscriber refetches. `None` means the channel closed.
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(ChannelEvent::ContentUpdated { origin }) if origin == self.connection_id => continue,
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        "[Realtime] Connection {} lagged, skipped {} events",
                        self.connection_id,
                        skipped
                    );
                    return Some(ChannelEvent::ContentUpdated { origin: Uuid::nil() });
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for ChannelMembership {
    fn drop(&mut self) {
        self.hub.leave(self.note_id, self.connection_id);
    }
}
