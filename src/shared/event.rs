/**
 * Real-time Event System
 *
 * Events delivered on a note's realtime channel. Each subscriber receives:
 *
 * - `joined` once, first, carrying the subscriber's own connection id
 * - `content_updated` whenever another participant saved the note
 * - `presence_sync` with the full presence snapshot whenever it changes
 *
 * Events travel as JSON, tagged by `type`, in Server-Sent Events `data:`
 * lines.
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::presence::PresenceEntry;

/// Name of the broadcast that tells peers to refetch
pub const CONTENT_UPDATED_EVENT: &str = "content_updated";

/// Event on a note channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelEvent {
    /// Subscription established
    Joined { connection_id: Uuid },
    /// A participant persisted new content
    ContentUpdated {
        /// Connection that sent the broadcast
        origin: Uuid,
    },
    /// Full presence snapshot, ordered by join time
    PresenceSync { entries: Vec<PresenceEntry> },
}

impl ChannelEvent {
    /// SSE event name for this event
    pub fn name(&self) -> &'static str {
        match self {
            ChannelEvent::Joined { .. } => "joined",
            ChannelEvent::ContentUpdated { .. } => CONTENT_UPDATED_EVENT,
            ChannelEvent::PresenceSync { .. } => "presence_sync",
        }
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
