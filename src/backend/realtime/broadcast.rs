/**
 * Real-time Event Broadcasting
 *
 * Events are broadcast using `tokio::sync::broadcast`, which provides
 * a multi-producer, multi-consumer channel. All subscribers of a note
 * receive a copy of each event.
 */

use crate::shared::event::ChannelEvent;
use tokio::sync::broadcast;

/// Broadcast channel for one note's events
pub type NoteBroadcast = broadcast::Sender<ChannelEvent>;

/// Broadcast an event to all subscribers of a note
///
/// Returns the number of subscribers that received the event (0 if none).
pub fn broadcast_event(broadcast_tx: &NoteBroadcast, event: ChannelEvent) -> usize {
    let name = event.name();
    match broadcast_tx.send(event) {
        Ok(subscriber_count) => {
            tracing::debug!("[Realtime] {} sent to {} subscribers", name, subscriber_count);
            subscriber_count
        }
        Err(_) => {
            // No subscribers, that's okay
            tracing::debug!("[Realtime] No subscribers to receive {}", name);
            0
        }
    }
}
