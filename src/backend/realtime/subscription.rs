/**
 * Real-time Subscription Handlers
 *
 * Server-Sent Events stream for one note's channel, plus the two publish
 * endpoints a subscribed connection uses.
 *
 * - `GET  /api/notes/{id}/realtime` opens the stream. The first event is
 *   `joined` with the connection id; after that come `presence_sync` and
 *   `content_updated` events from the hub.
 * - `POST /api/notes/{id}/realtime/{connection_id}/broadcast` tells the other
 *   connections that content was saved.
 * - `POST /api/notes/{id}/realtime/{connection_id}/presence` updates the
 *   connection's cursor offset.
 *
 * # Connection Management
 *
 * The hub membership lives inside the response stream. When the client
 * disconnects axum drops the stream, which drops the membership and removes
 * the connection's presence entry. Keep-alive comments hold idle streams
 * open.
 */

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::{future, stream, StreamExt};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::backend::collab::CollabState;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::realtime::hub::ChannelHub;
use crate::shared::event::ChannelEvent;
use crate::shared::presence::TrackCursorRequest;

/// Handle note channel subscription (GET /api/notes/{id}/realtime)
///
/// Joining requires the same access as opening the note for editing, so a
/// pending invite is accepted here too.
///
/// # Errors
///
/// * `401 Unauthorized` - No authenticated principal
/// * `403 Forbidden` - Not collaborative, or no access
/// * `404 Not Found` - Unknown note
///
/// # Example Response
///
/// ```http
/// HTTP/1.1 200 OK
/// Content-Type: text/event-stream
///
/// event: joined
/// data: {"type":"joined","connection_id":"..."}
///
/// event: presence_sync
/// data: {"type":"presence_sync","entries":[...]}
/// ```
pub async fn handle_note_subscription(
    State(collab): State<CollabState>,
    State(hub): State<ChannelHub>,
    AuthUser(principal): AuthUser,
    Path(note_id): Path<Uuid>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, axum::Error>>>, BackendError> {
    collab.access.can_read(note_id, &principal).await?;

    let membership = hub.join(note_id, &principal);
    let joined = ChannelEvent::Joined {
        connection_id: membership.connection_id(),
    };

    let updates = stream::unfold(membership, |mut membership| async move {
        let event = membership.recv().await?;
        Some((sse_event(&event), membership))
    });
    let stream = stream::once(future::ready(sse_event(&joined))).chain(updates);

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Tell the note's other connections to refetch
/// (POST /api/notes/{id}/realtime/{connection_id}/broadcast)
pub async fn handle_content_broadcast(
    State(hub): State<ChannelHub>,
    AuthUser(principal): AuthUser,
    Path((note_id, connection_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, BackendError> {
    let delivered = hub.broadcast_content_updated(note_id, connection_id, principal.user_id)?;
    Ok(Json(json!({ "ok": true, "delivered": delivered })))
}

/// Update the connection's cursor offset
/// (POST /api/notes/{id}/realtime/{connection_id}/presence)
pub async fn handle_presence_update(
    State(hub): State<ChannelHub>,
    AuthUser(principal): AuthUser,
    Path((note_id, connection_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<TrackCursorRequest>,
) -> Result<StatusCode, BackendError> {
    hub.track(note_id, connection_id, principal.user_id, request.cursor_offset)?;
    Ok(StatusCode::NO_CONTENT)
}

fn sse_event(event: &ChannelEvent) -> Result<Event, axum::Error> {
    Event::default().event(event.name()).json_data(event)
}
