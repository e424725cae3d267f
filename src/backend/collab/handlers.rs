/**
 * Collaborative Note Handlers
 *
 * HTTP handlers over [`CollabState`]. Handlers only extract and convert;
 * all decisions are made by the note service, the access evaluator and the
 * invite manager, and their errors map to statuses through
 * [`BackendError`].
 *
 * - POST   /api/notes                  - Create a note
 * - GET    /api/notes                  - List the principal's collaborative notes
 * - POST   /api/notes/{id}/view        - Public read (expiry and password)
 * - POST   /api/notes/{id}/open        - Open a collaborative note for editing
 * - PUT    /api/notes/{id}/content     - Save content
 * - DELETE /api/notes/{id}             - Delete (owner only)
 * - POST   /api/notes/{id}/invites     - Invite an email (owner only)
 * - GET    /api/notes/{id}/invites     - Pending invites (owner only)
 */

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::state::CollabState;
use crate::backend::error::BackendError;
use crate::backend::middleware::{AuthUser, MaybeAuthUser};
use crate::shared::invite::{InviteOutcome, InviteRequest, ListInvitesResponse};
use crate::shared::note::{
    CreateNoteRequest, CreateNoteResponse, ListNotesResponse, NoteView, UpdateContentRequest,
    UpdateContentResponse, ViewNoteRequest, ViewNoteResponse,
};

pub async fn create_note(
    State(state): State<CollabState>,
    MaybeAuthUser(principal): MaybeAuthUser,
    Json(request): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<CreateNoteResponse>), BackendError> {
    let response = state.notes.create_note(principal.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_notes(
    State(state): State<CollabState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<ListNotesResponse>, BackendError> {
    let notes = state.notes.list_notes(&principal).await?;
    Ok(Json(ListNotesResponse { notes }))
}

pub async fn view_note(
    State(state): State<CollabState>,
    Path(note_id): Path<Uuid>,
    Json(request): Json<ViewNoteRequest>,
) -> Result<Json<ViewNoteResponse>, BackendError> {
    let response = state
        .notes
        .view_note(note_id, request.password.as_deref())
        .await?;
    Ok(Json(response))
}

pub async fn open_note(
    State(state): State<CollabState>,
    AuthUser(principal): AuthUser,
    Path(note_id): Path<Uuid>,
) -> Result<Json<NoteView>, BackendError> {
    tracing::debug!("[Collab] {} opening note {}", principal.user_id, note_id);
    Ok(Json(state.notes.open_for_edit(note_id, &principal).await?))
}

pub async fn update_content(
    State(state): State<CollabState>,
    AuthUser(principal): AuthUser,
    Path(note_id): Path<Uuid>,
    Json(request): Json<UpdateContentRequest>,
) -> Result<Json<UpdateContentResponse>, BackendError> {
    let response = state
        .notes
        .update_content(note_id, &principal, &request.content)
        .await?;
    Ok(Json(response))
}

pub async fn delete_note(
    State(state): State<CollabState>,
    AuthUser(principal): AuthUser,
    Path(note_id): Path<Uuid>,
) -> Result<StatusCode, BackendError> {
    state.notes.delete_note(note_id, &principal).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_invite(
    State(state): State<CollabState>,
    AuthUser(principal): AuthUser,
    Path(note_id): Path<Uuid>,
    Json(request): Json<InviteRequest>,
) -> Result<Json<InviteOutcome>, BackendError> {
    let outcome = state
        .invites
        .invite(note_id, &principal, &request.email)
        .await?;
    Ok(Json(outcome))
}

pub async fn list_invites(
    State(state): State<CollabState>,
    AuthUser(principal): AuthUser,
    Path(note_id): Path<Uuid>,
) -> Result<Json<ListInvitesResponse>, BackendError> {
    let invites = state.invites.list_invites(note_id, &principal).await?;
    Ok(Json(ListInvitesResponse { invites }))
}
