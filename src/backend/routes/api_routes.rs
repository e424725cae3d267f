/**
 * API Route Handlers
 *
 * This module defines the JSON API routes:
 *
 * ## Authentication
 * - `GET /api/auth/me` - Current principal
 *
 * ## Notes
 * - `POST   /api/notes` - Create a note (auth optional; required for collaborative)
 * - `GET    /api/notes` - My collaborative notes
 * - `POST   /api/notes/{id}/view` - Public read with optional password
 * - `POST   /api/notes/{id}/open` - Open for editing
 * - `PUT    /api/notes/{id}/content` - Save content
 * - `DELETE /api/notes/{id}` - Delete (owner only)
 *
 * ## Invites
 * - `POST /api/notes/{id}/invites` - Invite by email (owner only)
 * - `GET  /api/notes/{id}/invites` - Pending invites (owner only)
 */

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::backend::auth::get_me;
use crate::backend::collab::handlers::{
    create_invite, create_note, delete_note, list_invites, list_notes, open_note, update_content,
    view_note,
};
use crate::backend::server::state::AppState;

/// Configure API routes
///
/// Public routes: note creation (anonymous notes only) and note view.
/// Everything else requires a bearer token, checked by the handlers'
/// extractors.
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        // Authentication endpoints
        .route("/api/auth/me", get(get_me))
        // Note endpoints
        .route("/api/notes", post(create_note).get(list_notes))
        .route("/api/notes/{id}", delete(delete_note))
        .route("/api/notes/{id}/view", post(view_note))
        .route("/api/notes/{id}/open", post(open_note))
        .route("/api/notes/{id}/content", put(update_content))
        // Invite endpoints
        .route("/api/notes/{id}/invites", post(create_invite).get(list_invites))
}
