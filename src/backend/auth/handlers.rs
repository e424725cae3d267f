/**
 * Get Current User Handler
 *
 * GET /api/auth/me returns the principal attested by the bearer token. The
 * collaboration client calls it once on connect to learn its own user id,
 * which it needs to filter its own presence entries.
 *
 * The call also records the principal in the user directory, so an account
 * becomes invitable once it has signed in.
 *
 * # Example Response
 *
 * ```json
 * {
 *   "user_id": "123e4567-e89b-12d3-a456-426614174000",
 *   "email": "user@example.com"
 * }
 * ```
 */

use axum::{extract::State, response::Json};

use crate::backend::collab::CollabState;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::shared::principal::Principal;

/// Get current user handler
pub async fn get_me(
    State(collab): State<CollabState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Principal>, BackendError> {
    collab.directory.register(&principal).await?;
    tracing::debug!("[Auth] /me for {}", principal.user_id);
    Ok(Json(principal))
}
