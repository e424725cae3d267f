/**
 * Principal
 *
 * An authenticated identity as attested by the identity provider: a user id
 * plus the verified email address. Invite matching always uses the
 * normalized form of the email.
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::invite::normalize_email;

/// Authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    /// User ID
    pub user_id: Uuid,
    /// Verified email address
    pub email: String,
}

impl Principal {
    pub fn new(user_id: Uuid, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }

    /// Email in the form used for invite lookups
    pub fn normalized_email(&self) -> String {
        normalize_email(&self.email)
    }
}
