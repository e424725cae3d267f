//! Invite Types
//!
//! Email normalization and the request/response shapes of the invite flow.
//! Invites are keyed by the normalized email (trimmed, lowercased), so every
//! comparison between an invite and a principal goes through
//! [`normalize_email`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::CollabError;
use crate::shared::note::Invite;

/// Shown when the invited email has no registered account
pub const NOT_REGISTERED_MESSAGE: &str = "This user is not registered. Invite them to the app first (e.g. share the app link so they can sign up). The note will appear on their dashboard once they register.";

/// Shown when the invite row already existed
pub const ALREADY_INVITED_MESSAGE: &str =
    "Already invited. Share the link below with them if they haven't seen it yet.";

/// Shown when a new invite row was saved
pub const INVITE_SAVED_MESSAGE: &str = "Invitation saved. They'll see it on their Collaborative Notes page. Share the link below if needed.";

/// Trim and lowercase an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalize and validate an email address
///
/// Accepts `local@domain.tld` shapes: exactly one `@`, a non-empty local
/// part, a domain containing a dot that neither starts nor ends the domain,
/// and no whitespace.
pub fn validate_email(email: &str) -> Result<String, CollabError> {
    let normalized = normalize_email(email);
    if normalized.is_empty() {
        return Err(CollabError::validation("email", "Email is required"));
    }

    let invalid = || CollabError::validation("email", "Invalid email address");

    if normalized.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = normalized.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }

    Ok(normalized)
}

/// Request body for inviting a collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteRequest {
    #[serde(default)]
    pub email: String,
}

/// Result of an invite attempt
///
/// `accepted` is false only when the recipient is not registered; nothing is
/// persisted in that case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteOutcome {
    pub accepted: bool,
    pub registered: bool,
    pub message: String,
}

impl InviteOutcome {
    pub fn not_registered() -> Self {
        Self {
            accepted: false,
            registered: false,
            message: NOT_REGISTERED_MESSAGE.to_string(),
        }
    }

    pub fn saved() -> Self {
        Self {
            accepted: true,
            registered: true,
            message: INVITE_SAVED_MESSAGE.to_string(),
        }
    }

    pub fn already_invited() -> Self {
        Self {
            accepted: true,
            registered: true,
            message: ALREADY_INVITED_MESSAGE.to_string(),
        }
    }
}

/// Pending invite as listed to the note owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingInvite {
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<Invite> for PendingInvite {
    fn from(invite: Invite) -> Self {
        Self {
            email: invite.email,
            created_at: invite.created_at,
        }
    }
}

/// Response body for the pending invite listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListInvitesResponse {
    pub invites: Vec<PendingInvite>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  User@Example.COM "), "user@example.com");
    }

    #[test]
    fn test_validate_email_accepts_common_shapes() {
        assert_eq!(
            validate_email(" Registered@Example.com").unwrap(),
            "registered@example.com"
        );
        assert!(validate_email("a.b+tag@sub.example.org").is_ok());
    }

    #[test]
    fn test_validate_email_rejects_malformed() {
        for bad in ["", "   ", "no-at-sign", "@example.com", "a@b", "a@.com", "a@example.", "a b@example.com", "a@b@example.com"] {
            let error = validate_email(bad).unwrap_err();
            assert_eq!(error.code(), "validation_error", "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_outcomes() {
        assert!(!InviteOutcome::not_registered().accepted);
        assert!(!InviteOutcome::not_registered().registered);
        assert!(InviteOutcome::already_invited().message.starts_with("Already invited"));
        assert!(InviteOutcome::saved().accepted);
    }
}
