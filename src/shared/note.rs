/**
 * Note Data Structures
 *
 * Durable records of the collaborative core (notes, collaborator rows,
 * invite rows) and the request/response shapes exchanged over the HTTP API.
 *
 * # Expiry horizon
 *
 * Collaborative notes must expire, at most 10 hours after creation.
 * Anonymous notes may expire, at most 12 hours after creation. Both must
 * expire strictly in the future.
 */
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::CollabError;

/// Maximum lifetime of a collaborative note
pub const COLLABORATIVE_MAX_HORIZON_HOURS: i64 = 10;

/// Maximum lifetime of an anonymous note
pub const ANONYMOUS_MAX_HORIZON_HOURS: i64 = 12;

/// A stored text document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique note ID
    pub id: Uuid,
    /// Note body
    pub content: String,
    /// Owner, `None` for anonymous notes
    pub owner_id: Option<Uuid>,
    /// Whether the note is shared for realtime editing
    pub is_collaborative: bool,
    /// bcrypt hash, `None` when unprotected
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Expiry timestamp
    pub expires_at: Option<DateTime<Utc>>,
    /// Created at timestamp
    pub created_at: DateTime<Utc>,
    /// Bumped on every content mutation
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Whether the note's expiry has passed at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }

    /// Whether `user_id` owns this note
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == Some(user_id)
    }
}

/// Role of a collaborator on a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Editor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Editor => "editor",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "owner" => Some(Role::Owner),
            "editor" => Some(Role::Editor),
            _ => None,
        }
    }
}

/// Standing edit access of a principal to a collaborative note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaborator {
    pub note_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
}

/// Pending, email-addressed offer of editor access
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    pub id: Uuid,
    pub note_id: Uuid,
    /// Normalized (trimmed, lowercased) email
    pub email: String,
    pub invited_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a note
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    /// Initial content; required for anonymous notes
    #[serde(default)]
    pub content: Option<String>,
    /// Optional password protecting public reads
    #[serde(default)]
    pub password: Option<String>,
    /// Expiry; required for collaborative notes
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Create a collaborative note
    #[serde(default)]
    pub is_collaborative: bool,
}

impl CreateNoteRequest {
    /// A collaborative note with empty content expiring at `expires_at`
    pub fn collaborative(expires_at: DateTime<Utc>) -> Self {
        Self {
            content: None,
            password: None,
            expires_at: Some(expires_at),
            is_collaborative: true,
        }
    }

    /// An anonymous note with the given content
    pub fn anonymous(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Password trimmed, with blank treated as absent
    pub fn effective_password(&self) -> Option<&str> {
        self.password
            .as_deref()
            .map(str::trim)
            .filter(|password| !password.is_empty())
    }

    /// Validate content and expiry against the creation-time rules
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), CollabError> {
        if !self.is_collaborative && self.content.is_none() {
            return Err(CollabError::validation("content", "Content is required"));
        }
        validate_expiry(self.is_collaborative, self.expires_at, now)
    }
}

/// Check an expiry against the horizon for the given note kind
pub fn validate_expiry(
    is_collaborative: bool,
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(), CollabError> {
    let horizon_hours = if is_collaborative {
        COLLABORATIVE_MAX_HORIZON_HOURS
    } else {
        ANONYMOUS_MAX_HORIZON_HOURS
    };

    let expires_at = match expires_at {
        Some(expires_at) => expires_at,
        None if is_collaborative => {
            return Err(CollabError::validation(
                "expires_at",
                "Expiry is required for collaborative notes",
            ));
        }
        None => return Ok(()),
    };

    if expires_at <= now {
        return Err(CollabError::validation(
            "expires_at",
            "Expiry must be in the future",
        ));
    }
    if expires_at > now + Duration::hours(horizon_hours) {
        return Err(CollabError::validation(
            "expires_at",
            format!("Expiry cannot exceed {} hours", horizon_hours),
        ));
    }
    Ok(())
}

/// Response body for creating a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNoteResponse {
    pub id: Uuid,
}

/// Collaborator as shown to editors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorView {
    pub user_id: Uuid,
    pub role: Role,
}

impl From<Collaborator> for CollaboratorView {
    fn from(collaborator: Collaborator) -> Self {
        Self {
            user_id: collaborator.user_id,
            role: collaborator.role,
        }
    }
}

/// A collaborative note opened for editing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteView {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Role of the requesting principal
    pub role: Role,
    pub collaborators: Vec<CollaboratorView>,
}

/// Request body for saving note content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateContentRequest {
    #[serde(default)]
    pub content: String,
}

/// Response body for saving note content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateContentResponse {
    pub ok: bool,
    pub updated_at: DateTime<Utc>,
}

/// Request body for a public note read
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewNoteRequest {
    #[serde(default)]
    pub password: Option<String>,
}

/// Response body for a public note read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewNoteResponse {
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// How the listing principal relates to a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingRole {
    Owner,
    Editor,
    Invited,
}

/// One entry of the "my collaborative notes" listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSummary {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub role: ListingRole,
}

impl NoteSummary {
    pub fn from_note(note: Note, role: ListingRole) -> Self {
        Self {
            id: note.id,
            content: note.content,
            created_at: note.created_at,
            updated_at: note.updated_at,
            expires_at: note.expires_at,
            role,
        }
    }
}

/// Response body for the notes listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListNotesResponse {
    pub notes: Vec<NoteSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-19T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_collaborative_requires_expiry() {
        let request = CreateNoteRequest {
            is_collaborative: true,
            ..CreateNoteRequest::default()
        };
        let error = request.validate(now()).unwrap_err();
        assert_eq!(error.code(), "validation_error");
    }

    #[test]
    fn test_collaborative_two_hours_is_valid() {
        let request = CreateNoteRequest::collaborative(now() + Duration::hours(2));
        assert!(request.validate(now()).is_ok());
    }

    #[test]
    fn test_collaborative_eleven_hours_is_rejected() {
        let request = CreateNoteRequest::collaborative(now() + Duration::hours(11));
        match request.validate(now()) {
            Err(CollabError::ValidationError { field, message }) => {
                assert_eq!(field, "expires_at");
                assert!(message.contains("10 hours"));
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_collaborative_exactly_ten_hours_is_valid() {
        let request = CreateNoteRequest::collaborative(now() + Duration::hours(10));
        assert!(request.validate(now()).is_ok());
    }

    #[test]
    fn test_past_expiry_is_rejected() {
        let request = CreateNoteRequest::collaborative(now() - Duration::minutes(1));
        assert!(request.validate(now()).is_err());
    }

    #[test]
    fn test_anonymous_horizon_is_twelve_hours() {
        let ok = CreateNoteRequest::anonymous("hi").with_expiry(now() + Duration::hours(11));
        assert!(ok.validate(now()).is_ok());

        let too_long = CreateNoteRequest::anonymous("hi").with_expiry(now() + Duration::hours(13));
        assert!(too_long.validate(now()).is_err());
    }

    #[test]
    fn test_anonymous_requires_content() {
        let request = CreateNoteRequest::default();
        assert!(request.validate(now()).is_err());
        assert!(CreateNoteRequest::anonymous("").validate(now()).is_ok());
    }

    #[test]
    fn test_blank_password_is_ignored() {
        let request = CreateNoteRequest::anonymous("x").with_password("   ");
        assert_eq!(request.effective_password(), None);
        let request = CreateNoteRequest::anonymous("x").with_password(" hunter2 ");
        assert_eq!(request.effective_password(), Some("hunter2"));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("owner"), Some(Role::Owner));
        assert_eq!(Role::parse(Role::Editor.as_str()), Some(Role::Editor));
        assert_eq!(Role::parse("viewer"), None);
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let note = Note {
            id: Uuid::new_v4(),
            content: String::new(),
            owner_id: None,
            is_collaborative: false,
            password_hash: Some("$2b$10$secret".to_string()),
            expires_at: None,
            created_at: now(),
            updated_at: now(),
        };
        let json = serde_json::to_string(&note).unwrap();
        assert!(!json.contains("secret"));
    }
}
