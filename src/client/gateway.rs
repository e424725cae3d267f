/**
 * Note Gateway
 *
 * The session controller's view of the server: load a note (running access
 * evaluation and invite acceptance server-side), save content, and manage
 * invites.
 *
 * - [`HttpGateway`] talks to the JSON API with a bearer token.
 * - [`DirectGateway`] calls the collaborative services in-process (server
 *   builds only); tests and embedded deployments use it.
 */

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use crate::shared::config::{AppConfig, ConfigError};
use crate::shared::error::CollabError;
use crate::shared::invite::{InviteOutcome, InviteRequest, ListInvitesResponse, PendingInvite};
use crate::shared::note::{NoteView, UpdateContentRequest, UpdateContentResponse};
use crate::shared::principal::Principal;

#[async_trait]
pub trait NoteGateway: Send + Sync {
    /// The principal this gateway acts for
    async fn principal(&self) -> Result<Principal, CollabError>;

    /// Load a collaborative note for editing
    async fn open_note(&self, note_id: Uuid) -> Result<NoteView, CollabError>;

    /// Persist new content
    async fn save_content(
        &self,
        note_id: Uuid,
        content: &str,
    ) -> Result<UpdateContentResponse, CollabError>;

    async fn invite(&self, note_id: Uuid, email: &str) -> Result<InviteOutcome, CollabError>;

    async fn list_invites(&self, note_id: Uuid) -> Result<Vec<PendingInvite>, CollabError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    code: String,
}

/// Gateway over the HTTP API
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, token)
    }

    /// Gateway for the server named by the configuration
    pub fn from_config(config: &AppConfig, token: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self::new(config.client_base_url()?, token))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, CollabError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| CollabError::transient(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(error_from_body(status.as_u16(), &text));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CollabError::transient(format!("Invalid response: {}", e)))
    }
}

/// Turn an error response body back into a typed error
pub(crate) fn error_from_body(status: u16, text: &str) -> CollabError {
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(body) if !body.code.is_empty() => CollabError::from_code(&body.code, body.error),
        Ok(body) => CollabError::transient(format!("{} - {}", status, body.error)),
        Err(_) if status == 401 => CollabError::Unauthenticated,
        Err(_) => CollabError::transient(format!("Request failed: {} - {}", status, text)),
    }
}

#[async_trait]
impl NoteGateway for HttpGateway {
    async fn principal(&self) -> Result<Principal, CollabError> {
        self.send(self.client.get(self.api_url("/api/auth/me"))).await
    }

    async fn open_note(&self, note_id: Uuid) -> Result<NoteView, CollabError> {
        let url = self.api_url(&format!("/api/notes/{}/open", note_id));
        self.send(self.client.post(url)).await
    }

    async fn save_content(
        &self,
        note_id: Uuid,
        content: &str,
    ) -> Result<UpdateContentResponse, CollabError> {
        let url = self.api_url(&format!("/api/notes/{}/content", note_id));
        let body = UpdateContentRequest {
            content: content.to_string(),
        };
        self.send(self.client.put(url).json(&body)).await
    }

    async fn invite(&self, note_id: Uuid, email: &str) -> Result<InviteOutcome, CollabError> {
        let url = self.api_url(&format!("/api/notes/{}/invites", note_id));
        let body = InviteRequest {
            email: email.to_string(),
        };
        self.send(self.client.post(url).json(&body)).await
    }

    async fn list_invites(&self, note_id: Uuid) -> Result<Vec<PendingInvite>, CollabError> {
        let url = self.api_url(&format!("/api/notes/{}/invites", note_id));
        let response: ListInvitesResponse = self.send(self.client.get(url)).await?;
        Ok(response.invites)
    }
}

/// Gateway that calls the collaborative services directly
#[cfg(feature = "ssr")]
#[derive(Clone)]
pub struct DirectGateway {
    state: crate::backend::collab::CollabState,
    principal: Principal,
}

#[cfg(feature = "ssr")]
impl DirectGateway {
    pub fn new(state: crate::backend::collab::CollabState, principal: Principal) -> Self {
        Self { state, principal }
    }
}

#[cfg(feature = "ssr")]
#[async_trait]
impl NoteGateway for DirectGateway {
    async fn principal(&self) -> Result<Principal, CollabError> {
        Ok(self.principal.clone())
    }

    async fn open_note(&self, note_id: Uuid) -> Result<NoteView, CollabError> {
        self.state.notes.open_for_edit(note_id, &self.principal).await
    }

    async fn save_content(
        &self,
        note_id: Uuid,
        content: &str,
    ) -> Result<UpdateContentResponse, CollabError> {
        self.state
            .notes
            .update_content(note_id, &self.principal, content)
            .await
    }

    async fn invite(&self, note_id: Uuid, email: &str) -> Result<InviteOutcome, CollabError> {
        self.state.invites.invite(note_id, &self.principal, email).await
    }

    async fn list_invites(&self, note_id: Uuid) -> Result<Vec<PendingInvite>, CollabError> {
        self.state.invites.list_invites(note_id, &self.principal).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_maps_back_to_variant() {
        let body = r#"{"error":"Only the note owner can invite others","status":403,"code":"forbidden"}"#;
        assert_eq!(
            error_from_body(403, body),
            CollabError::forbidden("Only the note owner can invite others")
        );
        assert_eq!(
            error_from_body(404, r#"{"error":"Note not found","status":404,"code":"not_found"}"#),
            CollabError::NotFound
        );
    }

    #[test]
    fn test_unparseable_body_is_transient() {
        assert!(error_from_body(502, "Bad Gateway").is_transient());
        assert_eq!(error_from_body(401, ""), CollabError::Unauthenticated);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let gateway = HttpGateway::new("http://localhost:3000/", "token");
        assert_eq!(gateway.api_url("/api/notes"), "http://localhost:3000/api/notes");
    }

    #[test]
    fn test_from_config_uses_server_url() {
        let config = AppConfig::builder()
            .bind_addr("0.0.0.0:8080")
            .server_url("https://notes.example.com")
            .build()
            .unwrap();
        let gateway = HttpGateway::from_config(&config, "token").unwrap();
        assert_eq!(
            gateway.api_url("/api/auth/me"),
            "https://notes.example.com/api/auth/me"
        );

        let config = AppConfig::builder().bind_addr("0.0.0.0:8080").build().unwrap();
        let gateway = HttpGateway::from_config(&config, "token").unwrap();
        assert_eq!(gateway.api_url("/api/notes"), "http://127.0.0.1:8080/api/notes");
    }
}
