/**
 * Realtime Channel Adapters
 *
 * A [`RealtimeConnector`] joins a note's channel and hands back a
 * [`ChannelSubscription`]: the connection id, a publisher for the two things
 * a participant sends (content-changed broadcasts and cursor offsets), and a
 * receiver of [`ChannelEvent`]s from everyone else.
 *
 * - [`SseConnector`] subscribes over Server-Sent Events and publishes with
 *   POST requests.
 * - [`HubConnector`] joins the in-process hub directly (server builds only).
 *
 * Dropping the subscription's [`ReaderGuard`] stops the reader task, which
 * ends the connection and removes its presence entry.
 */

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::gateway::error_from_body;
use crate::shared::config::{AppConfig, ConfigError};
use crate::shared::error::CollabError;
use crate::shared::event::ChannelEvent;
use crate::shared::presence::TrackCursorRequest;

/// Buffered events between the reader task and the session
const EVENT_BUFFER: usize = 64;

/// Outgoing side of a channel connection
#[async_trait]
pub trait ChannelPublisher: Send + Sync {
    /// Tell the other participants that content was saved
    async fn broadcast_content_updated(&self) -> Result<(), CollabError>;

    /// Publish this connection's cursor offset
    async fn track(&self, cursor_offset: usize) -> Result<(), CollabError>;
}

#[async_trait]
pub trait RealtimeConnector: Send + Sync {
    async fn join(&self, note_id: Uuid) -> Result<ChannelSubscription, CollabError>;
}

/// Aborts the reader task on drop
#[derive(Debug)]
pub struct ReaderGuard(JoinHandle<()>);

impl Drop for ReaderGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A joined channel
pub struct ChannelSubscription {
    pub connection_id: Uuid,
    pub publisher: Arc<dyn ChannelPublisher>,
    pub events: mpsc::Receiver<ChannelEvent>,
    pub guard: ReaderGuard,
}

/// Incremental parser for `data:` lines of an SSE stream
///
/// Bytes are buffered until a full line arrives, so a UTF-8 character split
/// across network chunks is decoded whole.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns the events completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<ChannelEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(newline) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = match std::str::from_utf8(&raw) {
                Ok(line) => line.trim_end_matches(['\n', '\r']),
                Err(e) => {
                    tracing::warn!("[Realtime] Dropping non UTF-8 event line: {}", e);
                    continue;
                }
            };

            // Skip empty lines, comments (keep-alive) and `event:` names
            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            match ChannelEvent::from_json(data.trim_start()) {
                Ok(event) => events.push(event),
                Err(e) => tracing::warn!("[Realtime] Unparseable event data: {} | {}", e, data),
            }
        }
        events
    }
}

/// Connector over the HTTP realtime endpoints
#[derive(Clone)]
pub struct SseConnector {
    client: Client,
    base_url: String,
    token: String,
}

impl SseConnector {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Connector for the server named by the configuration
    pub fn from_config(config: &AppConfig, token: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self::new(config.client_base_url()?, token))
    }

    fn realtime_url(&self, note_id: Uuid) -> String {
        format!("{}/api/notes/{}/realtime", self.base_url, note_id)
    }
}

#[async_trait]
impl RealtimeConnector for SseConnector {
    async fn join(&self, note_id: Uuid) -> Result<ChannelSubscription, CollabError> {
        let url = self.realtime_url(note_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "text/event-stream")
            .send()
            .await
            .map_err(|e| CollabError::transient(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(error_from_body(status.as_u16(), &text));
        }

        let (sender, mut events) = mpsc::channel(EVENT_BUFFER);
        let reader = tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut decoder = SseDecoder::new();
            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        tracing::warn!("[Realtime] Stream for note {} ended: {}", note_id, e);
                        return;
                    }
                };
                for event in decoder.push(&chunk) {
                    if sender.send(event).await.is_err() {
                        return;
                    }
                }
            }
            tracing::info!("[Realtime] Stream for note {} closed", note_id);
        });
        let guard = ReaderGuard(reader);

        let connection_id = match events.recv().await {
            Some(ChannelEvent::Joined { connection_id }) => connection_id,
            Some(other) => {
                return Err(CollabError::transient(format!(
                    "Expected joined event, got {}",
                    other.name()
                )))
            }
            None => return Err(CollabError::transient("Realtime stream closed before joining")),
        };

        let publisher = SsePublisher {
            client: self.client.clone(),
            channel_url: format!("{}/{}", url, connection_id),
            token: self.token.clone(),
        };

        Ok(ChannelSubscription {
            connection_id,
            publisher: Arc::new(publisher),
            events,
            guard,
        })
    }
}

struct SsePublisher {
    client: Client,
    channel_url: String,
    token: String,
}

impl SsePublisher {
    async fn post(&self, path: &str, body: Option<&TrackCursorRequest>) -> Result<(), CollabError> {
        let mut request = self
            .client
            .post(format!("{}/{}", self.channel_url, path))
            .bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CollabError::transient(format!("Network error: {}", e)))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(error_from_body(status.as_u16(), &text));
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelPublisher for SsePublisher {
    async fn broadcast_content_updated(&self) -> Result<(), CollabError> {
        self.post("broadcast", None).await
    }

    async fn track(&self, cursor_offset: usize) -> Result<(), CollabError> {
        self.post("presence", Some(&TrackCursorRequest { cursor_offset }))
            .await
    }
}

#[cfg(feature = "ssr")]
pub use hub_connector::HubConnector;

#[cfg(feature = "ssr")]
mod hub_connector {
    use super::*;
    use crate::backend::collab::AccessEvaluator;
    use crate::backend::realtime::ChannelHub;
    use crate::shared::principal::Principal;

    /// Connector that joins the in-process hub
    #[derive(Clone)]
    pub struct HubConnector {
        hub: ChannelHub,
        access: AccessEvaluator,
        principal: Principal,
    }

    impl HubConnector {
        pub fn new(hub: ChannelHub, access: AccessEvaluator, principal: Principal) -> Self {
            Self {
                hub,
                access,
                principal,
            }
        }
    }

    #[async_trait]
    impl RealtimeConnector for HubConnector {
        async fn join(&self, note_id: Uuid) -> Result<ChannelSubscription, CollabError> {
            self.access.can_read(note_id, &self.principal).await?;

            let mut membership = self.hub.join(note_id, &self.principal);
            let connection_id = membership.connection_id();
            let (sender, events) = mpsc::channel(EVENT_BUFFER);
            let reader = tokio::spawn(async move {
                while let Some(event) = membership.recv().await {
                    if sender.send(event).await.is_err() {
                        break;
                    }
                }
            });

            let publisher = HubPublisher {
                hub: self.hub.clone(),
                note_id,
                connection_id,
                user_id: self.principal.user_id,
            };

            Ok(ChannelSubscription {
                connection_id,
                publisher: Arc::new(publisher),
                events,
                guard: ReaderGuard(reader),
            })
        }
    }

    struct HubPublisher {
        hub: ChannelHub,
        note_id: Uuid,
        connection_id: Uuid,
        user_id: Uuid,
    }

    #[async_trait]
    impl ChannelPublisher for HubPublisher {
        async fn broadcast_content_updated(&self) -> Result<(), CollabError> {
            self.hub
                .broadcast_content_updated(self.note_id, self.connection_id, self.user_id)
                .map(|_| ())
        }

        async fn track(&self, cursor_offset: usize) -> Result<(), CollabError> {
            self.hub
                .track(self.note_id, self.connection_id, self.user_id, cursor_offset)
        }
    }
}
