//! The chat request/response surface offered to transports.

use crate::error::AssistError;
use crate::router::{IncomingMessage, RouteOutcome, Router};
use realty_assist_conversation::{
    ConversationSession, HistoryEntry, ImageReference, RawHistoryEntry, SessionStore, Transcript,
};
use realty_assist_core::{Result, SessionId};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// One incoming chat message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatRequest {
    pub text: String,
    /// Existing session to continue. A new id is minted when absent.
    pub session_id: Option<String>,
    /// Replaces whatever is stored for the session when present.
    pub history: Option<Vec<RawHistoryEntry>>,
    pub image: Option<ImageReference>,
}

impl ChatRequest {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[must_use]
    pub fn with_history(mut self, history: Vec<RawHistoryEntry>) -> Self {
        self.history = Some(history);
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: ImageReference) -> Self {
        self.image = Some(image);
        self
    }
}

/// The reply and updated transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub session_id: String,
    pub history: Vec<HistoryEntry>,
}

/// Resolves sessions, routes messages and persists the result.
#[derive(Clone)]
pub struct ChatService {
    router: Arc<dyn Router>,
    store: Arc<dyn SessionStore>,
}

impl ChatService {
    #[must_use]
    pub fn new(router: Arc<dyn Router>, store: Arc<dyn SessionStore>) -> Self {
        Self { router, store }
    }

    #[must_use]
    pub fn router(&self) -> &Arc<dyn Router> {
        &self.router
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Handles one message.
    ///
    /// The stored session is only written once routing succeeds; a failed
    /// request leaves it as it was.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamUnavailable` or `MalformedUpstreamOutput` from the
    /// router, or `StorageFailed` from the store.
    #[instrument(skip_all, fields(session_id = request.session_id.as_deref().unwrap_or("<new>")))]
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatResponse, AssistError> {
        let ChatRequest {
            text,
            session_id,
            history,
            image,
        } = request;

        let id = SessionId::resolve(session_id.as_deref());
        let mut session = match history {
            Some(history) => ConversationSession::from_history(id, &history),
            None => self
                .store
                .get_or_create(&id)
                .await
                .map_err(AssistError::from)?,
        };

        let message = IncomingMessage { text, attachment: image };
        let RouteOutcome {
            reply, capability, ..
        } = self.router.handle(message, &mut session).await?;

        let response = ChatResponse {
            reply,
            session_id: session.id().to_string(),
            history: session.history(),
        };
        self.store.put(session).await.map_err(AssistError::from)?;

        info!(capability = %capability, turns = response.history.len(), "chat handled");
        Ok(response)
    }

    /// Returns the stored transcript for a session.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` if nothing is stored under `session_id`.
    pub async fn history(&self, session_id: &str) -> Result<Transcript, AssistError> {
        let session = self
            .store
            .get(&SessionId::new(session_id))
            .await
            .map_err(AssistError::from)?;
        Ok(session.transcript())
    }

    /// Deletes a session.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` if nothing is stored under `session_id`.
    pub async fn clear(&self, session_id: &str) -> Result<(), AssistError> {
        self.store
            .delete(&SessionId::new(session_id))
            .await
            .map_err(AssistError::from)?;
        Ok(())
    }
}
