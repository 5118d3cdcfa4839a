//! Conversation sessions and their store.
//!
//! A session owns its ordered turns. The store maps session ids to sessions
//! with no expiry; concurrent writers to the same id race and the last
//! write wins.

use crate::error::SessionError;
use crate::message::{ConversationTurn, HistoryEntry, RawHistoryEntry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use realty_assist_core::SessionId;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// One user's ongoing conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSession {
    id: SessionId,
    turns: Vec<ConversationTurn>,
    created_at: DateTime<Utc>,
}

impl ConversationSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            turns: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Creates a session from caller-supplied history.
    ///
    /// Entries with a missing or unknown role, or without text, are skipped.
    #[must_use]
    pub fn from_history(id: SessionId, history: &[RawHistoryEntry]) -> Self {
        let mut session = Self::new(id);
        session.replace_history(history);
        session
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Appends a turn.
    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// Discards all turns and adopts the valid entries of `history`.
    pub fn replace_history(&mut self, history: &[RawHistoryEntry]) {
        let turns: Vec<_> = history.iter().filter_map(RawHistoryEntry::to_turn).collect();
        if turns.len() < history.len() {
            debug!(
                session_id = %self.id,
                skipped = history.len() - turns.len(),
                "skipped invalid history entries"
            );
        }
        self.turns = turns;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    #[must_use]
    pub fn last_turn(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    /// The `{role, text}` transcript returned to callers.
    #[must_use]
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.turns
            .iter()
            .map(ConversationTurn::to_history_entry)
            .collect()
    }

    /// The transcript with creation and last-activity times.
    #[must_use]
    pub fn transcript(&self) -> Transcript {
        Transcript {
            session_id: self.id.to_string(),
            created_at: self.created_at,
            updated_at: self
                .last_turn()
                .map_or(self.created_at, ConversationTurn::timestamp),
            history: self.history(),
        }
    }
}

/// A stored session as shown to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    /// Time of the latest turn, or `created_at` for an empty session.
    pub updated_at: DateTime<Utc>,
    pub history: Vec<HistoryEntry>,
}

/// Process-wide keyed store of sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the stored session, or a new empty one (not yet stored).
    async fn get_or_create(&self, id: &SessionId) -> Result<ConversationSession, SessionError>;

    /// Returns the stored session.
    async fn get(&self, id: &SessionId) -> Result<ConversationSession, SessionError>;

    /// Stores `session`, replacing anything stored under its id.
    async fn put(&self, session: ConversationSession) -> Result<(), SessionError>;

    /// Appends a turn, creating the session if needed.
    async fn append(&self, id: &SessionId, turn: ConversationTurn) -> Result<(), SessionError>;

    /// Deletes a session.
    async fn delete(&self, id: &SessionId) -> Result<(), SessionError>;

    /// Number of stored sessions.
    async fn len(&self) -> usize;

    async fn contains(&self, id: &SessionId) -> bool;
}

/// Session store held in process memory.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, ConversationSession>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, id: &SessionId) -> Result<ConversationSession, SessionError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(id)
            .cloned()
            .unwrap_or_else(|| ConversationSession::new(id.clone())))
    }

    async fn get(&self, id: &SessionId) -> Result<ConversationSession, SessionError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound { id: id.clone() })
    }

    async fn put(&self, session: ConversationSession) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(session.id()) {
            info!(session_id = %session.id(), "session created");
        }
        sessions.insert(session.id().clone(), session);
        Ok(())
    }

    async fn append(&self, id: &SessionId, turn: ConversationTurn) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id.clone())
            .or_insert_with(|| {
                info!(session_id = %id, "session created");
                ConversationSession::new(id.clone())
            })
            .append(turn);
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        match sessions.remove(id) {
            Some(_) => {
                info!(session_id = %id, "session deleted");
                Ok(())
            }
            None => Err(SessionError::NotFound { id: id.clone() }),
        }
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn contains(&self, id: &SessionId) -> bool {
        self.sessions.read().await.contains_key(id)
    }
}
