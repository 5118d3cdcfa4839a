//! Turn types for conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End-user message.
    User,
    /// Assistant reply.
    Model,
}

impl Role {
    /// Parses an externally supplied role name.
    ///
    /// `assistant` is accepted as an alias of `model`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Self::User),
            "model" | "assistant" => Some(Self::Model),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An image to be analyzed alongside a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReference {
    /// An HTTP(S) URL to download.
    RemoteUrl(String),
    /// A `data:image/...;base64,...` fragment, kept verbatim until decoded.
    DataUrl(String),
    /// Already-decoded image content, e.g. an upload.
    InlineData { bytes: Vec<u8>, mime_type: String },
}

impl ImageReference {
    /// Returns the textual form for URL-based references.
    #[must_use]
    pub fn as_url(&self) -> Option<&str> {
        match self {
            Self::RemoteUrl(url) | Self::DataUrl(url) => Some(url),
            Self::InlineData { .. } => None,
        }
    }

    /// Returns true for binary content that must not outlive its turn.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        matches!(self, Self::InlineData { .. })
    }
}

/// One message in a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    role: Role,
    content: String,
    attachment: Option<ImageReference>,
    timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Creates a turn.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            attachment: None,
            timestamp: Utc::now(),
        }
    }

    /// Creates a user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates a model turn.
    #[must_use]
    pub fn model(content: impl Into<String>) -> Self {
        Self::new(Role::Model, content)
    }

    /// Attaches an image reference.
    #[must_use]
    pub fn with_attachment(mut self, attachment: ImageReference) -> Self {
        self.attachment = Some(attachment);
        self
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn attachment(&self) -> Option<&ImageReference> {
        self.attachment.as_ref()
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    /// Returns the `{role, text}` view used on the wire.
    #[must_use]
    pub fn to_history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            role: self.role,
            text: self.content.clone(),
        }
    }
}

/// A turn as exchanged with callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub text: String,
}

/// A caller-supplied history entry, validated on import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHistoryEntry {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl RawHistoryEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            text: Some(text.into()),
        }
    }

    /// Converts to a turn, or `None` if the role is missing or unknown or
    /// the text is missing.
    #[must_use]
    pub fn to_turn(&self) -> Option<ConversationTurn> {
        let role = Role::parse(self.role.as_deref()?)?;
        let text = self.text.as_ref()?;
        Some(ConversationTurn::new(role, text.clone()))
    }
}

impl From<HistoryEntry> for RawHistoryEntry {
    fn from(entry: HistoryEntry) -> Self {
        Self::new(entry.role.as_str(), entry.text)
    }
}
