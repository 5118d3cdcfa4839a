//! The router interface and the per-message state machine.
//!
//! Every message moves `Received -> [Routing] -> [Dispatched] -> Replied`.
//! `Routing` is skipped when an image forces dispatch, and `Dispatched` is
//! skipped when the model answers directly.

use crate::config::RoutingStrategy;
use crate::decision::Capability;
use crate::error::AssistError;
use crate::prompts::IMAGE_ATTACHED_MARKER;
use async_trait::async_trait;
use realty_assist_ai::LlmMessage;
use realty_assist_conversation::{ConversationSession, ConversationTurn, ImageReference, Role};
use realty_assist_core::Result;
use std::fmt;
use tracing::debug;

/// States of one message's trip through a router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteStage {
    Received,
    Routing,
    Dispatched,
    Replied,
}

impl fmt::Display for RouteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Routing => "routing",
            Self::Dispatched => "dispatched",
            Self::Replied => "replied",
        };
        f.write_str(name)
    }
}

/// A message to route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub text: String,
    /// An image supplied alongside the text, e.g. an upload.
    pub attachment: Option<ImageReference>,
}

impl IncomingMessage {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachment: None,
        }
    }

    #[must_use]
    pub fn with_attachment(mut self, attachment: ImageReference) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// The result of routing one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOutcome {
    pub reply: String,
    /// The capability that produced the reply; `None` for a direct answer
    /// or the fallback.
    pub capability: Capability,
    /// Stages visited, in order.
    pub path: Vec<RouteStage>,
}

/// Decides how to answer a message and records the exchange in the session.
#[async_trait]
pub trait Router: Send + Sync {
    /// Routes `message` and appends the user and reply turns to `session`.
    ///
    /// On error the session may hold a user turn without a reply; callers
    /// that keep sessions should route on a copy.
    async fn handle(
        &self,
        message: IncomingMessage,
        session: &mut ConversationSession,
    ) -> Result<RouteOutcome, AssistError>;

    fn strategy(&self) -> RoutingStrategy;
}

/// Records stage transitions for one message.
pub(crate) struct RouteTrace {
    path: Vec<RouteStage>,
}

impl RouteTrace {
    pub(crate) fn start() -> Self {
        debug!(stage = %RouteStage::Received, "message received");
        Self {
            path: vec![RouteStage::Received],
        }
    }

    pub(crate) fn enter(&mut self, stage: RouteStage, capability: Capability) {
        debug!(
            from = ?self.path.last(),
            stage = %stage,
            capability = %capability,
            "route transition"
        );
        self.path.push(stage);
    }

    pub(crate) fn replied(mut self, reply: String, capability: Capability) -> RouteOutcome {
        self.enter(RouteStage::Replied, capability);
        RouteOutcome {
            reply,
            capability,
            path: self.path,
        }
    }
}

/// The user turn stored for `message`.
///
/// Uploaded bytes are not kept; the turn carries a marker instead.
pub(crate) fn user_turn(
    message: &IncomingMessage,
    found: Option<ImageReference>,
) -> ConversationTurn {
    match &message.attachment {
        Some(attachment) => {
            let text = message.text.trim();
            let content = if text.is_empty() {
                IMAGE_ATTACHED_MARKER.to_string()
            } else {
                format!("{text} {IMAGE_ATTACHED_MARKER}")
            };
            let turn = ConversationTurn::user(content);
            if attachment.is_inline() {
                turn
            } else {
                turn.with_attachment(attachment.clone())
            }
        }
        None => {
            let turn = ConversationTurn::user(message.text.clone());
            match found {
                Some(image) => turn.with_attachment(image),
                None => turn,
            }
        }
    }
}

/// Converts session turns into the model's working context.
pub(crate) fn model_context(turns: &[ConversationTurn]) -> Vec<LlmMessage> {
    turns
        .iter()
        .filter(|turn| !turn.content().trim().is_empty())
        .map(|turn| match turn.role() {
            Role::User => LlmMessage::user(turn.content()),
            Role::Model => LlmMessage::model(turn.content()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use realty_assist_ai::MessageRole;

    #[test]
    fn uploaded_image_turn_has_marker_and_no_bytes() {
        let message =
            IncomingMessage::text("Damp corner").with_attachment(ImageReference::InlineData {
                bytes: vec![1, 2, 3],
                mime_type: "image/jpeg".to_string(),
            });
        let turn = user_turn(&message, None);

        assert_eq!(turn.content(), "Damp corner [Image attached]");
        assert!(turn.attachment().is_none());

        let bare = IncomingMessage::text("").with_attachment(ImageReference::InlineData {
            bytes: vec![],
            mime_type: "image/png".to_string(),
        });
        assert_eq!(user_turn(&bare, None).content(), "[Image attached]");
    }

    #[test]
    fn text_reference_stays_on_turn() {
        let url = ImageReference::RemoteUrl("https://x.test/a.png".to_string());
        let turn = user_turn(&IncomingMessage::text("https://x.test/a.png"), Some(url.clone()));
        assert_eq!(turn.content(), "https://x.test/a.png");
        assert_eq!(turn.attachment(), Some(&url));
    }

    #[test]
    fn model_context_keeps_order_and_roles() {
        let turns = vec![
            ConversationTurn::user("a"),
            ConversationTurn::model("b"),
            ConversationTurn::user(" "),
            ConversationTurn::user("c"),
        ];
        let messages = model_context(&turns);
        let roles: Vec<_> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::User, MessageRole::Model, MessageRole::User]
        );
        assert_eq!(messages[2].text(), "c");
    }

    #[test]
    fn trace_records_path() {
        let mut trace = RouteTrace::start();
        trace.enter(RouteStage::Routing, Capability::None);
        let outcome = trace.replied("hi".to_string(), Capability::None);
        assert_eq!(
            outcome.path,
            vec![RouteStage::Received, RouteStage::Routing, RouteStage::Replied]
        );
    }
}
