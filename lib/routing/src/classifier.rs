//! Classification-then-dispatch routing.
//!
//! One stateless model call picks a capability from a three-way menu and
//! returns the decision as a JSON array in its text. Accumulated history is
//! never shown to the classifier or the capabilities.

use crate::capabilities::Capabilities;
use crate::config::RoutingStrategy;
use crate::decision::{Capability, RoutingDecision, classifier_tools, extract_decision};
use crate::error::AssistError;
use crate::prompts::{CLASSIFIER_INSTRUCTION, upload_context};
use crate::router::{IncomingMessage, RouteOutcome, RouteStage, RouteTrace, Router, user_turn};
use async_trait::async_trait;
use realty_assist_ai::{LlmBackend, LlmRequest, ModelOutput};
use realty_assist_conversation::{ConversationSession, ConversationTurn};
use realty_assist_core::Result;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Routes with an explicit single-shot classification call.
#[derive(Clone)]
pub struct ClassifierRouter {
    backend: Arc<dyn LlmBackend>,
    capabilities: Capabilities,
    temperature: f32,
}

impl ClassifierRouter {
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, capabilities: Capabilities) -> Self {
        Self {
            backend,
            capabilities,
            temperature: 0.3,
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Asks the model which capability should handle `text`.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamUnavailable` if the call fails, or
    /// `MalformedUpstreamOutput` if no decision can be read from the reply.
    pub async fn classify(&self, text: &str) -> Result<RoutingDecision, AssistError> {
        let request = LlmRequest::prompt(text)
            .with_system(CLASSIFIER_INSTRUCTION)
            .with_tools(classifier_tools())
            .with_temperature(self.temperature);
        let response = self.backend.generate(&request).await.map_err(AssistError::from)?;

        let decision = match response.output {
            ModelOutput::Text(raw) => extract_decision(&raw)?,
            ModelOutput::ToolCall(call) => RoutingDecision::from_tool_call(&call),
        };
        debug!(capability = %decision.capability, "classified");
        Ok(decision)
    }
}

#[async_trait]
impl Router for ClassifierRouter {
    #[instrument(skip_all, fields(session_id = %session.id()))]
    async fn handle(
        &self,
        message: IncomingMessage,
        session: &mut ConversationSession,
    ) -> Result<RouteOutcome, AssistError> {
        let mut trace = RouteTrace::start();

        let (reply, capability) = if let Some(image) = message.attachment.clone() {
            trace.enter(RouteStage::Dispatched, Capability::IssueDetection);
            let context = upload_context(&message.text);
            let reply = self
                .capabilities
                .issue
                .detect(Some(image), Some(&context))
                .await?;
            (reply, Capability::IssueDetection)
        } else {
            trace.enter(RouteStage::Routing, Capability::None);
            let decision = self.classify(&message.text).await?;

            trace.enter(RouteStage::Dispatched, decision.capability);
            let current = [ConversationTurn::user(message.text.clone())];
            let reply = self
                .capabilities
                .dispatch(&decision, &message.text, &current)
                .await?;
            (reply, decision.capability)
        };

        session.append(user_turn(&message, None));
        session.append(ConversationTurn::model(reply.clone()));
        Ok(trace.replied(reply, capability))
    }

    fn strategy(&self) -> RoutingStrategy {
        RoutingStrategy::Classifier
    }
}
