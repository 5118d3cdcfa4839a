//! Heuristic-first routing.
//!
//! An image in the message is an unambiguous signal and goes straight to
//! issue detection. Anything else is handed to the model with the full
//! history and the two capability tools, and the model either answers or
//! names one tool.

use crate::capabilities::Capabilities;
use crate::config::RoutingStrategy;
use crate::decision::{Capability, RoutingDecision, routing_tools};
use crate::error::AssistError;
use crate::prompts::{ROUTER_INSTRUCTION, upload_context};
use crate::router::{
    IncomingMessage, RouteOutcome, RouteStage, RouteTrace, Router, model_context, user_turn,
};
use async_trait::async_trait;
use realty_assist_ai::{LlmBackend, LlmRequest, ModelOutput};
use realty_assist_conversation::{
    ConversationSession, ConversationTurn, find_image_reference, image_context_or_default,
};
use realty_assist_core::Result;
use std::sync::Arc;
use tracing::instrument;

const OFFERED: [Capability; 2] = [Capability::IssueDetection, Capability::TenancyFaq];

/// Routes by image heuristic first, then by model function calling.
#[derive(Clone)]
pub struct HeuristicFirstRouter {
    backend: Arc<dyn LlmBackend>,
    capabilities: Capabilities,
    temperature: f32,
}

impl HeuristicFirstRouter {
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, capabilities: Capabilities) -> Self {
        Self {
            backend,
            capabilities,
            temperature: 0.55,
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl Router for HeuristicFirstRouter {
    #[instrument(skip_all, fields(session_id = %session.id(), turns = session.len()))]
    async fn handle(
        &self,
        message: IncomingMessage,
        session: &mut ConversationSession,
    ) -> Result<RouteOutcome, AssistError> {
        let mut trace = RouteTrace::start();

        let found = if message.attachment.is_none() {
            find_image_reference(&message.text)
        } else {
            None
        };
        let image = message.attachment.clone().or_else(|| found.clone());

        if let Some(image) = image {
            let context = if message.attachment.is_some() {
                upload_context(&message.text)
            } else {
                image_context_or_default(&message.text)
            };
            trace.enter(RouteStage::Dispatched, Capability::IssueDetection);
            let reply = self
                .capabilities
                .issue
                .detect(Some(image), Some(&context))
                .await?;

            session.append(user_turn(&message, found));
            session.append(ConversationTurn::model(reply.clone()));
            return Ok(trace.replied(reply, Capability::IssueDetection));
        }

        session.append(user_turn(&message, None));
        trace.enter(RouteStage::Routing, Capability::None);

        let request = LlmRequest::new(model_context(session.turns()))
            .with_system(ROUTER_INSTRUCTION)
            .with_tools(routing_tools())
            .with_temperature(self.temperature);
        let response = self.backend.generate(&request).await.map_err(AssistError::from)?;

        let (reply, capability) = match response.output {
            ModelOutput::Text(text) => (text, Capability::None),
            ModelOutput::ToolCall(call) => {
                let decision = RoutingDecision::from_tool_call(&call).restrict_to(&OFFERED);
                trace.enter(RouteStage::Dispatched, decision.capability);
                let reply = self
                    .capabilities
                    .dispatch(&decision, &message.text, session.turns())
                    .await?;
                (reply, decision.capability)
            }
        };

        session.append(ConversationTurn::model(reply.clone()));
        Ok(trace.replied(reply, capability))
    }

    fn strategy(&self) -> RoutingStrategy {
        RoutingStrategy::HeuristicFirst
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutingConfig;
    use crate::prompts::{FALLBACK_REPLY, ISSUE_DETECTION_INSTRUCTION, TENANCY_FAQ_INSTRUCTION};
    use crate::testing::{FakeFetcher, ScriptedBackend, text, tool};
    use realty_assist_ai::{LlmError, MessageRole};
    use realty_assist_conversation::{DEFAULT_IMAGE_PROMPT, ImageReference, Role};
    use realty_assist_core::SessionId;
    use serde_json::json;

    const DIAGNOSIS: &str = "Identified Issue(s):\n- Crack in plaster\n\nSuggested Actions:\n- Fill with filler";

    fn router(backend: &Arc<ScriptedBackend>, fetcher: &Arc<FakeFetcher>) -> HeuristicFirstRouter {
        let capabilities =
            Capabilities::from_config(backend.clone(), fetcher.clone(), &RoutingConfig::default());
        HeuristicFirstRouter::new(backend.clone(), capabilities)
    }

    fn session() -> ConversationSession {
        ConversationSession::new(SessionId::new("test"))
    }

    #[tokio::test]
    async fn image_url_bypasses_model_routing() {
        let backend = Arc::new(ScriptedBackend::replying([DIAGNOSIS]));
        let fetcher = Arc::new(FakeFetcher::png());
        let mut session = session();

        let outcome = router(&backend, &fetcher)
            .handle(IncomingMessage::text("https://example.com/house.jpg"), &mut session)
            .await
            .expect("handle");

        assert_eq!(outcome.capability, Capability::IssueDetection);
        assert_eq!(
            outcome.path,
            vec![RouteStage::Received, RouteStage::Dispatched, RouteStage::Replied]
        );
        assert_eq!(fetcher.calls(), vec!["https://example.com/house.jpg".to_string()]);

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system.as_deref(), Some(ISSUE_DETECTION_INSTRUCTION));
        assert!(requests[0].tools.is_empty());
        assert_eq!(
            requests[0].contents[0].parts[0],
            realty_assist_ai::ContentPart::Text {
                text: format!("Property issue description: {DEFAULT_IMAGE_PROMPT}")
            }
        );

        assert_eq!(session.len(), 2);
        assert_eq!(session.turns()[0].content(), "https://example.com/house.jpg");
        assert_eq!(
            session.turns()[0].attachment(),
            Some(&ImageReference::RemoteUrl("https://example.com/house.jpg".to_string()))
        );
        assert_eq!(session.turns()[1].content(), DIAGNOSIS);
    }

    #[tokio::test]
    async fn residual_text_becomes_context() {
        let backend = Arc::new(ScriptedBackend::replying([DIAGNOSIS]));
        let fetcher = Arc::new(FakeFetcher::png());

        router(&backend, &fetcher)
            .handle(
                IncomingMessage::text("Is this mold? https://example.com/ceiling.png"),
                &mut session(),
            )
            .await
            .expect("handle");

        assert_eq!(
            backend.last_request().contents[0].text(),
            "Property issue description: Is this mold?"
        );
    }

    #[tokio::test]
    async fn crack_in_wall_is_routed_by_tool_call() {
        let backend = Arc::new(ScriptedBackend::new([
            tool("issueDetectionTool", json!({ "context": "I have a crack in my wall" })),
            text(DIAGNOSIS),
        ]));
        let fetcher = Arc::new(FakeFetcher::png());
        let mut session = session();

        let outcome = router(&backend, &fetcher)
            .handle(IncomingMessage::text("I have a crack in my wall"), &mut session)
            .await
            .expect("handle");

        assert_eq!(outcome.capability, Capability::IssueDetection);
        assert!(outcome.reply.contains("Identified Issue(s)"));
        assert_eq!(
            outcome.path,
            vec![
                RouteStage::Received,
                RouteStage::Routing,
                RouteStage::Dispatched,
                RouteStage::Replied
            ]
        );

        let requests = backend.requests();
        assert_eq!(requests[0].tools.len(), 2);
        assert_eq!(requests[0].temperature, Some(0.55));
        assert_eq!(requests[0].contents.len(), 1);
        assert_eq!(
            requests[1].contents[0].text(),
            "Property issue description: I have a crack in my wall"
        );
        assert!(fetcher.calls().is_empty());

        let roles: Vec<_> = session.turns().iter().map(ConversationTurn::role).collect();
        assert_eq!(roles, vec![Role::User, Role::Model]);
    }

    #[tokio::test]
    async fn tenancy_question_uses_location_from_message() {
        let backend = Arc::new(ScriptedBackend::new([
            tool(
                "tenancyFAQAgentTool",
                json!({ "prompt": "What's the notice period to vacate?" }),
            ),
            text("In Mumbai it is typically one month."),
        ]));
        let fetcher = Arc::new(FakeFetcher::png());

        let outcome = router(&backend, &fetcher)
            .handle(
                IncomingMessage::text("What's the notice period to vacate in Mumbai?"),
                &mut session(),
            )
            .await
            .expect("handle");

        assert_eq!(outcome.capability, Capability::TenancyFaq);
        let request = backend.last_request();
        assert_eq!(request.system.as_deref(), Some(TENANCY_FAQ_INSTRUCTION));
        assert!(request.contents[0].text().contains("they are from: Mumbai"));
    }

    #[tokio::test]
    async fn direct_answer_skips_dispatch() {
        let backend = Arc::new(ScriptedBackend::replying([
            "Hi! I'm Eric. How can I help with your property?",
        ]));
        let fetcher = Arc::new(FakeFetcher::png());
        let mut session = session();

        let outcome = router(&backend, &fetcher)
            .handle(IncomingMessage::text("Hello"), &mut session)
            .await
            .expect("handle");

        assert_eq!(outcome.capability, Capability::None);
        assert_eq!(
            outcome.path,
            vec![RouteStage::Received, RouteStage::Routing, RouteStage::Replied]
        );
        assert_eq!(session.len(), 2);
    }

    #[tokio::test]
    async fn history_is_threaded_into_routing_call() {
        let backend = Arc::new(ScriptedBackend::replying(["first", "second"]));
        let fetcher = Arc::new(FakeFetcher::png());
        let router = router(&backend, &fetcher);
        let mut session = session();

        router
            .handle(IncomingMessage::text("one"), &mut session)
            .await
            .expect("first");
        router
            .handle(IncomingMessage::text("two"), &mut session)
            .await
            .expect("second");

        let contents = backend.last_request().contents;
        let roles: Vec<_> = contents.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::User, MessageRole::Model, MessageRole::User]
        );
        assert_eq!(contents[2].text(), "two");
        assert_eq!(session.len(), 4);
    }

    #[tokio::test]
    async fn unrecognized_tool_gets_fallback() {
        for name in ["bookViewingTool", "initialGreetingTool"] {
            let backend = Arc::new(ScriptedBackend::new([tool(name, json!({ "message": "hey" }))]));
            let fetcher = Arc::new(FakeFetcher::png());
            let mut session = session();

            let outcome = router(&backend, &fetcher)
                .handle(IncomingMessage::text("Book me a viewing"), &mut session)
                .await
                .expect("fallback is not an error");

            assert_eq!(outcome.reply, FALLBACK_REPLY);
            assert_eq!(outcome.capability, Capability::None);
            assert_eq!(session.last_turn().map(ConversationTurn::content), Some(FALLBACK_REPLY));
        }
    }

    #[tokio::test]
    async fn upstream_failure_surfaces() {
        let backend = Arc::new(ScriptedBackend::new([Err(LlmError::Timeout)]));
        let fetcher = Arc::new(FakeFetcher::png());

        let report = router(&backend, &fetcher)
            .handle(IncomingMessage::text("Hello"), &mut session())
            .await
            .expect_err("should fail");

        assert!(matches!(
            report.current_context(),
            AssistError::UpstreamUnavailable { .. }
        ));
    }

    #[tokio::test]
    async fn uploaded_image_goes_to_issue_detection() {
        let backend = Arc::new(ScriptedBackend::replying([DIAGNOSIS]));
        let fetcher = Arc::new(FakeFetcher::png());
        let mut session = session();
        let message = IncomingMessage::text("Bathroom wall").with_attachment(
            ImageReference::InlineData {
                bytes: vec![0xFF, 0xD8, 0xFF],
                mime_type: "image/jpeg".to_string(),
            },
        );

        let outcome = router(&backend, &fetcher)
            .handle(message, &mut session)
            .await
            .expect("handle");

        assert_eq!(outcome.capability, Capability::IssueDetection);
        let request = backend.last_request();
        assert!(request.contents[0].has_image());
        assert!(request.contents[0].text().contains("This is a property issue. Bathroom wall"));
        assert_eq!(session.turns()[0].content(), "Bathroom wall [Image attached]");
        assert!(session.turns()[0].attachment().is_none());
    }

    #[tokio::test]
    async fn inline_data_url_bypasses_model_routing() {
        let backend = Arc::new(ScriptedBackend::replying([DIAGNOSIS]));
        let fetcher = Arc::new(FakeFetcher::png());
        let fragment = "data:image/png;base64,iVBORw0KGgo=";
        let mut session = session();

        let outcome = router(&backend, &fetcher)
            .handle(IncomingMessage::text(format!("Is this damp? {fragment}")), &mut session)
            .await
            .expect("handle");

        assert_eq!(outcome.capability, Capability::IssueDetection);
        assert!(fetcher.calls().is_empty());

        let request = backend.last_request();
        assert_eq!(backend.requests().len(), 1);
        assert!(request.contents[0].has_image());
        assert_eq!(
            request.contents[0].text(),
            "Property issue description: Is this damp?"
        );
        assert_eq!(
            session.turns()[0].attachment(),
            Some(&ImageReference::DataUrl(fragment.to_string()))
        );
    }

    #[tokio::test]
    async fn undecodable_data_url_falls_back_to_text() {
        let backend = Arc::new(ScriptedBackend::replying([DIAGNOSIS]));
        let fetcher = Arc::new(FakeFetcher::png());
        let mut session = session();

        let outcome = router(&backend, &fetcher)
            .handle(
                IncomingMessage::text("What is this? data:image/png;base64,abc"),
                &mut session,
            )
            .await
            .expect("decode failure is absorbed");

        assert_eq!(outcome.reply, DIAGNOSIS);
        let request = backend.last_request();
        assert!(!request.contents[0].has_image());
        assert_eq!(request.contents[0].parts.len(), 2);
        assert!(
            request.contents[0]
                .text()
                .contains("Proceeding with text-only analysis.")
        );
        assert_eq!(session.len(), 2);
    }
}
