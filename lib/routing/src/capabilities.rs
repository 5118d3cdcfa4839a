//! Dispatch from a routing decision to a capability.

use crate::config::RoutingConfig;
use crate::decision::{Capability, RoutingDecision};
use crate::error::AssistError;
use crate::issue::{IssueDetection, image_from_parameter};
use crate::prompts::FALLBACK_REPLY;
use crate::tenancy::TenancyFaq;
use realty_assist_ai::{ImageFetcher, LlmBackend};
use realty_assist_conversation::ConversationTurn;
use realty_assist_core::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// The capabilities a router can dispatch to.
#[derive(Clone)]
pub struct Capabilities {
    pub issue: IssueDetection,
    pub tenancy: TenancyFaq,
}

impl Capabilities {
    #[must_use]
    pub fn new(issue: IssueDetection, tenancy: TenancyFaq) -> Self {
        Self { issue, tenancy }
    }

    /// Builds both capabilities over one backend, with configured temperatures.
    #[must_use]
    pub fn from_config(
        backend: Arc<dyn LlmBackend>,
        fetcher: Arc<dyn ImageFetcher>,
        config: &RoutingConfig,
    ) -> Self {
        Self {
            issue: IssueDetection::new(backend.clone(), fetcher)
                .with_temperature(config.issue_temperature),
            tenancy: TenancyFaq::new(backend).with_temperature(config.tenancy_temperature),
        }
    }

    /// Runs the capability named by `decision`.
    ///
    /// `message_text` stands in for an issue context or tenancy question the
    /// model left out.
    /// `history` is the read-only view offered for location inference.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamUnavailable` if a capability's model call fails, or
    /// `MalformedUpstreamOutput` for a greeting without a message.
    pub async fn dispatch(
        &self,
        decision: &RoutingDecision,
        message_text: &str,
        history: &[ConversationTurn],
    ) -> Result<String, AssistError> {
        debug!(capability = %decision.capability, "dispatching");
        match decision.capability {
            Capability::IssueDetection => {
                let image = decision.parameter("image_url").and_then(image_from_parameter);
                let context = decision.parameter("context").unwrap_or(message_text);
                self.issue.detect(image, Some(context)).await
            }
            Capability::TenancyFaq => {
                let question = decision
                    .parameter("prompt")
                    .or_else(|| decision.parameter("question"))
                    .unwrap_or(message_text);
                self.tenancy
                    .answer(question, decision.parameter("location"), history)
                    .await
            }
            Capability::Greeting => match decision.parameter("message") {
                Some(message) => Ok(message.to_string()),
                None => Err(AssistError::malformed("greeting decision without a message").into()),
            },
            Capability::None => {
                warn!("no capability matched, replying with fallback");
                Ok(FALLBACK_REPLY.to_string())
            }
        }
    }
}
