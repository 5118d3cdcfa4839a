//! Tenancy FAQ: answers rental-law questions with location-specific
//! guidance, using a location the user already gave when there is one.

use crate::error::AssistError;
use crate::prompts::{TENANCY_FAQ_INSTRUCTION, tenancy_question};
use crate::text_reply;
use realty_assist_ai::{LlmBackend, LlmMessage, LlmRequest};
use realty_assist_conversation::{ConversationTurn, Gazetteer, LocationSource};
use realty_assist_core::Result;
use std::sync::Arc;
use tracing::{debug, instrument};

pub(crate) const DEFAULT_TEMPERATURE: f32 = 0.5;

/// Tenancy FAQ capability.
#[derive(Clone)]
pub struct TenancyFaq {
    backend: Arc<dyn LlmBackend>,
    locator: Arc<dyn LocationSource>,
    temperature: f32,
}

impl TenancyFaq {
    /// Creates the capability with the built-in gazetteer.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self::with_locator(backend, Arc::new(Gazetteer::default()))
    }

    #[must_use]
    pub fn with_locator(backend: Arc<dyn LlmBackend>, locator: Arc<dyn LocationSource>) -> Self {
        Self {
            backend,
            locator,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Answers a tenancy question.
    ///
    /// History is consulted for a location only when none is supplied. Each
    /// call infers afresh; nothing is remembered between calls.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamUnavailable` if the model call fails.
    #[instrument(skip_all, fields(location_supplied = location.is_some()))]
    pub async fn answer(
        &self,
        question: &str,
        location: Option<&str>,
        history: &[ConversationTurn],
    ) -> Result<String, AssistError> {
        let location = match location.map(str::trim).filter(|l| !l.is_empty()) {
            Some(location) => Some(location.to_string()),
            None => {
                let inferred = self.locator.infer(history);
                debug!(inferred = ?inferred, "location inferred from history");
                inferred
            }
        };

        let request = LlmRequest::new(vec![LlmMessage::user(tenancy_question(
            question,
            location.as_deref(),
        ))])
        .with_system(TENANCY_FAQ_INSTRUCTION)
        .with_temperature(self.temperature);
        let response = self.backend.generate(&request).await.map_err(AssistError::from)?;
        text_reply(response)
    }
}
