//! Issue detection: diagnoses visible property problems from an optional
//! image and optional description.

use crate::error::AssistError;
use crate::prompts::{ISSUE_DETECTION_INSTRUCTION, image_failure_note, issue_description};
use crate::text_reply;
use realty_assist_ai::image::decode_data_url;
use realty_assist_ai::{FetchedImage, ImageError, ImageFetcher, LlmBackend, LlmMessage, LlmRequest};
use realty_assist_conversation::ImageReference;
use realty_assist_core::Result;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub(crate) const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Issue-detection capability.
#[derive(Clone)]
pub struct IssueDetection {
    backend: Arc<dyn LlmBackend>,
    fetcher: Arc<dyn ImageFetcher>,
    temperature: f32,
}

impl IssueDetection {
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            backend,
            fetcher,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Produces a diagnosis with identified issues, suggested actions and an
    /// optional follow-up question.
    ///
    /// A failed image download or decode is reported to the model as a note
    /// and the analysis continues on text alone.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamUnavailable` if the model call fails.
    #[instrument(skip_all, fields(has_image = image.is_some()))]
    pub async fn detect(
        &self,
        image: Option<ImageReference>,
        context: Option<&str>,
    ) -> Result<String, AssistError> {
        let mut message = LlmMessage::user(issue_description(context));

        if let Some(image) = image {
            match self.load(image).await {
                Ok(FetchedImage { bytes, mime_type }) => {
                    debug!(bytes = bytes.len(), mime_type = %mime_type, "image attached");
                    message = message.with_image(mime_type, bytes);
                }
                Err(e) => {
                    warn!(error = %e, "image unavailable, continuing with text only");
                    message = message.with_text(image_failure_note(&e.to_string()));
                }
            }
        }

        let request = LlmRequest::new(vec![message])
            .with_system(ISSUE_DETECTION_INSTRUCTION)
            .with_temperature(self.temperature);
        let response = self.backend.generate(&request).await.map_err(AssistError::from)?;
        text_reply(response)
    }

    async fn load(&self, image: ImageReference) -> std::result::Result<FetchedImage, ImageError> {
        match image {
            ImageReference::RemoteUrl(url) => self.fetcher.fetch(&url).await,
            ImageReference::DataUrl(data_url) => decode_data_url(&data_url),
            ImageReference::InlineData { bytes, mime_type } => {
                Ok(FetchedImage { bytes, mime_type })
            }
        }
    }
}

/// Interprets an `image_url` tool parameter.
pub(crate) fn image_from_parameter(value: &str) -> Option<ImageReference> {
    let value = value.trim();
    if value.starts_with("data:") {
        Some(ImageReference::DataUrl(value.to_string()))
    } else if value.starts_with("http://") || value.starts_with("https://") {
        Some(ImageReference::RemoteUrl(value.to_string()))
    } else {
        None
    }
}
