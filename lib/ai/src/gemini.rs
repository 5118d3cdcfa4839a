//! Gemini `generateContent` backend.
//!
//! Speaks the REST wire format directly: conversation turns map to
//! `contents` with `user`/`model` roles, declared tools to
//! `functionDeclarations`, and images to base64 `inlineData` parts.

use crate::backend::{
    ContentPart, LlmBackend, LlmRequest, LlmResponse, MessageRole, ModelOutput, TokenUsage,
    ToolCall,
};
use crate::error::LlmError;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const PROVIDER: &str = "gemini";

/// Configuration for the Gemini backend.
#[derive(Clone, Deserialize)]
pub struct GeminiConfig {
    /// API key sent in the `x-goog-api-key` header.
    pub api_key: String,

    /// Base URL of the API, without a trailing `/models`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request timeout. No timeout is applied when unset.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

impl GeminiConfig {
    /// Creates a configuration with default endpoint and model.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            model: default_model(),
            request_timeout_secs: None,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Model backend for the hosted Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiBackend {
    /// Creates a backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the API key is empty or the HTTP client
    /// cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::InvalidConfig {
                reason: "Gemini API key is empty".to_string(),
            });
        }

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| LlmError::InvalidConfig {
            reason: e.to_string(),
        })?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    #[instrument(
        skip(self, request),
        fields(
            model = %self.config.model,
            turns = request.contents.len(),
            tools = request.tools.len()
        )
    )]
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let body = GeminiRequest::from_request(request);

        let response = self
            .client
            .post(self.config.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Gemini request failed");
                if e.is_timeout() {
                    LlmError::Timeout
                } else if e.is_connect() {
                    LlmError::ProviderUnavailable {
                        provider: PROVIDER.to_string(),
                        reason: e.to_string(),
                    }
                } else {
                    LlmError::RequestFailed {
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::RequestFailed {
                    reason: e.to_string(),
                }
            }
        })?;

        if !status.is_success() {
            let err = error_for_status(status, &text, retry_after);
            warn!(status = status.as_u16(), error = %err, "Gemini returned an error status");
            return Err(err);
        }

        let parsed: GeminiResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::ResponseParseFailed {
                reason: e.to_string(),
            })?;
        let response = parsed.into_llm_response(&self.config.model)?;

        debug!(
            tool_call = matches!(response.output, ModelOutput::ToolCall(_)),
            tokens = response.usage.total(),
            "Gemini response received"
        );
        Ok(response)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Maps a non-success status and its body to an error.
fn error_for_status(status: StatusCode, body: &str, retry_after: Option<u64>) -> LlmError {
    let message = serde_json::from_str::<GeminiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("HTTP {status}"));

    if status == StatusCode::TOO_MANY_REQUESTS {
        LlmError::RateLimited {
            retry_after_secs: retry_after,
        }
    } else if status.is_server_error() {
        LlmError::ProviderUnavailable {
            provider: PROVIDER.to_string(),
            reason: message,
        }
    } else {
        LlmError::RequestFailed {
            reason: format!("{status}: {message}"),
        }
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

impl<'a> GeminiRequest<'a> {
    fn from_request(request: &'a LlmRequest) -> Self {
        let contents = request
            .contents
            .iter()
            .map(|message| GeminiContent {
                role: Some(
                    match message.role {
                        MessageRole::User => "user",
                        MessageRole::Model => "model",
                    }
                    .to_string(),
                ),
                parts: message.parts.iter().map(GeminiPart::from_part).collect(),
            })
            .collect();

        let system_instruction = request.system.as_ref().map(|system| GeminiContent {
            role: None,
            parts: vec![GeminiPart::text(system.clone())],
        });

        let tools = if request.tools.is_empty() {
            Vec::new()
        } else {
            vec![GeminiTool {
                function_declarations: request
                    .tools
                    .iter()
                    .map(|tool| GeminiFunctionDeclaration {
                        name: &tool.name,
                        description: &tool.description,
                        parameters: &tool.parameters,
                    })
                    .collect(),
            }]
        };

        Self {
            contents,
            system_instruction,
            tools,
            generation_config: request
                .temperature
                .map(|temperature| GeminiGenerationConfig {
                    temperature: Some(temperature),
                }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

/// A part is text, inline data, or a function call.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiInlineData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<GeminiFunctionCall>,
}

impl GeminiPart {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            ..Self::default()
        }
    }

    fn from_part(part: &ContentPart) -> Self {
        match part {
            ContentPart::Text { text } => Self::text(text.clone()),
            ContentPart::Image { mime_type, data } => Self {
                inline_data: Some(GeminiInlineData {
                    mime_type: mime_type.clone(),
                    data: STANDARD.encode(data),
                }),
                ..Self::default()
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: JsonValue,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool<'a> {
    function_declarations: Vec<GeminiFunctionDeclaration<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionDeclaration<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a JsonValue,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

impl GeminiResponse {
    fn into_llm_response(self, model: &str) -> Result<LlmResponse, LlmError> {
        let usage = self
            .usage_metadata
            .map(|u| TokenUsage {
                input_tokens: u.prompt_token_count.unwrap_or(0),
                output_tokens: u.candidates_token_count.unwrap_or(0),
            })
            .unwrap_or_default();

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::ResponseParseFailed {
                reason: "response contained no candidates".to_string(),
            })?;
        let finish_reason = candidate.finish_reason.unwrap_or_default();
        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();

        let mut text = String::new();
        for part in parts {
            if let Some(call) = part.function_call {
                return Ok(LlmResponse {
                    output: ModelOutput::ToolCall(ToolCall::new(call.name, call.args)),
                    usage,
                    model: model.to_string(),
                });
            }
            if let Some(fragment) = part.text {
                text.push_str(&fragment);
            }
        }

        if text.trim().is_empty() {
            return Err(LlmError::ResponseParseFailed {
                reason: format!(
                    "response contained no text or tool call (finish reason: {finish_reason})"
                ),
            });
        }

        Ok(LlmResponse {
            output: ModelOutput::Text(text),
            usage,
            model: model.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}
