//! Model-capability abstraction.
//!
//! A backend takes an ordered sequence of turns, a system instruction, an
//! optional set of declared callable tools and a temperature, and produces
//! either text or exactly one tool invocation.

use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The author of a message sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// End-user message.
    User,
    /// Previous model output.
    Model,
}

/// One piece of message content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text.
    Text { text: String },
    /// Binary image content.
    Image { mime_type: String, data: Vec<u8> },
}

/// A message in the model's working context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmMessage {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content parts, in order.
    pub parts: Vec<ContentPart>,
}

impl LlmMessage {
    /// Creates a user message with a single text part.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            parts: vec![ContentPart::Text { text: text.into() }],
        }
    }

    /// Creates a model message with a single text part.
    #[must_use]
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Model,
            parts: vec![ContentPart::Text { text: text.into() }],
        }
    }

    /// Appends a text part.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(ContentPart::Text { text: text.into() });
        self
    }

    /// Appends an image part.
    #[must_use]
    pub fn with_image(mut self, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        self.parts.push(ContentPart::Image {
            mime_type: mime_type.into(),
            data,
        });
        self
    }

    /// Returns the concatenated text parts.
    #[must_use]
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns true if any part carries an image.
    #[must_use]
    pub fn has_image(&self) -> bool {
        self.parts
            .iter()
            .any(|part| matches!(part, ContentPart::Image { .. }))
    }
}

/// A callable tool declared to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    /// Unique tool name.
    pub name: String,
    /// Description the model uses to decide when to call the tool.
    pub description: String,
    /// JSON schema for the tool's parameters.
    pub parameters: JsonValue,
}

impl ToolDeclaration {
    /// Creates a tool declaration with an empty object schema.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({ "type": "object", "properties": {} }),
        }
    }

    /// Sets the parameter schema.
    #[must_use]
    pub fn with_parameters(mut self, schema: JsonValue) -> Self {
        self.parameters = schema;
        self
    }
}

/// A request to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// The ordered conversation sent as working context.
    pub contents: Vec<LlmMessage>,
    /// System instruction, if any.
    pub system: Option<String>,
    /// Tools the model may call instead of answering.
    pub tools: Vec<ToolDeclaration>,
    /// Temperature for sampling (0.0 - 1.0).
    pub temperature: Option<f32>,
}

impl LlmRequest {
    /// Creates a request over the given conversation.
    #[must_use]
    pub fn new(contents: Vec<LlmMessage>) -> Self {
        Self {
            contents,
            system: None,
            tools: Vec::new(),
            temperature: None,
        }
    }

    /// Creates a request with a single user message.
    #[must_use]
    pub fn prompt(text: impl Into<String>) -> Self {
        Self::new(vec![LlmMessage::user(text)])
    }

    /// Adds a system instruction.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Declares callable tools.
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.tools = tools;
        self
    }

    /// Sets the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// The requested tool name.
    pub name: String,
    /// Named arguments, normally a JSON object.
    pub arguments: JsonValue,
}

impl ToolCall {
    /// Creates a new tool call.
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: JsonValue) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// What the model produced: exactly one of text or a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelOutput {
    /// A direct text reply.
    Text(String),
    /// A single tool invocation.
    ToolCall(ToolCall),
}

/// A response from the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated output.
    pub output: ModelOutput,
    /// Token usage statistics.
    pub usage: TokenUsage,
    /// Model that generated the response.
    pub model: String,
}

impl LlmResponse {
    /// Creates a text response.
    #[must_use]
    pub fn text(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            output: ModelOutput::Text(text.into()),
            usage: TokenUsage::default(),
            model: model.into(),
        }
    }

    /// Creates a tool-call response.
    #[must_use]
    pub fn tool_call(model: impl Into<String>, call: ToolCall) -> Self {
        Self {
            output: ModelOutput::ToolCall(call),
            usage: TokenUsage::default(),
            model: model.into(),
        }
    }

    /// Returns the text reply, if the model answered directly.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match &self.output {
            ModelOutput::Text(text) => Some(text),
            ModelOutput::ToolCall(_) => None,
        }
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of input tokens.
    pub input_tokens: u32,
    /// Number of output tokens.
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Returns the total number of tokens.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Trait for model backends.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generates a response for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails at the transport level or the
    /// response cannot be interpreted.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Returns the model name.
    fn model(&self) -> &str;
}
