//! Capabilities and routing decisions.
//!
//! The model names tools by string; everything past this module works with
//! the closed [`Capability`] set so dispatch is an exhaustive match.

use crate::error::AssistError;
use realty_assist_ai::{ToolCall, ToolDeclaration};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

pub(crate) const ISSUE_DETECTION_TOOL: &str = "issueDetectionTool";
pub(crate) const TENANCY_FAQ_TOOL: &str = "tenancyFAQAgentTool";
pub(crate) const GREETING_TOOL: &str = "initialGreetingTool";

/// A named response strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    IssueDetection,
    TenancyFaq,
    Greeting,
    /// No capability applies; the router replies directly or with a fallback.
    #[default]
    None,
}

impl Capability {
    /// The tool name the model uses for this capability.
    #[must_use]
    pub fn tool_name(&self) -> Option<&'static str> {
        match self {
            Self::IssueDetection => Some(ISSUE_DETECTION_TOOL),
            Self::TenancyFaq => Some(TENANCY_FAQ_TOOL),
            Self::Greeting => Some(GREETING_TOOL),
            Self::None => None,
        }
    }

    /// Maps a tool name to a capability. Unknown names map to `None`.
    #[must_use]
    pub fn from_tool_name(name: &str) -> Self {
        match name {
            ISSUE_DETECTION_TOOL => Self::IssueDetection,
            TENANCY_FAQ_TOOL => Self::TenancyFaq,
            GREETING_TOOL => Self::Greeting,
            _ => Self::None,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::IssueDetection => "issue_detection",
            Self::TenancyFaq => "tenancy_faq",
            Self::Greeting => "greeting",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

/// Which capability handles a message, and with what parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoutingDecision {
    pub capability: Capability,
    pub parameters: HashMap<String, String>,
}

impl RoutingDecision {
    #[must_use]
    pub fn new(capability: Capability) -> Self {
        Self {
            capability,
            parameters: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Returns a non-blank parameter value.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Builds a decision from a native tool call.
    #[must_use]
    pub fn from_tool_call(call: &ToolCall) -> Self {
        let parameters = match &call.arguments {
            JsonValue::Object(map) => flatten_parameters(map),
            _ => HashMap::new(),
        };
        Self::named(&call.name, parameters)
    }

    /// Demotes capabilities that were not offered to the model to `None`.
    #[must_use]
    pub fn restrict_to(mut self, offered: &[Capability]) -> Self {
        if !offered.contains(&self.capability) {
            self.capability = Capability::None;
        }
        self
    }

    fn named(tool_name: &str, parameters: HashMap<String, String>) -> Self {
        let capability = Capability::from_tool_name(tool_name);
        if capability == Capability::None {
            warn!(tool_name, "model requested an unrecognized tool");
        }
        Self {
            capability,
            parameters,
        }
    }
}

fn flatten_parameters(map: &Map<String, JsonValue>) -> HashMap<String, String> {
    map.iter()
        .filter_map(|(key, value)| {
            let value = match value {
                JsonValue::Null => return None,
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), value))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct RawDecision {
    tool_name: String,
    #[serde(default)]
    parameters: Option<Map<String, JsonValue>>,
}

/// Extracts a routing decision from free-form classifier output.
///
/// The decision is a JSON array whose first element is
/// `{"tool_name": ..., "parameters": {...}}`. It may be wrapped in any other
/// text; the span from the first `[` to the last `]` is parsed.
///
/// # Errors
///
/// Returns `MalformedUpstreamOutput` if no array is present, it does not
/// parse, or it is empty.
pub fn extract_decision(text: &str) -> Result<RoutingDecision, AssistError> {
    let start = text
        .find('[')
        .ok_or_else(|| AssistError::malformed("no JSON array in classifier output"))?;
    let end = text
        .rfind(']')
        .filter(|end| *end > start)
        .ok_or_else(|| AssistError::malformed("unterminated JSON array in classifier output"))?;

    let decisions: Vec<RawDecision> = serde_json::from_str(&text[start..=end])
        .map_err(|e| AssistError::malformed(format!("invalid decision JSON: {e}")))?;
    let first = decisions
        .into_iter()
        .next()
        .ok_or_else(|| AssistError::malformed("classifier returned an empty decision list"))?;

    let parameters = first
        .parameters
        .as_ref()
        .map(flatten_parameters)
        .unwrap_or_default();
    Ok(RoutingDecision::named(&first.tool_name, parameters))
}

fn string_schema(description: &str) -> JsonValue {
    json!({ "type": "string", "description": description })
}

/// Tools offered by the heuristic-first router.
#[must_use]
pub fn routing_tools() -> Vec<ToolDeclaration> {
    vec![
        ToolDeclaration::new(
            ISSUE_DETECTION_TOOL,
            "Detects visible property issues from uploaded images and optional text, and provides troubleshooting suggestions.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "image_url": string_schema("URL of the user-uploaded property image"),
                "context": string_schema("Optional textual description or additional context from the user"),
            },
        })),
        ToolDeclaration::new(
            TENANCY_FAQ_TOOL,
            "Answers frequently asked questions about tenancy laws, rental agreements, and tenant/landlord responsibilities.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "prompt": string_schema("The user's tenancy-related question"),
                "location": string_schema("The user's city or country to provide relevant legal guidance"),
            },
        })),
    ]
}

/// Tools offered by the classifier router.
#[must_use]
pub fn classifier_tools() -> Vec<ToolDeclaration> {
    vec![
        ToolDeclaration::new(
            ISSUE_DETECTION_TOOL,
            "Detects visible property issues from text or images and provides troubleshooting suggestions.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "image_url": { "type": "string" },
                "context": { "type": "string" },
            },
        })),
        ToolDeclaration::new(
            TENANCY_FAQ_TOOL,
            "Handles tenancy FAQ with location-specific guidance.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "question": { "type": "string" },
                "location": { "type": "string" },
            },
            "required": ["question"],
        })),
        ToolDeclaration::new(GREETING_TOOL, "Greets the user or asks for missing details.")
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "message": { "type": "string" },
                },
                "required": ["message"],
            })),
    ]
}
