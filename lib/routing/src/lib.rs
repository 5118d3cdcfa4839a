//! Capability routing for realty-assist.
//!
//! This crate provides:
//!
//! - **Capabilities**: issue detection and tenancy FAQ answering
//! - **Routers**: heuristic-first function calling and stateless classification
//! - **Chat service**: session resolution and persistence around a router

pub mod capabilities;
pub mod classifier;
pub mod config;
pub mod decision;
pub mod error;
pub mod heuristic;
pub mod issue;
pub mod prompts;
pub mod router;
pub mod service;
pub mod tenancy;

#[cfg(test)]
mod testing;

pub use capabilities::Capabilities;
pub use classifier::ClassifierRouter;
pub use config::{RoutingConfig, RoutingStrategy};
pub use decision::{Capability, RoutingDecision, classifier_tools, extract_decision, routing_tools};
pub use error::AssistError;
pub use heuristic::HeuristicFirstRouter;
pub use issue::IssueDetection;
pub use router::{IncomingMessage, RouteOutcome, RouteStage, Router};
pub use service::{ChatRequest, ChatResponse, ChatService};
pub use tenancy::TenancyFaq;

use realty_assist_ai::{LlmResponse, ModelOutput};

/// Takes the text of a capability reply. Capabilities declare no tools, so
/// a tool call here is malformed output.
pub(crate) fn text_reply(response: LlmResponse) -> realty_assist_core::Result<String, AssistError> {
    match response.output {
        ModelOutput::Text(text) => Ok(text),
        ModelOutput::ToolCall(call) => Err(AssistError::malformed(format!(
            "unexpected tool call '{}' from a capability",
            call.name
        ))
        .into()),
    }
}
