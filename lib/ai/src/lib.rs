//! Model and image boundaries for realty-assist.
//!
//! - [`LlmBackend`]: one model call, answering with text or a single tool call
//! - [`GeminiBackend`]: the hosted Gemini implementation
//! - [`ImageFetcher`]: loads image bytes for multimodal requests

pub mod backend;
pub mod error;
pub mod gemini;
pub mod image;

pub use backend::{
    ContentPart, LlmBackend, LlmMessage, LlmRequest, LlmResponse, MessageRole, ModelOutput,
    TokenUsage, ToolCall, ToolDeclaration,
};
pub use error::{ImageError, LlmError};
pub use gemini::{GeminiBackend, GeminiConfig};
pub use image::{FetchedImage, HttpImageFetcher, ImageFetcher};
