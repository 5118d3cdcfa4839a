//! Conversation state for realty-assist.
//!
//! This crate provides:
//!
//! - **Turns**: immutable user/model messages with optional image attachments
//! - **Sessions**: ordered turn histories and the keyed store that owns them
//! - **Context extraction**: image references and locations found in free text

pub mod context;
pub mod error;
pub mod message;
pub mod session;

pub use context::{
    DEFAULT_IMAGE_PROMPT, Gazetteer, LocationSource, find_image_reference,
    image_context_or_default, infer_location, strip_image_reference,
};
pub use error::SessionError;
pub use message::{ConversationTurn, HistoryEntry, ImageReference, RawHistoryEntry, Role};
pub use session::{ConversationSession, InMemorySessionStore, SessionStore, Transcript};
