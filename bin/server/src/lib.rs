//! HTTP transport for the realty-assist property assistant.
//!
//! Wraps a [`realty_assist_routing::ChatService`] in an axum router with JSON
//! and multipart chat endpoints, session history and deletion, and health
//! checks.

pub mod api;
pub mod config;
pub mod error;

pub use crate::api::{AppState, router};
pub use crate::config::ServerConfig;
pub use crate::error::ApiError;
