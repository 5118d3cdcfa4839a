//! Core types shared across the realty-assist crates.
//!
//! This crate provides the session identifier and the rootcause-based
//! `Result` alias used by the service layers.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::SessionId;
