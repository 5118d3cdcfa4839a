//! Conversation session identifiers.
//!
//! Session ids are opaque to the core: clients may send any non-empty string
//! they were given earlier, and ids minted by the server are ULIDs with a
//! `sess_` prefix so they sort by creation time in logs.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

const GENERATED_PREFIX: &str = "sess";

/// Identifier of one conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Mints a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{GENERATED_PREFIX}_{}", Ulid::new()))
    }

    /// Wraps a caller-supplied identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Resolves an optional caller-supplied id, minting one when it is absent or blank.
    #[must_use]
    pub fn resolve(supplied: Option<&str>) -> Self {
        match supplied.map(str::trim) {
            Some(id) if !id.is_empty() => Self::new(id),
            _ => Self::generate(),
        }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this id was minted by [`SessionId::generate`].
    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.0
            .strip_prefix(GENERATED_PREFIX)
            .and_then(|rest| rest.strip_prefix('_'))
            .is_some_and(|ulid| ulid.parse::<Ulid>().is_ok())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
