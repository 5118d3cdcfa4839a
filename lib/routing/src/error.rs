//! Caller-facing errors for routing and chat handling.
//!
//! Recoverable conditions (unrecognized tools, image fetch or decode
//! failures) are absorbed inside the router and capabilities and never
//! appear here.

use realty_assist_ai::LlmError;
use realty_assist_conversation::SessionError;
use realty_assist_core::SessionId;
use std::fmt;

/// Errors surfaced to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistError {
    /// The model call failed or could not be reached.
    UpstreamUnavailable { reason: String },
    /// The model answered, but not in the shape the router needs.
    MalformedUpstreamOutput { reason: String },
    /// No session is stored under the id.
    SessionNotFound { id: SessionId },
    /// The session store rejected a read or write.
    StorageFailed { reason: String },
}

impl AssistError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedUpstreamOutput {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for AssistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpstreamUnavailable { reason } => {
                write!(f, "model service unavailable: {reason}")
            }
            Self::MalformedUpstreamOutput { reason } => {
                write!(f, "malformed model output: {reason}")
            }
            Self::SessionNotFound { id } => write!(f, "session not found: {id}"),
            Self::StorageFailed { reason } => {
                write!(f, "session storage failed: {reason}")
            }
        }
    }
}

impl std::error::Error for AssistError {}

impl From<LlmError> for AssistError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::ResponseParseFailed { .. } => Self::MalformedUpstreamOutput {
                reason: err.to_string(),
            },
            _ => Self::UpstreamUnavailable {
                reason: err.to_string(),
            },
        }
    }
}

impl From<SessionError> for AssistError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound { id } => Self::SessionNotFound { id },
            SessionError::StorageFailed { reason } => Self::StorageFailed { reason },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_failures_are_upstream_unavailable() {
        let err = AssistError::from(LlmError::Timeout);
        assert_eq!(
            err,
            AssistError::UpstreamUnavailable {
                reason: "model request timed out".to_string()
            }
        );
    }

    #[test]
    fn unreadable_model_response_is_malformed() {
        let err = AssistError::from(LlmError::ResponseParseFailed {
            reason: "no candidates".to_string(),
        });
        assert!(matches!(err, AssistError::MalformedUpstreamOutput { .. }));

        let err = AssistError::from(LlmError::ProviderUnavailable {
            provider: "gemini".to_string(),
            reason: "503".to_string(),
        });
        assert!(matches!(err, AssistError::UpstreamUnavailable { .. }));
    }

    #[test]
    fn session_not_found_keeps_id() {
        let id = SessionId::new("gone");
        let err = AssistError::from(SessionError::NotFound { id: id.clone() });
        assert_eq!(err, AssistError::SessionNotFound { id });
    }
}
