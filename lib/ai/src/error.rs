//! Error types for the AI crate.
//!
//! These are boundary errors: service layers wrap them in a rootcause report
//! or, for image loading, absorb them entirely.
//! - `LlmError`: model-capability calls
//! - `ImageError`: remote image download and inline image decoding

use std::fmt;

/// Errors from model backend operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Provider answered with a server-side failure or could not be reached.
    ProviderUnavailable { provider: String, reason: String },
    /// Request failed.
    RequestFailed { reason: String },
    /// Response parsing failed.
    ResponseParseFailed { reason: String },
    /// Timeout waiting for response.
    Timeout,
    /// Rate limit exceeded.
    RateLimited { retry_after_secs: Option<u64> },
    /// Invalid configuration.
    InvalidConfig { reason: String },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderUnavailable { provider, reason } => {
                write!(f, "model provider '{provider}' unavailable: {reason}")
            }
            Self::RequestFailed { reason } => {
                write!(f, "model request failed: {reason}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse model response: {reason}")
            }
            Self::Timeout => write!(f, "model request timed out"),
            Self::RateLimited { retry_after_secs } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "rate limited, retry after {secs}s")
                } else {
                    write!(f, "rate limited")
                }
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid model configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for LlmError {}

/// Errors from loading an image for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// The download could not be performed.
    FetchFailed { url: String, reason: String },
    /// The server answered with a non-success status.
    BadStatus { url: String, status: u16 },
    /// Inline image data was malformed.
    DecodeFailed { reason: String },
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchFailed { url, reason } => {
                write!(f, "failed to download image '{url}': {reason}")
            }
            Self::BadStatus { url, status } => {
                write!(f, "image download '{url}' returned status {status}")
            }
            Self::DecodeFailed { reason } => {
                write!(f, "malformed inline image: {reason}")
            }
        }
    }
}

impl std::error::Error for ImageError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_error_display() {
        let err = LlmError::ProviderUnavailable {
            provider: "gemini".to_string(),
            reason: "503 Service Unavailable".to_string(),
        };
        assert!(err.to_string().contains("gemini"));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn rate_limit_display_mentions_retry() {
        let err = LlmError::RateLimited {
            retry_after_secs: Some(30),
        };
        assert_eq!(err.to_string(), "rate limited, retry after 30s");
    }

    #[test]
    fn image_error_display() {
        let err = ImageError::BadStatus {
            url: "https://example.com/a.png".to_string(),
            status: 404,
        };
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("a.png"));
    }
}
