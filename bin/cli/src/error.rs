use realty_assist_ai::{ImageError, LlmError};
use realty_assist_routing::AssistError;
use rootcause::prelude::Report;
use std::fmt;

#[derive(Debug)]
pub enum CliError {
    Config { reason: String },
    Setup { reason: String },
    Io { reason: String },
    UnsupportedImage { path: String },
    Assist(AssistError),
}

impl CliError {
    pub fn io(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { reason } => write!(f, "configuration error: {reason}"),
            Self::Setup { reason } => write!(f, "startup failed: {reason}"),
            Self::Io { reason } => write!(f, "i/o error: {reason}"),
            Self::UnsupportedImage { path } => {
                write!(f, "'{path}' is not a recognized image (png, jpeg, gif, webp)")
            }
            Self::Assist(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for CliError {}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config {
            reason: err.to_string(),
        }
    }
}

impl From<LlmError> for CliError {
    fn from(err: LlmError) -> Self {
        Self::Setup {
            reason: err.to_string(),
        }
    }
}

impl From<ImageError> for CliError {
    fn from(err: ImageError) -> Self {
        Self::Setup {
            reason: err.to_string(),
        }
    }
}

impl From<Report<AssistError>> for CliError {
    fn from(report: Report<AssistError>) -> Self {
        Self::Assist(report.current_context().clone())
    }
}
