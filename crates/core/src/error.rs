//! Core Error Types
//!
//! Defines the error types shared across the assistant-stream workspace.
//! `CoreError` covers configuration and I/O plumbing; `StreamError` is the
//! taxonomy a streaming session can terminate with.
//!
//! Parsers never produce these: an incomplete or absent marker is data, not an
//! error. Only the orchestrator, which knows when a stream has truly ended,
//! turns a condition into a `StreamError`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::streaming::AdapterError;

/// Core error type for the assistant-stream workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Parse errors
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

/// Convert CoreError to a string
impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}

/// Provider error codes that mean the configured credential was rejected.
const CREDENTIAL_CODES: &[&str] = &[
    "invalid_api_key",
    "authentication_error",
    "permission_error",
    "permission_denied",
    "unauthenticated",
    "unauthorized",
    "forbidden",
    "api_key_invalid",
];

/// Errors a streaming session can terminate with.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StreamError {
    /// Error from the transport or reported in-band by the provider
    #[error("{message}")]
    Transport {
        message: String,
        code: Option<String>,
        status: Option<u16>,
    },

    /// The provider rejected the configured credential
    #[error("Invalid API key for {provider}. {detail}")]
    InvalidCredential { provider: String, detail: String },

    /// The provider reported success but produced nothing usable
    #[error("Response from model was empty.")]
    EmptyResponse,

    /// Tool arguments could not be decoded; recovered locally, never fatal
    #[error("Malformed arguments for tool `{tool}`: {reason}")]
    MalformedToolArguments { tool: String, reason: String },

    /// The user cancelled the request
    #[error("Request aborted")]
    Aborted,

    /// A stream line could not be decoded
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Serializable classification of a [`StreamError`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    InvalidCredential,
    EmptyResponse,
    MalformedToolArguments,
    Aborted,
    Adapter,
}

impl StreamError {
    /// Create a transport error with no provider code.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
            code: None,
            status: None,
        }
    }

    /// Build an error from a provider-reported failure, normalizing the
    /// provider-specific unauthorized and permission shapes into
    /// [`StreamError::InvalidCredential`].
    pub fn from_provider(
        provider: &str,
        message: impl Into<String>,
        code: Option<String>,
        status: Option<u16>,
    ) -> Self {
        let message = message.into();
        let credential_status = matches!(status, Some(401) | Some(403));
        let credential_code = code.as_deref().is_some_and(|c| {
            let lower = c.to_lowercase();
            CREDENTIAL_CODES.contains(&lower.as_str())
        });

        if credential_status || credential_code {
            return Self::InvalidCredential {
                provider: provider.to_string(),
                detail: message,
            };
        }

        Self::Transport {
            message,
            code,
            status,
        }
    }

    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::InvalidCredential { .. } => ErrorKind::InvalidCredential,
            Self::EmptyResponse => ErrorKind::EmptyResponse,
            Self::MalformedToolArguments { .. } => ErrorKind::MalformedToolArguments,
            Self::Aborted => ErrorKind::Aborted,
            Self::Adapter(_) => ErrorKind::Adapter,
        }
    }
}
