//! Normalized Provider Events
//!
//! Provider-agnostic event types and the adapter trait for interpreting
//! incremental LLM output. Every provider adapter decodes its own wire format
//! and converts it into [`ProviderEvent`]s, which the orchestrator in the main
//! crate consumes with an exhaustive match.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Normalized streaming event that all provider adapters convert to.
///
/// Events carry deltas: the orchestrator is responsible for accumulating them
/// into the complete values reported to listeners.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderEvent {
    /// Visible text fragment from the model
    TextDelta { content: String },

    /// Native reasoning fragment (reasoning_content, thinking blocks, thought parts)
    ReasoningDelta { content: String },

    /// Fragment of a tool call. Name, id and arguments may each arrive split
    /// across many fragments and are concatenated in arrival order.
    ToolCallDelta {
        #[serde(default)]
        index: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        arguments: Option<String>,
    },

    /// The provider closed the tool call at `index`
    ToolCallEnd {
        #[serde(default)]
        index: usize,
    },

    /// Token usage information
    Usage {
        input_tokens: u32,
        output_tokens: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        reasoning_tokens: Option<u32>,
    },

    /// Error reported in-band by the provider
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
    },

    /// Stream complete
    Complete {
        #[serde(skip_serializing_if = "Option::is_none")]
        stop_reason: Option<String>,
    },
}

impl ProviderEvent {
    /// Shorthand for a text fragment.
    pub fn text(content: impl Into<String>) -> Self {
        Self::TextDelta {
            content: content.into(),
        }
    }

    /// Shorthand for a native reasoning fragment.
    pub fn reasoning(content: impl Into<String>) -> Self {
        Self::ReasoningDelta {
            content: content.into(),
        }
    }

    /// Whether this event ends the stream (successfully or not).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }
}

/// Errors that can occur during stream adaptation
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AdapterError {
    /// Invalid format that couldn't be parsed
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    /// JSON/data parsing error
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Trait for adapting provider-specific stream formats to normalized events.
///
/// Adapters receive one framed line at a time (an SSE `data:` line or one
/// NDJSON object) and may keep state between lines, e.g. the stop reason of an
/// OpenAI stream that is only reported at `[DONE]`.
pub trait StreamAdapter: Send + Sync {
    /// Returns the provider name for logging and identification.
    fn provider_name(&self) -> &'static str;

    /// Returns whether this adapter/provider supports reasoning output.
    fn supports_thinking(&self) -> bool;

    /// Returns whether this adapter/provider supports tool calls.
    fn supports_tools(&self) -> bool;

    /// Adapt a raw stream line to normalized events.
    ///
    /// A single input line may produce zero, one, or multiple events.
    /// Keepalive and comment lines produce zero events.
    fn adapt(&mut self, input: &str) -> Result<Vec<ProviderEvent>, AdapterError>;

    /// Reset adapter state for a new stream.
    fn reset(&mut self) {
        // Default implementation does nothing
    }
}

/// Strip the SSE `data:` field name from a line.
///
/// Returns `None` for lines that carry no payload (blank lines, `event:`,
/// `id:`, `retry:` and `:` comments). Raw JSON lines pass through unchanged.
pub fn sse_payload(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if let Some(rest) = trimmed.strip_prefix("data:") {
        let rest = rest.trim_start();
        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    } else if trimmed.starts_with('{') || trimmed.starts_with('[') {
        Some(trimmed)
    } else {
        None
    }
}
