//! Ollama API Adapter
//!
//! Handles the newline-delimited JSON emitted by `/api/chat` and
//! `/api/generate`. `<think>` tags inside content are left in the text; the
//! session splits them out when the model's reasoning tags are configured.

use assistant_stream_core::{AdapterError, ProviderEvent, StreamAdapter};
use serde::Deserialize;

use crate::services::streaming::factory::uses_think_tags;

/// One NDJSON line from either endpoint
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    /// `/api/chat`
    #[serde(default)]
    message: Option<OllamaMessage>,
    /// `/api/generate`
    #[serde(default)]
    response: Option<String>,
    /// `/api/generate` with `think: true`
    #[serde(default)]
    thinking: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    eval_count: Option<u32>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    thinking: Option<String>,
    #[serde(default)]
    tool_calls: Vec<OllamaToolCall>,
}

#[derive(Debug, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunction,
}

#[derive(Debug, Deserialize)]
struct OllamaFunction {
    name: String,
    /// Ollama sends arguments as a JSON object, not a string
    #[serde(default)]
    arguments: serde_json::Value,
}

/// Adapter for Ollama JSON stream format
pub struct OllamaAdapter {
    model: String,
    /// Whether this model reasons inside `<think>` tags
    thinking_enabled: bool,
    /// Tool calls emitted so far
    tool_count: usize,
}

impl OllamaAdapter {
    pub fn new(model: impl Into<String>) -> Self {
        let model = model.into();
        let thinking_enabled = uses_think_tags(&model);
        Self {
            model,
            thinking_enabled,
            tool_count: 0,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn tool_call_events(&mut self, call: OllamaToolCall) -> Vec<ProviderEvent> {
        let index = self.tool_count;
        self.tool_count += 1;
        let arguments = match call.function.arguments {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(raw) => raw,
            value => value.to_string(),
        };
        vec![
            ProviderEvent::ToolCallDelta {
                index,
                id: Some(uuid::Uuid::new_v4().to_string()),
                name: Some(call.function.name),
                arguments: Some(arguments),
            },
            ProviderEvent::ToolCallEnd { index },
        ]
    }
}

impl StreamAdapter for OllamaAdapter {
    fn provider_name(&self) -> &'static str {
        "ollama"
    }

    fn supports_thinking(&self) -> bool {
        self.thinking_enabled
    }

    fn supports_tools(&self) -> bool {
        // depends on the model; the server rejects tools it cannot use
        true
    }

    fn adapt(&mut self, input: &str) -> Result<Vec<ProviderEvent>, AdapterError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(vec![]);
        }
        if !trimmed.starts_with('{') {
            return Err(AdapterError::InvalidFormat(format!(
                "expected a JSON object per line, got: {}",
                trimmed
            )));
        }

        let response: OllamaResponse =
            serde_json::from_str(trimmed).map_err(|e| AdapterError::ParseError(e.to_string()))?;

        if let Some(message) = response.error {
            return Ok(vec![ProviderEvent::Error {
                message,
                code: None,
                status: None,
            }]);
        }

        let mut events = vec![];

        if let Some(thinking) = response.thinking {
            if !thinking.is_empty() {
                events.push(ProviderEvent::reasoning(thinking));
            }
        }
        if let Some(content) = response.response {
            if !content.is_empty() {
                events.push(ProviderEvent::text(content));
            }
        }

        if let Some(message) = response.message {
            if let Some(thinking) = message.thinking {
                if !thinking.is_empty() {
                    events.push(ProviderEvent::reasoning(thinking));
                }
            }
            if !message.content.is_empty() {
                events.push(ProviderEvent::text(message.content));
            }
            for call in message.tool_calls {
                events.extend(self.tool_call_events(call));
            }
        }

        if response.done {
            if response.prompt_eval_count.is_some() || response.eval_count.is_some() {
                events.push(ProviderEvent::Usage {
                    input_tokens: response.prompt_eval_count.unwrap_or(0),
                    output_tokens: response.eval_count.unwrap_or(0),
                    reasoning_tokens: None,
                });
            }
            events.push(ProviderEvent::Complete {
                stop_reason: Some(response.done_reason.unwrap_or_else(|| "stop".to_string())),
            });
        }

        Ok(events)
    }

    fn reset(&mut self) {
        self.tool_count = 0;
    }
}
