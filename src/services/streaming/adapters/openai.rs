//! OpenAI-Compatible Adapter
//!
//! Handles the chat-completions SSE format shared by OpenAI, DeepSeek,
//! OpenRouter, Groq and most self-hosted gateways, including the
//! `reasoning_content` / `reasoning` delta fields.

use assistant_stream_core::{sse_payload, AdapterError, ProviderEvent, StreamAdapter};
use serde::Deserialize;

/// One SSE payload: either a completion chunk or an in-band error.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OpenAIPayload {
    Error { error: ApiError },
    Chunk(OpenAIChunk),
}

#[derive(Debug, Deserialize)]
struct OpenAIChunk {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Option<Delta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
    /// DeepSeek
    #[serde(default)]
    reasoning_content: Option<String>,
    /// OpenRouter and vLLM
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    #[serde(default)]
    completion_tokens_details: Option<CompletionTokensDetails>,
}

#[derive(Debug, Deserialize)]
struct CompletionTokensDetails {
    #[serde(default)]
    reasoning_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
}

/// Adapter for OpenAI-compatible SSE streams
pub struct OpenAIAdapter {
    model: String,
    /// Finish reason seen on a choice, reported once `[DONE]` arrives
    stop_reason: Option<String>,
}

impl OpenAIAdapter {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            stop_reason: None,
        }
    }

    /// Check if model supports reasoning (o-series, DeepSeek reasoner/R1)
    fn model_supports_reasoning(&self) -> bool {
        let model_lower = self.model.to_lowercase();
        model_lower.starts_with("o1")
            || model_lower.starts_with("o3")
            || model_lower.starts_with("o4")
            || model_lower.contains("reasoner")
            || model_lower.contains("r1")
    }
}

impl StreamAdapter for OpenAIAdapter {
    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn supports_thinking(&self) -> bool {
        self.model_supports_reasoning()
    }

    fn supports_tools(&self) -> bool {
        true
    }

    fn adapt(&mut self, input: &str) -> Result<Vec<ProviderEvent>, AdapterError> {
        let Some(json_str) = sse_payload(input) else {
            return Ok(vec![]);
        };

        if json_str == "[DONE]" {
            return Ok(vec![ProviderEvent::Complete {
                stop_reason: self.stop_reason.take(),
            }]);
        }

        let payload: OpenAIPayload =
            serde_json::from_str(json_str).map_err(|e| AdapterError::ParseError(e.to_string()))?;

        let chunk = match payload {
            OpenAIPayload::Error { error } => {
                // gateways such as OpenRouter put the HTTP status in `code`
                let status = match &error.code {
                    Some(serde_json::Value::Number(n)) => {
                        n.as_u64().and_then(|n| u16::try_from(n).ok())
                    }
                    _ => None,
                };
                let code = match error.code {
                    Some(serde_json::Value::String(code)) => Some(code),
                    Some(serde_json::Value::Number(n)) if status.is_none() => Some(n.to_string()),
                    _ => error.error_type,
                };
                return Ok(vec![ProviderEvent::Error {
                    message: error.message,
                    code,
                    status,
                }]);
            }
            OpenAIPayload::Chunk(chunk) => chunk,
        };

        let mut events = vec![];

        for choice in chunk.choices {
            if let Some(delta) = choice.delta {
                if let Some(reasoning) = delta.reasoning_content.or(delta.reasoning) {
                    if !reasoning.is_empty() {
                        events.push(ProviderEvent::reasoning(reasoning));
                    }
                }

                if let Some(content) = delta.content {
                    if !content.is_empty() {
                        events.push(ProviderEvent::text(content));
                    }
                }

                for tc in delta.tool_calls.unwrap_or_default() {
                    let (name, arguments) = match tc.function {
                        Some(func) => (func.name, func.arguments),
                        None => (None, None),
                    };
                    events.push(ProviderEvent::ToolCallDelta {
                        index: tc.index.unwrap_or(0),
                        id: tc.id,
                        name,
                        arguments,
                    });
                }
            }

            if let Some(finish_reason) = choice.finish_reason {
                self.stop_reason = Some(finish_reason);
            }
        }

        if let Some(usage) = chunk.usage {
            events.push(ProviderEvent::Usage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
                reasoning_tokens: usage
                    .completion_tokens_details
                    .and_then(|d| d.reasoning_tokens),
            });
        }

        Ok(events)
    }

    fn reset(&mut self) {
        self.stop_reason = None;
    }
}
