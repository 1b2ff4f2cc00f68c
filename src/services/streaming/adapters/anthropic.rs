//! Anthropic Messages Adapter
//!
//! Handles the Messages API SSE format: content blocks of type text, thinking
//! and tool_use, each streamed through `content_block_delta` events.

use assistant_stream_core::{sse_payload, AdapterError, ProviderEvent, StreamAdapter};
use serde::Deserialize;

/// Event types from the Messages API SSE format
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicEvent {
    MessageStart {
        message: MessageInfo,
    },
    ContentBlockStart {
        index: usize,
        content_block: ContentBlock,
    },
    ContentBlockDelta {
        index: usize,
        delta: Delta,
    },
    ContentBlockStop {
        index: usize,
    },
    MessageDelta {
        delta: MessageDelta,
        #[serde(default)]
        usage: Option<DeltaUsage>,
    },
    MessageStop,
    Ping,
    Error {
        error: ApiError,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct MessageInfo {
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    ToolUse {
        id: String,
        name: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Delta {
    TextDelta { text: String },
    ThinkingDelta { thinking: String },
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageDelta {
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct DeltaUsage {
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

/// Adapter for the Anthropic Messages SSE format
#[derive(Default)]
pub struct AnthropicAdapter {
    /// Content block index and tool index of the tool_use block being streamed
    current_tool: Option<(usize, usize)>,
    /// Tool calls opened so far in this message
    tool_count: usize,
    input_tokens: u32,
    stop_reason: Option<String>,
}

impl AnthropicAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn tool_index_for_block(&self, block: usize) -> Option<usize> {
        self.current_tool
            .filter(|(tool_block, _)| *tool_block == block)
            .map(|(_, tool_index)| tool_index)
    }
}

impl StreamAdapter for AnthropicAdapter {
    fn provider_name(&self) -> &'static str {
        "anthropic"
    }

    fn supports_thinking(&self) -> bool {
        true
    }

    fn supports_tools(&self) -> bool {
        true
    }

    fn adapt(&mut self, input: &str) -> Result<Vec<ProviderEvent>, AdapterError> {
        let Some(json_str) = sse_payload(input) else {
            return Ok(vec![]);
        };
        if json_str == "[DONE]" {
            return Ok(vec![]);
        }

        let event: AnthropicEvent =
            serde_json::from_str(json_str).map_err(|e| AdapterError::ParseError(e.to_string()))?;

        let events = match event {
            AnthropicEvent::MessageStart { message } => {
                if let Some(usage) = message.usage {
                    self.input_tokens = usage.input_tokens;
                }
                vec![]
            }
            AnthropicEvent::ContentBlockStart {
                index,
                content_block,
            } => match content_block {
                ContentBlock::Text { text } if !text.is_empty() => vec![ProviderEvent::text(text)],
                ContentBlock::Thinking { thinking } if !thinking.is_empty() => {
                    vec![ProviderEvent::reasoning(thinking)]
                }
                ContentBlock::ToolUse { id, name } => {
                    let tool_index = self.tool_count;
                    self.tool_count += 1;
                    self.current_tool = Some((index, tool_index));
                    vec![ProviderEvent::ToolCallDelta {
                        index: tool_index,
                        id: Some(id),
                        name: Some(name),
                        arguments: None,
                    }]
                }
                _ => vec![],
            },
            AnthropicEvent::ContentBlockDelta { index, delta } => match delta {
                Delta::TextDelta { text } => vec![ProviderEvent::text(text)],
                Delta::ThinkingDelta { thinking } => vec![ProviderEvent::reasoning(thinking)],
                Delta::InputJsonDelta { partial_json } => match self.tool_index_for_block(index) {
                    Some(tool_index) => vec![ProviderEvent::ToolCallDelta {
                        index: tool_index,
                        id: None,
                        name: None,
                        arguments: Some(partial_json),
                    }],
                    None => {
                        tracing::warn!(block = index, "input_json_delta outside a tool_use block");
                        vec![]
                    }
                },
                Delta::Other => vec![],
            },
            AnthropicEvent::ContentBlockStop { index } => match self.tool_index_for_block(index) {
                Some(tool_index) => {
                    self.current_tool = None;
                    vec![ProviderEvent::ToolCallEnd { index: tool_index }]
                }
                None => vec![],
            },
            AnthropicEvent::MessageDelta { delta, usage } => {
                if delta.stop_reason.is_some() {
                    self.stop_reason = delta.stop_reason;
                }
                match usage {
                    Some(u) => vec![ProviderEvent::Usage {
                        input_tokens: self.input_tokens,
                        output_tokens: u.output_tokens,
                        reasoning_tokens: None,
                    }],
                    None => vec![],
                }
            }
            AnthropicEvent::MessageStop => vec![ProviderEvent::Complete {
                stop_reason: self.stop_reason.take(),
            }],
            AnthropicEvent::Error { error } => vec![ProviderEvent::Error {
                message: error.message,
                code: error.error_type,
                status: None,
            }],
            AnthropicEvent::Ping | AnthropicEvent::Unknown => vec![],
        };

        Ok(events)
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
