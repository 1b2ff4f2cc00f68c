//! Gemini API Adapter
//!
//! Handles `streamGenerateContent?alt=sse`. Each SSE payload is a complete
//! `GenerateContentResponse`; text parts flagged `thought` are reasoning and
//! `functionCall` parts arrive whole, without an id.

use assistant_stream_core::{sse_payload, AdapterError, ProviderEvent, StreamAdapter};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeminiPayload {
    Error { error: GeminiError },
    Response(GenerateContentResponse),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: Option<bool>,
    #[serde(default)]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    thoughts_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    #[serde(default)]
    code: Option<u16>,
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Adapter for Gemini SSE streams
#[derive(Default)]
pub struct GeminiAdapter {
    tool_count: usize,
}

impl GeminiAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StreamAdapter for GeminiAdapter {
    fn provider_name(&self) -> &'static str {
        "gemini"
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

        let payload: GeminiPayload =
            serde_json::from_str(json_str).map_err(|e| AdapterError::ParseError(e.to_string()))?;

        let response = match payload {
            GeminiPayload::Error { error } => {
                return Ok(vec![ProviderEvent::Error {
                    message: error.message,
                    code: error.status,
                    status: error.code,
                }]);
            }
            GeminiPayload::Response(response) => response,
        };

        let mut events = vec![];
        let mut finish_reason = None;

        for candidate in response.candidates {
            for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
                if let Some(call) = part.function_call {
                    let index = self.tool_count;
                    self.tool_count += 1;
                    let arguments = call.args.map(|args| args.to_string()).unwrap_or_default();
                    events.push(ProviderEvent::ToolCallDelta {
                        index,
                        id: Some(uuid::Uuid::new_v4().to_string()),
                        name: Some(call.name),
                        arguments: Some(arguments),
                    });
                    events.push(ProviderEvent::ToolCallEnd { index });
                    continue;
                }
                match part.text {
                    Some(text) if text.is_empty() => {}
                    Some(text) if part.thought.unwrap_or(false) => {
                        events.push(ProviderEvent::reasoning(text))
                    }
                    Some(text) => events.push(ProviderEvent::text(text)),
                    None => {}
                }
            }
            if candidate.finish_reason.is_some() {
                finish_reason = candidate.finish_reason;
            }
        }

        if let Some(usage) = response.usage_metadata {
            events.push(ProviderEvent::Usage {
                input_tokens: usage.prompt_token_count,
                output_tokens: usage.candidates_token_count,
                reasoning_tokens: usage.thoughts_token_count,
            });
        }

        if let Some(reason) = finish_reason {
            events.push(ProviderEvent::Complete {
                stop_reason: Some(reason.to_lowercase()),
            });
        }

        Ok(events)
    }

    fn reset(&mut self) {
        self.tool_count = 0;
    }
}
