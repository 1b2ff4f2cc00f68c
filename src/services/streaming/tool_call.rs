//! Tool Call Accumulation
//!
//! Providers split one tool call's name, id and JSON arguments across many
//! fragments. The accumulator concatenates them; the structured call is only
//! decoded once the response completes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use assistant_stream_core::StreamError;

/// In-progress tool call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallAccumulator {
    pub name: String,
    pub id: String,
    pub raw_args: String,
    pub is_done: bool,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one fragment. Fragments after [`mark_done`](Self::mark_done) are
    /// dropped.
    pub fn push_fragment(&mut self, id: Option<&str>, name: Option<&str>, arguments: Option<&str>) {
        if self.is_done {
            tracing::debug!(tool = %self.name, "tool call fragment after end ignored");
            return;
        }
        if let Some(id) = id {
            self.id.push_str(id);
        }
        if let Some(name) = name {
            self.name.push_str(name);
        }
        if let Some(arguments) = arguments {
            self.raw_args.push_str(arguments);
        }
    }

    /// Flip `is_done`. Returns false if it was already set.
    pub fn mark_done(&mut self) -> bool {
        !std::mem::replace(&mut self.is_done, true)
    }

    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }

    /// Decode the accumulated call. `None` when no name was streamed.
    pub fn to_tool_call(&self) -> Option<ToolCall> {
        if !self.has_name() {
            return None;
        }
        Some(ToolCall {
            name: self.name.clone(),
            id: self.id.clone(),
            params: parse_params(&self.name, &self.raw_args),
            raw_arguments: self.raw_args.clone(),
        })
    }
}

/// Decoded tool parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ToolParams {
    /// Arguments decoded to a JSON object
    Structured(Map<String, Value>),
    /// Arguments that did not decode to an object, kept verbatim
    Raw(String),
}

impl ToolParams {
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Structured(map) => map.get(key),
            Self::Raw(_) => None,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

/// A completed tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub id: String,
    pub params: ToolParams,
    pub raw_arguments: String,
}

/// Decode an argument buffer. An empty buffer is an empty object; anything
/// that is not a JSON object degrades to [`ToolParams::Raw`].
fn parse_params(tool: &str, raw: &str) -> ToolParams {
    if raw.trim().is_empty() {
        return ToolParams::Structured(Map::new());
    }

    let reason = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => return ToolParams::Structured(map),
        Ok(other) => format!("expected a JSON object, got {}", json_type(&other)),
        Err(e) => e.to_string(),
    };

    let err = StreamError::MalformedToolArguments {
        tool: tool.to_string(),
        reason,
    };
    tracing::warn!(error = %err, "keeping raw tool arguments");
    ToolParams::Raw(raw.to_string())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
