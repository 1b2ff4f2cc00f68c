//! Provider Stream Orchestration
//!
//! Normalizes the streaming formats of many providers into one callback
//! contract:
//! - OpenAI-compatible chat completions (SSE, `reasoning_content`)
//! - Anthropic Messages (SSE content blocks)
//! - Ollama (NDJSON)
//! - Gemini (SSE `GenerateContentResponse`)

pub mod adapters;
pub mod factory;
pub mod lines;
pub mod registry;
pub mod service;
pub mod session;
pub mod tool_call;

// Re-export main types
pub use assistant_stream_core::{AdapterError, ProviderEvent, StreamAdapter};
pub use factory::AdapterFactory;
pub use lines::SseLineBuffer;
pub use registry::{RequestId, SessionTable, SessionTableError};
pub use service::UnifiedStreamingService;
pub use session::{
    Aborter, ChannelListener, ErrorReport, FinalMessage, SessionEvent, SessionOutcome,
    StreamListener, StreamSession, StreamSnapshot, TokenUsage,
};
pub use tool_call::{ToolCall, ToolCallAccumulator, ToolParams};
