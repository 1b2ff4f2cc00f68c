//! Assistant Stream - Streaming Response Interpretation
//!
//! Turns incrementally delivered model output into stable, structured
//! artifacts for an editor assistant.
//! It includes:
//! - Extraction of fenced / fill-in-the-middle code, search/replace edit
//!   blocks and tag-delimited reasoning from a growing buffer
//! - Provider adapters normalizing OpenAI-compatible, Anthropic, Ollama and
//!   Gemini streams into one event union
//! - Stream sessions delivering text, final message, error and abort
//!   callbacks with cancellation
//! - Streaming configuration loaded from TOML

pub mod models;
pub mod services;

// Re-export models
pub use models::settings::{SettingsUpdate, StreamingConfig};

// Re-export the extraction API
pub use services::extraction::{
    extract_code_from_fim, extract_code_from_regular, extract_search_replace_blocks,
    split_reasoning, BlockState, ExtractedBlock, ExtractedCode, Progress, ReasoningSplit,
    ReasoningTagExtractor, ReasoningTags, SearchReplaceExtractor, SearchReplaceMarkers,
    SurroundingsRemover,
};

// Re-export the streaming API
pub use services::streaming::{
    AdapterFactory, ChannelListener, ErrorReport, FinalMessage, RequestId, SessionEvent,
    SessionOutcome, SessionTable, StreamListener, StreamSession, StreamSnapshot, ToolCall,
    ToolParams, UnifiedStreamingService,
};

// Re-export core types
pub use assistant_stream_core::{
    CoreError, CoreResult, ErrorKind, ProviderEvent, StreamAdapter, StreamError,
};
