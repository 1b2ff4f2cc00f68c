//! Structured Extraction From Streamed Text
//!
//! Parsers that pull stable artifacts out of a buffer that is only ever
//! appended to:
//! - `surroundings` - windowed prefix/suffix stripping with partial-marker tolerance
//! - `code_block` - fenced and fill-in-the-middle code extraction
//! - `search_replace` - repeated original/divider/final edit blocks
//! - `reasoning` - visible text vs tag-delimited reasoning
//!
//! None of these fail on incomplete input. "Not yet complete" is carried as
//! data ([`Progress`], [`BlockState`]) because only the orchestrator knows when
//! a stream has really ended.

pub mod code_block;
pub mod reasoning;
pub mod search_replace;
pub mod surroundings;

pub use code_block::{extract_code_from_fim, extract_code_from_regular, ExtractedCode, FENCE};
pub use reasoning::{
    split_reasoning, ReasoningPhase, ReasoningSplit, ReasoningTagExtractor, ReasoningTags,
};
pub use search_replace::{
    extract_search_replace_blocks, BlockState, ExtractedBlock, SearchReplaceExtractor,
    SearchReplaceMarkers,
};
pub use surroundings::{DeltaInfo, SurroundingsRemover};

use serde::{Deserialize, Serialize};

/// Result of interpreting a buffer that may still be growing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Progress<T> {
    /// The closing marker has not been seen yet; more input may change the value
    Partial(T),
    /// The closing marker was seen; the value is final
    Complete(T),
}

impl<T> Progress<T> {
    pub fn value(&self) -> &T {
        match self {
            Self::Partial(value) | Self::Complete(value) => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Partial(value) | Self::Complete(value) => value,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

/// Length of the longest strict prefix of `marker` that `text` ends with.
///
/// Used to hold back a marker that is still being streamed in.
pub(crate) fn partial_marker_len(text: &str, marker: &str) -> usize {
    let max = text.len().min(marker.len().saturating_sub(1));
    (1..=max)
        .rev()
        .filter(|&len| marker.is_char_boundary(len))
        .find(|&len| text.ends_with(&marker[..len]))
        .unwrap_or(0)
}
