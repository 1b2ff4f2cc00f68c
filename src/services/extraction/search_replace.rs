//! Search/Replace Block Extraction
//!
//! Finds edit blocks of the form
//!
//! ```text
//! <<<<<<< ORIGINAL
//! old code
//! =======
//! new code
//! >>>>>>> UPDATED
//! ```
//!
//! repeated any number of times in a response. The scan is forward-only and
//! restarts from the beginning of the buffer on every call; as the buffer
//! grows the returned list only gains blocks or advances the state of its
//! last block, and a `Done` block never changes again.

use serde::{Deserialize, Serialize};

use super::partial_marker_len;

/// The three literal lines delimiting a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchReplaceMarkers {
    /// Opens a block; followed by a newline
    pub original: String,
    /// Separates original and updated text; on its own line
    pub divider: String,
    /// Closes a block; must start a line
    #[serde(rename = "final")]
    pub final_marker: String,
}

impl SearchReplaceMarkers {
    pub fn new(
        original: impl Into<String>,
        divider: impl Into<String>,
        final_marker: impl Into<String>,
    ) -> Self {
        Self {
            original: original.into(),
            divider: divider.into(),
            final_marker: final_marker.into(),
        }
    }
}

impl Default for SearchReplaceMarkers {
    fn default() -> Self {
        Self::new("<<<<<<< ORIGINAL", "=======", ">>>>>>> UPDATED")
    }
}

/// How far a block has been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockState {
    WritingOriginal,
    WritingFinal,
    Done,
}

/// One search/replace block, possibly still being written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedBlock {
    pub state: BlockState,
    pub original: String,
    #[serde(rename = "final")]
    pub updated: String,
}

impl ExtractedBlock {
    pub fn is_done(&self) -> bool {
        self.state == BlockState::Done
    }
}

/// Stateless extractor over a configurable marker set.
#[derive(Debug, Clone, Default)]
pub struct SearchReplaceExtractor {
    markers: SearchReplaceMarkers,
}

impl SearchReplaceExtractor {
    pub fn new(markers: SearchReplaceMarkers) -> Self {
        Self { markers }
    }

    pub fn markers(&self) -> &SearchReplaceMarkers {
        &self.markers
    }

    /// Extract every block present in `buffer`.
    pub fn extract(&self, buffer: &str) -> Vec<ExtractedBlock> {
        let original_line = format!("{}\n", self.markers.original);
        let divider_line = format!("\n{}\n", self.markers.divider);
        let final_line = format!("\n{}", self.markers.final_marker);

        let mut blocks = Vec::new();
        let mut cursor = 0;

        loop {
            let Some(found) = find_from(buffer, &original_line, cursor) else {
                return blocks;
            };
            let original_start = found + original_line.len();
            cursor = original_start;

            // the newline ending the original marker doubles as the divider's
            // leading newline when the original text is empty
            let Some(divider_at) = find_from(buffer, &divider_line, original_start - 1) else {
                let writing = partial_marker_len(buffer, &divider_line);
                blocks.push(ExtractedBlock {
                    state: BlockState::WritingOriginal,
                    original: slice(buffer, original_start, buffer.len() - writing),
                    updated: String::new(),
                });
                return blocks;
            };
            let original = slice(buffer, original_start, divider_at);
            let updated_start = divider_at + divider_line.len();
            cursor = updated_start;

            // only a marker at the start of a line closes the block; the
            // divider's trailing newline counts when the updated text is empty
            let Some(final_at) = find_from(buffer, &final_line, updated_start - 1) else {
                let writing = partial_marker_len(buffer, &final_line);
                blocks.push(ExtractedBlock {
                    state: BlockState::WritingFinal,
                    original,
                    updated: slice(buffer, updated_start, buffer.len() - writing),
                });
                return blocks;
            };

            blocks.push(ExtractedBlock {
                state: BlockState::Done,
                original,
                updated: slice(buffer, updated_start, final_at),
            });
            cursor = final_at + final_line.len();
        }
    }
}

/// Extract blocks using the default markers.
pub fn extract_search_replace_blocks(buffer: &str) -> Vec<ExtractedBlock> {
    SearchReplaceExtractor::default().extract(buffer)
}

fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    haystack
        .get(from..)
        .and_then(|rest| rest.find(needle))
        .map(|offset| from + offset)
}

/// `haystack[start..end]`, or empty when the range is inverted.
fn slice(haystack: &str, start: usize, end: usize) -> String {
    if end <= start {
        String::new()
    } else {
        haystack[start..end].to_string()
    }
}
