//! Reasoning Tag Extraction
//!
//! Splits model output into visible text and reasoning wrapped in a
//! configurable tag pair (`<think>...</think>` for DeepSeek R1, QwQ and
//! similar open-weight models).
//!
//! The streaming extractor is a three-phase state machine that only moves
//! forward: before the open tag, inside reasoning, after the close tag. Text
//! that could be the beginning of the next tag is held back until the tag is
//! confirmed or ruled out, so partial tag text never flashes in the UI.

use serde::{Deserialize, Serialize};

use super::partial_marker_len;

/// Open/close tag pair delimiting reasoning text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningTags {
    pub open: String,
    pub close: String,
}

impl ReasoningTags {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// The `<think>` / `</think>` pair used by most open-weight reasoning models.
    pub fn think() -> Self {
        Self::new("<think>", "</think>")
    }
}

impl Default for ReasoningTags {
    fn default() -> Self {
        Self::think()
    }
}

/// Where the extractor is relative to the tag pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningPhase {
    BeforeOpenTag,
    InsideReasoning,
    AfterCloseTag,
}

/// Visible and reasoning text classified so far.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReasoningSplit {
    pub visible_text: String,
    pub reasoning_text: String,
    /// Byte offset into the raw text up to which everything is classified
    pub cursor: usize,
}

/// Incremental splitter fed with the full raw text accumulated so far.
#[derive(Debug, Clone)]
pub struct ReasoningTagExtractor {
    tags: ReasoningTags,
    phase: ReasoningPhase,
    split: ReasoningSplit,
}

impl ReasoningTagExtractor {
    pub fn new(tags: ReasoningTags) -> Self {
        Self {
            tags,
            phase: ReasoningPhase::BeforeOpenTag,
            split: ReasoningSplit::default(),
        }
    }

    pub fn tags(&self) -> &ReasoningTags {
        &self.tags
    }

    pub fn phase(&self) -> ReasoningPhase {
        self.phase
    }

    pub fn split(&self) -> &ReasoningSplit {
        &self.split
    }

    /// Classify whatever `full_text` added since the previous call.
    ///
    /// `full_text` must extend the text passed previously.
    pub fn update(&mut self, full_text: &str) -> &ReasoningSplit {
        if full_text.len() < self.split.cursor || !full_text.is_char_boundary(self.split.cursor) {
            tracing::warn!(
                cursor = self.split.cursor,
                len = full_text.len(),
                "reasoning extractor fed a buffer that does not extend the previous one"
            );
            return &self.split;
        }

        loop {
            let pending = &full_text[self.split.cursor..];
            match self.phase {
                ReasoningPhase::BeforeOpenTag => {
                    if let Some(at) = pending.find(&self.tags.open) {
                        self.split.visible_text.push_str(&pending[..at]);
                        self.split.cursor += at + self.tags.open.len();
                        self.phase = ReasoningPhase::InsideReasoning;
                        continue;
                    }
                    let held = partial_marker_len(pending, &self.tags.open);
                    let ready = pending.len() - held;
                    self.split.visible_text.push_str(&pending[..ready]);
                    self.split.cursor += ready;
                }
                ReasoningPhase::InsideReasoning => {
                    if let Some(at) = pending.find(&self.tags.close) {
                        self.split.reasoning_text.push_str(&pending[..at]);
                        self.split.cursor += at + self.tags.close.len();
                        self.phase = ReasoningPhase::AfterCloseTag;
                        continue;
                    }
                    let held = partial_marker_len(pending, &self.tags.close);
                    let ready = pending.len() - held;
                    self.split.reasoning_text.push_str(&pending[..ready]);
                    self.split.cursor += ready;
                }
                ReasoningPhase::AfterCloseTag => {
                    self.split.visible_text.push_str(pending);
                    self.split.cursor = full_text.len();
                }
            }
            return &self.split;
        }
    }

    /// Classify the complete text, releasing anything held back as a possible
    /// partial tag.
    pub fn finish(&mut self, full_text: &str) -> ReasoningSplit {
        self.update(full_text);
        let split = split_reasoning(full_text, &self.tags);
        self.split = split.clone();
        split
    }
}

/// Split a complete string in one pass.
///
/// Text before the first open tag is visible, text between it and the next
/// close tag is reasoning, text after the close tag is visible again. Without
/// an open tag everything is visible; without a close tag everything after the
/// open tag is reasoning.
pub fn split_reasoning(text: &str, tags: &ReasoningTags) -> ReasoningSplit {
    let Some(open_at) = text.find(&tags.open) else {
        return ReasoningSplit {
            visible_text: text.to_string(),
            reasoning_text: String::new(),
            cursor: text.len(),
        };
    };

    let inner_start = open_at + tags.open.len();
    let inner = &text[inner_start..];
    match inner.find(&tags.close) {
        Some(close_at) => {
            let after = &inner[close_at + tags.close.len()..];
            ReasoningSplit {
                visible_text: format!("{}{}", &text[..open_at], after),
                reasoning_text: inner[..close_at].to_string(),
                cursor: text.len(),
            }
        }
        None => ReasoningSplit {
            visible_text: text[..open_at].to_string(),
            reasoning_text: inner.to_string(),
            cursor: text.len(),
        },
    }
}
