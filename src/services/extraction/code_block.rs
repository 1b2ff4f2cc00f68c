//! Code Block Extraction
//!
//! Pulls the code out of a (possibly unfinished) fenced block. Every call
//! re-scans the whole buffer, so the result depends only on the buffer and
//! never on how it was chunked.

use serde::{Deserialize, Serialize};

use super::surroundings::SurroundingsRemover;
use super::Progress;

/// Markdown code fence.
pub const FENCE: &str = "```";

/// Cleaned code plus what changed since the previous chunk.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractedCode {
    /// Code with fences, language tag and FIM tags removed
    pub value: String,
    /// Part of the latest chunk that landed in `value`
    pub delta: String,
    /// Part of the latest chunk that was trimmed off as (possible) trailing marker
    pub ignored_suffix: String,
}

/// Extract code from a regular chat answer: an optional fenced block with an
/// optional language tag.
///
/// `recently_added_len` is the byte length of the chunk most recently appended
/// to `text`.
pub fn extract_code_from_regular(text: &str, recently_added_len: usize) -> Progress<ExtractedCode> {
    let mut remover = SurroundingsRemover::new(text);
    let closed = remove_code_block(&mut remover);
    finish(&remover, recently_added_len, closed)
}

/// Extract the middle span of a fill-in-the-middle completion.
///
/// Inside the optional fence the model wraps its answer in `<MID>...</MID>`
/// (with `mid_tag` = `MID`); both tags are stripped.
pub fn extract_code_from_fim(
    text: &str,
    recently_added_len: usize,
    mid_tag: &str,
) -> Progress<ExtractedCode> {
    let mut remover = SurroundingsRemover::new(text);
    let closed = remove_code_block(&mut remover);

    let open_tag = format!("<{}>", mid_tag);
    let close_tag = format!("</{}>", mid_tag);

    let before = remover.window();
    if remover.remove_prefix(&open_tag) {
        remover.remove_suffix("\n");
        remover.remove_suffix(&close_tag);
    } else if !remover.value().is_empty() {
        // diverged from the tag: it is content, not a tag still arriving
        remover.restore(before);
    }

    finish(&remover, recently_added_len, closed)
}

/// Strip an opening fence with its language line and a closing fence.
///
/// Returns whether the closing fence was fully seen.
fn remove_code_block(remover: &mut SurroundingsRemover<'_>) -> bool {
    let before = remover.window();
    if !remover.remove_prefix(FENCE) {
        if !remover.value().is_empty() {
            remover.restore(before);
        }
        return false;
    }

    // language tag, possibly empty
    remover.remove_from_start_until_full_match("\n", true);

    if remover.value().ends_with("```\n") {
        remover.remove_suffix("\n");
    }
    let closed = remover.remove_suffix(FENCE);
    // newline before the fence, or one still being followed by more code
    remover.remove_suffix("\n");
    closed
}

fn finish(
    remover: &SurroundingsRemover<'_>,
    recently_added_len: usize,
    closed: bool,
) -> Progress<ExtractedCode> {
    let info = remover.delta_info(recently_added_len);
    let code = ExtractedCode {
        value: remover.value().to_string(),
        delta: info.delta.to_string(),
        ignored_suffix: info.ignored_suffix.to_string(),
    };
    if closed {
        Progress::Complete(code)
    } else {
        Progress::Partial(code)
    }
}
