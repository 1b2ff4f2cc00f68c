//! Extraction Integration Tests
//!
//! Drives the public extraction API the way a chat UI does: the buffer grows
//! one provider chunk at a time and every intermediate result is rendered.

use assistant_stream::{
    extract_code_from_fim, extract_code_from_regular, extract_search_replace_blocks,
    split_reasoning, BlockState, ExtractedBlock, ReasoningTagExtractor, ReasoningTags,
    SearchReplaceExtractor, SearchReplaceMarkers, SurroundingsRemover,
};

/// `text` fed one character at a time: each growing buffer with the length
/// of the character just added.
fn char_by_char(text: &str) -> impl Iterator<Item = (&str, usize)> {
    text.char_indices()
        .map(move |(at, c)| (&text[..at + c.len_utf8()], c.len_utf8()))
}

/// Every way of cutting `text` into two non-empty chunks.
fn two_chunk_splits(text: &str) -> impl Iterator<Item = (&str, &str)> {
    (1..text.len())
        .filter(|&at| text.is_char_boundary(at))
        .map(move |at| text.split_at(at))
}

// ============================================================================
// Code Blocks
// ============================================================================

#[test]
fn test_fenced_python_streamed_in_three_chunks() {
    let mut buffer = String::new();
    let mut last = None;
    for chunk in ["```py", "thon\ndef f", "():\n    pass\n```"] {
        buffer.push_str(chunk);
        last = Some(extract_code_from_regular(&buffer, chunk.len()));
    }

    let last = last.unwrap();
    assert!(last.is_complete());
    assert_eq!(last.into_inner().value, "def f():\n    pass");
}

#[test]
fn test_fenced_code_chunking_invariance() {
    let full = "```rust\nfn main() {\n    println!(\"hi\");\n}\n```\n";
    let whole = extract_code_from_regular(full, full.len()).into_inner().value;
    assert_eq!(whole, "fn main() {\n    println!(\"hi\");\n}");

    for (a, b) in two_chunk_splits(full) {
        let first = extract_code_from_regular(a, a.len());
        assert!(
            whole.starts_with(&first.value().value),
            "partial value {:?} is not a prefix",
            first.value().value
        );
        assert!(!first.value().value.contains('`'), "fence leaked: {:?}", a);

        let joined = format!("{}{}", a, b);
        let second = extract_code_from_regular(&joined, b.len());
        assert!(second.is_complete());
        assert_eq!(second.into_inner().value, whole);
    }
}

#[test]
fn test_deltas_reassemble_the_value() {
    let chunks = ["```ts\nconst a", " = 1;\nconst b", " = 2;\n``", "`"];
    let mut buffer = String::new();
    let mut shown = String::new();
    for chunk in chunks {
        buffer.push_str(chunk);
        let code = extract_code_from_regular(&buffer, chunk.len()).into_inner();
        shown.push_str(&code.delta);
        assert_eq!(shown, code.value);
    }
    assert_eq!(shown, "const a = 1;\nconst b = 2;");
}

#[test]
fn test_fenced_code_fed_one_char_at_a_time() {
    let full = "```rust\nfn main() {\n    println!(\"héllo\");\n}\n```\n";
    let whole = extract_code_from_regular(full, full.len()).into_inner().value;

    let mut last = None;
    for (buffer, added) in char_by_char(full) {
        let code = extract_code_from_regular(buffer, added);
        assert!(
            whole.starts_with(&code.value().value),
            "value {:?} at {:?} is not a prefix",
            code.value().value,
            buffer
        );
        last = Some(code);
    }

    let last = last.unwrap();
    assert!(last.is_complete());
    assert_eq!(last.into_inner().value, whole);
}

#[test]
fn test_fim_fed_one_char_at_a_time() {
    let full = "```\n<MID>if x {\n    y()\n}</MID>\n```";
    let whole = extract_code_from_fim(full, full.len(), "MID").into_inner().value;
    assert_eq!(whole, "if x {\n    y()\n}");

    let mut last = None;
    for (buffer, added) in char_by_char(full) {
        let code = extract_code_from_fim(buffer, added, "MID");
        assert!(
            whole.starts_with(&code.value().value),
            "value {:?} at {:?} is not a prefix",
            code.value().value,
            buffer
        );
        assert!(!code.value().value.contains("<MID"), "open tag leaked at {:?}", buffer);
        last = Some(code);
    }

    let last = last.unwrap();
    assert!(last.is_complete());
    assert_eq!(last.into_inner().value, whole);
}

#[test]
fn test_fim_middle_extracted() {
    let full = "```\n<MID>return x + 1;</MID>\n```";
    let code = extract_code_from_fim(full, full.len(), "MID");
    assert!(code.is_complete());
    assert_eq!(code.into_inner().value, "return x + 1;");
}

#[test]
fn test_fim_without_fence_while_streaming() {
    let code = extract_code_from_fim("<MID>let y", 4, "MID");
    assert!(!code.is_complete());
    assert_eq!(code.into_inner().value, "let y");
}

#[test]
fn test_remover_value_is_idempotent() {
    let mut remover = SurroundingsRemover::new("```js\nvar a;\n```");
    remover.remove_prefix("```");
    remover.remove_from_start_until_full_match("\n", true);
    remover.remove_suffix("```");
    assert_eq!(remover.value(), remover.value());
    assert_eq!(remover.value(), "var a;\n");
}

// ============================================================================
// Search/Replace Blocks
// ============================================================================

fn short_markers() -> SearchReplaceExtractor {
    SearchReplaceExtractor::new(SearchReplaceMarkers::new(
        "ORIGINAL",
        "=======",
        ">>>>>>> FINAL",
    ))
}

#[test]
fn test_block_completes_through_appends() {
    let extractor = short_markers();
    let mut buffer = String::new();
    let mut states = Vec::new();
    for chunk in ["ORIGINAL\nfoo\n", "=======\n", "bar\n", ">>>>>>> FINAL\n"] {
        buffer.push_str(chunk);
        states.push(extractor.extract(&buffer)[0].state);
    }

    assert_eq!(
        states,
        vec![
            BlockState::WritingOriginal,
            BlockState::WritingFinal,
            BlockState::WritingFinal,
            BlockState::Done
        ]
    );
    assert_eq!(
        extractor.extract(&buffer),
        vec![ExtractedBlock {
            state: BlockState::Done,
            original: "foo".to_string(),
            updated: "bar".to_string(),
        }]
    );
}

#[test]
fn test_block_without_final_marker_is_writing_final() {
    let blocks = short_markers().extract("ORIGINAL\nfoo\n=======\nbar");
    assert_eq!(
        blocks,
        vec![ExtractedBlock {
            state: BlockState::WritingFinal,
            original: "foo".to_string(),
            updated: "bar".to_string(),
        }]
    );
}

#[test]
fn test_default_markers_monotonic_over_every_prefix() {
    let full = "I'll make two edits.\n\
        <<<<<<< ORIGINAL\nlet a = 1;\n=======\nlet a = 2;\n>>>>>>> UPDATED\n\
        <<<<<<< ORIGINAL\nfoo();\n=======\nbar();\n>>>>>>> UPDATED\n";

    let final_blocks = extract_search_replace_blocks(full);
    assert_eq!(final_blocks.len(), 2);
    assert!(final_blocks.iter().all(ExtractedBlock::is_done));

    let mut done_before: Vec<ExtractedBlock> = Vec::new();
    for end in 0..=full.len() {
        let blocks = extract_search_replace_blocks(&full[..end]);
        let done: Vec<ExtractedBlock> = blocks.iter().filter(|b| b.is_done()).cloned().collect();

        assert!(done.len() >= done_before.len(), "done count shrank at {}", end);
        assert_eq!(&done[..done_before.len()], &done_before[..], "done block changed at {}", end);
        assert!(blocks.len() <= final_blocks.len());
        done_before = done;
    }
}

#[test]
fn test_inline_final_marker_stays_in_updated_text() {
    let full = "<<<<<<< ORIGINAL\nlog(\"a\");\n=======\n\
        log(\">>>>>>> UPDATED\");\nlog(\"b\");\n>>>>>>> UPDATED\n";
    let expected = ExtractedBlock {
        state: BlockState::Done,
        original: "log(\"a\");".to_string(),
        updated: "log(\">>>>>>> UPDATED\");\nlog(\"b\");".to_string(),
    };
    assert_eq!(extract_search_replace_blocks(full), vec![expected.clone()]);

    for end in 0..=full.len() {
        let blocks = extract_search_replace_blocks(&full[..end]);
        if let Some(block) = blocks.first() {
            if block.is_done() {
                assert_eq!(block, &expected, "block closed early at {}", end);
            } else {
                assert!(expected.original.starts_with(&block.original));
                assert!(expected.updated.starts_with(&block.updated));
            }
        }
    }
}

#[test]
fn test_prose_around_blocks_is_ignored() {
    let text = "Sure, replace it:\n<<<<<<< ORIGINAL\nx\n=======\ny\n>>>>>>> UPDATED\nThat's all.";
    let blocks = extract_search_replace_blocks(text);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].original, "x");
    assert_eq!(blocks[0].updated, "y");
}

// ============================================================================
// Reasoning Tags
// ============================================================================

#[test]
fn test_whole_string_reasoning_split() {
    let split = split_reasoning(
        "<think>I should add 1</think>The answer is 2",
        &ReasoningTags::new("<think>", "</think>"),
    );
    assert_eq!(split.visible_text, "The answer is 2");
    assert_eq!(split.reasoning_text, "I should add 1");
}

#[test]
fn test_reasoning_tag_split_tolerance() {
    let full = "<think>step 1, step 2</think>Result: 42";
    let tags = ReasoningTags::think();
    let expected = split_reasoning(full, &tags);

    for (a, b) in two_chunk_splits(full) {
        let mut extractor = ReasoningTagExtractor::new(tags.clone());
        let mid = extractor.update(a).clone();
        assert!(!mid.visible_text.contains("<"), "partial tag leaked for chunk {:?}", a);
        assert!(!mid.reasoning_text.contains("</"), "partial tag leaked for chunk {:?}", a);

        let joined = format!("{}{}", a, b);
        let end = extractor.finish(&joined);
        assert_eq!(end.visible_text, expected.visible_text);
        assert_eq!(end.reasoning_text, expected.reasoning_text);
    }
}

#[test]
fn test_reasoning_fed_one_char_at_a_time() {
    let full = "<think>step 1, step 2 → done</think>Result: 42";
    let tags = ReasoningTags::think();
    let expected = split_reasoning(full, &tags);

    let mut extractor = ReasoningTagExtractor::new(tags);
    for (buffer, _) in char_by_char(full) {
        let split = extractor.update(buffer);
        assert!(
            expected.visible_text.starts_with(&split.visible_text),
            "visible {:?} at {:?}",
            split.visible_text,
            buffer
        );
        assert!(
            expected.reasoning_text.starts_with(&split.reasoning_text),
            "reasoning {:?} at {:?}",
            split.reasoning_text,
            buffer
        );
    }

    let end = extractor.finish(full);
    assert_eq!(end.visible_text, "Result: 42");
    assert_eq!(end.reasoning_text, "step 1, step 2 → done");
}

#[test]
fn test_reasoning_cursor_never_moves_back() {
    let full = "pre <think>inner</think> post";
    let mut extractor = ReasoningTagExtractor::new(ReasoningTags::think());
    let mut cursor = 0;
    for end in 0..=full.len() {
        let split = extractor.update(&full[..end]);
        assert!(split.cursor >= cursor);
        cursor = split.cursor;
    }
    assert_eq!(extractor.split().visible_text, "pre  post");
    assert_eq!(extractor.split().reasoning_text, "inner");
}
