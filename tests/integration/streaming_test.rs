//! Streaming Integration Tests
//!
//! End-to-end runs of recorded provider streams through
//! `UnifiedStreamingService` into a session, observed through the channel
//! listener the way a UI task would observe them.

use std::io::Write;

use futures_util::stream;
use tokio::sync::mpsc;

use assistant_stream::{
    ChannelListener, ErrorKind, ProviderEvent, ReasoningTags, SessionEvent, SessionOutcome,
    SessionTable, StreamError, StreamSession, StreamingConfig, ToolParams,
    UnifiedStreamingService,
};

fn ok_chunks(parts: &[&str]) -> Vec<Result<String, StreamError>> {
    parts.iter().map(|p| Ok(p.to_string())).collect()
}

fn drain(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn final_message(events: &[SessionEvent]) -> &assistant_stream::FinalMessage {
    match events.last() {
        Some(SessionEvent::FinalMessage(message)) => message,
        other => panic!("Expected FinalMessage, got {:?}", other),
    }
}

// ============================================================================
// Tool Calls
// ============================================================================

#[tokio::test]
async fn test_openai_tool_call_fragments_assemble() {
    let mut service = UnifiedStreamingService::new("openai", "gpt-4o");
    let (listener, mut rx) = ChannelListener::new();
    let mut session = service.open_session(listener, &StreamingConfig::default());

    let input = stream::iter(ok_chunks(&[
        "data: {\"choices\": [{\"delta\": {\"tool_calls\": [{\"index\": 0, \"function\": {\"name\": \"read_\"}}]}}]}\n\n",
        "data: {\"choices\": [{\"delta\": {\"tool_calls\": [{\"index\": 0, \"id\": \"abc\", \"function\": {\"name\": \"file\"}}]}}]}\n\n",
        "data: {\"choices\": [{\"delta\": {\"tool_calls\": [{\"index\": 0, \"function\": {\"arguments\": \"{\\\"uri\\\":\"}}]}}]}\n\n",
        "data: {\"choices\": [{\"delta\": {\"tool_calls\": [{\"index\": 0, \"function\": {\"arguments\": \"\\\"a.ts\\\"}\"}}]}, \"finish_reason\": \"tool_calls\"}]}\n\n",
        "data: [DONE]\n\n",
    ]));

    let outcome = service.drive(input, &mut session).await;
    assert_eq!(outcome, SessionOutcome::Completed);

    let events = drain(&mut rx);
    let message = final_message(&events);
    let call = message.tool_call.as_ref().unwrap();
    assert_eq!(call.name, "read_file");
    assert_eq!(call.id, "abc");
    assert_eq!(call.params.get("uri"), Some(&serde_json::Value::from("a.ts")));
    assert_eq!(message.stop_reason.as_deref(), Some("tool_calls"));

    // each fragment produced a cumulative snapshot
    let partial_names: Vec<String> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Text(s) => s.tool_call.as_ref().map(|t| t.name.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(partial_names, vec!["read_", "read_file", "read_file", "read_file"]);
}

#[tokio::test]
async fn test_anthropic_thinking_text_and_tool_use() {
    let mut service = UnifiedStreamingService::new("anthropic", "claude-sonnet-4");
    let (listener, mut rx) = ChannelListener::new();
    let mut session = service.open_session(listener, &StreamingConfig::default());

    let input = stream::iter(ok_chunks(&[
        "event: message_start\ndata: {\"type\": \"message_start\", \"message\": {\"usage\": {\"input_tokens\": 20, \"output_tokens\": 1}}}\n\n",
        "event: content_block_start\ndata: {\"type\": \"content_block_start\", \"index\": 0, \"content_block\": {\"type\": \"thinking\", \"thinking\": \"\"}}\n\n",
        "event: content_block_delta\ndata: {\"type\": \"content_block_delta\", \"index\": 0, \"delta\": {\"type\": \"thinking_delta\", \"thinking\": \"Need the file.\"}}\n\n",
        "event: content_block_stop\ndata: {\"type\": \"content_block_stop\", \"index\": 0}\n\n",
        "event: content_block_start\ndata: {\"type\": \"content_block_start\", \"index\": 1, \"content_block\": {\"type\": \"text\", \"text\": \"\"}}\n\n",
        "event: content_block_delta\ndata: {\"type\": \"content_block_delta\", \"index\": 1, \"delta\": {\"type\": \"text_delta\", \"text\": \"Reading it.\"}}\n\n",
        "event: content_block_start\ndata: {\"type\": \"content_block_start\", \"index\": 2, \"content_block\": {\"type\": \"tool_use\", \"id\": \"toolu_9\", \"name\": \"read_file\", \"input\": {}}}\n\n",
        "event: content_block_delta\ndata: {\"type\": \"content_block_delta\", \"index\": 2, \"delta\": {\"type\": \"input_json_delta\", \"partial_json\": \"{\\\"uri\\\": \"}}\n\n",
        "event: content_block_delta\ndata: {\"type\": \"content_block_delta\", \"index\": 2, \"delta\": {\"type\": \"input_json_delta\", \"partial_json\": \"\\\"b.rs\\\"}\"}}\n\n",
        "event: content_block_stop\ndata: {\"type\": \"content_block_stop\", \"index\": 2}\n\n",
        "event: message_delta\ndata: {\"type\": \"message_delta\", \"delta\": {\"stop_reason\": \"tool_use\"}, \"usage\": {\"output_tokens\": 42}}\n\n",
        "event: message_stop\ndata: {\"type\": \"message_stop\"}\n\n",
    ]));

    assert_eq!(service.drive(input, &mut session).await, SessionOutcome::Completed);

    let events = drain(&mut rx);
    let message = final_message(&events);
    assert_eq!(message.full_text, "Reading it.");
    assert_eq!(message.full_reasoning, "Need the file.");
    assert_eq!(message.tool_call.as_ref().unwrap().id, "toolu_9");
    assert_eq!(
        message.tool_call.as_ref().unwrap().params.get("uri"),
        Some(&serde_json::Value::from("b.rs"))
    );
    assert_eq!(message.stop_reason.as_deref(), Some("tool_use"));
    assert_eq!(message.usage.unwrap().input_tokens, 20);
    assert_eq!(message.usage.unwrap().output_tokens, 42);
}

#[tokio::test]
async fn test_malformed_tool_arguments_degrade_to_raw() {
    let mut service = UnifiedStreamingService::new("openai", "gpt-4o");
    let (listener, mut rx) = ChannelListener::new();
    let mut session = service.open_session(listener, &StreamingConfig::default());

    let input = stream::iter(ok_chunks(&[
        "data: {\"choices\": [{\"delta\": {\"tool_calls\": [{\"index\": 0, \"id\": \"c1\", \"function\": {\"name\": \"edit\", \"arguments\": \"{\\\"uri\\\": \"}}]}}]}\n",
        "data: [DONE]\n",
    ]));

    assert_eq!(service.drive(input, &mut session).await, SessionOutcome::Completed);
    let events = drain(&mut rx);
    let call = final_message(&events).tool_call.clone().unwrap();
    assert_eq!(call.params, ToolParams::Raw("{\"uri\": ".to_string()));
}

// ============================================================================
// Reasoning
// ============================================================================

#[tokio::test]
async fn test_ollama_think_tags_split_by_default() {
    let mut service = UnifiedStreamingService::new("ollama", "deepseek-r1:14b");
    let (listener, mut rx) = ChannelListener::new();
    let mut session = service.open_session(listener, &StreamingConfig::default());

    let input = stream::iter(ok_chunks(&[
        "{\"message\": {\"role\": \"assistant\", \"content\": \"<th\"}, \"done\": false}\n",
        "{\"message\": {\"role\": \"assistant\", \"content\": \"ink>add one</thi\"}, \"done\": false}\n{\"message\": {\"role\": \"assistant\", \"content\": \"nk>The answer is 2\"}, \"done\": false}\n",
        "{\"message\": {\"role\": \"assistant\", \"content\": \"\"}, \"done\": true, \"done_reason\": \"stop\", \"prompt_eval_count\": 5, \"eval_count\": 9}\n",
    ]));

    assert_eq!(service.drive(input, &mut session).await, SessionOutcome::Completed);

    let events = drain(&mut rx);
    for event in &events {
        if let SessionEvent::Text(snapshot) = event {
            assert!(!snapshot.full_text.contains('<'), "tag leaked: {:?}", snapshot.full_text);
        }
    }
    let message = final_message(&events);
    assert_eq!(message.full_text, "The answer is 2");
    assert_eq!(message.full_reasoning, "add one");
}

#[tokio::test]
async fn test_reasoning_tags_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[reasoning_tags]\nopen = \"<reasoning>\"\nclose = \"</reasoning>\""
    )
    .unwrap();
    let config = StreamingConfig::load(file.path()).unwrap();
    assert_eq!(
        config.reasoning_tags,
        Some(ReasoningTags::new("<reasoning>", "</reasoning>"))
    );

    let mut service = UnifiedStreamingService::new("groq", "llama-3.3-70b");
    let (listener, mut rx) = ChannelListener::new();
    let mut session = service.open_session(listener, &config);

    let input = stream::iter(ok_chunks(&[
        "data: {\"choices\": [{\"delta\": {\"content\": \"<reasoning>short</reason\"}}]}\n",
        "data: {\"choices\": [{\"delta\": {\"content\": \"ing>Done.\"}, \"finish_reason\": \"stop\"}]}\n",
        "data: [DONE]\n",
    ]));
    service.drive(input, &mut session).await;

    let events = drain(&mut rx);
    let message = final_message(&events);
    assert_eq!(message.full_text, "Done.");
    assert_eq!(message.full_reasoning, "short");
}

#[tokio::test]
async fn test_gemini_thought_parts() {
    let mut service = UnifiedStreamingService::new("gemini", "gemini-2.5-flash");
    let (listener, mut rx) = ChannelListener::new();
    let mut session = service.open_session(listener, &StreamingConfig::default());

    let input = stream::iter(ok_chunks(&[
        "data: {\"candidates\": [{\"content\": {\"role\": \"model\", \"parts\": [{\"text\": \"Considering\", \"thought\": true}]}}]}\r\n\r\n",
        "data: {\"candidates\": [{\"content\": {\"role\": \"model\", \"parts\": [{\"text\": \"Hi!\"}]}, \"finishReason\": \"STOP\"}], \"usageMetadata\": {\"promptTokenCount\": 4, \"candidatesTokenCount\": 2}}\r\n\r\n",
    ]));

    assert_eq!(service.drive(input, &mut session).await, SessionOutcome::Completed);
    let events = drain(&mut rx);
    let message = final_message(&events);
    assert_eq!(message.full_text, "Hi!");
    assert_eq!(message.full_reasoning, "Considering");
    assert_eq!(message.stop_reason.as_deref(), Some("stop"));
}

// ============================================================================
// Terminal Behaviour
// ============================================================================

#[tokio::test]
async fn test_abort_after_two_texts_silences_session() {
    let service = UnifiedStreamingService::new("openai", "gpt-4o");
    let (listener, mut rx) = ChannelListener::new();
    let mut session = service.open_session(listener, &StreamingConfig::default());

    session.handle_event(ProviderEvent::text("one "));
    session.handle_event(ProviderEvent::text("two"));
    session.abort();
    assert!(service.cancellation_token().is_cancelled());

    session.handle_event(ProviderEvent::text("three"));
    session.handle_event(ProviderEvent::Error {
        message: "late failure".to_string(),
        code: None,
        status: Some(500),
    });
    session.handle_event(ProviderEvent::Complete { stop_reason: None });

    let events = drain(&mut rx);
    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], SessionEvent::Text(_)));
    assert!(matches!(events[1], SessionEvent::Text(_)));
    assert_eq!(events[2], SessionEvent::Abort);
    assert_eq!(session.outcome(), SessionOutcome::Aborted);
}

#[tokio::test]
async fn test_cancel_while_stream_is_pending() {
    let mut service = UnifiedStreamingService::new("anthropic", "claude-sonnet-4");
    let (listener, mut rx) = ChannelListener::new();
    let mut session = service.open_session(listener, &StreamingConfig::default());
    let token = service.cancellation_token();

    let first = stream::iter(ok_chunks(&[
        "data: {\"type\": \"content_block_delta\", \"index\": 0, \"delta\": {\"type\": \"text_delta\", \"text\": \"Hel\"}}\n",
    ]));
    let input = futures_util::StreamExt::chain(first, stream::pending());

    let cancel = tokio::spawn(async move {
        tokio::task::yield_now().await;
        token.cancel();
    });
    let outcome = service.drive(input, &mut session).await;
    cancel.await.unwrap();

    assert_eq!(outcome, SessionOutcome::Aborted);
    let events = drain(&mut rx);
    assert_eq!(events.last(), Some(&SessionEvent::Abort));
}

#[tokio::test]
async fn test_empty_stream_reports_empty_response() {
    let mut service = UnifiedStreamingService::new("openai", "gpt-4o");
    let (listener, mut rx) = ChannelListener::new();
    let mut session = service.open_session(listener, &StreamingConfig::default());

    let input = stream::iter(ok_chunks(&[
        "data: {\"choices\": [{\"delta\": {\"content\": \"\"}, \"finish_reason\": \"stop\"}]}\n",
        "data: [DONE]\n",
    ]));
    let outcome = service.drive(input, &mut session).await;
    assert_eq!(outcome, SessionOutcome::Failed(ErrorKind::EmptyResponse));

    match drain(&mut rx).last() {
        Some(SessionEvent::Error(report)) => {
            assert_eq!(report.kind, ErrorKind::EmptyResponse);
            assert_eq!(report.full_error, StreamError::EmptyResponse);
        }
        other => panic!("Expected Error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_in_band_credential_error_is_normalized() {
    let mut service = UnifiedStreamingService::new("anthropic", "claude-sonnet-4");
    let (listener, mut rx) = ChannelListener::new();
    let mut session = service.open_session(listener, &StreamingConfig::default());

    let input = stream::iter(ok_chunks(&[
        "data: {\"type\": \"content_block_delta\", \"index\": 0, \"delta\": {\"type\": \"text_delta\", \"text\": \"Partial\"}}\n",
        "data: {\"type\": \"error\", \"error\": {\"type\": \"authentication_error\", \"message\": \"invalid x-api-key\"}}\n",
        "data: {\"type\": \"content_block_delta\", \"index\": 0, \"delta\": {\"type\": \"text_delta\", \"text\": \" ignored\"}}\n",
    ]));
    let outcome = service.drive(input, &mut session).await;
    assert_eq!(outcome, SessionOutcome::Failed(ErrorKind::InvalidCredential));

    let events = drain(&mut rx);
    match events.last() {
        Some(SessionEvent::Error(report)) => {
            assert_eq!(report.partial.full_text, "Partial");
            assert!(report.message.starts_with("Invalid API key for anthropic."));
        }
        other => panic!("Expected Error, got {:?}", other),
    }
    assert_eq!(events.len(), 2);
}

// ============================================================================
// Session Table
// ============================================================================

#[test]
fn test_concurrent_sessions_share_nothing() {
    let mut table = SessionTable::new();
    let (chat_a, mut rx_a) = ChannelListener::new();
    let (chat_b, mut rx_b) = ChannelListener::new();
    let a = table.open("openai", chat_a, None);
    let b = table.open("ollama", chat_b, Some(ReasoningTags::think()));

    table.dispatch(a, ProviderEvent::text("alpha")).unwrap();
    table.dispatch(b, ProviderEvent::text("<think>x</think>beta")).unwrap();
    table
        .dispatch(a, ProviderEvent::Complete { stop_reason: None })
        .unwrap();

    assert!(!table.contains(a));
    assert!(table.contains(b));
    assert_eq!(final_message(&drain(&mut rx_a)).full_text, "alpha");

    table.finish(b).unwrap();
    let message = final_message(&drain(&mut rx_b)).clone();
    assert_eq!(message.full_text, "beta");
    assert_eq!(message.full_reasoning, "x");
    assert!(table.is_empty());
}

#[test]
fn test_session_usable_without_service() {
    let (listener, mut rx) = ChannelListener::new();
    let mut session = StreamSession::new("gemini", listener, None);
    session.handle_event(ProviderEvent::reasoning("only thoughts"));
    session.finish();

    assert_eq!(
        final_message(&drain(&mut rx)).full_reasoning,
        "only thoughts"
    );
}
