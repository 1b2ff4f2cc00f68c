//! Stream Session
//!
//! One `StreamSession` per outbound request. It folds normalized
//! [`ProviderEvent`]s into running text, reasoning and tool-call state and
//! reports to a [`StreamListener`]:
//!
//! - `on_text` any number of times, always with the complete value so far
//! - then exactly one of `on_final_message`, `on_error` or `on_abort`
//!
//! Once a terminal callback has fired the session is frozen and every later
//! event is dropped.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use assistant_stream_core::{ErrorKind, ProviderEvent, StreamError};

use super::tool_call::{ToolCall, ToolCallAccumulator};
use crate::services::extraction::{ReasoningTagExtractor, ReasoningTags};

/// Transport cancellation hook, attached once the transport exists.
pub type Aborter = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

/// Everything accumulated so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamSnapshot {
    pub full_text: String,
    pub full_reasoning: String,
    /// Tool call still being streamed, if any
    pub tool_call: Option<ToolCallAccumulator>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub reasoning_tokens: Option<u32>,
}

/// Delivered once through `on_final_message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalMessage {
    pub full_text: String,
    pub full_reasoning: String,
    pub tool_call: Option<ToolCall>,
    pub usage: Option<TokenUsage>,
    pub stop_reason: Option<String>,
}

/// Delivered once through `on_error`.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    pub full_error: StreamError,
    /// Last good partial interpretation, kept for display next to the message
    pub partial: StreamSnapshot,
}

/// Receiver of session callbacks.
pub trait StreamListener {
    fn on_text(&mut self, snapshot: &StreamSnapshot);

    fn on_final_message(&mut self, message: &FinalMessage);

    fn on_error(&mut self, report: &ErrorReport);

    fn on_abort(&mut self) {}
}

/// Session callbacks as values, for listeners living on another task.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Text(StreamSnapshot),
    FinalMessage(FinalMessage),
    Error(ErrorReport),
    Abort,
}

/// Listener forwarding every callback through an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelListener {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("session event receiver dropped");
        }
    }
}

impl StreamListener for ChannelListener {
    fn on_text(&mut self, snapshot: &StreamSnapshot) {
        self.send(SessionEvent::Text(snapshot.clone()));
    }

    fn on_final_message(&mut self, message: &FinalMessage) {
        self.send(SessionEvent::FinalMessage(message.clone()));
    }

    fn on_error(&mut self, report: &ErrorReport) {
        self.send(SessionEvent::Error(report.clone()));
    }

    fn on_abort(&mut self) {
        self.send(SessionEvent::Abort);
    }
}

/// How a session ended, if it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    Pending,
    Completed,
    Failed(ErrorKind),
    Aborted,
}

/// Accumulator and callback gate for one request.
pub struct StreamSession<L: StreamListener> {
    provider: String,
    listener: L,
    /// Present when the model embeds reasoning in its text
    reasoning: Option<ReasoningTagExtractor>,
    /// Text exactly as streamed, tags included
    raw_text: String,
    /// Reasoning delivered on the provider's own channel
    native_reasoning: String,
    tool_call: Option<ToolCallAccumulator>,
    usage: Option<TokenUsage>,
    stop_reason: Option<String>,
    aborter: Option<Aborter>,
    outcome: SessionOutcome,
}

impl<L: StreamListener> StreamSession<L> {
    pub fn new(provider: impl Into<String>, listener: L, reasoning_tags: Option<ReasoningTags>) -> Self {
        Self {
            provider: provider.into(),
            listener,
            reasoning: reasoning_tags.map(ReasoningTagExtractor::new),
            raw_text: String::new(),
            native_reasoning: String::new(),
            tool_call: None,
            usage: None,
            stop_reason: None,
            aborter: None,
            outcome: SessionOutcome::Pending,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }

    pub fn outcome(&self) -> SessionOutcome {
        self.outcome
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome != SessionOutcome::Pending
    }

    pub fn has_aborter(&self) -> bool {
        self.aborter.is_some()
    }

    /// Attach the transport's cancel hook.
    ///
    /// If the session was already aborted the hook runs immediately; if it
    /// already completed or failed the hook is dropped.
    pub fn set_aborter(&mut self, aborter: Aborter) {
        match self.outcome {
            SessionOutcome::Pending => self.aborter = Some(aborter),
            SessionOutcome::Aborted => run_aborter(aborter),
            SessionOutcome::Completed | SessionOutcome::Failed(_) => {}
        }
    }

    /// Current accumulated state.
    pub fn snapshot(&self) -> StreamSnapshot {
        let (full_text, full_reasoning) = match &self.reasoning {
            Some(extractor) => {
                let split = extractor.split();
                (
                    split.visible_text.clone(),
                    format!("{}{}", self.native_reasoning, split.reasoning_text),
                )
            }
            None => (self.raw_text.clone(), self.native_reasoning.clone()),
        };
        StreamSnapshot {
            full_text,
            full_reasoning,
            tool_call: self.tool_call.clone(),
        }
    }

    /// Fold one provider event into the session.
    pub fn handle_event(&mut self, event: ProviderEvent) {
        if self.is_terminal() {
            tracing::debug!(
                provider = %self.provider,
                outcome = ?self.outcome,
                "event after terminal callback suppressed"
            );
            return;
        }

        match event {
            ProviderEvent::TextDelta { content } => {
                self.raw_text.push_str(&content);
                if let Some(extractor) = self.reasoning.as_mut() {
                    extractor.update(&self.raw_text);
                }
                self.emit_text();
            }
            ProviderEvent::ReasoningDelta { content } => {
                self.native_reasoning.push_str(&content);
                self.emit_text();
            }
            ProviderEvent::ToolCallDelta {
                index,
                id,
                name,
                arguments,
            } => {
                if index != 0 {
                    tracing::debug!(index, "only the first tool call is kept");
                    return;
                }
                self.tool_call.get_or_insert_with(ToolCallAccumulator::new).push_fragment(
                    id.as_deref(),
                    name.as_deref(),
                    arguments.as_deref(),
                );
                self.emit_text();
            }
            ProviderEvent::ToolCallEnd { index } => {
                if index == 0 {
                    if let Some(tool_call) = self.tool_call.as_mut() {
                        tool_call.mark_done();
                    }
                }
            }
            ProviderEvent::Usage {
                input_tokens,
                output_tokens,
                reasoning_tokens,
            } => {
                self.usage = Some(TokenUsage {
                    input_tokens,
                    output_tokens,
                    reasoning_tokens,
                });
            }
            ProviderEvent::Error {
                message,
                code,
                status,
            } => {
                let err = StreamError::from_provider(&self.provider, message, code, status);
                self.fail(err);
            }
            ProviderEvent::Complete { stop_reason } => {
                if stop_reason.is_some() {
                    self.stop_reason = stop_reason;
                }
                self.finish();
            }
        }
    }

    /// Close the session successfully.
    ///
    /// A stream that produced no text, no reasoning and no tool call is
    /// reported as [`StreamError::EmptyResponse`] instead.
    pub fn finish(&mut self) {
        if self.is_terminal() {
            return;
        }

        if let Some(extractor) = self.reasoning.as_mut() {
            extractor.finish(&self.raw_text);
        }
        if let Some(tool_call) = self.tool_call.as_mut() {
            tool_call.mark_done();
        }

        let snapshot = self.snapshot();
        let tool_call = self.tool_call.as_ref().and_then(ToolCallAccumulator::to_tool_call);

        if snapshot.full_text.is_empty() && snapshot.full_reasoning.is_empty() && tool_call.is_none() {
            self.fail(StreamError::EmptyResponse);
            return;
        }

        let message = FinalMessage {
            full_text: snapshot.full_text,
            full_reasoning: snapshot.full_reasoning,
            tool_call,
            usage: self.usage,
            stop_reason: self.stop_reason.clone(),
        };

        self.outcome = SessionOutcome::Completed;
        self.aborter = None;
        tracing::debug!(
            provider = %self.provider,
            text_len = message.full_text.len(),
            reasoning_len = message.full_reasoning.len(),
            tool = message.tool_call.as_ref().map(|c| c.name.as_str()),
            "stream session completed"
        );
        self.listener.on_final_message(&message);
    }

    /// Close the session with an error. [`StreamError::Aborted`] aborts
    /// instead of reporting.
    pub fn fail(&mut self, err: StreamError) {
        if self.is_terminal() {
            return;
        }
        if err == StreamError::Aborted {
            self.abort();
            return;
        }

        let report = ErrorReport {
            kind: err.kind(),
            message: err.to_string(),
            partial: self.snapshot(),
            full_error: err,
        };

        self.outcome = SessionOutcome::Failed(report.kind);
        self.aborter = None;
        tracing::warn!(provider = %self.provider, kind = ?report.kind, error = %report.message, "stream session failed");
        self.listener.on_error(&report);
    }

    /// Cancel the request. Runs the aborter best-effort and silences the
    /// session for good.
    pub fn abort(&mut self) {
        if self.is_terminal() {
            return;
        }

        self.outcome = SessionOutcome::Aborted;
        if let Some(aborter) = self.aborter.take() {
            run_aborter(aborter);
        }
        tracing::debug!(provider = %self.provider, "stream session aborted");
        self.listener.on_abort();
    }

    fn emit_text(&mut self) {
        let snapshot = self.snapshot();
        self.listener.on_text(&snapshot);
    }
}

pub(crate) fn run_aborter(aborter: Aborter) {
    if let Err(e) = aborter() {
        tracing::warn!(error = %e, "transport aborter failed");
    }
}
