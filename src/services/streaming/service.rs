//! Unified Streaming Service
//!
//! Drives one provider stream end to end: raw transport chunks are framed
//! into lines, adapted into [`ProviderEvent`]s and folded into a
//! [`StreamSession`].

use std::fmt;

use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use assistant_stream_core::{AdapterError, ProviderEvent, StreamAdapter, StreamError};

use super::factory::AdapterFactory;
use super::lines::SseLineBuffer;
use super::session::{SessionOutcome, StreamListener, StreamSession};
use crate::models::settings::StreamingConfig;

/// Unified streaming service that processes provider streams through adapters.
pub struct UnifiedStreamingService {
    /// Provider name for logging and error normalization
    provider: String,
    /// Model name for thinking detection
    model: String,
    /// The adapter for this provider/model
    adapter: Box<dyn StreamAdapter>,
    lines: SseLineBuffer,
    cancel: CancellationToken,
}

impl UnifiedStreamingService {
    /// Create a new streaming service.
    ///
    /// # Arguments
    /// * `provider` - Provider name (openai, anthropic, ollama, gemini, ...)
    /// * `model` - Model identifier
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        let provider = provider.into();
        let model = model.into();
        let adapter = AdapterFactory::create(&provider, &model);

        Self {
            provider,
            model,
            adapter,
            lines: SseLineBuffer::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Open a session whose aborter cancels this service's token.
    pub fn open_session<L: StreamListener>(
        &self,
        listener: L,
        config: &StreamingConfig,
    ) -> StreamSession<L> {
        let tags = config.reasoning_tags_for(&self.provider, &self.model);
        let mut session = StreamSession::new(self.provider.clone(), listener, tags);
        let token = self.cancel.clone();
        session.set_aborter(Box::new(move || -> anyhow::Result<()> {
            token.cancel();
            Ok(())
        }));
        session
    }

    /// Token that aborts the stream being driven when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Adapt one complete line.
    pub fn process_line(&mut self, line: &str) -> Result<Vec<ProviderEvent>, AdapterError> {
        self.adapter.adapt(line)
    }

    /// Frame a raw chunk into lines and feed the resulting events to `session`.
    ///
    /// Lines the adapter cannot decode are skipped.
    pub fn process_chunk<L: StreamListener>(&mut self, chunk: &str, session: &mut StreamSession<L>) {
        for line in self.lines.push(chunk) {
            self.feed_line(&line, session);
        }
    }

    /// Flush the last unterminated line and finish the session if the
    /// provider never signalled completion.
    pub fn finish<L: StreamListener>(&mut self, session: &mut StreamSession<L>) {
        if let Some(line) = self.lines.finish() {
            self.feed_line(&line, session);
        }
        if !session.is_terminal() {
            tracing::debug!(provider = %self.provider, "stream ended without a completion event");
            session.finish();
        }
    }

    /// Pull `chunks` to the end, or until the session reaches a terminal
    /// state or the cancellation token fires.
    pub async fn drive<S, L>(&mut self, chunks: S, session: &mut StreamSession<L>) -> SessionOutcome
    where
        S: Stream<Item = Result<String, StreamError>>,
        L: StreamListener,
    {
        futures_util::pin_mut!(chunks);
        let cancel = self.cancel.clone();

        while !session.is_terminal() {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    session.abort();
                }
                next = chunks.next() => match next {
                    Some(Ok(chunk)) => self.process_chunk(&chunk, session),
                    Some(Err(err)) => session.fail(err),
                    None => self.finish(session),
                },
            }
        }

        session.outcome()
    }

    /// Check if the current provider/model supports thinking blocks.
    pub fn supports_thinking(&self) -> bool {
        self.adapter.supports_thinking()
    }

    /// Check if the current provider/model supports tool calls.
    pub fn supports_tools(&self) -> bool {
        self.adapter.supports_tools()
    }

    /// Get the provider name.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Reset adapter, framing and cancellation state for a new stream.
    pub fn reset(&mut self) {
        self.adapter.reset();
        self.lines = SseLineBuffer::new();
        self.cancel = CancellationToken::new();
    }

    fn feed_line<L: StreamListener>(&mut self, line: &str, session: &mut StreamSession<L>) {
        match self.adapter.adapt(line) {
            Ok(events) => {
                for event in events {
                    session.handle_event(event);
                }
            }
            Err(e) => {
                let err = StreamError::from(e);
                tracing::warn!(provider = %self.provider, error = %err, "skipping undecodable stream line");
            }
        }
    }
}

impl fmt::Debug for UnifiedStreamingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnifiedStreamingService")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("supports_thinking", &self.supports_thinking())
            .finish()
    }
}
