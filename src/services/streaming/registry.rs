//! Session Table
//!
//! Open sessions keyed by request id. Each entry is created when a request is
//! sent and removed as soon as it reaches a terminal callback. A request
//! aborted before its transport attached a cancel hook leaves a tombstone, so
//! the hook still runs when it arrives.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use futures_util::Stream;

use assistant_stream_core::{ProviderEvent, StreamError};

use super::service::UnifiedStreamingService;
use super::session::{run_aborter, Aborter, SessionOutcome, StreamListener, StreamSession};
use crate::services::extraction::ReasoningTags;

/// Identifier of one outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionTableError {
    /// Never opened, or already closed by a terminal callback
    #[error("No open stream session: {0}")]
    Unknown(RequestId),
}

/// Explicitly owned table of open sessions.
pub struct SessionTable<L: StreamListener> {
    sessions: HashMap<RequestId, StreamSession<L>>,
    /// Aborted while no aborter was attached
    aborted_early: HashSet<RequestId>,
}

impl<L: StreamListener> Default for SessionTable<L> {
    fn default() -> Self {
        Self {
            sessions: HashMap::new(),
            aborted_early: HashSet::new(),
        }
    }
}

impl<L: StreamListener> SessionTable<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for a request about to be sent.
    pub fn open(
        &mut self,
        provider: &str,
        listener: L,
        reasoning_tags: Option<ReasoningTags>,
    ) -> RequestId {
        let id = RequestId::new();
        self.sessions
            .insert(id, StreamSession::new(provider, listener, reasoning_tags));
        tracing::debug!(request = %id, provider, "stream session opened");
        id
    }

    pub fn get(&self, id: RequestId) -> Option<&StreamSession<L>> {
        self.sessions.get(&id)
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Attach the transport's cancel hook.
    ///
    /// A request that was already aborted runs the hook immediately.
    pub fn set_aborter(&mut self, id: RequestId, aborter: Aborter) -> Result<(), SessionTableError> {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.set_aborter(aborter);
            return Ok(());
        }
        if self.aborted_early.remove(&id) {
            tracing::debug!(request = %id, "aborter attached after abort, running it now");
            run_aborter(aborter);
            return Ok(());
        }
        Err(SessionTableError::Unknown(id))
    }

    /// Route one provider event to its session.
    pub fn dispatch(&mut self, id: RequestId, event: ProviderEvent) -> Result<(), SessionTableError> {
        self.with_session(id, |session| session.handle_event(event))
    }

    pub fn finish(&mut self, id: RequestId) -> Result<(), SessionTableError> {
        self.with_session(id, StreamSession::finish)
    }

    pub fn fail(&mut self, id: RequestId, err: StreamError) -> Result<(), SessionTableError> {
        self.with_session(id, |session| session.fail(err))
    }

    pub fn abort(&mut self, id: RequestId) -> Result<(), SessionTableError> {
        self.with_session(id, StreamSession::abort)
    }

    /// Frame one raw chunk through `service` into the session.
    pub fn process_chunk(
        &mut self,
        id: RequestId,
        service: &mut UnifiedStreamingService,
        chunk: &str,
    ) -> Result<(), SessionTableError> {
        self.with_session(id, |session| service.process_chunk(chunk, session))
    }

    /// Drive the session with `service` until it reaches a terminal state.
    pub async fn drive<S>(
        &mut self,
        id: RequestId,
        service: &mut UnifiedStreamingService,
        chunks: S,
    ) -> Result<SessionOutcome, SessionTableError>
    where
        S: Stream<Item = Result<String, StreamError>>,
    {
        let session = self.session_mut(id)?;
        let outcome = service.drive(chunks, session).await;
        self.sessions.remove(&id);
        tracing::debug!(request = %id, ?outcome, "stream session closed");
        Ok(outcome)
    }

    fn session_mut(&mut self, id: RequestId) -> Result<&mut StreamSession<L>, SessionTableError> {
        self.sessions
            .get_mut(&id)
            .ok_or(SessionTableError::Unknown(id))
    }

    fn with_session(
        &mut self,
        id: RequestId,
        f: impl FnOnce(&mut StreamSession<L>),
    ) -> Result<(), SessionTableError> {
        let session = self.session_mut(id)?;
        let had_aborter = session.has_aborter();
        f(session);
        if session.is_terminal() {
            if session.outcome() == SessionOutcome::Aborted && !had_aborter {
                self.aborted_early.insert(id);
            }
            self.sessions.remove(&id);
            tracing::debug!(request = %id, "stream session closed");
        }
        Ok(())
    }
}
