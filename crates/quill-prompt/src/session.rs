use crate::{
    InterceptorHandle, LifecycleGuard, PacketInterceptor, PlayerConnection, PromptKind, PromptResult,
    SessionId, Submission, SubmissionSink, Surface, VersionAdapter,
};
use anyhow::{anyhow, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub(crate) type PromptCallback = Box<dyn FnOnce(PromptResult) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Opening,
    AwaitingInput,
    Completing,
    Closed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed)
    }
}

/// Why a session is being torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownTrigger {
    Submitted,
    /// The application closed the prompt (including timeouts).
    Explicit,
    /// The player closed the container themselves.
    ClientClosed,
    /// A newer prompt of the same kind replaced this one.
    Superseded,
    Disconnect,
    OpenFailed,
    /// The client answered with the wrong number of lines.
    Malformed,
}

struct SessionInner {
    state: SessionState,
    surface: Option<Surface>,
    interceptor: Option<InterceptorHandle>,
    /// Whether any open packet reached the connection.
    delivered: bool,
}

/// One player's in-flight prompt.
pub struct PromptSession {
    id: SessionId,
    player: Uuid,
    kind: PromptKind,
    prefill: String,
    connection: Arc<dyn PlayerConnection>,
    adapter: Arc<dyn VersionAdapter>,
    interceptor: PacketInterceptor,
    guard: LifecycleGuard,
    inner: Mutex<SessionInner>,
    callback: Mutex<Option<PromptCallback>>,
}

impl PromptSession {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: SessionId,
        player: Uuid,
        kind: PromptKind,
        prefill: String,
        connection: Arc<dyn PlayerConnection>,
        adapter: Arc<dyn VersionAdapter>,
        interceptor: PacketInterceptor,
        callback: PromptCallback,
    ) -> Self {
        Self {
            id,
            player,
            kind,
            prefill,
            connection,
            adapter,
            interceptor,
            guard: LifecycleGuard::new(),
            inner: Mutex::new(SessionInner {
                state: SessionState::Idle,
                surface: None,
                interceptor: None,
                delivered: false,
            }),
            callback: Mutex::new(Some(callback)),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn player(&self) -> Uuid {
        self.player
    }

    pub fn kind(&self) -> PromptKind {
        self.kind
    }

    pub fn state(&self) -> SessionState {
        self.lock_inner().state
    }

    pub fn is_live(&self) -> bool {
        !self.guard.is_spent() && !self.state().is_terminal()
    }

    fn lock_inner(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Build the surface, attach the filter and send the open sequence.
    ///
    /// The inner lock is held throughout, so a concurrent teardown waits for
    /// the open sequence to finish before sending its revert.
    pub(crate) fn open(&self, sink: Weak<dyn SubmissionSink>) -> Result<()> {
        let mut inner = self.lock_inner();
        if self.guard.is_spent() {
            return Err(anyhow!("session {} was closed before it opened", self.id));
        }
        inner.state = SessionState::Opening;

        let surface = self
            .adapter
            .build_surface(self.connection.as_ref(), self.kind, &self.prefill, self.id)?;
        inner.surface = Some(surface.clone());

        let handle = self
            .interceptor
            .attach(self.connection.pipeline(), &surface, Arc::clone(&self.adapter), sink)?;
        inner.interceptor = Some(handle);

        for packet in self.adapter.encode_open_sequence(&surface, self.id)? {
            self.connection.send(packet)?;
            inner.delivered = true;
        }

        inner.state = SessionState::AwaitingInput;
        info!(
            session = %self.id,
            player = %self.player,
            kind = ?self.kind,
            generation = self.adapter.generation(),
            "Prompt opened"
        );
        Ok(())
    }

    /// Deliver a decoded submission. Runs on the simulation thread. Returns
    /// whether the callback ran.
    pub(crate) fn complete(&self, submission: Submission) -> bool {
        if submission.raw_lines.len() != self.kind.arity() {
            // The filter has already fired, so nothing else will close this.
            warn!(
                session = %self.id,
                lines = submission.raw_lines.len(),
                "Submission has wrong arity, failing prompt"
            );
            self.teardown(TeardownTrigger::Malformed);
            return false;
        }
        if !self.guard.try_acquire() {
            debug!(session = %self.id, "Stale submission, session already torn down");
            return false;
        }
        {
            let mut inner = self.lock_inner();
            if inner.state != SessionState::AwaitingInput {
                // Only possible if open failed halfway; finish as a failure.
                debug!(session = %self.id, state = ?inner.state, "Submission for a session that never opened");
                self.release(&mut inner, TeardownTrigger::OpenFailed);
                return false;
            }
            inner.state = SessionState::Completing;
            self.release(&mut inner, TeardownTrigger::Submitted);
        }

        let callback = self.callback.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(callback) = callback {
            let result = submission.into_result(self.kind);
            if catch_unwind(AssertUnwindSafe(move || callback(result))).is_err() {
                error!(session = %self.id, player = %self.player, "Prompt callback panicked");
            }
        }

        self.lock_inner().state = SessionState::Closed;
        info!(session = %self.id, player = %self.player, "Prompt submitted");
        true
    }

    /// Tear the session down. Only the first caller across all triggers does
    /// any work; returns whether this call was it.
    pub(crate) fn teardown(&self, trigger: TeardownTrigger) -> bool {
        if !self.guard.try_acquire() {
            debug!(session = %self.id, ?trigger, "Teardown already done");
            return false;
        }
        {
            let mut inner = self.lock_inner();
            self.release(&mut inner, trigger);
            inner.state = match trigger {
                TeardownTrigger::OpenFailed | TeardownTrigger::Malformed => SessionState::Failed,
                _ => SessionState::Closed,
            };
        }
        self.callback.lock().unwrap_or_else(|p| p.into_inner()).take();
        info!(session = %self.id, player = %self.player, ?trigger, "Prompt closed");
        true
    }

    /// Detach the filter and revert the surface. Caller holds the gate.
    fn release(&self, inner: &mut SessionInner, trigger: TeardownTrigger) {
        if let Some(handle) = inner.interceptor.take() {
            self.interceptor.detach(self.connection.pipeline(), &handle);
        }
        let Some(surface) = inner.surface.take() else {
            return;
        };
        if trigger == TeardownTrigger::Disconnect || !inner.delivered {
            return;
        }
        match self.adapter.encode_revert_sequence(&surface) {
            Ok(packets) => {
                for packet in packets {
                    if let Err(e) = self.connection.send(packet) {
                        warn!(session = %self.id, "Failed to send revert packet: {}", e);
                        break;
                    }
                }
            }
            Err(e) => warn!(session = %self.id, "Failed to encode revert sequence: {}", e),
        }
    }
}
