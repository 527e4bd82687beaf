use crate::session::{PromptSession, SessionState, TeardownTrigger};
use crate::{
    AdapterRegistry, ConnectionRegistry, PacketInterceptor, PromptConfig, PromptError, PromptKind,
    PromptResult, Scheduler, SessionId, Submission, SubmissionSink, VersionAdapter,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Front door of the prompt engine.
///
/// Cheap to clone; clones share sessions.
#[derive(Clone)]
pub struct PromptEngine {
    shared: Arc<EngineShared>,
}

struct EngineShared {
    me: Weak<EngineShared>,
    config: PromptConfig,
    adapters: AdapterRegistry,
    adapter: OnceLock<Arc<dyn VersionAdapter>>,
    interceptor: PacketInterceptor,
    connections: Arc<dyn ConnectionRegistry>,
    scheduler: Arc<dyn Scheduler>,
    /// Latest session per (player, kind), live or not. Entries go away when
    /// superseded or when the player disconnects.
    sessions: Mutex<HashMap<(Uuid, PromptKind), Arc<PromptSession>>>,
}

impl PromptEngine {
    pub fn new(
        config: PromptConfig,
        adapters: AdapterRegistry,
        connections: Arc<dyn ConnectionRegistry>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let interceptor = PacketInterceptor::from_config(&config);
        let shared = Arc::new_cyclic(|me| EngineShared {
            me: me.clone(),
            config,
            adapters,
            adapter: OnceLock::new(),
            interceptor,
            connections,
            scheduler,
            sessions: Mutex::new(HashMap::new()),
        });
        Self { shared }
    }

    /// Engine over every built-in dialect.
    pub fn with_defaults(
        config: PromptConfig,
        connections: Arc<dyn ConnectionRegistry>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let adapters = AdapterRegistry::with_defaults(&config);
        Self::new(config, adapters, connections, scheduler)
    }

    /// The adapter for the configured server version, resolved on first use.
    pub fn adapter(&self) -> Result<Arc<dyn VersionAdapter>, PromptError> {
        self.shared.adapter()
    }

    /// Show `player` a prompt. Returns as soon as the open sequence is
    /// queued; `on_submit` runs later on the simulation thread, at most once
    /// and only if the player submits.
    pub fn open_prompt(
        &self,
        player: Uuid,
        kind: PromptKind,
        prefill: impl Into<String>,
        on_submit: impl FnOnce(PromptResult) + Send + 'static,
    ) -> Result<SessionId, PromptError> {
        let shared = &self.shared;
        let adapter = shared.adapter()?;
        if !adapter.supports(kind) {
            return Err(PromptError::UnsupportedKind {
                kind,
                generation: adapter.generation(),
            });
        }
        let connection = shared
            .connections
            .connection(player)
            .ok_or(PromptError::PlayerOffline(player))?;

        let id = SessionId::new();
        let session = Arc::new(PromptSession::new(
            id,
            player,
            kind,
            prefill.into(),
            connection,
            adapter,
            shared.interceptor.clone(),
            Box::new(on_submit),
        ));

        let previous = shared.lock_sessions().insert((player, kind), Arc::clone(&session));
        if let Some(previous) = previous {
            if previous.teardown(TeardownTrigger::Superseded) {
                info!(session = %previous.id(), by = %id, "Prompt superseded");
            }
        }

        let sink: Weak<dyn SubmissionSink> = shared.me.clone();
        match session.open(sink) {
            Ok(()) => Ok(id),
            Err(e) => {
                error!(session = %id, player = %player, kind = ?kind, "Failed to open prompt: {:#}", e);
                session.teardown(TeardownTrigger::OpenFailed);
                Err(PromptError::OpenFailed(e))
            }
        }
    }

    /// Close a prompt without a result. Idempotent; returns whether this
    /// call closed it.
    pub fn close(&self, session: SessionId) -> bool {
        self.shared.teardown_by_id(session, TeardownTrigger::Explicit)
    }

    /// Close every prompt `player` has open. Returns how many were closed.
    pub fn close_player(&self, player: Uuid) -> usize {
        let sessions: Vec<_> = self
            .shared
            .lock_sessions()
            .iter()
            .filter(|((owner, _), _)| *owner == player)
            .map(|(_, session)| Arc::clone(session))
            .collect();
        sessions
            .iter()
            .filter(|session| session.teardown(TeardownTrigger::Explicit))
            .count()
    }

    /// The player's connection is gone: tear down without sending anything
    /// and forget the player's sessions. Returns how many were still live.
    pub fn on_disconnect(&self, player: Uuid) -> usize {
        let removed: Vec<_> = {
            let mut sessions = self.shared.lock_sessions();
            let keys: Vec<_> = sessions.keys().filter(|(owner, _)| *owner == player).copied().collect();
            keys.iter().filter_map(|key| sessions.remove(key)).collect()
        };
        removed
            .iter()
            .filter(|session| session.teardown(TeardownTrigger::Disconnect))
            .count()
    }

    pub fn active_session(&self, player: Uuid, kind: PromptKind) -> Option<SessionId> {
        self.shared
            .lock_sessions()
            .get(&(player, kind))
            .filter(|session| session.is_live())
            .map(|session| session.id())
    }

    pub fn session_state(&self, session: SessionId) -> Option<SessionState> {
        self.shared.find(session).map(|s| s.state())
    }
}

impl EngineShared {
    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<(Uuid, PromptKind), Arc<PromptSession>>> {
        self.sessions.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn adapter(&self) -> Result<Arc<dyn VersionAdapter>, PromptError> {
        if let Some(adapter) = self.adapter.get() {
            return Ok(Arc::clone(adapter));
        }
        let resolved = self.adapters.resolve_str(&self.config.server_version)?;
        info!(
            version = %self.config.server_version,
            generation = resolved.generation(),
            "Resolved prompt adapter"
        );
        Ok(Arc::clone(self.adapter.get_or_init(|| resolved)))
    }

    fn find(&self, id: SessionId) -> Option<Arc<PromptSession>> {
        self.lock_sessions().values().find(|s| s.id() == id).cloned()
    }

    fn teardown_by_id(&self, id: SessionId, trigger: TeardownTrigger) -> bool {
        match self.find(id) {
            Some(session) => session.teardown(trigger),
            None => {
                debug!(session = %id, ?trigger, "No such session");
                false
            }
        }
    }

    fn complete(&self, id: SessionId, submission: Submission) {
        match self.find(id) {
            Some(session) => {
                session.complete(submission);
            }
            None => debug!(session = %id, "Stale submission for a forgotten session"),
        }
    }

    /// Hop to the simulation thread.
    fn on_next_tick(&self, task: impl FnOnce(&EngineShared) + Send + 'static) {
        let me = self.me.clone();
        self.scheduler.run_next_tick(Box::new(move || {
            if let Some(shared) = me.upgrade() {
                task(&shared);
            }
        }));
    }
}

impl SubmissionSink for EngineShared {
    fn submitted(&self, session: SessionId, submission: Submission) {
        debug!(session = %session, "Submission matched, scheduling completion");
        self.on_next_tick(move |shared| shared.complete(session, submission));
    }

    fn closed_by_client(&self, session: SessionId) {
        debug!(session = %session, "Client closed prompt, scheduling teardown");
        self.on_next_tick(move |shared| {
            shared.teardown_by_id(session, TeardownTrigger::ClientClosed);
        });
    }
}
