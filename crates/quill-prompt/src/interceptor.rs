use crate::{MatchOutcome, MatchProgress, PromptConfig, PromptKind, SessionId, Submission, Surface, VersionAdapter};
use quill_protocol_core::{InboundFilter, Pipeline, PipelineError, RawPacket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Receives what an attached filter recognises. Called from the network
/// context, so implementations must only hand off.
pub trait SubmissionSink: Send + Sync {
    fn submitted(&self, session: SessionId, submission: Submission);
    fn closed_by_client(&self, session: SessionId);
}

/// Identity of an attached filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptorHandle {
    pub name: String,
    pub session: SessionId,
}

/// Installs and removes prompt filters on a connection's inbound pipeline.
#[derive(Debug, Clone)]
pub struct PacketInterceptor {
    prefix: String,
    dispatch_stage: String,
}

impl PacketInterceptor {
    pub fn new(prefix: impl Into<String>, dispatch_stage: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            dispatch_stage: dispatch_stage.into(),
        }
    }

    pub fn from_config(config: &PromptConfig) -> Self {
        Self::new(config.filter_prefix.clone(), config.dispatch_stage.clone())
    }

    /// One stage name per prompt kind, so a player's rename and sign prompts
    /// never collide.
    pub fn stage_name(&self, kind: PromptKind) -> String {
        format!("{}_{}", self.prefix, kind.slug())
    }

    /// Insert a filter for `surface` right before the dispatch stage. A
    /// leftover stage with the same name is replaced.
    pub fn attach(
        &self,
        pipeline: &Pipeline,
        surface: &Surface,
        adapter: Arc<dyn VersionAdapter>,
        sink: Weak<dyn SubmissionSink>,
    ) -> Result<InterceptorHandle, PipelineError> {
        let name = self.stage_name(surface.kind);
        if pipeline.remove_if(&name, |_| true) {
            warn!(stage = %name, session = %surface.session, "Replaced leftover prompt filter");
        }
        let filter = PromptFilter {
            session: surface.session,
            progress: Mutex::new(MatchProgress::for_surface(surface)),
            surface: surface.clone(),
            adapter,
            signalled: AtomicBool::new(false),
            sink,
        };
        pipeline.add_before(&self.dispatch_stage, &name, Arc::new(filter))?;
        debug!(stage = %name, session = %surface.session, "Attached prompt filter");
        Ok(InterceptorHandle {
            name,
            session: surface.session,
        })
    }

    /// Remove the filter, but only if it is still the one `handle` installed.
    pub fn detach(&self, pipeline: &Pipeline, handle: &InterceptorHandle) -> bool {
        let owner = handle.session.0;
        let removed = pipeline.remove_if(&handle.name, |f| f.owner() == Some(owner));
        if removed {
            debug!(stage = %handle.name, session = %handle.session, "Detached prompt filter");
        } else {
            debug!(stage = %handle.name, session = %handle.session, "Prompt filter already gone");
        }
        removed
    }
}

struct PromptFilter {
    session: SessionId,
    surface: Surface,
    adapter: Arc<dyn VersionAdapter>,
    progress: Mutex<MatchProgress>,
    /// Set once a submission or close has been handed off.
    signalled: AtomicBool,
    sink: Weak<dyn SubmissionSink>,
}

impl PromptFilter {
    fn signal(&self, deliver: impl FnOnce(&dyn SubmissionSink)) {
        if self.signalled.swap(true, Ordering::AcqRel) {
            return;
        }
        match self.sink.upgrade() {
            Some(sink) => deliver(sink.as_ref()),
            None => debug!(session = %self.session, "Prompt engine dropped, ignoring match"),
        }
    }
}

impl InboundFilter for PromptFilter {
    fn inspect(&self, packet: &RawPacket) {
        if self.signalled.load(Ordering::Acquire) {
            return;
        }
        let outcome = {
            let mut progress = self.progress.lock().unwrap_or_else(|p| p.into_inner());
            self.adapter
                .match_submission(packet, &self.surface, self.session, &mut progress)
        };
        match outcome {
            MatchOutcome::NoMatch => {}
            MatchOutcome::Progress => trace!(session = %self.session, "Prompt input updated"),
            MatchOutcome::Submitted(submission) => {
                self.signal(|sink| sink.submitted(self.session, submission))
            }
            MatchOutcome::Closed => self.signal(|sink| sink.closed_by_client(self.session)),
        }
    }

    fn owner(&self) -> Option<Uuid> {
        Some(self.session.0)
    }
}
