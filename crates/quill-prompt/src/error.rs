use crate::PromptKind;
use thiserror::Error;
use uuid::Uuid;

/// Errors reported synchronously from `open_prompt`.
///
/// Stale submissions and teardown races are not errors; they are logged and
/// dropped.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("no protocol adapter for {0}")]
    UnsupportedVersion(String),
    #[error("{kind:?} prompts are not available on {generation}")]
    UnsupportedKind {
        kind: PromptKind,
        generation: &'static str,
    },
    #[error("player {0} is not connected")]
    PlayerOffline(Uuid),
    #[error("failed to open prompt: {0}")]
    OpenFailed(#[from] anyhow::Error),
}
