pub mod adapter;
pub mod config;
pub mod engine;
pub mod error;
pub mod guard;
pub mod host;
pub mod interceptor;
pub mod kind;
pub mod registry;
pub mod session;

pub use adapter::{DialectAdapter, MatchOutcome, MatchProgress, Submission, Surface, SurfaceAnchor, SurfaceSettings, VersionAdapter};
pub use config::PromptConfig;
pub use engine::PromptEngine;
pub use error::PromptError;
pub use guard::LifecycleGuard;
pub use host::{ConnectionRegistry, PlayerConnection, Scheduler};
pub use interceptor::{InterceptorHandle, PacketInterceptor, SubmissionSink};
pub use kind::{PromptKind, PromptResult, SessionId};
pub use registry::AdapterRegistry;
pub use session::{PromptSession, SessionState, TeardownTrigger};
