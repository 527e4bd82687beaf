use quill_protocol_core::SurfaceKind;
use uuid::Uuid;

/// Identity of one prompt attempt. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    /// Single line of text typed into an anvil.
    Rename,
    /// Four lines typed onto a sign.
    MultiLineText,
}

impl PromptKind {
    pub fn surface(self) -> SurfaceKind {
        match self {
            PromptKind::Rename => SurfaceKind::Anvil,
            PromptKind::MultiLineText => SurfaceKind::Sign,
        }
    }

    /// Number of lines a submission of this kind carries.
    pub fn arity(self) -> usize {
        match self {
            PromptKind::Rename => 1,
            PromptKind::MultiLineText => 4,
        }
    }

    /// Used in pipeline stage names.
    pub fn slug(self) -> &'static str {
        match self {
            PromptKind::Rename => "rename",
            PromptKind::MultiLineText => "sign",
        }
    }
}

/// What the caller's callback receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResult {
    Rename(String),
    Lines { lines: Vec<String>, combined: String },
}

impl PromptResult {
    /// All submitted text joined without separator.
    pub fn text(&self) -> &str {
        match self {
            PromptResult::Rename(text) => text,
            PromptResult::Lines { combined, .. } => combined,
        }
    }
}
