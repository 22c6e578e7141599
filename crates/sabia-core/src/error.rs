//! Error taxonomy shared by all Sabia crates.
//!
//! Every failure carries enough structure for the worker boundary to decide
//! what the user sees without inspecting error strings.

use thiserror::Error;

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, SabiaError>;

#[derive(Debug, Error)]
pub enum SabiaError {
    /// Bad user input (empty, too long, too short). Shown to the user verbatim.
    #[error("{0}")]
    Validation(String),

    #[error("Knowledge base is empty")]
    EmptyCorpus,

    /// External corpus/content fetch failed or returned nothing.
    #[error("Lookup failed: {0}")]
    Lookup(String),

    /// A speech producer failed.
    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    /// Sending or editing on the chat platform failed.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("NLP error: {0}")]
    Nlp(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Queue is full (capacity {0})")]
    QueueFull(usize),

    #[error("Queue is closed")]
    QueueClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Coarse classification used at the worker boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Lookup,
    Synthesis,
    Transport,
    Unexpected,
}

impl SabiaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SabiaError::Validation(_) => ErrorKind::Validation,
            SabiaError::Lookup(_) => ErrorKind::Lookup,
            SabiaError::Synthesis(_) => ErrorKind::Synthesis,
            SabiaError::Transport(_) => ErrorKind::Transport,
            _ => ErrorKind::Unexpected,
        }
    }

    /// Validation errors are the only ones whose text reaches the user as-is.
    pub fn is_user_facing(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}
