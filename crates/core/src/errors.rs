use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// External systems the pipeline reads from or writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collaborator {
    Catalog,
    QaStore,
    Generative,
    Cache,
    ConversationStore,
}

impl Collaborator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::QaStore => "qa_store",
            Self::Generative => "generative",
            Self::Cache => "cache",
            Self::ConversationStore => "conversation_store",
        }
    }
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every collaborator port.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("{collaborator} unavailable: {message}")]
    Unavailable { collaborator: Collaborator, message: String },
    #[error("{collaborator} timed out after {timeout_ms}ms")]
    Timeout { collaborator: Collaborator, timeout_ms: u64 },
    #[error("{collaborator} returned an invalid record: {message}")]
    InvalidRecord { collaborator: Collaborator, message: String },
}

impl CollaboratorError {
    pub fn unavailable(collaborator: Collaborator, message: impl Into<String>) -> Self {
        Self::Unavailable { collaborator, message: message.into() }
    }

    pub fn invalid_record(collaborator: Collaborator, message: impl Into<String>) -> Self {
        Self::InvalidRecord { collaborator, message: message.into() }
    }

    pub fn collaborator(&self) -> Collaborator {
        match self {
            Self::Unavailable { collaborator, .. }
            | Self::Timeout { collaborator, .. }
            | Self::InvalidRecord { collaborator, .. } => *collaborator,
        }
    }

    /// Stable code used in structured logs and response metadata.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "collaborator_unavailable",
            Self::Timeout { .. } => "collaborator_timeout",
            Self::InvalidRecord { .. } => "collaborator_invalid_record",
        }
    }
}
