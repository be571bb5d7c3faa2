use chrono::{DateTime, SecondsFormat, Utc};
use shopchat_core::errors::{Collaborator, CollaboratorError};
use thiserror::Error;

pub mod cache;
pub mod conversation;
pub mod memory;
pub mod product;
pub mod qa;

pub use cache::SqlResponseCache;
pub use conversation::SqlConversationRepository;
pub use memory::{
    InMemoryCatalog, InMemoryConversationStore, InMemoryQaStore, InMemoryResponseCache,
};
pub use product::SqlCatalogRepository;
pub use qa::SqlQaRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl RepositoryError {
    /// Storage outages become `Unavailable`; rows that cannot be decoded become
    /// `InvalidRecord`.
    pub fn into_collaborator(self, collaborator: Collaborator) -> CollaboratorError {
        match self {
            Self::Database(
                error @ (sqlx::Error::ColumnDecode { .. }
                | sqlx::Error::ColumnNotFound(_)
                | sqlx::Error::Decode(_)),
            ) => CollaboratorError::invalid_record(collaborator, error.to_string()),
            Self::Database(error) => CollaboratorError::unavailable(collaborator, error.to_string()),
            Self::Decode(message) => CollaboratorError::invalid_record(collaborator, message),
        }
    }
}

/// Case folding applied to every lookup key column.
pub(crate) fn fold_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Fixed-width timestamps so `ORDER BY created_at` sorts chronologically.
pub(crate) fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(
    column: &str,
    value: String,
) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}
