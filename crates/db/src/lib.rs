//! SQLite and in-memory adapters for the chat pipeline's collaborator ports.

pub mod connection;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, DbPool};
pub use repositories::{
    InMemoryCatalog, InMemoryConversationStore, InMemoryQaStore, InMemoryResponseCache,
    RepositoryError, SqlCatalogRepository, SqlConversationRepository, SqlQaRepository,
    SqlResponseCache,
};
