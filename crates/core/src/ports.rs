//! Collaborator ports. The pipeline owns none of these stores; every call returns an explicit
//! [`CollaboratorError`] that the caller pattern-matches and degrades on.

use async_trait::async_trait;

use crate::domain::conversation::{
    ConversationId, ConversationMessage, MessageRole, MessageSource,
};
use crate::domain::product::{OwnerScope, ProductSummary};
use crate::domain::qa::QaRecord;
use crate::errors::CollaboratorError;

/// Result cap for [`CatalogStore::search_by_text`].
pub const SEARCH_LIMIT: usize = 5;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Exact, case-insensitive slug lookup over active products.
    async fn find_by_slug(
        &self,
        slug: &str,
        owner: Option<&OwnerScope>,
    ) -> Result<Option<ProductSummary>, CollaboratorError>;

    /// Case-insensitive containment of `keyword` or any synonym in name, category or
    /// description. At most [`SEARCH_LIMIT`] active products, newest first.
    async fn search_by_text(
        &self,
        keyword: &str,
        synonyms: &[String],
        owner: Option<&OwnerScope>,
    ) -> Result<Vec<ProductSummary>, CollaboratorError>;

    /// Newest active products first.
    async fn list_active_for_owner(
        &self,
        owner: Option<&OwnerScope>,
        limit: usize,
    ) -> Result<Vec<ProductSummary>, CollaboratorError>;
}

#[async_trait]
pub trait QaStore: Send + Sync {
    /// Newest active record whose question equals `text` or contains it, or is contained in
    /// it, ignoring case. Empty text never matches.
    async fn find_match(
        &self,
        text: &str,
        owner: Option<&OwnerScope>,
    ) -> Result<Option<QaRecord>, CollaboratorError>;
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create_conversation(
        &self,
        seed_title: &str,
        owner: Option<&OwnerScope>,
    ) -> Result<ConversationId, CollaboratorError>;

    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        role: MessageRole,
        content: &str,
        source: MessageSource,
        metadata: serde_json::Value,
    ) -> Result<(), CollaboratorError>;

    /// The last `limit` messages, oldest first.
    async fn recent_messages(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<ConversationMessage>, CollaboratorError>;
}

#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CollaboratorError>;

    /// Overwrites any existing entry.
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CollaboratorError>;
}
