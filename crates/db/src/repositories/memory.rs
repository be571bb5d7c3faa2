//! In-process adapters with the same matching rules as the SQLite repositories. Each can be
//! switched into a failing mode to exercise collaborator outages.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use shopchat_core::domain::conversation::{
    ConversationId, ConversationMessage, MessageRole, MessageSource,
};
use shopchat_core::domain::product::{OwnerScope, Product, ProductSummary};
use shopchat_core::domain::qa::{is_matchable_query, QaRecord};
use shopchat_core::errors::{Collaborator, CollaboratorError};
use shopchat_core::ports::{
    CatalogStore, ConversationStore, QaStore, ResponseCache, SEARCH_LIMIT,
};

use super::fold_key;
use super::product::{search_terms, search_text};

#[derive(Default)]
struct FailureSwitch(AtomicBool);

impl FailureSwitch {
    fn set(&self, failing: bool) {
        self.0.store(failing, Ordering::SeqCst);
    }

    fn check(&self, collaborator: Collaborator) -> Result<(), CollaboratorError> {
        if self.0.load(Ordering::SeqCst) {
            return Err(CollaboratorError::unavailable(collaborator, "in-memory adapter offline"));
        }
        Ok(())
    }
}

/// Sorts newest first; later insertions win ties.
fn newest_first<T>(items: &mut [(usize, DateTime<Utc>, T)]) {
    items.sort_by(|left, right| right.1.cmp(&left.1).then(right.0.cmp(&left.0)));
}

#[derive(Default)]
pub struct InMemoryCatalog {
    products: RwLock<Vec<Product>>,
    failure: FailureSwitch,
}

impl InMemoryCatalog {
    pub fn with_products(products: Vec<Product>) -> Self {
        Self { products: RwLock::new(products), failure: FailureSwitch::default() }
    }

    /// Inserts or replaces by id.
    pub async fn save(&self, product: Product) {
        let mut products = self.products.write().await;
        match products.iter_mut().find(|existing| existing.id == product.id) {
            Some(existing) => *existing = product,
            None => products.push(product),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failure.set(failing);
    }

    async fn visible(
        &self,
        owner: Option<&OwnerScope>,
        predicate: impl Fn(&Product) -> bool,
    ) -> Vec<ProductSummary> {
        let products = self.products.read().await;
        let mut matches = products
            .iter()
            .enumerate()
            .filter(|(_, product)| product.active && product.visible_to(owner))
            .filter(|(_, product)| predicate(product))
            .map(|(index, product)| (index, product.created_at, product.summary()))
            .collect::<Vec<_>>();
        newest_first(&mut matches);
        matches.into_iter().map(|(_, _, summary)| summary).collect()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn find_by_slug(
        &self,
        slug: &str,
        owner: Option<&OwnerScope>,
    ) -> Result<Option<ProductSummary>, CollaboratorError> {
        self.failure.check(Collaborator::Catalog)?;
        let key = fold_key(slug);
        if key.is_empty() {
            return Ok(None);
        }
        Ok(self.visible(owner, |product| fold_key(&product.slug) == key).await.into_iter().next())
    }

    async fn search_by_text(
        &self,
        keyword: &str,
        synonyms: &[String],
        owner: Option<&OwnerScope>,
    ) -> Result<Vec<ProductSummary>, CollaboratorError> {
        self.failure.check(Collaborator::Catalog)?;
        let terms = search_terms(keyword, synonyms);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let mut found = self
            .visible(owner, |product| {
                let haystack = search_text(product);
                terms.iter().any(|term| haystack.contains(term.as_str()))
            })
            .await;
        found.truncate(SEARCH_LIMIT);
        Ok(found)
    }

    async fn list_active_for_owner(
        &self,
        owner: Option<&OwnerScope>,
        limit: usize,
    ) -> Result<Vec<ProductSummary>, CollaboratorError> {
        self.failure.check(Collaborator::Catalog)?;
        let mut listed = self.visible(owner, |_| true).await;
        listed.truncate(limit);
        Ok(listed)
    }
}

#[derive(Default)]
pub struct InMemoryQaStore {
    records: RwLock<Vec<QaRecord>>,
    failure: FailureSwitch,
}

impl InMemoryQaStore {
    pub fn with_records(records: Vec<QaRecord>) -> Self {
        Self { records: RwLock::new(records), failure: FailureSwitch::default() }
    }

    pub async fn save(&self, record: QaRecord) {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failure.set(failing);
    }
}

#[async_trait]
impl QaStore for InMemoryQaStore {
    async fn find_match(
        &self,
        text: &str,
        owner: Option<&OwnerScope>,
    ) -> Result<Option<QaRecord>, CollaboratorError> {
        self.failure.check(Collaborator::QaStore)?;
        if !is_matchable_query(text) {
            return Ok(None);
        }
        let key = fold_key(text);

        let records = self.records.read().await;
        let mut candidates = records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.is_active)
            .filter(|(_, record)| match owner {
                Some(owner) => record.owner_scope.as_ref() == Some(owner),
                None => true,
            })
            .filter_map(|(index, record)| {
                let question = fold_key(&record.question);
                if question.is_empty() {
                    return None;
                }
                let exact = question == key;
                (exact || question.contains(&key) || key.contains(&question))
                    .then_some((exact, index, record))
            })
            .collect::<Vec<_>>();
        candidates.sort_by(|left, right| {
            right
                .0
                .cmp(&left.0)
                .then(right.2.created_at.cmp(&left.2.created_at))
                .then(right.1.cmp(&left.1))
        });
        Ok(candidates.first().map(|(_, _, record)| (*record).clone()))
    }
}

#[derive(Default)]
pub struct InMemoryConversationStore {
    conversations: RwLock<HashMap<String, Vec<ConversationMessage>>>,
    failure: FailureSwitch,
}

impl InMemoryConversationStore {
    pub fn set_failing(&self, failing: bool) {
        self.failure.set(failing);
    }

    /// Every stored message of a conversation, oldest first.
    pub async fn messages(&self, conversation_id: &ConversationId) -> Vec<ConversationMessage> {
        let conversations = self.conversations.read().await;
        conversations.get(&conversation_id.0).cloned().unwrap_or_default()
    }

    pub async fn conversation_count(&self) -> usize {
        self.conversations.read().await.len()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create_conversation(
        &self,
        _seed_title: &str,
        _owner: Option<&OwnerScope>,
    ) -> Result<ConversationId, CollaboratorError> {
        self.failure.check(Collaborator::ConversationStore)?;
        let id = ConversationId(format!("conv-{}", Uuid::new_v4()));
        self.conversations.write().await.insert(id.0.clone(), Vec::new());
        Ok(id)
    }

    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        role: MessageRole,
        content: &str,
        source: MessageSource,
        metadata: serde_json::Value,
    ) -> Result<(), CollaboratorError> {
        self.failure.check(Collaborator::ConversationStore)?;
        let mut conversations = self.conversations.write().await;
        let messages = conversations.get_mut(&conversation_id.0).ok_or_else(|| {
            CollaboratorError::unavailable(
                Collaborator::ConversationStore,
                format!("unknown conversation `{}`", conversation_id.0),
            )
        })?;
        messages.push(ConversationMessage {
            conversation_id: conversation_id.clone(),
            role,
            content: content.to_string(),
            source,
            metadata,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn recent_messages(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<ConversationMessage>, CollaboratorError> {
        self.failure.check(Collaborator::ConversationStore)?;
        let conversations = self.conversations.read().await;
        let messages = conversations.get(&conversation_id.0).map(Vec::as_slice).unwrap_or(&[]);
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].to_vec())
    }
}

#[derive(Default)]
pub struct InMemoryResponseCache {
    entries: RwLock<HashMap<String, (String, DateTime<Utc>)>>,
    failure: FailureSwitch,
}

impl InMemoryResponseCache {
    pub fn set_failing(&self, failing: bool) {
        self.failure.set(failing);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ResponseCache for InMemoryResponseCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CollaboratorError> {
        self.failure.check(Collaborator::Cache)?;
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some((_, expires_at)) if *expires_at <= Utc::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CollaboratorError> {
        self.failure.check(Collaborator::Cache)?;
        let ttl = Duration::seconds(ttl_secs.min(10 * 365 * 24 * 60 * 60) as i64);
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value.to_string(), Utc::now() + ttl));
        Ok(())
    }
}
