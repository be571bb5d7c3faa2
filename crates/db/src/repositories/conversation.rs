use async_trait::async_trait;
use chrono::Utc;
use shopchat_core::domain::conversation::{
    ConversationId, ConversationMessage, MessageRole, MessageSource,
};
use shopchat_core::domain::product::OwnerScope;
use shopchat_core::errors::{Collaborator, CollaboratorError};
use shopchat_core::ports::ConversationStore;
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, RepositoryError};
use crate::DbPool;

pub struct SqlConversationRepository {
    pool: DbPool,
}

impl SqlConversationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn insert_conversation(
        &self,
        seed_title: &str,
        owner: Option<&OwnerScope>,
    ) -> Result<ConversationId, RepositoryError> {
        let id = ConversationId(format!("conv-{}", Uuid::new_v4()));
        sqlx::query(
            "INSERT INTO conversation (id, owner_scope, title, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id.0)
        .bind(owner.map(|owner| owner.0.as_str()))
        .bind(seed_title)
        .bind(format_timestamp(&Utc::now()))
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn insert_message(
        &self,
        conversation_id: &ConversationId,
        role: MessageRole,
        content: &str,
        source: MessageSource,
        metadata: &serde_json::Value,
    ) -> Result<(), RepositoryError> {
        let metadata_json = serde_json::to_string(metadata)
            .map_err(|error| RepositoryError::Decode(format!("metadata encode: {error}")))?;
        sqlx::query(
            r#"
            INSERT INTO conversation_message (
                conversation_id, role, content, source, metadata_json, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&conversation_id.0)
        .bind(role.as_str())
        .bind(content)
        .bind(source.as_str())
        .bind(metadata_json)
        .bind(format_timestamp(&Utc::now()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn query_recent(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<ConversationMessage>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT conversation_id, role, content, source, metadata_json, created_at
            FROM conversation_message
            WHERE conversation_id = ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(&conversation_id.0)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let mut messages = rows.iter().map(message_from_row).collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }
}

#[async_trait]
impl ConversationStore for SqlConversationRepository {
    async fn create_conversation(
        &self,
        seed_title: &str,
        owner: Option<&OwnerScope>,
    ) -> Result<ConversationId, CollaboratorError> {
        self.insert_conversation(seed_title, owner)
            .await
            .map_err(|error| error.into_collaborator(Collaborator::ConversationStore))
    }

    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        role: MessageRole,
        content: &str,
        source: MessageSource,
        metadata: serde_json::Value,
    ) -> Result<(), CollaboratorError> {
        self.insert_message(conversation_id, role, content, source, &metadata)
            .await
            .map_err(|error| error.into_collaborator(Collaborator::ConversationStore))
    }

    async fn recent_messages(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<ConversationMessage>, CollaboratorError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.query_recent(conversation_id, limit)
            .await
            .map_err(|error| error.into_collaborator(Collaborator::ConversationStore))
    }
}

fn message_from_row(row: &SqliteRow) -> Result<ConversationMessage, RepositoryError> {
    let role: String = row.try_get("role")?;
    let source: String = row.try_get("source")?;
    let metadata_json: String = row.try_get("metadata_json")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(ConversationMessage {
        conversation_id: ConversationId(row.try_get("conversation_id")?),
        role: MessageRole::parse(&role)
            .ok_or_else(|| RepositoryError::Decode(format!("invalid role: {role}")))?,
        content: row.try_get("content")?,
        source: MessageSource::parse(&source)
            .ok_or_else(|| RepositoryError::Decode(format!("invalid source: {source}")))?,
        metadata: serde_json::from_str(&metadata_json)
            .map_err(|error| RepositoryError::Decode(format!("invalid metadata_json: {error}")))?,
        created_at: parse_timestamp("created_at", created_at)?,
    })
}
