use async_trait::async_trait;
use shopchat_core::domain::product::OwnerScope;
use shopchat_core::domain::qa::{is_matchable_query, QaId, QaRecord};
use shopchat_core::errors::{Collaborator, CollaboratorError};
use shopchat_core::ports::QaStore;
use sqlx::{sqlite::SqliteRow, Row};

use super::{fold_key, format_timestamp, parse_timestamp, RepositoryError};
use crate::DbPool;

pub struct SqlQaRepository {
    pool: DbPool,
}

impl SqlQaRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn save(&self, record: &QaRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO example_qa (
                id, owner_scope, question, question_key, answer, is_active, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                owner_scope = excluded.owner_scope,
                question = excluded.question,
                question_key = excluded.question_key,
                answer = excluded.answer,
                is_active = excluded.is_active,
                created_at = excluded.created_at
            "#,
        )
        .bind(&record.id.0)
        .bind(record.owner_scope.as_ref().map(|owner| owner.0.as_str()))
        .bind(&record.question)
        .bind(fold_key(&record.question))
        .bind(&record.answer)
        .bind(record.is_active)
        .bind(format_timestamp(&record.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn query_match(
        &self,
        key: &str,
        owner: Option<&OwnerScope>,
    ) -> Result<Option<QaRecord>, RepositoryError> {
        let owner = owner.map(|owner| owner.0.as_str());
        let row = sqlx::query(
            r#"
            SELECT id, owner_scope, question, answer, is_active, created_at
            FROM example_qa
            WHERE is_active = 1
              AND question_key <> ''
              AND (? IS NULL OR owner_scope = ?)
              AND (question_key = ? OR instr(question_key, ?) > 0 OR instr(?, question_key) > 0)
            ORDER BY question_key = ? DESC, created_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(owner)
        .bind(owner)
        .bind(key)
        .bind(key)
        .bind(key)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(qa_from_row).transpose()
    }
}

#[async_trait]
impl QaStore for SqlQaRepository {
    async fn find_match(
        &self,
        text: &str,
        owner: Option<&OwnerScope>,
    ) -> Result<Option<QaRecord>, CollaboratorError> {
        if !is_matchable_query(text) {
            return Ok(None);
        }
        let key = fold_key(text);
        self.query_match(&key, owner)
            .await
            .map_err(|error| error.into_collaborator(Collaborator::QaStore))
    }
}

fn qa_from_row(row: &SqliteRow) -> Result<QaRecord, RepositoryError> {
    let owner_scope: Option<String> = row.try_get("owner_scope")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(QaRecord {
        id: QaId(row.try_get("id")?),
        question: row.try_get("question")?,
        answer: row.try_get("answer")?,
        is_active: row.try_get("is_active")?,
        owner_scope: owner_scope.map(OwnerScope),
        created_at: parse_timestamp("created_at", created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use shopchat_core::domain::product::OwnerScope;
    use shopchat_core::domain::qa::{QaId, QaRecord};
    use shopchat_core::errors::CollaboratorError;
    use shopchat_core::ports::QaStore;

    use super::SqlQaRepository;
    use crate::{connect_with_settings, migrations, DbPool};

    fn record(id: &str, question: &str, minutes: i64) -> QaRecord {
        QaRecord {
            id: QaId(id.to_string()),
            question: question.to_string(),
            answer: format!("Trả lời cho {id}"),
            is_active: true,
            owner_scope: None,
            created_at: Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).single().expect("timestamp")
                + Duration::minutes(minutes),
        }
    }

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn exact_match_ignores_case_and_surrounding_whitespace() {
        let repo = SqlQaRepository::new(setup_pool().await);
        let stored = record("qa-hours", "Giờ làm việc của công ty từ mấy giờ?", 0);
        repo.save(&stored).await.expect("save");

        let found = repo
            .find_match("  GIỜ LÀM VIỆC CỦA CÔNG TY TỪ MẤY GIỜ?  ", None)
            .await
            .expect("lookup");
        assert_eq!(found, Some(stored));
    }

    #[tokio::test]
    async fn containment_works_in_both_directions_and_prefers_newest() {
        let repo = SqlQaRepository::new(setup_pool().await);
        repo.save(&record("qa-old", "phí ship bao nhiêu", 0)).await.expect("save");
        repo.save(&record("qa-new", "phí ship bao nhiêu vậy shop", 10)).await.expect("save");

        let longer = repo.find_match("cho hỏi phí ship bao nhiêu vậy shop ơi", None).await;
        assert_eq!(longer.expect("lookup").map(|qa| qa.id.0), Some("qa-new".to_string()));

        let shorter = repo.find_match("phí ship", None).await.expect("lookup");
        assert_eq!(shorter.map(|qa| qa.id.0), Some("qa-new".to_string()));
    }

    #[tokio::test]
    async fn exact_match_outranks_newer_containment_match() {
        let repo = SqlQaRepository::new(setup_pool().await);
        repo.save(&record("qa-exact", "đổi trả thế nào", 0)).await.expect("save");
        repo.save(&record("qa-longer", "đổi trả thế nào nếu mặc không vừa", 10))
            .await
            .expect("save");

        let found = repo.find_match("Đổi trả thế nào", None).await.expect("lookup");
        assert_eq!(found.map(|qa| qa.id.0), Some("qa-exact".to_string()));
    }

    #[tokio::test]
    async fn inactive_scoped_and_empty_inputs_do_not_match() {
        let repo = SqlQaRepository::new(setup_pool().await);
        let mut inactive = record("qa-off", "có freeship không", 0);
        inactive.is_active = false;
        repo.save(&inactive).await.expect("save");
        let mut scoped = record("qa-b", "shop ở đâu", 1);
        scoped.owner_scope = Some(OwnerScope("shop-b".to_string()));
        repo.save(&scoped).await.expect("save");

        assert_eq!(repo.find_match("có freeship không", None).await.expect("lookup"), None);
        assert_eq!(repo.find_match("", None).await.expect("lookup"), None);
        assert_eq!(
            repo.find_match("shop ở đâu", Some(&OwnerScope("shop-a".to_string())))
                .await
                .expect("lookup"),
            None
        );
        assert!(repo.find_match("shop ở đâu", None).await.expect("lookup").is_some());
    }

    #[tokio::test]
    async fn closed_pool_reports_unavailable() {
        let pool = setup_pool().await;
        let repo = SqlQaRepository::new(pool.clone());
        pool.close().await;

        let error = repo.find_match("shop ở đâu", None).await.expect_err("closed pool");
        assert!(matches!(error, CollaboratorError::Unavailable { .. }));
    }
}
