use std::sync::Arc;

use shopchat_core::domain::product::OwnerScope;
use shopchat_core::domain::qa::{is_matchable_query, QaMatch, QaMatchKind};
use shopchat_core::errors::CollaboratorError;
use shopchat_core::ports::QaStore;
use tracing::{debug, error, warn};

/// Looks up pre-authored answers. Fails open: a lookup error reads as "no match".
pub struct CannedAnswerMatcher {
    store: Arc<dyn QaStore>,
}

impl CannedAnswerMatcher {
    pub fn new(store: Arc<dyn QaStore>) -> Self {
        Self { store }
    }

    pub async fn find(
        &self,
        text: &str,
        owner: Option<&OwnerScope>,
        correlation_id: &str,
    ) -> Option<QaMatch> {
        if !is_matchable_query(text) {
            return None;
        }
        let record = match self.store.find_match(text, owner).await {
            Ok(record) => record?,
            Err(failure) => {
                log_lookup_failure(&failure, correlation_id);
                return None;
            }
        };

        let kind = if fold(&record.question) == fold(text) {
            QaMatchKind::Exact
        } else {
            QaMatchKind::Contains
        };
        debug!(
            event_name = "chat.canned.matched",
            correlation_id = %correlation_id,
            qa_id = %record.id.0,
            match_kind = ?kind,
            "canned answer matched"
        );
        Some(QaMatch::from_record(record, kind))
    }
}

fn fold(text: &str) -> String {
    text.trim().to_lowercase()
}

fn log_lookup_failure(failure: &CollaboratorError, correlation_id: &str) {
    if matches!(failure, CollaboratorError::InvalidRecord { .. }) {
        error!(
            event_name = "chat.canned.lookup_failed",
            correlation_id = %correlation_id,
            reason_code = failure.reason_code(),
            error = %failure,
            "q&a store returned a malformed record; continuing without canned answer"
        );
    } else {
        warn!(
            event_name = "chat.canned.lookup_failed",
            correlation_id = %correlation_id,
            reason_code = failure.reason_code(),
            error = %failure,
            "q&a lookup failed; continuing without canned answer"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use shopchat_core::domain::qa::{QaId, QaMatchKind, QaRecord};
    use shopchat_db::InMemoryQaStore;

    use super::CannedAnswerMatcher;

    fn store() -> Arc<InMemoryQaStore> {
        Arc::new(InMemoryQaStore::with_records(vec![QaRecord {
            id: QaId("qa-hours".to_string()),
            question: "Giờ làm việc của công ty từ mấy giờ?".to_string(),
            answer: "Dạ, shop làm việc từ 8h đến 21h các ngày trong tuần ạ.".to_string(),
            is_active: true,
            owner_scope: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).single().expect("timestamp"),
        }]))
    }

    #[tokio::test]
    async fn exact_question_scores_highest_confidence() {
        let matcher = CannedAnswerMatcher::new(store());
        let found = matcher
            .find("Giờ làm việc của công ty từ mấy giờ?", None, "req-1")
            .await
            .expect("match");

        assert_eq!(found.metadata.kind, QaMatchKind::Exact);
        assert!((found.confidence - 0.99).abs() < f64::EPSILON);
        assert_eq!(found.metadata.qa_id.0, "qa-hours");
    }

    #[tokio::test]
    async fn contained_question_scores_lower() {
        let matcher = CannedAnswerMatcher::new(store());
        let found = matcher
            .find("cho mình hỏi giờ làm việc của công ty từ mấy giờ? cảm ơn", None, "req-2")
            .await
            .expect("match");

        assert_eq!(found.metadata.kind, QaMatchKind::Contains);
        assert!((found.confidence - 0.95).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn store_failure_reads_as_no_match() {
        let store = store();
        store.set_failing(true);
        let matcher = CannedAnswerMatcher::new(store);

        assert!(matcher.find("Giờ làm việc của công ty từ mấy giờ?", None, "req-3").await.is_none());
    }

    #[tokio::test]
    async fn punctuation_or_single_letter_never_matches() {
        let matcher = CannedAnswerMatcher::new(store());

        for text in ["?", "a", " ! ", "c?"] {
            assert!(matcher.find(text, None, "req-4").await.is_none(), "matched `{text}`");
        }
    }
}
