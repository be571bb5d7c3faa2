use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::product::OwnerScope;

/// Messages with fewer letters or digits than this never reach the Q&A lookup.
pub const MIN_QUERY_ALPHANUMERICS: usize = 3;

/// Whether `text` carries enough letters or digits to be matched against stored questions.
/// Punctuation-only or single-letter messages are contained in nearly every question.
pub fn is_matchable_query(text: &str) -> bool {
    text.chars().filter(|ch| ch.is_alphanumeric()).count() >= MIN_QUERY_ALPHANUMERICS
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QaId(pub String);

/// Pre-authored example question and answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaRecord {
    pub id: QaId,
    pub question: String,
    pub answer: String,
    pub is_active: bool,
    pub owner_scope: Option<OwnerScope>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QaMatchKind {
    Exact,
    Contains,
}

impl QaMatchKind {
    pub fn confidence(&self) -> f64 {
        match self {
            Self::Exact => 0.99,
            Self::Contains => 0.95,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QaMatchMetadata {
    pub qa_id: QaId,
    pub matched_question: String,
    pub kind: QaMatchKind,
    pub adapted: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QaMatch {
    pub answer: String,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub metadata: QaMatchMetadata,
}

impl QaMatch {
    pub fn from_record(record: QaRecord, kind: QaMatchKind) -> Self {
        Self {
            answer: record.answer,
            confidence: kind.confidence(),
            metadata: QaMatchMetadata {
                qa_id: record.id,
                matched_question: record.question,
                kind,
                adapted: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::is_matchable_query;

    #[test]
    fn short_or_punctuation_only_messages_are_not_matchable() {
        assert!(!is_matchable_query(""));
        assert!(!is_matchable_query("?"));
        assert!(!is_matchable_query(" a !"));
        assert!(!is_matchable_query("ờ ?"));
        assert!(is_matchable_query("giờ?"));
        assert!(is_matchable_query("phí ship"));
    }
}
