use serde::{Deserialize, Serialize};

use super::context::UserIntent;
use super::conversation::MessageSource;
use super::product::ProductId;
use super::qa::{QaId, QaMatchKind};
use crate::taxonomy::KeywordCategory;

pub const GENERATED_CONFIDENCE: f64 = 0.85;
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    QaMatch,
    Generated,
    Fallback,
}

impl ReplySource {
    pub fn as_message_source(&self) -> MessageSource {
        match self {
            Self::QaMatch => MessageSource::QaMatch,
            Self::Generated => MessageSource::Generated,
            Self::Fallback => MessageSource::Fallback,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackReason {
    /// The generative call failed or timed out.
    GenerativeFailure { reason_code: String },
    /// The generative call succeeded but its text was rejected by the guard.
    Rejected { reason_code: String },
}

impl FallbackReason {
    pub fn reason_code(&self) -> &str {
        match self {
            Self::GenerativeFailure { reason_code } | Self::Rejected { reason_code } => reason_code,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseDetail {
    CannedAnswer {
        qa_id: QaId,
        matched_question: String,
        match_kind: QaMatchKind,
        adapted: bool,
    },
    Generated {
        product_ids: Vec<ProductId>,
        search_keyword: Option<String>,
        usage: Option<Usage>,
        cache_hit: bool,
        pure_social: bool,
    },
    Fallback {
        reason: FallbackReason,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub fallback: bool,
    pub intent: UserIntent,
    pub categories: Vec<KeywordCategory>,
    pub detail: ResponseDetail,
}

/// The presentable answer to one customer message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
    pub source: ReplySource,
    pub confidence: f64,
    pub metadata: ResponseMetadata,
}

impl ChatReply {
    pub fn fallback(
        text: String,
        intent: UserIntent,
        categories: Vec<KeywordCategory>,
        reason: FallbackReason,
    ) -> Self {
        Self {
            text,
            source: ReplySource::Fallback,
            confidence: FALLBACK_CONFIDENCE,
            metadata: ResponseMetadata {
                fallback: true,
                intent,
                categories,
                detail: ResponseDetail::Fallback { reason },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ChatReply, FallbackReason, ReplySource};
    use crate::domain::context::UserIntent;
    use crate::domain::conversation::MessageSource;
    use crate::taxonomy::KeywordCategory;

    #[test]
    fn fallback_reply_serializes_with_tagged_detail() {
        let reply = ChatReply::fallback(
            "Dạ em chưa rõ câu hỏi ạ".to_string(),
            UserIntent::GeneralChat,
            vec![KeywordCategory::Greeting],
            FallbackReason::Rejected { reason_code: "scaffolding_leak".to_string() },
        );

        assert_eq!(reply.confidence, 0.5);
        assert_eq!(reply.source.as_message_source(), MessageSource::Fallback);
        let value = serde_json::to_value(&reply.metadata).expect("serialize metadata");
        assert_eq!(
            value,
            json!({
                "fallback": true,
                "intent": "general_chat",
                "categories": ["greeting"],
                "detail": {
                    "kind": "fallback",
                    "reason": { "kind": "rejected", "reason_code": "scaffolding_leak" }
                }
            })
        );
        assert_eq!(ReplySource::QaMatch.as_message_source(), MessageSource::QaMatch);
    }
}
