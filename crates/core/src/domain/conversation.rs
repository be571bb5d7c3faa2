use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }

    /// Prefix used when a message is rendered into the flat history string.
    pub fn history_prefix(&self) -> &'static str {
        match self {
            Self::User => "Khách:",
            Self::Assistant => "Trợ lý:",
        }
    }
}

/// Which truth source produced a stored message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSource {
    Customer,
    QaMatch,
    Generated,
    Fallback,
}

impl MessageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::QaMatch => "qa_match",
            Self::Generated => "generated",
            Self::Fallback => "fallback",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "customer" => Some(Self::Customer),
            "qa_match" => Some(Self::QaMatch),
            "generated" => Some(Self::Generated),
            "fallback" => Some(Self::Fallback),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub conversation_id: ConversationId,
    pub role: MessageRole,
    pub content: String,
    pub source: MessageSource,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Renders stored messages (oldest first) as the newline-delimited history string.
pub fn render_history(messages: &[ConversationMessage]) -> String {
    messages
        .iter()
        .map(|message| {
            let flattened = message.content.split_whitespace().collect::<Vec<_>>().join(" ");
            format!("{} {}", message.role.history_prefix(), flattened)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::{render_history, ConversationId, ConversationMessage, MessageRole, MessageSource};

    #[test]
    fn history_lines_are_role_prefixed_and_single_line() {
        let conversation_id = ConversationId("conv-1".to_string());
        let messages = vec![
            ConversationMessage {
                conversation_id: conversation_id.clone(),
                role: MessageRole::User,
                content: "áo thun\ncòn không".to_string(),
                source: MessageSource::Customer,
                metadata: json!({}),
                created_at: Utc::now(),
            },
            ConversationMessage {
                conversation_id,
                role: MessageRole::Assistant,
                content: "Dạ còn ạ".to_string(),
                source: MessageSource::Generated,
                metadata: json!({}),
                created_at: Utc::now(),
            },
        ];

        assert_eq!(render_history(&messages), "Khách: áo thun còn không\nTrợ lý: Dạ còn ạ");
    }

    #[test]
    fn role_and_source_round_trip_through_storage_names() {
        for role in [MessageRole::User, MessageRole::Assistant] {
            assert_eq!(MessageRole::parse(role.as_str()), Some(role));
        }
        for source in [
            MessageSource::Customer,
            MessageSource::QaMatch,
            MessageSource::Generated,
            MessageSource::Fallback,
        ] {
            assert_eq!(MessageSource::parse(source.as_str()), Some(source));
        }
        assert_eq!(MessageSource::parse("bogus"), None);
    }
}
