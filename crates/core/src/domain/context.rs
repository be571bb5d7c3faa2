use serde::{Deserialize, Serialize};

use super::product::ProductSummary;
use super::qa::QaMatch;
use crate::taxonomy::KeywordCategory;

/// Most products handed to the prompt for one message.
pub const MAX_CONTEXT_PRODUCTS: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserIntent {
    ProductInquiry,
    PolicyQuestion,
    GeneralChat,
    QaMatch,
}

impl UserIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductInquiry => "product_inquiry",
            Self::PolicyQuestion => "policy_question",
            Self::GeneralChat => "general_chat",
            Self::QaMatch => "qa_match",
        }
    }
}

/// Everything the pipeline knows about one customer message. Built once per request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatContext {
    /// Newline-delimited turns, oldest first.
    pub conversation_history: String,
    /// At most [`MAX_CONTEXT_PRODUCTS`], highest precedence first.
    pub current_products: Vec<ProductSummary>,
    pub user_intent: UserIntent,
    pub search_keyword: Option<String>,
    pub question_categories: Vec<KeywordCategory>,
    pub specific_questions: Vec<String>,
    pub qa_match: Option<QaMatch>,
    /// Slug of the product page the customer is browsing, if any.
    pub page_slug: Option<String>,
}

impl ChatContext {
    /// Exactly one category was detected and it is a greeting, thanks or goodbye.
    pub fn pure_social_category(&self) -> Option<KeywordCategory> {
        match self.question_categories.as_slice() {
            [only] if only.is_social() => Some(*only),
            _ => None,
        }
    }

    pub fn has_category(&self, category: KeywordCategory) -> bool {
        self.question_categories.contains(&category)
    }

    pub fn has_social_category(&self) -> bool {
        self.question_categories.iter().any(KeywordCategory::is_social)
    }

    /// Whether the customer is already looking at `slug`.
    pub fn is_on_page_of(&self, slug: &str) -> bool {
        self.page_slug.as_deref().is_some_and(|page| page.eq_ignore_ascii_case(slug))
    }

    pub fn history_lines(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.conversation_history.lines().map(str::trim).filter(|line| !line.is_empty())
    }

    /// Drops any canned answer and falls back to general chat. Applied to purely social messages.
    pub fn force_general_chat(&mut self) {
        self.user_intent = UserIntent::GeneralChat;
        self.qa_match = None;
    }
}
