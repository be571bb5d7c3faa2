use shopchat_core::classifier::{classify_intent, Classification, IntentClassifier};
use shopchat_core::domain::context::{ChatContext, UserIntent};
use shopchat_core::domain::product::ProductSummary;
use shopchat_core::domain::qa::QaMatch;
use shopchat_core::taxonomy::KeywordCategory;
use tracing::debug;

/// What the classifier learned about a message before any collaborator is consulted.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageAnalysis {
    pub classification: Classification,
    pub intent: UserIntent,
    pub search_keyword: Option<String>,
    pub product_question: bool,
}

impl MessageAnalysis {
    /// The social category when it is the only thing detected; such messages take the
    /// minimal prompt path.
    pub fn pure_social(&self) -> Option<KeywordCategory> {
        self.classification.sole_social_category()
    }

    pub fn skips_canned_lookup(&self) -> bool {
        self.classification.is_purely_social() || self.product_question
    }
}

/// Parts gathered from collaborators once the message has been analysed.
#[derive(Default)]
pub struct ContextParts {
    pub history: String,
    pub page_slug: Option<String>,
    pub products: Vec<ProductSummary>,
    pub qa_match: Option<QaMatch>,
}

#[derive(Clone, Copy, Default)]
pub struct ContextBuilder {
    classifier: IntentClassifier,
}

impl ContextBuilder {
    pub fn new(classifier: IntentClassifier) -> Self {
        Self { classifier }
    }

    pub fn analyze(&self, message: &str, correlation_id: &str) -> MessageAnalysis {
        let classification = self.classifier.classify(message);
        let intent = classify_intent(&classification.categories);
        let search_keyword =
            self.classifier.taxonomy().first_product_keyword(message).map(str::to_string);
        let product_question = self.classifier.is_product_question(message);

        debug!(
            event_name = "chat.intent.classified",
            correlation_id = %correlation_id,
            intent = intent.as_str(),
            categories = ?classification.categories,
            search_keyword = search_keyword.as_deref().unwrap_or(""),
            product_question,
            "message classified"
        );
        MessageAnalysis { classification, intent, search_keyword, product_question }
    }

    /// Freezes the context for one message. A canned answer switches the intent to `qa_match`
    /// unless the message is purely social, which always reads as general chat.
    pub fn build(&self, analysis: &MessageAnalysis, parts: ContextParts) -> ChatContext {
        let user_intent =
            if parts.qa_match.is_some() { UserIntent::QaMatch } else { analysis.intent };
        let mut context = ChatContext {
            conversation_history: parts.history,
            current_products: parts.products,
            user_intent,
            search_keyword: analysis.search_keyword.clone(),
            question_categories: analysis.classification.categories.clone(),
            specific_questions: analysis.classification.matched_phrases.clone(),
            qa_match: parts.qa_match,
            page_slug: parts.page_slug,
        };
        if analysis.classification.is_purely_social() {
            context.force_general_chat();
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use shopchat_core::domain::context::UserIntent;
    use shopchat_core::domain::qa::{QaId, QaMatch, QaMatchKind, QaRecord};
    use shopchat_core::taxonomy::KeywordCategory;

    use super::{ContextBuilder, ContextParts};

    fn canned() -> QaMatch {
        QaMatch::from_record(
            QaRecord {
                id: QaId("qa-1".to_string()),
                question: "chào shop".to_string(),
                answer: "Dạ em chào anh/chị".to_string(),
                is_active: true,
                owner_scope: None,
                created_at: Utc::now(),
            },
            QaMatchKind::Exact,
        )
    }

    #[test]
    fn greeting_only_is_pure_social_general_chat() {
        let builder = ContextBuilder::default();
        let analysis = builder.analyze("chào bạn", "req-1");

        assert_eq!(analysis.pure_social(), Some(KeywordCategory::Greeting));
        assert_eq!(analysis.intent, UserIntent::GeneralChat);
        assert!(analysis.skips_canned_lookup());
    }

    #[test]
    fn purely_social_context_drops_canned_answer() {
        let builder = ContextBuilder::default();
        let analysis = builder.analyze("chào bạn", "req-2");
        let context =
            builder.build(&analysis, ContextParts { qa_match: Some(canned()), ..Default::default() });

        assert_eq!(context.user_intent, UserIntent::GeneralChat);
        assert!(context.qa_match.is_none());
    }

    #[test]
    fn canned_answer_switches_intent() {
        let builder = ContextBuilder::default();
        let analysis = builder.analyze("Giờ làm việc của công ty từ mấy giờ?", "req-3");
        let context =
            builder.build(&analysis, ContextParts { qa_match: Some(canned()), ..Default::default() });

        assert_eq!(context.user_intent, UserIntent::QaMatch);
        assert!(context.qa_match.is_some());
    }

    #[test]
    fn product_price_question_carries_keyword_and_skips_canned() {
        let builder = ContextBuilder::default();
        let analysis = builder.analyze("áo thun giá bao nhiêu", "req-4");

        assert_eq!(analysis.intent, UserIntent::ProductInquiry);
        assert!(analysis.search_keyword.is_some());
        assert!(analysis.skips_canned_lookup());
    }

    #[test]
    fn empty_message_is_general_chat() {
        let builder = ContextBuilder::default();
        let analysis = builder.analyze("", "req-5");
        let context = builder.build(&analysis, ContextParts::default());

        assert_eq!(context.user_intent, UserIntent::GeneralChat);
        assert!(context.question_categories.is_empty());
        assert!(context.search_keyword.is_none());
    }
}
