use shopchat_core::config::AssistantConfig;
use shopchat_core::domain::context::{ChatContext, UserIntent};
use shopchat_core::taxonomy::KeywordCategory;

/// Deterministic templated replies used whenever generation fails or is rejected.
#[derive(Clone, Debug)]
pub struct FallbackGenerator {
    support_contact: String,
}

impl FallbackGenerator {
    pub fn new(support_contact: impl Into<String>) -> Self {
        Self { support_contact: support_contact.into() }
    }

    pub fn from_config(config: &AssistantConfig) -> Self {
        Self::new(&config.support_contact)
    }

    pub fn generate(&self, context: &ChatContext) -> String {
        if let Some(category) = social_category(context) {
            return social_reply(category).to_string();
        }

        match context.user_intent {
            UserIntent::PolicyQuestion => format!(
                "Dạ, về vấn đề này anh/chị vui lòng liên hệ {} để được hỗ trợ chính xác nhất ạ.",
                self.support_contact
            ),
            UserIntent::ProductInquiry => self.product_reply(context),
            UserIntent::GeneralChat | UserIntent::QaMatch => format!(
                "Dạ, em chưa có thông tin để trả lời câu hỏi này. Anh/chị vui lòng liên hệ {} \
                 để được hỗ trợ ạ.",
                self.support_contact
            ),
        }
    }

    fn product_reply(&self, context: &ChatContext) -> String {
        if let Some(product) = context.current_products.first() {
            return format!(
                "Dạ, sản phẩm {} hiện có giá {}. Anh/chị vui lòng liên hệ {} để xác nhận thêm \
                 về size và tình trạng hàng ạ.",
                product.name,
                product.formatted_price(),
                self.support_contact
            );
        }
        if let Some(keyword) = context.search_keyword.as_deref() {
            return format!(
                "Dạ, hiện tại shop chưa có sản phẩm \"{keyword}\" ạ. Anh/chị có thể tham khảo \
                 thêm các mẫu khác hoặc liên hệ {} để được tư vấn ạ.",
                self.support_contact
            );
        }
        "Dạ, anh/chị có thể mô tả rõ hơn sản phẩm mình đang tìm (loại, màu, size) để em tư vấn \
         chính xác hơn không ạ?"
            .to_string()
    }
}

/// The first social category, when every detected category is social.
fn social_category(context: &ChatContext) -> Option<KeywordCategory> {
    let categories = &context.question_categories;
    if categories.is_empty() || !categories.iter().all(KeywordCategory::is_social) {
        return None;
    }
    categories.first().copied()
}

fn social_reply(category: KeywordCategory) -> &'static str {
    match category {
        KeywordCategory::Thanks => {
            "Dạ, em cảm ơn anh/chị ạ! Khi cần hỗ trợ thêm anh/chị cứ nhắn cho shop nhé."
        }
        KeywordCategory::Goodbye => "Dạ, em chào anh/chị! Chúc anh/chị một ngày thật vui ạ.",
        _ => "Dạ, em chào anh/chị! Em có thể giúp gì cho anh/chị hôm nay ạ?",
    }
}

#[cfg(test)]
mod tests {
    use shopchat_core::domain::context::{ChatContext, UserIntent};
    use shopchat_core::domain::product::{ProductId, ProductSummary};
    use shopchat_core::taxonomy::KeywordCategory;

    use super::FallbackGenerator;

    fn context(intent: UserIntent, categories: Vec<KeywordCategory>) -> ChatContext {
        ChatContext {
            conversation_history: String::new(),
            current_products: Vec::new(),
            user_intent: intent,
            search_keyword: None,
            question_categories: categories,
            specific_questions: Vec::new(),
            qa_match: None,
            page_slug: None,
        }
    }

    fn generator() -> FallbackGenerator {
        FallbackGenerator::new("hotline 0900 000 000")
    }

    #[test]
    fn social_messages_get_category_specific_replies() {
        let greeting = generator()
            .generate(&context(UserIntent::GeneralChat, vec![KeywordCategory::Greeting]));
        let thanks =
            generator().generate(&context(UserIntent::GeneralChat, vec![KeywordCategory::Thanks]));

        assert!(greeting.contains("giúp gì"));
        assert!(thanks.contains("cảm ơn"));
    }

    #[test]
    fn policy_reply_points_to_support_without_products() {
        let mut ctx = context(UserIntent::PolicyQuestion, vec![KeywordCategory::Return]);
        ctx.current_products = vec![ProductSummary {
            id: ProductId("p-1".to_string()),
            name: "Áo thun basic".to_string(),
            slug: "ao-thun-basic".to_string(),
            price: 150_000,
            description: String::new(),
        }];

        let reply = generator().generate(&ctx);
        assert!(reply.contains("hotline 0900 000 000"));
        assert!(!reply.contains("Áo thun basic"));
    }

    #[test]
    fn product_reply_prefers_product_then_keyword_then_description_request() {
        let mut ctx = context(UserIntent::ProductInquiry, vec![KeywordCategory::Product]);
        assert!(generator().generate(&ctx).contains("mô tả rõ hơn"));

        ctx.search_keyword = Some("váy cưới".to_string());
        assert!(generator().generate(&ctx).contains("chưa có sản phẩm \"váy cưới\""));

        ctx.current_products = vec![ProductSummary {
            id: ProductId("p-1".to_string()),
            name: "Váy cưới ren".to_string(),
            slug: "vay-cuoi-ren".to_string(),
            price: 2_500_000,
            description: String::new(),
        }];
        let reply = generator().generate(&ctx);
        assert!(reply.contains("Váy cưới ren"));
        assert!(reply.contains("2.500.000đ"));
    }

    #[test]
    fn empty_message_context_gets_generic_reply() {
        let reply = generator().generate(&context(UserIntent::GeneralChat, Vec::new()));
        assert!(reply.contains("chưa có thông tin"));
    }
}
