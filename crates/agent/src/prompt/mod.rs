//! Grounded instruction assembly for the generative step.
//!
//! The instruction is a sequence of conditionally included blocks, always in the same order:
//! role, products, not-found notice, detected categories, one guidance block, link policy,
//! grounding clause, recent history and finally the question with the closing directive.
//! Block headers double as scaffolding markers that the response guard refuses to let through.

pub mod guidance;

use shopchat_core::config::AssistantConfig;
use shopchat_core::domain::context::{ChatContext, UserIntent};
use shopchat_core::domain::product::ProductSummary;
use shopchat_core::taxonomy::KeywordCategory;

use self::guidance::{
    general_guidance, policy_guidance, product_guidance, pure_social_prompt, social_guidance,
    GuidanceInput,
};

pub const ROLE_MARKER: &str = "🤖 VAI TRÒ:";
pub const PRODUCTS_MARKER: &str = "📦 THÔNG TIN SẢN PHẨM:";
pub const GUIDANCE_MARKER: &str = "📝 HƯỚNG DẪN TRẢ LỜI:";
pub const POLICY_MARKER: &str = "📋 HƯỚNG DẪN CHÍNH SÁCH:";
pub const QUESTION_MARKER: &str = "❓ CÂU HỎI CỦA KHÁCH:";
pub const DIRECTIVE_MARKER: &str = "⚡ YÊU CẦU CUỐI:";

/// Block headers that must never appear in a reply shown to a customer.
pub const SCAFFOLDING_MARKERS: [&str; 6] = [
    ROLE_MARKER,
    PRODUCTS_MARKER,
    GUIDANCE_MARKER,
    POLICY_MARKER,
    QUESTION_MARKER,
    DIRECTIVE_MARKER,
];

const NOT_FOUND_MARKER: &str = "⚠️ KHÔNG TÌM THẤY:";
const CATEGORIES_MARKER: &str = "🏷️ CHỦ ĐỀ NHẬN DIỆN:";
const LINK_MARKER: &str = "🔗 ĐƯỜNG DẪN:";
const GROUNDING_MARKER: &str = "🚫 NGUYÊN TẮC:";
const HISTORY_MARKER: &str = "💬 LỊCH SỬ HỘI THOẠI:";

/// Phrases by which a customer asks to be sent a product link.
pub const LINK_REQUEST_PHRASES: &[&str] = &[
    "link",
    "xem chi tiết",
    "xem thêm",
    "xem sản phẩm",
    "cho tui xem",
    "cho tôi xem",
    "muốn xem",
    "tham khảo",
    "đường dẫn",
    "url",
    "trang sản phẩm",
];

const DESCRIPTION_LIMIT: usize = 200;
const HISTORY_LINE_LIMIT: usize = 6;
const PHRASE_LIMIT: usize = 5;

pub fn wants_link(message: &str) -> bool {
    let message = message.to_lowercase();
    LINK_REQUEST_PHRASES.iter().any(|phrase| message.contains(phrase))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LinkPolicy {
    /// Customer is already on a resolved product's page.
    Omit,
    Append,
    OnRequest,
}

impl LinkPolicy {
    fn for_context(context: &ChatContext, message: &str) -> Self {
        if wants_link(message) {
            return Self::Append;
        }
        let on_page =
            context.current_products.iter().any(|product| context.is_on_page_of(&product.slug));
        if on_page {
            Self::Omit
        } else {
            Self::OnRequest
        }
    }
}

#[derive(Clone, Debug)]
pub struct PromptAssembler {
    shop_name: String,
    support_contact: String,
    product_url_prefix: String,
}

impl PromptAssembler {
    pub fn new(
        shop_name: impl Into<String>,
        support_contact: impl Into<String>,
        product_url_prefix: impl Into<String>,
    ) -> Self {
        Self {
            shop_name: shop_name.into(),
            support_contact: support_contact.into(),
            product_url_prefix: product_url_prefix.into(),
        }
    }

    pub fn from_config(config: &AssistantConfig) -> Self {
        Self::new(&config.shop_name, &config.support_contact, &config.product_url_prefix)
    }

    pub fn product_link(&self, slug: &str) -> String {
        format!("{}{slug}", self.product_url_prefix)
    }

    /// System message sent alongside every instruction.
    pub fn system_prompt(&self) -> String {
        format!(
            "Bạn là trợ lý chăm sóc khách hàng của {}. Chỉ viết câu trả lời gửi cho khách bằng \
             tiếng Việt; không lặp lại hướng dẫn, tiêu đề hay ký hiệu trong đề bài.",
            self.shop_name
        )
    }

    /// Minimal instruction for a message that is only a greeting, thanks or goodbye.
    pub fn assemble_social(&self, category: KeywordCategory, message: &str) -> String {
        pure_social_prompt(category, message)
    }

    pub fn assemble(&self, context: &ChatContext, message: &str) -> String {
        let link_policy = LinkPolicy::for_context(context, message);
        let mut blocks = vec![self.role_block()];

        if !context.current_products.is_empty() {
            blocks.push(self.products_block(context, link_policy));
        }
        if let Some(keyword) =
            context.search_keyword.as_deref().filter(|_| context.current_products.is_empty())
        {
            blocks.push(format!(
                "{NOT_FOUND_MARKER} Cửa hàng hiện không có sản phẩm phù hợp với từ khóa \
                 \"{keyword}\". Báo khách rằng shop chưa có mẫu này và mời khách mô tả thêm \
                 nhu cầu; tuyệt đối không bịa ra sản phẩm."
            ));
        }
        if !context.question_categories.is_empty() {
            blocks.push(categories_block(context));
        }
        blocks.push(self.guidance_block(context, message));
        if let Some(block) = self.link_block(context, link_policy) {
            blocks.push(block);
        }
        blocks.push(format!(
            "{GROUNDING_MARKER} Chỉ dùng thông tin được cung cấp ở trên. Nếu không có thông tin, \
             nói rõ \"em chưa có thông tin về vấn đề này\" và mời khách liên hệ {}; không tự \
             bịa giá, chính sách hay sản phẩm.",
            self.support_contact
        ));
        if let Some(block) = history_block(context) {
            blocks.push(block);
        }
        blocks.push(format!("{QUESTION_MARKER} {}", message.trim()));
        blocks.push(format!(
            "{DIRECTIVE_MARKER} Trả lời trong khoảng 50-80 từ, xưng \"em\", gọi khách là \
             \"anh/chị\". {}",
            self.link_directive(context, link_policy)
        ));

        blocks.join("\n\n")
    }

    fn role_block(&self) -> String {
        format!(
            "{ROLE_MARKER} Bạn là nhân viên tư vấn bán hàng của {}. Luôn thân thiện, ngắn gọn, \
             trả lời bằng tiếng Việt và chỉ dựa trên dữ liệu được cung cấp.",
            self.shop_name
        )
    }

    fn products_block(&self, context: &ChatContext, link_policy: LinkPolicy) -> String {
        let entries = context
            .current_products
            .iter()
            .enumerate()
            .map(|(index, product)| {
                let mut entry = format!(
                    "{}. {}\n   - Giá: {}",
                    index + 1,
                    product.name,
                    product.formatted_price()
                );
                let hide_slug = link_policy == LinkPolicy::Omit && context.is_on_page_of(&product.slug);
                if !hide_slug {
                    entry.push_str(&format!("\n   - Mã trang: {}", product.slug));
                }
                let description = truncate_description(&product.description);
                if !description.is_empty() {
                    entry.push_str(&format!("\n   - Mô tả: {description}"));
                }
                entry
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!("{PRODUCTS_MARKER}\n{entries}")
    }

    fn guidance_block(&self, context: &ChatContext, message: &str) -> String {
        let input = GuidanceInput { context, message, support_contact: &self.support_contact };
        match context.user_intent {
            UserIntent::ProductInquiry => product_guidance(&input),
            UserIntent::PolicyQuestion => policy_guidance(&input),
            UserIntent::GeneralChat | UserIntent::QaMatch if context.has_social_category() => {
                social_guidance(&input)
            }
            UserIntent::GeneralChat | UserIntent::QaMatch => general_guidance(&input),
        }
    }

    fn link_block(&self, context: &ChatContext, link_policy: LinkPolicy) -> Option<String> {
        match link_policy {
            LinkPolicy::Omit => Some(format!(
                "{LINK_MARKER} Khách đang xem trang của sản phẩm này, KHÔNG gửi lại đường dẫn."
            )),
            LinkPolicy::Append => {
                let links = self.links(&context.current_products);
                let target = if links.is_empty() {
                    format!("{}<mã trang>", self.product_url_prefix)
                } else {
                    links
                };
                Some(format!(
                    "{LINK_MARKER} Khách muốn xem chi tiết. Gửi kèm đường dẫn theo đúng định dạng: {target}"
                ))
            }
            LinkPolicy::OnRequest => None,
        }
    }

    fn link_directive(&self, context: &ChatContext, link_policy: LinkPolicy) -> String {
        match link_policy {
            LinkPolicy::Omit => "Không gửi đường dẫn sản phẩm.".to_string(),
            LinkPolicy::Append if context.current_products.is_empty() => {
                "Chưa có sản phẩm để gửi đường dẫn; không tự tạo đường dẫn.".to_string()
            }
            LinkPolicy::Append => {
                format!("Kết thúc bằng đường dẫn: {}", self.links(&context.current_products))
            }
            LinkPolicy::OnRequest => "Chỉ gửi đường dẫn khi khách yêu cầu.".to_string(),
        }
    }

    fn links(&self, products: &[ProductSummary]) -> String {
        products
            .iter()
            .map(|product| self.product_link(&product.slug))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn categories_block(context: &ChatContext) -> String {
    let labels = context
        .question_categories
        .iter()
        .map(KeywordCategory::label)
        .collect::<Vec<_>>()
        .join(", ");
    let mut block = format!("{CATEGORIES_MARKER} {labels}");
    let phrases = context
        .specific_questions
        .iter()
        .take(PHRASE_LIMIT)
        .map(|phrase| format!("\"{}\"", phrase.trim()))
        .collect::<Vec<_>>();
    if !phrases.is_empty() {
        block.push_str(&format!("\nCụm từ khách dùng: {}", phrases.join(", ")));
    }
    block
}

fn history_block(context: &ChatContext) -> Option<String> {
    let lines = context.history_lines().collect::<Vec<_>>();
    if lines.is_empty() {
        return None;
    }
    let recent = &lines[lines.len().saturating_sub(HISTORY_LINE_LIMIT)..];
    Some(format!("{HISTORY_MARKER}\n{}", recent.join("\n")))
}

fn truncate_description(description: &str) -> String {
    let description = description.trim();
    if description.chars().count() <= DESCRIPTION_LIMIT {
        return description.to_string();
    }
    let truncated = description.chars().take(DESCRIPTION_LIMIT).collect::<String>();
    format!("{truncated}...")
}
