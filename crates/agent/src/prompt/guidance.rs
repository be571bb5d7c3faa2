//! Intent-specific guidance blocks. Product inquiries dispatch on [`ProductSubtype`] through a
//! table of pure template functions.

use shopchat_core::classifier::{product_subtype, ProductSubtype};
use shopchat_core::domain::context::ChatContext;
use shopchat_core::taxonomy::KeywordCategory;

use super::{GUIDANCE_MARKER, POLICY_MARKER};

/// Words that turn a price question into a comparison.
const COMPARISON_PHRASES: &[&str] =
    &["so sánh", "so với", "khác nhau", "khác gì", "chênh", "rẻ hơn", "đắt hơn", "hơn"];

pub struct GuidanceInput<'a> {
    pub context: &'a ChatContext,
    pub message: &'a str,
    pub support_contact: &'a str,
}

type GuidanceFn = fn(&GuidanceInput<'_>) -> String;

const PRODUCT_GUIDANCE: &[(ProductSubtype, GuidanceFn)] = &[
    (ProductSubtype::FollowUp, follow_up_guidance),
    (ProductSubtype::Price, price_guidance),
    (ProductSubtype::Purchase, purchase_guidance),
    (ProductSubtype::Size, size_guidance),
    (ProductSubtype::Style, style_guidance),
    (ProductSubtype::Feature, feature_guidance),
    (ProductSubtype::Care, care_guidance),
    (ProductSubtype::Advice, advice_guidance),
    (ProductSubtype::Default, default_product_guidance),
];

pub fn product_guidance(input: &GuidanceInput<'_>) -> String {
    let subtype = product_subtype(&input.context.question_categories);
    let render = PRODUCT_GUIDANCE
        .iter()
        .find(|(candidate, _)| *candidate == subtype)
        .map(|(_, render)| *render)
        .unwrap_or(default_product_guidance);
    format!("{GUIDANCE_MARKER}\n{}", render(input))
}

fn follow_up_guidance(_input: &GuidanceInput<'_>) -> String {
    [
        "- Khách đang hỏi tiếp về sản phẩm vừa nhắc tới trong lịch sử hội thoại; trả lời nối tiếp, không chào lại.",
        "- Dựa vào lịch sử để xác định đúng sản phẩm; nếu vẫn không rõ, hỏi lại khách ngắn gọn.",
    ]
    .join("\n")
}

fn price_guidance(input: &GuidanceInput<'_>) -> String {
    let mut lines = Vec::new();
    if input.context.current_products.is_empty() {
        lines.push(
            "- Chưa có giá sản phẩm trong dữ liệu: không tự đưa ra con số, mời khách cho biết mẫu cụ thể."
                .to_string(),
        );
    } else {
        let prices = input
            .context
            .current_products
            .iter()
            .map(|product| format!("{} ({})", product.name, product.formatted_price()))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("- Nêu rõ giá của TỪNG sản phẩm đã cho: {prices}."));
    }
    let message = input.message.to_lowercase();
    if COMPARISON_PHRASES.iter().any(|phrase| message.contains(phrase)) {
        lines.push(
            "- Khách đang so sánh: giải thích vì sao giá chênh lệch (chất liệu, kiểu dáng) dựa trên mô tả."
                .to_string(),
        );
    }
    lines.push("- Giữ nguyên định dạng giá như trên, không làm tròn hay quy đổi.".to_string());
    lines.join("\n")
}

fn purchase_guidance(input: &GuidanceInput<'_>) -> String {
    format!(
        "- Hướng dẫn khách đặt hàng: chọn sản phẩm, size, màu rồi để lại số điện thoại và địa chỉ nhận hàng.\n\
         - Nếu khách cần hỗ trợ trực tiếp, mời khách liên hệ {}.",
        input.support_contact
    )
}

fn size_guidance(_input: &GuidanceInput<'_>) -> String {
    [
        "- Tư vấn size dựa trên chiều cao, cân nặng hoặc số đo khách cung cấp.",
        "- Nếu thiếu số đo, hỏi khách chiều cao và cân nặng trước khi gợi ý.",
        "- Không khẳng định vừa 100%; gợi ý khách đối chiếu bảng size của shop.",
    ]
    .join("\n")
}

fn style_guidance(_input: &GuidanceInput<'_>) -> String {
    "- Gợi ý 1-2 cách phối đồ cụ thể với sản phẩm, phù hợp hoàn cảnh khách nhắc tới (đi làm, đi chơi, đi tiệc)."
        .to_string()
}

fn feature_guidance(_input: &GuidanceInput<'_>) -> String {
    "- Trình bày đặc điểm và chất liệu đúng theo phần mô tả; không thêm thông số không có trong mô tả."
        .to_string()
}

fn care_guidance(_input: &GuidanceInput<'_>) -> String {
    [
        "- Hướng dẫn giặt, phơi, bảo quản phù hợp với chất liệu trong mô tả.",
        "- Nếu mô tả không nêu chất liệu, chỉ đưa lời khuyên chung: giặt nhẹ, lộn trái, tránh nắng gắt.",
    ]
    .join("\n")
}

fn advice_guidance(_input: &GuidanceInput<'_>) -> String {
    [
        "- Đóng vai người tư vấn: đề xuất tối đa 2 sản phẩm trong danh sách và nêu lý do chọn.",
        "- Nếu nhu cầu chưa rõ, hỏi thêm một câu về dịp mặc hoặc ngân sách.",
    ]
    .join("\n")
}

fn default_product_guidance(_input: &GuidanceInput<'_>) -> String {
    [
        "- Giới thiệu ngắn gọn sản phẩm phù hợp nhất với câu hỏi, kèm giá.",
        "- Nếu không có sản phẩm nào, xin lỗi và mời khách mô tả rõ hơn.",
    ]
    .join("\n")
}

fn policy_line(category: KeywordCategory) -> Option<&'static str> {
    let line = match category {
        KeywordCategory::Shipping => {
            "- Vận chuyển: shop giao hàng toàn quốc; phí và thời gian phụ thuộc khu vực, mời khách để lại địa chỉ để báo chính xác."
        }
        KeywordCategory::Return => {
            "- Đổi trả: chỉ nêu điều kiện chung (sản phẩm còn tem mác, chưa qua sử dụng); không cam kết thời hạn nếu không có thông tin."
        }
        KeywordCategory::Policy => {
            "- Chính sách chung: trả lời đúng phạm vi khách hỏi, không suy diễn thêm điều khoản."
        }
        KeywordCategory::Promotion => {
            "- Khuyến mãi: chỉ nhắc chương trình nếu có trong dữ liệu; nếu không, mời khách theo dõi fanpage để cập nhật."
        }
        KeywordCategory::Account => {
            "- Tài khoản: hướng dẫn các bước đăng ký, đăng nhập cơ bản; không hỏi mật khẩu của khách."
        }
        KeywordCategory::WorkingHours => {
            "- Giờ làm việc: nếu không có giờ cụ thể trong dữ liệu, mời khách liên hệ để được xác nhận."
        }
        KeywordCategory::Location => {
            "- Địa chỉ: không tự bịa địa chỉ cửa hàng; nếu thiếu thông tin, mời khách liên hệ để nhận địa chỉ chính xác."
        }
        KeywordCategory::Trust => {
            "- Uy tín: trấn an khách bằng cam kết chất lượng chung, khuyến khích kiểm tra hàng khi nhận."
        }
        KeywordCategory::Payment => {
            "- Thanh toán: nêu các hình thức phổ biến (COD, chuyển khoản) và mời khách chọn cách thuận tiện."
        }
        KeywordCategory::Delivery => {
            "- Giao hàng: thời gian nhận hàng phụ thuộc khu vực; không hứa ngày giao cụ thể."
        }
        KeywordCategory::Exchange => {
            "- Đổi hàng: hướng dẫn khách giữ nguyên tem mác và liên hệ shop để được đổi size hoặc màu."
        }
        KeywordCategory::Warranty => {
            "- Bảo hành: xin lỗi nếu sản phẩm lỗi và mời khách gửi hình ảnh để shop kiểm tra."
        }
        KeywordCategory::OrderStatus => {
            "- Đơn hàng: xin mã đơn hoặc số điện thoại đặt hàng để tra cứu; không tự đoán tình trạng đơn."
        }
        KeywordCategory::Complaint => {
            "- Khiếu nại: xin lỗi chân thành, ghi nhận vấn đề và cam kết chuyển bộ phận phụ trách xử lý."
        }
        _ => return None,
    };
    Some(line)
}

/// One line per detected policy category, in detection order.
pub fn policy_guidance(input: &GuidanceInput<'_>) -> String {
    let mut lines = input
        .context
        .question_categories
        .iter()
        .filter_map(|category| policy_line(*category))
        .map(str::to_string)
        .collect::<Vec<_>>();
    lines.push(format!(
        "- Khi dữ liệu không đủ để trả lời chắc chắn, mời khách liên hệ {}.",
        input.support_contact
    ));
    format!("{POLICY_MARKER}\n{}", lines.join("\n"))
}

/// Used when a greeting, thanks or goodbye arrives together with other content.
pub fn social_guidance(input: &GuidanceInput<'_>) -> String {
    let labels = input
        .context
        .question_categories
        .iter()
        .filter(|category| category.is_social())
        .map(KeywordCategory::label)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{GUIDANCE_MARKER}\n\
         - Tin nhắn có phần giao tiếp ({labels}): đáp lại phần này tự nhiên trước.\n\
         - Sau đó trả lời phần còn lại của tin nhắn nếu có; nếu không, hỏi khách cần hỗ trợ gì thêm.\n\
         - Giữ giọng thân thiện, xưng \"em\", gọi khách là \"anh/chị\"."
    )
}

pub fn general_guidance(_input: &GuidanceInput<'_>) -> String {
    format!(
        "{GUIDANCE_MARKER}\n\
         - Trả lời lịch sự, ngắn gọn.\n\
         - Nếu câu hỏi nằm ngoài phạm vi mua sắm, khéo léo đưa khách quay lại chủ đề sản phẩm của shop."
    )
}

/// Minimal prompt for a message that is only a greeting, thanks or goodbye.
pub fn pure_social_prompt(category: KeywordCategory, message: &str) -> String {
    let task = match category {
        KeywordCategory::Thanks => "Khách cảm ơn. Đáp lại lời cảm ơn và mời khách quay lại khi cần.",
        KeywordCategory::Goodbye => "Khách chào tạm biệt. Chào lại và chúc khách một ngày tốt lành.",
        _ => "Khách chào. Chào lại và hỏi khách cần hỗ trợ gì.",
    };
    format!("{task}\nTin nhắn: \"{message}\"\nTrả lời 1-2 câu tiếng Việt, xưng \"em\", không giới thiệu sản phẩm.")
}
