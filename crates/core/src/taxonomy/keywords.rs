//! Trigger phrases per keyword category. Lowercase; a leading or trailing space anchors a
//! short phrase on a word edge of the space-padded message.

use super::KeywordCategory;

pub(super) const GENERIC_PRODUCT_PHRASES: &[&str] = &["sản phẩm", "mẫu", "phụ kiện", "set đồ"];

const PRODUCT: &[&str] = &[
    "áo",
    "quần",
    "váy",
    "đầm",
    "giày",
    "dép",
    "túi",
    "balo",
    "ba lô",
    "mũ",
    "nón",
    "phụ kiện",
    "set đồ",
    "đồ bộ",
    "sản phẩm",
    "mẫu",
];

const PRICE: &[&str] = &[
    "giá",
    "bao nhiêu tiền",
    "nhiêu tiền",
    "mấy tiền",
    "bao tiền",
    "bn tiền",
    "chi phí",
    "rẻ",
    "đắt",
    "mắc quá",
    "mắc không",
];

const PURCHASE: &[&str] = &[
    "mua",
    "đặt hàng",
    "đặt mua",
    "order",
    "chốt đơn",
    "lên đơn",
    "lấy cái",
    "lấy mẫu",
    "giỏ hàng",
    "thêm vào giỏ",
];

const SHIPPING: &[&str] = &[
    "ship",
    "vận chuyển",
    "phí giao",
    "freeship",
    "gửi hàng",
    "chuyển phát",
    "gửi đi tỉnh",
];

const RETURN: &[&str] = &["đổi trả", "trả hàng", "hoàn tiền", "trả lại", "hoàn trả"];

const SIZE: &[&str] = &[
    "size",
    "kích cỡ",
    "kích thước",
    "số đo",
    "cỡ",
    "bảng size",
    "mặc vừa",
    "vừa không",
    "chiều cao",
    "cân nặng",
    "kg",
    "form",
];

const STYLE: &[&str] = &[
    "phối",
    "mix đồ",
    "kiểu dáng",
    "phong cách",
    "thời trang",
    "hợp với",
    "đi tiệc",
    "đi làm",
    "đi chơi",
    "mặc đẹp",
    "mặc gì",
    "trendy",
];

const ADVICE: &[&str] = &[
    "tư vấn",
    "nên chọn",
    "nên mua",
    "nên lấy",
    "gợi ý",
    "recommend",
    "chọn giúp",
    "loại nào",
    "cái nào",
    "mẫu nào",
];

const FEATURE: &[&str] = &[
    "tính năng",
    "đặc điểm",
    "ưu điểm",
    "khác gì",
    "thông số",
    "co giãn",
    "thấm hút",
    "chống nước",
    "dày không",
    "mỏng không",
    "có túi không",
];

const MATERIAL: &[&str] =
    &["chất liệu", "vải", "cotton", "lụa", "kaki", "jean", "denim", "da thật", "polyester"];

const COLOR: &[&str] =
    &["màu", "trắng", "đen", "xanh", "đỏ", "hồng", "vàng", "nâu", "xám", "tím", "kem"];

const STOCK: &[&str] = &[
    "còn hàng",
    "hết hàng",
    "còn size",
    "còn màu",
    "còn mẫu",
    "còn không",
    "có sẵn",
    "tồn kho",
    "về hàng",
];

const CARE: &[&str] = &["giặt", "ủi", "phơi", "bảo quản", "vệ sinh"];

const PRODUCT_CARE: &[&str] = &[
    "giữ màu",
    "phai màu",
    "ra màu",
    "xù lông",
    "co rút",
    "bị nhăn",
    "bền không",
    "độ bền",
];

const POLICY: &[&str] = &["chính sách", "quy định", "điều khoản", "cam kết"];

const PROMOTION: &[&str] = &[
    "khuyến mãi",
    "giảm giá",
    "sale",
    "voucher",
    "mã giảm",
    "ưu đãi",
    "combo",
    "quà tặng",
    "tích điểm",
];

const ACCOUNT: &[&str] =
    &["tài khoản", "đăng ký", "đăng kí", "đăng nhập", "mật khẩu", "thành viên", "hội viên"];

const FOLLOW_UP: &[&str] = &[
    "vậy còn",
    "thế còn",
    "còn cái",
    "cái đó",
    "cái kia",
    "mẫu đó",
    "mẫu kia",
    "sản phẩm đó",
    "sản phẩm trên",
    "vừa nói",
    "lúc nãy",
    "như trên",
    "ở trên",
];

const GREETING: &[&str] =
    &["xin chào", "chào", "hello", " hi ", " hey ", " alo ", "shop ơi", "ad ơi", "chào shop"];

const THANKS: &[&str] = &["cảm ơn", "cám ơn", "thank", "tks", "camon"];

const GOODBYE: &[&str] = &["tạm biệt", "bye", "hẹn gặp lại", "gặp lại sau"];

const WORKING_HOURS: &[&str] = &[
    "giờ làm việc",
    "thời gian làm việc",
    "mấy giờ",
    "giờ mở cửa",
    "mở cửa",
    "đóng cửa",
    "làm việc từ",
    "ngày lễ",
];

const LOCATION: &[&str] = &[
    "địa chỉ",
    "ở đâu",
    "chi nhánh",
    "showroom",
    "cửa hàng ở",
    "ghé shop",
    "đến xem trực tiếp",
    "bản đồ",
];

const TRUST: &[&str] = &[
    "uy tín",
    "hàng thật",
    "chính hãng",
    "hàng fake",
    "hàng giả",
    "lừa đảo",
    "tin tưởng",
    "review",
    "đánh giá",
];

const PAYMENT: &[&str] = &[
    "thanh toán",
    "chuyển khoản",
    "trả góp",
    "ví điện tử",
    "momo",
    "zalopay",
    "thẻ tín dụng",
    "tiền mặt",
    "nhận hàng trả tiền",
    " cod ",
];

const DELIVERY: &[&str] = &[
    "giao hàng",
    "thời gian giao",
    "khi nào giao",
    "khi nào nhận",
    "bao lâu nhận",
    "mấy ngày nhận",
    "nhận được hàng",
    "giao tận nơi",
    "hỏa tốc",
];

const EXCHANGE: &[&str] =
    &["đổi size", "đổi hàng", "đổi màu", "đổi sang", "đổi mẫu", "đổi sản phẩm"];

const WARRANTY: &[&str] = &["bảo hành", "hàng lỗi", "bị lỗi", "lỗi sản phẩm"];

const ORDER_STATUS: &[&str] = &[
    "kiểm tra đơn",
    "tra cứu đơn",
    "tình trạng đơn",
    "mã vận đơn",
    "đơn của tôi",
    "đơn của mình",
    "đơn hàng của",
    "hủy đơn",
];

const COMPLAINT: &[&str] = &[
    "khiếu nại",
    "phàn nàn",
    "thất vọng",
    "không hài lòng",
    "tệ quá",
    "giao sai",
    "thiếu hàng",
];

pub(super) const CATEGORY_PHRASES: &[(KeywordCategory, &[&str])] = &[
    (KeywordCategory::Product, PRODUCT),
    (KeywordCategory::Price, PRICE),
    (KeywordCategory::Purchase, PURCHASE),
    (KeywordCategory::Shipping, SHIPPING),
    (KeywordCategory::Return, RETURN),
    (KeywordCategory::Size, SIZE),
    (KeywordCategory::Style, STYLE),
    (KeywordCategory::Advice, ADVICE),
    (KeywordCategory::Feature, FEATURE),
    (KeywordCategory::Material, MATERIAL),
    (KeywordCategory::Color, COLOR),
    (KeywordCategory::Stock, STOCK),
    (KeywordCategory::Care, CARE),
    (KeywordCategory::ProductCare, PRODUCT_CARE),
    (KeywordCategory::Policy, POLICY),
    (KeywordCategory::Promotion, PROMOTION),
    (KeywordCategory::Account, ACCOUNT),
    (KeywordCategory::FollowUp, FOLLOW_UP),
    (KeywordCategory::Greeting, GREETING),
    (KeywordCategory::Thanks, THANKS),
    (KeywordCategory::Goodbye, GOODBYE),
    (KeywordCategory::WorkingHours, WORKING_HOURS),
    (KeywordCategory::Location, LOCATION),
    (KeywordCategory::Trust, TRUST),
    (KeywordCategory::Payment, PAYMENT),
    (KeywordCategory::Delivery, DELIVERY),
    (KeywordCategory::Exchange, EXCHANGE),
    (KeywordCategory::Warranty, WARRANTY),
    (KeywordCategory::OrderStatus, ORDER_STATUS),
    (KeywordCategory::Complaint, COMPLAINT),
];
